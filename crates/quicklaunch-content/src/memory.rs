use crate::page::{ClickEvent, Element, NodeId, Page};
use quicklaunch_core::Selector;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;
use url::Url;

/// Description of an element to insert into a [`MemoryPage`]
#[derive(Debug, Clone)]
pub struct ElementSpec {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    text: String,
    href: Option<String>,
    hidden: bool,
    native_click: bool,
}

impl ElementSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            id: None,
            classes: Vec::new(),
            text: String::new(),
            href: None,
            hidden: false,
            native_click: true,
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }

    /// `display: none`
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Element without a platform `click()` method (e.g. SVG)
    pub fn without_native_click(mut self) -> Self {
        self.native_click = false;
        self
    }
}

#[derive(Debug)]
struct Node {
    spec: ElementSpec,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
    events: Vec<ClickEvent>,
    native_clicks: usize,
    removes_on_click: Option<NodeId>,
}

#[derive(Debug)]
struct State {
    url: Url,
    referrer: String,
    nodes: Vec<Node>,
    focused: bool,
    cookie: String,
    navigations: Vec<String>,
    blocked_navigations: Vec<String>,
    ignore_history_replace: bool,
}

impl State {
    fn is_rendered(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            let n = &self.nodes[id];
            if !n.attached || n.spec.hidden {
                return false;
            }
            current = n.parent;
        }
        true
    }

    fn text_of(&self, node: NodeId, rendered_only: bool) -> String {
        let mut parts = Vec::new();
        self.collect_text(node, rendered_only, &mut parts);
        parts.join(" ")
    }

    fn collect_text(&self, node: NodeId, rendered_only: bool, parts: &mut Vec<String>) {
        let n = &self.nodes[node];
        if !n.attached || (rendered_only && n.spec.hidden) {
            return;
        }
        let own = n.spec.text.trim();
        if !own.is_empty() {
            parts.push(own.to_string());
        }
        for &child in &n.children {
            self.collect_text(child, rendered_only, parts);
        }
    }

    fn snapshot(&self, node: NodeId) -> Element {
        let spec = &self.nodes[node].spec;
        Element {
            node,
            tag: spec.tag.clone(),
            id: spec.id.clone(),
            classes: spec.classes.clone(),
            text: self.text_of(node, false),
            href: spec.href.clone(),
            visible: self.is_rendered(node),
        }
    }

    /// Attached descendants of `root` in document order, excluding `root`
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[root].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let n = &self.nodes[id];
            if !n.attached {
                continue;
            }
            out.push(id);
            stack.extend(n.children.iter().rev().copied());
        }
        out
    }

    fn select(&self, root: NodeId, selector: &Selector) -> Vec<Element> {
        self.descendants(root)
            .into_iter()
            .map(|id| self.snapshot(id))
            .filter(|el| el.matches(selector))
            .collect()
    }

    fn detach(&mut self, node: NodeId) {
        self.nodes[node].attached = false;
        let children = self.nodes[node].children.clone();
        for child in children {
            self.detach(child);
        }
    }

    fn follow(&mut self, href: &str) {
        if href.trim_start().to_lowercase().starts_with("javascript:") {
            self.blocked_navigations.push(href.to_string());
        } else {
            self.navigations.push(href.to_string());
        }
    }
}

/// In-memory document backing the crate's tests and the cross-crate launch tests
///
/// Click listeners are recorded per element. Following a `javascript:` link
/// is recorded as a blocked navigation, the way a content security policy
/// would refuse it.
#[derive(Debug)]
pub struct MemoryPage {
    state: Mutex<State>,
    mutations: watch::Sender<u64>,
}

impl MemoryPage {
    pub const BODY: NodeId = 0;

    pub fn new(url: Url) -> Self {
        let body = Node {
            spec: ElementSpec::new("body"),
            parent: None,
            children: Vec::new(),
            attached: true,
            events: Vec::new(),
            native_clicks: 0,
            removes_on_click: None,
        };
        let (mutations, _) = watch::channel(0);
        Self {
            state: Mutex::new(State {
                url,
                referrer: String::new(),
                nodes: vec![body],
                focused: true,
                cookie: String::new(),
                navigations: Vec::new(),
                blocked_navigations: Vec::new(),
                ignore_history_replace: false,
            }),
            mutations,
        }
    }

    pub fn with_referrer(self, referrer: &str) -> Self {
        self.state().referrer = referrer.to_string();
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify_mutation(&self) {
        self.mutations.send_modify(|count| *count += 1);
    }

    /// Append an element under `parent` and return its node id
    pub fn append(&self, parent: NodeId, spec: ElementSpec) -> NodeId {
        let id = {
            let mut state = self.state();
            let id = state.nodes.len();
            let attached = state.nodes[parent].attached;
            state.nodes.push(Node {
                spec,
                parent: Some(parent),
                children: Vec::new(),
                attached,
                events: Vec::new(),
                native_clicks: 0,
                removes_on_click: None,
            });
            state.nodes[parent].children.push(id);
            id
        };
        self.notify_mutation();
        id
    }

    /// Detach a node and its subtree
    pub fn remove(&self, node: NodeId) {
        self.state().detach(node);
        self.notify_mutation();
    }

    /// Clicking `node` removes `target` (e.g. a modal close button)
    pub fn remove_on_click(&self, node: NodeId, target: NodeId) {
        self.state().nodes[node].removes_on_click = Some(target);
    }

    pub fn set_hidden(&self, node: NodeId, hidden: bool) {
        self.state().nodes[node].spec.hidden = hidden;
        self.notify_mutation();
    }

    pub fn set_focus(&self, focused: bool) {
        self.state().focused = focused;
    }

    /// Same-document navigation, e.g. a fragment change
    pub fn set_location(&self, url: Url) {
        self.state().url = url;
    }

    /// Make `history.replaceState` a silent no-op
    pub fn ignore_history_replace(&self, ignore: bool) {
        self.state().ignore_history_replace = ignore;
    }

    /// Click events delivered to `node`
    pub fn events(&self, node: NodeId) -> Vec<ClickEvent> {
        self.state().nodes[node].events.clone()
    }

    pub fn click_count(&self, node: NodeId) -> usize {
        self.state().nodes[node].events.len()
    }

    pub fn native_click_count(&self, node: NodeId) -> usize {
        self.state().nodes[node].native_clicks
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state().navigations.clone()
    }

    pub fn blocked_navigations(&self) -> Vec<String> {
        self.state().blocked_navigations.clone()
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.state().nodes[node].attached
    }

    fn deliver_click(&self, node: NodeId, event: ClickEvent, native: bool) {
        let removed = {
            let mut state = self.state();
            if !state.nodes[node].attached {
                return;
            }
            let n = &mut state.nodes[node];
            n.events.push(event);
            if native {
                n.native_clicks += 1;
            }
            let target = n.removes_on_click;
            let href = n.spec.href.clone();
            if !event.default_prevented {
                if let Some(href) = href {
                    state.follow(&href);
                }
            }
            if let Some(target) = target {
                state.detach(target);
            }
            target.is_some()
        };
        if removed {
            self.notify_mutation();
        }
    }
}

impl Page for MemoryPage {
    fn location(&self) -> Url {
        self.state().url.clone()
    }

    fn referrer(&self) -> String {
        self.state().referrer.clone()
    }

    fn query_all(&self, selector: &Selector) -> Vec<Element> {
        self.state().select(Self::BODY, selector)
    }

    fn query_within(&self, scope: &Element, selector: &Selector) -> Vec<Element> {
        let state = self.state();
        if scope.node >= state.nodes.len() || !state.nodes[scope.node].attached {
            return Vec::new();
        }
        state.select(scope.node, selector)
    }

    fn closest(&self, element: &Element, selector: &Selector) -> Option<Element> {
        let state = self.state();
        let mut current = (element.node < state.nodes.len()).then_some(element.node);
        while let Some(id) = current {
            let el = state.snapshot(id);
            if el.matches(selector) {
                return Some(el);
            }
            current = state.nodes[id].parent;
        }
        None
    }

    fn body_text(&self) -> String {
        self.state().text_of(Self::BODY, true)
    }

    fn has_focus(&self) -> bool {
        self.state().focused
    }

    fn native_click(&self, element: &Element) -> bool {
        let supported = {
            let state = self.state();
            element.node < state.nodes.len() && state.nodes[element.node].spec.native_click
        };
        if supported {
            self.deliver_click(element.node, ClickEvent::synthetic(), true);
        }
        supported
    }

    fn dispatch_click(&self, element: &Element, event: ClickEvent) {
        if element.node < self.state().nodes.len() {
            self.deliver_click(element.node, event, false);
        }
    }

    fn cookie(&self) -> String {
        self.state().cookie.clone()
    }

    fn set_cookie(&self, cookie: &str) {
        let pair = cookie.split(';').next().unwrap_or("").trim().to_string();
        if pair.is_empty() {
            return;
        }
        let name = pair.split('=').next().unwrap_or("").to_string();
        let mut state = self.state();
        let mut jar: Vec<String> = state
            .cookie
            .split("; ")
            .filter(|c| !c.is_empty() && c.split('=').next() != Some(name.as_str()))
            .map(str::to_string)
            .collect();
        jar.push(pair);
        state.cookie = jar.join("; ");
    }

    fn replace_url(&self, url: &Url) {
        let mut state = self.state();
        if !state.ignore_history_replace {
            state.url = url.clone();
        }
    }

    fn set_hash(&self, hash: &str) {
        let hash = hash.trim_start_matches('#');
        let mut state = self.state();
        state.url.set_fragment(if hash.is_empty() { None } else { Some(hash) });
    }

    fn mutations(&self) -> watch::Receiver<u64> {
        self.mutations.subscribe()
    }
}
