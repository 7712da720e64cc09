use quicklaunch_core::Selector;
use tokio::sync::watch;
use url::Url;

/// Identity of a node within one document
pub type NodeId = usize;

/// Snapshot of a DOM element as seen by the handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub node: NodeId,
    /// Lowercase tag name
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    /// Rendered text of the element and its descendants
    pub text: String,
    pub href: Option<String>,
    /// Not hidden by `display: none` or `visibility: hidden` on itself or an ancestor
    pub visible: bool,
}

impl Element {
    pub fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.tag, self.id.as_deref(), &self.classes)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// Trimmed text equals one of `texts`
    pub fn text_is_any(&self, texts: &[String]) -> bool {
        let text = self.trimmed_text();
        texts.iter().any(|t| t == text)
    }

    /// Text contains one of `texts`
    pub fn text_contains_any(&self, texts: &[String]) -> bool {
        texts.iter().any(|t| self.text.contains(t.as_str()))
    }

    /// Anchor whose href uses the `javascript:` pseudo-scheme
    ///
    /// Following such a link is blocked by the portal's content security policy.
    pub fn is_pseudo_link(&self) -> bool {
        self.tag == "a"
            && self
                .href
                .as_deref()
                .is_some_and(|href| href.trim_start().to_lowercase().starts_with("javascript:"))
    }
}

/// A click event delivered to an element's listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub bubbles: bool,
    pub cancelable: bool,
    pub default_prevented: bool,
}

impl ClickEvent {
    /// Bubbling, cancelable mouse click
    pub fn synthetic() -> Self {
        Self {
            bubbles: true,
            cancelable: true,
            default_prevented: false,
        }
    }

    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }
}

/// The document a content script runs in
///
/// Queries return elements in document order. Implementations bump the
/// [`Page::mutations`] counter whenever the body subtree changes.
pub trait Page: Send + Sync {
    fn location(&self) -> Url;

    /// `document.referrer`; empty when there is none
    fn referrer(&self) -> String;

    fn query_all(&self, selector: &Selector) -> Vec<Element>;

    /// Descendants of `scope` matching `selector`
    fn query_within(&self, scope: &Element, selector: &Selector) -> Vec<Element>;

    /// Nearest inclusive ancestor matching `selector`
    fn closest(&self, element: &Element, selector: &Selector) -> Option<Element>;

    /// Rendered text of the whole body
    fn body_text(&self) -> String;

    fn has_focus(&self) -> bool;

    /// Platform click (`HTMLElement.click()`); returns false when the element has none
    fn native_click(&self, element: &Element) -> bool;

    fn dispatch_click(&self, element: &Element, event: ClickEvent);

    fn cookie(&self) -> String;

    fn set_cookie(&self, cookie: &str);

    /// `history.replaceState` to `url` without navigating
    fn replace_url(&self, url: &Url);

    /// `location.hash = hash`
    fn set_hash(&self, hash: &str);

    /// Subscription to body subtree mutations; the value is a change counter
    fn mutations(&self) -> watch::Receiver<u64>;

    fn query_first(&self, selector: &Selector) -> Option<Element> {
        self.query_all(selector).into_iter().next()
    }
}
