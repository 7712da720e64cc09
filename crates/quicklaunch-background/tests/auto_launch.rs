use async_trait::async_trait;
use quicklaunch_background::{spawn, CoordinatorHandle, Error, LocalBus, Result, Tabs};
use quicklaunch_content::{ContentScript, DispatchOutcome, ElementSpec, MemoryPage, Page, PageHandler};
use quicklaunch_core::protocol::{AUTO_SEQUENCE_KEY, MAIN_TAB_KEY};
use quicklaunch_core::settings::keys;
use quicklaunch_core::{BackgroundMessage, KeyValueStore, MemoryStore, TabId, Timings};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

const HOME: &str = "https://pathofexile2.game.daum.net/main#autoStart";
const COMPLETE: &str = "https://pubsvc.game.daum.net/gamestart/complete.html?gameCode=poe2";

/// Tabs whose content scripts answer background messages
#[derive(Default)]
struct BrowserTabs {
    scripts: Mutex<HashMap<TabId, Arc<ContentScript>>>,
}

impl BrowserTabs {
    fn attach(&self, tab: TabId, script: Arc<ContentScript>) {
        self.scripts.lock().unwrap().insert(tab, script);
    }

    fn is_open(&self, tab: TabId) -> bool {
        self.scripts.lock().unwrap().contains_key(&tab)
    }
}

#[async_trait]
impl Tabs for BrowserTabs {
    async fn remove(&self, tab: TabId) -> Result<()> {
        match self.scripts.lock().unwrap().remove(&tab) {
            Some(_) => Ok(()),
            None => Err(Error::TabNotFound(tab)),
        }
    }

    async fn send_message(&self, tab: TabId, message: BackgroundMessage) -> Result<String> {
        let script = self.scripts.lock().unwrap().get(&tab).cloned();
        match script {
            Some(script) => Ok(script.on_message(message).await),
            None => Err(Error::Messaging(format!("Tab {} has no receiver", tab))),
        }
    }
}

struct Browser {
    handle: CoordinatorHandle,
    session: MemoryStore,
    settings: MemoryStore,
    tabs: Arc<BrowserTabs>,
}

impl Browser {
    fn launch(flags: &[(&str, bool)]) -> Self {
        let session = MemoryStore::new();
        let settings = MemoryStore::with_values(
            flags
                .iter()
                .map(|(key, value)| (key.to_string(), json!(value)))
                .collect(),
        );
        let tabs = Arc::new(BrowserTabs::default());
        let (handle, _task) = spawn(Arc::new(session.clone()), tabs.clone(), Timings::default());
        Self {
            handle,
            session,
            settings,
            tabs,
        }
    }

    fn open(&self, tab: TabId, page: Arc<MemoryPage>) -> Arc<ContentScript> {
        let bus = LocalBus::new(self.handle.clone(), Some(tab), Timings::default().reply_timeout);
        let script = Arc::new(ContentScript::new(
            page,
            Arc::new(bus),
            Arc::new(self.settings.clone()),
        ));
        self.tabs.attach(tab, script.clone());
        script
    }
}

fn home_page() -> (Arc<MemoryPage>, usize) {
    let page = Arc::new(MemoryPage::new(Url::parse(HOME).unwrap()));
    let start = page.append(MemoryPage::BODY, ElementSpec::new("a").class("main-start__link"));
    (page, start)
}

/// Full chain with closeTab on: home tab is closed once the launch completes
#[tokio::test(start_paused = true)]
async fn test_auto_launch_closes_home_tab() {
    // Arrange
    let browser = Browser::launch(&[(keys::CLOSE_TAB, true), (keys::TUTORIAL_MODE, false)]);
    let (home, start) = home_page();
    let home_script = browser.open(1, home.clone());

    // Act - home page clicks start and registers itself
    let outcome = home_script.start().await;

    // Assert
    assert_eq!(outcome, DispatchOutcome::Executed(PageHandler::Home));
    assert_eq!(home.click_count(start), 1);
    let session = browser.session.snapshot().await;
    assert_eq!(session.get(MAIN_TAB_KEY), Some(&json!(1)));
    assert_eq!(session.get(AUTO_SEQUENCE_KEY), Some(&json!(true)));

    // Act - launcher chain ends on the completion page in a new tab
    let complete = Arc::new(MemoryPage::new(Url::parse(COMPLETE).unwrap()));
    let complete_script = browser.open(2, complete);
    assert_eq!(
        complete_script.start().await,
        DispatchOutcome::Executed(PageHandler::Completion)
    );

    // Assert - main tab closes after the delay
    assert!(browser.tabs.is_open(1));
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(!browser.tabs.is_open(1));
    assert!(browser.tabs.is_open(2));

    let session = browser.session.snapshot().await;
    assert_eq!(session.get(AUTO_SEQUENCE_KEY), Some(&json!(false)));
    assert!(!session.contains_key(MAIN_TAB_KEY));
}

/// Tutorial mode keeps the home tab open and strips its autoStart fragment
#[tokio::test(start_paused = true)]
async fn test_tutorial_mode_releases_home_tab() {
    // Arrange
    let browser = Browser::launch(&[(keys::CLOSE_TAB, true), (keys::TUTORIAL_MODE, true)]);
    let (home, _) = home_page();
    browser.open(1, home.clone()).start().await;

    // Act
    let complete = Arc::new(MemoryPage::new(Url::parse(COMPLETE).unwrap()));
    browser.open(2, complete).start().await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    // Assert
    assert!(browser.tabs.is_open(1));
    assert_eq!(home.location().as_str(), "https://pathofexile2.game.daum.net/main");
    assert!(!browser.session.snapshot().await.contains_key(MAIN_TAB_KEY));
}

/// A completion page visited by hand does not touch other tabs
#[tokio::test(start_paused = true)]
async fn test_manual_completion_visit_is_inert() {
    // Arrange
    let browser = Browser::launch(&[(keys::CLOSE_TAB, true)]);
    let home = Arc::new(MemoryPage::new(
        Url::parse("https://pathofexile2.game.daum.net/main").unwrap(),
    ));
    browser.open(1, home).start().await;

    // Act
    let complete = Arc::new(MemoryPage::new(Url::parse(COMPLETE).unwrap()));
    browser.open(2, complete).start().await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    // Assert
    assert!(browser.tabs.is_open(1));
    assert!(browser.session.snapshot().await.is_empty());
}

/// Fresh installs start in tutorial mode, so the home tab is only released
#[tokio::test(start_paused = true)]
async fn test_fresh_install_defaults_to_tutorial_mode() {
    // Arrange
    let browser = Browser::launch(&[(keys::CLOSE_TAB, true)]);
    quicklaunch_background::on_installed(&browser.settings, quicklaunch_background::InstallReason::Install)
        .await
        .unwrap();
    assert_eq!(
        browser.settings.get(keys::TUTORIAL_MODE).await.unwrap(),
        Some(json!(true))
    );
    let (home, start) = home_page();

    // Act
    browser.open(1, home.clone()).start().await;
    let complete = Arc::new(MemoryPage::new(Url::parse(COMPLETE).unwrap()));
    browser.open(2, complete).start().await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    // Assert
    assert_eq!(home.click_count(start), 1);
    assert!(browser.tabs.is_open(1));
    assert_eq!(home.location().fragment(), None);
}
