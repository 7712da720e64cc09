//! Background tab-lifecycle coordinator.
//!
//! A single actor task owns every read and write of the session state. Content
//! scripts reach it through a [`CoordinatorHandle`]; delayed tab closes and
//! outbound `cleanupUrl` messages run as spawned tasks that report back into
//! the actor's mailbox.

use crate::tabs::Tabs;
use crate::{Error, Result};
use quicklaunch_core::protocol::{AutoSequenceState, AUTO_SEQUENCE_KEY, MAIN_TAB_KEY};
use quicklaunch_core::{
    BackgroundMessage, ContentMessage, KeyValueStore, Notice, Query, Reply, TabId, Timings,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const MAILBOX_CAPACITY: usize = 64;

/// One-shot reply slot that travels with a [`Query`]
#[derive(Debug)]
pub struct Responder(oneshot::Sender<Reply>);

impl Responder {
    pub fn new() -> (Self, oneshot::Receiver<Reply>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    pub fn respond(self, reply: Reply) {
        if self.0.send(reply).is_err() {
            tracing::debug!("Requester went away before the reply was sent");
        }
    }
}

/// A message as received from a content script
#[derive(Debug)]
pub enum Inbound {
    Notify(Notice),
    Request(Query, Responder),
}

/// Inbound message plus the tab that sent it
#[derive(Debug)]
pub struct Envelope {
    pub sender: Option<TabId>,
    pub message: Inbound,
}

#[derive(Debug)]
enum Command {
    Deliver(Envelope),
    /// A delayed close of the main tab has finished
    MainTabClosed(TabId),
}

/// Cloneable entry point into the coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    pub async fn deliver(&self, envelope: Envelope) -> Result<()> {
        self.tx
            .send(Command::Deliver(envelope))
            .await
            .map_err(|_| Error::CoordinatorStopped)
    }

    pub async fn notify(&self, sender: Option<TabId>, notice: Notice) -> Result<()> {
        self.deliver(Envelope {
            sender,
            message: Inbound::Notify(notice),
        })
        .await
    }

    pub async fn request(&self, sender: Option<TabId>, query: Query) -> Result<Reply> {
        let (responder, reply) = Responder::new();
        self.deliver(Envelope {
            sender,
            message: Inbound::Request(query, responder),
        })
        .await?;
        reply.await.map_err(|_| Error::CoordinatorStopped)
    }

    /// JSON entry point mirroring the runtime `onMessage` listener
    ///
    /// Returns the reply for queries and `None` for notices. Unknown or
    /// malformed messages are logged and ignored.
    pub async fn handle_wire(&self, sender: Option<TabId>, message: Value) -> Option<Value> {
        let action = message
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("<missing>")
            .to_string();

        let parsed = match ContentMessage::from_json(message) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Ignoring unknown message '{}': {}", action, e);
                return None;
            }
        };

        match parsed {
            ContentMessage::Notice(notice) => {
                if let Err(e) = self.notify(sender, notice).await {
                    tracing::warn!("Dropped '{}': {}", action, e);
                }
                None
            }
            ContentMessage::Query(query) => match self.request(sender, query).await {
                Ok(reply) => serde_json::to_value(reply)
                    .map_err(|e| tracing::warn!("Failed to encode reply to '{}': {}", action, e))
                    .ok(),
                Err(e) => {
                    tracing::warn!("No reply to '{}': {}", action, e);
                    None
                }
            },
        }
    }
}

/// Actor state
pub struct Coordinator {
    session: Arc<dyn KeyValueStore>,
    tabs: Arc<dyn Tabs>,
    timings: Timings,
    rx: mpsc::Receiver<Command>,
    /// Weak so that outstanding timers do not keep the actor alive
    tx: mpsc::WeakSender<Command>,
}

/// Start the coordinator actor
///
/// The actor stops once every [`CoordinatorHandle`] has been dropped.
pub fn spawn(
    session: Arc<dyn KeyValueStore>,
    tabs: Arc<dyn Tabs>,
    timings: Timings,
) -> (CoordinatorHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
    let coordinator = Coordinator {
        session,
        tabs,
        timings,
        rx,
        tx: tx.downgrade(),
    };
    let task = tokio::spawn(coordinator.run());
    (CoordinatorHandle { tx }, task)
}

impl Coordinator {
    async fn run(mut self) {
        tracing::info!("Background coordinator started");
        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Deliver(Envelope { sender, message }) => match message {
                    Inbound::Notify(notice) => self.on_notice(sender, notice).await,
                    Inbound::Request(query, responder) => {
                        let reply = self.on_query(query).await;
                        responder.respond(reply);
                    }
                },
                Command::MainTabClosed(tab) => clear_main_tab_if(self.session.as_ref(), tab).await,
            }
        }
        tracing::info!("Background coordinator stopped");
    }

    async fn on_notice(&self, sender: Option<TabId>, notice: Notice) {
        tracing::debug!("Received {} from tab {:?}", notice.action(), sender);
        match notice {
            Notice::RegisterMainTab => match sender {
                Some(tab) => {
                    self.write(MAIN_TAB_KEY, json!(tab)).await;
                    tracing::info!("Registered main game tab {}", tab);
                }
                None => tracing::debug!("registerMainTab without a sender tab, ignoring"),
            },
            Notice::SetAutoSequence { value } => {
                tracing::info!("Setting auto sequence flag to {}", value);
                self.write(AUTO_SEQUENCE_KEY, json!(value)).await;
            }
            Notice::CloseMainTab => self.close_main_tab().await,
            Notice::ReleaseMainTab => self.release_main_tab().await,
            Notice::CloseTab => match sender {
                Some(tab) => {
                    let tabs = self.tabs.clone();
                    tokio::spawn(async move {
                        if let Err(e) = tabs.remove(tab).await {
                            tracing::warn!("Failed to close tab {}: {}", tab, e);
                        }
                    });
                }
                None => tracing::debug!("closeTab without a sender tab, ignoring"),
            },
            Notice::LauncherGameStartClicked { should_close_main_page } => {
                tracing::debug!(
                    "Ignoring legacy launcherGameStartClicked (shouldCloseMainPage: {})",
                    should_close_main_page
                );
            }
        }
    }

    async fn on_query(&self, query: Query) -> Reply {
        match query {
            Query::CheckAutoSequence => {
                let is_auto_sequence = self.read(AUTO_SEQUENCE_KEY).await.and_then(|v| v.as_bool());
                Reply::AutoSequence(AutoSequenceState { is_auto_sequence })
            }
        }
    }

    async fn close_main_tab(&self) {
        let Some(tab) = self.main_tab().await else {
            tracing::warn!("Received closeMainTab but no main tab is registered");
            return;
        };

        tracing::info!(
            "Closing main game tab {} in {:?}",
            tab,
            self.timings.close_delay
        );

        let tabs = self.tabs.clone();
        let session = self.session.clone();
        let delay = self.timings.close_delay;
        let mailbox = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match tabs.remove(tab).await {
                Ok(()) => tracing::info!("Main game tab {} closed", tab),
                Err(e) => tracing::warn!("Failed to close tab {} (maybe already closed): {}", tab, e),
            }

            let delivered = match mailbox.upgrade() {
                Some(mailbox) => mailbox.send(Command::MainTabClosed(tab)).await.is_ok(),
                None => false,
            };
            // The actor is gone, so nothing else writes the session now
            if !delivered {
                tracing::debug!("Coordinator stopped while closing tab {}, clearing directly", tab);
                clear_main_tab_if(session.as_ref(), tab).await;
            }
        });
    }

    async fn release_main_tab(&self) {
        let Some(tab) = self.main_tab().await else {
            tracing::debug!("Received releaseMainTab but no main tab is registered");
            return;
        };

        self.remove(MAIN_TAB_KEY).await;

        let tabs = self.tabs.clone();
        tokio::spawn(async move {
            match tabs.send_message(tab, BackgroundMessage::CleanupUrl).await {
                Ok(reply) => tracing::info!("Main game tab {} cleaned up ({})", tab, reply),
                Err(e) => tracing::warn!("Could not clean up main game tab {}: {}", tab, e),
            }
        });
    }

    async fn main_tab(&self) -> Option<TabId> {
        main_tab(self.session.as_ref()).await
    }

    async fn read(&self, key: &str) -> Option<Value> {
        read(self.session.as_ref(), key).await
    }

    async fn write(&self, key: &str, value: Value) {
        if let Err(e) = self.session.set(key, value).await {
            tracing::warn!("Failed to write session key {}: {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        remove(self.session.as_ref(), key).await
    }
}

/// Clear the main tab entry unless it was re-registered meanwhile
async fn clear_main_tab_if(session: &dyn KeyValueStore, closed: TabId) {
    match main_tab(session).await {
        Some(current) if current == closed => remove(session, MAIN_TAB_KEY).await,
        Some(current) => tracing::debug!(
            "Main tab changed to {} while closing {}, keeping it",
            current,
            closed
        ),
        None => {}
    }
}

async fn main_tab(session: &dyn KeyValueStore) -> Option<TabId> {
    read(session, MAIN_TAB_KEY)
        .await
        .and_then(|v| v.as_i64())
        .and_then(|id| TabId::try_from(id).ok())
}

async fn read(session: &dyn KeyValueStore, key: &str) -> Option<Value> {
    match session.get(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to read session key {}: {}", key, e);
            None
        }
    }
}

async fn remove(session: &dyn KeyValueStore, key: &str) {
    if let Err(e) = session.remove(key).await {
        tracing::warn!("Failed to remove session key {}: {}", key, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabs::MemoryTabs;
    use quicklaunch_core::MemoryStore;
    use std::time::Duration;

    struct Fixture {
        handle: CoordinatorHandle,
        session: MemoryStore,
        tabs: Arc<MemoryTabs>,
    }

    fn start(open: &[TabId]) -> Fixture {
        let session = MemoryStore::new();
        let tabs = Arc::new(MemoryTabs::with_open(open));
        let (handle, _task) = spawn(Arc::new(session.clone()), tabs.clone(), Timings::default());
        Fixture {
            handle,
            session,
            tabs,
        }
    }

    async fn check(handle: &CoordinatorHandle) -> Option<bool> {
        handle
            .request(Some(1), Query::CheckAutoSequence)
            .await
            .unwrap()
            .auto_sequence()
    }

    #[tokio::test]
    async fn test_auto_sequence_flag_round_trip() {
        let f = start(&[]);
        assert_eq!(check(&f.handle).await, None);

        f.handle
            .notify(Some(1), Notice::SetAutoSequence { value: true })
            .await
            .unwrap();
        assert_eq!(check(&f.handle).await, Some(true));

        f.handle
            .notify(Some(2), Notice::SetAutoSequence { value: false })
            .await
            .unwrap();
        assert_eq!(check(&f.handle).await, Some(false));
    }

    #[tokio::test]
    async fn test_wire_reply_shapes() {
        let f = start(&[]);
        let reply = f
            .handle
            .handle_wire(Some(1), json!({"action": "checkAutoSequence"}))
            .await;
        assert_eq!(reply, Some(json!({})));

        let ack = f
            .handle
            .handle_wire(Some(1), json!({"action": "setAutoSequence", "value": true}))
            .await;
        assert_eq!(ack, None);

        let reply = f
            .handle
            .handle_wire(Some(1), json!({"action": "checkAutoSequence"}))
            .await;
        assert_eq!(reply, Some(json!({"isAutoSequence": true})));
    }

    #[tokio::test]
    async fn test_unknown_action_ignored() {
        let f = start(&[]);
        assert_eq!(f.handle.handle_wire(Some(1), json!({"action": "selfDestruct"})).await, None);
        assert_eq!(f.handle.handle_wire(Some(1), json!("not an object")).await, None);
        assert!(f.session.snapshot().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_main_tab_waits_then_clears() {
        let f = start(&[10, 20]);
        f.handle.notify(Some(10), Notice::RegisterMainTab).await.unwrap();
        f.handle.notify(Some(20), Notice::CloseMainTab).await.unwrap();

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert!(f.tabs.is_open(10));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!f.tabs.is_open(10));
        assert!(f.tabs.is_open(20));
        // round trip through the mailbox so the clear has been processed
        check(&f.handle).await;
        assert!(!f.session.snapshot().await.contains_key(MAIN_TAB_KEY));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_main_tab_already_closed_still_clears() {
        let f = start(&[]);
        f.handle.notify(Some(10), Notice::RegisterMainTab).await.unwrap();
        f.handle.notify(Some(20), Notice::CloseMainTab).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        check(&f.handle).await;
        assert!(f.tabs.removed().is_empty());
        assert!(!f.session.snapshot().await.contains_key(MAIN_TAB_KEY));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_main_tab_clears_after_coordinator_stops() {
        let f = start(&[10]);
        f.handle.notify(Some(10), Notice::RegisterMainTab).await.unwrap();
        f.handle.notify(Some(20), Notice::CloseMainTab).await.unwrap();
        check(&f.handle).await;
        let Fixture { handle, session, tabs } = f;
        drop(handle);

        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(tabs.removed(), vec![10]);
        assert!(!session.snapshot().await.contains_key(MAIN_TAB_KEY));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_main_tab_without_registration_is_noop() {
        let f = start(&[10]);
        f.handle.notify(Some(20), Notice::CloseMainTab).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(f.tabs.is_open(10));
        assert!(f.tabs.removed().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reregistration_during_close_survives() {
        let f = start(&[10, 11]);
        f.handle.notify(Some(10), Notice::RegisterMainTab).await.unwrap();
        f.handle.notify(Some(20), Notice::CloseMainTab).await.unwrap();
        f.handle.notify(Some(11), Notice::RegisterMainTab).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        check(&f.handle).await;

        assert_eq!(f.tabs.removed(), vec![10]);
        assert_eq!(f.session.snapshot().await.get(MAIN_TAB_KEY), Some(&json!(11)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_tab_is_immediate() {
        let f = start(&[5]);
        f.handle.notify(Some(5), Notice::CloseTab).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(f.tabs.removed(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_main_tab_sends_cleanup() {
        let f = start(&[10]);
        f.handle.notify(Some(10), Notice::RegisterMainTab).await.unwrap();
        f.handle.notify(Some(30), Notice::ReleaseMainTab).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(f.tabs.messages(), vec![(10, BackgroundMessage::CleanupUrl)]);
        assert!(f.tabs.is_open(10));
        assert!(!f.session.snapshot().await.contains_key(MAIN_TAB_KEY));
    }

    #[tokio::test]
    async fn test_legacy_signal_has_no_effect() {
        let f = start(&[10]);
        f.handle.notify(Some(10), Notice::RegisterMainTab).await.unwrap();
        f.handle
            .handle_wire(
                Some(12),
                json!({"action": "launcherGameStartClicked", "shouldCloseMainPage": true}),
            )
            .await;
        check(&f.handle).await;

        assert!(f.tabs.is_open(10));
        assert_eq!(f.session.snapshot().await.get(MAIN_TAB_KEY), Some(&json!(10)));
    }

    #[tokio::test]
    async fn test_actor_stops_when_handles_dropped() {
        let (handle, task) = spawn(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryTabs::new()),
            Timings::default(),
        );
        drop(handle);
        task.await.unwrap();
    }
}
