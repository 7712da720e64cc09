use crate::{Error, Result};
use async_trait::async_trait;
use quicklaunch_core::protocol::CLEANUP_ACK;
use quicklaunch_core::{BackgroundMessage, TabId};
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

/// The browser's tab API as used by the coordinator
#[async_trait]
pub trait Tabs: Send + Sync {
    /// Close a tab; fails with [`Error::TabNotFound`] when it is already gone
    async fn remove(&self, tab: TabId) -> Result<()>;

    /// Deliver a message to the content script of a tab and return its reply
    async fn send_message(&self, tab: TabId, message: BackgroundMessage) -> Result<String>;
}

#[derive(Debug, Default)]
struct TabState {
    open: BTreeSet<TabId>,
    removed: Vec<TabId>,
    messages: Vec<(TabId, BackgroundMessage)>,
}

/// In-memory tab set
///
/// Every open tab answers `cleanupUrl` with the usual acknowledgement.
#[derive(Debug, Default)]
pub struct MemoryTabs {
    state: Mutex<TabState>,
}

impl MemoryTabs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open(tabs: &[TabId]) -> Self {
        let memory = Self::default();
        memory.state().open.extend(tabs.iter().copied());
        memory
    }

    fn state(&self) -> MutexGuard<'_, TabState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn open(&self, tab: TabId) {
        self.state().open.insert(tab);
    }

    pub fn is_open(&self, tab: TabId) -> bool {
        self.state().open.contains(&tab)
    }

    /// Tabs closed through [`Tabs::remove`], in order
    pub fn removed(&self) -> Vec<TabId> {
        self.state().removed.clone()
    }

    /// Messages delivered to open tabs, in order
    pub fn messages(&self) -> Vec<(TabId, BackgroundMessage)> {
        self.state().messages.clone()
    }
}

#[async_trait]
impl Tabs for MemoryTabs {
    async fn remove(&self, tab: TabId) -> Result<()> {
        let mut state = self.state();
        if !state.open.remove(&tab) {
            return Err(Error::TabNotFound(tab));
        }
        state.removed.push(tab);
        Ok(())
    }

    async fn send_message(&self, tab: TabId, message: BackgroundMessage) -> Result<String> {
        let mut state = self.state();
        if !state.open.contains(&tab) {
            return Err(Error::Messaging(format!(
                "Could not establish connection to tab {}",
                tab
            )));
        }
        state.messages.push((tab, message));
        match message {
            BackgroundMessage::CleanupUrl => Ok(CLEANUP_ACK.to_string()),
        }
    }
}
