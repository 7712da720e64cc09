use crate::coordinator::CoordinatorHandle;
use async_trait::async_trait;
use quicklaunch_core::{Error, MessageBus, Notice, Query, Reply, TabId};
use std::time::Duration;

/// Message bus from one tab's content script to an in-process coordinator
#[derive(Debug, Clone)]
pub struct LocalBus {
    handle: CoordinatorHandle,
    tab: Option<TabId>,
    reply_timeout: Duration,
}

impl LocalBus {
    pub fn new(handle: CoordinatorHandle, tab: Option<TabId>, reply_timeout: Duration) -> Self {
        Self {
            handle,
            tab,
            reply_timeout,
        }
    }
}

#[async_trait]
impl MessageBus for LocalBus {
    async fn notify(&self, notice: Notice) -> quicklaunch_core::Result<()> {
        self.handle
            .notify(self.tab, notice)
            .await
            .map_err(|e| Error::Messaging(e.to_string()))
    }

    async fn request(&self, query: Query) -> quicklaunch_core::Result<Reply> {
        match tokio::time::timeout(self.reply_timeout, self.handle.request(self.tab, query)).await {
            Ok(reply) => reply.map_err(|e| Error::Messaging(e.to_string())),
            Err(_) => Err(Error::Messaging(format!(
                "No reply to {} within {:?}",
                query.action(),
                self.reply_timeout
            ))),
        }
    }
}
