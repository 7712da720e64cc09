use crate::{Notice, Query, Reply};
use async_trait::async_trait;

/// Content-script side of the runtime messaging channel
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Send a fire-and-forget message
    ///
    /// An error only means delivery could not be confirmed (for example the
    /// sending tab is closing); callers log it and carry on.
    async fn notify(&self, notice: Notice) -> crate::Result<()>;

    /// Send a message and wait for its reply
    async fn request(&self, query: Query) -> crate::Result<Reply>;
}
