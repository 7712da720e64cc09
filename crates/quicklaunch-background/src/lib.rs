// Background process: session state and tab lifecycle

pub mod bus;
pub mod coordinator;
pub mod error;
pub mod lifecycle;
pub mod tabs;

pub use bus::LocalBus;
pub use coordinator::{spawn, CoordinatorHandle, Envelope, Inbound, Responder};
pub use error::{Error, Result};
pub use lifecycle::{on_installed, InstallReason};
pub use tabs::{MemoryTabs, Tabs};
