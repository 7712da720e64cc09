pub mod dispatcher;
pub mod dom;
pub mod handlers;
pub mod memory;
pub mod page;
pub mod script;

pub use dispatcher::{dispatch, resolve, DispatchOutcome, Resolution};
pub use dom::{observe_and_interact, poll, safe_click, Observation, PollOutcome, PollSchedule, Tick};
pub use handlers::{PageContext, PageHandler, REGISTRY};
pub use memory::{ElementSpec, MemoryPage};
pub use page::{ClickEvent, Element, NodeId, Page};
pub use script::ContentScript;
