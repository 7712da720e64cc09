pub mod error;
pub mod host_pattern;
pub mod messaging;
pub mod protocol;
pub mod selector;
pub mod selector_table;
pub mod settings;
pub mod store;
pub mod timings;
pub mod url_rule;

pub use error::{Error, Result};
pub use host_pattern::HostPattern;
pub use messaging::MessageBus;
pub use protocol::{BackgroundMessage, ContentMessage, Notice, Query, Reply, TabId};
pub use selector::Selector;
pub use selector_table::SelectorTable;
pub use settings::{GameType, Settings};
pub use store::{KeyValueStore, MemoryStore};
pub use timings::Timings;
pub use url_rule::{PathRule, UrlRule};
