//! Messages exchanged between content scripts and the background coordinator.
//!
//! Every message is a JSON object tagged by its `action` field. Messages that
//! expect a reply are modelled as [`Query`]; everything else is a fire-and-forget
//! [`Notice`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Browser tab identifier
pub type TabId = i32;

/// Session storage key of the registered game home tab
pub const MAIN_TAB_KEY: &str = "mainGameTabId";

/// Session storage key of the auto-sequence flag
pub const AUTO_SEQUENCE_KEY: &str = "isAutoSequence";

/// Fragment that asks the home page to start the game automatically
pub const AUTO_START_FRAGMENT: &str = "autoStart";

/// Acknowledgement sent back for [`BackgroundMessage::CleanupUrl`]
pub const CLEANUP_ACK: &str = "cleaned";

/// Fire-and-forget message from a content script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Notice {
    /// Remember the sending tab as the game home tab
    RegisterMainTab,
    SetAutoSequence { value: bool },
    /// Close the registered home tab after a short delay
    CloseMainTab,
    /// Keep the registered home tab open but strip its auto-start fragment
    ReleaseMainTab,
    /// Close the sending tab
    CloseTab,
    /// Accepted for compatibility with older content scripts; has no effect
    LauncherGameStartClicked {
        #[serde(rename = "shouldCloseMainPage", default)]
        should_close_main_page: bool,
    },
}

impl Notice {
    pub fn action(&self) -> &'static str {
        match self {
            Notice::RegisterMainTab => "registerMainTab",
            Notice::SetAutoSequence { .. } => "setAutoSequence",
            Notice::CloseMainTab => "closeMainTab",
            Notice::ReleaseMainTab => "releaseMainTab",
            Notice::CloseTab => "closeTab",
            Notice::LauncherGameStartClicked { .. } => "launcherGameStartClicked",
        }
    }
}

/// Message from a content script that expects a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Query {
    CheckAutoSequence,
}

impl Query {
    pub fn action(&self) -> &'static str {
        match self {
            Query::CheckAutoSequence => "checkAutoSequence",
        }
    }
}

/// Current auto-sequence flag; absent when never set in this session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSequenceState {
    #[serde(
        rename = "isAutoSequence",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_auto_sequence: Option<bool>,
}

/// Reply to a [`Query`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    AutoSequence(AutoSequenceState),
}

impl Reply {
    pub fn auto_sequence(&self) -> Option<bool> {
        match self {
            Reply::AutoSequence(state) => state.is_auto_sequence,
        }
    }
}

/// Any message a content script can send, as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentMessage {
    Notice(Notice),
    Query(Query),
}

impl ContentMessage {
    pub fn from_json(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn expects_reply(&self) -> bool {
        matches!(self, ContentMessage::Query(_))
    }

    pub fn action(&self) -> &'static str {
        match self {
            ContentMessage::Notice(notice) => notice.action(),
            ContentMessage::Query(query) => query.action(),
        }
    }
}

/// Message from the background coordinator to a content script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum BackgroundMessage {
    /// Strip the auto-start fragment from the page URL; replied with [`CLEANUP_ACK`]
    CleanupUrl,
}
