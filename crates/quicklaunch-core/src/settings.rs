use crate::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Storage keys of the persisted settings
pub mod keys {
    pub const CLOSE_TAB: &str = "closeTab";
    pub const CLOSE_POPUP: &str = "closePopup";
    pub const PLUGIN_DISABLED: &str = "pluginDisable";
    pub const TUTORIAL_MODE: &str = "isTutorialMode";
    pub const PATCH_NOTE_COUNT: &str = "patchNoteCount";
    pub const SELECTED_GAME: &str = "selectedGame";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Poe,
    Poe2,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Poe => "poe",
            GameType::Poe2 => "poe2",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "poe" => Some(GameType::Poe),
            "poe2" => Some(GameType::Poe2),
            _ => None,
        }
    }
}

/// User settings read by the content scripts
///
/// Missing or mistyped keys fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Close the game home tab once the launch chain completes
    pub close_tab: bool,
    /// Dismiss the intro modal with its "don't show today" button
    pub close_popup: bool,
    /// Disable all page automation
    pub plugin_disable: bool,
    /// Guided mode for new installs; keeps the home tab open
    pub tutorial_mode: bool,
    pub patch_note_count: u8,
    pub selected_game: GameType,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            close_tab: false,
            close_popup: false,
            plugin_disable: false,
            tutorial_mode: false,
            patch_note_count: 4,
            selected_game: GameType::Poe2,
        }
    }
}

impl Settings {
    pub const MAX_PATCH_NOTE_COUNT: u8 = 20;

    /// Build settings from a raw storage snapshot
    pub fn from_map(values: &Map<String, Value>) -> Self {
        let defaults = Settings::default();
        let flag = |key: &str, default: bool| {
            values.get(key).and_then(Value::as_bool).unwrap_or(default)
        };

        Self {
            close_tab: flag(keys::CLOSE_TAB, defaults.close_tab),
            close_popup: flag(keys::CLOSE_POPUP, defaults.close_popup),
            plugin_disable: flag(keys::PLUGIN_DISABLED, defaults.plugin_disable),
            tutorial_mode: flag(keys::TUTORIAL_MODE, defaults.tutorial_mode),
            patch_note_count: values
                .get(keys::PATCH_NOTE_COUNT)
                .and_then(Value::as_u64)
                .filter(|n| (1..=Self::MAX_PATCH_NOTE_COUNT as u64).contains(n))
                .map(|n| n as u8)
                .unwrap_or(defaults.patch_note_count),
            selected_game: values
                .get(keys::SELECTED_GAME)
                .and_then(Value::as_str)
                .and_then(GameType::parse)
                .unwrap_or(defaults.selected_game),
        }
    }

    /// Load settings with a bulk read of the store
    ///
    /// A failing store yields the defaults; the content script must still run.
    pub async fn load(store: &dyn KeyValueStore) -> Self {
        match store.get_all().await {
            Ok(values) => Self::from_map(&values),
            Err(e) => {
                tracing::warn!("Failed to read settings, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Persist a single setting
    pub async fn save(store: &dyn KeyValueStore, key: &str, value: Value) -> crate::Result<()> {
        store.set(key, value).await
    }
}
