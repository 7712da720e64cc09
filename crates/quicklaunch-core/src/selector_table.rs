//! Versioned table of DOM selectors and literal button texts, keyed by page category.
//!
//! The portal markup changes from time to time; handlers read every selector
//! from this table instead of hard-coding them.

use crate::Selector;
use serde::{Deserialize, Serialize};

/// Highest table version this build understands
pub const SUPPORTED_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorTable {
    pub version: u32,
    pub home: HomeSelectors,
    pub launcher: LauncherSelectors,
    pub security: SecuritySelectors,
    pub login: LoginSelectors,
    pub auth: AuthSelectors,
}

/// Game home page (`/main`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSelectors {
    /// Element inside the intro modal that identifies it
    pub intro_modal: Selector,
    /// Container holding the modal; blocks the start button while visible
    pub modal_container: Selector,
    /// "Don't show today" button
    pub today_close: Selector,
    /// Close (X) button
    pub close_x: Selector,
    /// Fallback candidates searched by text
    pub close_candidates: Selector,
    pub close_texts: Vec<String>,
    pub game_start: Selector,
    /// Cookie that suppresses the intro modal for a day
    pub intro_cookie: String,
}

/// Launcher / pubsvc game-start page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherSelectors {
    pub candidates: Selector,
    pub game_start: Selector,
    pub game_start_texts: Vec<String>,
    pub login_required_texts: Vec<String>,
    pub confirm: Selector,
    pub confirm_texts: Vec<String>,
}

/// Security center / designated PC page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySelectors {
    pub candidates: Selector,
    pub designated_confirm: Selector,
    pub popup_confirm: Selector,
    pub confirm_texts: Vec<String>,
}

/// Daum login relay page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSelectors {
    pub kakao_login: Selector,
    pub candidates: Selector,
    pub kakao_login_texts: Vec<String>,
}

/// Kakao account authorization page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSelectors {
    pub continue_button: Selector,
    pub candidates: Selector,
    pub continue_texts: Vec<String>,
    pub credential_inputs: Selector,
}

impl SelectorTable {
    /// Parse a table from JSON, rejecting versions newer than this build
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let table: SelectorTable = serde_json::from_str(json)?;
        if table.version > SUPPORTED_VERSION {
            return Err(crate::Error::InvalidSelector(format!(
                "Selector table version {} is newer than supported version {}",
                table.version, SUPPORTED_VERSION
            )));
        }
        Ok(table)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn builtin(source: &str) -> Selector {
    Selector::parse(source).expect("built-in selector must parse")
}

fn texts(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

impl Default for SelectorTable {
    fn default() -> Self {
        Self {
            version: SUPPORTED_VERSION,
            home: HomeSelectors {
                intro_modal: builtin("#kgIntroModalContents"),
                modal_container: builtin(".modal__container"),
                today_close: builtin(".modal__button-block"),
                close_x: builtin(".modal__button-x"),
                close_candidates: builtin("button, a"),
                close_texts: texts(&["닫기", "Close"]),
                game_start: builtin(".main-start__link"),
                intro_cookie: "POE2_INTRO_MODAL=1".to_string(),
            },
            launcher: LauncherSelectors {
                candidates: builtin(
                    "a, button, span.btn_g, .popup__link--confirm, #gameStart, .btn-start-game",
                ),
                game_start: builtin("#gameStart, .btn-start-game"),
                game_start_texts: texts(&["게임시작", "GAME START"]),
                login_required_texts: texts(&["로그인이 필요한 서비스", "로그인 하시겠습니까"]),
                confirm: builtin(".popup__link--confirm"),
                confirm_texts: texts(&["확인"]),
            },
            security: SecuritySelectors {
                candidates: builtin("a, button, span.btn_g, .popup__link--confirm, .btn-confirm"),
                designated_confirm: builtin(".btn-confirm"),
                popup_confirm: builtin(".popup__link--confirm"),
                confirm_texts: texts(&["확인"]),
            },
            login: LoginSelectors {
                kakao_login: builtin(".link_kakao, #kakaoLogin, .btn_kakao"),
                candidates: builtin("a, button"),
                kakao_login_texts: texts(&["카카오계정으로 로그인", "카카오 로그인"]),
            },
            auth: AuthSelectors {
                continue_button: builtin(".btn_confirm"),
                candidates: builtin("a, button"),
                continue_texts: texts(&["계속하기", "Continue"]),
                credential_inputs: builtin("#loginId--1, #password--2, input.tf_g"),
            },
        }
    }
}
