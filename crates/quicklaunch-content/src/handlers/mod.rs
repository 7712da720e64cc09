//! Page handlers and their registry.
//!
//! Each handler binds a structural URL predicate, an optional referrer
//! allow-list and an action. The registry order decides which handler owns a
//! page when several predicates match.

mod completion;
mod home;
mod kakao_auth;
mod launcher;
mod login_relay;
mod security_center;

pub use home::is_auto_start;

use crate::page::Page;
use quicklaunch_core::{HostPattern, MessageBus, Notice, SelectorTable, Settings, Timings};
use url::Url;

/// Everything a handler needs to act on its page
pub struct PageContext<'a> {
    pub page: &'a dyn Page,
    pub bus: &'a dyn MessageBus,
    pub selectors: &'a SelectorTable,
    pub timings: &'a Timings,
}

impl PageContext<'_> {
    /// Send a fire-and-forget message, tolerating a lost delivery
    pub async fn signal(&self, notice: Notice) {
        let action = notice.action();
        match self.bus.notify(notice).await {
            Ok(()) => tracing::debug!("Sent {}", action),
            Err(e) => tracing::debug!("{} sent without acknowledgement: {}", action, e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageHandler {
    Home,
    SecurityCenter,
    LoginRelay,
    KakaoAuth,
    Completion,
    Launcher,
}

/// Handlers in match order; the first structural match owns the page
pub const REGISTRY: [PageHandler; 6] = [
    PageHandler::Home,
    PageHandler::SecurityCenter,
    PageHandler::LoginRelay,
    PageHandler::KakaoAuth,
    PageHandler::Completion,
    PageHandler::Launcher,
];

impl PageHandler {
    pub fn name(&self) -> &'static str {
        match self {
            PageHandler::Home => "home",
            PageHandler::SecurityCenter => "security-center",
            PageHandler::LoginRelay => "login-relay",
            PageHandler::KakaoAuth => "kakao-auth",
            PageHandler::Completion => "completion",
            PageHandler::Launcher => "launcher",
        }
    }

    /// Structural match on the page URL only
    pub fn matches(&self, url: &Url) -> bool {
        match self {
            PageHandler::Home => home::matches(url),
            PageHandler::SecurityCenter => security_center::matches(url),
            PageHandler::LoginRelay => login_relay::matches(url),
            PageHandler::KakaoAuth => kakao_auth::matches(url),
            PageHandler::Completion => completion::matches(url),
            PageHandler::Launcher => launcher::matches(url),
        }
    }

    /// Host patterns of which the referrer's host must match at least one
    pub fn allowed_referrers(&self) -> Option<&'static [&'static str]> {
        match self {
            PageHandler::LoginRelay => Some(login_relay::ALLOWED_REFERRERS),
            PageHandler::KakaoAuth => Some(kakao_auth::ALLOWED_REFERRERS),
            _ => None,
        }
    }

    fn referrer_hosts(&self) -> Option<&'static [HostPattern]> {
        match self {
            PageHandler::LoginRelay => Some(login_relay::REFERRER_HOSTS.as_slice()),
            PageHandler::KakaoAuth => Some(kakao_auth::REFERRER_HOSTS.as_slice()),
            _ => None,
        }
    }

    /// An empty or unparseable referrer fails any allow-list
    pub fn referrer_allowed(&self, referrer: &str) -> bool {
        let Some(allowed) = self.referrer_hosts() else {
            return true;
        };
        let Ok(referrer) = Url::parse(referrer) else {
            return false;
        };
        match referrer.host_str() {
            Some(host) => allowed.iter().any(|pattern| pattern.matches(host)),
            None => false,
        }
    }

    pub async fn execute(&self, ctx: &PageContext<'_>, settings: &Settings) {
        match self {
            PageHandler::Home => home::execute(ctx, settings).await,
            PageHandler::SecurityCenter => security_center::execute(ctx).await,
            PageHandler::LoginRelay => login_relay::execute(ctx).await,
            PageHandler::KakaoAuth => kakao_auth::execute(ctx).await,
            PageHandler::Completion => completion::execute(ctx, settings).await,
            PageHandler::Launcher => launcher::execute(ctx).await,
        }
    }
}
