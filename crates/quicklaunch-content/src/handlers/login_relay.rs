use super::PageContext;
use super::launcher::LAUNCHER_RULES;
use crate::dom::{observe_and_interact, safe_click};
use lazy_static::lazy_static;
use quicklaunch_core::{HostPattern, UrlRule};
use std::ops::ControlFlow;
use url::Url;

/// Navigations into the relay must come from the launch chain itself
pub(super) const ALLOWED_REFERRERS: &[&str] = &[
    "pubsvc.game.daum.net",
    "security-center*.game.daum.net",
    "logins.daum.net",
];

lazy_static! {
    pub(super) static ref REFERRER_HOSTS: Vec<HostPattern> = ALLOWED_REFERRERS
        .iter()
        .map(|pattern| HostPattern::parse(pattern).unwrap())
        .collect();
    static ref LOGIN_RELAY_RULES: Vec<UrlRule> = vec![
        UrlRule::new("logins.daum.net")
            .unwrap()
            .require_embedded_url("url", LAUNCHER_RULES.clone()),
    ];
}

pub(super) fn matches(url: &Url) -> bool {
    LOGIN_RELAY_RULES.iter().any(|rule| rule.matches(url))
}

pub(super) async fn execute(ctx: &PageContext<'_>) {
    tracing::info!("Page type: login relay");
    let selectors = &ctx.selectors.login;

    let observation = observe_and_interact(ctx.page, ctx.timings.observe_timeout, || {
        let button = ctx.page.query_first(&selectors.kakao_login).or_else(|| {
            ctx.page
                .query_all(&selectors.candidates)
                .into_iter()
                .find(|el| el.text_contains_any(&selectors.kakao_login_texts))
        });

        match button {
            Some(button) => {
                tracing::info!("Found Kakao login, clicking");
                safe_click(ctx.page, Some(&button));
                ControlFlow::Break(())
            }
            None => ControlFlow::Continue(()),
        }
    })
    .await;

    tracing::debug!("Login relay observer finished: {:?}", observation);
}
