use super::PageContext;
use crate::dom::{observe_and_interact, safe_click};
use lazy_static::lazy_static;
use quicklaunch_core::{HostPattern, PathRule, UrlRule};
use std::ops::ControlFlow;
use url::Url;

pub(super) const ALLOWED_REFERRERS: &[&str] = &["logins.daum.net", "accounts.kakao.com"];

lazy_static! {
    pub(super) static ref REFERRER_HOSTS: Vec<HostPattern> = ALLOWED_REFERRERS
        .iter()
        .map(|pattern| HostPattern::parse(pattern).unwrap())
        .collect();
    static ref KAKAO_AUTH_RULES: Vec<UrlRule> = vec![
        UrlRule::new("accounts.kakao.com")
            .unwrap()
            .with_path(PathRule::Prefix("/login".to_string()))
            .require_embedded_url(
                "continue",
                vec![
                    UrlRule::new("kauth.kakao.com")
                        .unwrap()
                        .with_path(PathRule::Prefix("/oauth/authorize".to_string())),
                ],
            ),
    ];
}

pub(super) fn matches(url: &Url) -> bool {
    KAKAO_AUTH_RULES.iter().any(|rule| rule.matches(url))
}

/// Continue with the remembered Kakao account
///
/// Credentials are never touched: when the page asks for them the user has
/// to finish the login by hand.
pub(super) async fn execute(ctx: &PageContext<'_>) {
    tracing::info!("Page type: Kakao account authorization");
    let selectors = &ctx.selectors.auth;

    let observation = observe_and_interact(ctx.page, ctx.timings.observe_timeout, || {
        let button = ctx
            .page
            .query_all(&selectors.continue_button)
            .into_iter()
            .find(|el| el.visible)
            .or_else(|| {
                ctx.page
                    .query_all(&selectors.candidates)
                    .into_iter()
                    .find(|el| el.visible && el.text_is_any(&selectors.continue_texts))
            });

        if let Some(button) = button {
            tracing::info!("Found account continue button, clicking");
            safe_click(ctx.page, Some(&button));
            return ControlFlow::Break(());
        }

        if ctx
            .page
            .query_all(&selectors.credential_inputs)
            .iter()
            .any(|el| el.visible)
        {
            tracing::info!("Credential form shown, leaving login to the user");
            return ControlFlow::Break(());
        }

        ControlFlow::Continue(())
    })
    .await;

    tracing::debug!("Kakao auth observer finished: {:?}", observation);
}
