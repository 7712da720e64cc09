use super::PageContext;
use crate::dom::{observe_and_interact, safe_click};
use crate::page::Element;
use lazy_static::lazy_static;
use quicklaunch_core::{PathRule, UrlRule};
use std::ops::ControlFlow;
use url::Url;

lazy_static! {
    /// Game-start pages on the publisher service
    pub(crate) static ref LAUNCHER_RULES: Vec<UrlRule> = vec![
        UrlRule::new("pubsvc.game.daum.net")
            .unwrap()
            .with_path(PathRule::Prefix("/gamestart/".to_string())),
    ];
}

pub(super) fn matches(url: &Url) -> bool {
    LAUNCHER_RULES.iter().any(|rule| rule.matches(url))
}

pub(super) async fn execute(ctx: &PageContext<'_>) {
    tracing::info!("Page type: launcher");
    let selectors = &ctx.selectors.launcher;

    let observation = observe_and_interact(ctx.page, ctx.timings.launcher_timeout, || {
        let candidates = ctx.page.query_all(&selectors.candidates);
        let body = ctx.page.body_text();

        if selectors
            .login_required_texts
            .iter()
            .any(|text| body.contains(text.as_str()))
        {
            tracing::debug!("Login required popup detected");
            let confirm = candidates
                .iter()
                .find(|el| el.matches(&selectors.confirm) || el.text_is_any(&selectors.confirm_texts));
            return match confirm {
                Some(button) => {
                    tracing::info!("Confirming login popup");
                    safe_click(ctx.page, Some(button));
                    ControlFlow::Break(())
                }
                None => ControlFlow::Continue(()),
            };
        }

        match candidates.iter().find(|el| is_game_start(el, ctx)) {
            Some(button) => {
                tracing::info!("Launcher game start found, clicking");
                safe_click(ctx.page, Some(button));
                ControlFlow::Break(())
            }
            None => ControlFlow::Continue(()),
        }
    })
    .await;

    if !observation.succeeded() {
        tracing::info!("Launcher page left for manual completion ({:?})", observation);
    }
}

fn is_game_start(el: &Element, ctx: &PageContext<'_>) -> bool {
    let selectors = &ctx.selectors.launcher;
    el.matches(&selectors.game_start) || el.text_is_any(&selectors.game_start_texts)
}
