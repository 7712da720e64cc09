use super::PageContext;
use crate::dom::{poll, safe_click, PollOutcome, PollSchedule, Tick};
use crate::page::Element;
use lazy_static::lazy_static;
use quicklaunch_core::protocol::AUTO_START_FRAGMENT;
use quicklaunch_core::{Notice, PathRule, Settings, UrlRule};
use std::time::Duration;
use url::Url;

/// Lifetime of the cookie that suppresses the intro modal
const INTRO_COOKIE_ATTRIBUTES: &str = "path=/; max-age=86400";

lazy_static! {
    static ref HOME_RULES: Vec<UrlRule> = vec![
        UrlRule::new("pathofexile2.game.daum.net")
            .unwrap()
            .with_path(PathRule::Prefix("/main".to_string())),
        UrlRule::new("poe.game.daum.net")
            .unwrap()
            .with_path(PathRule::Exact("/".to_string())),
    ];
}

pub(super) fn matches(url: &Url) -> bool {
    HOME_RULES.iter().any(|rule| rule.matches(url))
}

/// The URL fragment asks for an automated launch
pub fn is_auto_start(url: &Url) -> bool {
    url.fragment()
        .is_some_and(|fragment| fragment.contains(AUTO_START_FRAGMENT))
}

pub(super) async fn execute(ctx: &PageContext<'_>, settings: &Settings) {
    tracing::info!("Page type: game home");

    if settings.close_popup {
        suppress_intro_cookie(ctx);
    }
    let today_close = async {
        if settings.close_popup {
            close_intro_for_today(ctx).await;
        }
    };

    if !is_auto_start(&ctx.page.location()) {
        today_close.await;
        return;
    }

    tracing::info!("Auto start requested on home page");
    ctx.signal(Notice::RegisterMainTab).await;
    ctx.signal(Notice::SetAutoSequence { value: true }).await;

    tokio::join!(today_close, dismiss_intro_modal(ctx), click_start_button(ctx));
}

fn suppress_intro_cookie(ctx: &PageContext<'_>) {
    let cookie = &ctx.selectors.home.intro_cookie;
    if !ctx.page.cookie().contains(cookie.as_str()) {
        tracing::debug!("Setting intro modal cookie");
        ctx.page
            .set_cookie(&format!("{}; {}", cookie, INTRO_COOKIE_ATTRIBUTES));
    }
}

/// Container of the intro modal, if the modal is in the document
fn intro_container(ctx: &PageContext<'_>) -> Option<Element> {
    let selectors = &ctx.selectors.home;
    let intro = ctx.page.query_first(&selectors.intro_modal)?;
    ctx.page.closest(&intro, &selectors.modal_container)
}

/// Try `attempt` now, then on every interval until it succeeds or time runs out
async fn retry_until<F>(interval: Duration, timeout: Duration, mut attempt: F) -> bool
where
    F: FnMut() -> bool,
{
    if attempt() {
        return true;
    }

    let schedule = PollSchedule {
        interval,
        max_attempts: None,
        timeout: Some(timeout),
    };
    let outcome = poll(&schedule, |_| if attempt() { Tick::Done } else { Tick::Retry }).await;
    matches!(outcome, PollOutcome::Done { .. })
}

async fn close_intro_for_today(ctx: &PageContext<'_>) {
    let timings = ctx.timings;
    let closed = retry_until(timings.modal_interval, timings.modal_timeout, || {
        let Some(container) = intro_container(ctx) else {
            return false;
        };
        match ctx
            .page
            .query_within(&container, &ctx.selectors.home.today_close)
            .into_iter()
            .next()
        {
            Some(button) => {
                tracing::info!("Found intro modal \"today close\" button, clicking");
                safe_click(ctx.page, Some(&button));
                true
            }
            None => false,
        }
    })
    .await;

    if !closed {
        tracing::debug!("No intro modal to close for today");
    }
}

async fn dismiss_intro_modal(ctx: &PageContext<'_>) {
    let timings = ctx.timings;
    let selectors = &ctx.selectors.home;

    let dismissed = retry_until(timings.modal_interval, timings.modal_timeout, || {
        let Some(container) = intro_container(ctx) else {
            tracing::debug!("Intro modal not found");
            return false;
        };

        let close_x = ctx
            .page
            .query_within(&container, &selectors.close_x)
            .into_iter()
            .find(|el| el.visible);
        if let Some(button) = close_x {
            tracing::info!("Clicking visible intro modal close button");
            safe_click(ctx.page, Some(&button));
            return true;
        }

        let by_text = ctx
            .page
            .query_within(&container, &selectors.close_candidates)
            .into_iter()
            .find(|el| el.visible && el.text_contains_any(&selectors.close_texts));
        match by_text {
            Some(button) => {
                tracing::info!("Found intro modal text button: \"{}\"", button.trimmed_text());
                safe_click(ctx.page, Some(&button));
                true
            }
            None => false,
        }
    })
    .await;

    tracing::debug!("Intro modal dismissal finished (dismissed: {})", dismissed);
}

/// Poll for the start control and click it exactly once
async fn click_start_button(ctx: &PageContext<'_>) {
    let timings = ctx.timings;
    let schedule = PollSchedule {
        interval: timings.start_button_interval,
        max_attempts: Some(timings.start_button_max_attempts),
        timeout: Some(timings.start_button_timeout),
    };

    let outcome = poll(&schedule, |attempt| {
        if !ctx.page.has_focus() {
            tracing::debug!("Page lost focus, skipping click this tick");
            return Tick::Skip;
        }

        if intro_container(ctx).is_some_and(|container| container.visible) {
            tracing::debug!("[Attempt {}] Intro modal still blocking the page", attempt);
            return Tick::Retry;
        }

        match ctx.page.query_first(&ctx.selectors.home.game_start) {
            Some(button) => {
                tracing::info!("[Attempt {}] Found start button, clicking", attempt);
                safe_click(ctx.page, Some(&button));
                Tick::Done
            }
            None => {
                tracing::debug!("[Attempt {}] Start button not found yet", attempt);
                Tick::Retry
            }
        }
    })
    .await;

    match outcome {
        PollOutcome::Done { .. } => tracing::info!("Start button clicked, polling stopped"),
        PollOutcome::Exhausted { attempts } | PollOutcome::TimedOut { attempts } => {
            tracing::info!("Stopped polling for start button after {} attempts", attempts)
        }
    }
}
