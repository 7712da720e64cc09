use super::PageContext;
use lazy_static::lazy_static;
use quicklaunch_core::{Notice, PathRule, Query, Settings, UrlRule};
use url::Url;

lazy_static! {
    static ref COMPLETION_RULES: Vec<UrlRule> = vec![
        UrlRule::new("pubsvc.game.daum.net")
            .unwrap()
            .with_path(PathRule::Exact("/gamestart/complete.html".to_string()))
            .require_param("gameCode", &["poe", "poe2"]),
    ];
}

pub(super) fn matches(url: &Url) -> bool {
    COMPLETION_RULES.iter().any(|rule| rule.matches(url))
}

/// Finish an automated launch: close or release the home tab
///
/// A plain visit (no auto sequence in flight) leaves everything untouched.
pub(super) async fn execute(ctx: &PageContext<'_>, settings: &Settings) {
    tracing::info!("Page type: launch complete");

    let auto_sequence = match ctx.bus.request(Query::CheckAutoSequence).await {
        Ok(reply) => reply.auto_sequence(),
        Err(e) => {
            tracing::debug!("Auto sequence state unavailable: {}", e);
            None
        }
    };

    if auto_sequence != Some(true) {
        tracing::debug!("Not part of an auto sequence, nothing to do");
        return;
    }

    ctx.signal(Notice::SetAutoSequence { value: false }).await;

    if !settings.tutorial_mode && settings.close_tab {
        tracing::info!("Launch complete, closing home tab");
        ctx.signal(Notice::CloseMainTab).await;
    } else {
        tracing::info!("Launch complete, keeping home tab open");
        ctx.signal(Notice::ReleaseMainTab).await;
    }
}
