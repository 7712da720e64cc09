use crate::handlers::{PageContext, PageHandler, REGISTRY};
use quicklaunch_core::Settings;
use url::Url;

/// Which handler, if any, owns a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Matched(PageHandler),
    /// The first structural match failed its referrer check
    Rejected(PageHandler),
    NoMatch,
}

/// Resolve a page against the registry
///
/// Only the first structural match is considered. A failed referrer check
/// rejects the page outright; later handlers are never tried.
pub fn resolve(url: &Url, referrer: &str) -> Resolution {
    let Some(handler) = REGISTRY.iter().copied().find(|h| h.matches(url)) else {
        return Resolution::NoMatch;
    };

    if handler.referrer_allowed(referrer) {
        Resolution::Matched(handler)
    } else {
        Resolution::Rejected(handler)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Disabled,
    NoMatch,
    Rejected(PageHandler),
    Executed(PageHandler),
}

/// Run the handler that owns the current page, at most once
pub async fn dispatch(ctx: &PageContext<'_>, settings: &Settings) -> DispatchOutcome {
    if settings.plugin_disable {
        tracing::info!("Automation disabled by user setting, skipping all page logic");
        return DispatchOutcome::Disabled;
    }

    let url = ctx.page.location();
    let referrer = ctx.page.referrer();
    tracing::debug!("Dispatching page logic for {}", url);

    match resolve(&url, &referrer) {
        Resolution::NoMatch => {
            tracing::debug!(
                "No page logic for host {} path {}",
                url.host_str().unwrap_or(""),
                url.path()
            );
            DispatchOutcome::NoMatch
        }
        Resolution::Rejected(handler) => {
            tracing::warn!(
                "Referrer check failed for {} (referrer: {:?}), aborting",
                handler.name(),
                referrer
            );
            DispatchOutcome::Rejected(handler)
        }
        Resolution::Matched(handler) => {
            tracing::info!("Page matched handler {}", handler.name());
            handler.execute(ctx, settings).await;
            DispatchOutcome::Executed(handler)
        }
    }
}
