use super::PageContext;
use crate::dom::{observe_and_interact, safe_click};
use lazy_static::lazy_static;
use quicklaunch_core::UrlRule;
use std::ops::ControlFlow;
use url::Url;

lazy_static! {
    static ref SECURITY_CENTER_RULES: Vec<UrlRule> =
        vec![UrlRule::new("security-center*.game.daum.net").unwrap()];
}

pub(super) fn matches(url: &Url) -> bool {
    SECURITY_CENTER_RULES.iter().any(|rule| rule.matches(url))
}

/// Confirm the designated-PC prompt, falling back to any generic confirm
pub(super) async fn execute(ctx: &PageContext<'_>) {
    tracing::info!("Page type: security center");
    let selectors = &ctx.selectors.security;

    let observation = observe_and_interact(ctx.page, ctx.timings.observe_timeout, || {
        let candidates = ctx.page.query_all(&selectors.candidates);

        if let Some(button) = candidates.iter().find(|el| el.matches(&selectors.designated_confirm)) {
            tracing::info!("Found designated PC confirm, clicking");
            safe_click(ctx.page, Some(button));
            return ControlFlow::Break(());
        }

        match candidates
            .iter()
            .find(|el| el.matches(&selectors.popup_confirm) || el.text_is_any(&selectors.confirm_texts))
        {
            Some(button) => {
                tracing::info!("Found generic confirm, clicking");
                safe_click(ctx.page, Some(button));
                ControlFlow::Break(())
            }
            None => ControlFlow::Continue(()),
        }
    })
    .await;

    tracing::debug!("Security center observer finished: {:?}", observation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::RecordingBus;
    use crate::memory::{ElementSpec, MemoryPage};
    use quicklaunch_core::{SelectorTable, Timings};

    fn security_page() -> MemoryPage {
        MemoryPage::new(Url::parse("https://security-center.game.daum.net/designated-pc?gameCode=poe2").unwrap())
    }

    #[test]
    fn test_matches_numbered_hosts() {
        assert!(matches(&Url::parse("https://security-center2.game.daum.net/").unwrap()));
        assert!(!matches(&Url::parse("https://game.daum.net/security-center").unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_designated_confirm_wins_over_generic() {
        let page = security_page();
        let generic = page.append(MemoryPage::BODY, ElementSpec::new("button").text("확인"));
        let designated = page.append(MemoryPage::BODY, ElementSpec::new("a").class("btn-confirm"));
        page.append(designated, ElementSpec::new("span").class("btn-block__text").text("확인"));
        let bus = RecordingBus::default();
        let (selectors, timings) = (SelectorTable::default(), Timings::default());
        let ctx = PageContext {
            page: &page,
            bus: &bus,
            selectors: &selectors,
            timings: &timings,
        };

        execute(&ctx).await;

        assert_eq!(page.click_count(designated), 1);
        assert_eq!(page.click_count(generic), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generic_confirm_by_text() {
        let page = security_page();
        let confirm = page.append(MemoryPage::BODY, ElementSpec::new("button").text(" 확인 "));
        let bus = RecordingBus::default();
        let (selectors, timings) = (SelectorTable::default(), Timings::default());
        let ctx = PageContext {
            page: &page,
            bus: &bus,
            selectors: &selectors,
            timings: &timings,
        };

        execute(&ctx).await;

        assert_eq!(page.click_count(confirm), 1);
    }
}
