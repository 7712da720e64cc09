use crate::page::{ClickEvent, Element, Page};
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

/// Click an element without tripping the page's content security policy
///
/// A `javascript:` link gets a cancelable click with its default action
/// already prevented: listeners bound to the element still run, but the
/// browser never attempts the blocked navigation.
pub fn safe_click(page: &dyn Page, element: Option<&Element>) {
    let Some(element) = element else {
        return;
    };

    if element.is_pseudo_link() {
        let mut event = ClickEvent::synthetic();
        event.prevent_default();
        page.dispatch_click(element, event);
        return;
    }

    if page.native_click(element) {
        return;
    }

    page.dispatch_click(element, ClickEvent::synthetic());
}

/// How an element observer finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The first check succeeded; no observer was installed
    Immediate,
    /// A check after a mutation succeeded
    Observed,
    /// The safety timeout fired first
    TimedOut,
    /// The document went away
    Detached,
}

impl Observation {
    pub fn succeeded(&self) -> bool {
        matches!(self, Observation::Immediate | Observation::Observed)
    }
}

/// Run `check` now and after every batch of body mutations until it breaks
///
/// The watcher stops when `check` returns `ControlFlow::Break(())` or when
/// `timeout` elapses, whichever comes first. `check` is never called after
/// the watcher stops.
pub async fn observe_and_interact<F>(page: &dyn Page, timeout: Duration, mut check: F) -> Observation
where
    F: FnMut() -> ControlFlow<()>,
{
    let mut mutations = page.mutations();
    mutations.borrow_and_update();

    if check().is_break() {
        return Observation::Immediate;
    }

    tracing::debug!("Target not found immediately, starting observer");

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                tracing::debug!("Observer timed out after {:?}", timeout);
                return Observation::TimedOut;
            }
            changed = mutations.changed() => {
                if changed.is_err() {
                    tracing::debug!("Document detached, stopping observer");
                    return Observation::Detached;
                }
                if check().is_break() {
                    return Observation::Observed;
                }
            }
        }
    }
}

/// Floor applied to polling intervals
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Interval polling parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSchedule {
    pub interval: Duration,
    /// Cap on counted attempts
    pub max_attempts: Option<u32>,
    /// Wall-clock cap, measured from the start of polling
    pub timeout: Option<Duration>,
}

/// Result of one polling tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Done,
    /// Not there yet; counts as an attempt
    Retry,
    /// Conditions not right to try (e.g. page unfocused); not counted
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Done { attempts: u32 },
    Exhausted { attempts: u32 },
    TimedOut { attempts: u32 },
}

/// Call `tick` every `schedule.interval`, first after one interval
///
/// `tick` receives the number of the attempt it would count as. Intervals
/// shorter than [`MIN_POLL_INTERVAL`] are raised to it.
pub async fn poll<F>(schedule: &PollSchedule, mut tick: F) -> PollOutcome
where
    F: FnMut(u32) -> Tick,
{
    let started = Instant::now();
    let interval = schedule.interval.max(MIN_POLL_INTERVAL);
    let mut ticker = tokio::time::interval_at(started + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempts = 0;

    loop {
        ticker.tick().await;

        if schedule.timeout.is_some_and(|timeout| started.elapsed() >= timeout) {
            return PollOutcome::TimedOut { attempts };
        }

        match tick(attempts + 1) {
            Tick::Skip => continue,
            Tick::Done => return PollOutcome::Done { attempts: attempts + 1 },
            Tick::Retry => {
                attempts += 1;
                if schedule.max_attempts.is_some_and(|max| attempts >= max) {
                    return PollOutcome::Exhausted { attempts };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ElementSpec, MemoryPage};
    use quicklaunch_core::Selector;
    use std::cell::Cell;
    use url::Url;

    fn page() -> MemoryPage {
        MemoryPage::new(Url::parse("https://pubsvc.game.daum.net/gamestart/poe2.html").unwrap())
    }

    fn first(page: &MemoryPage, selector: &str) -> Element {
        page.query_first(&Selector::parse(selector).unwrap()).unwrap()
    }

    #[test]
    fn test_safe_click_pseudo_link_fires_listener_without_navigation() {
        let page = page();
        let link = page.append(
            MemoryPage::BODY,
            ElementSpec::new("a").id("gameStart").href("javascript:void(0)"),
        );

        safe_click(&page, Some(&first(&page, "#gameStart")));

        let events = page.events(link);
        assert_eq!(events.len(), 1);
        assert!(events[0].default_prevented);
        assert!(events[0].bubbles);
        assert_eq!(page.native_click_count(link), 0);
        assert!(page.navigations().is_empty());
        assert!(page.blocked_navigations().is_empty());
    }

    #[test]
    fn test_safe_click_prefers_native_click() {
        let page = page();
        let button = page.append(MemoryPage::BODY, ElementSpec::new("button").class("btn-start-game"));
        safe_click(&page, Some(&first(&page, ".btn-start-game")));
        assert_eq!(page.native_click_count(button), 1);
        assert_eq!(page.click_count(button), 1);
    }

    #[test]
    fn test_safe_click_falls_back_to_synthetic_event() {
        let page = page();
        let icon = page.append(
            MemoryPage::BODY,
            ElementSpec::new("span").class("btn_g").without_native_click(),
        );
        safe_click(&page, Some(&first(&page, "span.btn_g")));
        assert_eq!(page.native_click_count(icon), 0);
        let events = page.events(icon);
        assert_eq!(events.len(), 1);
        assert!(!events[0].default_prevented);
    }

    #[test]
    fn test_safe_click_none_is_noop() {
        let page = page();
        safe_click(&page, None);
        assert!(page.navigations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_immediate_success() {
        let page = page();
        let calls = Cell::new(0);
        let result = observe_and_interact(&page, Duration::from_secs(10), || {
            calls.set(calls.get() + 1);
            ControlFlow::Break(())
        })
        .await;
        assert_eq!(result, Observation::Immediate);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_succeeds_after_element_appears() {
        let page = std::sync::Arc::new(page());
        let writer = page.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            writer.append(MemoryPage::BODY, ElementSpec::new("div"));
            writer.append(MemoryPage::BODY, ElementSpec::new("a").id("gameStart"));
        });

        let selector = Selector::parse("#gameStart").unwrap();
        let start = Instant::now();
        let result = observe_and_interact(page.as_ref(), Duration::from_secs(10), || {
            match page.query_first(&selector) {
                Some(el) => {
                    safe_click(page.as_ref(), Some(&el));
                    ControlFlow::Break(())
                }
                None => ControlFlow::Continue(()),
            }
        })
        .await;

        assert_eq!(result, Observation::Observed);
        assert!(start.elapsed() < Duration::from_secs(3));
        let el = page.query_first(&selector).unwrap();
        assert_eq!(page.click_count(el.node), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_stops_at_timeout_and_never_checks_again() {
        let page = std::sync::Arc::new(page());
        let writer = page.clone();
        tokio::spawn(async move {
            for _ in 0..30 {
                tokio::time::sleep(Duration::from_secs(1)).await;
                writer.append(MemoryPage::BODY, ElementSpec::new("div"));
            }
        });

        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = calls.clone();
        let start = Instant::now();
        let result = observe_and_interact(page.as_ref(), Duration::from_secs(5), || {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            ControlFlow::Continue(())
        })
        .await;

        assert_eq!(result, Observation::TimedOut);
        assert!(start.elapsed() <= Duration::from_secs(5));
        let after_timeout = calls.load(std::sync::atomic::Ordering::SeqCst);
        assert!(after_timeout >= 2);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), after_timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_counts_attempts_and_skips() {
        let schedule = PollSchedule {
            interval: Duration::from_secs(1),
            max_attempts: Some(3),
            timeout: None,
        };
        let mut ticks = 0;
        let outcome = poll(&schedule, |_| {
            ticks += 1;
            if ticks % 2 == 0 { Tick::Skip } else { Tick::Retry }
        })
        .await;
        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 3 });
        assert_eq!(ticks, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_first_tick_after_one_interval() {
        let schedule = PollSchedule {
            interval: Duration::from_millis(500),
            max_attempts: None,
            timeout: None,
        };
        let start = Instant::now();
        let outcome = poll(&schedule, |attempt| if attempt == 2 { Tick::Done } else { Tick::Retry }).await;
        assert_eq!(outcome, PollOutcome::Done { attempts: 2 });
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_wall_clock_timeout() {
        let schedule = PollSchedule {
            interval: Duration::from_millis(500),
            max_attempts: None,
            timeout: Some(Duration::from_secs(10)),
        };
        let outcome = poll(&schedule, |_| Tick::Skip).await;
        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_zero_interval_is_raised_to_floor() {
        let schedule = PollSchedule {
            interval: Duration::ZERO,
            max_attempts: Some(3),
            timeout: None,
        };
        let start = Instant::now();
        let outcome = poll(&schedule, |_| Tick::Retry).await;
        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 3 });
        assert_eq!(start.elapsed(), MIN_POLL_INTERVAL * 3);
    }
}
