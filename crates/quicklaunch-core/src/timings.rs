use std::time::Duration;

/// Delays, intervals and caps used by the page handlers and the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    /// Default safety timeout of an element observer
    pub observe_timeout: Duration,
    /// Observer timeout on the launcher page
    pub launcher_timeout: Duration,
    pub start_button_interval: Duration,
    /// Counted attempts before start-button polling gives up
    pub start_button_max_attempts: u32,
    /// Wall-clock cap on start-button polling, including skipped ticks
    pub start_button_timeout: Duration,
    pub modal_interval: Duration,
    pub modal_timeout: Duration,
    /// Delay between a close signal and the tab actually closing
    pub close_delay: Duration,
    /// Delay before re-checking that the auto-start fragment is gone
    pub cleanup_verify_delay: Duration,
    /// How long a content script waits for a reply to a query
    pub reply_timeout: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            observe_timeout: Duration::from_secs(10),
            launcher_timeout: Duration::from_secs(30),
            start_button_interval: Duration::from_secs(1),
            start_button_max_attempts: 15,
            start_button_timeout: Duration::from_secs(60),
            modal_interval: Duration::from_millis(500),
            modal_timeout: Duration::from_secs(10),
            close_delay: Duration::from_secs(1),
            cleanup_verify_delay: Duration::from_millis(50),
            reply_timeout: Duration::from_secs(5),
        }
    }
}
