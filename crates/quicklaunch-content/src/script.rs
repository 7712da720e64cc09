use crate::dispatcher::{self, DispatchOutcome};
use crate::handlers::{is_auto_start, PageContext, PageHandler};
use crate::page::Page;
use quicklaunch_core::protocol::{AUTO_START_FRAGMENT, CLEANUP_ACK};
use quicklaunch_core::{BackgroundMessage, KeyValueStore, MessageBus, SelectorTable, Settings, Timings};
use std::sync::Arc;

/// Content script instance bound to one document
pub struct ContentScript {
    page: Arc<dyn Page>,
    bus: Arc<dyn MessageBus>,
    settings_store: Arc<dyn KeyValueStore>,
    selectors: SelectorTable,
    timings: Timings,
}

impl ContentScript {
    pub fn new(
        page: Arc<dyn Page>,
        bus: Arc<dyn MessageBus>,
        settings_store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            page,
            bus,
            settings_store,
            selectors: SelectorTable::default(),
            timings: Timings::default(),
        }
    }

    pub fn with_selectors(mut self, selectors: SelectorTable) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    fn context(&self) -> PageContext<'_> {
        PageContext {
            page: self.page.as_ref(),
            bus: self.bus.as_ref(),
            selectors: &self.selectors,
            timings: &self.timings,
        }
    }

    /// Page-load entry point
    pub async fn start(&self) -> DispatchOutcome {
        tracing::debug!("Content script loaded on {}", self.page.location());
        let settings = Settings::load(self.settings_store.as_ref()).await;
        dispatcher::dispatch(&self.context(), &settings).await
    }

    /// Re-run the home page flow when `autoStart` is added to the fragment
    ///
    /// Settings are read again so that options toggled since page load apply.
    /// Returns `None` when the new fragment does not request an auto start.
    pub async fn on_hash_change(&self) -> Option<DispatchOutcome> {
        let url = self.page.location();
        tracing::debug!("Hash changed: {:?}", url.fragment());
        if !is_auto_start(&url) {
            return None;
        }

        let settings = Settings::load(self.settings_store.as_ref()).await;
        if settings.plugin_disable {
            tracing::info!("Automation disabled by user setting, ignoring hash change");
            return Some(DispatchOutcome::Disabled);
        }

        if !PageHandler::Home.matches(&url) {
            return Some(DispatchOutcome::NoMatch);
        }

        tracing::info!("Auto start detected via hash change, re-running home page logic");
        PageHandler::Home.execute(&self.context(), &settings).await;
        Some(DispatchOutcome::Executed(PageHandler::Home))
    }

    /// Answer a message from the background coordinator
    pub async fn on_message(&self, message: BackgroundMessage) -> String {
        match message {
            BackgroundMessage::CleanupUrl => {
                self.cleanup_url().await;
                CLEANUP_ACK.to_string()
            }
        }
    }

    async fn cleanup_url(&self) {
        let url = self.page.location();
        tracing::info!("Received cleanup signal, current hash: {:?}", url.fragment());
        if !is_auto_start(&url) {
            return;
        }

        let mut clean = url.clone();
        clean.set_fragment(None);
        self.page.replace_url(&clean);

        tokio::time::sleep(self.timings.cleanup_verify_delay).await;

        let still_marked = self
            .page
            .location()
            .fragment()
            .is_some_and(|fragment| fragment.contains(AUTO_START_FRAGMENT));
        if still_marked {
            tracing::warn!("History replace did not take effect, clearing hash directly");
            self.page.set_hash("");
        } else {
            tracing::debug!("URL cleanup confirmed");
        }
    }
}
