//! Debounced instrument search with a pinned selection.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use crate::gateway::{Gateway, GatewayError, SearchQuery};
use crate::InstrumentSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub debounce: Duration,
    pub min_query_len: usize,
    pub page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_query_len: 3,
            page_size: 10,
        }
    }
}

pub struct InstrumentSearch {
    gateway: Arc<dyn Gateway>,
    config: SearchConfig,
    input: String,
    pinned: Option<InstrumentSummary>,
    results: Vec<InstrumentSummary>,
    total_elements: usize,
    error: Option<GatewayError>,
    deadline: Option<Instant>,
}

impl InstrumentSearch {
    pub fn new(gateway: Arc<dyn Gateway>, config: SearchConfig) -> Self {
        Self {
            gateway,
            config,
            input: String::new(),
            pinned: None,
            results: Vec::new(),
            total_elements: 0,
            error: None,
            deadline: None,
        }
    }

    /// Records an edit of the search box and restarts the debounce window.
    ///
    /// Editing away from the pinned symbol unpins it. Inputs that are too
    /// short clear the results without scheduling a query.
    pub fn set_input(&mut self, raw: &str) {
        self.input = raw.to_ascii_uppercase();

        let unpin = self
            .pinned
            .as_ref()
            .is_some_and(|pinned| pinned.trading_symbol.as_str() != self.input.trim());
        if unpin {
            debug!(input = %self.input, "search selection unpinned");
            self.pinned = None;
        }

        if self.is_searchable() {
            self.deadline = Some(Instant::now() + self.config.debounce);
        } else {
            self.deadline = None;
            self.results.clear();
            self.total_elements = 0;
        }
    }

    /// True when the current input would issue a query.
    pub fn is_searchable(&self) -> bool {
        self.pinned.is_none() && self.input.trim().chars().count() >= self.config.min_query_len
    }

    /// True while a debounced query is waiting for its deadline.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Waits for the debounce deadline and runs the pending query.
    ///
    /// Returns `Ok(false)` when nothing was pending. A failed query leaves the
    /// result set empty and is also kept in [`InstrumentSearch::error`].
    pub async fn settle(&mut self) -> Result<bool, GatewayError> {
        let Some(deadline) = self.deadline else {
            return Ok(false);
        };
        sleep_until(deadline).await;
        self.deadline = None;
        self.error = None;

        let query = SearchQuery::new(self.input.as_str(), 0, self.config.page_size)
            .map_err(|error| GatewayError::rejected(error.to_string()))?;
        match self.gateway.search_instruments(&query).await {
            Ok(page) => {
                debug!(
                    query = %query.query,
                    hits = page.content.len(),
                    total = page.total_elements,
                    "search completed"
                );
                self.total_elements = page.total_elements;
                self.results = page.content;
                Ok(true)
            }
            Err(error) => {
                warn!(query = %query.query, %error, "search failed");
                self.results.clear();
                self.total_elements = 0;
                self.error = Some(error.clone());
                Err(error)
            }
        }
    }

    /// Pins a hit: the input becomes its symbol and the results are cleared.
    pub fn select(&mut self, hit: InstrumentSummary) -> &InstrumentSummary {
        self.input = hit.trading_symbol.as_str().to_owned();
        self.results.clear();
        self.total_elements = 0;
        self.deadline = None;
        self.pinned.insert(hit)
    }

    /// Pins the result at `index`, if any.
    pub fn select_index(&mut self, index: usize) -> Option<&InstrumentSummary> {
        if index >= self.results.len() {
            return None;
        }
        let hit = self.results.swap_remove(index);
        Some(self.select(hit))
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.pinned = None;
        self.results.clear();
        self.total_elements = 0;
        self.error = None;
        self.deadline = None;
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn pinned(&self) -> Option<&InstrumentSummary> {
        self.pinned.as_ref()
    }

    pub fn results(&self) -> &[InstrumentSummary] {
        &self.results
    }

    pub fn total_elements(&self) -> usize {
        self.total_elements
    }

    pub fn error(&self) -> Option<&GatewayError> {
        self.error.as_ref()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}
