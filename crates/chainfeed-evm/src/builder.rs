//! Fluent builder API for creating chain streamers.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use alloy_primitives::Address;
//! use chainfeed_core::FilterQuery;
//! use chainfeed_evm::StreamerBuilder;
//!
//! # fn demo(source: Arc<dyn chainfeed_evm::LogSource>) {
//! let streamer = StreamerBuilder::new()
//!     .filter(FilterQuery::address(Address::ZERO))
//!     .fetch_batch_size(500)
//!     .poll_interval(Duration::from_secs(5))
//!     .build(source);
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use chainfeed_core::FilterQuery;

use crate::source::LogSource;
use crate::streamer::{ChainStreamer, StreamerConfig};

/// Fluent builder for a [`ChainStreamer`].
#[derive(Debug, Default)]
pub struct StreamerBuilder {
    filter: FilterQuery,
    config: StreamerConfig,
}

impl StreamerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log filter.
    pub fn filter(mut self, filter: FilterQuery) -> Self {
        self.filter = filter;
        self
    }

    /// Set the number of blocks per `eth_getLogs` batch.
    pub fn fetch_batch_size(mut self, size: u64) -> Self {
        self.config.fetch_batch_size = size;
        self
    }

    /// Set the number of blocks re-fetched per batch for reorg detection.
    pub fn batch_overlap(mut self, overlap: u64) -> Self {
        self.config.batch_overlap = overlap;
        self
    }

    /// Set the pause between polls at head.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Fetch transaction payloads for every event.
    pub fn fetch_tx_details(mut self, fetch: bool) -> Self {
        self.config.fetch_tx_details = fetch;
        self
    }

    /// Cap the retained history (and thus the detectable reorg depth).
    pub fn max_history_size(mut self, size: u64) -> Self {
        self.config.max_history_size = size;
        self
    }

    /// Build a streamer over the given source.
    pub fn build(self, source: Arc<dyn LogSource>) -> ChainStreamer {
        ChainStreamer::with_config(source, self.filter, self.config)
    }
}
