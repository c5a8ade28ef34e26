//! `ChainStreamer` — the reorg-aware polling engine.
//!
//! Each subscription runs one producer task that repeatedly fetches a
//! batch of logs overlapping the retained history, compares the overlap
//! hash-by-hash, and emits `Append` / `Rollback` / `SetNext` messages so
//! a downstream materialization converges to the chain's canonical state.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use chainfeed_core::slice::{match_blocks, OverlapCheck};
use chainfeed_core::stream::{send_or_done, wait_or_done, MESSAGE_BUFFER};
use chainfeed_core::{BlockSlice, FilterQuery, Message, StreamError, Streamer, Subscription};

use crate::source::{fetch_slice, LogSource};

/// Blocks requested per `eth_getLogs` call.
pub const DEFAULT_FETCH_BATCH_SIZE: u64 = 2000;
/// Blocks re-fetched at the front of every batch for reorg detection.
pub const DEFAULT_BATCH_OVERLAP: u64 = 10;
/// Pause between polls once the stream has caught up with the head.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);
/// Blocks of history retained for overlap comparison. Also caps the
/// reorg depth that can be detected.
pub const DEFAULT_MAX_HISTORY_SIZE: u64 = 1024;

/// Tuning knobs for a [`ChainStreamer`].
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    /// Number of blocks per fetch.
    pub fetch_batch_size: u64,
    /// Number of already-delivered blocks re-fetched per batch.
    pub batch_overlap: u64,
    /// Sleep between polls at head.
    pub poll_interval: Duration,
    /// Whether to look up transaction payloads for every event.
    pub fetch_tx_details: bool,
    /// Upper bound on retained history.
    pub max_history_size: u64,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            fetch_batch_size: DEFAULT_FETCH_BATCH_SIZE,
            batch_overlap: DEFAULT_BATCH_OVERLAP,
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_tx_details: false,
            max_history_size: DEFAULT_MAX_HISTORY_SIZE,
        }
    }
}

/// A [`Streamer`] that polls a [`LogSource`] and reconciles every batch
/// against retained history before emitting it.
#[derive(Clone)]
pub struct ChainStreamer {
    source: Arc<dyn LogSource>,
    filter: FilterQuery,
    config: StreamerConfig,
}

impl ChainStreamer {
    /// Create a streamer with default configuration.
    pub fn new(source: Arc<dyn LogSource>, filter: FilterQuery) -> Self {
        Self::with_config(source, filter, StreamerConfig::default())
    }

    /// Create a streamer with explicit configuration.
    pub fn with_config(source: Arc<dyn LogSource>, filter: FilterQuery, config: StreamerConfig) -> Self {
        Self { source, filter, config }
    }

    /// The filter this streamer queries with.
    pub fn filter(&self) -> &FilterQuery {
        &self.filter
    }

    /// Replace the filter. Used when composing with an event log whose
    /// stored blocks must come from the identical query.
    pub fn set_filter(&mut self, filter: FilterQuery) {
        self.filter = filter;
    }
}

impl Streamer for ChainStreamer {
    fn stream(&self, done: CancellationToken, from: u64) -> Result<Subscription, StreamError> {
        let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
        let (result_tx, result_rx) = oneshot::channel();

        let mut worker = StreamWorker {
            source: Arc::clone(&self.source),
            filter: self.filter.clone(),
            config: self.config.clone(),
            tx,
            done: done.clone(),
            history: BlockSlice::empty(from),
            next: from,
            from,
        };

        tokio::spawn(async move {
            let result = worker.run().await;
            drop(worker); // close the message channel before the result lands
            let _ = result_tx.send(result);
        });

        Ok(Subscription { messages: rx, result: result_rx, done })
    }
}

/// Per-subscription polling state.
struct StreamWorker {
    source: Arc<dyn LogSource>,
    filter: FilterQuery,
    config: StreamerConfig,

    tx: mpsc::Sender<Message>,
    done: CancellationToken,

    /// Retained window of already-emitted blocks, used as the reorg
    /// comparison baseline. Its end always equals `next`.
    history: BlockSlice,
    /// Exclusive upper bound of what has been emitted.
    next: u64,
    /// Immutable lower bound of this subscription.
    from: u64,
}

impl StreamWorker {
    async fn run(&mut self) -> Result<(), StreamError> {
        loop {
            let fetch_from = if self.next < self.from + self.config.batch_overlap {
                self.from
            } else {
                self.next - self.config.batch_overlap
            };

            let batch = self.fetch(fetch_from).await?;
            let distance = batch.distance_from_head();

            self.process(batch).await?;

            if distance == 0 {
                wait_or_done(&self.done, self.config.poll_interval).await?;
            }
        }
    }

    async fn fetch(&self, from: u64) -> Result<BlockSlice, StreamError> {
        let mut query = self.filter.clone();
        query.from_block = Some(from);
        query.to_block = Some(from + self.config.fetch_batch_size - 1);

        tokio::select! {
            _ = self.done.cancelled() => Err(StreamError::Canceled),
            slice = fetch_slice(self.source.as_ref(), &query, self.config.fetch_tx_details) => slice,
        }
    }

    /// Reconcile a fetched batch with history, then emit what is new.
    async fn process(&mut self, mut batch: BlockSlice) -> Result<(), StreamError> {
        debug!(
            start = batch.start(),
            end = batch.end(),
            blocks = batch.blocks().len(),
            "processing batch"
        );

        if let OverlapCheck::Diverged { last_good, first_bad } =
            match_blocks(&batch, &self.history)?
        {
            // Roll back to just past the newest agreeing block, or to the
            // first disagreement if nothing in the overlap agreed. Never
            // below the subscription's lower bound.
            let target = match last_good {
                Some(n) => n + 1,
                None => first_bad,
            };
            self.next = target.max(self.from);
            self.history.rollback(self.next)?;
            warn!(rollback_to = self.next, "chain reorganization detected");
            send_or_done(&self.tx, &self.done, Message::Rollback { number: self.next }).await?;

            if last_good.is_none() {
                // Without an agreed block the divergence may reach further
                // back than this window shows. Emit nothing more; the next
                // cycle's overlap computation pulls the fetch down.
                return Ok(());
            }
        }

        batch.delete_before_block(self.next);
        let batch_end = batch.end();
        let fresh = batch.blocks().to_vec();

        self.history.concat(batch)?;
        if self.history.end() > self.config.max_history_size {
            self.history.delete_before_block(self.history.end() - self.config.max_history_size);
        }

        for block in fresh {
            send_or_done(&self.tx, &self.done, Message::Append(block)).await?;
        }

        self.next = batch_end;
        send_or_done(&self.tx, &self.done, Message::SetNext { number: self.next }).await?;
        Ok(())
    }
}
