//! The `EventLog` trait and its in-memory implementation.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::StreamError;
use crate::slice::BlockSlice;
use crate::stream::{send_or_done, Message, Streamer, Subscription, MESSAGE_BUFFER};
use crate::types::{Block, FilterQuery};

/// A replayable sequence of delivered blocks matching one filter.
///
/// An event log is both the receiving end of a stream (`append`,
/// `rollback`, `set_next`) and a [`Streamer`] that replays what it
/// stored. The window it covers is `[first_block, next_block)`.
pub trait EventLog: Streamer {
    /// Store a block at the tip.
    fn append(&mut self, block: Block) -> Result<(), StreamError>;
    /// Invalidate all stored blocks at or above `number`.
    fn rollback(&mut self, number: u64) -> Result<(), StreamError>;
    /// Advance the cursor past scanned-but-empty blocks.
    fn set_next(&mut self, number: u64) -> Result<(), StreamError>;
    /// First block covered by the log (inclusive).
    fn first_block(&self) -> u64;
    /// Next block the log expects (exclusive upper bound).
    fn next_block(&self) -> u64;
    /// The filter this log's events were retrieved with.
    fn filter(&self) -> FilterQuery;
    /// Release any resources held by the log.
    fn close(&mut self) -> Result<(), StreamError>;
}

/// An in-memory [`EventLog`] backed by a single [`BlockSlice`].
#[derive(Debug, Clone)]
pub struct InMemoryEventLog {
    filter: FilterQuery,
    slice: BlockSlice,
}

impl InMemoryEventLog {
    /// Create an empty log starting at `from`.
    pub fn new(from: u64, filter: FilterQuery) -> Self {
        Self { filter, slice: BlockSlice::empty(from) }
    }

    /// Reassemble a log from a filter and a previously stored slice.
    pub fn from_parts(filter: FilterQuery, slice: BlockSlice) -> Self {
        Self { filter, slice }
    }

    /// The underlying slice.
    pub fn block_slice(&self) -> &BlockSlice {
        &self.slice
    }
}

impl EventLog for InMemoryEventLog {
    fn append(&mut self, block: Block) -> Result<(), StreamError> {
        self.slice.append(block)
    }

    fn rollback(&mut self, number: u64) -> Result<(), StreamError> {
        self.slice.rollback(number)
    }

    fn set_next(&mut self, number: u64) -> Result<(), StreamError> {
        self.slice.extend(number)
    }

    fn first_block(&self) -> u64 {
        self.slice.start()
    }

    fn next_block(&self) -> u64 {
        self.slice.end()
    }

    fn filter(&self) -> FilterQuery {
        self.filter.clone()
    }

    fn close(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}

impl Streamer for InMemoryEventLog {
    /// Replay the stored blocks from `from` as a finite stream: one
    /// `Append` per block, then one `SetNext` at the log's cursor.
    ///
    /// Replay works on a snapshot and never emits `Rollback`; callers
    /// rely on this when composing replay with a live phase.
    fn stream(&self, done: CancellationToken, from: u64) -> Result<Subscription, StreamError> {
        if from < self.first_block() {
            return Err(StreamError::StartBelowFirstBlock { from, first: self.first_block() });
        }

        let snapshot = self.slice.clone();
        let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
        let (result_tx, result_rx) = oneshot::channel();
        let task_done = done.clone();

        tokio::spawn(async move {
            let result = replay(tx, task_done, snapshot, from).await;
            let _ = result_tx.send(result);
        });

        Ok(Subscription { messages: rx, result: result_rx, done })
    }
}

async fn replay(
    tx: mpsc::Sender<Message>,
    done: CancellationToken,
    mut snapshot: BlockSlice,
    from: u64,
) -> Result<(), StreamError> {
    snapshot.delete_before_block(from);
    let next = snapshot.end();
    debug!(from, next, blocks = snapshot.blocks().len(), "replaying stored blocks");

    for block in snapshot.into_blocks() {
        send_or_done(&tx, &done, Message::Append(block)).await?;
    }
    send_or_done(&tx, &done, Message::SetNext { number: next }).await?;
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
