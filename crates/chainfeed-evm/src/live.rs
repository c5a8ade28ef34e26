//! `LiveEventLog` — replay from a stored event log, then follow the chain.
//!
//! The two phases are kept as sequential sub-subscriptions multiplexed
//! onto one outward channel: replay is finite, live is unbounded, and
//! their error contracts differ.

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use chainfeed_core::stream::{send_or_done, MESSAGE_BUFFER};
use chainfeed_core::{EventLog, Message, StreamError, Streamer, Subscription};

use crate::streamer::ChainStreamer;

/// Combines an [`EventLog`] and a [`ChainStreamer`] into a streamer that
/// first replays stored history and then polls the chain live, recording
/// every live message into the log before forwarding it.
///
/// Mutating before forwarding keeps the log consistent with whatever the
/// subscriber has already observed, so a later re-subscription resumes
/// from exactly the delivered state.
pub struct LiveEventLog<L> {
    eventlog: Arc<Mutex<L>>,
    streamer: ChainStreamer,
}

impl<L: EventLog + Send + 'static> LiveEventLog<L> {
    /// Create a live log around a shared event log. The caller keeps its
    /// handle to inspect or re-stream the log after the subscription ends.
    pub fn new(eventlog: Arc<Mutex<L>>, streamer: ChainStreamer) -> Self {
        Self { eventlog, streamer }
    }

    /// The shared event log.
    pub fn eventlog(&self) -> Arc<Mutex<L>> {
        Arc::clone(&self.eventlog)
    }
}

impl<L: EventLog + Send + 'static> Streamer for LiveEventLog<L> {
    fn stream(&self, done: CancellationToken, from: u64) -> Result<Subscription, StreamError> {
        let first = self.eventlog.lock().unwrap().first_block();
        if from < first {
            return Err(StreamError::StartBelowFirstBlock { from, first });
        }

        let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
        let (result_tx, result_rx) = oneshot::channel();
        let eventlog = Arc::clone(&self.eventlog);
        let streamer = self.streamer.clone();
        let task_done = done.clone();

        tokio::spawn(async move {
            let result = run(eventlog, streamer, tx, task_done, from).await;
            let _ = result_tx.send(result);
        });

        Ok(Subscription { messages: rx, result: result_rx, done })
    }
}

async fn run<L: EventLog + Send + 'static>(
    eventlog: Arc<Mutex<L>>,
    mut streamer: ChainStreamer,
    tx: mpsc::Sender<Message>,
    done: CancellationToken,
    from: u64,
) -> Result<(), StreamError> {
    let mut next_block = from;

    // Phase 1: replay everything the log already holds.

    let mut replay = eventlog.lock().unwrap().stream(done.clone(), next_block)?;
    while let Some(message) = replay.messages.recv().await {
        match &message {
            Message::Append(block) => next_block = block.number + 1,
            Message::SetNext { number } => next_block = *number,
            Message::Rollback { .. } => {
                return Err(StreamError::Protocol("rollback during replay".into()));
            }
        }
        send_or_done(&tx, &done, message).await?;
    }
    replay.finish().await?;

    // Phase 2: follow the chain, recording into the log before forwarding.

    streamer.set_filter(eventlog.lock().unwrap().filter());
    let mut live = streamer.stream(done.clone(), next_block)?;
    while let Some(message) = live.messages.recv().await {
        {
            let mut log = eventlog.lock().unwrap();
            match &message {
                Message::Append(block) => log.append(block.clone())?,
                Message::Rollback { number } => log.rollback(*number)?,
                Message::SetNext { number } => log.set_next(*number)?,
            }
        }
        send_or_done(&tx, &done, message).await?;
    }
    live.finish().await
}
