//! Stream messages, the subscription handle, and the `Streamer` trait.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::error::StreamError;
use crate::types::Block;

/// Message channel capacity. Kept minimal so a slow consumer directly
/// pauses the producer; there is no queue beyond the current batch.
pub const MESSAGE_BUFFER: usize = 1;

/// A message in an event stream.
///
/// Depending on the filter, the stream may not contain logs for every
/// block; `SetNext` signals that blocks were scanned but nothing matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A new log-bearing block extends the stream.
    Append(Block),
    /// A chain reorganization invalidated all blocks at or above `number`.
    Rollback { number: u64 },
    /// The scanner advanced its cursor to `number` with nothing to deliver
    /// in between.
    SetNext { number: u64 },
}

/// A producer/consumer handle for one event stream.
///
/// The producer emits on `messages` until exhaustion, failure, or
/// cancellation, then closes the channel and resolves `result` exactly
/// once: `Ok(())` on clean finish, [`StreamError::Canceled`] on a
/// `done`-triggered abort, or the failure otherwise. Already-enqueued
/// messages can always be drained before the close is observed.
#[derive(Debug)]
pub struct Subscription {
    /// Stream messages, in production order.
    pub messages: mpsc::Receiver<Message>,
    /// The producer's terminal result.
    pub result: oneshot::Receiver<Result<(), StreamError>>,
    /// The cancellation signal this subscription observes.
    pub done: CancellationToken,
}

impl Subscription {
    /// Wait for the producer's terminal result after the message channel
    /// has been drained.
    pub async fn finish(self) -> Result<(), StreamError> {
        match self.result.await {
            Ok(res) => res,
            Err(_) => Err(StreamError::Protocol("producer dropped without a result".into())),
        }
    }
}

/// Anything that can produce a totally-ordered event stream from a given
/// block onward.
pub trait Streamer {
    /// Start a subscription delivering messages from block `from`.
    ///
    /// Precondition violations are returned synchronously without
    /// starting a producer task.
    fn stream(&self, done: CancellationToken, from: u64) -> Result<Subscription, StreamError>;
}

/// Send a message unless `done` fires first. A dropped receiver counts as
/// cancellation: the subscriber has gone away.
pub async fn send_or_done(
    tx: &mpsc::Sender<Message>,
    done: &CancellationToken,
    msg: Message,
) -> Result<(), StreamError> {
    tokio::select! {
        _ = done.cancelled() => Err(StreamError::Canceled),
        sent = tx.send(msg) => sent.map_err(|_| StreamError::Canceled),
    }
}

/// Sleep for `period` unless `done` fires first.
pub async fn wait_or_done(done: &CancellationToken, period: Duration) -> Result<(), StreamError> {
    tokio::select! {
        _ = done.cancelled() => Err(StreamError::Canceled),
        _ = tokio::time::sleep(period) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_done_prefers_cancellation() {
        let (tx, _rx) = mpsc::channel(MESSAGE_BUFFER);
        let done = CancellationToken::new();
        tx.send(Message::SetNext { number: 1 }).await.unwrap(); // fill the buffer
        done.cancel();
        let err = send_or_done(&tx, &done, Message::SetNext { number: 2 }).await.unwrap_err();
        assert!(err.is_canceled());
    }

    #[tokio::test]
    async fn send_or_done_treats_dropped_receiver_as_canceled() {
        let (tx, rx) = mpsc::channel(MESSAGE_BUFFER);
        drop(rx);
        let done = CancellationToken::new();
        let err = send_or_done(&tx, &done, Message::SetNext { number: 1 }).await.unwrap_err();
        assert!(err.is_canceled());
    }

    #[tokio::test]
    async fn wait_or_done_sleeps_then_returns() {
        let done = CancellationToken::new();
        wait_or_done(&done, Duration::from_millis(5)).await.unwrap();
    }

    #[tokio::test]
    async fn wait_or_done_aborts_on_cancel() {
        let done = CancellationToken::new();
        done.cancel();
        let err = wait_or_done(&done, Duration::from_secs(3600)).await.unwrap_err();
        assert!(err.is_canceled());
    }
}
