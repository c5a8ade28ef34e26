//! Error types for the chainfeed pipeline.

use thiserror::Error;

/// Errors that can occur while building, mutating, or streaming event data.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("append out of order: got block {got}; want >= {want}")]
    AppendOutOfOrder { got: u64, want: u64 },

    #[error("concat window mismatch: got start={got}; want start={want}")]
    ConcatGap { got: u64, want: u64 },

    #[error("rollback target {n} outside window {start}..{end}")]
    RollbackOutOfRange { n: u64, start: u64, end: u64 },

    #[error("extend target {n} behind window end {end}")]
    ExtendBehindEnd { n: u64, end: u64 },

    #[error("stream start {from} below first stored block {first}")]
    StartBelowFirstBlock { from: u64, first: u64 },

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("stream canceled")]
    Canceled,
}

impl StreamError {
    /// Returns `true` if the error is the cancellation sentinel.
    ///
    /// Cancellation is not a failure; consumers check identity rather than
    /// bubbling it.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}
