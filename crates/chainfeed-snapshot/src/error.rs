//! Snapshot codec errors.

use thiserror::Error;

/// Errors produced while encoding or decoding snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("could not parse integer: {0}")]
    InvalidNumber(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
