//! chainfeed-evm — reorg-aware log streaming from an EVM chain.
//!
//! # Architecture
//!
//! ```text
//! LogSource (trait) ──► fetch_slice ──► ChainStreamer ──► Subscription
//!                                            │
//!                            LiveEventLog ───┤ replay + live composition
//!                                            ▼
//!                                       EventLog (chainfeed-core)
//! ```
//!
//! The [`ChainStreamer`] polls with overlapping range queries and compares
//! the overlap hash-by-hash against retained history; a mismatch produces
//! a `Rollback` message before new blocks are appended. [`LiveEventLog`]
//! chains a finite replay of an existing log with a live subscription.

pub mod builder;
pub mod live;
pub mod source;
pub mod streamer;

pub use builder::StreamerBuilder;
pub use live::LiveEventLog;
pub use source::{add_transaction_data, fetch_slice, LogSource, RawLog, Transaction};
pub use streamer::{ChainStreamer, StreamerConfig};
