//! chainfeed-core — data model and streaming primitives for reorg-aware
//! event feeds.
//!
//! # Architecture
//!
//! ```text
//! Streamer (trait) ──► Subscription { messages, result, done }
//!        │
//!        ├── InMemoryEventLog   (finite replay of stored blocks)
//!        └── chainfeed-evm      (live polling against a chain)
//!
//! BlockSlice                    (ordered, gap-tolerant block window)
//! Message                       (Append / Rollback / SetNext)
//! ```
//!
//! A stream delivers blocks in total order. When the chain reorganizes,
//! previously delivered blocks are invalidated by a `Rollback` message
//! carrying the new exclusive cursor; consumers converge by discarding
//! everything at or above it.

pub mod error;
pub mod eventlog;
pub mod slice;
pub mod stream;
pub mod types;

pub use error::StreamError;
pub use eventlog::{EventLog, InMemoryEventLog};
pub use slice::{match_blocks, BlockSlice, OverlapCheck};
pub use stream::{Message, Streamer, Subscription};
pub use types::{Block, Event, FilterQuery, TxDetails};
