//! chainfeed-snapshot — structural serialization of event logs.
//!
//! Maps the in-memory model to a stable wire schema and back: hex strings
//! for addresses, hashes, and byte blobs; string-encoded integers where a
//! value can be absent. The top-level [`EventLogFile`] pairs a filter with
//! its stored block window, so a consumer restarting mid-range can restore
//! the log and replay before going live.

pub mod codec;
pub mod error;
pub mod wire;

pub use codec::bytes_to_hash;
pub use error::SnapshotError;
pub use wire::{EventLogFile, WireBlock, WireBlockSlice, WireEvent, WireFilterQuery};
