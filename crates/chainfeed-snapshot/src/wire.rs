//! Wire representation of the snapshot schema.
//!
//! Addresses, hashes, and byte strings are `0x`-prefixed hex. Integers
//! that can be absent (`tx_value`, the filter's block bounds) are strings,
//! with `""` (or the legacy `"<nil>"`) meaning absent.

use serde::{Deserialize, Serialize};

/// Wire form of a single log record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireEvent {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,

    pub block_number: u64,
    pub block_hash: String,
    pub index: u64,

    pub tx_hash: String,
    pub tx_index: u64,
    #[serde(default)]
    pub tx_data: String,
    #[serde(default)]
    pub tx_value: String,
    #[serde(default)]
    pub tx_from: String,
    #[serde(default)]
    pub tx_gas: u64,
}

/// Wire form of a block and its events.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireBlock {
    pub number: u64,
    pub hash: String,
    pub events: Vec<WireEvent>,
}

/// Wire form of a block window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireBlockSlice {
    pub start: u64,
    pub end: u64,
    pub distance_from_head: u64,
    pub blocks: Vec<WireBlock>,
}

/// Wire form of a log filter. Topics are a list of per-position
/// disjunction sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireFilterQuery {
    pub addresses: Vec<String>,
    #[serde(default)]
    pub from_block: String,
    #[serde(default)]
    pub to_block: String,
    pub topics: Vec<Vec<String>>,
}

/// Top-level snapshot of an event log: the filter its events were
/// retrieved with plus the stored block window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLogFile {
    pub filter: WireFilterQuery,
    pub block_slice: WireBlockSlice,
}
