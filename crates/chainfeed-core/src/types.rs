//! Shared types for the event streaming pipeline.

use alloy_primitives::{Address, Bytes, B256, U256};

// ─── Event ────────────────────────────────────────────────────────────────────

/// Transaction fields attached to an [`Event`] when transaction details are
/// fetched alongside the logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxDetails {
    /// Transaction calldata.
    pub data: Bytes,
    /// Transferred value in wei.
    pub value: U256,
    /// Sender address. Zero when sender recovery failed.
    pub from: Address,
    /// Gas limit of the transaction.
    pub gas: u64,
}

/// A single log record emitted by a contract.
///
/// Events within a block are totally ordered by `index`; globally by
/// `(block_number, index)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Contract address that emitted the log.
    pub address: Address,
    /// Indexed topics (0–4 entries).
    pub topics: Vec<B256>,
    /// Opaque log data.
    pub data: Bytes,

    /// Number of the containing block.
    pub block_number: u64,
    /// Hash of the containing block.
    pub block_hash: B256,
    /// Index of the log within the block.
    pub index: u64,

    /// Hash of the originating transaction.
    pub tx_hash: B256,
    /// Index of the transaction within the block.
    pub tx_index: u64,
    /// Optional transaction payload; `None` unless details were fetched.
    pub tx: Option<TxDetails>,
}

impl Event {
    /// Returns the first topic (the event signature hash), if present.
    pub fn topic0(&self) -> Option<&B256> {
        self.topics.first()
    }
}

// ─── Block ────────────────────────────────────────────────────────────────────

/// A chain block's number and hash plus the filtered logs it contains.
///
/// A block with no matching logs is never materialized on its own; gaps
/// between block numbers in a slice are normal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    /// Block number.
    pub number: u64,
    /// Block hash.
    pub hash: B256,
    /// Events in increasing `index`.
    pub events: Vec<Event>,
}

impl Block {
    /// Create a block with no events.
    pub fn new(number: u64, hash: B256) -> Self {
        Self { number, hash, events: Vec::new() }
    }
}

// ─── FilterQuery ──────────────────────────────────────────────────────────────

/// Filter for which logs to stream, following `eth_getLogs` semantics.
///
/// Each entry of `topics` is a disjunction set for that topic position: a
/// log matches position `i` if `topics[i]` is empty or contains the log's
/// topic at `i`. Positions combine with AND. An omitted block bound means
/// open-ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterQuery {
    /// Only match logs from these addresses (empty = all addresses).
    pub addresses: Vec<Address>,
    /// Start block (inclusive).
    pub from_block: Option<u64>,
    /// End block (inclusive).
    pub to_block: Option<u64>,
    /// Per-position topic disjunction sets.
    pub topics: Vec<Vec<B256>>,
}

impl FilterQuery {
    /// Create a filter for a single contract address.
    pub fn address(addr: Address) -> Self {
        Self { addresses: vec![addr], ..Default::default() }
    }

    /// Add a disjunction set for the next topic position.
    pub fn topic(mut self, alternatives: Vec<B256>) -> Self {
        self.topics.push(alternatives);
        self
    }

    /// Set the start block.
    pub fn from_block(mut self, block: u64) -> Self {
        self.from_block = Some(block);
        self
    }

    /// Set the end block.
    pub fn to_block(mut self, block: u64) -> Self {
        self.to_block = Some(block);
        self
    }

    /// Returns `true` if `address` matches this filter.
    pub fn matches_address(&self, address: &Address) -> bool {
        self.addresses.is_empty() || self.addresses.contains(address)
    }

    /// Returns `true` if `topics` satisfies every topic position.
    pub fn matches_topics(&self, topics: &[B256]) -> bool {
        self.topics.iter().enumerate().all(|(i, alternatives)| {
            alternatives.is_empty() || topics.get(i).is_some_and(|t| alternatives.contains(t))
        })
    }

    /// Returns `true` if the event satisfies the address and topic criteria.
    /// Block bounds are not checked.
    pub fn matches(&self, event: &Event) -> bool {
        self.matches_address(&event.address) && self.matches_topics(&event.topics)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(b: u8) -> B256 {
        B256::repeat_byte(b)
    }

    #[test]
    fn filter_empty_matches_all() {
        let f = FilterQuery::default();
        let e = Event { address: Address::repeat_byte(0x11), ..Default::default() };
        assert!(f.matches(&e));
    }

    #[test]
    fn filter_matches_address() {
        let addr = Address::repeat_byte(0xaa);
        let f = FilterQuery::address(addr);
        assert!(f.matches(&Event { address: addr, ..Default::default() }));
        assert!(!f.matches(&Event { address: Address::repeat_byte(0xbb), ..Default::default() }));
    }

    #[test]
    fn filter_topic_positions_and_across_or_within() {
        let f = FilterQuery::default()
            .topic(vec![hash(1), hash(2)])
            .topic(vec![hash(9)]);

        let matching = Event { topics: vec![hash(2), hash(9)], ..Default::default() };
        assert!(f.matches(&matching));

        // Second position disagrees.
        let wrong_second = Event { topics: vec![hash(1), hash(8)], ..Default::default() };
        assert!(!f.matches(&wrong_second));

        // Too few topics to satisfy the second position.
        let too_short = Event { topics: vec![hash(1)], ..Default::default() };
        assert!(!f.matches(&too_short));
    }

    #[test]
    fn filter_empty_position_is_wildcard() {
        let f = FilterQuery::default().topic(vec![]).topic(vec![hash(9)]);
        let e = Event { topics: vec![hash(7), hash(9)], ..Default::default() };
        assert!(f.matches(&e));
    }

    #[test]
    fn event_topic0() {
        let e = Event { topics: vec![hash(3), hash(4)], ..Default::default() };
        assert_eq!(e.topic0(), Some(&hash(3)));
        assert_eq!(Event::default().topic0(), None);
    }
}
