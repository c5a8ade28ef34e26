//! The `LogSource` boundary and the adapter that turns raw log batches
//! into normalized [`BlockSlice`]s.
//!
//! The JSON-RPC transport itself lives behind the trait; this module only
//! assumes `eth_getLogs`-shaped results.

use std::collections::HashMap;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use tracing::warn;

use chainfeed_core::{Block, BlockSlice, Event, FilterQuery, StreamError, TxDetails};

/// A raw log record as returned by `eth_getLogs`.
#[derive(Debug, Clone)]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub block_hash: B256,
    /// Index of the log within the block.
    pub index: u64,
    pub tx_hash: B256,
    /// Index of the transaction within the block.
    pub tx_index: u64,
}

/// Transaction fields looked up when a stream is configured to fetch
/// transaction details.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    pub data: Bytes,
    pub value: U256,
    pub gas: u64,
}

/// The chain-facing collaborator: head lookup plus ranged log queries.
///
/// Implementations must tolerate concurrent calls if shared between
/// subscriptions. All errors are surfaced as [`StreamError::Rpc`] and
/// terminate the current batch.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Current chain head block number.
    async fn head(&self) -> Result<u64, StreamError>;

    /// All logs matching `filter` within `[from_block, to_block]`.
    async fn filter_logs(&self, filter: &FilterQuery) -> Result<Vec<RawLog>, StreamError>;

    /// Look up a transaction by hash. Only called when transaction
    /// details are requested.
    async fn tx_by_hash(&self, hash: B256) -> Result<Transaction, StreamError>;

    /// Recover the sender of the transaction at `tx_index` in the block
    /// with `block_hash`.
    async fn sender(
        &self,
        tx_hash: B256,
        block_hash: B256,
        tx_index: u64,
    ) -> Result<Address, StreamError>;
}

/// Fetch one normalized batch of logs.
///
/// Clamps the filter's upper bound to the current head, sorts logs by
/// `(block_number, index)`, and groups consecutive logs into [`Block`]s,
/// taking each block's hash from its first log. The sort is unconditional:
/// the overlap comparison depends on it even if the source claims order.
/// An empty result is a valid slice with the correct bounds and freshness
/// lag.
pub async fn fetch_slice(
    source: &dyn LogSource,
    filter: &FilterQuery,
    fetch_tx_details: bool,
) -> Result<BlockSlice, StreamError> {
    let head = source.head().await?;

    let from = filter.from_block.unwrap_or(0);
    let to = filter.to_block.unwrap_or(head).min(head);

    let mut query = filter.clone();
    query.from_block = Some(from);
    query.to_block = Some(to);

    let mut logs = source.filter_logs(&query).await?;
    logs.sort_by_key(|l| (l.block_number, l.index));

    let mut blocks: Vec<Block> = Vec::new();
    for log in logs {
        let event = Event {
            address: log.address,
            topics: log.topics,
            data: log.data,
            block_number: log.block_number,
            block_hash: log.block_hash,
            index: log.index,
            tx_hash: log.tx_hash,
            tx_index: log.tx_index,
            tx: None,
        };
        match blocks.last_mut() {
            Some(b) if b.number == log.block_number => b.events.push(event),
            _ => {
                let mut b = Block::new(log.block_number, log.block_hash);
                b.events.push(event);
                blocks.push(b);
            }
        }
    }

    if fetch_tx_details {
        add_transaction_data(source, &mut blocks).await?;
    }

    Ok(BlockSlice::from_parts(from, to + 1, head - to, blocks))
}

/// Attach transaction payloads to every event in `blocks`.
///
/// Lookups are memoized per transaction hash within one call. A failed
/// transaction lookup aborts the batch; a failed sender recovery degrades
/// to the zero address so one flaky call cannot kill the whole batch.
pub async fn add_transaction_data(
    source: &dyn LogSource,
    blocks: &mut [Block],
) -> Result<(), StreamError> {
    let mut fetched: HashMap<B256, (Transaction, Address)> = HashMap::new();

    for block in blocks.iter_mut() {
        for event in &mut block.events {
            if !fetched.contains_key(&event.tx_hash) {
                let tx = source.tx_by_hash(event.tx_hash).await?;
                let from = match source.sender(event.tx_hash, event.block_hash, event.tx_index).await
                {
                    Ok(addr) => addr,
                    Err(err) => {
                        warn!(tx_hash = %event.tx_hash, %err, "sender recovery failed; using zero address");
                        Address::ZERO
                    }
                };
                fetched.insert(event.tx_hash, (tx, from));
            }
            let (tx, from) = &fetched[&event.tx_hash];
            event.tx = Some(TxDetails {
                data: tx.data.clone(),
                value: tx.value,
                from: *from,
                gas: tx.gas,
            });
        }
    }
    Ok(())
}

// ─── Tests ────────────────────────────────────────────────────────────────────
