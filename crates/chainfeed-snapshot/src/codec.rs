//! Conversions between the in-memory model and the wire schema, plus
//! JSON framing and file dump/restore.

use std::fs;
use std::path::Path;

use alloy_primitives::{Address, Bytes, B256, U256};

use chainfeed_core::{Block, BlockSlice, Event, FilterQuery, InMemoryEventLog, TxDetails};

use crate::error::SnapshotError;
use crate::wire::{EventLogFile, WireBlock, WireBlockSlice, WireEvent, WireFilterQuery};

// ─── Scalar helpers ───────────────────────────────────────────────────────────

fn encode_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn decode_raw(s: &str) -> Result<Vec<u8>, SnapshotError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(stripped).map_err(|_| SnapshotError::InvalidHex(s.to_string()))
}

fn decode_address(s: &str) -> Result<Address, SnapshotError> {
    let bytes = decode_raw(s)?;
    if bytes.len() != Address::len_bytes() {
        return Err(SnapshotError::InvalidAddress(s.to_string()));
    }
    Ok(Address::from_slice(&bytes))
}

fn decode_hash(s: &str) -> Result<B256, SnapshotError> {
    Ok(bytes_to_hash(&decode_raw(s)?))
}

/// Convert raw bytes to a 32-byte hash, right-aligned: longer input is
/// truncated from the left, shorter input is left-padded with zeros.
pub fn bytes_to_hash(bytes: &[u8]) -> B256 {
    let mut hash = B256::ZERO;
    let tail = if bytes.len() > 32 { &bytes[bytes.len() - 32..] } else { bytes };
    hash[32 - tail.len()..].copy_from_slice(tail);
    hash
}

fn encode_opt_u64(n: Option<u64>) -> String {
    match n {
        Some(n) => format!("{:#x}", n),
        None => String::new(),
    }
}

fn decode_opt_u64(s: &str) -> Result<Option<u64>, SnapshotError> {
    if s.is_empty() || s == "<nil>" {
        return Ok(None);
    }
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map(Some).map_err(|_| SnapshotError::InvalidNumber(s.to_string()))
}

fn decode_opt_u256(s: &str) -> Result<Option<U256>, SnapshotError> {
    if s.is_empty() || s == "<nil>" {
        return Ok(None);
    }
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(s, 10),
    };
    parsed.map(Some).map_err(|_| SnapshotError::InvalidNumber(s.to_string()))
}

// ─── Event ────────────────────────────────────────────────────────────────────

impl From<&Event> for WireEvent {
    fn from(e: &Event) -> Self {
        let (tx_data, tx_value, tx_from, tx_gas) = match &e.tx {
            Some(tx) => (
                encode_bytes(&tx.data),
                format!("{:#x}", tx.value),
                encode_bytes(tx.from.as_slice()),
                tx.gas,
            ),
            None => (String::new(), String::new(), String::new(), 0),
        };
        Self {
            address: encode_bytes(e.address.as_slice()),
            topics: e.topics.iter().map(|t| encode_bytes(t.as_slice())).collect(),
            data: encode_bytes(&e.data),
            block_number: e.block_number,
            block_hash: encode_bytes(e.block_hash.as_slice()),
            index: e.index,
            tx_hash: encode_bytes(e.tx_hash.as_slice()),
            tx_index: e.tx_index,
            tx_data,
            tx_value,
            tx_from,
            tx_gas,
        }
    }
}

impl TryFrom<WireEvent> for Event {
    type Error = SnapshotError;

    fn try_from(w: WireEvent) -> Result<Self, Self::Error> {
        let tx = match decode_opt_u256(&w.tx_value)? {
            Some(value) => Some(TxDetails {
                data: Bytes::from(decode_raw(&w.tx_data)?),
                value,
                from: if w.tx_from.is_empty() {
                    Address::ZERO
                } else {
                    decode_address(&w.tx_from)?
                },
                gas: w.tx_gas,
            }),
            None => None,
        };
        Ok(Self {
            address: decode_address(&w.address)?,
            topics: w.topics.iter().map(|t| decode_hash(t)).collect::<Result<_, _>>()?,
            data: Bytes::from(decode_raw(&w.data)?),
            block_number: w.block_number,
            block_hash: decode_hash(&w.block_hash)?,
            index: w.index,
            tx_hash: decode_hash(&w.tx_hash)?,
            tx_index: w.tx_index,
            tx,
        })
    }
}

// ─── Block / BlockSlice ───────────────────────────────────────────────────────

impl From<&Block> for WireBlock {
    fn from(b: &Block) -> Self {
        Self {
            number: b.number,
            hash: encode_bytes(b.hash.as_slice()),
            events: b.events.iter().map(WireEvent::from).collect(),
        }
    }
}

impl TryFrom<WireBlock> for Block {
    type Error = SnapshotError;

    fn try_from(w: WireBlock) -> Result<Self, Self::Error> {
        Ok(Self {
            number: w.number,
            hash: decode_hash(&w.hash)?,
            events: w.events.into_iter().map(Event::try_from).collect::<Result<_, _>>()?,
        })
    }
}

impl From<&BlockSlice> for WireBlockSlice {
    fn from(s: &BlockSlice) -> Self {
        Self {
            start: s.start(),
            end: s.end(),
            distance_from_head: s.distance_from_head(),
            // Blocks at or past the end are not part of the window.
            blocks: s
                .blocks()
                .iter()
                .filter(|b| b.number < s.end())
                .map(WireBlock::from)
                .collect(),
        }
    }
}

impl TryFrom<WireBlockSlice> for BlockSlice {
    type Error = SnapshotError;

    fn try_from(w: WireBlockSlice) -> Result<Self, Self::Error> {
        let blocks =
            w.blocks.into_iter().map(Block::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(BlockSlice::from_parts(w.start, w.end, w.distance_from_head, blocks))
    }
}

// ─── FilterQuery ──────────────────────────────────────────────────────────────

impl From<&FilterQuery> for WireFilterQuery {
    fn from(f: &FilterQuery) -> Self {
        Self {
            addresses: f.addresses.iter().map(|a| encode_bytes(a.as_slice())).collect(),
            from_block: encode_opt_u64(f.from_block),
            to_block: encode_opt_u64(f.to_block),
            topics: f
                .topics
                .iter()
                .map(|position| position.iter().map(|t| encode_bytes(t.as_slice())).collect())
                .collect(),
        }
    }
}

impl TryFrom<WireFilterQuery> for FilterQuery {
    type Error = SnapshotError;

    fn try_from(w: WireFilterQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            addresses: w.addresses.iter().map(|a| decode_address(a)).collect::<Result<_, _>>()?,
            from_block: decode_opt_u64(&w.from_block)?,
            to_block: decode_opt_u64(&w.to_block)?,
            topics: w
                .topics
                .iter()
                .map(|position| position.iter().map(|t| decode_hash(t)).collect())
                .collect::<Result<_, _>>()?,
        })
    }
}

// ─── EventLogFile ─────────────────────────────────────────────────────────────

impl EventLogFile {
    /// Snapshot an in-memory event log.
    pub fn from_eventlog(log: &InMemoryEventLog) -> Self {
        use chainfeed_core::EventLog;
        Self {
            filter: WireFilterQuery::from(&log.filter()),
            block_slice: WireBlockSlice::from(log.block_slice()),
        }
    }

    /// Rebuild the event log this snapshot was taken from.
    pub fn into_eventlog(self) -> Result<InMemoryEventLog, SnapshotError> {
        let filter = FilterQuery::try_from(self.filter)?;
        let slice = BlockSlice::try_from(self.block_slice)?;
        Ok(InMemoryEventLog::from_parts(filter, slice))
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the snapshot to a file.
    pub fn dump(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a snapshot back from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chainfeed_core::EventLog;

    fn event(block_number: u64, index: u64) -> Event {
        Event {
            address: Address::repeat_byte(0xaa),
            topics: vec![B256::repeat_byte(0x01), B256::repeat_byte(0x02)],
            data: Bytes::from(vec![1, 2, 3]),
            block_number,
            block_hash: B256::repeat_byte(block_number as u8),
            index,
            tx_hash: B256::repeat_byte(0x70),
            tx_index: 3,
            tx: None,
        }
    }

    fn block(number: u64) -> Block {
        let mut b = Block::new(number, B256::repeat_byte(number as u8));
        b.events = vec![event(number, 0), event(number, 1)];
        b
    }

    #[test]
    fn event_round_trip_without_tx() {
        let e = event(105, 0);
        let back = Event::try_from(WireEvent::from(&e)).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn event_round_trip_with_tx() {
        let mut e = event(105, 0);
        e.tx = Some(TxDetails {
            data: Bytes::from(vec![0xde, 0xad]),
            value: U256::from(123_456u64),
            from: Address::repeat_byte(0xfe),
            gas: 21_000,
        });
        let wire = WireEvent::from(&e);
        assert_eq!(wire.tx_value, "0x1e240");
        assert_eq!(Event::try_from(wire).unwrap(), e);
    }

    #[test]
    fn zero_tx_value_stays_present() {
        let mut e = event(105, 0);
        e.tx = Some(TxDetails { value: U256::ZERO, ..Default::default() });
        let wire = WireEvent::from(&e);
        assert_eq!(wire.tx_value, "0x0");
        assert!(Event::try_from(wire).unwrap().tx.is_some());
    }

    #[test]
    fn invalid_address_is_rejected() {
        let mut wire = WireEvent::from(&event(105, 0));
        wire.address = "0x1234".into();
        assert!(matches!(Event::try_from(wire), Err(SnapshotError::InvalidAddress(_))));
    }

    #[test]
    fn hashes_are_right_aligned() {
        let mut expected = B256::ZERO;
        expected[30] = 0xab;
        expected[31] = 0xcd;
        assert_eq!(bytes_to_hash(&[0xab, 0xcd]), expected);

        // Longer input keeps the last 32 bytes.
        let long: Vec<u8> = (0u8..40).collect();
        assert_eq!(bytes_to_hash(&long), B256::from_slice(&long[8..]));
    }

    #[test]
    fn absent_numbers_normalize() {
        assert_eq!(decode_opt_u64("").unwrap(), None);
        assert_eq!(decode_opt_u64("<nil>").unwrap(), None);
        assert_eq!(decode_opt_u64("0x2a").unwrap(), Some(42));
        assert_eq!(decode_opt_u64("42").unwrap(), Some(42));
        assert!(decode_opt_u64("forty-two").is_err());
        assert_eq!(encode_opt_u64(None), "");
    }

    #[test]
    fn filter_round_trip() {
        let f = FilterQuery::address(Address::repeat_byte(0xaa))
            .from_block(100)
            .topic(vec![B256::repeat_byte(0x01), B256::repeat_byte(0x02)])
            .topic(vec![]);
        let wire = WireFilterQuery::from(&f);
        assert_eq!(wire.to_block, "");
        assert_eq!(FilterQuery::try_from(wire).unwrap(), f);
    }

    #[test]
    fn eventlog_file_round_trip() {
        let mut log = InMemoryEventLog::new(100, FilterQuery::address(Address::repeat_byte(0xaa)));
        log.append(block(103)).unwrap();
        log.append(block(107)).unwrap();
        log.set_next(121).unwrap();

        let file = EventLogFile::from_eventlog(&log);
        let json = file.to_json().unwrap();
        let restored = EventLogFile::from_json(&json).unwrap().into_eventlog().unwrap();

        assert_eq!(restored.filter(), log.filter());
        assert_eq!(restored.block_slice(), log.block_slice());
    }

    #[test]
    fn dump_and_load() {
        let mut log = InMemoryEventLog::new(100, FilterQuery::default());
        log.append(block(105)).unwrap();

        let path = std::env::temp_dir()
            .join(format!("chainfeed-snapshot-{}.json", std::process::id()));
        EventLogFile::from_eventlog(&log).dump(&path).unwrap();
        let restored = EventLogFile::load(&path).unwrap().into_eventlog().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(restored.block_slice(), log.block_slice());
    }
}
