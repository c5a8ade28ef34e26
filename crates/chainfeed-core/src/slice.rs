//! `BlockSlice` — an ordered, gap-tolerant window of log-bearing blocks.
//!
//! A slice covers the half-open range `[start, end)`. Blocks inside it are
//! strictly increasing in number but sparse: a block appears only if it
//! carried matching logs. `end` moves forward through `append`, `concat`,
//! and `extend`; only `rollback`/`delete_from_block` move it backward,
//! which invalidates prior delivery.

use crate::error::StreamError;
use crate::types::Block;

/// A half-open window `[start, end)` of sparse, ordered blocks.
///
/// `distance_from_head` is a freshness hint: how far the fetched upper
/// bound lagged the chain head at fetch time. Zero means at head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSlice {
    start: u64,
    end: u64,
    distance_from_head: u64,
    blocks: Vec<Block>,
}

impl BlockSlice {
    /// Create an empty slice `[from, from)`.
    pub fn empty(from: u64) -> Self {
        Self { start: from, end: from, distance_from_head: 0, blocks: Vec::new() }
    }

    /// Reassemble a slice from its parts. Blocks must be strictly
    /// increasing in number and lie within `[start, end)`.
    pub fn from_parts(start: u64, end: u64, distance_from_head: u64, blocks: Vec<Block>) -> Self {
        debug_assert!(blocks.windows(2).all(|w| w[0].number < w[1].number));
        Self { start, end, distance_from_head, blocks }
    }

    /// Inclusive lower bound of the window.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Exclusive upper bound of the window.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// How far the window's upper bound lagged the chain head at fetch time.
    pub fn distance_from_head(&self) -> u64 {
        self.distance_from_head
    }

    /// The stored blocks, oldest first.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Consume the slice, yielding its blocks.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// Append a block at the tip. Requires `block.number >= end`.
    ///
    /// Sets `end` past the appended block and clears the freshness lag:
    /// the latest append is by definition at head.
    pub fn append(&mut self, block: Block) -> Result<(), StreamError> {
        if block.number < self.end {
            return Err(StreamError::AppendOutOfOrder { got: block.number, want: self.end });
        }
        self.end = block.number + 1;
        self.distance_from_head = 0;
        self.blocks.push(block);
        Ok(())
    }

    /// Absorb an adjacent slice. Requires `other.start == end`.
    ///
    /// Adopts `other`'s `end` and `distance_from_head`.
    pub fn concat(&mut self, other: BlockSlice) -> Result<(), StreamError> {
        if other.start != self.end {
            return Err(StreamError::ConcatGap { got: other.start, want: self.end });
        }
        self.blocks.extend(other.blocks);
        self.end = other.end;
        self.distance_from_head = other.distance_from_head;
        Ok(())
    }

    /// Invalidate everything at or above `n`. Requires `start <= n <= end`.
    pub fn rollback(&mut self, n: u64) -> Result<(), StreamError> {
        if n > self.end || n < self.start {
            return Err(StreamError::RollbackOutOfRange { n, start: self.start, end: self.end });
        }
        self.delete_from_block(n);
        Ok(())
    }

    /// Advance `end` to `n` without adding blocks: scanned to `n`, nothing
    /// matched. Requires `n >= end`.
    pub fn extend(&mut self, n: u64) -> Result<(), StreamError> {
        if n < self.end {
            return Err(StreamError::ExtendBehindEnd { n, end: self.end });
        }
        self.end = n;
        Ok(())
    }

    /// Drop all blocks with `number < n` and move `start` up to `n`.
    /// No-op when `n <= start`: `start` only moves forward.
    pub fn delete_before_block(&mut self, n: u64) {
        if n <= self.start {
            return;
        }
        self.blocks.retain(|b| b.number >= n);
        self.start = n;
    }

    /// Drop all blocks with `number >= n` and move `end` down to `n`.
    /// No-op when `n >= end`: `end` is never extended this way.
    pub fn delete_from_block(&mut self, n: u64) {
        if n >= self.end {
            return;
        }
        self.blocks.retain(|b| b.number < n);
        self.distance_from_head = self.distance_from_head.saturating_sub(self.end - n);
        self.end = n;
    }
}

// ─── Overlap comparison ───────────────────────────────────────────────────────

/// Result of comparing a freshly fetched slice against retained history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapCheck {
    /// Every overlapping position carried the same hash (vacuously true
    /// for an empty overlap).
    Agreed,
    /// The chain changed somewhere inside the overlap.
    Diverged {
        /// Newest overlap block whose hash still agreed, if any did.
        last_good: Option<u64>,
        /// Number at the first disagreeing position: the lower of the two
        /// paired block numbers, or the history block's number when the
        /// fetch no longer has a block to pair it with.
        first_bad: u64,
    },
}

/// Compare `new` with `history` where they overlap.
///
/// Blocks are paired by position after restricting `history` to
/// `[new.start, history.end)`; detection is hash-based, since a block
/// whose matching log disappeared is indistinguishable from one that
/// never had any. A fetch that ends before the retained history is a
/// protocol violation.
pub fn match_blocks(new: &BlockSlice, history: &BlockSlice) -> Result<OverlapCheck, StreamError> {
    if new.end() < history.end() {
        return Err(StreamError::Protocol(format!(
            "new blocks end before history: got new={}:{}; history={}:{}",
            new.start(),
            new.end(),
            history.start(),
            history.end()
        )));
    }

    let mut last_good = None;
    let overlap = history.blocks().iter().filter(|b| b.number >= new.start());
    for (i, ob) in overlap.enumerate() {
        match new.blocks().get(i) {
            Some(nb) if nb.hash == ob.hash => last_good = Some(nb.number),
            Some(nb) => {
                return Ok(OverlapCheck::Diverged {
                    last_good,
                    first_bad: ob.number.min(nb.number),
                })
            }
            None => return Ok(OverlapCheck::Diverged { last_good, first_bad: ob.number }),
        }
    }
    Ok(OverlapCheck::Agreed)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
