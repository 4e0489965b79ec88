//! LZ77 match finding over a 32 KiB sliding window.
//!
//! Positions are bucketed by a hash of their next three bytes. Each bucket
//! keeps at most `2 * quality` positions; when it fills up the older half is
//! evicted. Parsing is greedy with one step of lazy evaluation.

use crate::error::{try_reserve, try_with_capacity, Result};

/// Maximum distance to look back for matches (32KB window).
pub const WINDOW_SIZE: usize = 32768;

/// Maximum match length (RFC 1951).
pub const MAX_MATCH_LENGTH: usize = 258;

/// Minimum match length worth encoding.
pub const MIN_MATCH_LENGTH: usize = 3;

/// Number of hash bits; the table has `1 << HASH_BITS` buckets.
pub const HASH_BITS: u32 = 14;

const HASH_SIZE: usize = 1 << HASH_BITS;

/// Smallest accepted quality; lower values are raised to this.
pub const MIN_QUALITY: u32 = 5;

/// LZ77 token representing either a literal or a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A literal byte that couldn't be compressed.
    Literal(u8),
    /// A back-reference: (length, distance).
    Match {
        /// Length of the match (3-258).
        length: u16,
        /// Distance back to the match (1-32767).
        distance: u16,
    },
}

/// Hash the three bytes at the start of `bytes` into a bucket index.
#[inline]
pub fn hash3(bytes: &[u8]) -> usize {
    let mut h = bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16;
    h ^= h << 3;
    h = h.wrapping_add(h >> 5);
    h ^= h << 4;
    h = h.wrapping_add(h >> 17);
    h ^= h << 25;
    h = h.wrapping_add(h >> 6);
    h as usize & (HASH_SIZE - 1)
}

/// Bucketed match candidates, oldest first within each bucket.
#[derive(Debug)]
pub struct HashChainTable {
    buckets: Vec<Vec<usize>>,
    quality: usize,
}

impl HashChainTable {
    /// Create an empty table. `quality` is clamped to at least [`MIN_QUALITY`].
    pub fn new(quality: u32) -> Result<Self> {
        let mut buckets = try_with_capacity(HASH_SIZE)?;
        buckets.resize_with(HASH_SIZE, Vec::new);
        Ok(Self {
            buckets,
            quality: quality.max(MIN_QUALITY) as usize,
        })
    }

    /// Effective quality (half the bucket capacity).
    pub fn quality(&self) -> usize {
        self.quality
    }

    /// Positions recorded under `hash`, oldest first.
    #[inline]
    pub fn candidates(&self, hash: usize) -> &[usize] {
        &self.buckets[hash]
    }

    /// Record `pos` under `hash`, evicting the older half of a full bucket.
    pub fn insert(&mut self, hash: usize, pos: usize) -> Result<()> {
        let capacity = 2 * self.quality;
        let bucket = &mut self.buckets[hash];
        if bucket.capacity() == 0 {
            try_reserve(bucket, capacity)?;
        }
        if bucket.len() == capacity {
            bucket.drain(..self.quality);
        }
        bucket.push(pos);
        Ok(())
    }
}

/// Length of the common run at `earlier` and `pos`, capped at 258 and the end of input.
#[inline]
fn match_length(data: &[u8], earlier: usize, pos: usize) -> usize {
    let limit = (data.len() - pos).min(MAX_MATCH_LENGTH);
    data[earlier..earlier + limit]
        .iter()
        .zip(&data[pos..pos + limit])
        .take_while(|(a, b)| a == b)
        .count()
}

/// Parse `data` into literals and back-references, handing each to `emit` in order.
pub fn tokenize<F: FnMut(Token)>(data: &[u8], quality: u32, mut emit: F) -> Result<()> {
    let mut table = HashChainTable::new(quality)?;
    let mut i = 0usize;

    while i + MIN_MATCH_LENGTH < data.len() {
        let hash = hash3(&data[i..]);
        let mut best = MIN_MATCH_LENGTH;
        let mut best_pos = None;
        for &p in table.candidates(hash) {
            if i - p < WINDOW_SIZE {
                let len = match_length(data, p, i);
                // Later candidates win ties: they are closer.
                if len >= best {
                    best = len;
                    best_pos = Some(p);
                }
            }
        }

        table.insert(hash, i)?;

        if best_pos.is_some() {
            let next = i + 1;
            let longer_next = table
                .candidates(hash3(&data[next..]))
                .iter()
                .any(|&p| next - p < WINDOW_SIZE && match_length(data, p, next) > best);
            if longer_next {
                best_pos = None;
            }
        }

        match best_pos {
            Some(p) => {
                emit(Token::Match {
                    length: best as u16,
                    distance: (i - p) as u16,
                });
                i += best;
            }
            None => {
                emit(Token::Literal(data[i]));
                i += 1;
            }
        }
    }

    for &byte in &data[i..] {
        emit(Token::Literal(byte));
    }
    Ok(())
}
