//! DEFLATE compression algorithm (RFC 1951) in a zlib container (RFC 1950).
//!
//! Output is a single final block coded with the fixed Huffman tables.

use std::fmt;
use std::sync::LazyLock;

use crate::bits::BitWriter;
use crate::compress::lz77::{self, Token, MAX_MATCH_LENGTH, MIN_MATCH_LENGTH};
use crate::compress::{adler32::adler32, huffman};
use crate::error::{try_with_capacity, Result};

const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

const DISTANCE_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// zlib header: deflate with a 32K window, FLEVEL 1, no preset dictionary.
pub const ZLIB_HEADER: [u8; 2] = [0x78, 0x5E];

/// Lookup table for length codes: (length-3) -> (symbol offset, extra_bits).
const LENGTH_LOOKUP: [(u8, u8); 256] = {
    let mut table = [(0u8, 0u8); 256];
    let mut i = 0usize;
    while i < 256 {
        let length = i + 3;
        let mut code_idx = 0usize;
        while code_idx < 28 {
            if length >= LENGTH_BASE[code_idx] as usize
                && length < LENGTH_BASE[code_idx + 1] as usize
            {
                break;
            }
            code_idx += 1;
        }
        table[i] = (code_idx as u8, LENGTH_EXTRA[code_idx]);
        i += 1;
    }
    table
};

/// Get the length symbol (257-285), extra bit count and extra value for a match length.
#[inline]
fn length_code(length: u16) -> (u16, u8, u16) {
    debug_assert!(
        (MIN_MATCH_LENGTH as u16..=MAX_MATCH_LENGTH as u16).contains(&length),
        "Invalid length: {length}",
    );

    let idx = (length - 3) as usize;
    let (code_offset, extra_bits) = LENGTH_LOOKUP[idx];
    let symbol = 257 + code_offset as u16;
    let extra_value = length - LENGTH_BASE[code_offset as usize];
    (symbol, extra_bits, extra_value)
}

/// Get the distance symbol (0-29), extra bit count and extra value for a match distance.
#[inline]
fn distance_code(distance: u16) -> (u16, u8, u16) {
    debug_assert!(distance >= 1, "Invalid distance");

    let code_idx = DISTANCE_BASE
        .iter()
        .rposition(|&base| base <= distance)
        .unwrap_or(0);
    let extra_bits = DISTANCE_EXTRA[code_idx];
    let extra_value = distance - DISTANCE_BASE[code_idx];
    (code_idx as u16, extra_bits, extra_value)
}

const REVERSE_BYTE: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut r = 0u8;
        let mut b = i as u8;
        let mut j = 0;
        while j < 8 {
            r = (r << 1) | (b & 1);
            b >>= 1;
            j += 1;
        }
        table[i] = r;
        i += 1;
    }
    table
};

/// Reverse the low `length` bits of `code`; Huffman codes go out MSB first.
#[inline]
fn reverse_bits(code: u16, length: u8) -> u32 {
    if length == 0 {
        return 0;
    }
    let low = REVERSE_BYTE[code as u8 as usize] as u16;
    let high = REVERSE_BYTE[(code >> 8) as u8 as usize] as u16;
    let reversed = (low << 8) | high;
    (reversed >> (16 - length)) as u32
}

/// Cached reversed fixed literal codes.
static FIXED_LIT_REV: LazyLock<[(u32, u8); 288]> = LazyLock::new(|| {
    let mut out = [(0u32, 0u8); 288];
    for (slot, c) in out.iter_mut().zip(huffman::fixed_literal_codes()) {
        *slot = (reverse_bits(c.code, c.length), c.length);
    }
    out
});

/// Cached reversed fixed distance codes.
static FIXED_DIST_REV: LazyLock<[(u32, u8); 32]> = LazyLock::new(|| {
    let mut out = [(0u32, 0u8); 32];
    for (slot, c) in out.iter_mut().zip(huffman::fixed_distance_codes()) {
        *slot = (reverse_bits(c.code, c.length), c.length);
    }
    out
});

/// Append one token to a fixed-Huffman block.
#[inline]
fn write_token(writer: &mut BitWriter, token: Token) {
    let lit_rev = &*FIXED_LIT_REV;
    match token {
        Token::Literal(byte) => {
            let (code, len) = lit_rev[byte as usize];
            writer.write_bits(code, len);
        }
        Token::Match { length, distance } => {
            let (len_symbol, len_extra_bits, len_extra_value) = length_code(length);
            let (len_code, len_len) = lit_rev[len_symbol as usize];
            writer.write_bits(len_code, len_len);
            if len_extra_bits > 0 {
                writer.write_bits(len_extra_value as u32, len_extra_bits);
            }

            let (dist_symbol, dist_extra_bits, dist_extra_value) = distance_code(distance);
            let (dist_code, dist_len) = FIXED_DIST_REV[dist_symbol as usize];
            writer.write_bits(dist_code, dist_len);
            if dist_extra_bits > 0 {
                writer.write_bits(dist_extra_value as u32, dist_extra_bits);
            }
        }
    }
}

/// Compress `data` into a complete zlib stream.
///
/// `quality` bounds the number of match candidates kept per hash bucket;
/// values below 5 are treated as 5.
pub fn zlib_compress(data: &[u8], quality: u32) -> Result<Vec<u8>> {
    let mut out = try_with_capacity(data.len() / 2 + 64)?;
    out.extend_from_slice(&ZLIB_HEADER);

    let mut writer = BitWriter::with_buffer(out);
    writer.write_bits(1, 1); // BFINAL
    writer.write_bits(1, 2); // BTYPE = 01 (fixed Huffman)

    let mut literals = 0usize;
    let mut matches = 0usize;
    lz77::tokenize(data, quality, |token| {
        match token {
            Token::Literal(_) => literals += 1,
            Token::Match { .. } => matches += 1,
        }
        write_token(&mut writer, token);
    })?;

    let (eob_code, eob_len) = FIXED_LIT_REV[256];
    writer.write_bits(eob_code, eob_len);

    let mut out = writer.finish();
    out.extend_from_slice(&adler32(data).to_be_bytes());

    log::trace!(
        "zlib: {} bytes -> {} bytes ({literals} literals, {matches} matches)",
        data.len(),
        out.len()
    );
    Ok(out)
}

/// Produces a zlib stream from raw bytes.
///
/// The PNG writer calls this for its IDAT payload. Any function or closure
/// with the same signature works as a compressor.
pub trait ZlibCompressor: Send + Sync {
    /// Compress `data` into a complete zlib stream (header, blocks, Adler-32).
    fn compress(&self, data: &[u8], quality: u32) -> Result<Vec<u8>>;
}

impl<F> ZlibCompressor for F
where
    F: Fn(&[u8], u32) -> Result<Vec<u8>> + Send + Sync,
{
    fn compress(&self, data: &[u8], quality: u32) -> Result<Vec<u8>> {
        self(data, quality)
    }
}

/// The built-in compressor: LZ77 with hash chains and fixed Huffman codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedHuffmanZlib;

impl ZlibCompressor for FixedHuffmanZlib {
    fn compress(&self, data: &[u8], quality: u32) -> Result<Vec<u8>> {
        zlib_compress(data, quality)
    }
}

impl fmt::Debug for dyn ZlibCompressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ZlibCompressor")
    }
}
