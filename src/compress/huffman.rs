//! Canonical Huffman codes for DEFLATE's fixed code (RFC 1951 §3.2.6).

use std::sync::LazyLock;

/// Longest code length DEFLATE allows.
pub const MAX_CODE_LENGTH: usize = 15;

/// Huffman code: (code bits, length in bits).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HuffmanCode {
    /// The code bits, right-aligned, most significant bit first.
    pub code: u16,
    /// Number of bits in the code.
    pub length: u8,
}

/// Assign canonical codes from per-symbol code lengths.
///
/// Symbols with length 0 get no code.
pub fn generate_canonical_codes(lengths: &[u8]) -> Vec<HuffmanCode> {
    let mut bl_count = [0u16; MAX_CODE_LENGTH + 1];
    for &length in lengths.iter().filter(|&&l| l > 0) {
        bl_count[length as usize] += 1;
    }

    let mut next_code = [0u16; MAX_CODE_LENGTH + 1];
    let mut code = 0u16;
    for bits in 1..=MAX_CODE_LENGTH {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }

    lengths
        .iter()
        .map(|&length| {
            if length == 0 {
                return HuffmanCode::default();
            }
            let code = next_code[length as usize];
            next_code[length as usize] += 1;
            HuffmanCode { code, length }
        })
        .collect()
}

/// Code lengths of the fixed literal/length alphabet.
fn fixed_literal_lengths() -> [u8; 288] {
    let mut lengths = [0u8; 288];
    for (symbol, length) in lengths.iter_mut().enumerate() {
        *length = match symbol {
            0..=143 => 8,
            144..=255 => 9,
            256..=279 => 7,
            _ => 8,
        };
    }
    lengths
}

static FIXED_LITERAL_CODES: LazyLock<Vec<HuffmanCode>> =
    LazyLock::new(|| generate_canonical_codes(&fixed_literal_lengths()));

static FIXED_DISTANCE_CODES: LazyLock<Vec<HuffmanCode>> =
    LazyLock::new(|| generate_canonical_codes(&[5u8; 32]));

/// DEFLATE fixed Huffman codes for literal/length symbols (0-287).
#[inline]
pub fn fixed_literal_codes() -> &'static [HuffmanCode] {
    &FIXED_LITERAL_CODES
}

/// DEFLATE fixed Huffman codes for distance symbols (0-31).
#[inline]
pub fn fixed_distance_codes() -> &'static [HuffmanCode] {
    &FIXED_DISTANCE_CODES
}
