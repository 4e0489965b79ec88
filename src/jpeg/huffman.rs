//! JPEG baseline entropy coding with the standard Annex K tables.

use crate::bits::BitWriterMsb;

/// Standard DC luminance Huffman table (number of codes per bit length).
pub const DC_LUM_BITS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];

/// Standard DC luminance Huffman values.
pub const DC_LUM_VALS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Standard DC chrominance Huffman table.
pub const DC_CHROM_BITS: [u8; 16] = [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0];

/// Standard DC chrominance Huffman values.
pub const DC_CHROM_VALS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Standard AC luminance Huffman table.
pub const AC_LUM_BITS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 125];

/// Standard AC luminance Huffman values.
pub const AC_LUM_VALS: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
    0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
    0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
    0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
    0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
    0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// Standard AC chrominance Huffman table.
pub const AC_CHROM_BITS: [u8; 16] = [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 119];

/// Standard AC chrominance Huffman values.
pub const AC_CHROM_VALS: [u8; 162] = [
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61, 0x71,
    0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33, 0x52, 0xf0,
    0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18, 0x19, 0x1a, 0x26,
    0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
    0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68,
    0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
    0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5,
    0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
    0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda,
    0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// Huffman code: (code, length in bits).
#[derive(Debug, Clone, Copy, Default)]
struct HuffCode {
    code: u16,
    length: u8,
}

/// Code lookup tables for the four standard JPEG Huffman tables.
#[derive(Debug, Clone)]
pub struct HuffmanTables {
    dc_lum: [HuffCode; 16],
    dc_chrom: [HuffCode; 16],
    ac_lum: [HuffCode; 256],
    ac_chrom: [HuffCode; 256],
}

impl HuffmanTables {
    /// Build code lookups from the standard bits/vals tables.
    pub fn new() -> Self {
        Self {
            dc_lum: build_codes(&DC_LUM_BITS, &DC_LUM_VALS),
            dc_chrom: build_codes(&DC_CHROM_BITS, &DC_CHROM_VALS),
            ac_lum: build_codes(&AC_LUM_BITS, &AC_LUM_VALS),
            ac_chrom: build_codes(&AC_CHROM_BITS, &AC_CHROM_VALS),
        }
    }

    #[inline]
    fn dc_code(&self, category: u8, is_luminance: bool) -> HuffCode {
        let table = if is_luminance { &self.dc_lum } else { &self.dc_chrom };
        table[category as usize & 15]
    }

    #[inline]
    fn ac_code(&self, rs: u8, is_luminance: bool) -> HuffCode {
        let table = if is_luminance { &self.ac_lum } else { &self.ac_chrom };
        table[rs as usize]
    }
}

impl Default for HuffmanTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Assign canonical codes from a JPEG bits/vals table pair.
fn build_codes<const N: usize>(bits: &[u8; 16], vals: &[u8]) -> [HuffCode; N] {
    let mut codes = [HuffCode::default(); N];
    let mut code = 0u16;
    let mut symbols = vals.iter();

    for (length, &count) in bits.iter().enumerate() {
        for _ in 0..count {
            if let Some(&symbol) = symbols.next() {
                if let Some(slot) = codes.get_mut(symbol as usize) {
                    *slot = HuffCode {
                        code,
                        length: (length + 1) as u8,
                    };
                }
            }
            code += 1;
        }
        code <<= 1;
    }

    codes
}

/// Get the category (number of bits needed) for a value.
#[inline]
fn category(value: i32) -> u8 {
    32 - value.unsigned_abs().leading_zeros() as u8
}

/// Magnitude bits for a coefficient: the value itself, or value - 1 when negative.
#[inline]
fn encode_value(value: i32) -> (u32, u8) {
    let cat = category(value);
    if cat == 0 {
        return (0, 0);
    }
    let bits = (if value < 0 { value - 1 } else { value }) as u32;
    (bits & ((1 << cat) - 1), cat)
}

/// Entropy-code one quantized block given in zigzag order.
///
/// The DC term is coded as the difference from `prev_dc`. Returns this
/// block's DC value for the next block of the same component.
pub fn encode_block(
    writer: &mut BitWriterMsb,
    zigzag: &[i32; 64],
    prev_dc: i32,
    is_luminance: bool,
    tables: &HuffmanTables,
) -> i32 {
    let dc = zigzag[0];
    let dc_diff = dc - prev_dc;
    let dc_code = tables.dc_code(category(dc_diff), is_luminance);
    writer.write_bits(dc_code.code as u32, dc_code.length);
    let (val_bits, val_len) = encode_value(dc_diff);
    if val_len > 0 {
        writer.write_bits(val_bits, val_len);
    }

    // Index of the last nonzero AC coefficient
    let last = match zigzag.iter().rposition(|&c| c != 0) {
        Some(i) if i > 0 => i,
        _ => {
            let eob = tables.ac_code(0x00, is_luminance);
            writer.write_bits(eob.code as u32, eob.length);
            return dc;
        }
    };

    let mut zero_run = 0u8;
    for &ac in &zigzag[1..=last] {
        if ac == 0 {
            zero_run += 1;
            continue;
        }
        while zero_run >= 16 {
            let zrl = tables.ac_code(0xF0, is_luminance);
            writer.write_bits(zrl.code as u32, zrl.length);
            zero_run -= 16;
        }

        let (val_bits, val_len) = encode_value(ac);
        let ac_code = tables.ac_code((zero_run << 4) | val_len, is_luminance);
        writer.write_bits(ac_code.code as u32, ac_code.length);
        writer.write_bits(val_bits, val_len);
        zero_run = 0;
    }

    if last != 63 {
        let eob = tables.ac_code(0x00, is_luminance);
        writer.write_bits(eob.code as u32, eob.length);
    }

    dc
}
