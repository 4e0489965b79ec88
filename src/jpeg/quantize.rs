//! JPEG quantization tables and functions.

use crate::jpeg::dct::AAN_SCALE;

/// Standard JPEG luminance quantization table.
const STD_LUMINANCE_TABLE: [u8; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, 12, 12, 14, 19, 26, 58, 60, 55, 14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62, 18, 22, 37, 56, 68, 109, 103, 77, 24, 35, 55, 64, 81, 104, 113,
    92, 49, 64, 78, 87, 103, 121, 120, 101, 72, 92, 95, 98, 112, 100, 103, 99,
];

/// Standard JPEG chrominance quantization table.
const STD_CHROMINANCE_TABLE: [u8; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99, 18, 21, 26, 66, 99, 99, 99, 99, 24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
];

/// Zigzag scan order for 8x8 block: position in the scan -> natural index.
pub const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// Quality used when the caller passes 0.
pub const DEFAULT_QUALITY: u8 = 90;

/// Map a caller quality to 1-100: 0 selects [`DEFAULT_QUALITY`], larger values are clamped.
#[inline]
pub fn effective_quality(quality: u8) -> u8 {
    if quality == 0 {
        DEFAULT_QUALITY
    } else {
        quality.min(100)
    }
}

/// Percentage applied to the base tables (same formula as libjpeg).
#[inline]
fn scale_factor(quality: u8) -> u32 {
    let quality = quality.clamp(1, 100) as u32;
    if quality < 50 {
        5000 / quality
    } else {
        200 - 2 * quality
    }
}

/// Quantization tables for JPEG encoding.
#[derive(Debug, Clone)]
pub struct QuantizationTables {
    /// Luminance quantization table (zigzag order for output).
    pub luminance: [u8; 64],
    /// Chrominance quantization table (zigzag order for output).
    pub chrominance: [u8; 64],
    /// Luminance multipliers for DCT output, natural order.
    pub luminance_divisors: [f32; 64],
    /// Chrominance multipliers for DCT output, natural order.
    pub chrominance_divisors: [f32; 64],
}

impl QuantizationTables {
    /// Create quantization tables with the given quality (1-100).
    pub fn with_quality(quality: u8) -> Self {
        let scale = scale_factor(quality);
        let scaled = |base: u8| ((base as u32 * scale + 50) / 100).clamp(1, 255) as u8;

        let mut luminance = [0u8; 64];
        let mut chrominance = [0u8; 64];
        for i in 0..64 {
            luminance[i] = scaled(STD_LUMINANCE_TABLE[ZIGZAG[i]]);
            chrominance[i] = scaled(STD_CHROMINANCE_TABLE[ZIGZAG[i]]);
        }

        // Reciprocals in natural order, with the DCT's output scale folded in
        let mut luminance_divisors = [0.0f32; 64];
        let mut chrominance_divisors = [0.0f32; 64];
        for k in 0..64 {
            let aan = AAN_SCALE[k / 8] * AAN_SCALE[k % 8];
            luminance_divisors[k] = 1.0 / (scaled(STD_LUMINANCE_TABLE[k]) as f32 * aan);
            chrominance_divisors[k] = 1.0 / (scaled(STD_CHROMINANCE_TABLE[k]) as f32 * aan);
        }

        Self {
            luminance,
            chrominance,
            luminance_divisors,
            chrominance_divisors,
        }
    }
}

impl Default for QuantizationTables {
    fn default() -> Self {
        Self::with_quality(DEFAULT_QUALITY)
    }
}

/// Quantize a transformed block, returning coefficients in zigzag order.
///
/// Rounds to nearest with ties away from zero.
pub fn quantize_block(dct: &[f32; 64], divisors: &[f32; 64]) -> [i32; 64] {
    let mut result = [0i32; 64];
    for (out, &k) in result.iter_mut().zip(ZIGZAG.iter()) {
        let v = dct[k] * divisors[k];
        *out = (if v < 0.0 { v - 0.5 } else { v + 0.5 }) as i32;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag_is_permutation() {
        let mut seen = [false; 64];
        for &idx in &ZIGZAG {
            assert!(!seen[idx], "Position {idx} appears twice");
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_effective_quality() {
        assert_eq!(effective_quality(0), 90);
        assert_eq!(effective_quality(1), 1);
        assert_eq!(effective_quality(75), 75);
        assert_eq!(effective_quality(100), 100);
        assert_eq!(effective_quality(255), 100);
    }

    #[test]
    fn test_quality_50_is_identity() {
        // Quality 50 uses scale factor 100, leaving the base tables unchanged
        let tables = QuantizationTables::with_quality(50);
        assert_eq!(tables.luminance[0], 16);
        assert_eq!(tables.luminance[1], 11);
        assert_eq!(tables.luminance[2], 12);
        assert_eq!(tables.chrominance[0], 17);
    }

    #[test]
    fn test_quality_extremes_clamp() {
        let best = QuantizationTables::with_quality(100);
        assert!(best.luminance.iter().all(|&q| q == 1));

        let worst = QuantizationTables::with_quality(1);
        assert!(worst.luminance.iter().all(|&q| q == 255));
    }

    #[test]
    fn test_steps_non_increasing_with_quality() {
        let mut prev = QuantizationTables::with_quality(1);
        for quality in 2..=100u8 {
            let tables = QuantizationTables::with_quality(quality);
            for i in 0..64 {
                assert!(tables.luminance[i] <= prev.luminance[i], "q={quality} i={i}");
                assert!(tables.chrominance[i] <= prev.chrominance[i], "q={quality} i={i}");
            }
            prev = tables;
        }
    }

    #[test]
    fn test_divisors_fold_dct_scale() {
        let tables = QuantizationTables::with_quality(50);
        // DC: 1 / (16 * 8)
        assert!((tables.luminance_divisors[0] - 1.0 / 128.0).abs() < 1e-7);
    }

    #[test]
    fn test_quantize_rounds_half_away_from_zero() {
        let divisors = [1.0f32; 64];
        let mut dct = [0.0f32; 64];
        dct[0] = 2.5;
        dct[1] = -2.5;
        dct[8] = 0.49;
        dct[63] = -7.2;
        let q = quantize_block(&dct, &divisors);
        assert_eq!(q[0], 3);
        assert_eq!(q[1], -3); // natural 1 is zigzag 1
        assert_eq!(q[2], 0); // natural 8 is zigzag 2
        assert_eq!(q[63], -7);
    }
}
