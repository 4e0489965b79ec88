//! Forward 8x8 DCT, Arai-Agui-Nakajima factorization.
//!
//! Outputs are scaled: coefficient (u, v) comes out multiplied by
//! `AAN_SCALE[u] * AAN_SCALE[v]` relative to the orthonormal JPEG DCT; the
//! quantizer's reciprocal divisors fold that factor back out.

/// Per-frequency output scale of [`fdct_8x8`], including the overall factor of 2√2.
pub const AAN_SCALE: [f32; 8] = [
    1.0 * 2.828_427_125,
    1.387_039_845 * 2.828_427_125,
    1.306_562_965 * 2.828_427_125,
    1.175_875_602 * 2.828_427_125,
    1.0 * 2.828_427_125,
    0.785_694_958 * 2.828_427_125,
    0.541_196_100 * 2.828_427_125,
    0.275_899_379 * 2.828_427_125,
];

/// One 8-point pass over `d[base]`, `d[base + step]`, ..., in place.
#[inline]
fn fdct_1d(d: &mut [f32; 64], base: usize, step: usize) {
    let at = |k: usize| base + k * step;
    let (d0, d1, d2, d3) = (d[at(0)], d[at(1)], d[at(2)], d[at(3)]);
    let (d4, d5, d6, d7) = (d[at(4)], d[at(5)], d[at(6)], d[at(7)]);

    let tmp0 = d0 + d7;
    let tmp7 = d0 - d7;
    let tmp1 = d1 + d6;
    let tmp6 = d1 - d6;
    let tmp2 = d2 + d5;
    let tmp5 = d2 - d5;
    let tmp3 = d3 + d4;
    let tmp4 = d3 - d4;

    // Even part
    let tmp10 = tmp0 + tmp3;
    let tmp13 = tmp0 - tmp3;
    let tmp11 = tmp1 + tmp2;
    let tmp12 = tmp1 - tmp2;

    d[at(0)] = tmp10 + tmp11;
    d[at(4)] = tmp10 - tmp11;

    let z1 = (tmp12 + tmp13) * 0.707_106_781;
    d[at(2)] = tmp13 + z1;
    d[at(6)] = tmp13 - z1;

    // Odd part
    let tmp10 = tmp4 + tmp5;
    let tmp11 = tmp5 + tmp6;
    let tmp12 = tmp6 + tmp7;

    let z5 = (tmp10 - tmp12) * 0.382_683_433;
    let z2 = tmp10 * 0.541_196_100 + z5;
    let z4 = tmp12 * 1.306_562_965 + z5;
    let z3 = tmp11 * 0.707_106_781;

    let z11 = tmp7 + z3;
    let z13 = tmp7 - z3;

    d[at(5)] = z13 + z2;
    d[at(3)] = z13 - z2;
    d[at(1)] = z11 + z4;
    d[at(7)] = z11 - z4;
}

/// Transform a row-major 8x8 block in place: rows first, then columns.
pub fn fdct_8x8(block: &mut [f32; 64]) {
    for row in 0..8 {
        fdct_1d(block, row * 8, 1);
    }
    for col in 0..8 {
        fdct_1d(block, col, 8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Orthonormal JPEG DCT-II, straight from the definition.
    fn reference_dct(block: &[f32; 64]) -> [f64; 64] {
        let c = |k: usize| if k == 0 { 1.0 / 2f64.sqrt() } else { 1.0 };
        let mut out = [0.0f64; 64];
        for u in 0..8 {
            for v in 0..8 {
                let mut sum = 0.0;
                for y in 0..8 {
                    for x in 0..8 {
                        sum += block[y * 8 + x] as f64
                            * (((2 * y + 1) * u) as f64 * PI / 16.0).cos()
                            * (((2 * x + 1) * v) as f64 * PI / 16.0).cos();
                    }
                }
                out[u * 8 + v] = 0.25 * c(u) * c(v) * sum;
            }
        }
        out
    }

    #[test]
    fn test_zero_block() {
        let mut block = [0.0f32; 64];
        fdct_8x8(&mut block);
        assert!(block.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_constant_block_is_pure_dc() {
        let mut block = [100.0f32; 64];
        fdct_8x8(&mut block);
        assert!((block[0] - 6400.0).abs() < 1e-2);
        for &val in block.iter().skip(1) {
            assert!(val.abs() < 1e-3, "AC component too large: {val}");
        }
    }

    #[test]
    fn test_matches_reference_after_scaling() {
        let mut block = [0.0f32; 64];
        for (i, v) in block.iter_mut().enumerate() {
            *v = ((i * 37 % 256) as f32) - 128.0;
        }
        let expected = reference_dct(&block);

        fdct_8x8(&mut block);
        for u in 0..8 {
            for v in 0..8 {
                let got = block[u * 8 + v] as f64 / (AAN_SCALE[u] * AAN_SCALE[v]) as f64;
                let want = expected[u * 8 + v];
                assert!(
                    (got - want).abs() < 5e-2 * want.abs().max(1.0),
                    "({u},{v}): {got} vs {want}"
                );
            }
        }
    }
}
