//! Adler-32 checksum (RFC 1950) for the zlib trailer.

const MOD_ADLER: u32 = 65_521;

/// Largest run of bytes that can be summed before `s2` may overflow a u32.
const NMAX: usize = 5552;

/// Calculate the Adler-32 checksum of `data`.
///
/// The modulo is deferred to `NMAX`-sized block boundaries.
#[must_use]
pub fn adler32(data: &[u8]) -> u32 {
    let (s1, s2) = data.chunks(NMAX).fold((1u32, 0u32), |(mut s1, mut s2), block| {
        for &b in block {
            s1 += u32::from(b);
            s2 += s1;
        }
        (s1 % MOD_ADLER, s2 % MOD_ADLER)
    });
    (s2 << 16) | s1
}
