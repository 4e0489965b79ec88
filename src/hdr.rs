//! Radiance RGBE (`.hdr`) writer for floating-point images.
//!
//! Each pixel becomes four bytes: an 8-bit mantissa per color channel and a
//! shared exponent. Scanlines between 8 and 32767 pixels wide use the
//! adaptive run-length format, one component plane at a time.

use std::path::Path;

use crate::config::EncodeConfig;
use crate::error::Result;
use crate::pixels::PixelView;
use crate::sink::{FileSink, Sink};

/// Narrowest scanline written with run-length planes.
const MIN_RLE_WIDTH: usize = 8;
/// Widest scanline the run-length header can describe, exclusive.
const MAX_RLE_WIDTH: usize = 32768;

/// Longest literal (dump) packet.
const MAX_DUMP: usize = 128;
/// Longest run packet.
const MAX_RUN: usize = 127;

/// Encode tightly packed linear float pixels as Radiance HDR.
pub fn encode(data: &[f32], width: u32, height: u32, channels: u8) -> Result<Vec<u8>> {
    let view = PixelView::new(data, width, height, channels)?;
    encode_with_config(&view, &EncodeConfig::default())
}

/// Encode a float pixel view to an in-memory HDR file.
pub fn encode_with_config(view: &PixelView<'_, f32>, config: &EncodeConfig) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    encode_to_sink(&mut output, view, config)?;
    Ok(output)
}

/// Encode a float pixel view, emitting the header and then one scanline at a time.
pub fn encode_to_sink<S: Sink + ?Sized>(
    sink: &mut S,
    view: &PixelView<'_, f32>,
    config: &EncodeConfig,
) -> Result<()> {
    let (width, height) = (view.width(), view.height());
    let header = format!(
        "#?RADIANCE\n# Written by pixwrite\nFORMAT=32-bit_rle_rgbe\n\
         EXPOSURE=          1.0000000000000\n\n-Y {height} +X {width}\n"
    );
    sink.emit(header.as_bytes());

    let channels = view.channels();
    let mut rgbe = Vec::with_capacity(width as usize * 4);
    let mut line = Vec::with_capacity(width as usize * 4 + 4);
    let mut written = header.len();

    for row in view.rows(config.flip_vertically) {
        rgbe.clear();
        rgbe.extend(row.chunks_exact(channels).map(pixel_to_rgbe));
        line.clear();
        write_scanline(&rgbe, &mut line);
        sink.emit(&line);
        written += line.len();
    }

    log::debug!(
        "hdr: {width}x{height} {:?}, {written} bytes",
        view.color_type()
    );
    Ok(())
}

/// Encode a float pixel view and stream it into the file at `path`.
pub fn write_to_file(
    path: impl AsRef<Path>,
    view: &PixelView<'_, f32>,
    config: &EncodeConfig,
) -> Result<()> {
    let mut sink = FileSink::create(path)?;
    encode_to_sink(&mut sink, view, config)?;
    sink.finish()
}

/// Split a positive normal or subnormal float into `(m, e)` with `x = m * 2^e` and `0.5 <= m < 1`.
fn frexp(x: f32) -> (f32, i32) {
    let bits = x.to_bits();
    let exp_bits = ((bits >> 23) & 0xFF) as i32;
    if exp_bits == 0 {
        // Subnormal: scale into the normal range first
        let (m, e) = frexp(x * (1u64 << 32) as f32);
        return (m, e - 32);
    }
    let mantissa = f32::from_bits((bits & 0x807F_FFFF) | (126 << 23));
    (mantissa, exp_bits - 126)
}

/// Largest exponent the biased RGBE exponent byte can store.
const MAX_EXPONENT: i32 = 127;

/// Convert linear RGB to shared-exponent RGBE.
///
/// Pixels whose brightest channel is tiny, or not finite, become all zeros.
/// Finite values at or above 2^127 clamp to the brightest encodable color.
pub fn rgb_to_rgbe(r: f32, g: f32, b: f32) -> [u8; 4] {
    let max = r.max(g).max(b);
    if !(max >= 1e-32) || !max.is_finite() {
        return [0; 4];
    }
    let (mantissa, exponent) = frexp(max);
    // The exponent byte tops out at 2^127; brighter pixels saturate the mantissas
    let (scale, exponent) = if exponent > MAX_EXPONENT {
        (256.0 / 2f32.powi(MAX_EXPONENT), MAX_EXPONENT)
    } else {
        (mantissa * 256.0 / max, exponent)
    };
    [
        (r * scale) as u8,
        (g * scale) as u8,
        (b * scale) as u8,
        (exponent + 128) as u8,
    ]
}

/// Gray input is replicated across RGB; alpha is dropped.
#[inline]
fn pixel_to_rgbe(px: &[f32]) -> [u8; 4] {
    match px.len() {
        1 | 2 => rgb_to_rgbe(px[0], px[0], px[0]),
        _ => rgb_to_rgbe(px[0], px[1], px[2]),
    }
}

/// Append one scanline of RGBE pixels, run-length coded when the width allows.
fn write_scanline(rgbe: &[[u8; 4]], out: &mut Vec<u8>) {
    let width = rgbe.len();
    if !(MIN_RLE_WIDTH..MAX_RLE_WIDTH).contains(&width) {
        out.extend(rgbe.iter().flatten());
        return;
    }

    out.extend_from_slice(&[2, 2, (width >> 8) as u8, (width & 0xFF) as u8]);
    let mut plane = Vec::with_capacity(width);
    for c in 0..4 {
        plane.clear();
        plane.extend(rgbe.iter().map(|px| px[c]));
        rle_plane(&plane, out);
    }
}

/// Code one component plane as dump and run packets.
///
/// Only runs of three or more equal bytes become run packets.
fn rle_plane(comp: &[u8], out: &mut Vec<u8>) {
    let width = comp.len();
    let mut x = 0;

    while x < width {
        // Start of the next run of three
        let mut r = x;
        while r + 2 < width && !(comp[r] == comp[r + 1] && comp[r] == comp[r + 2]) {
            r += 1;
        }
        let has_run = r + 2 < width;
        if !has_run {
            r = width;
        }

        while x < r {
            let len = (r - x).min(MAX_DUMP);
            out.push(len as u8);
            out.extend_from_slice(&comp[x..x + len]);
            x += len;
        }

        if has_run {
            while r < width && comp[r] == comp[x] {
                r += 1;
            }
            while x < r {
                let len = (r - x).min(MAX_RUN);
                out.push(128 + len as u8);
                out.push(comp[x]);
                x += len;
            }
        }
    }
}
