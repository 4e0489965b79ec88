//! Baseline JPEG encoder.
//!
//! Always writes three YCbCr components at 4:4:4 with the standard Huffman
//! tables. Entropy-coded data is streamed to the sink as it is produced.

pub mod dct;
pub mod huffman;
pub mod quantize;

use std::path::Path;

use crate::bits::BitWriterMsb;
use crate::color::rgb_to_ycbcr;
use crate::config::EncodeConfig;
use crate::error::{Error, Result};
use crate::pixels::PixelView;
use crate::sink::{FileSink, Sink};

use dct::fdct_8x8;
use huffman::{encode_block, HuffmanTables};
use quantize::{effective_quality, quantize_block, QuantizationTables};

pub use quantize::DEFAULT_QUALITY;

/// Maximum supported image dimension for JPEG.
pub const MAX_DIMENSION: u32 = 65535;

/// Bit writer bytes held back before they are handed to the sink.
const DRAIN_THRESHOLD: usize = 4096;

/// JPEG markers.
const SOI: u16 = 0xFFD8; // Start of Image
const EOI: u16 = 0xFFD9; // End of Image
const APP0: u16 = 0xFFE0; // JFIF marker
const DQT: u16 = 0xFFDB; // Define Quantization Table
const SOF0: u16 = 0xFFC0; // Start of Frame (baseline DCT)
const DHT: u16 = 0xFFC4; // Define Huffman Table
const SOS: u16 = 0xFFDA; // Start of Scan

/// Encode tightly packed 8-bit pixels as JPEG.
///
/// # Arguments
/// * `data` - Raw pixel data (row-major order, top row first)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `channels` - 1 to 4; alpha is ignored
/// * `quality` - 1-100, or 0 for the default of 90; larger values clamp to 100
///
/// # Returns
/// Complete JPEG file as bytes.
pub fn encode(data: &[u8], width: u32, height: u32, channels: u8, quality: u8) -> Result<Vec<u8>> {
    let view = PixelView::new(data, width, height, channels)?;
    encode_with_config(&view, quality, &EncodeConfig::default())
}

/// Encode a pixel view to an in-memory JPEG file.
pub fn encode_with_config(
    view: &PixelView<'_>,
    quality: u8,
    config: &EncodeConfig,
) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    encode_to_sink(&mut output, view, quality, config)?;
    Ok(output)
}

/// Encode a pixel view, streaming the file to `sink`.
///
/// Dimensions are checked before the first byte is emitted.
pub fn encode_to_sink<S: Sink + ?Sized>(
    sink: &mut S,
    view: &PixelView<'_>,
    quality: u8,
    config: &EncodeConfig,
) -> Result<()> {
    let (width, height) = (view.width(), view.height());
    check_dimensions(width, height)?;

    let quality = effective_quality(quality);
    let quant = QuantizationTables::with_quality(quality);
    let huffman = HuffmanTables::new();

    let mut header = Vec::with_capacity(640);
    write_soi(&mut header);
    write_app0(&mut header);
    write_dqt(&mut header, &quant);
    write_sof0(&mut header, width, height);
    write_dht(&mut header);
    write_sos(&mut header);
    sink.emit(&header);

    let mut writer = BitWriterMsb::with_capacity(DRAIN_THRESHOLD + 1024);
    let mut streamed = header.len();
    let (mut dc_y, mut dc_cb, mut dc_cr) = (0i32, 0i32, 0i32);
    let mut y_block = [0.0f32; 64];
    let mut cb_block = [0.0f32; 64];
    let mut cr_block = [0.0f32; 64];

    for block_y in (0..height).step_by(8) {
        for block_x in (0..width).step_by(8) {
            extract_block(
                view,
                config.flip_vertically,
                block_x,
                block_y,
                &mut y_block,
                &mut cb_block,
                &mut cr_block,
            );

            fdct_8x8(&mut y_block);
            let q = quantize_block(&y_block, &quant.luminance_divisors);
            dc_y = encode_block(&mut writer, &q, dc_y, true, &huffman);

            fdct_8x8(&mut cb_block);
            let q = quantize_block(&cb_block, &quant.chrominance_divisors);
            dc_cb = encode_block(&mut writer, &q, dc_cb, false, &huffman);

            fdct_8x8(&mut cr_block);
            let q = quantize_block(&cr_block, &quant.chrominance_divisors);
            dc_cr = encode_block(&mut writer, &q, dc_cr, false, &huffman);

            if writer.len() >= DRAIN_THRESHOLD {
                streamed += writer.len();
                sink.emit(writer.bytes());
                writer.clear_bytes();
            }
        }
    }

    let mut tail = writer.finish();
    tail.extend_from_slice(&EOI.to_be_bytes());
    streamed += tail.len();
    sink.emit(&tail);

    log::debug!(
        "jpeg: {width}x{height} {:?}, quality {quality}, {streamed} bytes",
        view.color_type()
    );
    Ok(())
}

/// Encode a pixel view and stream it into the file at `path`.
///
/// The file is created once the dimensions are known to fit, before the
/// first block is encoded.
pub fn write_to_file(
    path: impl AsRef<Path>,
    view: &PixelView<'_>,
    quality: u8,
    config: &EncodeConfig,
) -> Result<()> {
    check_dimensions(view.width(), view.height())?;
    let mut sink = FileSink::create(path)?;
    encode_to_sink(&mut sink, view, quality, config)?;
    sink.finish()
}

/// Reject images whose dimensions do not fit the 16-bit header fields.
fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::ImageTooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }
    Ok(())
}

/// Fill Y/Cb/Cr blocks for the 8x8 tile at (`block_x`, `block_y`).
///
/// Samples past the right or bottom edge repeat the last column or row.
fn extract_block(
    view: &PixelView<'_>,
    flip: bool,
    block_x: u32,
    block_y: u32,
    y_out: &mut [f32; 64],
    cb_out: &mut [f32; 64],
    cr_out: &mut [f32; 64],
) {
    let (width, height) = (view.width(), view.height());
    let color = view.channels() > 2;

    for dy in 0..8 {
        let row = (block_y + dy).min(height - 1);
        let src_y = if flip { height - 1 - row } else { row };
        let line = view.row(src_y);

        for dx in 0..8 {
            let col = (block_x + dx).min(width - 1) as usize;
            let px = &line[col * view.channels()..];
            let r = px[0] as f32;
            let (g, b) = if color {
                (px[1] as f32, px[2] as f32)
            } else {
                (r, r)
            };

            let (y, cb, cr) = rgb_to_ycbcr(r, g, b);
            let i = (dy * 8 + dx) as usize;
            y_out[i] = y;
            cb_out[i] = cb;
            cr_out[i] = cr;
        }
    }
}

/// Write SOI (Start of Image) marker.
fn write_soi(output: &mut Vec<u8>) {
    output.extend_from_slice(&SOI.to_be_bytes());
}

/// Write APP0 (JFIF) marker.
fn write_app0(output: &mut Vec<u8>) {
    output.extend_from_slice(&APP0.to_be_bytes());
    output.extend_from_slice(&16u16.to_be_bytes());
    output.extend_from_slice(b"JFIF\0");

    // Version 1.01, no units, 1:1 density, no thumbnail
    output.extend_from_slice(&[1, 1, 0]);
    output.extend_from_slice(&1u16.to_be_bytes());
    output.extend_from_slice(&1u16.to_be_bytes());
    output.extend_from_slice(&[0, 0]);
}

/// Write both quantization tables in one DQT marker.
fn write_dqt(output: &mut Vec<u8>, tables: &QuantizationTables) {
    output.extend_from_slice(&DQT.to_be_bytes());
    output.extend_from_slice(&132u16.to_be_bytes()); // 2 + 2 * (1 + 64)
    output.push(0); // Table 0, 8-bit precision
    output.extend_from_slice(&tables.luminance);
    output.push(1);
    output.extend_from_slice(&tables.chrominance);
}

/// Write SOF0 (Start of Frame - baseline) for three 1x1-sampled components.
fn write_sof0(output: &mut Vec<u8>, width: u32, height: u32) {
    output.extend_from_slice(&SOF0.to_be_bytes());
    output.extend_from_slice(&17u16.to_be_bytes()); // 8 + 3 * 3
    output.push(8); // precision
    output.extend_from_slice(&(height as u16).to_be_bytes());
    output.extend_from_slice(&(width as u16).to_be_bytes());
    output.push(3);

    // (component id, sampling, quant table)
    for (id, table) in [(1u8, 0u8), (2, 1), (3, 1)] {
        output.extend_from_slice(&[id, 0x11, table]);
    }
}

/// Write all four standard Huffman tables in one DHT marker.
fn write_dht(output: &mut Vec<u8>) {
    use huffman::{
        AC_CHROM_BITS, AC_CHROM_VALS, AC_LUM_BITS, AC_LUM_VALS, DC_CHROM_BITS, DC_CHROM_VALS,
        DC_LUM_BITS, DC_LUM_VALS,
    };

    let tables: [(u8, &[u8; 16], &[u8]); 4] = [
        (0x00, &DC_LUM_BITS, &DC_LUM_VALS),
        (0x10, &AC_LUM_BITS, &AC_LUM_VALS),
        (0x01, &DC_CHROM_BITS, &DC_CHROM_VALS),
        (0x11, &AC_CHROM_BITS, &AC_CHROM_VALS),
    ];
    let length = 2 + tables.iter().map(|(_, _, vals)| 17 + vals.len()).sum::<usize>();

    output.extend_from_slice(&DHT.to_be_bytes());
    output.extend_from_slice(&(length as u16).to_be_bytes());
    for (class_id, bits, vals) in tables {
        output.push(class_id);
        output.extend_from_slice(bits);
        output.extend_from_slice(vals);
    }
}

/// Write SOS (Start of Scan) for the interleaved Y, Cb, Cr scan.
fn write_sos(output: &mut Vec<u8>) {
    output.extend_from_slice(&SOS.to_be_bytes());
    output.extend_from_slice(&12u16.to_be_bytes()); // 6 + 2 * 3
    output.push(3);

    // Y uses DC/AC tables 0, Cb and Cr use tables 1
    output.extend_from_slice(&[1, 0x00, 2, 0x11, 3, 0x11]);

    // Full spectral range, no successive approximation
    output.extend_from_slice(&[0, 63, 0]);
}
