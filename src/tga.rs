//! Truevision TGA writer, raw or run-length encoded.

use std::path::Path;

use crate::config::EncodeConfig;
use crate::error::{Error, Result};
use crate::pixels::PixelView;
use crate::rows::{write_rows, PixelLayout};
use crate::sink::{FileSink, Sink};

/// Largest width or height the header can hold.
pub const MAX_DIMENSION: u32 = 65535;

/// Longest run or raw stretch one packet can describe.
const MAX_PACKET: usize = 128;

const LAYOUT: PixelLayout = PixelLayout {
    expand_mono: false,
    write_alpha: true,
};

/// Encode tightly packed 8-bit pixels as RLE TGA.
pub fn encode(data: &[u8], width: u32, height: u32, channels: u8) -> Result<Vec<u8>> {
    let view = PixelView::new(data, width, height, channels)?;
    encode_with_config(&view, &EncodeConfig::default())
}

/// Encode a pixel view to an in-memory TGA file.
pub fn encode_with_config(view: &PixelView<'_>, config: &EncodeConfig) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    encode_to_sink(&mut output, view, config)?;
    Ok(output)
}

/// Encode a pixel view, emitting the header and then one row at a time.
///
/// `config.tga_rle` selects image types 10/11 over 2/3.
pub fn encode_to_sink<S: Sink + ?Sized>(
    sink: &mut S,
    view: &PixelView<'_>,
    config: &EncodeConfig,
) -> Result<()> {
    let (width, height) = (view.width(), view.height());
    check_dimensions(width, height)?;

    let header = header(view, config.tga_rle);
    sink.emit(&header);

    let written = if config.tga_rle {
        write_rle_rows(sink, view, config.flip_vertically)
    } else {
        write_rows(sink, view, LAYOUT, config.flip_vertically, 0)
    };

    log::debug!(
        "tga: {width}x{height} {:?}, rle={}, {} bytes",
        view.color_type(),
        config.tga_rle,
        header.len() + written
    );
    Ok(())
}

/// Encode a pixel view and stream it into the file at `path`.
///
/// Images too large for the header are rejected before the file is created.
pub fn write_to_file(
    path: impl AsRef<Path>,
    view: &PixelView<'_>,
    config: &EncodeConfig,
) -> Result<()> {
    check_dimensions(view.width(), view.height())?;
    let mut sink = FileSink::create(path)?;
    encode_to_sink(&mut sink, view, config)?;
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

/// The 18-byte header: no id, no color map, origin at the bottom left.
fn header(view: &PixelView<'_>, rle: bool) -> [u8; 18] {
    let has_alpha = view.color_type().has_alpha() as u8;
    let color_bytes = view.channels() as u8 - has_alpha;
    let image_type = (if color_bytes < 2 { 3 } else { 2 }) + (if rle { 8 } else { 0 });

    let mut h = [0u8; 18];
    h[2] = image_type;
    h[12..14].copy_from_slice(&(view.width() as u16).to_le_bytes());
    h[14..16].copy_from_slice(&(view.height() as u16).to_le_bytes());
    h[16] = (color_bytes + has_alpha) * 8;
    h[17] = has_alpha * 8;
    h
}

fn write_rle_rows<S: Sink + ?Sized>(sink: &mut S, view: &PixelView<'_>, flip: bool) -> usize {
    let channels = view.channels();
    let mut line = Vec::with_capacity(view.row_len());
    let mut packed = Vec::with_capacity(view.row_len() + view.row_len() / MAX_PACKET + 1);
    let mut written = 0;

    for row in view.rows(!flip) {
        LAYOUT.convert_row(row, channels, &mut line);
        packed.clear();
        rle_compress(&line, channels, &mut packed);
        sink.emit(&packed);
        written += packed.len();
    }
    written
}

/// Pack one converted row of `bpp`-byte pixels into run and raw packets.
///
/// A raw stretch grows until a pixel matches the one two places before it;
/// the pixel between them starts the next packet.
fn rle_compress(line: &[u8], bpp: usize, out: &mut Vec<u8>) {
    let px = |i: usize| &line[i * bpp..(i + 1) * bpp];
    let count = line.len() / bpp;

    let mut i = 0;
    while i < count {
        let mut len = 1;
        let mut raw = true;

        if i + 1 < count {
            len = 2;
            raw = px(i) != px(i + 1);
            if raw {
                let mut prev = i;
                for k in i + 2..count {
                    if len >= MAX_PACKET {
                        break;
                    }
                    if px(prev) != px(k) {
                        prev += 1;
                        len += 1;
                    } else {
                        len -= 1;
                        break;
                    }
                }
            } else {
                for k in i + 2..count {
                    if len >= MAX_PACKET || px(i) != px(k) {
                        break;
                    }
                    len += 1;
                }
            }
        }

        if raw {
            out.push((len - 1) as u8);
            out.extend_from_slice(&line[i * bpp..(i + len) * bpp]);
        } else {
            out.push(0x80 | (len - 1) as u8);
            out.extend_from_slice(px(i));
        }
        i += len;
    }
}
