//! PNG encoder implementation.
//!
//! Writes 8-bit gray, gray+alpha, RGB and RGBA images as a signature, an
//! IHDR chunk, a single IDAT chunk and IEND. The whole file is assembled in
//! memory, then handed to the sink in one piece.

pub mod chunk;
pub mod filter;

use std::path::Path;

use crate::config::EncodeConfig;
use crate::error::{try_with_capacity, Error, Result};
use crate::pixels::PixelView;
use crate::sink::{FileSink, Sink};

pub use filter::FilterType;

/// PNG file signature (magic bytes).
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Largest width or height IHDR can hold.
pub const MAX_DIMENSION: u32 = (1 << 31) - 1;

/// Encode tightly packed 8-bit pixels as PNG with default settings.
///
/// # Arguments
/// * `data` - Raw pixel data (row-major order, top row first)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `channels` - 1 (gray), 2 (gray+alpha), 3 (RGB) or 4 (RGBA)
///
/// # Returns
/// Complete PNG file as bytes.
pub fn encode(data: &[u8], width: u32, height: u32, channels: u8) -> Result<Vec<u8>> {
    encode_with_stride(data, width, height, channels, 0)
}

/// Like [`encode`], with rows `stride` bytes apart (0 = tightly packed).
pub fn encode_with_stride(
    data: &[u8],
    width: u32,
    height: u32,
    channels: u8,
    stride: usize,
) -> Result<Vec<u8>> {
    let view = PixelView::with_stride(data, width, height, channels, stride)?;
    encode_with_config(&view, &EncodeConfig::default())
}

/// Encode a pixel view as a complete in-memory PNG file.
pub fn encode_with_config(view: &PixelView<'_>, config: &EncodeConfig) -> Result<Vec<u8>> {
    let (width, height) = (view.width(), view.height());
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(Error::ImageTooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }

    let filtered = filter::filter_image(view, config.flip_vertically, config.png_filter)?;
    let compressed = config.compress_zlib(&filtered)?;
    check_idat_len(compressed.len(), width, height)?;

    let mut output = try_with_capacity(PNG_SIGNATURE.len() + 3 * 12 + 13 + compressed.len())?;
    output.extend_from_slice(&PNG_SIGNATURE);
    write_ihdr(&mut output, view)?;
    chunk::write_chunk(&mut output, b"IDAT", &compressed)?;
    chunk::write_chunk(&mut output, b"IEND", &[])?;

    log::debug!(
        "png: {width}x{height} {:?}, {} filtered bytes -> {} byte IDAT, {} bytes total",
        view.color_type(),
        filtered.len(),
        compressed.len(),
        output.len()
    );
    Ok(output)
}

/// Encode a pixel view and emit the finished file to `sink`.
///
/// Nothing reaches the sink unless encoding succeeds.
pub fn encode_to_sink<S: Sink + ?Sized>(
    sink: &mut S,
    view: &PixelView<'_>,
    config: &EncodeConfig,
) -> Result<()> {
    let png = encode_with_config(view, config)?;
    sink.emit(&png);
    Ok(())
}

/// Encode a pixel view and write it to `path`.
///
/// The file is only created once encoding has succeeded.
pub fn write_to_file(
    path: impl AsRef<Path>,
    view: &PixelView<'_>,
    config: &EncodeConfig,
) -> Result<()> {
    let png = encode_with_config(view, config)?;
    let mut sink = FileSink::create(path)?;
    sink.emit(&png);
    sink.finish()
}

/// A single IDAT must fit the chunk length field.
fn check_idat_len(len: usize, width: u32, height: u32) -> Result<()> {
    if len > chunk::MAX_CHUNK_LEN {
        return Err(Error::ImageTooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }
    Ok(())
}

/// Write IHDR (image header) chunk.
fn write_ihdr(output: &mut Vec<u8>, view: &PixelView<'_>) -> Result<()> {
    let mut ihdr_data = [0u8; 13];
    ihdr_data[0..4].copy_from_slice(&view.width().to_be_bytes());
    ihdr_data[4..8].copy_from_slice(&view.height().to_be_bytes());
    ihdr_data[8] = 8; // bit depth
    ihdr_data[9] = view.color_type().png_color_type();
    // compression, filter method and interlace stay 0
    chunk::write_chunk(output, b"IHDR", &ihdr_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::crc32::crc32;

    /// Split a PNG into (tag, payload) pairs, checking lengths and CRCs.
    fn chunks(png: &[u8]) -> Vec<([u8; 4], Vec<u8>)> {
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
        let mut pos = 8;
        let mut out = Vec::new();
        while pos < png.len() {
            let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
            let tag: [u8; 4] = png[pos + 4..pos + 8].try_into().unwrap();
            let payload = png[pos + 8..pos + 8 + len].to_vec();
            let crc = u32::from_be_bytes(png[pos + 8 + len..pos + 12 + len].try_into().unwrap());
            assert_eq!(crc, crc32(&png[pos + 4..pos + 8 + len]));
            out.push((tag, payload));
            pos += 12 + len;
        }
        out
    }

    #[test]
    fn test_encode_1x1_rgb() {
        let png = encode(&[255, 0, 0], 1, 1, 3).unwrap();
        let chunks = chunks(&png);
        let tags: Vec<&[u8; 4]> = chunks.iter().map(|(t, _)| t).collect();
        assert_eq!(tags, vec![b"IHDR", b"IDAT", b"IEND"]);
        assert_eq!(
            chunks[0].1,
            vec![0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0]
        );
        assert!(chunks[2].1.is_empty());
    }

    #[test]
    fn test_color_types_in_ihdr() {
        for (channels, expected) in [(1u8, 0u8), (2, 4), (3, 2), (4, 6)] {
            let pixels = vec![7u8; channels as usize * 4];
            let png = encode(&pixels, 2, 2, channels).unwrap();
            assert_eq!(png[25], expected, "channels={channels}");
        }
    }

    #[test]
    fn test_idat_holds_zlib_of_filtered_rows() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let pixels = [10u8, 20, 30, 40];
        let config = EncodeConfig::default().with_png_filter(FilterType::None);
        let view = PixelView::new(&pixels, 2, 2, 1).unwrap();
        let png = encode_with_config(&view, &config).unwrap();

        let idat = &chunks(&png)[1].1;
        assert_eq!(&idat[0..2], &[0x78, 0x5E]);
        let mut raw = Vec::new();
        ZlibDecoder::new(&idat[..]).read_to_end(&mut raw).unwrap();
        assert_eq!(raw, vec![0, 10, 20, 0, 30, 40]);
    }

    #[test]
    fn test_idat_length_limit() {
        assert!(check_idat_len(0, 1, 1).is_ok());
        assert!(check_idat_len(chunk::MAX_CHUNK_LEN, 1, 1).is_ok());
        assert!(matches!(
            check_idat_len(chunk::MAX_CHUNK_LEN + 1, 40_000, 30_000),
            Err(Error::ImageTooLarge {
                width: 40_000,
                height: 30_000,
                ..
            })
        ));
    }

    #[test]
    fn test_encode_invalid_dimensions() {
        let result = encode(&[255, 0, 0], 0, 1, 3);
        assert!(matches!(result, Err(Error::InvalidDimensions { .. })));
    }

    #[test]
    fn test_encode_invalid_data_length() {
        let result = encode(&[255, 0], 1, 1, 3);
        assert!(matches!(result, Err(Error::InvalidDataLength { .. })));
    }

    #[test]
    fn test_encode_invalid_channels() {
        let result = encode(&[0; 16], 1, 1, 5);
        assert!(matches!(result, Err(Error::UnsupportedChannels(5))));
    }

    #[test]
    fn test_failed_encode_leaves_sink_untouched() {
        let config = EncodeConfig::default().with_zlib(|_: &[u8], _: u32| -> Result<Vec<u8>> {
            Err(Error::Compression("no".into()))
        });
        let view = PixelView::new(&[1u8, 2, 3], 1, 1, 3).unwrap();
        let mut sink = Vec::new();
        let result = encode_to_sink(&mut sink, &view, &config);
        assert!(matches!(result, Err(Error::Compression(_))));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_sink_receives_same_bytes() {
        let pixels: Vec<u8> = (0..48).collect();
        let view = PixelView::new(&pixels, 4, 4, 3).unwrap();
        let config = EncodeConfig::default();
        let mut sink = Vec::new();
        encode_to_sink(&mut sink, &view, &config).unwrap();
        assert_eq!(sink, encode_with_config(&view, &config).unwrap());
    }

    #[test]
    fn test_forced_filter_is_deterministic() {
        let pixels: Vec<u8> = (0..300u32).map(|i| (i * 31 % 256) as u8).collect();
        let view = PixelView::new(&pixels, 10, 10, 3).unwrap();
        let config = EncodeConfig::default().with_png_filter(FilterType::Average);
        assert_eq!(
            encode_with_config(&view, &config).unwrap(),
            encode_with_config(&view, &config).unwrap()
        );
    }

    #[test]
    fn test_stride_matches_packed_copy() {
        // 2x2 RGB inside a 4-pixel-wide buffer
        let buffer: Vec<u8> = (0..24).collect();
        let packed = [0u8, 1, 2, 3, 4, 5, 12, 13, 14, 15, 16, 17];
        assert_eq!(
            encode_with_stride(&buffer, 2, 2, 3, 12).unwrap(),
            encode(&packed, 2, 2, 3).unwrap()
        );
    }

    #[test]
    fn test_write_to_file() {
        let path = std::env::temp_dir().join(format!("pixwrite-png-{}.png", std::process::id()));
        let view = PixelView::new(&[9u8, 8, 7, 6], 2, 2, 1).unwrap();
        write_to_file(&path, &view, &EncodeConfig::default()).unwrap();
        assert_eq!(
            std::fs::read(&path).unwrap(),
            encode_with_config(&view, &EncodeConfig::default()).unwrap()
        );
        std::fs::remove_file(&path).unwrap();
    }
}
