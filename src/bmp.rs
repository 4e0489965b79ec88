//! 24-bit BMP writer.
//!
//! Output is an uncompressed BITMAPINFOHEADER file. Gray input is expanded
//! to three channels; RGBA input is blended onto magenta because the
//! format carries no alpha.

use std::path::Path;

use crate::config::EncodeConfig;
use crate::error::{Error, Result};
use crate::pixels::PixelView;
use crate::rows::{write_rows, PixelLayout};
use crate::sink::{FileSink, Sink};

/// Largest width or height the signed header fields can hold.
pub const MAX_DIMENSION: u32 = i32::MAX as u32;

/// Combined size of the file header and the info header.
const HEADER_SIZE: u32 = 14 + 40;

const LAYOUT: PixelLayout = PixelLayout {
    expand_mono: true,
    write_alpha: false,
};

/// Encode tightly packed 8-bit pixels as BMP.
pub fn encode(data: &[u8], width: u32, height: u32, channels: u8) -> Result<Vec<u8>> {
    let view = PixelView::new(data, width, height, channels)?;
    encode_with_config(&view, &EncodeConfig::default())
}

/// Encode a pixel view to an in-memory BMP file.
pub fn encode_with_config(view: &PixelView<'_>, config: &EncodeConfig) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    encode_to_sink(&mut output, view, config)?;
    Ok(output)
}

/// Encode a pixel view, emitting the header and then one row at a time.
pub fn encode_to_sink<S: Sink + ?Sized>(
    sink: &mut S,
    view: &PixelView<'_>,
    config: &EncodeConfig,
) -> Result<()> {
    let (width, height) = (view.width(), view.height());
    let pad = row_padding(width);
    let total = file_size(width, height)?;

    sink.emit(&header(width, height, total));
    let written = write_rows(sink, view, LAYOUT, config.flip_vertically, pad);

    log::debug!(
        "bmp: {width}x{height} {:?}, {} bytes",
        view.color_type(),
        HEADER_SIZE as usize + written
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
    file_size(view.width(), view.height())?;
    let mut sink = FileSink::create(path)?;
    encode_to_sink(&mut sink, view, config)?;
    sink.finish()
}

/// Zero bytes that pad each row to a multiple of four.
fn row_padding(width: u32) -> usize {
    (4 - (width as usize * 3) % 4) % 4
}

/// Total file size, or `ImageTooLarge` when it overflows the header.
fn file_size(width: u32, height: u32) -> Result<u32> {
    let size = (width as u64 * 3 + row_padding(width) as u64)
        .checked_mul(height as u64)
        .map(|pixels| pixels + HEADER_SIZE as u64)
        .filter(|&size| size <= u32::MAX as u64);
    match size {
        Some(size) if width <= MAX_DIMENSION && height <= MAX_DIMENSION => Ok(size as u32),
        _ => Err(Error::ImageTooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        }),
    }
}

/// File header followed by the 40-byte info header.
fn header(width: u32, height: u32, file_size: u32) -> [u8; HEADER_SIZE as usize] {
    let mut h = [0u8; HEADER_SIZE as usize];
    h[0..2].copy_from_slice(b"BM");
    h[2..6].copy_from_slice(&file_size.to_le_bytes());
    // two reserved u16 fields stay 0
    h[10..14].copy_from_slice(&HEADER_SIZE.to_le_bytes());

    h[14..18].copy_from_slice(&40u32.to_le_bytes());
    h[18..22].copy_from_slice(&(width as i32).to_le_bytes());
    h[22..26].copy_from_slice(&(height as i32).to_le_bytes());
    h[26..28].copy_from_slice(&1u16.to_le_bytes()); // planes
    h[28..30].copy_from_slice(&24u16.to_le_bytes()); // bits per pixel
    // compression, image size, resolution and palette counts stay 0
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_fields() {
        let bmp = encode(&[0u8; 3 * 3 * 2], 3, 2, 3).unwrap();
        // rows are 9 bytes + 3 padding
        assert_eq!(bmp.len(), 54 + 12 * 2);
        assert_eq!(&bmp[0..2], b"BM");
        assert_eq!(u32::from_le_bytes(bmp[2..6].try_into().unwrap()), 78);
        assert_eq!(u32::from_le_bytes(bmp[10..14].try_into().unwrap()), 54);
        assert_eq!(u32::from_le_bytes(bmp[14..18].try_into().unwrap()), 40);
        assert_eq!(i32::from_le_bytes(bmp[18..22].try_into().unwrap()), 3);
        assert_eq!(i32::from_le_bytes(bmp[22..26].try_into().unwrap()), 2);
        assert_eq!(&bmp[26..30], &[1, 0, 24, 0]);
        assert!(bmp[30..54].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_1x1_gray() {
        let bmp = encode(&[200], 1, 1, 1).unwrap();
        assert_eq!(&bmp[54..], &[200, 200, 200, 0]);
    }

    #[test]
    fn test_row_order_and_flip() {
        let pixels = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let view = PixelView::new(&pixels, 1, 2, 4).unwrap();
        let bottom_up = encode_with_config(&view, &EncodeConfig::default()).unwrap();
        let top_down =
            encode_with_config(&view, &EncodeConfig::default().with_flip_vertically(true)).unwrap();
        assert_eq!(&bottom_up[..54], &top_down[..54]);
        assert_eq!(&bottom_up[54..58], &top_down[58..62]);
        assert_eq!(&bottom_up[58..62], &top_down[54..58]);
    }

    #[test]
    fn test_invalid_channels_rejected() {
        assert!(matches!(
            encode(&[0; 5], 1, 1, 5),
            Err(Error::UnsupportedChannels(5))
        ));
    }

    #[test]
    fn test_file_size_limit() {
        assert_eq!(file_size(2, 2).unwrap(), 70);
        assert_eq!(file_size(1, 1).unwrap(), 58);
        // 70000 * 70000 * 3 overflows the 32-bit size field
        assert!(matches!(
            file_size(70_000, 70_000),
            Err(Error::ImageTooLarge { width: 70_000, .. })
        ));
        assert!(file_size(MAX_DIMENSION + 1, 1).is_err());
    }

    #[test]
    fn test_write_to_file() {
        let path = std::env::temp_dir().join(format!("pixwrite-bmp-{}.bmp", std::process::id()));
        let view = PixelView::new(&[9u8, 8, 7, 6, 5, 4], 2, 1, 3).unwrap();
        write_to_file(&path, &view, &EncodeConfig::default()).unwrap();
        assert_eq!(
            std::fs::read(&path).unwrap(),
            encode_with_config(&view, &EncodeConfig::default()).unwrap()
        );
        std::fs::remove_file(&path).unwrap();
    }
}
