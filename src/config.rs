//! Per-call encoder settings.

use std::sync::Arc;

use crate::compress::deflate::{zlib_compress, ZlibCompressor};
use crate::error::Result;
use crate::png::filter::FilterType;

/// Default zlib quality for PNG output.
pub const DEFAULT_PNG_COMPRESSION_QUALITY: u32 = 8;

/// Settings shared by all writers.
///
/// Each encode call takes its own config; nothing is stored globally.
#[derive(Debug, Clone)]
pub struct EncodeConfig {
    /// Write rows bottom to top instead of top to bottom.
    pub flip_vertically: bool,
    /// Hash-chain quality for the built-in zlib compressor (values below 5 act as 5).
    pub png_compression_quality: u32,
    /// Force one PNG filter for every row. `None` picks the best filter per row.
    pub png_filter: Option<FilterType>,
    /// Use run-length encoded TGA image types.
    pub tga_rle: bool,
    /// Replacement zlib compressor for PNG IDAT data.
    pub zlib: Option<Arc<dyn ZlibCompressor>>,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            flip_vertically: false,
            png_compression_quality: DEFAULT_PNG_COMPRESSION_QUALITY,
            png_filter: None,
            tga_rle: true,
            zlib: None,
        }
    }
}

impl EncodeConfig {
    /// Set whether rows are written in reverse order.
    pub fn with_flip_vertically(mut self, flip: bool) -> Self {
        self.flip_vertically = flip;
        self
    }

    /// Set the PNG zlib quality.
    pub fn with_png_compression_quality(mut self, quality: u32) -> Self {
        self.png_compression_quality = quality;
        self
    }

    /// Force a PNG filter, or pass `None` for per-row selection.
    pub fn with_png_filter(mut self, filter: impl Into<Option<FilterType>>) -> Self {
        self.png_filter = filter.into();
        self
    }

    /// Enable or disable TGA run-length encoding.
    pub fn with_tga_rle(mut self, rle: bool) -> Self {
        self.tga_rle = rle;
        self
    }

    /// Use `compressor` instead of the built-in zlib compressor.
    pub fn with_zlib(mut self, compressor: impl ZlibCompressor + 'static) -> Self {
        self.zlib = Some(Arc::new(compressor));
        self
    }

    /// Compress `data` with the configured compressor.
    pub(crate) fn compress_zlib(&self, data: &[u8]) -> Result<Vec<u8>> {
        let quality = self.png_compression_quality;
        match &self.zlib {
            Some(compressor) => compressor.compress(data, quality),
            None => zlib_compress(data, quality),
        }
    }
}
