//! # pixwrite
//!
//! Small, self-contained image writers.
//!
//! Every encoder is implemented in this crate, including the zlib stream
//! behind PNG (LZ77 hash chains with fixed Huffman codes) and the baseline
//! JPEG pipeline (float AAN DCT with the standard Huffman tables).
//!
//! ## Formats
//!
//! - **PNG**: 8-bit gray, gray+alpha, RGB and RGBA with adaptive row filters
//! - **JPEG**: baseline, 4:4:4, quality 1-100
//! - **BMP**: 24-bit, alpha blended onto a magenta background
//! - **TGA**: raw or run-length encoded, alpha kept
//! - **HDR**: Radiance RGBE from linear `f32` pixels
//!
//! Settings travel with each call in an [`EncodeConfig`]; there is no global
//! state. Output goes to memory, a file or any [`Sink`].
//!
//! ## Example
//!
//! ```rust
//! use pixwrite::{jpeg, png, EncodeConfig, PixelView};
//!
//! // Encode as PNG
//! let pixels: Vec<u8> = vec![255, 0, 0, 255]; // 1x1 red RGBA pixel
//! let png_data = png::encode(&pixels, 1, 1, 4).unwrap();
//! assert_eq!(&png_data[1..4], b"PNG");
//!
//! // Encode as JPEG, bottom row first
//! let rgb_pixels: Vec<u8> = vec![255, 0, 0, 0, 0, 255]; // 1x2 RGB
//! let view = PixelView::new(&rgb_pixels, 1, 2, 3).unwrap();
//! let config = EncodeConfig::default().with_flip_vertically(true);
//! let jpeg_data = jpeg::encode_with_config(&view, 85, &config).unwrap();
//! assert_eq!(&jpeg_data[..2], &[0xFF, 0xD8]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bits;
pub mod bmp;
pub mod color;
pub mod compress;
pub mod config;
pub mod error;
pub mod hdr;
pub mod jpeg;
pub mod pixels;
pub mod png;
pub mod sink;
pub mod tga;

mod rows;

pub use color::ColorType;
pub use compress::ZlibCompressor;
pub use config::EncodeConfig;
pub use error::{Error, Result};
pub use pixels::PixelView;
pub use png::FilterType;
pub use sink::{FileSink, FnSink, Sink};
