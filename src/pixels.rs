//! Borrowed, validated views of caller pixel buffers.

use crate::color::ColorType;
use crate::error::{Error, Result};

/// A read-only view of interleaved pixels.
///
/// `T` is `u8` for the 8-bit formats and `f32` for Radiance HDR. Rows are
/// `stride` elements apart; only the first `width * channels` elements of a
/// row are pixels. Every field is checked on construction, so row access
/// after that cannot go out of bounds.
#[derive(Debug)]
pub struct PixelView<'a, T = u8> {
    data: &'a [T],
    width: u32,
    height: u32,
    color_type: ColorType,
    stride: usize,
}

impl<T> Clone for PixelView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PixelView<'_, T> {}

impl<'a, T> PixelView<'a, T> {
    /// View tightly packed pixels (stride = `width * channels`).
    pub fn new(data: &'a [T], width: u32, height: u32, channels: u8) -> Result<Self> {
        Self::with_stride(data, width, height, channels, 0)
    }

    /// View pixels whose rows are `stride` elements apart.
    ///
    /// A stride of 0 means tightly packed. A larger stride lets a caller
    /// describe a sub-rectangle of a bigger buffer.
    pub fn with_stride(
        data: &'a [T],
        width: u32,
        height: u32,
        channels: u8,
        stride: usize,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let color_type = ColorType::from_channels(channels)?;

        let too_large = || Error::InvalidDataLength {
            expected: usize::MAX,
            actual: data.len(),
        };
        let row_len = (width as usize)
            .checked_mul(color_type.channels())
            .ok_or_else(too_large)?;
        let stride = if stride == 0 { row_len } else { stride };
        if stride < row_len {
            return Err(Error::InvalidStride {
                stride,
                min: row_len,
            });
        }

        let expected = (height as usize - 1)
            .checked_mul(stride)
            .and_then(|n| n.checked_add(row_len))
            .ok_or_else(too_large)?;
        if data.len() < expected {
            return Err(Error::InvalidDataLength {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
            color_type,
            stride,
        })
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channels per pixel (1-4).
    #[inline]
    pub fn channels(&self) -> usize {
        self.color_type.channels()
    }

    /// Channel layout derived from the channel count.
    #[inline]
    pub fn color_type(&self) -> ColorType {
        self.color_type
    }

    /// Distance between row starts, in elements.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Elements of pixel data in one row (`width * channels`).
    #[inline]
    pub fn row_len(&self) -> usize {
        self.width as usize * self.channels()
    }

    /// Pixel data of row `y`, top row first.
    ///
    /// # Panics
    /// Panics if `y >= height`.
    #[inline]
    pub fn row(&self, y: u32) -> &'a [T] {
        assert!(y < self.height, "row {y} out of range");
        let start = y as usize * self.stride;
        &self.data[start..start + self.row_len()]
    }

    /// The channels of the pixel at (`x`, `y`).
    ///
    /// # Panics
    /// Panics if the coordinates are outside the image.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &'a [T] {
        assert!(x < self.width, "column {x} out of range");
        let channels = self.channels();
        let start = x as usize * channels;
        &self.row(y)[start..start + channels]
    }

    /// Rows in emission order: top to bottom, or bottom to top when `reverse` is set.
    pub fn rows(&self, reverse: bool) -> impl ExactSizeIterator<Item = &'a [T]> + 'a {
        let view = *self;
        let height = self.height;
        (0..height).map(move |i| view.row(if reverse { height - 1 - i } else { i }))
    }
}
