//! Channel layouts and color conversion.

use crate::error::{Error, Result};

/// Channel layout of an interleaved 8-bit or float pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorType {
    /// Grayscale, 1 channel.
    Gray = 1,
    /// Grayscale with alpha, 2 channels.
    GrayAlpha = 2,
    /// RGB, 3 channels.
    Rgb = 3,
    /// RGBA, 4 channels.
    Rgba = 4,
}

impl ColorType {
    /// Map a channel count (1-4) to its layout.
    pub fn from_channels(channels: u8) -> Result<Self> {
        match channels {
            1 => Ok(ColorType::Gray),
            2 => Ok(ColorType::GrayAlpha),
            3 => Ok(ColorType::Rgb),
            4 => Ok(ColorType::Rgba),
            other => Err(Error::UnsupportedChannels(other)),
        }
    }

    /// Number of interleaved channels.
    #[inline]
    pub const fn channels(self) -> usize {
        self as usize
    }

    /// Returns the number of bytes per pixel for 8-bit samples.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        self.channels()
    }

    /// Whether the last channel is alpha.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, ColorType::GrayAlpha | ColorType::Rgba)
    }

    /// Returns the PNG color type value.
    #[inline]
    pub(crate) const fn png_color_type(self) -> u8 {
        match self {
            ColorType::Gray => 0,
            ColorType::GrayAlpha => 4,
            ColorType::Rgb => 2,
            ColorType::Rgba => 6,
        }
    }
}

impl TryFrom<u8> for ColorType {
    type Error = Error;

    fn try_from(channels: u8) -> Result<Self> {
        ColorType::from_channels(channels)
    }
}

impl From<ColorType> for u8 {
    fn from(color: ColorType) -> Self {
        color as u8
    }
}

/// Convert RGB to level-shifted Y/Cb/Cr for JPEG.
///
/// Y is centered on zero (offset by -128); Cb and Cr are already zero-centered.
#[inline]
pub fn rgb_to_ycbcr(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let y = 0.29900 * r + 0.58700 * g + 0.11400 * b - 128.0;
    let cb = -0.16874 * r - 0.33126 * g + 0.50000 * b;
    let cr = 0.50000 * r - 0.41869 * g - 0.08131 * b;
    (y, cb, cr)
}
