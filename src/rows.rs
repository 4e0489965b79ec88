//! Row conversion shared by the BMP and TGA writers.
//!
//! Both formats store color as BGR and write rows bottom-up by default;
//! they differ in how gray and alpha are laid out.

use crate::color::ColorType;
use crate::pixels::PixelView;
use crate::sink::Sink;

/// Background that RGBA pixels are blended onto when alpha is dropped.
const BACKGROUND: [i32; 3] = [255, 0, 255];

/// Output pixel layout for one writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PixelLayout {
    /// Expand gray to three identical bytes.
    pub expand_mono: bool,
    /// Append the source alpha after the color bytes.
    pub write_alpha: bool,
}

impl PixelLayout {
    /// Bytes written per pixel for `color_type` input.
    pub fn bytes_per_pixel(&self, color_type: ColorType) -> usize {
        let color = if color_type.channels() >= 3 || self.expand_mono {
            3
        } else {
            1
        };
        color + usize::from(self.write_alpha && color_type.has_alpha())
    }

    /// Append one source pixel to `out`.
    #[inline]
    pub fn write_pixel(&self, px: &[u8], out: &mut Vec<u8>) {
        match px.len() {
            1 | 2 => {
                if self.expand_mono {
                    out.extend_from_slice(&[px[0]; 3]);
                } else {
                    out.push(px[0]);
                }
            }
            3 => out.extend_from_slice(&[px[2], px[1], px[0]]),
            _ if self.write_alpha => out.extend_from_slice(&[px[2], px[1], px[0]]),
            _ => {
                let a = i32::from(px[3]);
                let blend = |c: u8, bg: i32| (bg + ((i32::from(c) - bg) * a) / 255) as u8;
                out.extend_from_slice(&[
                    blend(px[2], BACKGROUND[2]),
                    blend(px[1], BACKGROUND[1]),
                    blend(px[0], BACKGROUND[0]),
                ]);
            }
        }
        if self.write_alpha && (px.len() == 2 || px.len() == 4) {
            out.push(px[px.len() - 1]);
        }
    }

    /// Replace `out` with the converted pixels of `row`.
    pub fn convert_row(&self, row: &[u8], channels: usize, out: &mut Vec<u8>) {
        out.clear();
        for px in row.chunks_exact(channels) {
            self.write_pixel(px, out);
        }
    }
}

/// Emit every row of `view` in stored order, each followed by `pad` zero bytes.
///
/// Rows go bottom-up unless `flip` is set. One converted row is staged at a
/// time. Returns the number of bytes emitted.
pub(crate) fn write_rows<S: Sink + ?Sized>(
    sink: &mut S,
    view: &PixelView<'_>,
    layout: PixelLayout,
    flip: bool,
    pad: usize,
) -> usize {
    let channels = view.channels();
    let mut line = Vec::with_capacity(
        view.width() as usize * layout.bytes_per_pixel(view.color_type()) + pad,
    );
    let mut written = 0;
    for row in view.rows(!flip) {
        layout.convert_row(row, channels, &mut line);
        line.resize(line.len() + pad, 0);
        sink.emit(&line);
        written += line.len();
    }
    written
}
