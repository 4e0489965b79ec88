//! PNG filtering implementation.
//!
//! PNG uses filtering to improve compression by exploiting correlations
//! between adjacent pixels. Each row is predicted from its left neighbor,
//! the row above, or both, and the prediction error is stored instead of the
//! raw bytes.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{try_with_capacity, Error, Result};
use crate::pixels::PixelView;

/// Per-row prediction method. The discriminant is the tag byte written before the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FilterType {
    /// Raw bytes.
    None = 0,
    /// Difference from the left pixel.
    Sub = 1,
    /// Difference from the pixel above.
    Up = 2,
    /// Difference from the floored mean of left and above.
    Average = 3,
    /// Difference from the Paeth predictor.
    Paeth = 4,
}

impl FilterType {
    /// All filters in tag order.
    pub const ALL: [FilterType; 5] = [
        FilterType::None,
        FilterType::Sub,
        FilterType::Up,
        FilterType::Average,
        FilterType::Paeth,
    ];

    /// The tag byte that precedes a row filtered this way.
    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

/// Paeth predictor function.
///
/// Selects the value (a, b, or c) closest to p = a + b - c.
#[inline]
fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let a_i = a as i16;
    let b_i = b as i16;
    let c_i = c as i16;

    let p = a_i + b_i - c_i;
    let pa = (p - a_i).abs();
    let pb = (p - b_i).abs();
    let pc = (p - c_i).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Filtered bytes of `row` under `filter`. Neighbors left of column 0 are zero.
#[inline]
fn filtered_bytes<'r>(
    filter: FilterType,
    row: &'r [u8],
    prev_row: &'r [u8],
    bpp: usize,
) -> impl Iterator<Item = u8> + 'r {
    row.iter().enumerate().map(move |(i, &byte)| {
        let left = if i >= bpp { row[i - bpp] } else { 0 };
        let above = prev_row[i];
        let predicted = match filter {
            FilterType::None => 0,
            FilterType::Sub => left,
            FilterType::Up => above,
            FilterType::Average => ((left as u16 + above as u16) >> 1) as u8,
            FilterType::Paeth => {
                let upper_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
                paeth_predictor(left, above, upper_left)
            }
        };
        byte.wrapping_sub(predicted)
    })
}

/// Score a filtered row using sum of absolute signed values.
///
/// Lower scores typically result in better compression.
#[inline]
fn score_filter(filter: FilterType, row: &[u8], prev_row: &[u8], bpp: usize) -> u64 {
    filtered_bytes(filter, row, prev_row, bpp)
        .map(|b| (b as i8).unsigned_abs() as u64)
        .sum()
}

/// Pick the filter with the lowest score. Ties keep the lower tag.
fn choose_filter(row: &[u8], prev_row: &[u8], bpp: usize) -> FilterType {
    let mut best_filter = FilterType::None;
    let mut best_score = u64::MAX;
    for filter in FilterType::ALL {
        let score = score_filter(filter, row, prev_row, bpp);
        if score < best_score {
            best_score = score;
            best_filter = filter;
        }
    }
    best_filter
}

/// Append the tag byte and filtered bytes of one row to `out`.
///
/// `prev_row` is the row emitted before this one (all zeros for the first
/// row). With `forced` set that filter is used; otherwise every filter is
/// scored and the best one wins. Returns the filter used.
pub fn encode_row(
    row: &[u8],
    prev_row: &[u8],
    bpp: usize,
    forced: Option<FilterType>,
    out: &mut Vec<u8>,
) -> FilterType {
    debug_assert_eq!(row.len(), prev_row.len());
    let filter = forced.unwrap_or_else(|| choose_filter(row, prev_row, bpp));
    out.push(filter.tag());
    out.extend(filtered_bytes(filter, row, prev_row, bpp));
    filter
}

/// Filter every row of `view` in emission order, each prefixed by its tag byte.
///
/// Rows are emitted bottom to top when `flip` is set; the prediction source
/// is always the previously emitted row.
pub fn filter_image(
    view: &PixelView<'_>,
    flip: bool,
    forced: Option<FilterType>,
) -> Result<Vec<u8>> {
    let row_len = view.row_len();
    let bpp = view.channels();
    let total = (row_len + 1)
        .checked_mul(view.height() as usize)
        .ok_or(Error::AllocationFailed(usize::MAX))?;

    let mut zero_row = try_with_capacity(row_len)?;
    zero_row.resize(row_len, 0u8);

    #[cfg(feature = "parallel")]
    {
        if forced.is_none() && view.height() > 32 {
            return filter_image_parallel(view, flip, &zero_row, total);
        }
    }

    let mut out = try_with_capacity(total)?;
    let mut prev_row: &[u8] = &zero_row;
    for (i, row) in view.rows(flip).enumerate() {
        let filter = encode_row(row, prev_row, bpp, forced, &mut out);
        log::trace!("png row {i}: {filter:?}");
        prev_row = row;
    }
    Ok(out)
}

/// Rows are independent once the source prior row is known, so they can be
/// filtered concurrently into disjoint output slices.
#[cfg(feature = "parallel")]
fn filter_image_parallel(
    view: &PixelView<'_>,
    flip: bool,
    zero_row: &[u8],
    total: usize,
) -> Result<Vec<u8>> {
    let height = view.height();
    let bpp = view.channels();
    let source_y = |i: u32| if flip { height - 1 - i } else { i };

    let mut out = try_with_capacity(total)?;
    out.resize(total, 0u8);

    out.par_chunks_mut(view.row_len() + 1)
        .enumerate()
        .for_each(|(i, out_row)| {
            let i = i as u32;
            let row = view.row(source_y(i));
            let prev = if i == 0 {
                zero_row
            } else {
                view.row(source_y(i - 1))
            };
            let filter = choose_filter(row, prev, bpp);
            out_row[0] = filter.tag();
            for (dst, byte) in out_row[1..]
                .iter_mut()
                .zip(filtered_bytes(filter, row, prev, bpp))
            {
                *dst = byte;
            }
        });

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reverse the filtering of one row (what a decoder does).
    fn unfilter_row(tag: u8, filtered: &[u8], prev: &[u8], bpp: usize) -> Vec<u8> {
        let mut out = vec![0u8; filtered.len()];
        for i in 0..filtered.len() {
            let left = if i >= bpp { out[i - bpp] } else { 0 };
            let above = prev[i];
            let upper_left = if i >= bpp { prev[i - bpp] } else { 0 };
            let predicted = match tag {
                0 => 0,
                1 => left,
                2 => above,
                3 => ((left as u16 + above as u16) / 2) as u8,
                4 => paeth_predictor(left, above, upper_left),
                _ => panic!("bad tag {tag}"),
            };
            out[i] = filtered[i].wrapping_add(predicted);
        }
        out
    }

    fn unfilter_image(filtered: &[u8], row_len: usize, bpp: usize) -> Vec<Vec<u8>> {
        let mut rows: Vec<Vec<u8>> = Vec::new();
        for chunk in filtered.chunks(row_len + 1) {
            let zero = vec![0u8; row_len];
            let prev = rows.last().unwrap_or(&zero).clone();
            rows.push(unfilter_row(chunk[0], &chunk[1..], &prev, bpp));
        }
        rows
    }

    #[test]
    fn test_paeth_predictor() {
        // When all are equal, should return that value
        assert_eq!(paeth_predictor(100, 100, 100), 100);

        // When a=0, b=0, c=0, should return 0
        assert_eq!(paeth_predictor(0, 0, 0), 0);

        // p = 10 + 20 - 15 = 15; pc = 0 is smallest, so return c
        assert_eq!(paeth_predictor(10, 20, 15), 15);

        // With no row above Paeth reduces to the left neighbor
        assert_eq!(paeth_predictor(77, 0, 0), 77);
    }

    #[test]
    fn test_filter_sub() {
        let row = [10, 20, 30, 40, 50, 60];
        let zero = [0u8; 6];
        let out: Vec<u8> = filtered_bytes(FilterType::Sub, &row, &zero, 3).collect();
        assert_eq!(out, vec![10, 20, 30, 30, 30, 30]);
    }

    #[test]
    fn test_filter_up() {
        let row = [50, 60, 70];
        let prev = [10, 20, 30];
        let out: Vec<u8> = filtered_bytes(FilterType::Up, &row, &prev, 1).collect();
        assert_eq!(out, vec![40, 40, 40]);
    }

    #[test]
    fn test_filter_average_floors() {
        let row = [10, 10];
        let prev = [5, 4];
        let out: Vec<u8> = filtered_bytes(FilterType::Average, &row, &prev, 1).collect();
        // (0 + 5) >> 1 = 2, (10 + 4) >> 1 = 7
        assert_eq!(out, vec![8, 3]);
    }

    #[test]
    fn test_score_uses_signed_magnitude() {
        let zero = [0u8; 3];
        // 0xFF is -1, 0x80 is -128
        assert_eq!(score_filter(FilterType::None, &[0xFF, 0x80, 0x01], &zero, 1), 130);
    }

    #[test]
    fn test_tie_goes_to_lowest_tag() {
        let row = [0u8; 12];
        let zero = [0u8; 12];
        let mut out = Vec::new();
        assert_eq!(encode_row(&row, &zero, 3, None, &mut out), FilterType::None);
        assert_eq!(out, vec![0u8; 13]);
    }

    #[test]
    fn test_first_row_gradient_prefers_sub() {
        let row: Vec<u8> = (0..16).map(|i| 100 + i * 3).collect();
        let zero = vec![0u8; 16];
        let mut out = Vec::new();
        assert_eq!(encode_row(&row, &zero, 1, None, &mut out), FilterType::Sub);
        assert_eq!(out[0], 1);
        assert_eq!(out[1], 100);
        assert!(out[2..].iter().all(|&b| b == 3));
    }

    #[test]
    fn test_repeated_row_prefers_up() {
        let row: Vec<u8> = (0..16).map(|i| (i * 37 % 251) as u8).collect();
        let mut out = Vec::new();
        assert_eq!(encode_row(&row, &row, 1, None, &mut out), FilterType::Up);
        assert!(out[1..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_forced_filter_used_for_every_row() {
        let data: Vec<u8> = (0..24).collect();
        let view = PixelView::new(&data, 4, 2, 3).unwrap();
        let filtered = filter_image(&view, false, Some(FilterType::Paeth)).unwrap();
        assert_eq!(filtered.len(), 2 * 13);
        assert_eq!(filtered[0], 4);
        assert_eq!(filtered[13], 4);
    }

    #[test]
    fn test_all_filters_invert() {
        let data: Vec<u8> = (0..4 * 5 * 4).map(|i| ((i * 53) ^ (i >> 2)) as u8).collect();
        let view = PixelView::new(&data, 5, 4, 4).unwrap();
        for filter in FilterType::ALL.map(Some).into_iter().chain([None]) {
            let filtered = filter_image(&view, false, filter).unwrap();
            let rows = unfilter_image(&filtered, 20, 4);
            assert_eq!(rows.concat(), data, "filter={filter:?}");
        }
    }

    #[test]
    fn test_flip_predicts_from_previously_emitted_row() {
        let data: Vec<u8> = vec![1, 2, 3, 10, 20, 30, 100, 200, 250];
        let view = PixelView::new(&data, 3, 3, 1).unwrap();
        let filtered = filter_image(&view, true, Some(FilterType::Up)).unwrap();

        // Emitted order is rows 2, 1, 0
        assert_eq!(&filtered[0..4], &[2, 100, 200, 250]);
        assert_eq!(&filtered[4..8], &[2, 166, 76, 36]);
        assert_eq!(&filtered[8..12], &[2, 247, 238, 229]);

        let rows = unfilter_image(&filtered, 3, 1);
        assert_eq!(rows, vec![vec![100, 200, 250], vec![10, 20, 30], vec![1, 2, 3]]);
    }

    #[test]
    fn test_strided_view_ignores_padding() {
        let data = [5u8, 6, 0xEE, 7, 8];
        let view = PixelView::with_stride(&data, 2, 2, 1, 3).unwrap();
        let filtered = filter_image(&view, false, Some(FilterType::None)).unwrap();
        assert_eq!(filtered, vec![0, 5, 6, 0, 7, 8]);
    }

    #[test]
    fn test_auto_matches_row_by_row_encoding() {
        // Tall enough to take the parallel path when that feature is on
        let width = 13usize;
        let height = 70usize;
        let data: Vec<u8> = (0..width * height * 3)
            .map(|i| ((i * 7) ^ (i / 40)) as u8)
            .collect();
        let view = PixelView::new(&data, width as u32, height as u32, 3).unwrap();

        for flip in [false, true] {
            let mut expected = Vec::new();
            let zero = vec![0u8; width * 3];
            let mut prev: &[u8] = &zero;
            for row in view.rows(flip) {
                encode_row(row, prev, 3, None, &mut expected);
                prev = row;
            }
            assert_eq!(filter_image(&view, flip, None).unwrap(), expected);
        }
    }
}
