//! Error types for the pixwrite library.

use std::io;

use thiserror::Error;

/// Result type alias for pixwrite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encoding an image.
#[derive(Debug, Error)]
pub enum Error {
    /// Zero width or height.
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },

    /// Pixel buffer is too short for the described image.
    #[error("invalid pixel data length: expected at least {expected} elements, got {actual}")]
    InvalidDataLength {
        /// Minimum number of elements required.
        expected: usize,
        /// Number of elements provided.
        actual: usize,
    },

    /// Channel count outside 1..=4.
    #[error("unsupported channel count {0}: must be 1-4")]
    UnsupportedChannels(u8),

    /// Row stride shorter than one row of pixels.
    #[error("row stride {stride} is shorter than a row ({min} elements)")]
    InvalidStride {
        /// Stride that was supplied.
        stride: usize,
        /// Minimum stride for the image width and channel count.
        min: usize,
    },

    /// Image dimensions exceed what the target format can describe.
    #[error("image {width}x{height} exceeds maximum dimension {max}")]
    ImageTooLarge {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
        /// Maximum supported dimension.
        max: u32,
    },

    /// A scratch or output buffer could not be allocated.
    #[error("failed to allocate {0} bytes")]
    AllocationFailed(usize),

    /// A caller-supplied zlib compressor reported a failure.
    #[error("compression error: {0}")]
    Compression(String),

    /// Writing to a file-backed sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Grow `buf` by `additional` elements, reporting failure instead of aborting.
pub(crate) fn try_reserve<T>(buf: &mut Vec<T>, additional: usize) -> Result<()> {
    buf.try_reserve(additional)
        .map_err(|_| Error::AllocationFailed(additional.saturating_mul(std::mem::size_of::<T>())))
}

/// Allocate an empty vector with room for `capacity` elements.
pub(crate) fn try_with_capacity<T>(capacity: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    try_reserve(&mut buf, capacity)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::InvalidDimensions {
            width: 0,
            height: 4,
        };
        assert_eq!(err.to_string(), "invalid image dimensions: 0x4");

        let err = Error::UnsupportedChannels(5);
        assert_eq!(err.to_string(), "unsupported channel count 5: must be 1-4");
    }

    #[test]
    fn test_io_error_converts() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_try_with_capacity() {
        let buf: Vec<u8> = try_with_capacity(128).unwrap();
        assert!(buf.capacity() >= 128);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_try_reserve_overflow_reports_allocation_failure() {
        let mut buf: Vec<u64> = Vec::new();
        let result = try_reserve(&mut buf, usize::MAX / 2);
        assert!(matches!(result, Err(Error::AllocationFailed(_))));
    }
}
