//! Output sinks: where encoded bytes go.
//!
//! Writers only ever append. A sink cannot seek, so every header that
//! depends on payload size is computed before it is emitted.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Receives encoded bytes in order.
pub trait Sink {
    /// Append `bytes` to the output.
    fn emit(&mut self, bytes: &[u8]);
}

impl Sink for Vec<u8> {
    #[inline]
    fn emit(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    #[inline]
    fn emit(&mut self, bytes: &[u8]) {
        (**self).emit(bytes);
    }
}

/// Adapts a callback into a [`Sink`].
///
/// ```
/// use pixwrite::sink::{FnSink, Sink};
///
/// let mut total = 0;
/// let mut sink = FnSink(|bytes: &[u8]| total += bytes.len());
/// sink.emit(b"abc");
/// drop(sink);
/// assert_eq!(total, 3);
/// ```
#[derive(Debug)]
pub struct FnSink<F>(pub F);

impl<F: FnMut(&[u8])> Sink for FnSink<F> {
    #[inline]
    fn emit(&mut self, bytes: &[u8]) {
        (self.0)(bytes)
    }
}

/// Buffered file output.
///
/// The first write error is kept and later writes are skipped;
/// [`FileSink::finish`] reports it.
#[derive(Debug)]
pub struct FileSink {
    writer: BufWriter<File>,
    error: Option<io::Error>,
}

impl FileSink {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            error: None,
        })
    }

    /// Whether a write has failed so far.
    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Flush buffered bytes, returning the first error seen.
    pub fn finish(mut self) -> Result<()> {
        if let Some(err) = self.error.take() {
            return Err(err.into());
        }
        self.writer.flush()?;
        Ok(())
    }
}

impl Sink for FileSink {
    fn emit(&mut self, bytes: &[u8]) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.writer.write_all(bytes) {
            log::warn!("file sink write failed: {err}");
            self.error = Some(err);
        }
    }
}
