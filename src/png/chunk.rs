//! PNG chunk handling.

use crate::compress::crc32::Crc32;
use crate::error::{try_reserve, Result};

/// Largest payload a chunk length field may declare.
pub const MAX_CHUNK_LEN: usize = i32::MAX as usize;

/// Write a PNG chunk (length, type, data, CRC32) to the output buffer.
///
/// The CRC covers the type and the data, not the length. `data` must be at
/// most [`MAX_CHUNK_LEN`] bytes.
pub fn write_chunk(output: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) -> Result<()> {
    debug_assert!(data.len() <= MAX_CHUNK_LEN);
    try_reserve(output, 12 + data.len())?;

    let mut crc = Crc32::new();
    crc.update(chunk_type);
    crc.update(data);
    let crc = crc.finalize();

    output.extend_from_slice(&(data.len() as u32).to_be_bytes());
    output.extend_from_slice(chunk_type);
    output.extend_from_slice(data);
    output.extend_from_slice(&crc.to_be_bytes());
    Ok(())
}
