//! Compression algorithms: LZ77 match finding, fixed-Huffman DEFLATE, and
//! the zlib/PNG checksums.

pub mod adler32;
pub mod crc32;
pub mod deflate;
pub mod huffman;
pub mod lz77;

pub use adler32::adler32;
pub use crc32::crc32;
pub use deflate::{zlib_compress, FixedHuffmanZlib, ZlibCompressor};
