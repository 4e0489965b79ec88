//! Bit-level writers for the entropy coders.

/// A bit writer that packs bits LSB first (for DEFLATE).
///
/// Bits accumulate in a 32-bit register; whole bytes are flushed after every
/// write, so fewer than 8 bits are pending between calls.
#[derive(Debug)]
pub struct BitWriter {
    buffer: Vec<u8>,
    acc: u32,
    bits_in_acc: u8,
}

impl BitWriter {
    /// Continue writing after the bytes already in `buffer`.
    pub fn with_buffer(buffer: Vec<u8>) -> Self {
        Self {
            buffer,
            acc: 0,
            bits_in_acc: 0,
        }
    }

    /// Write the low `num_bits` bits of `value`, LSB first.
    ///
    /// At most 24 bits per call.
    #[inline]
    pub fn write_bits(&mut self, value: u32, num_bits: u8) {
        debug_assert!(num_bits <= 24);
        debug_assert!(self.bits_in_acc < 8);
        let mask = (1u32 << num_bits) - 1;
        self.acc |= (value & mask) << self.bits_in_acc;
        self.bits_in_acc += num_bits;

        while self.bits_in_acc >= 8 {
            self.buffer.push(self.acc as u8);
            self.acc >>= 8;
            self.bits_in_acc -= 8;
        }
    }

    /// Pad the pending bits with zeros up to a byte boundary.
    pub fn flush(&mut self) {
        if self.bits_in_acc > 0 {
            self.buffer.push(self.acc as u8);
            self.acc = 0;
            self.bits_in_acc = 0;
        }
    }

    /// Pad to a byte boundary and return the written bytes.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.flush();
        self.buffer
    }

    /// Returns length in bytes (not counting partial byte).
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when nothing, not even a partial byte, has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.bits_in_acc == 0
    }
}

/// A bit writer that packs bits MSB first with JPEG byte stuffing.
///
/// Uses a 24-bit register. Every 0xFF produced by [`write_bits`](Self::write_bits)
/// is followed by a stuffed 0x00; the final fill byte is not stuffed.
#[derive(Debug)]
pub struct BitWriterMsb {
    buffer: Vec<u8>,
    acc: u32,
    bits_in_acc: u8,
}

impl BitWriterMsb {
    /// Create a writer whose buffer holds `capacity` bytes before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            acc: 0,
            bits_in_acc: 0,
        }
    }

    /// Write the low `num_bits` bits of `value`, most significant first (1-16 bits).
    #[inline]
    pub fn write_bits(&mut self, value: u32, num_bits: u8) {
        debug_assert!(num_bits <= 16);
        debug_assert!(self.bits_in_acc < 8);
        let mask = (1u32 << num_bits) - 1;
        self.bits_in_acc += num_bits;
        self.acc |= (value & mask) << (24 - self.bits_in_acc);

        while self.bits_in_acc >= 8 {
            let byte = (self.acc >> 16) as u8;
            self.buffer.push(byte);
            if byte == 0xFF {
                self.buffer.push(0x00);
            }
            self.acc = (self.acc << 8) & 0x00FF_FFFF;
            self.bits_in_acc -= 8;
        }
    }

    /// Write the end-of-scan fill: seven 1-bits, then flush whole bytes.
    ///
    /// A byte completed by the fill is pushed without stuffing, since only a
    /// marker can follow it. Bits that still do not complete a byte are dropped.
    pub fn fill(&mut self) {
        self.bits_in_acc += 7;
        self.acc |= 0x7F << (24 - self.bits_in_acc);
        if self.bits_in_acc >= 8 {
            self.buffer.push((self.acc >> 16) as u8);
        }
        self.acc = 0;
        self.bits_in_acc = 0;
    }

    /// Bytes completed so far.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Drop the completed bytes, keeping the allocation.
    pub fn clear_bytes(&mut self) {
        self.buffer.clear();
    }

    /// Write the fill and return the written bytes.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.fill();
        self.buffer
    }

    /// Completed bytes held in the buffer, stuffing included.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when nothing, not even a partial byte, is pending.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.bits_in_acc == 0
    }
}
