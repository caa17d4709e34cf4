//! Bit-level packing and reading, most significant bit first.
//!
//! Codes are appended to a [`BitPacker`] without materialising one boolean per
//! bit. Encoded streams carry a one-byte trailer with the number of padding
//! bits in the final payload byte so that [`BitReader::framed`] can stop at
//! exactly the last written bit.

use crate::error::{CodecError, Result};

/// A prefix code: `len` bits right-aligned in `bits`, emitted MSB first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Code {
    /// The code bits (right-aligned).
    pub bits: u64,
    /// Number of bits in the code.
    pub len: u8,
}

impl Code {
    /// Longest code representable.
    pub const MAX_LEN: u8 = 64;

    /// Create a code from right-aligned bits.
    #[inline]
    pub fn new(bits: u64, len: u8) -> Self {
        debug_assert!(len <= Self::MAX_LEN);
        Self { bits, len }
    }

    /// Whether this is the zero-length (absent) code.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The `i`-th bit counting from the most significant end.
    #[inline]
    pub fn bit(&self, i: u8) -> bool {
        debug_assert!(i < self.len);
        (self.bits >> (self.len - 1 - i)) & 1 == 1
    }

    /// Whether `self` is a (non-strict) bit prefix of `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        if self.len > other.len {
            return false;
        }
        let shift = u32::from(other.len - self.len);
        other.bits.checked_shr(shift).unwrap_or(0) == self.bits
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.len {
            f.write_str(if self.bit(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Appends bits and bytes to a growing buffer, MSB first.
#[derive(Debug, Clone, Default)]
pub struct BitPacker {
    buffer: Vec<u8>,
    /// Unused low bits of the trailing byte (0..=7).
    unused_bits: u8,
}

impl BitPacker {
    /// Create an empty packer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty packer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            unused_bits: 0,
        }
    }

    /// Append a single bit.
    #[inline]
    pub fn append_bit(&mut self, bit: bool) {
        if self.unused_bits > 0 {
            if bit {
                if let Some(last) = self.buffer.last_mut() {
                    *last |= 1 << (self.unused_bits - 1);
                }
            }
            self.unused_bits -= 1;
        } else {
            self.buffer.push(if bit { 0x80 } else { 0 });
            self.unused_bits = 7;
        }
    }

    /// Append the low `len` bits of `bits`, most significant first.
    ///
    /// Whole bytes are copied directly once the buffer is byte aligned; the
    /// output is identical to appending the bits one at a time.
    pub fn append_bits(&mut self, bits: u64, len: u8) {
        debug_assert!(len <= Code::MAX_LEN);
        let mut remaining = len;

        while self.unused_bits > 0 && remaining > 0 {
            remaining -= 1;
            self.append_bit((bits >> remaining) & 1 == 1);
        }

        while remaining >= 8 {
            remaining -= 8;
            self.buffer.push((bits >> remaining) as u8);
        }

        while remaining > 0 {
            remaining -= 1;
            self.append_bit((bits >> remaining) & 1 == 1);
        }
    }

    /// Append a prefix code.
    #[inline]
    pub fn append_code(&mut self, code: Code) {
        self.append_bits(code.bits, code.len);
    }

    /// Append a raw byte across the current alignment.
    pub fn append_byte(&mut self, byte: u8) {
        match self.buffer.last_mut() {
            Some(last) if self.unused_bits > 0 => {
                *last |= byte >> (8 - self.unused_bits);
                self.buffer.push(byte << self.unused_bits);
            }
            _ => self.buffer.push(byte),
        }
    }

    /// Number of unused low bits in the trailing byte.
    #[inline]
    pub fn unused_bits(&self) -> u8 {
        self.unused_bits
    }

    /// Number of bits written so far.
    pub fn bit_len(&self) -> usize {
        self.buffer.len() * 8 - self.unused_bits as usize
    }

    /// Number of bytes in the buffer, including a partial trailing byte.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Copy of the buffer; the trailing partial byte is zero padded.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer.clone()
    }

    /// Consume the packer and return the zero-padded buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Consume the packer and return the buffer followed by a trailer byte
    /// holding the number of padding bits.
    pub fn into_framed(self) -> Vec<u8> {
        let unused = self.unused_bits;
        let mut bytes = self.buffer;
        bytes.push(unused);
        bytes
    }
}

/// Reads bits MSB first from a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Next bit to read.
    pos: usize,
    /// One past the last readable bit.
    end: usize,
}

impl<'a> BitReader<'a> {
    /// Read every bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            end: data.len() * 8,
        }
    }

    /// Read a stream produced by [`BitPacker::into_framed`].
    ///
    /// An empty slice is accepted as an empty stream.
    pub fn framed(data: &'a [u8]) -> Result<Self> {
        let Some((&padding, payload)) = data.split_last() else {
            return Ok(Self::new(data));
        };

        if padding > 7 {
            return Err(CodecError::MalformedStream(format!(
                "padding trailer {} is larger than 7",
                padding
            )));
        }
        if payload.is_empty() && padding != 0 {
            return Err(CodecError::MalformedStream(
                "padding trailer without payload".to_string(),
            ));
        }
        if let Some(&last) = payload.last() {
            let mask = ((1u16 << padding) - 1) as u8;
            if last & mask != 0 {
                return Err(CodecError::MalformedStream(
                    "non-zero padding bits".to_string(),
                ));
            }
        }

        Ok(Self {
            data: payload,
            pos: 0,
            end: payload.len() * 8 - padding as usize,
        })
    }

    /// Read one bit, or `None` once the stream is exhausted.
    #[inline]
    pub fn read_bit(&mut self) -> Option<bool> {
        if self.pos >= self.end {
            return None;
        }
        let byte = self.data[self.pos / 8];
        let bit = (byte >> (7 - (self.pos % 8))) & 1 == 1;
        self.pos += 1;
        Some(bit)
    }

    /// Read `n` bits (at most 64) MSB first.
    pub fn read_bits(&mut self, n: u8) -> Option<u64> {
        debug_assert!(n <= 64);
        if self.remaining() < n as usize {
            return None;
        }
        let mut value = 0u64;
        for _ in 0..n {
            value = (value << 1) | u64::from(self.read_bit()?);
        }
        Some(value)
    }

    /// Read eight bits as a byte.
    #[inline]
    pub fn read_byte(&mut self) -> Option<u8> {
        self.read_bits(8).map(|v| v as u8)
    }

    /// Index of the next bit to read.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bits left.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Check if every bit has been consumed.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_bit_msb_first() {
        let mut packer = BitPacker::new();
        for bit in [true, false, true] {
            packer.append_bit(bit);
        }
        assert_eq!(packer.unused_bits(), 5);
        assert_eq!(packer.to_bytes(), vec![0b1010_0000]);
    }

    #[test]
    fn test_append_bits_matches_bit_by_bit() {
        let pieces: [(u64, u8); 5] = [
            (0b1, 1),
            (0xABCD, 16),
            (0b101, 3),
            (0x7F, 7),
            (0x12_3456_789A, 40),
        ];

        let mut fast = BitPacker::new();
        let mut slow = BitPacker::new();
        for (bits, len) in pieces {
            fast.append_bits(bits, len);
            for i in (0..len).rev() {
                slow.append_bit((bits >> i) & 1 == 1);
            }
        }

        assert_eq!(fast.to_bytes(), slow.to_bytes());
        assert_eq!(fast.unused_bits(), slow.unused_bits());
        assert_eq!(fast.bit_len(), 67);
    }

    #[test]
    fn test_append_byte_unaligned() {
        let mut packer = BitPacker::new();
        packer.append_bits(0b101, 3);
        packer.append_byte(0xFF);
        assert_eq!(packer.to_bytes(), vec![0b1011_1111, 0b1110_0000]);
        assert_eq!(packer.unused_bits(), 5);
    }

    #[test]
    fn test_append_byte_aligned() {
        let mut packer = BitPacker::new();
        packer.append_byte(0x5A);
        assert_eq!(packer.to_bytes(), vec![0x5A]);
        assert_eq!(packer.unused_bits(), 0);
    }

    #[test]
    fn test_framed_roundtrip() {
        let mut packer = BitPacker::new();
        packer.append_bits(0b11011, 5);
        packer.append_byte(0x81);
        let framed = packer.into_framed();
        assert_eq!(framed.last(), Some(&3));

        let mut reader = BitReader::framed(&framed).unwrap();
        assert_eq!(reader.remaining(), 13);
        assert_eq!(reader.read_bits(5), Some(0b11011));
        assert_eq!(reader.read_byte(), Some(0x81));
        assert!(reader.is_exhausted());
        assert_eq!(reader.read_bit(), None);
    }

    #[test]
    fn test_framed_empty() {
        let framed = BitPacker::new().into_framed();
        assert_eq!(framed, vec![0]);
        assert!(BitReader::framed(&framed).unwrap().is_exhausted());
        assert!(BitReader::framed(&[]).unwrap().is_exhausted());
    }

    #[test]
    fn test_framed_rejects_bad_trailer() {
        assert!(matches!(
            BitReader::framed(&[0xFF, 8]),
            Err(CodecError::MalformedStream(_))
        ));
        assert!(matches!(
            BitReader::framed(&[3]),
            Err(CodecError::MalformedStream(_))
        ));
        // Low bit set inside the declared padding.
        assert!(matches!(
            BitReader::framed(&[0b1000_0001, 1]),
            Err(CodecError::MalformedStream(_))
        ));
    }

    #[test]
    fn test_code_prefix() {
        let short = Code::new(0b10, 2);
        let long = Code::new(0b1011, 4);
        let other = Code::new(0b1111, 4);
        assert!(short.is_prefix_of(&long));
        assert!(!short.is_prefix_of(&other));
        assert!(!long.is_prefix_of(&short));
        assert_eq!(long.to_string(), "1011");
    }
}
