//! Binary model formats.
//!
//! All integers are little-endian. Models carry no version tag and no
//! checksum, so the loader must be configured for the format the saver used.
//!
//! Length-tagged dictionary model:
//!
//! ```text
//! u64 entry count
//! per entry: u8 text length, text bytes, u32 code length
//! ```
//!
//! Probability-tagged dictionary model:
//!
//! ```text
//! per entry: u8 text length, text bytes, f64 probability
//! u8 0 (terminator)
//! ```
//!
//! Byte model: `u8` maximum code length followed by bit-packed 13-bit
//! records `{8-bit byte, 5-bit code length}`, MSB first, zero padded.

use lexhuff_core::{CodecError, Result};
use serde::{Deserialize, Serialize};

/// Bits holding the byte value of a byte-model record.
pub const BYTE_FIELD_BITS: u8 = 8;
/// Bits holding the code length of a byte-model record.
pub const LENGTH_FIELD_BITS: u8 = 5;
/// Size of one byte-model record.
pub const BYTE_RECORD_BITS: u8 = BYTE_FIELD_BITS + LENGTH_FIELD_BITS;

/// Persisted dictionary model variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    /// Entry count, then text and resolved code length per entry
    #[default]
    LengthTagged,
    /// Text and mined probability per entry, zero-length terminator
    ProbabilityTagged,
}

impl std::fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelFormat::LengthTagged => f.write_str("length-tagged"),
            ModelFormat::ProbabilityTagged => f.write_str("probability-tagged"),
        }
    }
}

impl std::str::FromStr for ModelFormat {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "length-tagged" | "length_tagged" | "lengths" => Ok(ModelFormat::LengthTagged),
            "probability-tagged" | "probability_tagged" | "probabilities" => {
                Ok(ModelFormat::ProbabilityTagged)
            }
            other => Err(CodecError::InvalidConfig(format!(
                "unknown model format '{}'",
                other
            ))),
        }
    }
}

/// Cursor over a model blob; running out of bytes is a malformed model.
pub(crate) struct ModelCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ModelCursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::MalformedModel(format!(
                "truncated {} at offset {}",
                what, self.pos
            )));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self, what: &str) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N, what)?);
        Ok(array)
    }

    pub(crate) fn read_u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take_array::<1>(what)?[0])
    }

    pub(crate) fn read_u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array(what)?))
    }

    pub(crate) fn read_u64(&mut self, what: &str) -> Result<u64> {
        Ok(u64::from_le_bytes(self.take_array(what)?))
    }

    pub(crate) fn read_f64(&mut self, what: &str) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take_array(what)?))
    }

    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        for format in [ModelFormat::LengthTagged, ModelFormat::ProbabilityTagged] {
            assert_eq!(format.to_string().parse::<ModelFormat>().unwrap(), format);
        }
        assert!("json".parse::<ModelFormat>().is_err());
        assert_eq!(
            serde_json::to_string(&ModelFormat::ProbabilityTagged).unwrap(),
            "\"probability_tagged\""
        );
    }

    #[test]
    fn test_cursor_reads_little_endian() {
        let mut data = vec![7u8];
        data.extend_from_slice(&0x0102_0304u32.to_le_bytes());
        data.extend_from_slice(&2.5f64.to_le_bytes());
        let mut cursor = ModelCursor::new(&data);

        assert_eq!(cursor.read_u8("tag").unwrap(), 7);
        assert_eq!(cursor.read_u32("length").unwrap(), 0x0102_0304);
        assert_eq!(cursor.read_f64("probability").unwrap(), 2.5);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_cursor_truncation() {
        let mut cursor = ModelCursor::new(&[1, 2, 3]);
        assert!(matches!(
            cursor.read_u64("count"),
            Err(CodecError::MalformedModel(_))
        ));
    }
}
