//! Save functionality for trained models.
//!
//! This module serialises dictionaries and code lengths into the binary
//! formats of [`super::format`] and writes models to disk.

use super::format::{BYTE_FIELD_BITS, LENGTH_FIELD_BITS};
use crate::codec::Codec;
use lexhuff_core::{BitPacker, CodecError, Dictionary, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serialise a dictionary with per-entry code lengths.
///
/// `lengths` is indexed by dictionary id.
pub fn write_length_tagged(dictionary: &Dictionary, lengths: &[u32]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(8 + dictionary.len() * 8);
    out.extend_from_slice(&(dictionary.len() as u64).to_le_bytes());

    for (id, entry) in dictionary.iter() {
        let length = lengths.get(id as usize).copied().unwrap_or(0);
        if length == 0 {
            return Err(CodecError::Construction(format!(
                "dictionary entry {} has no code",
                id
            )));
        }
        out.push(entry_len(&entry.text)?);
        out.extend_from_slice(&entry.text);
        out.extend_from_slice(&length.to_le_bytes());
    }

    Ok(out)
}

/// Serialise a dictionary with the mined probability of every entry.
pub fn write_probability_tagged(dictionary: &Dictionary) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(dictionary.len() * 12 + 1);

    for (_, entry) in dictionary.iter() {
        out.push(entry_len(&entry.text)?);
        out.extend_from_slice(&entry.text);
        out.extend_from_slice(&entry.probability.to_le_bytes());
    }
    out.push(0);

    Ok(out)
}

/// Serialise byte code lengths (indexed by byte, 0 = escaped).
pub fn write_byte_model(max_code_length: u32, lengths: &[u32]) -> Result<Vec<u8>> {
    let header = u8::try_from(max_code_length)
        .ok()
        .filter(|&max| max > 0 && max < 1 << LENGTH_FIELD_BITS)
        .ok_or_else(|| {
            CodecError::InvalidConfig(format!(
                "maximum code length {} does not fit the byte model",
                max_code_length
            ))
        })?;

    let mut packer = BitPacker::with_capacity(1 + lengths.len() * 2);
    packer.append_byte(header);

    for (byte, &length) in lengths.iter().enumerate().take(256) {
        if length == 0 {
            continue;
        }
        if length > max_code_length {
            return Err(CodecError::CodeTooLong {
                symbol: byte as u32,
                length,
                max: max_code_length,
            });
        }
        packer.append_bits(byte as u64, BYTE_FIELD_BITS);
        packer.append_bits(u64::from(length), LENGTH_FIELD_BITS);
    }

    Ok(packer.into_bytes())
}

fn entry_len(text: &[u8]) -> Result<u8> {
    match u8::try_from(text.len()) {
        Ok(len) if len > 0 => Ok(len),
        _ => Err(CodecError::Construction(format!(
            "entry length {} cannot be persisted",
            text.len()
        ))),
    }
}

/// Model saver - writes trained codecs to disk.
pub struct ModelSaver;

impl ModelSaver {
    /// Write the model of a trained codec to `path`.
    pub fn save_to_file<C: Codec + ?Sized>(codec: &C, path: &Path) -> Result<()> {
        let model = codec.save()?;

        let file = File::create(path).map_err(|e| CodecError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(&model)
            .and_then(|_| writer.flush())
            .map_err(|e| CodecError::io(path, e))?;

        tracing::debug!(
            codec = codec.name(),
            path = %path.display(),
            bytes = model.len(),
            "saved model"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexhuff_core::DictionaryEntry;

    fn sample_dictionary() -> Dictionary {
        Dictionary::from_entries([
            DictionaryEntry::new(*b"a", 0.5),
            DictionaryEntry::new(*b"bc", 0.25),
        ])
        .unwrap()
    }

    #[test]
    fn test_length_tagged_layout() {
        let bytes = write_length_tagged(&sample_dictionary(), &[0, 1, 1]).unwrap();

        let mut expected = 2u64.to_le_bytes().to_vec();
        expected.extend_from_slice(&[1, b'a', 1, 0, 0, 0]);
        expected.extend_from_slice(&[2, b'b', b'c', 1, 0, 0, 0]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_length_tagged_requires_codes() {
        assert!(write_length_tagged(&sample_dictionary(), &[0, 1]).is_err());
    }

    #[test]
    fn test_probability_tagged_layout() {
        let bytes = write_probability_tagged(&sample_dictionary()).unwrap();

        let mut expected = vec![1, b'a'];
        expected.extend_from_slice(&0.5f64.to_le_bytes());
        expected.extend_from_slice(&[2, b'b', b'c']);
        expected.extend_from_slice(&0.25f64.to_le_bytes());
        expected.push(0);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_byte_model_layout() {
        let mut lengths = vec![0u32; 256];
        lengths[0x41] = 3;
        let bytes = write_byte_model(9, &lengths).unwrap();

        // 9, then 0x41 and 3 packed as 0100_0001 00011 plus three padding bits.
        assert_eq!(bytes, vec![9, 0b0100_0001, 0b0001_1000]);
    }

    #[test]
    fn test_byte_model_rejects_wide_lengths() {
        assert!(write_byte_model(32, &[0; 256]).is_err());
        assert!(write_byte_model(0, &[0; 256]).is_err());
    }
}
