//! Load functionality for persisted models.
//!
//! Parsers in this module only validate structure. Whether the lengths form a
//! usable prefix code is decided when the codec rebuilds its tree.

use super::format::{ModelCursor, BYTE_FIELD_BITS, BYTE_RECORD_BITS, LENGTH_FIELD_BITS};
use crate::codec::Codec;
use lexhuff_core::{BitReader, CodecError, Dictionary, DictionaryEntry, Result};
use std::path::Path;

/// Smallest length-tagged record: one length byte, one text byte, four length bytes.
const MIN_LENGTH_RECORD: usize = 6;

/// A dictionary read from a length-tagged model.
#[derive(Debug, Clone)]
pub struct LengthTaggedModel {
    /// Entries in id order; probabilities are not persisted and read as 0
    pub dictionary: Dictionary,
    /// Code length per dictionary id (index 0 unused)
    pub lengths: Vec<u32>,
}

/// Parse a length-tagged dictionary model.
pub fn read_length_tagged(data: &[u8]) -> Result<LengthTaggedModel> {
    let mut cursor = ModelCursor::new(data);
    let count = cursor.read_u64("entry count")?;

    if count > (cursor.remaining() / MIN_LENGTH_RECORD) as u64 {
        return Err(CodecError::MalformedModel(format!(
            "entry count {} does not fit in {} bytes",
            count,
            cursor.remaining()
        )));
    }

    let count = count as usize;
    let mut dictionary = Dictionary::with_capacity(count);
    let mut lengths = Vec::with_capacity(count + 1);
    lengths.push(0);

    for _ in 0..count {
        let text = read_text(&mut cursor)?;
        let length = cursor.read_u32("code length")?;
        if length == 0 {
            return Err(CodecError::MalformedModel(format!(
                "entry {:?} has a zero code length",
                String::from_utf8_lossy(text)
            )));
        }
        push_entry(&mut dictionary, DictionaryEntry::new(text, 0.0))?;
        lengths.push(length);
    }

    expect_end(&cursor)?;
    Ok(LengthTaggedModel {
        dictionary,
        lengths,
    })
}

/// Parse a probability-tagged dictionary model.
pub fn read_probability_tagged(data: &[u8]) -> Result<Dictionary> {
    let mut cursor = ModelCursor::new(data);
    let mut dictionary = Dictionary::new();

    loop {
        let len = cursor.read_u8("entry length")?;
        if len == 0 {
            break;
        }
        let text = cursor.take(len as usize, "entry text")?;
        let probability = cursor.read_f64("probability")?;
        if !probability.is_finite() || probability < 0.0 {
            return Err(CodecError::MalformedModel(format!(
                "entry {:?} has probability {}",
                String::from_utf8_lossy(text),
                probability
            )));
        }
        push_entry(&mut dictionary, DictionaryEntry::new(text, probability))?;
    }

    expect_end(&cursor)?;
    Ok(dictionary)
}

/// Parse a byte model into its maximum code length and per-byte lengths.
pub fn read_byte_model(data: &[u8]) -> Result<(u32, Vec<u32>)> {
    let mut cursor = ModelCursor::new(data);
    let max_code_length = u32::from(cursor.read_u8("maximum code length")?);
    if max_code_length == 0 || max_code_length >= 1 << LENGTH_FIELD_BITS {
        return Err(CodecError::MalformedModel(format!(
            "maximum code length {} out of range",
            max_code_length
        )));
    }

    let mut reader = BitReader::new(cursor.rest());
    let mut lengths = vec![0u32; 256];

    while reader.remaining() >= BYTE_RECORD_BITS as usize {
        let (byte, length) = match (
            reader.read_bits(BYTE_FIELD_BITS),
            reader.read_bits(LENGTH_FIELD_BITS),
        ) {
            (Some(byte), Some(length)) => (byte as usize, length as u32),
            _ => break,
        };

        if length == 0 || length > max_code_length {
            return Err(CodecError::MalformedModel(format!(
                "byte 0x{:02x} has code length {} (maximum {})",
                byte, length, max_code_length
            )));
        }
        if lengths[byte] != 0 {
            return Err(CodecError::MalformedModel(format!(
                "byte 0x{:02x} is listed twice",
                byte
            )));
        }
        lengths[byte] = length;
    }

    // Whatever is left is padding: shorter than a byte and all zero.
    let remaining = reader.remaining();
    match reader.read_bits(remaining as u8) {
        Some(0) if remaining < 8 => Ok((max_code_length, lengths)),
        _ => Err(CodecError::MalformedModel(
            "truncated byte model record".to_string(),
        )),
    }
}

fn read_text<'a>(cursor: &mut ModelCursor<'a>) -> Result<&'a [u8]> {
    let len = cursor.read_u8("entry length")?;
    if len == 0 {
        return Err(CodecError::MalformedModel(format!(
            "zero-length entry at offset {}",
            cursor.position() - 1
        )));
    }
    cursor.take(len as usize, "entry text")
}

fn push_entry(dictionary: &mut Dictionary, entry: DictionaryEntry) -> Result<()> {
    dictionary
        .push(entry)
        .map(|_| ())
        .map_err(|e| CodecError::MalformedModel(e.to_string()))
}

fn expect_end(cursor: &ModelCursor<'_>) -> Result<()> {
    match cursor.remaining() {
        0 => Ok(()),
        n => Err(CodecError::MalformedModel(format!(
            "{} trailing bytes after the last entry",
            n
        ))),
    }
}

/// Model loader - reads persisted models from disk.
pub struct ModelLoader;

impl ModelLoader {
    /// Load the model at `path` into `codec`, replacing its current state.
    pub fn load_from_file<C: Codec + ?Sized>(codec: &mut C, path: &Path) -> Result<()> {
        let model = std::fs::read(path).map_err(|e| CodecError::io(path, e))?;
        codec.load(&model)?;

        tracing::debug!(
            codec = codec.name(),
            path = %path.display(),
            bytes = model.len(),
            "loaded model"
        );
        Ok(())
    }
}
