//! Byte-level Huffman codec with an escape code.
//!
//! Bytes seen during training get a canonical code of at most
//! `max_code_length` bits. Every other byte is written as the escape code
//! followed by the eight raw bits of the byte.

use super::{read_json_config, Codec, ModelStats};
use crate::io;
use lexhuff_core::{
    code_lengths_from_weights, BitPacker, BitReader, CodeTree, CodecError, Result, Symbol, ROOT,
};
use lexhuff_training::ByteCounter;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest code the byte model can persist.
pub const MAX_BYTE_CODE_LENGTH: u32 = 31;

/// Training records a byte codec asks for.
pub const DEFAULT_SAMPLE_SIZE: usize = 100_000;

/// Configuration for a [`ByteCodec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ByteCodecConfig {
    /// Length of the escape code and upper bound for every other code
    pub max_code_length: u32,
    /// Count byte frequencies with rayon
    pub parallel: bool,
}

impl Default for ByteCodecConfig {
    fn default() -> Self {
        Self {
            max_code_length: 9,
            parallel: true,
        }
    }
}

impl ByteCodecConfig {
    /// Check that the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_code_length == 0 || self.max_code_length > MAX_BYTE_CODE_LENGTH {
            return Err(CodecError::InvalidConfig(format!(
                "max_code_length must be in 1..={}, got {}",
                MAX_BYTE_CODE_LENGTH, self.max_code_length
            )));
        }
        Ok(())
    }

    /// Read a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let config: Self = read_json_config(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Fit code lengths next to an escape leaf of length `max`.
///
/// Codes longer than `max` are dropped. While the Kraft sum leaves no room for
/// the escape, the longest code below `max` is lengthened; once every code is
/// at `max`, the rarest byte is dropped instead.
fn fit_with_escape(lengths: &mut [u32], counts: &[u64; 256], max: u32) {
    for length in lengths.iter_mut() {
        if *length > max {
            *length = 0;
        }
    }

    let units = |length: u32| 1u64 << (max - length);
    let limit = 1u64 << max;
    let mut kraft: u64 = lengths
        .iter()
        .filter(|&&l| l > 0)
        .map(|&l| units(l))
        .sum();

    while kraft + 1 > limit {
        let longest_below_max = lengths
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, l)| l > 0 && l < max)
            .max_by_key(|&(_, l)| l);

        match longest_below_max {
            Some((byte, length)) => {
                kraft -= units(length);
                lengths[byte] = length + 1;
                kraft += units(length + 1);
            }
            None => {
                let rarest = lengths
                    .iter()
                    .enumerate()
                    .filter(|(_, &l)| l > 0)
                    .min_by_key(|&(byte, _)| (counts[byte], byte))
                    .map(|(byte, _)| byte);
                match rarest {
                    Some(byte) => {
                        kraft -= units(lengths[byte]);
                        lengths[byte] = 0;
                    }
                    None => break,
                }
            }
        }
    }
}

/// Codec that Huffman-codes single bytes.
pub struct ByteCodec {
    config: ByteCodecConfig,
    tree: Option<CodeTree>,
}

impl ByteCodec {
    /// Create an untrained codec.
    pub fn new(config: ByteCodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, tree: None })
    }

    /// Create an untrained codec with the given maximum code length.
    pub fn with_max_code_length(max_code_length: u32) -> Result<Self> {
        Self::new(ByteCodecConfig {
            max_code_length,
            ..Default::default()
        })
    }

    /// Codec configuration.
    pub fn config(&self) -> &ByteCodecConfig {
        &self.config
    }

    fn tree(&self) -> Result<&CodeTree> {
        self.tree.as_ref().ok_or(CodecError::NotTrained)
    }

    /// Count byte frequencies in `samples` and build the code.
    ///
    /// With no samples only the escape code exists.
    pub fn learn<S: AsRef<[u8]> + Sync>(&mut self, samples: &[S]) -> Result<()> {
        self.tree = None;

        let counter = if self.config.parallel {
            ByteCounter::count_parallel(samples)
        } else {
            ByteCounter::count_sequential(samples)
        };

        let max = self.config.max_code_length;
        let mut lengths = match counter.distinct() {
            0 => vec![0u32; 256],
            _ => code_lengths_from_weights(counter.weights(), 256)?,
        };
        fit_with_escape(&mut lengths, counter.counts(), max);

        let tree = CodeTree::from_lengths(&lengths, true, max)?;
        tracing::debug!(
            total = counter.total(),
            distinct = counter.distinct(),
            coded = tree.symbol_count(),
            max_code_length = max,
            "trained byte codec"
        );

        self.tree = Some(tree);
        Ok(())
    }

    /// Encode a record.
    pub fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let tree = self.tree()?;
        let escape = tree
            .escape_code()
            .ok_or_else(|| CodecError::Construction("byte tree has no escape".to_string()))?;
        let mut packer = BitPacker::with_capacity(raw.len());

        for &byte in raw {
            match tree.code(u32::from(byte)) {
                Some(code) => packer.append_code(code),
                None => {
                    packer.append_code(escape);
                    packer.append_byte(byte);
                }
            }
        }

        Ok(packer.into_framed())
    }

    /// Decode a stream produced by [`encode`](Self::encode).
    pub fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        let tree = self.tree()?;
        let mut reader = BitReader::framed(encoded)?;
        let mut out = Vec::with_capacity(encoded.len() * 2);

        let mut node = ROOT;
        while let Some(bit) = reader.read_bit() {
            node = tree.step(node, bit).ok_or_else(|| {
                CodecError::MalformedStream(format!(
                    "no code continues at bit {}",
                    reader.position() - 1
                ))
            })?;

            match tree.node(node).symbol {
                Symbol::Interior => continue,
                Symbol::Leaf(byte) => out.push(byte as u8),
                Symbol::Escape => {
                    let byte = reader.read_byte().ok_or_else(|| {
                        CodecError::MalformedStream("stream ends inside an escaped byte".into())
                    })?;
                    out.push(byte);
                }
            }
            node = ROOT;
        }

        if node != ROOT {
            return Err(CodecError::MalformedStream(
                "stream ends inside a code".to_string(),
            ));
        }
        Ok(out)
    }

    /// Encode many records in parallel.
    pub fn encode_batch<S: AsRef<[u8]> + Sync>(&self, records: &[S]) -> Result<Vec<Vec<u8>>> {
        records
            .par_iter()
            .map(|record| self.encode(record.as_ref()))
            .collect()
    }

    /// Decode many streams in parallel.
    pub fn decode_batch<S: AsRef<[u8]> + Sync>(&self, streams: &[S]) -> Result<Vec<Vec<u8>>> {
        streams
            .par_iter()
            .map(|stream| self.decode(stream.as_ref()))
            .collect()
    }

    /// Serialise the model.
    pub fn save(&self) -> Result<Vec<u8>> {
        let tree = self.tree()?;
        io::write_byte_model(tree.max_code_length(), &tree.code_lengths())
    }

    /// Load a saved model. The persisted maximum code length replaces the
    /// configured one.
    ///
    /// On failure the codec is left untrained.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        self.tree = None;

        let (max, lengths) = io::read_byte_model(data)?;
        let tree = CodeTree::from_lengths(&lengths, true, max).map_err(|e| match e {
            CodecError::Construction(msg) => CodecError::MalformedModel(msg),
            other => other,
        })?;

        tracing::debug!(
            coded = tree.symbol_count(),
            max_code_length = max,
            "loaded byte codec"
        );
        self.config.max_code_length = max;
        self.tree = Some(tree);
        Ok(())
    }

    /// Drop the model.
    pub fn reset(&mut self) {
        self.tree = None;
    }

    /// Whether a model is present.
    pub fn is_trained(&self) -> bool {
        self.tree.is_some()
    }

    /// The code tree of the current model.
    pub fn code_tree(&self) -> Option<&CodeTree> {
        self.tree.as_ref()
    }

    /// Summary of the current model.
    pub fn stats(&self) -> Option<ModelStats> {
        self.tree
            .as_ref()
            .map(|tree| ModelStats::from_tree(Codec::name(self), tree))
    }
}

impl Default for ByteCodec {
    fn default() -> Self {
        Self {
            config: ByteCodecConfig::default(),
            tree: None,
        }
    }
}

impl Codec for ByteCodec {
    fn name(&self) -> &'static str {
        "byte"
    }

    fn learn(&mut self, samples: &[&[u8]]) -> Result<()> {
        ByteCodec::learn(self, samples)
    }

    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        ByteCodec::encode(self, raw)
    }

    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        ByteCodec::decode(self, encoded)
    }

    fn save(&self) -> Result<Vec<u8>> {
        ByteCodec::save(self)
    }

    fn load(&mut self, model: &[u8]) -> Result<()> {
        ByteCodec::load(self, model)
    }

    fn reset(&mut self) {
        ByteCodec::reset(self)
    }

    fn is_trained(&self) -> bool {
        ByteCodec::is_trained(self)
    }

    fn stats(&self) -> Option<ModelStats> {
        ByteCodec::stats(self)
    }

    fn sample_size(&self, total_records: usize) -> usize {
        total_records.min(DEFAULT_SAMPLE_SIZE)
    }
}
