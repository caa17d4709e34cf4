//! Dictionary-augmented Huffman codec.
//!
//! Training mines a substring dictionary, assigns every entry a canonical
//! prefix code from its mined probability, and indexes the entry texts for
//! longest-match segmentation. A record is encoded as the concatenation of
//! the codes of its greedy segmentation.

use super::{read_json_config, Codec, ModelStats};
use crate::io::{self, ModelFormat};
use lexhuff_core::{
    code_lengths_from_weights, limit_code_lengths, BitPacker, BitReader, Code, CodeTree, CodecError,
    Dictionary, Result, SearchTrie, Symbol, ROOT,
};
use lexhuff_training::{MiningConfig, SubstringMiner};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Shortest code limit that still leaves room for every single byte.
pub const MIN_CODE_LENGTH: u32 = 8;

/// Training records a dictionary codec asks for.
pub const DEFAULT_SAMPLE_SIZE: usize = 100_000;

/// Configuration for a [`DictionaryCodec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Substring mining parameters
    pub mining: MiningConfig,
    /// Longest code any dictionary entry may get
    pub max_code_length: u32,
    /// Format written by `save` and expected by `load`
    pub format: ModelFormat,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            mining: MiningConfig::default(),
            max_code_length: 32,
            format: ModelFormat::LengthTagged,
        }
    }
}

impl DictionaryConfig {
    /// Check that the values are usable.
    pub fn validate(&self) -> Result<()> {
        self.mining.validate()?;
        if !(MIN_CODE_LENGTH..=u32::from(Code::MAX_LEN)).contains(&self.max_code_length) {
            return Err(CodecError::InvalidConfig(format!(
                "max_code_length must be in {}..={}, got {}",
                MIN_CODE_LENGTH,
                Code::MAX_LEN,
                self.max_code_length
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

/// Builder for creating a [`DictionaryCodec`].
#[derive(Clone, Default)]
pub struct DictionaryCodecBuilder {
    config: DictionaryConfig,
}

impl DictionaryCodecBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the longest substring considered for the dictionary.
    pub fn max_substring_len(mut self, len: usize) -> Self {
        self.config.mining.max_substring_len = len;
        self
    }

    /// Set the significance threshold of the mining test.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.mining.threshold = threshold;
        self
    }

    /// Set the slack of the mining test.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.config.mining.epsilon = epsilon;
        self
    }

    /// Set the maximum code length.
    pub fn max_code_length(mut self, max: u32) -> Self {
        self.config.max_code_length = max;
        self
    }

    /// Set the persisted model format.
    pub fn format(mut self, format: ModelFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Build the codec.
    pub fn build(self) -> Result<DictionaryCodec> {
        DictionaryCodec::new(self.config)
    }
}

/// Everything derived from one dictionary.
#[derive(Debug, Clone)]
struct TrainedModel {
    dictionary: Dictionary,
    tree: CodeTree,
    search: SearchTrie,
}

impl TrainedModel {
    fn from_lengths(dictionary: Dictionary, lengths: &[u32], max_code_length: u32) -> Result<Self> {
        let tree = CodeTree::from_lengths(lengths, false, max_code_length)?;
        let search = SearchTrie::from_dictionary(&dictionary);
        Ok(Self {
            dictionary,
            tree,
            search,
        })
    }

    fn from_probabilities(mut dictionary: Dictionary, max_code_length: u32) -> Result<Self> {
        let capacity = 1usize.checked_shl(max_code_length).unwrap_or(usize::MAX);
        let dropped = dictionary.retain_most_probable(capacity);
        if dropped > 0 {
            tracing::debug!(
                dropped,
                max_code_length,
                "dropped improbable entries to fit the code space"
            );
        }

        let weights = dictionary
            .iter()
            .map(|(id, entry)| (id, entry.probability));
        let mut lengths = code_lengths_from_weights(weights, dictionary.id_limit())?;
        limit_code_lengths(&mut lengths, max_code_length)?;
        Self::from_lengths(dictionary, &lengths, max_code_length)
    }
}

/// Codec that Huffman-codes mined dictionary entries.
pub struct DictionaryCodec {
    config: DictionaryConfig,
    model: Option<TrainedModel>,
}

impl DictionaryCodec {
    /// Create an untrained codec.
    pub fn new(config: DictionaryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            model: None,
        })
    }

    /// Create a codec builder.
    pub fn builder() -> DictionaryCodecBuilder {
        DictionaryCodecBuilder::new()
    }

    /// Codec configuration.
    pub fn config(&self) -> &DictionaryConfig {
        &self.config
    }

    fn model(&self) -> Result<&TrainedModel> {
        self.model.as_ref().ok_or(CodecError::NotTrained)
    }

    /// Mine a dictionary from `samples` and build its code.
    ///
    /// On failure the codec is left untrained.
    pub fn learn<S: AsRef<[u8]>>(&mut self, samples: &[S]) -> Result<()> {
        self.model = None;

        let mut miner = SubstringMiner::new(self.config.mining.clone())?;
        miner.learn(samples)?;
        let dictionary = miner.take_dictionary();

        let model = TrainedModel::from_probabilities(dictionary, self.config.max_code_length)?;
        tracing::debug!(
            entries = model.dictionary.len(),
            longest_entry = model.dictionary.longest_entry(),
            longest_code = model.tree.code_lengths().into_iter().max().unwrap_or(0),
            "trained dictionary codec"
        );

        self.model = Some(model);
        Ok(())
    }

    /// Encode a record.
    ///
    /// The record is split greedily into the longest dictionary entries,
    /// starting from the first byte.
    pub fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let model = self.model()?;
        let mut packer = BitPacker::with_capacity(raw.len() / 2 + 1);

        let mut pos = 0;
        while pos < raw.len() {
            let (id, len) = model
                .search
                .longest_match(&raw[pos..])
                .ok_or(CodecError::Unencodable(raw[pos]))?;
            let code = model
                .tree
                .code(id)
                .ok_or(CodecError::Unencodable(raw[pos]))?;
            packer.append_code(code);
            pos += len;
        }

        Ok(packer.into_framed())
    }

    /// Decode a stream produced by [`encode`](Self::encode).
    pub fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        let model = self.model()?;
        let mut reader = BitReader::framed(encoded)?;
        let mut out = Vec::with_capacity(encoded.len() * 2);

        let mut node = ROOT;
        while let Some(bit) = reader.read_bit() {
            node = model.tree.step(node, bit).ok_or_else(|| {
                CodecError::MalformedStream(format!(
                    "no code continues at bit {}",
                    reader.position() - 1
                ))
            })?;

            if let Symbol::Leaf(id) = model.tree.node(node).symbol {
                let text = model.dictionary.text(id).ok_or_else(|| {
                    CodecError::MalformedStream(format!("code for unknown entry {}", id))
                })?;
                out.extend_from_slice(text);
                node = ROOT;
            }
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

    /// Serialise the model in the configured format.
    pub fn save(&self) -> Result<Vec<u8>> {
        let model = self.model()?;
        match self.config.format {
            ModelFormat::LengthTagged => {
                io::write_length_tagged(&model.dictionary, &model.tree.code_lengths())
            }
            ModelFormat::ProbabilityTagged => io::write_probability_tagged(&model.dictionary),
        }
    }

    /// Load a model saved in the configured format.
    ///
    /// On failure the codec is left untrained.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        self.model = None;

        let max = self.config.max_code_length;
        let model = match self.config.format {
            ModelFormat::LengthTagged => {
                let persisted = io::read_length_tagged(data)?;
                // Stored lengths are authoritative, even above the configured limit.
                let longest = persisted.lengths.iter().copied().max().unwrap_or(0);
                TrainedModel::from_lengths(
                    persisted.dictionary,
                    &persisted.lengths,
                    max.max(longest),
                )
            }
            ModelFormat::ProbabilityTagged => {
                let dictionary = io::read_probability_tagged(data)?;
                TrainedModel::from_probabilities(dictionary, max)
            }
        }
        .map_err(|e| match e {
            CodecError::EmptyAlphabet => {
                CodecError::MalformedModel("model has no entries".to_string())
            }
            CodecError::Construction(msg) => CodecError::MalformedModel(msg),
            other @ (CodecError::CodeTooLong { .. } | CodecError::InvalidConfig(_)) => {
                CodecError::MalformedModel(other.to_string())
            }
            other => other,
        })?;

        tracing::debug!(
            format = %self.config.format,
            entries = model.dictionary.len(),
            "loaded dictionary codec"
        );
        self.model = Some(model);
        Ok(())
    }

    /// Drop the model.
    pub fn reset(&mut self) {
        self.model = None;
    }

    /// Whether a model is present.
    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// The dictionary of the current model.
    pub fn dictionary(&self) -> Option<&Dictionary> {
        self.model.as_ref().map(|model| &model.dictionary)
    }

    /// The code tree of the current model.
    pub fn code_tree(&self) -> Option<&CodeTree> {
        self.model.as_ref().map(|model| &model.tree)
    }

    /// Summary of the current model.
    pub fn stats(&self) -> Option<ModelStats> {
        self.model
            .as_ref()
            .map(|model| ModelStats::from_tree(Codec::name(self), &model.tree))
    }
}

impl Default for DictionaryCodec {
    fn default() -> Self {
        Self {
            config: DictionaryConfig::default(),
            model: None,
        }
    }
}

impl Codec for DictionaryCodec {
    fn name(&self) -> &'static str {
        "dictionary"
    }

    fn learn(&mut self, samples: &[&[u8]]) -> Result<()> {
        DictionaryCodec::learn(self, samples)
    }

    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        DictionaryCodec::encode(self, raw)
    }

    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        DictionaryCodec::decode(self, encoded)
    }

    fn save(&self) -> Result<Vec<u8>> {
        DictionaryCodec::save(self)
    }

    fn load(&mut self, model: &[u8]) -> Result<()> {
        DictionaryCodec::load(self, model)
    }

    fn reset(&mut self) {
        DictionaryCodec::reset(self)
    }

    fn is_trained(&self) -> bool {
        DictionaryCodec::is_trained(self)
    }

    fn stats(&self) -> Option<ModelStats> {
        DictionaryCodec::stats(self)
    }

    fn sample_size(&self, total_records: usize) -> usize {
        total_records.min(DEFAULT_SAMPLE_SIZE)
    }
}
