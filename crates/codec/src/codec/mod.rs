//! Codec implementations.
//!
//! Both codecs share the same life cycle: they start untrained, become
//! trained through `learn` or `load`, and return to untrained on `reset`.

pub mod byte;
pub mod dictionary;

pub use byte::{ByteCodec, ByteCodecConfig};
pub use dictionary::{DictionaryCodec, DictionaryCodecBuilder, DictionaryConfig};

use lexhuff_core::{CodeTree, CodecError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Common interface of the lexhuff codecs.
pub trait Codec: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Train on a set of samples, replacing any previous model.
    fn learn(&mut self, samples: &[&[u8]]) -> Result<()>;

    /// Encode a record into a framed bit stream.
    fn encode(&self, raw: &[u8]) -> Result<Vec<u8>>;

    /// Decode a stream produced by [`encode`](Self::encode).
    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>>;

    /// Serialise the trained model.
    fn save(&self) -> Result<Vec<u8>>;

    /// Replace the current model with a serialised one.
    fn load(&mut self, model: &[u8]) -> Result<()>;

    /// Drop the model and return to the untrained state.
    fn reset(&mut self);

    /// Whether a model is present.
    fn is_trained(&self) -> bool;

    /// Summary of the trained model.
    fn stats(&self) -> Option<ModelStats>;

    /// Number of training records the codec wants to see out of `total_records`.
    fn sample_size(&self, total_records: usize) -> usize;
}

/// Summary of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    /// Codec name
    pub codec: String,
    /// Number of symbols with a code (dictionary entries or trained bytes)
    pub symbols: usize,
    /// Whether an escape code exists
    pub has_escape: bool,
    /// Configured maximum code length
    pub max_code_length: u32,
    /// Longest code actually assigned
    pub longest_code: u32,
    /// Unweighted mean code length over coded symbols
    pub mean_code_length: f64,
}

impl ModelStats {
    pub(crate) fn from_tree(codec: &str, tree: &CodeTree) -> Self {
        let lengths: Vec<u32> = tree
            .code_lengths()
            .into_iter()
            .filter(|&length| length > 0)
            .collect();
        let mean_code_length = if lengths.is_empty() {
            0.0
        } else {
            lengths.iter().map(|&l| f64::from(l)).sum::<f64>() / lengths.len() as f64
        };

        Self {
            codec: codec.to_string(),
            symbols: lengths.len(),
            has_escape: tree.escape_code().is_some(),
            max_code_length: tree.max_code_length(),
            longest_code: lengths.iter().copied().max().unwrap_or(0),
            mean_code_length,
        }
    }
}

/// Read a JSON configuration file.
pub(crate) fn read_json_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| CodecError::io(path, e))?;
    let config = serde_json::from_reader(BufReader::new(file))?;
    Ok(config)
}
