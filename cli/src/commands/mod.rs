//! CLI commands for the lexhuff codecs.

pub mod benchmark;
pub mod decode;
pub mod encode;
pub mod records;
pub mod train;

pub use benchmark::BenchmarkCommand;
pub use decode::DecodeCommand;
pub use encode::EncodeCommand;
pub use train::TrainCommand;

use anyhow::Result as AnyhowResult;
use clap::{Args, ValueEnum};
use lexhuff::{ByteCodec, ByteCodecConfig, Codec, DictionaryCodec, DictionaryConfig, ModelFormat};
use std::path::PathBuf;

/// Which codec a command works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CodecKind {
    /// Substring dictionary with Huffman codes
    Dictionary,
    /// Byte Huffman codes with an escape
    Byte,
}

/// Options that select and configure a codec.
#[derive(Debug, Clone, Args)]
pub struct CodecArgs {
    /// Codec to use
    #[arg(short, long, value_enum, default_value_t = CodecKind::Dictionary)]
    pub codec: CodecKind,

    /// JSON configuration file for the codec
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the maximum code length
    #[arg(long)]
    pub max_code_length: Option<u32>,

    /// Override the mining threshold (dictionary codec only)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Model format: length-tagged or probability-tagged (dictionary codec only)
    #[arg(long)]
    pub model_format: Option<ModelFormat>,
}

impl CodecArgs {
    /// Build an untrained codec from the options.
    pub fn build(&self) -> AnyhowResult<Box<dyn Codec>> {
        match self.codec {
            CodecKind::Dictionary => {
                let mut config = match &self.config {
                    Some(path) => DictionaryConfig::from_json_file(path)?,
                    None => DictionaryConfig::default(),
                };
                if let Some(max) = self.max_code_length {
                    config.max_code_length = max;
                }
                if let Some(threshold) = self.threshold {
                    config.mining.threshold = threshold;
                }
                if let Some(format) = self.model_format {
                    config.format = format;
                }
                Ok(Box::new(DictionaryCodec::new(config)?))
            }
            CodecKind::Byte => {
                let mut config = match &self.config {
                    Some(path) => ByteCodecConfig::from_json_file(path)?,
                    None => ByteCodecConfig::default(),
                };
                if let Some(max) = self.max_code_length {
                    config.max_code_length = max;
                }
                if self.threshold.is_some() || self.model_format.is_some() {
                    tracing::warn!("--threshold and --model-format only apply to the dictionary codec");
                }
                Ok(Box::new(ByteCodec::new(config)?))
            }
        }
    }
}

/// Pick `count` records spread evenly over `records`.
pub fn spread_sample(records: &[Vec<u8>], count: usize) -> Vec<&[u8]> {
    if count == 0 || records.is_empty() {
        return Vec::new();
    }
    let count = count.min(records.len());
    (0..count)
        .map(|i| records[i * records.len() / count].as_slice())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(codec: CodecKind) -> CodecArgs {
        CodecArgs {
            codec,
            config: None,
            max_code_length: None,
            threshold: None,
            model_format: None,
        }
    }

    #[test]
    fn test_build_codecs() {
        assert_eq!(args(CodecKind::Dictionary).build().unwrap().name(), "dictionary");
        assert_eq!(args(CodecKind::Byte).build().unwrap().name(), "byte");
    }

    #[test]
    fn test_invalid_override() {
        let mut byte = args(CodecKind::Byte);
        byte.max_code_length = Some(40);
        assert!(byte.build().is_err());
    }

    #[test]
    fn test_spread_sample() {
        let records: Vec<Vec<u8>> = (0u8..10).map(|i| vec![i]).collect();
        let sample = spread_sample(&records, 5);
        let expected: Vec<&[u8]> = vec![&[0], &[2], &[4], &[6], &[8]];
        assert_eq!(sample, expected);
        assert_eq!(spread_sample(&records, 50).len(), 10);
        assert!(spread_sample(&records, 0).is_empty());
    }
}
