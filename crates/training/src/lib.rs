//! Lexhuff-training - Model training infrastructure
//!
//! This crate provides the statistics that lexhuff codecs are trained from.
//!
//! # Features
//!
//! - Occurrence-counting substring trie over training samples
//! - Significance-pruned substring mining with configurable thresholds
//! - Byte frequency counting with parallel processing support
//!
//! # Example
//!
//! ```rust
//! use lexhuff_training::{MiningConfig, SubstringMiner};
//!
//! let mut miner = SubstringMiner::new(MiningConfig::default())?;
//! miner.learn(&["the cat", "the hat"])?;
//! let dictionary = miner.take_dictionary();
//! assert!(dictionary.find(b"t").is_some());
//! # Ok::<(), lexhuff_training::CodecError>(())
//! ```

pub use lexhuff_core::{CodecError, Result};

// Training infrastructure
pub mod training;
pub use training::{ByteCounter, MiningConfig, SubstringMiner, SubstringTrie, TrieNode};
