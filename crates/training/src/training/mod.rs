//! Training infrastructure for lexhuff codecs.
//!
//! This module provides substring mining for dictionary codecs and byte
//! frequency counting for byte codecs.

pub mod counter;
pub mod miner;
pub mod trie;

pub use counter::ByteCounter;
pub use miner::{MiningConfig, SubstringMiner};
pub use trie::{SubstringTrie, TrieNode};
