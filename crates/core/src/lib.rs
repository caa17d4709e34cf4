//! Lexhuff-core - Core prefix-coding primitives
//!
//! This crate provides the building blocks shared by the lexhuff codecs,
//! independent of how a dictionary was mined.
//!
//! # Features
//!
//! - MSB-first bit packing with a framed stream format
//! - Canonical prefix-code trees with an optional escape leaf
//! - Huffman code lengths with deterministic tie-breaking and length limiting
//! - Dictionary storage and longest-match lookup using `AHashMap`
//!
//! # Example
//!
//! ```rust
//! use lexhuff_core::{BitPacker, CodeTree};
//!
//! let tree = CodeTree::from_lengths(&[1, 2, 2], false, 8).unwrap();
//! let mut packer = BitPacker::new();
//! for symbol in [0, 2, 1] {
//!     packer.append_code(tree.code(symbol).unwrap());
//! }
//! assert_eq!(packer.bit_len(), 5);
//! ```

pub mod error;
pub use error::{CodecError, Result};

pub mod bits;
pub use bits::{BitPacker, BitReader, Code};

// Dictionary, merge queue and code tree
pub mod core;
pub use core::{
    code_lengths_from_weights, limit_code_lengths, CodeNode, CodeTree, Dictionary,
    DictionaryEntry, MergeCandidate, MergeQueue, Symbol, MAX_ENTRY_LEN, ROOT,
};

// Segmentation
pub mod encoding;
pub use encoding::SearchTrie;
