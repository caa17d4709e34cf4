//! Core data structures for dictionary prefix coding.
//!
//! This module contains the dictionary store, the merge queue used for
//! Huffman length computation, and the canonical code tree.

pub mod dictionary;
pub mod priority;
pub mod tree;

pub use dictionary::{Dictionary, DictionaryEntry, MAX_ENTRY_LEN};
pub use priority::{MergeCandidate, MergeQueue};
pub use tree::{code_lengths_from_weights, limit_code_lengths, CodeNode, CodeTree, Symbol, ROOT};
