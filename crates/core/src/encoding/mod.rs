//! Segmentation of input bytes into dictionary entries.

pub mod search_trie;

pub use search_trie::SearchTrie;
