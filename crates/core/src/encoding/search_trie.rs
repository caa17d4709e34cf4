//! Longest-match lookup over dictionary entries.

use crate::core::Dictionary;
use ahash::AHashMap;

/// Trie node for longest-match segmentation.
#[derive(Debug, Clone, Default)]
struct SearchNode {
    /// Child nodes indexed by byte
    children: AHashMap<u8, u32>,
    /// Dictionary id if the path to this node spells a complete entry
    entry: Option<u32>,
}

/// Byte trie mapping dictionary texts to their ids.
///
/// Nodes live in a flat arena with the root at index 0.
#[derive(Debug, Clone)]
pub struct SearchTrie {
    nodes: Vec<SearchNode>,
    entries: usize,
}

impl SearchTrie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self {
            nodes: vec![SearchNode::default()],
            entries: 0,
        }
    }

    /// Insert an entry text under the given id, replacing any previous id.
    pub fn insert(&mut self, text: &[u8], id: u32) {
        let mut node = 0usize;

        for &byte in text {
            let next = self.nodes.len() as u32;
            let child = *self.nodes[node].children.entry(byte).or_insert(next);
            if child == next {
                self.nodes.push(SearchNode::default());
            }
            node = child as usize;
        }

        if self.nodes[node].entry.replace(id).is_none() {
            self.entries += 1;
        }
    }

    /// Build a trie from every entry of a dictionary.
    pub fn from_dictionary(dictionary: &Dictionary) -> Self {
        let mut trie = Self::new();
        for (id, entry) in dictionary.iter() {
            trie.insert(&entry.text, id);
        }
        trie
    }

    /// Find the longest entry that is a prefix of `input`.
    ///
    /// Returns the entry id and its length in bytes.
    pub fn longest_match(&self, input: &[u8]) -> Option<(u32, usize)> {
        let mut node = &self.nodes[0];
        let mut best_match = None;

        for (i, byte) in input.iter().enumerate() {
            match node.children.get(byte) {
                Some(&child) => {
                    node = &self.nodes[child as usize];
                    if let Some(id) = node.entry {
                        best_match = Some((id, i + 1));
                    }
                }
                None => break,
            }
        }

        best_match
    }

    /// Number of entries in the trie.
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Check if the trie holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

impl Default for SearchTrie {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DictionaryEntry;

    #[test]
    fn test_longest_match() {
        let mut trie = SearchTrie::new();
        trie.insert(b"a", 1);
        trie.insert(b"ab", 2);
        trie.insert(b"abcd", 3);

        assert_eq!(trie.longest_match(b"abc"), Some((2, 2)));
        assert_eq!(trie.longest_match(b"abcde"), Some((3, 4)));
        assert_eq!(trie.longest_match(b"b"), None);
        assert_eq!(trie.longest_match(b""), None);
        assert_eq!(trie.len(), 3);
    }

    #[test]
    fn test_from_dictionary() {
        let dictionary = Dictionary::from_entries([
            DictionaryEntry::new(*b"th", 0.2),
            DictionaryEntry::new(*b"the", 0.1),
            DictionaryEntry::new(*b"t", 0.4),
        ])
        .unwrap();
        let trie = SearchTrie::from_dictionary(&dictionary);

        assert_eq!(trie.longest_match(b"then"), Some((2, 3)));
        assert_eq!(trie.longest_match(b"tx"), Some((3, 1)));
    }

    #[test]
    fn test_reinsert_keeps_count() {
        let mut trie = SearchTrie::new();
        trie.insert(b"xy", 1);
        trie.insert(b"xy", 4);
        assert_eq!(trie.len(), 1);
        assert_eq!(trie.longest_match(b"xyz"), Some((4, 2)));
    }
}
