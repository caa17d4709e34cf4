//! Occurrence-counting substring trie.
//!
//! Every start position of every sample is walked for up to
//! `max_substring_len` bytes, so each node counts how many times the substring
//! spelled by its path occurs in the training data.

use ahash::AHashMap;

/// Trie node with an occurrence count.
#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    /// Child nodes indexed by byte (never 0, the root)
    pub children: AHashMap<u8, u32>,
    /// Number of occurrences of the substring ending here
    pub count: u64,
}

/// Substring trie over training samples, stored as a flat arena.
///
/// Index 0 is the root. Nodes are only ever appended, and the root is never a
/// transition target, so 0 doubles as the "no transition" value.
#[derive(Debug, Clone)]
pub struct SubstringTrie {
    nodes: Vec<TrieNode>,
    max_substring_len: usize,
    /// One unit per start position scanned
    total_length: u64,
}

impl SubstringTrie {
    /// Root node index.
    pub const ROOT: u32 = 0;

    /// Create an empty trie that records substrings up to `max_substring_len` bytes.
    pub fn new(max_substring_len: usize) -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            max_substring_len,
            total_length: 0,
        }
    }

    /// Build a trie from a set of samples.
    pub fn from_samples<S: AsRef<[u8]>>(samples: &[S], max_substring_len: usize) -> Self {
        let mut trie = Self::new(max_substring_len);
        for sample in samples {
            trie.add_sample(sample.as_ref());
        }
        trie
    }

    /// Count every substring of `sample` up to the maximum length.
    pub fn add_sample(&mut self, sample: &[u8]) {
        for start in 0..sample.len() {
            self.total_length += 1;

            let end = sample.len().min(start + self.max_substring_len);
            let mut node = Self::ROOT;
            for &byte in &sample[start..end] {
                node = self.child_or_insert(node, byte);
                self.nodes[node as usize].count += 1;
            }
        }
    }

    fn child_or_insert(&mut self, node: u32, byte: u8) -> u32 {
        let next = self.nodes.len() as u32;
        let child = *self.nodes[node as usize]
            .children
            .entry(byte)
            .or_insert(next);
        if child == next {
            self.nodes.push(TrieNode::default());
        }
        child
    }

    /// Make sure all 256 single-byte nodes exist under the root.
    ///
    /// Missing bytes get zero-count nodes. Returns how many were added.
    pub fn ensure_byte_coverage(&mut self) -> usize {
        let before = self.nodes.len();
        for byte in 0..=u8::MAX {
            self.child_or_insert(Self::ROOT, byte);
        }
        self.nodes.len() - before
    }

    /// Child of `node` along `byte`, if present.
    #[inline]
    pub fn child(&self, node: u32, byte: u8) -> Option<u32> {
        self.nodes[node as usize].children.get(&byte).copied()
    }

    /// Occurrence count of a node.
    #[inline]
    pub fn count(&self, node: u32) -> u64 {
        self.nodes[node as usize].count
    }

    /// Children of `node` in ascending byte order.
    pub fn children_sorted(&self, node: u32) -> Vec<(u8, u32)> {
        let mut children: Vec<(u8, u32)> = self.nodes[node as usize]
            .children
            .iter()
            .map(|(&byte, &child)| (byte, child))
            .collect();
        children.sort_unstable_by_key(|&(byte, _)| byte);
        children
    }

    /// Node reached by following `path` from the root.
    pub fn lookup(&self, path: &[u8]) -> Option<u32> {
        path.iter()
            .try_fold(Self::ROOT, |node, &byte| self.child(node, byte))
    }

    /// Number of start positions scanned.
    #[inline]
    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// Longest substring recorded.
    pub fn max_substring_len(&self) -> usize {
        self.max_substring_len
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if nothing besides the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Drop every node and reset the counters.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        self.nodes[0] = TrieNode::default();
        self.total_length = 0;
    }
}
