//! Dictionary storage for mined substrings.
//!
//! Entries are addressed by `u32` ids. Id 0 is reserved so that it can act as
//! the "absent" sentinel elsewhere; real entries start at id 1 and keep the
//! order in which they were mined or loaded.

use crate::error::{CodecError, Result};
use ahash::AHashMap;
use dary_heap::OctonaryHeap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Longest entry text that fits the one-byte length field of persisted models.
pub const MAX_ENTRY_LEN: usize = u8::MAX as usize;

/// A mined substring and its training-time probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Raw bytes of the substring
    pub text: Vec<u8>,
    /// Occurrence count over the number of positions it could start at
    pub probability: f64,
}

impl DictionaryEntry {
    /// Create a new entry.
    pub fn new(text: impl Into<Vec<u8>>, probability: f64) -> Self {
        Self {
            text: text.into(),
            probability,
        }
    }

    /// Length of the entry text in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if the entry text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Ordered collection of dictionary entries with a reserved id 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    /// Slot 0 holds an empty placeholder.
    entries: Vec<DictionaryEntry>,
}

impl Dictionary {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty dictionary with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity + 1);
        entries.push(DictionaryEntry::new(Vec::new(), 0.0));
        Self { entries }
    }

    /// Build a dictionary from entries in id order (first entry gets id 1).
    pub fn from_entries(entries: impl IntoIterator<Item = DictionaryEntry>) -> Result<Self> {
        let mut dictionary = Self::new();
        for entry in entries {
            dictionary.push(entry)?;
        }
        Ok(dictionary)
    }

    /// Append an entry and return its id.
    pub fn push(&mut self, entry: DictionaryEntry) -> Result<u32> {
        if entry.is_empty() || entry.len() > MAX_ENTRY_LEN {
            return Err(CodecError::Construction(format!(
                "dictionary entry length {} outside 1..={}",
                entry.len(),
                MAX_ENTRY_LEN
            )));
        }

        let id = u32::try_from(self.entries.len()).map_err(|_| {
            CodecError::Construction("dictionary exceeds u32 id space".to_string())
        })?;
        self.entries.push(entry);
        Ok(id)
    }

    /// Get the entry for an id. Id 0 has no entry.
    #[inline]
    pub fn get(&self, id: u32) -> Option<&DictionaryEntry> {
        match id {
            0 => None,
            _ => self.entries.get(id as usize),
        }
    }

    /// Get the text for an id.
    #[inline]
    pub fn text(&self, id: u32) -> Option<&[u8]> {
        self.get(id).map(|entry| entry.text.as_slice())
    }

    /// Number of real entries (the reserved slot is not counted).
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    /// Check if the dictionary has no real entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the largest id; the size of per-id lookup tables.
    #[inline]
    pub fn id_limit(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over `(id, entry)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &DictionaryEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .skip(1)
            .map(|(id, entry)| (id as u32, entry))
    }

    /// Find the id of an entry by its text.
    pub fn find(&self, text: &[u8]) -> Option<u32> {
        self.iter()
            .find(|(_, entry)| entry.text == text)
            .map(|(id, _)| id)
    }

    /// Length of the longest entry.
    pub fn longest_entry(&self) -> usize {
        self.entries.iter().map(DictionaryEntry::len).max().unwrap_or(0)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.truncate(1);
    }

    /// Shrink the dictionary to at most `limit` entries.
    ///
    /// Only multi-byte entries that are not the prefix of another surviving
    /// entry are removed, least probable first (later ids first on ties), so
    /// single bytes are always kept and a prefix-closed dictionary stays
    /// prefix-closed. Survivors keep their relative order and are renumbered
    /// densely from 1. Returns the number of removed entries.
    pub fn retain_most_probable(&mut self, limit: usize) -> usize {
        let len = self.len();
        if len <= limit {
            return 0;
        }

        let ids: AHashMap<&[u8], usize> = self
            .entries
            .iter()
            .enumerate()
            .skip(1)
            .map(|(id, entry)| (entry.text.as_slice(), id))
            .collect();

        let mut parent = vec![0usize; self.entries.len()];
        let mut children = vec![0u32; self.entries.len()];
        for (id, entry) in self.entries.iter().enumerate().skip(1) {
            if entry.len() > 1 {
                if let Some(&p) = ids.get(&entry.text[..entry.len() - 1]) {
                    parent[id] = p;
                    children[p] += 1;
                }
            }
        }

        let mut heap = OctonaryHeap::new();
        for (id, entry) in self.entries.iter().enumerate().skip(1) {
            if entry.len() > 1 && children[id] == 0 {
                heap.push(PruneCandidate::new(id, entry.probability));
            }
        }

        let mut removed = vec![false; self.entries.len()];
        let mut remaining = len;
        while remaining > limit {
            let Some(candidate) = heap.pop() else {
                break;
            };
            removed[candidate.id] = true;
            remaining -= 1;

            let p = parent[candidate.id];
            if p != 0 {
                children[p] -= 1;
                if children[p] == 0 && self.entries[p].len() > 1 {
                    heap.push(PruneCandidate::new(p, self.entries[p].probability));
                }
            }
        }

        let mut id = 0;
        self.entries.retain(|_| {
            let keep = !removed[id];
            id += 1;
            keep
        });
        len - self.len()
    }
}

/// Leaf entry that may be dropped by [`Dictionary::retain_most_probable`].
#[derive(Debug, Clone, Copy)]
struct PruneCandidate {
    id: usize,
    probability: f64,
}

impl PruneCandidate {
    fn new(id: usize, probability: f64) -> Self {
        Self { id, probability }
    }
}

// Reversed ordering: the max-heap yields the least probable, latest entry first.
impl Ord for PruneCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .probability
            .total_cmp(&self.probability)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for PruneCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PruneCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PruneCandidate {}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}
