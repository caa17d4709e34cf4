//! Significance-pruned substring mining.
//!
//! Substrings are harvested depth first from a [`SubstringTrie`]. A substring
//! longer than one byte survives only if it occurs more often than its prefix
//! and its last byte would predict, scaled by a threshold:
//!
//! ```text
//! P(node) >= threshold * P(parent) * P(last byte) - epsilon
//! P(node)      = count(node)      / (total - d)
//! P(parent)    = count(parent)    / (total - d + 1)
//! P(last byte) = count(last byte) / total
//! ```
//!
//! Rejected substrings are not explored further, so the dictionary is closed
//! under prefixes. Single bytes are always kept.

use super::trie::SubstringTrie;
use lexhuff_core::{CodecError, Dictionary, DictionaryEntry, Result, MAX_ENTRY_LEN};
use serde::{Deserialize, Serialize};

/// Configuration for substring mining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Longest substring that is counted and harvested
    pub max_substring_len: usize,
    /// Multiplier on the chance co-occurrence probability
    pub threshold: f64,
    /// Slack subtracted from the right-hand side of the test
    pub epsilon: f64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            max_substring_len: 16,
            threshold: 4.0,
            epsilon: 0.0,
        }
    }
}

impl MiningConfig {
    /// Check that the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_substring_len == 0 || self.max_substring_len > MAX_ENTRY_LEN {
            return Err(CodecError::InvalidConfig(format!(
                "max_substring_len must be in 1..={}, got {}",
                MAX_ENTRY_LEN, self.max_substring_len
            )));
        }
        if !self.threshold.is_finite() || !self.epsilon.is_finite() {
            return Err(CodecError::InvalidConfig(
                "threshold and epsilon must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mines a substring dictionary from training samples.
///
/// The dictionary is handed over with [`take_dictionary`](Self::take_dictionary);
/// call [`reset`](Self::reset) before mining again.
pub struct SubstringMiner {
    config: MiningConfig,
    trie: SubstringTrie,
    dictionary: Dictionary,
    /// Probability terms whose denominator was not positive
    clamped: usize,
}

impl SubstringMiner {
    /// Create a miner with the given configuration.
    pub fn new(config: MiningConfig) -> Result<Self> {
        config.validate()?;
        let trie = SubstringTrie::new(config.max_substring_len);
        Ok(Self {
            config,
            trie,
            dictionary: Dictionary::new(),
            clamped: 0,
        })
    }

    /// Mine the dictionary for a set of samples.
    ///
    /// Any state from a previous run is discarded first.
    pub fn learn<S: AsRef<[u8]>>(&mut self, samples: &[S]) -> Result<&Dictionary> {
        self.reset();

        for sample in samples {
            self.trie.add_sample(sample.as_ref());
        }
        let added = self.trie.ensure_byte_coverage();

        let mut path = Vec::with_capacity(self.config.max_substring_len);
        self.harvest(SubstringTrie::ROOT, SubstringTrie::ROOT, &mut path)?;

        tracing::debug!(
            samples = samples.len(),
            total_length = self.trie.total_length(),
            nodes = self.trie.len(),
            filled_bytes = added,
            entries = self.dictionary.len(),
            clamped = self.clamped,
            "mined substring dictionary"
        );

        Ok(&self.dictionary)
    }

    fn harvest(&mut self, node: u32, parent: u32, path: &mut Vec<u8>) -> Result<()> {
        let depth = path.len();

        if depth > 0 {
            if !self.accept(node, parent, path) {
                return Ok(());
            }
            let probability = self.probability(self.trie.count(node), depth as i128);
            self.dictionary
                .push(DictionaryEntry::new(path.clone(), probability))?;
        }

        for (byte, child) in self.trie.children_sorted(node) {
            path.push(byte);
            self.harvest(child, node, path)?;
            path.pop();
        }

        Ok(())
    }

    fn accept(&mut self, node: u32, parent: u32, path: &[u8]) -> bool {
        let depth = path.len() as i128;
        if depth == 1 {
            return true;
        }

        let last = path[path.len() - 1];
        let letter_count = self
            .trie
            .child(SubstringTrie::ROOT, last)
            .map(|letter| self.trie.count(letter))
            .unwrap_or(0);

        let p_node = self.probability(self.trie.count(node), depth);
        let p_parent = self.probability(self.trie.count(parent), depth - 1);
        let p_letter = self.probability(letter_count, 0);

        p_node >= self.config.threshold * p_parent * p_letter - self.config.epsilon
    }

    /// `count / (total - offset)`, clamped to 0 when the denominator is not positive.
    fn probability(&mut self, count: u64, offset: i128) -> f64 {
        let denominator = i128::from(self.trie.total_length()) - offset;
        if denominator <= 0 {
            self.clamped += 1;
            return 0.0;
        }
        count as f64 / denominator as f64
    }

    /// Move the mined dictionary out, leaving an empty one behind.
    pub fn take_dictionary(&mut self) -> Dictionary {
        self.trie.clear();
        std::mem::take(&mut self.dictionary)
    }

    /// The dictionary mined by the last run.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// The trie built by the last run.
    pub fn trie(&self) -> &SubstringTrie {
        &self.trie
    }

    /// Number of probability terms clamped in the last run.
    pub fn clamped_terms(&self) -> usize {
        self.clamped
    }

    /// Mining configuration.
    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Discard the trie and dictionary.
    pub fn reset(&mut self) {
        self.trie.clear();
        self.dictionary.clear();
        self.clamped = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mine(samples: &[&str], config: MiningConfig) -> Dictionary {
        let mut miner = SubstringMiner::new(config).unwrap();
        miner.learn(samples).unwrap();
        miner.take_dictionary()
    }

    #[test]
    fn test_repeated_byte_without_threshold() {
        let config = MiningConfig {
            threshold: 0.0,
            ..Default::default()
        };
        let dictionary = mine(&["aaaa"], config);

        for text in ["a", "aa", "aaa", "aaaa"] {
            assert!(dictionary.find(text.as_bytes()).is_some(), "missing {}", text);
        }
        assert!(dictionary.find(b"aaaaa").is_none());
        assert_eq!(dictionary.len(), 256 + 3);

        // "aaaa" leaves no position to divide by.
        let id = dictionary.find(b"aaaa").unwrap();
        assert_eq!(dictionary.get(id).unwrap().probability, 0.0);
        let id = dictionary.find(b"aa").unwrap();
        assert!((dictionary.get(id).unwrap().probability - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_byte_default_threshold() {
        // P("aa") = 3/2 is below 4 * P("a") * P('a') = 4 * 4/3 * 1.
        let dictionary = mine(&["aaaa"], MiningConfig::default());
        assert!(dictionary.find(b"a").is_some());
        assert!(dictionary.find(b"aa").is_none());
        assert_eq!(dictionary.len(), 256);
    }

    #[test]
    fn test_single_bytes_always_kept() {
        let configs = [
            MiningConfig::default(),
            MiningConfig {
                threshold: 1e9,
                ..Default::default()
            },
            MiningConfig {
                max_substring_len: 1,
                ..Default::default()
            },
        ];
        for config in configs {
            let dictionary = mine(&["the cat sat on the mat", "zzz"], config);
            for byte in 0..=u8::MAX {
                assert!(dictionary.find(&[byte]).is_some(), "byte {} missing", byte);
            }
        }
    }

    #[test]
    fn test_frequent_pair_survives() {
        // "ab" always co-occurs; "va" only where two blocks meet.
        let sample = "abxyabqrabmnabuv".repeat(8);
        let dictionary = mine(&[sample.as_str()], MiningConfig::default());
        assert!(dictionary.find(b"ab").is_some());
        assert!(dictionary.find(b"va").is_none());
    }

    #[test]
    fn test_prefix_closed() {
        let sample = "abcabcabcabc".repeat(4);
        let dictionary = mine(&[sample.as_str()], MiningConfig::default());
        for (_, entry) in dictionary.iter() {
            let prefix = &entry.text[..entry.len() - 1];
            if !prefix.is_empty() {
                assert!(dictionary.find(prefix).is_some());
            }
        }
    }

    #[test]
    fn test_preorder_byte_order() {
        let config = MiningConfig {
            threshold: 0.0,
            max_substring_len: 2,
            ..Default::default()
        };
        let dictionary = mine(&["ba"], config);
        let texts: Vec<&[u8]> = dictionary
            .iter()
            .map(|(_, entry)| entry.text.as_slice())
            .filter(|text| text.iter().all(|b| *b == b'a' || *b == b'b'))
            .collect();
        assert_eq!(texts, vec![&b"a"[..], &b"b"[..], &b"ba"[..]]);
    }

    #[test]
    fn test_empty_training() {
        let mut miner = SubstringMiner::new(MiningConfig::default()).unwrap();
        let empty: [&[u8]; 0] = [];
        miner.learn(&empty).unwrap();

        assert_eq!(miner.dictionary().len(), 256);
        assert!(miner
            .dictionary()
            .iter()
            .all(|(_, entry)| entry.probability == 0.0));
        assert_eq!(miner.clamped_terms(), 256);
    }

    #[test]
    fn test_take_and_reset() {
        let mut miner = SubstringMiner::new(MiningConfig::default()).unwrap();
        miner.learn(&["hello"]).unwrap();
        let dictionary = miner.take_dictionary();

        assert!(!dictionary.is_empty());
        assert!(miner.dictionary().is_empty());
        assert!(miner.trie().is_empty());
    }

    #[test]
    fn test_rejects_bad_config() {
        for config in [
            MiningConfig {
                max_substring_len: 0,
                ..Default::default()
            },
            MiningConfig {
                max_substring_len: 256,
                ..Default::default()
            },
            MiningConfig {
                threshold: f64::NAN,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                SubstringMiner::new(config),
                Err(CodecError::InvalidConfig(_))
            ));
        }
    }
}
