//! Byte frequency counting for byte-level codecs.
//!
//! This module counts byte frequencies over training samples, with support
//! for parallel processing.

use rayon::prelude::*;

/// Counter for byte frequencies.
#[derive(Debug, Clone)]
pub struct ByteCounter {
    /// Byte -> occurrence count
    counts: [u64; 256],
}

impl ByteCounter {
    /// Create a new, empty counter.
    pub fn new() -> Self {
        Self { counts: [0; 256] }
    }

    /// Add the bytes of one sample.
    pub fn add_sample(&mut self, sample: &[u8]) {
        for &byte in sample {
            self.counts[byte as usize] += 1;
        }
    }

    /// Count all samples sequentially.
    pub fn count_sequential<S: AsRef<[u8]>>(samples: &[S]) -> Self {
        let mut counter = Self::new();
        for sample in samples {
            counter.add_sample(sample.as_ref());
        }
        counter
    }

    /// Count all samples in parallel.
    ///
    /// Produces the same counts as [`count_sequential`](Self::count_sequential).
    pub fn count_parallel<S: AsRef<[u8]> + Sync>(samples: &[S]) -> Self {
        samples
            .par_iter()
            .fold(Self::new, |mut counter, sample| {
                counter.add_sample(sample.as_ref());
                counter
            })
            .reduce(Self::new, |mut acc, counter| {
                acc.merge(&counter);
                acc
            })
    }

    /// Add another counter's counts to this one.
    pub fn merge(&mut self, other: &Self) {
        for (count, &extra) in self.counts.iter_mut().zip(other.counts.iter()) {
            *count += extra;
        }
    }

    /// Occurrence count of one byte.
    #[inline]
    pub fn count(&self, byte: u8) -> u64 {
        self.counts[byte as usize]
    }

    /// All counts indexed by byte.
    pub fn counts(&self) -> &[u64; 256] {
        &self.counts
    }

    /// Total number of bytes counted.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of distinct bytes seen.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&count| count > 0).count()
    }

    /// `(byte, count)` weights for every byte that was seen.
    pub fn weights(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(byte, &count)| (byte as u32, count as f64))
    }

    /// Clear all counts.
    pub fn clear(&mut self) {
        self.counts = [0; 256];
    }
}

impl Default for ByteCounter {
    fn default() -> Self {
        Self::new()
    }
}
