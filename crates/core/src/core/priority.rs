//! Priority queue for Huffman merge candidates.
//!
//! The queue pops the lightest node first. Equal weights are broken by rank
//! (the height of the subtree, leaves have rank 1), lower first, which keeps
//! the merged tree closer to balanced. The node index is the final tie-break
//! so that the merge order is fully deterministic.

use dary_heap::OctonaryHeap;
use std::cmp::Ordering;

/// A node waiting to be merged.
#[derive(Debug, Clone, Copy)]
pub struct MergeCandidate {
    /// Index of the node in the merge arena
    pub node: u32,
    /// Accumulated weight of the subtree
    pub weight: f64,
    /// Height of the subtree (leaves are rank 1)
    pub rank: u32,
}

impl MergeCandidate {
    /// Create a leaf candidate.
    pub fn leaf(node: u32, weight: f64) -> Self {
        Self {
            node,
            weight,
            rank: 1,
        }
    }

    /// Combine two popped candidates into the parent stored at `node`.
    pub fn merged(node: u32, first: &Self, second: &Self) -> Self {
        Self {
            node,
            weight: first.weight + second.weight,
            rank: first.rank.max(second.rank) + 1,
        }
    }
}

// Reversed ordering: the max-heap yields the lightest, lowest-rank node first.
impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .weight
            .total_cmp(&self.weight)
            .then_with(|| other.rank.cmp(&self.rank))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MergeCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeCandidate {}

/// Min-priority queue of merge candidates.
///
/// Uses an 8-ary heap for better cache locality than a binary heap.
pub struct MergeQueue {
    heap: OctonaryHeap<MergeCandidate>,
}

impl MergeQueue {
    /// Create a new queue with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: OctonaryHeap::with_capacity(capacity),
        }
    }

    /// Create a new empty queue.
    pub fn new() -> Self {
        Self {
            heap: OctonaryHeap::new(),
        }
    }

    /// Push a candidate onto the queue.
    pub fn push(&mut self, candidate: MergeCandidate) {
        self.heap.push(candidate);
    }

    /// Pop the lightest candidate.
    pub fn pop(&mut self) -> Option<MergeCandidate> {
        self.heap.pop()
    }

    /// Pop the two lightest candidates, or `None` if fewer than two remain.
    pub fn pop_pair(&mut self) -> Option<(MergeCandidate, MergeCandidate)> {
        if self.heap.len() < 2 {
            return None;
        }
        let first = self.heap.pop()?;
        let second = self.heap.pop()?;
        Some((first, second))
    }

    /// Peek at the lightest candidate without removing it.
    pub fn peek(&self) -> Option<&MergeCandidate> {
        self.heap.peek()
    }

    /// Number of candidates in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Clear all entries from the queue.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl Default for MergeQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_lightest_first() {
        let mut queue = MergeQueue::new();

        queue.push(MergeCandidate::leaf(0, 10.0));
        queue.push(MergeCandidate::leaf(1, 2.0));
        queue.push(MergeCandidate::leaf(2, 5.0));

        assert_eq!(queue.pop().unwrap().node, 1);
        assert_eq!(queue.pop().unwrap().node, 2);
        assert_eq!(queue.pop().unwrap().node, 0);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_rank_breaks_weight_ties() {
        let mut queue = MergeQueue::new();

        let a = MergeCandidate::leaf(0, 1.0);
        let b = MergeCandidate::leaf(1, 1.0);
        queue.push(MergeCandidate::merged(5, &a, &b));
        queue.push(MergeCandidate::leaf(3, 2.0));

        // Same weight; the leaf has the lower rank.
        let first = queue.pop().unwrap();
        assert_eq!(first.node, 3);
        assert_eq!(first.rank, 1);

        let second = queue.pop().unwrap();
        assert_eq!(second.node, 5);
        assert_eq!(second.rank, 2);
    }

    #[test]
    fn test_node_breaks_full_ties() {
        let mut queue = MergeQueue::new();
        queue.push(MergeCandidate::leaf(7, 0.0));
        queue.push(MergeCandidate::leaf(4, 0.0));

        let (first, second) = queue.pop_pair().unwrap();
        assert_eq!(first.node, 4);
        assert_eq!(second.node, 7);
    }

    #[test]
    fn test_pop_pair_needs_two() {
        let mut queue = MergeQueue::with_capacity(4);
        queue.push(MergeCandidate::leaf(0, 1.0));

        assert!(queue.pop_pair().is_none());
        assert_eq!(queue.len(), 1);

        queue.clear();
        assert!(queue.is_empty());
    }
}
