//! Canonical prefix-code trees.
//!
//! A code is built in two steps. [`code_lengths_from_weights`] runs a Huffman
//! merge to decide how long each symbol's code is, and
//! [`CodeTree::from_lengths`] turns a length table into a tree. Only the
//! lengths matter for the final bit patterns, so a tree rebuilt from persisted
//! lengths is identical to the one produced at training time.
//!
//! Placement runs from the longest tier to the shortest. Each tier takes the
//! leftmost open slots at exactly its depth, and an optional escape leaf is
//! placed first in the deepest permitted tier, which puts it on the all-zero
//! path.

use super::priority::{MergeCandidate, MergeQueue};
use crate::bits::Code;
use crate::error::{CodecError, Result};

/// Arena index of the root node. Index 0 is reserved as "no child".
pub const ROOT: u32 = 1;

/// What a tree node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Internal node with at least one child
    Interior,
    /// Leaf carrying a symbol (a dictionary id or a raw byte)
    Leaf(u32),
    /// Leaf meaning "a literal byte follows"
    Escape,
}

/// A node in the flat code tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeNode {
    /// Child taken on a 0 bit (0 = absent)
    pub left: u32,
    /// Child taken on a 1 bit (0 = absent)
    pub right: u32,
    /// Payload of the node
    pub symbol: Symbol,
}

impl CodeNode {
    const INTERIOR: Self = Self {
        left: 0,
        right: 0,
        symbol: Symbol::Interior,
    };

    /// Check if the node is a leaf (symbol or escape).
    #[inline]
    pub fn is_leaf(&self) -> bool {
        !matches!(self.symbol, Symbol::Interior)
    }

    /// Child index for a bit, 0 if absent.
    #[inline]
    pub fn child(&self, bit: bool) -> u32 {
        if bit {
            self.right
        } else {
            self.left
        }
    }
}

/// Compute Huffman code lengths for the given `(symbol, weight)` pairs.
///
/// The result is indexed by symbol and has `num_symbols` slots; symbols that
/// were not listed get length 0. A lone symbol gets length 1.
pub fn code_lengths_from_weights<I>(weights: I, num_symbols: usize) -> Result<Vec<u32>>
where
    I: IntoIterator<Item = (u32, f64)>,
{
    let mut leaves: Vec<u32> = Vec::new();
    let mut queue = MergeQueue::with_capacity(num_symbols);

    for (symbol, weight) in weights {
        if symbol as usize >= num_symbols {
            return Err(CodecError::Construction(format!(
                "symbol {} outside alphabet of {}",
                symbol, num_symbols
            )));
        }
        queue.push(MergeCandidate::leaf(leaves.len() as u32, weight));
        leaves.push(symbol);
    }

    let mut lengths = vec![0u32; num_symbols];
    match leaves.len() {
        0 => return Err(CodecError::EmptyAlphabet),
        1 => {
            lengths[leaves[0] as usize] = 1;
            return Ok(lengths);
        }
        _ => {}
    }

    // Arena: indices below leaves.len() are leaves, the rest merged nodes.
    let leaf_count = leaves.len();
    let mut merged: Vec<(u32, u32)> = Vec::with_capacity(leaf_count - 1);

    while let Some((first, second)) = queue.pop_pair() {
        let node = (leaf_count + merged.len()) as u32;
        let children = if first.rank > second.rank {
            (first.node, second.node)
        } else {
            (second.node, first.node)
        };
        merged.push(children);
        queue.push(MergeCandidate::merged(node, &first, &second));
    }

    let root = queue
        .pop()
        .ok_or_else(|| CodecError::Construction("merge left no root".to_string()))?;

    let mut stack = vec![(root.node, 0u32)];
    while let Some((node, depth)) = stack.pop() {
        let node = node as usize;
        if node < leaf_count {
            lengths[leaves[node] as usize] = depth;
        } else {
            let (left, right) = merged[node - leaf_count];
            stack.push((right, depth + 1));
            stack.push((left, depth + 1));
        }
    }

    Ok(lengths)
}

/// Kraft weight of a code of `length` bits, in units of `2^-max`.
#[inline]
fn kraft_units(length: u32, max: u32) -> u128 {
    1u128 << (max - length)
}

/// Clamp code lengths to `max` bits while keeping the code prefix-free.
///
/// Over-long codes are truncated to `max`, then the longest codes still
/// shorter than `max` are lengthened until the Kraft sum fits again. Every
/// symbol keeps a code; only an alphabet larger than `2^max` fails.
pub fn limit_code_lengths(lengths: &mut [u32], max: u32) -> Result<()> {
    validate_max(max)?;

    if lengths.iter().all(|&l| l <= max) {
        return Ok(());
    }

    let used = lengths.iter().filter(|&&l| l > 0).count() as u128;
    if used > 1u128 << max {
        return Err(CodecError::Construction(format!(
            "{} symbols cannot fit in codes of at most {} bits",
            used, max
        )));
    }

    for length in lengths.iter_mut() {
        if *length > max {
            *length = max;
        }
    }

    let limit = 1u128 << max;
    let mut kraft: u128 = lengths
        .iter()
        .filter(|&&l| l > 0)
        .map(|&l| kraft_units(l, max))
        .sum();

    while kraft > limit {
        let (index, length) = lengths
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, l)| l > 0 && l < max)
            .max_by_key(|&(_, l)| l)
            .ok_or_else(|| CodecError::Construction("cannot satisfy Kraft inequality".into()))?;

        kraft -= kraft_units(length, max);
        lengths[index] = length + 1;
        kraft += kraft_units(length + 1, max);
    }

    Ok(())
}

fn validate_max(max: u32) -> Result<()> {
    if max == 0 || max > u32::from(Code::MAX_LEN) {
        return Err(CodecError::InvalidConfig(format!(
            "maximum code length {} outside 1..={}",
            max,
            Code::MAX_LEN
        )));
    }
    Ok(())
}

/// A prefix-code tree with per-symbol codes.
#[derive(Debug, Clone)]
pub struct CodeTree {
    /// Slot 0 is reserved, the root lives at [`ROOT`].
    nodes: Vec<CodeNode>,
    /// Code per symbol; empty codes mark symbols without a code.
    codes: Vec<Code>,
    escape: Option<Code>,
    max_code_length: u32,
}

impl CodeTree {
    /// Build a tree by merging weights, limiting lengths to `max_code_length`.
    pub fn from_weights<I>(weights: I, num_symbols: usize, max_code_length: u32) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        let mut lengths = code_lengths_from_weights(weights, num_symbols)?;
        limit_code_lengths(&mut lengths, max_code_length)?;
        Self::from_lengths(&lengths, false, max_code_length)
    }

    /// Build the canonical tree for a table of code lengths.
    ///
    /// `lengths[s]` is the code length of symbol `s`, 0 for no code. With
    /// `with_escape` an escape leaf of length `max_code_length` is added on
    /// the all-zero path.
    pub fn from_lengths(lengths: &[u32], with_escape: bool, max_code_length: u32) -> Result<Self> {
        validate_max(max_code_length)?;

        let mut tiers: Vec<Vec<u32>> = vec![Vec::new(); max_code_length as usize + 1];
        for (symbol, &length) in lengths.iter().enumerate() {
            if length == 0 {
                continue;
            }
            if length > max_code_length {
                return Err(CodecError::CodeTooLong {
                    symbol: symbol as u32,
                    length,
                    max: max_code_length,
                });
            }
            tiers[length as usize].push(symbol as u32);
        }

        let deepest = if with_escape {
            max_code_length
        } else {
            match tiers.iter().rposition(|tier| !tier.is_empty()) {
                Some(depth) if depth > 0 => depth as u32,
                _ => return Err(CodecError::EmptyAlphabet),
            }
        };

        // `next` is the leftmost open slot at the current depth.
        let mut assigned: Vec<(Code, Symbol)> = Vec::new();
        let mut next: u128 = 0;
        let mut depth = deepest;
        for tier in (1..=deepest).rev() {
            let shift = depth - tier;
            next = (next + (1u128 << shift) - 1) >> shift;
            depth = tier;

            let mut members = Vec::with_capacity(tiers[tier as usize].len() + 1);
            if with_escape && tier == max_code_length {
                members.push(Symbol::Escape);
            }
            members.extend(tiers[tier as usize].iter().map(|&s| Symbol::Leaf(s)));

            for symbol in members {
                if next >= 1u128 << tier {
                    return Err(CodecError::Construction(format!(
                        "code lengths over-subscribe depth {}",
                        tier
                    )));
                }
                assigned.push((Code::new(next as u64, tier as u8), symbol));
                next += 1;
            }
        }

        // Insert in left-to-right order so the arena is laid out depth first.
        assigned.sort_by_key(|(code, _)| u128::from(code.bits) << (64 - code.len));

        let mut tree = Self {
            nodes: vec![CodeNode::INTERIOR, CodeNode::INTERIOR],
            codes: vec![Code::default(); lengths.len()],
            escape: None,
            max_code_length,
        };
        for (code, symbol) in assigned {
            tree.insert(code, symbol)?;
        }

        Ok(tree)
    }

    fn insert(&mut self, code: Code, symbol: Symbol) -> Result<()> {
        let mut node = ROOT;
        for i in 0..code.len {
            if self.nodes[node as usize].is_leaf() {
                return Err(CodecError::Construction(format!(
                    "code {} passes through a leaf",
                    code
                )));
            }
            let bit = code.bit(i);
            let mut child = self.nodes[node as usize].child(bit);
            if child == 0 {
                child = self.nodes.len() as u32;
                self.nodes.push(CodeNode::INTERIOR);
                let parent = &mut self.nodes[node as usize];
                if bit {
                    parent.right = child;
                } else {
                    parent.left = child;
                }
            }
            node = child;
        }

        let target = &mut self.nodes[node as usize];
        if target.is_leaf() || target.left != 0 || target.right != 0 {
            return Err(CodecError::Construction(format!(
                "code {} collides with another code",
                code
            )));
        }
        target.symbol = symbol;

        match symbol {
            Symbol::Leaf(s) => self.codes[s as usize] = code,
            Symbol::Escape => self.escape = Some(code),
            Symbol::Interior => {}
        }
        Ok(())
    }

    /// Code for a symbol, `None` if the symbol has no code.
    #[inline]
    pub fn code(&self, symbol: u32) -> Option<Code> {
        self.codes
            .get(symbol as usize)
            .copied()
            .filter(|code| !code.is_empty())
    }

    /// All codes indexed by symbol; empty codes mark symbols without a code.
    pub fn codes(&self) -> &[Code] {
        &self.codes
    }

    /// Code of the escape leaf, if the tree has one.
    #[inline]
    pub fn escape_code(&self) -> Option<Code> {
        self.escape
    }

    /// Code lengths indexed by symbol.
    pub fn code_lengths(&self) -> Vec<u32> {
        self.codes.iter().map(|code| u32::from(code.len)).collect()
    }

    /// Maximum code length the tree was built with.
    pub fn max_code_length(&self) -> u32 {
        self.max_code_length
    }

    /// Number of symbols that have a code.
    pub fn symbol_count(&self) -> usize {
        self.codes.iter().filter(|code| !code.is_empty()).count()
    }

    /// Node at an arena index.
    #[inline]
    pub fn node(&self, index: u32) -> &CodeNode {
        &self.nodes[index as usize]
    }

    /// Follow one bit from `node`; `None` if that child is absent.
    #[inline]
    pub fn step(&self, node: u32, bit: bool) -> Option<u32> {
        match self.nodes[node as usize].child(bit) {
            0 => None,
            child => Some(child),
        }
    }

    /// Number of nodes in the arena, excluding the reserved slot.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Check if the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 2
    }
}
