//! Construction of codings and the symbol-to-code table.

use std::borrow::Borrow;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use dyn_size_of::GetSize;

use crate::{Code, CodingError, Decoder, Frequencies, Symbol, MAX_CODE_SIZE};

/// Encoder for a canonical Huffman code.
///
/// It owns the complete symbol-to-code table; the codes are stored in
/// natural bit order and [`Code::reversed`] converts a looked-up code to
/// transmission order. Instances are immutable once constructed.
#[derive(Debug)]
pub struct Encoder {
    /// Codes in natural bit order, indexed by symbol. A zero-length code
    /// marks a symbol that takes no part in the coding.
    codes: Box<[Code]>,
    /// Length of the shortest codeword, 0 for an empty coding.
    min_size: u8,
    /// Length of the longest codeword, 0 for an empty coding.
    max_size: u8,
}

impl Encoder {
    /// Constructs the coding for the given symbol frequencies.
    ///
    /// `num_symbols` is the size of the alphabet; `frequencies[s]` is the
    /// number of occurrences of symbol `s`, with missing entries counting as
    /// zero. Symbols with zero frequency get no code. Codeword lengths are
    /// derived by greedily merging the two lightest subtrees; frequency sums
    /// saturate at `u32::MAX` instead of wrapping.
    ///
    /// Returns [`CodingError::InvalidLength`] if the derivation needs
    /// codewords longer than [`MAX_CODE_SIZE`] bits.
    ///
    /// # Panics
    /// Panics if `frequencies` has more entries than `num_symbols`, or if
    /// the alphabet is too large for [`Symbol`] to index.
    pub fn from_frequencies(num_symbols: usize, frequencies: &[u32]) -> Result<Self, CodingError> {
        assert!(num_symbols <= Symbol::MAX as usize,
                "alphabet of {} symbols cannot be indexed", num_symbols);
        assert!(frequencies.len() <= num_symbols,
                "{} frequencies given for an alphabet of {} symbols",
                frequencies.len(), num_symbols);
        let live: Vec<(u32, Symbol)> = frequencies.iter().enumerate()
            .filter_map(|(symbol, &freq)| (freq != 0).then(|| (freq, symbol as Symbol)))
            .collect();

        if live.len() <= 2 {
            // No complete tree exists for fewer than 2 live symbols, and for
            // exactly 2 the tree is skipped: 1-bit codes in symbol order.
            let mut codes = vec![Code::default(); num_symbols].into_boxed_slice();
            for (index, &(_, symbol)) in live.iter().enumerate() {
                codes[symbol as usize] = Code::new(1, index as u32);
            }
            let size = if live.is_empty() { 0 } else { 1 };
            return Ok(Self { codes, min_size: size, max_size: size });
        }

        Self::from_sizes(&derive_sizes(num_symbols, &live))
    }

    /// Counts the occurrences of all symbols exposed by `iter` and
    /// constructs the coding for the obtained frequencies.
    pub fn from_iter<Iter>(iter: Iter) -> Result<Self, CodingError>
        where Iter: IntoIterator, Iter::Item: Borrow<Symbol>
    {
        let freq = Vec::<u32>::with_counted_all(iter);
        Self::from_frequencies(freq.num_symbols(), freq.frequencies())
    }

    /// Constructs the coding from an explicit sequence of codeword lengths,
    /// one per symbol, with 0 marking symbols that get no code.
    ///
    /// The bit assignment is fully determined by the lengths: symbols are
    /// taken in (length, symbol) order and receive consecutive code values,
    /// shifted left whenever the length grows. Fails with
    /// [`CodingError::InvalidLength`] or [`CodingError::Oversubscribed`]
    /// when no prefix code with these lengths exists.
    pub fn from_sizes(sizes: &[u8]) -> Result<Self, CodingError> {
        let (codes, min_size, max_size) = assign_canonical(sizes)?;
        Ok(Self { codes, min_size, max_size })
    }

    /// Constructs the encoder that mirrors `decoder`, re-deriving every code
    /// from the decoder's length sequence.
    pub fn from_decoder(decoder: &Decoder) -> Result<Self, CodingError> {
        Self::from_sizes(decoder.size_by_symbol())
    }

    /// Returns the code assigned to `symbol`, in natural bit order.
    ///
    /// The returned code is empty both for symbols with no assigned code
    /// and for symbols outside the alphabet.
    #[inline] pub fn code(&self, symbol: Symbol) -> Code {
        self.codes.get(symbol as usize).copied().unwrap_or_default()
    }

    /// Length of the shortest codeword, 0 for an empty coding.
    #[inline] pub fn min_size(&self) -> u8 { self.min_size }

    /// Length of the longest codeword, 0 for an empty coding.
    #[inline] pub fn max_size(&self) -> u8 { self.max_size }

    /// Returns the size of the alphabet, including symbols without a code.
    #[inline] pub fn num_symbols(&self) -> usize { self.codes.len() }

    /// Returns the length of each symbol's codeword, 0 for unused symbols.
    ///
    /// This sequence alone determines the coding bit for bit, so it is the
    /// only state that has to reach the decoding side.
    pub fn size_by_symbol(&self) -> Box<[u8]> {
        self.codes.iter().map(|code| code.len).collect()
    }

    /// Returns an iterator over the `(symbol, code)` pairs of all symbols
    /// with an assigned code, in symbol order.
    pub fn codes(&self) -> impl Iterator<Item = (Symbol, Code)> + '_ {
        self.codes.iter().enumerate()
            .filter(|(_, code)| code.len != 0)
            .map(|(symbol, &code)| (symbol as Symbol, code))
    }
}

impl Default for Encoder {
    /// Returns the empty coding.
    fn default() -> Self {
        Self { codes: Box::default(), min_size: 0, max_size: 0 }
    }
}

impl fmt::Display for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(canonical Huffman encoder over {} symbols, code lengths {}..{})",
               self.codes.len(), self.min_size, self.max_size)
    }
}

impl GetSize for Encoder {
    fn size_bytes_dyn(&self) -> usize { self.codes.size_bytes_dyn() }
    const USES_DYN_MEM: bool = true;
}

/// Node of the code-derivation tree, stored in an index-addressed arena.
enum TreeNode {
    /// An alphabet symbol.
    Leaf(Symbol),
    /// An inner node joining the two lightest subtrees of its time.
    Fork(usize, usize),
}

/// Heap entry ordered by `(freq, rank)` ascending.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
    freq: u32,
    /// Tie-break: the symbol index for leaves; forks rank after every
    /// symbol of equal frequency, in creation order.
    rank: u64,
    /// Arena index of the subtree root.
    node: usize,
}

/// Derives the codeword length of every live symbol by greedily merging the
/// two lightest subtrees until a single root remains. `live` must hold at
/// least 3 entries in ascending symbol order.
fn derive_sizes(num_symbols: usize, live: &[(u32, Symbol)]) -> Vec<u8> {
    let mut arena: Vec<TreeNode> = live.iter().map(|&(_, symbol)| TreeNode::Leaf(symbol)).collect();
    let mut heap: BinaryHeap<Reverse<HeapEntry>> = live.iter().enumerate()
        .map(|(node, &(freq, symbol))| Reverse(HeapEntry { freq, rank: symbol as u64, node }))
        .collect();

    let mut forks_made = 0u64;
    while heap.len() > 1 {
        let Reverse(first) = heap.pop().unwrap();
        let Reverse(second) = heap.pop().unwrap();
        let node = arena.len();
        arena.push(TreeNode::Fork(first.node, second.node));
        heap.push(Reverse(HeapEntry {
            // clamp on overflow, never wrap
            freq: first.freq.saturating_add(second.freq),
            rank: (1u64 << 32) + forks_made,
            node,
        }));
        forks_made += 1;
    }
    let root = heap.pop().unwrap().0.node;

    // The tree is not yet the canonical one, but its leaf depths already are
    // the canonical codeword lengths. Traversal order does not matter.
    let mut sizes = vec![0u8; num_symbols];
    let mut stack = vec![(root, 0u8)];
    while let Some((node, depth)) = stack.pop() {
        match arena[node] {
            TreeNode::Leaf(symbol) => sizes[symbol as usize] = depth,
            TreeNode::Fork(left, right) => {
                // depths saturate; anything over MAX_CODE_SIZE is rejected later
                stack.push((left, depth.saturating_add(1)));
                stack.push((right, depth.saturating_add(1)));
            }
        }
    }
    sizes
}

/// Assigns canonical code values to all symbols with a nonzero length and
/// returns the code table together with the shortest and longest length.
fn assign_canonical(sizes: &[u8]) -> Result<(Box<[Code]>, u8, u8), CodingError> {
    let mut live = Vec::with_capacity(sizes.len());
    for (symbol, &size) in sizes.iter().enumerate() {
        if size == 0 { continue; }
        if size > MAX_CODE_SIZE {
            return Err(CodingError::InvalidLength { got: size, max: MAX_CODE_SIZE });
        }
        live.push((size, symbol as Symbol));
    }

    let mut codes = vec![Code::default(); sizes.len()].into_boxed_slice();
    if live.is_empty() {
        return Ok((codes, 0, 0));
    }
    live.sort_unstable();
    let min_size = live[0].0;
    let max_size = live[live.len() - 1].0;

    let mut next_code = 0u32;
    let mut last_size = min_size;
    for &(size, symbol) in &live {
        if size > last_size {
            next_code <<= size - last_size;
            last_size = size;
        }
        if next_code >> size != 0 {
            return Err(CodingError::Oversubscribed {
                available: 1u64 << size,
                used: next_code as u64 + 1,
            });
        }
        codes[symbol as usize] = Code::new(size, next_code);
        next_code += 1;
    }
    Ok((codes, min_size, max_size))
}
