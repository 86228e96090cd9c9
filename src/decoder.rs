//! Validation of length sequences and bit-by-bit decoding.

use std::collections::HashMap;
use std::fmt;

use dyn_size_of::GetSize;

use crate::{Code, CodingError, DecodingResult, Encoder, Symbol, MAX_CODE_SIZE};

/// Value stored in the decoding table under a complete or partial code.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct TableEntry {
    /// The decoded symbol, or `None` for a proper prefix of one or more
    /// codewords.
    symbol: Option<Symbol>,
    /// Shortest total length of a codeword below this entry.
    min_size: u8,
    /// Longest total length of a codeword below this entry.
    max_size: u8,
}

/// Decoder for a canonical Huffman code.
///
/// It is built from the same length sequence the encoding side produced.
/// The table is keyed by codes in transmission bit order and also answers
/// queries for incomplete codes, reporting how many further bits a matching
/// codeword can take. Instances are immutable once constructed.
#[derive(Debug)]
pub struct Decoder {
    table: HashMap<Code, TableEntry>,
    sizes: Box<[u8]>,
    /// Length of the shortest codeword, 0 for an empty coding.
    min_size: u8,
    /// Length of the longest codeword, 0 for an empty coding.
    max_size: u8,
}

impl Decoder {
    /// Constructs the decoder for the given sequence of codeword lengths,
    /// one per symbol, with 0 marking symbols that get no code.
    ///
    /// The sequence must describe a *complete* prefix code: the codewords
    /// have to fill a binary tree of depth `max_size` exactly. Sequences
    /// with zero live symbols, or with a single live symbol of length 1,
    /// are the permitted degenerate exceptions. Anything else fails with
    /// [`CodingError::Oversubscribed`] or [`CodingError::Undersubscribed`],
    /// and lengths over [`MAX_CODE_SIZE`] fail with
    /// [`CodingError::InvalidLength`].
    pub fn from_sizes(sizes: &[u8]) -> Result<Self, CodingError> {
        let mut count = [0u32; MAX_CODE_SIZE as usize + 1];
        let mut live = 0u32;
        let mut min_size = 0u8;
        let mut max_size = 0u8;
        for &size in sizes {
            if size == 0 { continue; }
            if size > MAX_CODE_SIZE {
                return Err(CodingError::InvalidLength { got: size, max: MAX_CODE_SIZE });
            }
            if live == 0 {
                min_size = size;
                max_size = size;
            } else if size < min_size {
                min_size = size;
            } else if size > max_size {
                max_size = size;
            }
            count[size as usize] += 1;
            live += 1;
        }

        if live == 0 {
            return Ok(Self { table: HashMap::new(), sizes: sizes.into(), min_size: 0, max_size: 0 });
        }

        // First canonical code value of each length, per the incremental
        // formula of RFC 1951, section 3.2.2. The accumulator is wide enough
        // not to wrap for any length multiset.
        let mut first_code = [0u32; MAX_CODE_SIZE as usize + 1];
        let mut consumed = 0u64;
        for size in min_size..=max_size {
            consumed = (consumed + count[size as usize - 1] as u64) << 1;
            first_code[size as usize] = consumed as u32;
        }
        consumed += count[max_size as usize] as u64;

        let available = 1u64 << max_size;
        if consumed == 1 && max_size == 1 {
            // a lone symbol with a 1-bit code, the only permitted
            // non-empty incomplete coding
        } else if consumed > available {
            return Err(CodingError::Oversubscribed { available, used: consumed });
        } else if consumed < available {
            return Err(CodingError::Undersubscribed { available, used: consumed });
        }

        let mut table = HashMap::with_capacity(table_capacity(live));
        for (symbol, &size) in sizes.iter().enumerate() {
            if size == 0 { continue; }
            let bits = first_code[size as usize];
            first_code[size as usize] += 1;
            fill_table(&mut table, symbol as Symbol, Code::new_reversed(size, bits));
        }

        Ok(Self { table, sizes: sizes.into(), min_size, max_size })
    }

    /// Constructs the decoder that mirrors `encoder`, validating the
    /// encoder's length sequence in full.
    pub fn from_encoder(encoder: &Encoder) -> Result<Self, CodingError> {
        Self::from_sizes(&encoder.size_by_symbol())
    }

    /// Looks up `code`, the first bits of a codeword in transmission order.
    ///
    /// Returns:
    /// - [`DecodingResult::Value`] if `code` is a complete codeword;
    /// - [`DecodingResult::Incomplete`] if `code` is a proper prefix of at
    ///   least one codeword; the bounds are total lengths, so at least
    ///   `min_size - code.len` and at most `max_size - code.len` further
    ///   bits decide the symbol;
    /// - [`DecodingResult::Invalid`] if no codeword starts with `code`.
    pub fn decode(&self, code: Code) -> DecodingResult {
        match self.table.get(&code) {
            None => DecodingResult::Invalid,
            Some(&TableEntry { symbol: Some(symbol), .. }) => DecodingResult::Value(symbol),
            Some(&TableEntry { min_size, max_size, .. }) =>
                DecodingResult::Incomplete { min_size, max_size },
        }
    }

    /// Decodes a single symbol from `bits`, consuming as many as needed.
    ///
    /// Returns [`DecodingResult::Incomplete`] if the iterator is exhausted
    /// before a codeword is complete, and [`DecodingResult::Invalid`] as
    /// soon as the consumed bits can no longer start a codeword.
    pub fn decode_next<I>(&self, bits: &mut I) -> DecodingResult
        where I: Iterator<Item = bool>
    {
        let mut code = Code::default();
        loop {
            let result = self.decode(code);
            if let DecodingResult::Incomplete { .. } = result {
                if let Some(bit) = bits.next() {
                    code.push(bit);
                    continue;
                }
            }
            return result;
        }
    }

    /// Length of the shortest codeword, 0 for an empty coding.
    #[inline] pub fn min_size(&self) -> u8 { self.min_size }

    /// Length of the longest codeword, 0 for an empty coding.
    #[inline] pub fn max_size(&self) -> u8 { self.max_size }

    /// Returns the size of the alphabet, including symbols without a code.
    #[inline] pub fn num_symbols(&self) -> usize { self.sizes.len() }

    /// Returns the sequence of codeword lengths the decoder was built from.
    #[inline] pub fn size_by_symbol(&self) -> &[u8] { &self.sizes }
}

impl Default for Decoder {
    /// Returns the empty coding, which decodes nothing.
    fn default() -> Self {
        Self { table: HashMap::new(), sizes: Box::default(), min_size: 0, max_size: 0 }
    }
}

impl fmt::Display for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(canonical Huffman decoder over {} symbols, code lengths {}..{})",
               self.sizes.len(), self.min_size, self.max_size)
    }
}

impl GetSize for Decoder {
    fn size_bytes_dyn(&self) -> usize {
        // the table is approximated as a flat array of slots with one
        // control byte each
        self.table.capacity() * (std::mem::size_of::<(Code, TableEntry)>() + 1)
            + self.sizes.size_bytes_dyn()
    }
    const USES_DYN_MEM: bool = true;
}

/// The filled table holds roughly n*log2(n) entries for n codewords.
#[inline] fn table_capacity(live: u32) -> usize {
    live as usize * (u32::BITS - live.leading_zeros()) as usize
}

/// Inserts `code` (in transmission order) for `symbol`, together with a
/// partial entry for every proper bit-prefix of it.
///
/// The walk goes upward one bit at a time. At each prefix the summary is
/// merged with the stored summary of the sibling subtree, and the walk
/// stops as soon as a freshly computed summary matches what the table
/// already holds, since every shorter prefix is then up to date as well.
fn fill_table(table: &mut HashMap<Code, TableEntry>, symbol: Symbol, mut code: Code) {
    let mut entry = TableEntry { symbol: Some(symbol), min_size: code.len, max_size: code.len };
    table.insert(code, entry);

    while code.len != 0 {
        // the sibling shares all bits but the last read one, which in
        // transmission order is the most significant
        let last_bit = 1u32 << (code.len - 1);
        code.bits ^= last_bit;
        let mut merged = TableEntry { symbol: None, ..entry };
        if let Some(sibling) = table.get(&code) {
            merged.min_size = merged.min_size.min(sibling.min_size);
            merged.max_size = merged.max_size.max(sibling.max_size);
        }
        code.bits &= !last_bit;
        code.len -= 1;

        if table.get(&code) == Some(&merged) {
            break;
        }
        table.insert(code, merged);
        entry = merged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_decoder() -> Decoder {
        Decoder::from_sizes(&[4, 4, 3, 3, 3, 1]).unwrap()
    }

    #[test]
    fn complete_partial_and_invalid_lookups() {
        let decoder = test_decoder();
        assert_eq!(decoder.min_size(), 1);
        assert_eq!(decoder.max_size(), 4);

        // queries are in transmission order: the first bit read is the
        // least significant one
        let lookups = [
            (Code::new(0, 0b0), DecodingResult::Incomplete { min_size: 1, max_size: 4 }),
            (Code::new(1, 0b0), DecodingResult::Value(5)),
            (Code::new(1, 0b1), DecodingResult::Incomplete { min_size: 3, max_size: 4 }),
            (Code::new(2, 0b01), DecodingResult::Incomplete { min_size: 3, max_size: 3 }),
            (Code::new(2, 0b11), DecodingResult::Incomplete { min_size: 3, max_size: 4 }),
            (Code::new(3, 0b001), DecodingResult::Value(2)),
            (Code::new(3, 0b011), DecodingResult::Value(4)),
            (Code::new(3, 0b101), DecodingResult::Value(3)),
            (Code::new(3, 0b111), DecodingResult::Incomplete { min_size: 4, max_size: 4 }),
            (Code::new(4, 0b0111), DecodingResult::Value(0)),
            (Code::new(4, 0b1111), DecodingResult::Value(1)),
            (Code::new(2, 0b10), DecodingResult::Invalid),
            (Code::new(3, 0b010), DecodingResult::Invalid),
            (Code::new(5, 0b01111), DecodingResult::Invalid),
        ];
        for (code, expected) in lookups {
            assert_eq!(decoder.decode(code), expected, "for code {}", code);
        }
    }

    #[test]
    fn sizes_survive_construction() {
        let decoder = test_decoder();
        assert_eq!(decoder.size_by_symbol(), [4, 4, 3, 3, 3, 1]);
        assert_eq!(decoder.num_symbols(), 6);
    }

    #[test]
    fn single_symbol_coding() {
        let decoder = Decoder::from_sizes(&[1]).unwrap();
        assert_eq!(decoder.min_size(), 1);
        assert_eq!(decoder.max_size(), 1);
        assert_eq!(decoder.decode(Code::new(1, 0)), DecodingResult::Value(0));
        assert_eq!(decoder.decode(Code::new(1, 1)), DecodingResult::Invalid);
        assert_eq!(decoder.decode(Code::default()),
                   DecodingResult::Incomplete { min_size: 1, max_size: 1 });
    }

    #[test]
    fn empty_coding() {
        let decoder = Decoder::from_sizes(&[]).unwrap();
        assert_eq!(decoder.decode(Code::default()), DecodingResult::Invalid);
        assert_eq!(decoder.decode(Code::new(1, 0)), DecodingResult::Invalid);
        assert_eq!(decoder.min_size(), 0);
        assert_eq!(decoder.max_size(), 0);

        // unused symbols alone also make an empty coding, but keep the sizes
        let decoder = Decoder::from_sizes(&[0, 0, 0]).unwrap();
        assert_eq!(decoder.size_by_symbol(), [0, 0, 0]);
        assert_eq!(decoder.decode(Code::new(1, 0)), DecodingResult::Invalid);
    }

    #[test]
    fn oversubscribed_sizes_are_rejected() {
        assert_eq!(Decoder::from_sizes(&[1, 1, 1]).unwrap_err(),
                   CodingError::Oversubscribed { available: 2, used: 3 });
        assert_eq!(Decoder::from_sizes(&[1, 1, 2]).unwrap_err(),
                   CodingError::Oversubscribed { available: 4, used: 5 });
    }

    #[test]
    fn undersubscribed_sizes_are_rejected() {
        assert_eq!(Decoder::from_sizes(&[2, 2]).unwrap_err(),
                   CodingError::Undersubscribed { available: 4, used: 2 });
        assert_eq!(Decoder::from_sizes(&[1, 3]).unwrap_err(),
                   CodingError::Undersubscribed { available: 8, used: 5 });
        // a single symbol needs a 1-bit code, longer ones stay degenerate
        assert!(matches!(Decoder::from_sizes(&[2]).unwrap_err(),
                         CodingError::Undersubscribed { .. }));
    }

    #[test]
    fn overlong_sizes_are_rejected() {
        assert_eq!(Decoder::from_sizes(&[16]).unwrap_err(),
                   CodingError::InvalidLength { got: 16, max: MAX_CODE_SIZE });
    }

    #[test]
    fn decoding_a_bit_stream() {
        let decoder = test_decoder();
        // symbols 2, 5, 0 emitted in transmission order
        let stream = [true, false, false, false, true, true, true, false];
        let mut bits = stream.iter().copied();
        assert_eq!(decoder.decode_next(&mut bits), DecodingResult::Value(2));
        assert_eq!(decoder.decode_next(&mut bits), DecodingResult::Value(5));
        assert_eq!(decoder.decode_next(&mut bits), DecodingResult::Value(0));
        assert!(matches!(decoder.decode_next(&mut bits),
                         DecodingResult::Incomplete { .. }));

        // in a complete coding every bit pattern extends some codeword, so a
        // stream can only fail against an incomplete (degenerate) coding
        let lone = Decoder::from_sizes(&[1]).unwrap();
        let mut bits = [true].iter().copied();
        assert_eq!(lone.decode_next(&mut bits), DecodingResult::Invalid);
    }

    #[test]
    fn display() {
        assert_eq!(test_decoder().to_string(),
                   "(canonical Huffman decoder over 6 symbols, code lengths 1..4)");
    }
}
