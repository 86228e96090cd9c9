#![doc = include_str!("../README.md")]

mod code;
pub use code::Code;

mod error;
pub use error::CodingError;

mod frequencies;
pub use frequencies::Frequencies;

mod encoder;
pub use encoder::Encoder;

mod decoder;
pub use decoder::Decoder;

mod io;
pub use io::{read_sizes, write_sizes, write_sizes_bytes};

/// Maximum number of bits in a single codeword.
///
/// Matches the limit of DEFLATE-family wire formats; length sequences
/// declaring longer codewords are rejected with [`CodingError::InvalidLength`].
pub const MAX_CODE_SIZE: u8 = 15;

/// Index of a symbol in the coded alphabet.
///
/// Alphabets are contiguous and 0-based; symbols are only meaningful
/// relative to the alphabet size given at construction.
pub type Symbol = u32;

/// Result of looking up a (possibly incomplete) codeword, returned by
/// [`Decoder::decode`](crate::Decoder::decode).
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum DecodingResult {
    /// The queried bits form a complete codeword of this symbol.
    Value(Symbol),
    /// The queried bits are a proper prefix of at least one codeword.
    /// All codewords starting with them are between `min_size` and
    /// `max_size` bits long in total.
    Incomplete {
        /// Shortest total length of a codeword with the queried prefix.
        min_size: u8,
        /// Longest total length of a codeword with the queried prefix.
        max_size: u8,
    },
    /// No codeword starts with the queried bits; reading further bits
    /// cannot recover.
    Invalid,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Whether the transmission-order code `a` is a bit-prefix of `b`.
    fn is_prefix(a: Code, b: Code) -> bool {
        a.len < b.len && b.bits & ((1u32 << a.len) - 1) == a.bits
    }

    #[test]
    fn codes_are_prefix_free() {
        let encoder = Encoder::from_frequencies(6, &[5, 9, 12, 13, 16, 45]).unwrap();
        let codes: Vec<Code> = encoder.codes().map(|(_, c)| c.reversed()).collect();
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert!(!is_prefix(a, b), "{} is a prefix of {}", a, b);
                }
            }
        }
    }

    #[test]
    fn code_space_is_complete() {
        let sizes = [4u8, 4, 3, 3, 3, 1];
        let decoder = Decoder::from_sizes(&sizes).unwrap();
        let max = decoder.max_size();
        let consumed: u64 = sizes.iter().map(|&size| 1u64 << (max - size)).sum();
        assert_eq!(consumed, 1u64 << max);
    }

    #[test]
    fn first_code_of_each_size_counts_shorter_codes() {
        // sizes [2, 3, 3, 3, 3, 2]: two 2-bit codes, four 3-bit ones;
        // the first 3-bit code is (0 + 2) << 1 = 4.
        let encoder = Encoder::from_sizes(&[2, 3, 3, 3, 3, 2]).unwrap();
        assert_eq!(encoder.code(0), Code::new(2, 0b00));
        assert_eq!(encoder.code(5), Code::new(2, 0b01));
        assert_eq!(encoder.code(1), Code::new(3, 0b100));
        assert_eq!(encoder.code(4), Code::new(3, 0b111));
    }

    #[test]
    fn encoder_decoder_round_trip() {
        let sizes = [4u8, 4, 3, 3, 3, 1];
        let decoder = Decoder::from_sizes(&sizes).unwrap();
        let encoder = Encoder::from_decoder(&decoder).unwrap();
        assert_eq!(encoder.size_by_symbol().as_ref(), sizes);
        let mirrored = Decoder::from_encoder(&encoder).unwrap();
        assert_eq!(mirrored.size_by_symbol(), sizes);

        for (symbol, code) in encoder.codes() {
            assert_eq!(decoder.decode(code.reversed()), DecodingResult::Value(symbol));
        }
    }

    #[test]
    fn decoding_agrees_with_encoding_under_all_prefixes() {
        let encoder = Encoder::from_frequencies(6, &[5, 9, 12, 13, 16, 45]).unwrap();
        let decoder = Decoder::from_encoder(&encoder).unwrap();
        for (symbol, code) in encoder.codes() {
            let sent = code.reversed();
            assert_eq!(decoder.decode(sent), DecodingResult::Value(symbol));
            for len in 0..sent.len {
                let prefix = Code::new(len, sent.bits);
                match decoder.decode(prefix) {
                    DecodingResult::Incomplete { min_size, max_size } => {
                        assert!(min_size <= sent.len && sent.len <= max_size);
                    }
                    other => panic!("prefix {} of {} decoded to {:?}", prefix, sent, other),
                }
            }
        }
    }
}
