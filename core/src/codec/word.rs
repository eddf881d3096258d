//! Fixed-width register words.
//!
//! Every value written to the TCU goes through [`encode`], which yields a
//! [`RegisterWord`]. The raw bytes, the HDL literal and the shell escape
//! string are all renderings of that one byte sequence.

use crate::prelude::{CodecError, CodecResult, Endianness};
use std::fmt::{self, Write as _};

/// Widest field the codec handles, in bytes.
pub const MAX_WIDTH: usize = 8;

/// An encoded register value, or a concatenation of several.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RegisterWord {
    bytes: Vec<u8>,
}

impl RegisterWord {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Appends another word, used to lay out multi-field blocks.
    pub fn extend(&mut self, other: &RegisterWord) {
        self.bytes.extend_from_slice(&other.bytes);
    }

    /// VHDL bit-string literal, e.g. `x"0002"`.
    pub fn to_hdl_literal(&self) -> String {
        format!("x\"{}\"", self.to_hex())
    }

    /// Escaped form accepted by `echo -en`, e.g. `\x00\x02`.
    pub fn to_escaped(&self) -> String {
        self.bytes.iter().fold(String::new(), |mut out, byte| {
            let _ = write!(out, "\\x{:02x}", byte);
            out
        })
    }

    /// Lower-case hex digits with no prefix.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().fold(String::new(), |mut out, byte| {
            let _ = write!(out, "{:02x}", byte);
            out
        })
    }
}

impl fmt::Display for RegisterWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hdl_literal())
    }
}

impl AsRef<[u8]> for RegisterWord {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

fn check_width(width_bytes: usize) -> CodecResult<()> {
    if width_bytes == 0 || width_bytes % 2 != 0 || width_bytes > MAX_WIDTH {
        return Err(CodecError::InvalidWidth(width_bytes));
    }
    Ok(())
}

/// Encodes `value` into exactly `width_bytes` bytes.
///
/// `register` only labels the error when the value does not fit.
pub fn encode(
    register: &str,
    value: u64,
    width_bytes: usize,
    endianness: Endianness,
) -> CodecResult<RegisterWord> {
    check_width(width_bytes)?;
    if width_bytes < MAX_WIDTH && value >> (8 * width_bytes) != 0 {
        return Err(CodecError::ValueOutOfRange {
            register: register.to_string(),
            value,
            width: width_bytes,
        });
    }

    let mut bytes = value.to_be_bytes()[MAX_WIDTH - width_bytes..].to_vec();
    if endianness == Endianness::Little {
        bytes.reverse();
    }
    Ok(RegisterWord { bytes })
}

/// Decodes a byte slice produced by [`encode`] with the same endianness.
pub fn decode(bytes: &[u8], endianness: Endianness) -> CodecResult<u64> {
    check_width(bytes.len())?;
    let fold = |acc: u64, byte: &u8| (acc << 8) | u64::from(*byte);
    let value = match endianness {
        Endianness::Big => bytes.iter().fold(0, fold),
        Endianness::Little => bytes.iter().rev().fold(0, fold),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn endianness_orders_bytes() {
        let big = encode("test", 0x1234, 2, Endianness::Big).unwrap();
        let little = encode("test", 0x1234, 2, Endianness::Little).unwrap();
        assert_eq!(big.as_bytes(), &[0x12, 0x34]);
        assert_eq!(little.as_bytes(), &[0x34, 0x12]);
    }

    #[test]
    fn narrow_values_are_zero_padded_on_the_msb_side() {
        let word = encode("num_repeats", 2, 4, Endianness::Big).unwrap();
        assert_eq!(word.as_bytes(), &[0, 0, 0, 2]);
        let word = encode("num_repeats", 2, 4, Endianness::Little).unwrap();
        assert_eq!(word.as_bytes(), &[2, 0, 0, 0]);
    }

    #[test]
    fn renderings_share_the_same_bytes() {
        let word = encode("num_pulses", 2, 2, Endianness::Big).unwrap();
        assert_eq!(word.to_hdl_literal(), "x\"0002\"");
        assert_eq!(word.to_escaped(), "\\x00\\x02");
        assert_eq!(word.to_string(), word.to_hdl_literal());
    }

    #[test]
    fn value_that_does_not_fit_is_rejected() {
        assert_eq!(
            encode("pre_pulse", 0x1_0000, 2, Endianness::Big),
            Err(CodecError::ValueOutOfRange {
                register: "pre_pulse".into(),
                value: 0x1_0000,
                width: 2,
            })
        );
        assert!(encode("pre_pulse", 0xffff, 2, Endianness::Big).is_ok());
        assert!(encode("wide", u64::MAX, 8, Endianness::Little).is_ok());
    }

    #[test]
    fn odd_or_zero_widths_are_rejected() {
        assert_eq!(
            encode("test", 1, 3, Endianness::Big),
            Err(CodecError::InvalidWidth(3))
        );
        assert_eq!(
            encode("test", 0, 0, Endianness::Big),
            Err(CodecError::InvalidWidth(0))
        );
        assert!(decode(&[1, 2, 3], Endianness::Big).is_err());
    }

    #[test]
    fn decode_inverts_encode_at_the_range_edges() {
        for endianness in [Endianness::Big, Endianness::Little] {
            for (width, max) in [(2usize, 0xffffu64), (4, 0xffff_ffff)] {
                for value in [0, 1, max - 1, max] {
                    let word = encode("edge", value, width, endianness).unwrap();
                    assert_eq!(decode(word.as_bytes(), endianness).unwrap(), value);
                }
            }
        }
    }

    #[test]
    fn decode_inverts_encode_for_sampled_values() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..512 {
            let endianness = if rng.gen_bool(0.5) {
                Endianness::Big
            } else {
                Endianness::Little
            };
            let width = if rng.gen_bool(0.5) { 2 } else { 4 };
            let value = rng.gen_range(0..(1u64 << (8 * width)));
            let word = encode("sampled", value, width, endianness).unwrap();
            assert_eq!(word.len(), width);
            assert_eq!(decode(word.as_bytes(), endianness).unwrap(), value);
        }
    }
}
