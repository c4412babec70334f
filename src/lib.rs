//! This crate implements the lower-MAC channel coding chain of TETRA direct mode, as specified
//! in ETSI EN 300 396-2: scrambling, block interleaving, puncturing of the rate-1/4 mother
//! convolutional code to rate 2/3, soft-decision Viterbi decoding, and the (K1+16, K1) CRC block
//! code, together with a schema-driven codec that packs and unpacks PDU bit fields. The receive
//! direction converts the demodulated (type-5) bits of a burst into validated protocol (type-1)
//! bits and named PDU fields; the transmit direction runs the same chain in reverse.
//!
//! All transforms are pure functions over immutable inputs, so they may be called concurrently
//! without synchronization. Derived tables (scrambling sequences, interleaving and puncturing
//! patterns) are computed once, typically inside a [`dmo::SyncBlockCodec`], and shared read-only.

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

pub mod crc;
pub mod dmo;
pub mod interleaver;
pub mod pdu;
pub mod puncture;
pub mod scramble;
pub mod utils;
pub mod viterbi;

pub use crate::interleaver::Interleaver;
pub use crate::pdu::{FieldKind, FieldSpec, FieldValue, PduRecord, PduSchema};
pub use crate::puncture::PuncturingPattern;
pub use crate::scramble::ScramblingSequence;
pub use crate::viterbi::ConvolutionalCode;

/// Custom error type
#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid input error
    #[error("{0}")]
    InvalidInput(String),
    /// Unsupported parameter error
    #[error("{0}")]
    Unsupported(String),
    /// Field value does not fit in its declared bit width
    #[error("{0}")]
    FieldOverflow(String),
    /// Serde read/write error
    #[error("{0}")]
    SerdeReadWriteError(#[from] serde_json::Error),
}

/// Enumeration of binary symbol values
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub enum Bit {
    /// Binary symbol `0`
    Zero = 0,
    /// Binary symbol `1`
    One = 1,
}

impl Bit {
    /// Returns the modulo-2 sum of two bits.
    #[must_use]
    pub fn xor(self, other: Self) -> Self {
        if self == other {
            Bit::Zero
        } else {
            Bit::One
        }
    }
}

/// Soft-bit value carrying no information (maximal uncertainty)
pub const ERASURE: u8 = 0x80;

/// Returns the soft representation of a hard bit: full confidence in either direction.
#[must_use]
pub fn hard_to_soft_bit(bit: Bit) -> u8 {
    match bit {
        Bit::Zero => 0x00,
        Bit::One => 0xFF,
    }
}

/// Returns the hard decision for a soft bit, with the threshold at [`ERASURE`].
#[must_use]
pub fn soft_to_hard_bit(softbit: u8) -> Bit {
    if softbit >= ERASURE {
        Bit::One
    } else {
        Bit::Zero
    }
}

/// Returns the soft representation of a sequence of hard bits.
#[must_use]
pub fn hard_to_soft(bits: &[Bit]) -> Vec<u8> {
    bits.iter().map(|&b| hard_to_soft_bit(b)).collect()
}

/// Returns the hard decisions for a sequence of soft bits.
#[must_use]
pub fn soft_to_hard(softbits: &[u8]) -> Vec<Bit> {
    softbits.iter().map(|&s| soft_to_hard_bit(s)).collect()
}

#[cfg(test)]
mod tests_of_primitives {
    use super::*;
    use Bit::{One, Zero};

    #[test]
    fn test_bit_xor() {
        assert_eq!(Zero.xor(Zero), Zero);
        assert_eq!(Zero.xor(One), One);
        assert_eq!(One.xor(Zero), One);
        assert_eq!(One.xor(One), Zero);
    }

    #[test]
    fn test_hard_to_soft_bit() {
        assert_eq!(hard_to_soft_bit(Zero), 0x00);
        assert_eq!(hard_to_soft_bit(One), 0xFF);
    }

    #[test]
    fn test_soft_to_hard_bit() {
        assert_eq!(soft_to_hard_bit(0x00), Zero);
        assert_eq!(soft_to_hard_bit(0x7F), Zero);
        // An erasure decides toward `One`
        assert_eq!(soft_to_hard_bit(ERASURE), One);
        assert_eq!(soft_to_hard_bit(0xFF), One);
    }

    #[test]
    fn test_round_trip() {
        let bits = [Zero, One, One, Zero, One];
        assert_eq!(soft_to_hard(&hard_to_soft(&bits)), bits);
        assert_eq!(hard_to_soft(&bits), [0x00, 0xFF, 0xFF, 0x00, 0xFF]);
    }
}
