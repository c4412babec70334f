//! # Some useful functions for exercising the coding pipeline
//!
//! The [`bits_from_str`] function parses a bit string into bits; the [`random_bits`] function
//! returns a given number of random bits; the [`soft_awgn_channel`] function returns the soft
//! bytes observed after transmitting bits over a binary-antipodal AWGN channel; and the
//! [`error_count`] function returns the number of errors in a sequence with respect to a
//! reference sequence.
//!
//! # Examples
//!
//! The code below illustrates the usage of the functions in this module.
//! ```
//! use tetra_lmac::{soft_to_hard, utils};
//!
//! let num_bits = 40;
//! let noise_std = 0.1;
//! let bits = utils::random_bits(num_bits);
//! let softbits = utils::soft_awgn_channel(&bits, noise_std);
//! let bits_hat = soft_to_hard(&softbits);
//! let err_count = utils::error_count(&bits_hat, &bits);
//! ```

use rand::Rng;
use rand_distr::StandardNormal;

use crate::Bit;

/// Returns the bits spelled out by the `'0'` and `'1'` characters of a string. All other
/// characters, such as the spaces and newlines used to group long test vectors, are ignored.
#[must_use]
pub fn bits_from_str(s: &str) -> Vec<Bit> {
    s.chars()
        .filter_map(|c| match c {
            '0' => Some(Bit::Zero),
            '1' => Some(Bit::One),
            _ => None,
        })
        .collect()
}

/// Returns given number of random bits.
///
/// # Parameters
///
/// - `num_bits`: Number of random bits to be generated.
///
/// # Returns
///
/// - `bits`: Random bits.
#[must_use]
pub fn random_bits(num_bits: usize) -> Vec<Bit> {
    let mut rng = rand::rng();
    (0 .. num_bits)
        .map(|_| {
            if rng.random_bool(0.5) {
                Bit::One
            } else {
                Bit::Zero
            }
        })
        .collect()
}

/// Returns soft bytes at the output of a binary-antipodal AWGN channel for given input bits.
///
/// # Parameters
///
/// - `bits`: Bits to be transmitted over the channel. `One` maps to the `+1.0` symbol and `Zero`
///   to `-1.0`.
///
/// - `noise_std`: Standard deviation of the additive noise relative to unit symbol amplitude.
///
/// # Returns
///
/// - `softbits`: Soft bytes corresponding to the transmitted bits, the noisy symbols mapped
///   affinely onto `[0x00, 0xFF]` and saturated at the extremes.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn soft_awgn_channel(bits: &[Bit], noise_std: f64) -> Vec<u8> {
    let mut rng = rand::rng();
    bits.iter()
        .map(|b| match b {
            Bit::Zero => -1f64,
            Bit::One => 1f64,
        })
        .map(|x| {
            let noisy = x + noise_std * rng.sample::<f64, _>(StandardNormal);
            (128.0 + 127.0 * noisy).clamp(0.0, 255.0) as u8
        })
        .collect()
}

/// Returns number of errors in a sequence with respect to a reference sequence.
///
/// # Parameters
///
/// - `seq`: Sequence in which errors must be counted.
///
/// - `ref_seq`: Reference sequence to which the given sequence is compared.
///
/// # Returns
///
/// - `err_count`: Number of positions in which the two sequences differ. If they are of different
///   lengths, then the longer sequence is effectively truncated to the length of the shorter one.
pub fn error_count<T: PartialEq>(seq: &[T], ref_seq: &[T]) -> usize {
    ref_seq
        .iter()
        .zip(seq.iter())
        .filter(|&(x, y)| x != y)
        .count()
}
