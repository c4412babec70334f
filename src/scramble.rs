//! Scrambling sequence generation and the type-4/type-5 bit (de)scrambler

use crate::{Bit, Error};

/// Number of bits in a DM colour code
pub const COLOUR_CODE_LEN: usize = 30;

/// Feedback taps of the degree-32 scrambling recurrence (EN 300 396-2, 8.2.5.2)
const TAPS: [usize; 14] = [1, 2, 4, 5, 7, 8, 10, 11, 12, 16, 22, 23, 26, 32];

/// Scrambling sequence derived from a DM colour code
///
/// The sequence depends only on the colour code and the requested length, so one instance can be
/// computed per cell and reused for every burst.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ScramblingSequence {
    bits: Vec<Bit>,
}

impl ScramblingSequence {
    /// Returns the scrambling sequence of a given length for a given colour code.
    ///
    /// # Parameters
    ///
    /// - `length`: Number of sequence bits to generate.
    ///
    /// - `colour_code`: The 30-bit DM colour code seeding the sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if `colour_code` is not exactly 30 bits long.
    ///
    /// # Examples
    ///
    /// ```
    /// use tetra_lmac::{Bit, ScramblingSequence};
    ///
    /// let seq = ScramblingSequence::new(120, &[Bit::Zero; 30])?;
    /// assert_eq!(seq.len(), 120);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(length: usize, colour_code: &[Bit]) -> Result<Self, Error> {
        if colour_code.len() != COLOUR_CODE_LEN {
            return Err(Error::InvalidInput(format!(
                "Invalid colour code length (expected {}, found {})",
                COLOUR_CODE_LEN,
                colour_code.len()
            )));
        }
        // Shift register p(k), initialized to 1, 1 followed by the colour code. The fixed tap
        // set, initial state and modulo-2 sum must not change: the sequence has to match other
        // implementations of the standard bit for bit.
        let mut p = vec![0u8; 32 + length];
        p[0] = 1;
        p[1] = 1;
        for (slot, &bit) in p[2 .. 32].iter_mut().zip(colour_code) {
            *slot = bit as u8;
        }
        for k in 32 .. 32 + length {
            p[k] = TAPS.iter().map(|&t| p[k - t]).sum::<u8>() % 2;
        }
        let bits = p[32 ..]
            .iter()
            .map(|&v| if v == 1 { Bit::One } else { Bit::Zero })
            .collect();
        Ok(Self { bits })
    }

    /// Returns the length of the sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if the sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns the sequence bits.
    #[must_use]
    pub fn bits(&self) -> &[Bit] {
        &self.bits
    }

    /// Scrambles hard bits by XOR with the sequence. The transform is its own inverse, so
    /// descrambling is the same call.
    ///
    /// # Errors
    ///
    /// Returns an error if `bits.len()` is not equal to the sequence length.
    pub fn scramble(&self, bits: &[Bit]) -> Result<Vec<Bit>, Error> {
        self.check_input_len(bits.len())?;
        Ok(bits
            .iter()
            .zip(&self.bits)
            .map(|(&b, &s)| b.xor(s))
            .collect())
    }

    /// Scrambles soft bits: where the sequence bit is one, the soft byte is complemented,
    /// otherwise it passes through. Like the hard variant, this is its own inverse.
    ///
    /// The complement is an approximation of a sign flip under the soft-byte encoding, not an
    /// exact negation; it is kept as-is for compatibility with the hard-bit transform.
    ///
    /// # Errors
    ///
    /// Returns an error if `softbits.len()` is not equal to the sequence length.
    pub fn scramble_soft(&self, softbits: &[u8]) -> Result<Vec<u8>, Error> {
        self.check_input_len(softbits.len())?;
        Ok(softbits
            .iter()
            .zip(&self.bits)
            .map(|(&soft, &s)| match s {
                Bit::Zero => soft,
                Bit::One => soft ^ 0xFF,
            })
            .collect())
    }

    /// Checks that an operand length matches the sequence length.
    fn check_input_len(&self, found: usize) -> Result<(), Error> {
        if found == self.bits.len() {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "Invalid scrambler input length (expected {}, found {})",
                self.bits.len(),
                found
            )))
        }
    }
}

#[cfg(test)]
mod tests_of_scrambling_sequence {
    use super::*;
    use crate::utils::bits_from_str;
    use Bit::{One, Zero};

    /// Sequence for synchronization block 1 with an all-zero colour code (length 120)
    const SB_SCRAMBLING: &str = "101111111111010011110001100110101100000001000111101000101010\
                                 111010100011101000101111000000101111101111110100101010111001";

    #[test]
    fn test_new() {
        // Invalid colour code lengths
        assert!(ScramblingSequence::new(120, &[Zero; 29]).is_err());
        assert!(ScramblingSequence::new(120, &[Zero; 31]).is_err());
        assert!(ScramblingSequence::new(120, &[]).is_err());
        // Reference sequence for the all-zero colour code
        let seq = ScramblingSequence::new(120, &[Zero; 30]).unwrap();
        assert_eq!(seq.len(), 120);
        assert_eq!(seq.bits(), bits_from_str(SB_SCRAMBLING));
        // A different colour code produces a different sequence
        let mut colour_code = [Zero; 30];
        colour_code[0] = One;
        let other = ScramblingSequence::new(120, &colour_code).unwrap();
        assert_ne!(other.bits(), seq.bits());
    }

    #[test]
    fn test_scramble() {
        let seq = ScramblingSequence::new(120, &[Zero; 30]).unwrap();
        // Length mismatch
        assert!(seq.scramble(&[Zero; 119]).is_err());
        // Scrambling all zeros yields the sequence itself
        assert_eq!(seq.scramble(&[Zero; 120]).unwrap(), seq.bits());
        // Self-inverse
        let bits = bits_from_str(&"011010".repeat(20));
        assert_eq!(seq.scramble(&seq.scramble(&bits).unwrap()).unwrap(), bits);
    }

    #[test]
    fn test_scramble_soft() {
        let seq = ScramblingSequence::new(120, &[Zero; 30]).unwrap();
        // Length mismatch
        assert!(seq.scramble_soft(&[0x00; 121]).is_err());
        // Complement exactly where the sequence bit is one
        let softbits = vec![0x21; 120];
        let scrambled = seq.scramble_soft(&softbits).unwrap();
        for (out, &s) in scrambled.iter().zip(seq.bits()) {
            match s {
                Zero => assert_eq!(*out, 0x21),
                One => assert_eq!(*out, 0xDE),
            }
        }
        // Self-inverse
        assert_eq!(seq.scramble_soft(&scrambled).unwrap(), softbits);
    }
}
