//! Puncturing of the mother convolutional code and depuncturing with erasure fill

use itertools::Itertools;

use crate::{Error, ERASURE};

/// Trailing erasure padding that lets the Viterbi decoder flush its trellis
pub const DECODER_FLUSH_PAD: usize = 16;

/// Offsets kept within each 8-bit mother-code group at rate 2/3 (EN 300 396-2, 8.2.3.3)
const RATE_2_3_OFFSETS: [usize; 3] = [1, 2, 5];

/// Mapping from punctured (type-3) positions to mother-code (type-2) positions
///
/// Positions of the unpunctured codeword not present in the mapping carry no transmitted bit and
/// are filled with erasures on the receive path.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PuncturingPattern {
    /// Length of the unpunctured mother-code codeword
    unpunctured_len: usize,
    /// Mother-code position for each punctured position
    target_indices: Vec<usize>,
}

impl PuncturingPattern {
    /// Returns the puncturing pattern for a given punctured length and code rate.
    ///
    /// # Parameters
    ///
    /// - `punctured_len`: Number of punctured (transmitted) bits, `K3`.
    ///
    /// - `rate_num`, `rate_den`: Code rate as a fraction. Only rate 2/3 is defined by the
    ///   standard's lower MAC.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate is not 2/3, or if `punctured_len` does not map into the
    /// unpunctured codeword (it must be a multiple of 3).
    ///
    /// # Examples
    ///
    /// ```
    /// use tetra_lmac::PuncturingPattern;
    ///
    /// let pattern = PuncturingPattern::new(120, 2, 3)?;
    /// assert_eq!(pattern.unpunctured_len(), 320);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(punctured_len: usize, rate_num: u32, rate_den: u32) -> Result<Self, Error> {
        if (rate_num, rate_den) != (2, 3) {
            return Err(Error::Unsupported(format!(
                "Puncturing rate {rate_num}/{rate_den} is not defined by the standard (only 2/3)"
            )));
        }
        let k2 = punctured_len * 2 / 3;
        let unpunctured_len = 4 * k2;
        // 1-indexed positions j map to k = 8 * ((j-1) div 3) + P[j - 3 * ((j-1) div 3)], stored
        // 0-indexed
        let target_indices: Vec<usize> = (1 ..= punctured_len)
            .map(|j| {
                let group = (j - 1) / 3;
                8 * group + RATE_2_3_OFFSETS[j - 3 * group - 1] - 1
            })
            .collect();
        if !target_indices.iter().all_unique()
            || target_indices.iter().any(|&k| k >= unpunctured_len)
        {
            return Err(Error::InvalidInput(format!(
                "Punctured length {punctured_len} does not map into {unpunctured_len} \
                 mother-code bits"
            )));
        }
        Ok(Self {
            unpunctured_len,
            target_indices,
        })
    }

    /// Returns the punctured (transmitted) length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.target_indices.len()
    }

    /// Returns `true` if the pattern is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target_indices.is_empty()
    }

    /// Returns the length of the unpunctured mother-code codeword.
    #[must_use]
    pub fn unpunctured_len(&self) -> usize {
        self.unpunctured_len
    }

    /// Returns the length of a depunctured soft-bit block, flush padding included.
    #[must_use]
    pub fn depunctured_len(&self) -> usize {
        self.unpunctured_len + DECODER_FLUSH_PAD
    }

    /// Scatters punctured soft bits onto their mother-code positions. Positions that carry no
    /// transmitted bit, and the trailing flush padding, are left as erasures.
    ///
    /// # Errors
    ///
    /// Returns an error if `softbits.len()` is not equal to `self.len()`.
    pub fn depuncture(&self, softbits: &[u8]) -> Result<Vec<u8>, Error> {
        if softbits.len() != self.target_indices.len() {
            return Err(Error::InvalidInput(format!(
                "Invalid punctured block length (expected {}, found {})",
                self.target_indices.len(),
                softbits.len()
            )));
        }
        let mut unpunctured = vec![ERASURE; self.depunctured_len()];
        for (&soft, &target) in softbits.iter().zip(&self.target_indices) {
            unpunctured[target] = soft;
        }
        Ok(unpunctured)
    }

    /// Gathers the transmitted subset of an unpunctured codeword (transmit path).
    ///
    /// # Errors
    ///
    /// Returns an error if `bits.len()` is not equal to `self.unpunctured_len()`.
    pub fn puncture<T: Copy>(&self, bits: &[T]) -> Result<Vec<T>, Error> {
        if bits.len() != self.unpunctured_len {
            return Err(Error::InvalidInput(format!(
                "Invalid unpunctured block length (expected {}, found {})",
                self.unpunctured_len,
                bits.len()
            )));
        }
        Ok(self.target_indices.iter().map(|&k| bits[k]).collect())
    }
}

#[cfg(test)]
mod tests_of_puncturing_pattern {
    use super::*;

    #[test]
    fn test_new() {
        // Only rate 2/3 is defined
        assert!(matches!(
            PuncturingPattern::new(120, 1, 2),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            PuncturingPattern::new(120, 1, 3),
            Err(Error::Unsupported(_))
        ));
        // Punctured length must map into the codeword
        assert!(PuncturingPattern::new(121, 2, 3).is_err());
        // Synchronization block geometry: K3 = 120, K2 = 80
        let pattern = PuncturingPattern::new(120, 2, 3).unwrap();
        assert_eq!(pattern.len(), 120);
        assert_eq!(pattern.unpunctured_len(), 320);
        assert_eq!(pattern.depunctured_len(), 336);
        assert_eq!(&pattern.target_indices[.. 8], [0, 1, 4, 8, 9, 12, 16, 17]);
        assert_eq!(*pattern.target_indices.iter().max().unwrap(), 316);
    }

    #[test]
    fn test_depuncture() {
        let pattern = PuncturingPattern::new(120, 2, 3).unwrap();
        // Length mismatch
        assert!(pattern.depuncture(&[0x00; 119]).is_err());
        // Unfilled positions stay erasures
        let softbits: Vec<u8> = (0 .. 120).map(|i| if i % 2 == 0 { 0x00 } else { 0xFF }).collect();
        let unpunctured = pattern.depuncture(&softbits).unwrap();
        assert_eq!(unpunctured.len(), 336);
        assert_eq!(unpunctured[0], 0x00);
        assert_eq!(unpunctured[1], 0xFF);
        // Position 2 is never targeted at rate 2/3
        assert_eq!(unpunctured[2], ERASURE);
        // Flush padding is all erasures
        assert!(unpunctured[320 ..].iter().all(|&s| s == ERASURE));
    }

    #[test]
    fn test_puncture() {
        let pattern = PuncturingPattern::new(120, 2, 3).unwrap();
        // Length mismatch
        assert!(pattern.puncture(&[0u8; 336]).is_err());
        // Scatter then gather recovers the punctured block exactly
        let softbits: Vec<u8> = (0 .. 120).map(|i| u8::try_from(i).unwrap()).collect();
        let unpunctured = pattern.depuncture(&softbits).unwrap();
        assert_eq!(
            pattern.puncture(&unpunctured[.. 320]).unwrap(),
            softbits
        );
    }
}
