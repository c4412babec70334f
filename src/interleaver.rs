//! Block interleaver for type-3/type-4 bit conversion

use crate::Error;

/// Interleaving depth of the EN 300 396-2 block interleaver
pub const INTERLEAVING_DEPTH: usize = 11;

/// Fixed permutation between the interleaved and deinterleaved orders of a block
///
/// Holds both directions of the permutation, so one instance per block length serves the receive
/// and transmit paths alike.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Interleaver {
    /// Length of input/output block
    length: usize,
    /// Interleaved index for each deinterleaved index (needed in deinterleaving)
    all_in_index_given_out_index: Vec<usize>,
    /// Deinterleaved index for each interleaved index (needed in interleaving)
    all_out_index_given_in_index: Vec<usize>,
}

impl Interleaver {
    /// Returns the interleaver corresponding to a given pattern.
    ///
    /// # Parameters
    ///
    /// - `pattern`: Permutation of integers in `[0, K)` for some positive integer `K`. If the
    ///   deinterleaver input is the block `x[0], x[1], ..., x[K-1]`, then its output is the block
    ///   `x[pattern[0]], x[pattern[1]], ..., x[pattern[K-1]]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a permutation of the integers in `[0, K)` for some
    /// positive integer `K`.
    pub fn new(pattern: &[usize]) -> Result<Self, Error> {
        if pattern.is_empty() {
            return Err(Error::InvalidInput(
                "Pattern defining interleaver cannot be empty".to_string(),
            ));
        }
        let mut pattern_sorted = pattern.to_vec();
        pattern_sorted.sort_unstable();
        if !pattern_sorted.into_iter().eq(0 .. pattern.len()) {
            return Err(Error::InvalidInput(format!(
                "Expected permutation of all integers in the range [0, {}), found {:?}",
                pattern.len(),
                pattern
            )));
        }
        Ok(Self::from_valid_pattern(pattern.to_vec()))
    }

    /// Returns the block interleaver of EN 300 396-2, 8.2.4.1 for a given block length and
    /// interleaving depth: deinterleaving reads `out[i] = in[(a * (i + 1)) mod K]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `length` is `0` or if `depth` shares a factor with `length`, in which
    /// case the formula does not produce a permutation.
    ///
    /// # Examples
    ///
    /// ```
    /// use tetra_lmac::interleaver::{Interleaver, INTERLEAVING_DEPTH};
    ///
    /// let interleaver = Interleaver::block(120, INTERLEAVING_DEPTH)?;
    /// assert_eq!(interleaver.len(), 120);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn block(length: usize, depth: usize) -> Result<Self, Error> {
        if length == 0 {
            return Err(Error::InvalidInput(
                "Length of interleaver must be a positive integer".to_string(),
            ));
        }
        let pattern: Vec<usize> = (0 .. length).map(|i| (depth * (i + 1)) % length).collect();
        Self::new(&pattern).map_err(|_| {
            Error::InvalidInput(format!(
                "Interleaving depth {depth} shares a factor with block length {length}"
            ))
        })
    }

    /// Returns the block length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the block length is zero (never the case for a constructed instance).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Deinterleaves a block (type-4 to type-3 direction on the receive path).
    ///
    /// # Errors
    ///
    /// Returns an error if `block.len()` is not equal to `self.len()`.
    pub fn deinterleave<T: Copy>(&self, block: &[T]) -> Result<Vec<T>, Error> {
        self.check_block_len(block.len())?;
        Ok((0 .. self.length)
            .map(|out_index| block[self.all_in_index_given_out_index[out_index]])
            .collect())
    }

    /// Interleaves a block (type-3 to type-4 direction, used when building a burst). This is the
    /// inverse permutation of [`Self::deinterleave`].
    ///
    /// # Errors
    ///
    /// Returns an error if `block.len()` is not equal to `self.len()`.
    pub fn interleave<T: Copy>(&self, block: &[T]) -> Result<Vec<T>, Error> {
        self.check_block_len(block.len())?;
        Ok((0 .. self.length)
            .map(|in_index| block[self.all_out_index_given_in_index[in_index]])
            .collect())
    }

    /// Returns the interleaver corresponding to a valid pattern.
    fn from_valid_pattern(pattern: Vec<usize>) -> Self {
        let length = pattern.len();
        let all_in_index_given_out_index: Vec<usize> = pattern;
        let mut all_out_index_given_in_index: Vec<usize> = (0 .. length).collect();
        all_out_index_given_in_index.sort_by_key(|&k| all_in_index_given_out_index[k]);
        Self {
            length,
            all_in_index_given_out_index,
            all_out_index_given_in_index,
        }
    }

    /// Checks that an operand length matches the block length.
    fn check_block_len(&self, found: usize) -> Result<(), Error> {
        if found == self.length {
            Ok(())
        } else {
            Err(Error::InvalidInput(format!(
                "Invalid interleaver block length (expected {}, found {})",
                self.length, found
            )))
        }
    }
}
