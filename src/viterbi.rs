//! Feed-forward convolutional encoder and soft-decision Viterbi decoder

use itertools::Itertools;

use crate::{Bit, Error};

/// Path metric assigned to trellis states that cannot have been reached yet
const UNREACHED: u32 = 1 << 30;

/// A feed-forward convolutional code of rate `1/R`
///
/// The shift register is augmented on the right: for state `s` and input bit `x`, the augmented
/// register is `(s << 1) | x`, output bit `n` is the parity of `aug & polynomials[n]`, and the
/// next state is the low `M - 1` bits of `aug` (for constraint length `M`). The least significant
/// bit of each polynomial therefore taps the current input bit, and bit `i` the input from `i`
/// steps earlier.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ConvolutionalCode {
    /// Generator polynomials, one per output bit
    polynomials: Vec<u32>,
    /// Constraint length (width of the widest polynomial)
    constraint_len: usize,
    /// Number of trellis states
    num_states: usize,
}

impl ConvolutionalCode {
    /// Returns the code corresponding to given generator polynomials.
    ///
    /// # Parameters
    ///
    /// - `polynomials`: Integer representations of the generator polynomials. Must have length
    ///   `R` for a code of rate `1/R`, with `R >= 2`. The constraint length is the bit width of
    ///   the widest polynomial and must lie in `[2, 9]` (up to 256 trellis states).
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two polynomials are given, if any polynomial is zero, or
    /// if the constraint length is outside `[2, 9]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tetra_lmac::ConvolutionalCode;
    ///
    /// let code = ConvolutionalCode::new(&[0b10011, 0b11101, 0b10111, 0b11011])?;
    /// assert_eq!(code.inverse_rate(), 4);
    /// assert_eq!(code.num_states(), 16);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(polynomials: &[u32]) -> Result<Self, Error> {
        if polynomials.len() < 2 {
            return Err(Error::InvalidInput(
                "Expected at least two generator polynomials".to_string(),
            ));
        }
        if polynomials.iter().any(|&poly| poly == 0) {
            return Err(Error::InvalidInput(
                "Generator polynomials cannot be zero".to_string(),
            ));
        }
        // OK to cast `u32` to `usize`: the width of a `u32` always fits.
        let constraint_len = polynomials
            .iter()
            .map(|poly| (u32::BITS - poly.leading_zeros()) as usize)
            .max()
            .unwrap_or(0);
        if !(2 ..= 9).contains(&constraint_len) {
            return Err(Error::InvalidInput(format!(
                "Constraint length must be in [2, 9] (found {constraint_len})"
            )));
        }
        Ok(Self {
            polynomials: polynomials.to_vec(),
            constraint_len,
            num_states: 1 << (constraint_len - 1),
        })
    }

    /// Returns the inverse code rate `R` (number of output bits per input bit).
    #[must_use]
    pub fn inverse_rate(&self) -> usize {
        self.polynomials.len()
    }

    /// Returns the constraint length.
    #[must_use]
    pub fn constraint_len(&self) -> usize {
        self.constraint_len
    }

    /// Returns the encoder memory length (number of tail bits needed to flush it).
    #[must_use]
    pub fn memory_len(&self) -> usize {
        self.constraint_len - 1
    }

    /// Returns the number of trellis states.
    #[must_use]
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Returns the number of code bits produced for a given number of information bits, the
    /// flushing tail included.
    #[must_use]
    pub fn encoded_len(&self, num_info_bits: usize) -> usize {
        (num_info_bits + self.memory_len()) * self.inverse_rate()
    }

    /// Generates the codeword for given information bits. The encoder starts in the all-zero
    /// state and is flushed back to it with `memory_len` zero tail bits.
    #[must_use]
    pub fn encode(&self, info_bits: &[Bit]) -> Vec<Bit> {
        let mut code_bits = Vec::with_capacity(self.encoded_len(info_bits.len()));
        let mut state = 0u32;
        for &bit in info_bits {
            state = self.push_bit(state, bit, &mut code_bits);
        }
        for _ in 0 .. self.memory_len() {
            state = self.push_bit(state, Bit::Zero, &mut code_bits);
        }
        code_bits
    }

    /// Shifts one input bit into the encoder, appending `R` output bits.
    fn push_bit(&self, state: u32, bit: Bit, code_bits: &mut Vec<Bit>) -> u32 {
        let aug = (state << 1) | bit as u32;
        for &poly in &self.polynomials {
            code_bits.push(bitxor(aug & poly));
        }
        aug & (self.num_states as u32 - 1)
    }

    /// Returns maximum-likelihood decisions on the leading `num_info_bits` input bits for a
    /// received soft-bit codeword.
    ///
    /// Erasures (0x80) contribute a near-neutral cost to every transition, so the trailing
    /// erasure padding produced by depuncturing steers the survivor path without biasing it.
    /// Decoding is best-effort: it never fails for a well-formed input, however corrupted.
    ///
    /// # Parameters
    ///
    /// - `code_softbits`: Soft bits of the received codeword, `R` per trellis step.
    ///
    /// - `num_info_bits`: Number of leading decoded bits that constitute the useful payload;
    ///   the rest correspond to flushing and padding and are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if `code_softbits.len()` is not a positive multiple of `R`, or if
    /// `num_info_bits` exceeds the number of trellis steps.
    pub fn decode_soft(
        &self,
        code_softbits: &[u8],
        num_info_bits: usize,
    ) -> Result<Vec<Bit>, Error> {
        let inverse_rate = self.inverse_rate();
        if code_softbits.is_empty() || code_softbits.len() % inverse_rate != 0 {
            return Err(Error::InvalidInput(format!(
                "Codeword length must be a positive multiple of {inverse_rate} (found {})",
                code_softbits.len()
            )));
        }
        let num_steps = code_softbits.len() / inverse_rate;
        if num_info_bits > num_steps {
            return Err(Error::InvalidInput(format!(
                "Cannot recover {num_info_bits} bits from {num_steps} trellis steps"
            )));
        }
        let mut trellis = Trellis::new(self.num_states, num_steps);
        for step_softbits in code_softbits.chunks_exact(inverse_rate) {
            trellis.advance(step_softbits, &self.polynomials);
        }
        Ok(trellis.traceback(num_info_bits))
    }
}

/// Trellis workspace for one decode invocation: path metrics and traceback records
#[derive(Debug)]
struct Trellis {
    /// Number of trellis states
    num_states: usize,
    /// Accumulated path metric for each state
    path_metric: Vec<u32>,
    /// Path metric buffer for the next step
    path_metric_next: Vec<u32>,
    /// Branch cost for each augmented register value at the current step
    branch_cost: Vec<u32>,
    /// Winning predecessor state for each (step, state) pair
    predecessor: Vec<u8>,
}

impl Trellis {
    /// Returns a trellis with only the all-zero state reachable, where the encoder starts.
    fn new(num_states: usize, num_steps: usize) -> Self {
        let mut path_metric = vec![UNREACHED; num_states];
        path_metric[0] = 0;
        Self {
            num_states,
            path_metric,
            path_metric_next: vec![UNREACHED; num_states],
            branch_cost: vec![0; 2 * num_states],
            predecessor: Vec::with_capacity(num_states * num_steps),
        }
    }

    /// Advances the trellis by one step, keeping the better of the two incoming transitions for
    /// each state and recording the winning predecessor.
    fn advance(&mut self, step_softbits: &[u8], polynomials: &[u32]) {
        for aug in 0 .. 2 * self.num_states {
            // OK to cast `usize` to `u32`: augmented register values fit in 9 bits.
            self.branch_cost[aug] = branch_cost(aug as u32, step_softbits, polynomials);
        }
        for state in 0 .. self.num_states {
            // The two augmented registers whose low bits equal `state`: the predecessor is the
            // register shifted right, the input bit is the low bit of `state` itself.
            let aug_low = state;
            let aug_high = state + self.num_states;
            let metric_low = self.path_metric[aug_low >> 1] + self.branch_cost[aug_low];
            let metric_high = self.path_metric[aug_high >> 1] + self.branch_cost[aug_high];
            // OK to cast `usize` to `u8`: predecessor states fit in 8 bits by construction.
            if metric_low <= metric_high {
                self.path_metric_next[state] = metric_low;
                self.predecessor.push((aug_low >> 1) as u8);
            } else {
                self.path_metric_next[state] = metric_high;
                self.predecessor.push((aug_high >> 1) as u8);
            }
        }
        std::mem::swap(&mut self.path_metric, &mut self.path_metric_next);
    }

    /// Reconstructs the maximum-likelihood input sequence from the recorded decisions, keeping
    /// the leading `num_info_bits` bits.
    fn traceback(&self, num_info_bits: usize) -> Vec<Bit> {
        // Ties favor the all-zero state, where a flushed codeword must terminate.
        let mut state = self.path_metric.iter().position_min().unwrap_or(0);
        let num_steps = self.predecessor.len() / self.num_states;
        let mut info_bits = vec![Bit::Zero; num_steps];
        for step in (0 .. num_steps).rev() {
            if state & 1 == 1 {
                info_bits[step] = Bit::One;
            }
            state = usize::from(self.predecessor[step * self.num_states + state]);
        }
        info_bits.truncate(num_info_bits);
        info_bits
    }
}

/// Returns the cost of one transition: the distance of each soft sample from the bit the
/// transition would emit, summed over the `R` output positions.
fn branch_cost(aug: u32, step_softbits: &[u8], polynomials: &[u32]) -> u32 {
    polynomials
        .iter()
        .zip(step_softbits)
        .map(|(&poly, &soft)| match bitxor(aug & poly) {
            Bit::Zero => u32::from(soft),
            Bit::One => u32::from(0xFF - soft),
        })
        .sum()
}

/// Returns the XOR of the bits in the binary representation of the given integer.
fn bitxor(num: u32) -> Bit {
    match num.count_ones() % 2 {
        0 => Bit::Zero,
        _ => Bit::One,
    }
}
