//! Trellis model for a rate-`1/n` convolutional encoder, feedforward or feedback

use crate::{bitxor, Bit, Error};

/// Trellis of a rate-`1/n` convolutional encoder
///
/// States are the shift-register contents, with the most recent register bit in the MSB
/// position. A transition is labeled with the `n` output bits obtained by tapping the register
/// according to the generator polynomials. Without a feedback polynomial the register simply
/// shifts the input bit in; with one, the bit shifted in is the input bit XOR the feedback
/// taps on the current state. The trellis is immutable once constructed.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Trellis {
    /// Generator polynomials
    code_polynomials: Vec<usize>,
    /// Feedback polynomial, if the encoder is recursive
    feedback_polynomial: Option<usize>,
    /// Memory length (number of shift-register cells)
    memory_len: usize,
    /// Number of states
    num_states: usize,
    /// Number of output bits per input bit
    num_output_bits: usize,
}

impl Trellis {
    /// Returns trellis for the rate-`1/n` convolutional encoder with given generator
    /// polynomials and optional feedback polynomial.
    ///
    /// # Parameters
    ///
    /// - `code_polynomials`: Integer representations of the generator polynomials for the code.
    ///   Must have length `N >= 2` for a code of rate `1/N`. Each polynomial must be in the
    ///   range `[1, 2^L)` for the constraint length `L`, which is the bit length of the
    ///   feedback polynomial if one is given and of the largest generator polynomial otherwise.
    /// - `feedback_polynomial`: Feedback (denominator) polynomial for a recursive encoder, or
    ///   `None` for a feedforward one. Must not be `0` or a power of `2` (its MSB fixes the
    ///   constraint length, and its other taps are what make the encoder recursive). Passing
    ///   the feedback polynomial itself as a generator polynomial yields a systematic output
    ///   bit.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two generator polynomials are given, if any polynomial
    /// is `0` or does not fit in `L` bits, or if the resulting memory length would not be
    /// positive.
    ///
    /// # Examples
    ///
    /// ```
    /// use dsocrc::Trellis;
    ///
    /// let trellis = Trellis::new(&[0o5, 0o7], None)?;
    /// assert_eq!(trellis.num_states(), 4);
    /// assert_eq!(trellis.memory_len(), 2);
    /// let trellis = Trellis::new(&[0o13, 0o15, 0o17], Some(0o13))?;
    /// assert_eq!(trellis.num_states(), 8);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(
        code_polynomials: &[usize],
        feedback_polynomial: Option<usize>,
    ) -> Result<Self, Error> {
        let constraint_len = constraint_length(code_polynomials, feedback_polynomial)?;
        Ok(Self {
            code_polynomials: code_polynomials.to_vec(),
            feedback_polynomial,
            memory_len: constraint_len - 1,
            num_states: 1 << (constraint_len - 1),
            num_output_bits: code_polynomials.len(),
        })
    }

    /// Returns the generator polynomials.
    #[must_use]
    pub fn code_polynomials(&self) -> &[usize] {
        &self.code_polynomials
    }

    /// Returns the feedback polynomial, if the encoder is recursive.
    #[must_use]
    pub fn feedback_polynomial(&self) -> Option<usize> {
        self.feedback_polynomial
    }

    /// Returns the memory length.
    #[must_use]
    pub fn memory_len(&self) -> usize {
        self.memory_len
    }

    /// Returns the number of states.
    #[must_use]
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Returns the number of output bits per input bit.
    #[must_use]
    pub fn num_output_bits(&self) -> usize {
        self.num_output_bits
    }

    /// Returns the state reached from given state with given input bit.
    #[must_use]
    pub fn next_state(&self, state: usize, input_bit: Bit) -> usize {
        self.augmented_state_index(state, input_bit) >> 1
    }

    /// Returns the output bits for the transition from given state with given input bit, in
    /// generator-polynomial order.
    #[must_use]
    pub fn output_bits(&self, state: usize, input_bit: Bit) -> Vec<Bit> {
        let aug_state_index = self.augmented_state_index(state, input_bit);
        self.code_polynomials
            .iter()
            .map(|&code_poly| bitxor(aug_state_index & code_poly))
            .collect()
    }

    /// Returns the Hamming weight of the output bits for the transition from given state with
    /// given input bit.
    #[must_use]
    pub fn output_weight(&self, state: usize, input_bit: Bit) -> u32 {
        let aug_state_index = self.augmented_state_index(state, input_bit);
        self.code_polynomials
            .iter()
            .map(|&code_poly| (aug_state_index & code_poly).count_ones() % 2)
            .sum()
    }

    /// Returns integer obtained by augmenting given state on the left with the bit entering
    /// the shift register for given input bit.
    ///
    /// For a feedback encoder the entering bit is the XOR of the input bit and the feedback
    /// taps on the current state. An effective feedback polynomial of `2^memory_len` taps
    /// only the input bit, which gives the feedforward case.
    fn augmented_state_index(&self, state: usize, input_bit: Bit) -> usize {
        let feedback_poly = self.feedback_polynomial.unwrap_or(self.num_states);
        let input_aug_index = match input_bit {
            Bit::Zero => state,
            Bit::One => self.num_states + state,
        };
        match bitxor(input_aug_index & feedback_poly) {
            Bit::Zero => state,
            Bit::One => self.num_states + state,
        }
    }
}

/// Returns constraint length corresponding to given generator and feedback polynomials.
fn constraint_length(
    code_polynomials: &[usize],
    feedback_polynomial: Option<usize>,
) -> Result<usize, Error> {
    if code_polynomials.len() < 2 {
        return Err(Error::InvalidInput(
            "Expected at least two generator polynomials".to_string(),
        ));
    }
    if code_polynomials.iter().any(|&x| x == 0) {
        return Err(Error::InvalidInput(
            "Generator polynomials cannot be 0".to_string(),
        ));
    }
    let constraint_len = match feedback_polynomial {
        None => {
            let largest_poly = code_polynomials.iter().copied().max().unwrap_or(0);
            // OK to cast `u32` to `usize`: Numbers involved will always be small enough.
            (usize::BITS - largest_poly.leading_zeros()) as usize
        }
        Some(feedback_poly) => {
            if feedback_poly == 0 || feedback_poly & (feedback_poly - 1) == 0 {
                return Err(Error::InvalidInput(
                    "Feedback polynomial cannot be 0 or a power of 2".to_string(),
                ));
            }
            // OK to cast `u32` to `usize`: Numbers involved will always be small enough.
            let constraint_len = (usize::BITS - feedback_poly.leading_zeros()) as usize;
            let two_pow_constraint_len = 1usize << constraint_len;
            if code_polynomials.iter().any(|&x| x >= two_pow_constraint_len) {
                return Err(Error::InvalidInput(format!(
                    "For constraint length of {constraint_len}, each generator polynomial \
                    must be in the range [1, {two_pow_constraint_len})",
                )));
            }
            constraint_len
        }
    };
    if constraint_len < 2 {
        return Err(Error::InvalidInput(
            "Largest generator polynomial must exceed 1 for a positive memory length".to_string(),
        ));
    }
    Ok(constraint_len)
}


#[cfg(test)]
mod tests_of_functions {
    use super::*;

    #[test]
    fn test_constraint_length() {
        assert!(constraint_length(&[], None).is_err());
        assert!(constraint_length(&[0o13], None).is_err());
        assert!(constraint_length(&[0o0, 0o15], None).is_err());
        assert!(constraint_length(&[0o13, 0o0], None).is_err());
        assert!(constraint_length(&[0o1, 0o1], None).is_err());
        assert!(constraint_length(&[0o15, 0o17], Some(0o0)).is_err());
        assert!(constraint_length(&[0o15, 0o17], Some(0o20)).is_err());
        assert!(constraint_length(&[0o15, 0o37], Some(0o13)).is_err());
        assert_eq!(constraint_length(&[0o5, 0o7], None).unwrap(), 3);
        assert_eq!(constraint_length(&[0o13, 0o15], None).unwrap(), 4);
        assert_eq!(constraint_length(&[0o13, 0o15, 0o17], None).unwrap(), 4);
        assert_eq!(constraint_length(&[0o3, 0o3], None).unwrap(), 2);
        assert_eq!(constraint_length(&[0o13, 0o15, 0o17], Some(0o13)).unwrap(), 4);
        assert_eq!(constraint_length(&[0o5, 0o7], Some(0o7)).unwrap(), 3);
    }
}
