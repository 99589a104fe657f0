//! CRC candidate polynomials and divisibility over GF(2)

use serde::{Deserialize, Serialize};

use crate::{Bit, Error};

/// CRC generator polynomial over GF(2)
///
/// A degree-`m` CRC polynomial has `m + 1` coefficient bits with the leading and trailing
/// coefficients both 1 (anything else either wastes a check bit or misses single-bit flips in
/// the last position). The bit pattern is stored MSB-first, so `bits == 0b10011` is
/// `x^4 + x + 1`. Deserialization goes through [`CrcPolynomial::new`], so a JSON round-trip
/// cannot construct a polynomial the constructor would reject.
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Deserialize, Serialize)]
#[serde(try_from = "UncheckedCrcPolynomial")]
pub struct CrcPolynomial {
    /// Coefficient bit pattern (`degree + 1` bits)
    bits: usize,
    /// Degree of the polynomial
    degree: usize,
}

/// Raw deserialized form of a CRC polynomial, not yet validated
#[derive(Deserialize)]
struct UncheckedCrcPolynomial {
    bits: usize,
    degree: usize,
}

impl TryFrom<UncheckedCrcPolynomial> for CrcPolynomial {
    type Error = Error;

    fn try_from(raw: UncheckedCrcPolynomial) -> Result<Self, Error> {
        Self::new(raw.bits, raw.degree)
    }
}

impl CrcPolynomial {
    /// Returns the CRC polynomial with given coefficient bits and degree.
    ///
    /// # Errors
    ///
    /// Returns an error if `degree` is `0` or too large for the word size, or if `bits` is not
    /// a `degree + 1`-bit pattern with leading and trailing bit 1.
    pub fn new(bits: usize, degree: usize) -> Result<Self, Error> {
        check_degree(degree)?;
        if bits >> degree != 1 || bits & 1 != 1 {
            return Err(Error::InvalidInput(format!(
                "CRC polynomial {bits:#x} must have exactly {} bits with leading and \
                trailing bit 1",
                degree + 1
            )));
        }
        Ok(Self { bits, degree })
    }

    /// Returns all CRC polynomials of given degree, in ascending bit-pattern order.
    ///
    /// With the leading and trailing coefficients forced to 1, the `degree - 1` interior
    /// coefficients are free, so there are exactly `2^(degree - 1)` candidates.
    ///
    /// # Errors
    ///
    /// Returns an error if `degree` is `0` or too large for the word size.
    ///
    /// # Examples
    ///
    /// ```
    /// use dsocrc::CrcPolynomial;
    ///
    /// let candidates = CrcPolynomial::all_of_degree(4)?;
    /// assert_eq!(candidates.len(), 8);
    /// assert_eq!(candidates[0].bits(), 0b10001);
    /// assert_eq!(candidates[7].bits(), 0b11111);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn all_of_degree(degree: usize) -> Result<Vec<Self>, Error> {
        check_degree(degree)?;
        Ok((0 .. 1usize << (degree - 1))
            .map(|interior| Self {
                bits: (1 << degree) | (interior << 1) | 1,
                degree,
            })
            .collect())
    }

    /// Returns the coefficient bit pattern.
    #[must_use]
    pub fn bits(&self) -> usize {
        self.bits
    }

    /// Returns the degree.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Returns whether this polynomial exactly divides the given bit pattern over GF(2).
    ///
    /// The pattern is read MSB-first as polynomial coefficients. A zero remainder means an
    /// error burst with this pattern would pass the CRC check undetected.
    ///
    /// # Examples
    ///
    /// ```
    /// use dsocrc::{Bit::One, Bit::Zero, CrcPolynomial};
    ///
    /// let crc = CrcPolynomial::new(0b111, 2)?; // x^2 + x + 1
    /// assert!(crc.divides(&[One, Zero, Zero, One])); // x^3 + 1 = (x + 1)(x^2 + x + 1)
    /// assert!(!crc.divides(&[One, Zero, One, One])); // x^3 + x + 1 is irreducible
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn divides(&self, pattern: &[Bit]) -> bool {
        let top_bit = 1 << self.degree;
        let mut remainder = 0usize;
        for &bit in pattern {
            remainder = (remainder << 1) | bit as usize;
            if remainder & top_bit != 0 {
                remainder ^= self.bits;
            }
        }
        remainder == 0
    }
}

impl std::fmt::Display for CrcPolynomial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.bits)
    }
}

/// Returns the number of error patterns in the given set that the CRC fails to detect.
///
/// A pattern is undetected exactly when the CRC polynomial divides it. Pure function of its
/// inputs; the count is at most `patterns.len()`.
#[must_use]
pub fn undetected_count(crc: CrcPolynomial, patterns: &[Vec<Bit>]) -> usize {
    patterns
        .iter()
        .filter(|pattern| crc.divides(pattern))
        .count()
}

/// Checks that a CRC degree is usable.
fn check_degree(degree: usize) -> Result<(), Error> {
    if degree == 0 {
        return Err(Error::InvalidInput(
            "CRC degree must be positive".to_string(),
        ));
    }
    // OK to cast `u32` to `usize`: Numbers involved will always be small enough.
    if degree + 1 >= usize::BITS as usize {
        return Err(Error::InvalidInput(format!(
            "CRC degree {degree} does not fit in a machine word",
        )));
    }
    Ok(())
}


#[cfg(test)]
mod tests_of_functions {
    use super::*;
    use Bit::{One, Zero};

    #[test]
    fn test_undetected_count() {
        let crc = CrcPolynomial::new(0b111, 2).unwrap();
        assert_eq!(undetected_count(crc, &[]), 0);
        let patterns = vec![
            vec![One, One, One],
            vec![One, Zero, Zero, One],
            vec![One, Zero, One, One],
            vec![One, One],
        ];
        assert_eq!(undetected_count(crc, &patterns), 2);
    }
}
