//! This crate selects a distance-spectrum-optimal (DSO) CRC polynomial for a given
//! convolutional code, feedforward or feedback (recursive). It enumerates the error events of
//! the code's trellis up to a bounded
//! Hamming distance, discards catastrophic events (those riding a zero-weight loop of the
//! trellis, which no CRC can help detect), and then eliminates CRC candidates distance by
//! distance, keeping at each step only the polynomials that miss the fewest error events. The
//! search ends with either a single best polynomial or a small set of candidates that the
//! distance budget could not separate.

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

mod catastrophic;
mod crc;
mod event;
mod search;
mod trellis;

pub use catastrophic::discard_catastrophic;
pub use crc::{undetected_count, CrcPolynomial};
pub use event::{collect_error_events, ErrorEvent};
pub use search::{
    run_search, search_best_crc, search_with_events, SearchOutcome, SearchParams, SearchReport,
};
pub use trellis::Trellis;

/// Custom error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid input error
    #[error("{0}")]
    InvalidInput(String),
    /// Error event inconsistent with the trellis topology
    #[error("Malformed error event: {0}")]
    MalformedErrorEvent(String),
    /// Every CRC candidate was eliminated at some distance (elimination must keep ties)
    #[error("No CRC candidates survive at distance {0}")]
    NoSurvivingCandidates(usize),
    /// File read/write error
    #[error("{0}")]
    FileReadWriteError(#[from] std::io::Error),
    /// Serde read/write error
    #[error("{0}")]
    SerdeReadWriteError(#[from] serde_json::Error),
}

/// Enumeration of binary symbol values
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub enum Bit {
    /// Binary symbol `0`
    Zero = 0,
    /// Binary symbol `1`
    One = 1,
}

impl Bit {
    /// Returns XOR of two bits.
    #[must_use]
    pub fn xor(self, other: Self) -> Self {
        if self == other {
            Bit::Zero
        } else {
            Bit::One
        }
    }
}

/// Returns XOR of bits in the binary representation of given integer.
fn bitxor(num: usize) -> Bit {
    match num.count_ones() % 2 {
        0 => Bit::Zero,
        _ => Bit::One,
    }
}

#[cfg(test)]
mod tests_of_functions {
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
    fn test_bitxor() {
        assert_eq!(bitxor(0x0), Zero);
        assert_eq!(bitxor(0x1), One);
        assert_eq!(bitxor(0x2), One);
        assert_eq!(bitxor(0x3), Zero);
        assert_eq!(bitxor(0x5), Zero);
        assert_eq!(bitxor(0x7), One);
        assert_eq!(bitxor(0xB), One);
        assert_eq!(bitxor(0xF), Zero);
    }
}
