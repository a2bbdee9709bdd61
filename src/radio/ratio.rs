//! Rational resampling ratios.

use crate::error::{Result, SdrError};

/// Greatest common divisor by Euclid's algorithm.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Coprime `decimation / interpolation` pair describing `from_rate / to_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleRatio {
    pub decimation: u64,
    pub interpolation: u64,
}

impl ResampleRatio {
    /// Reduce `from_rate / to_rate` to lowest terms.
    ///
    /// A zero rate yields `DegenerateRate`; callers defer construction until
    /// the front end reports a real rate.
    pub fn reduce(from_rate: u64, to_rate: u64) -> Result<Self> {
        if from_rate == 0 || to_rate == 0 {
            return Err(SdrError::DegenerateRate {
                numerator: from_rate,
                denominator: to_rate,
            });
        }
        let g = gcd(from_rate, to_rate);
        Ok(Self {
            decimation: from_rate / g,
            interpolation: to_rate / g,
        })
    }

    /// Same as [`reduce`](Self::reduce) for rates held as `f64` (rounded to whole Hz).
    pub fn from_rates(from_rate: f64, to_rate: f64) -> Result<Self> {
        Self::reduce(whole_hz(from_rate), whole_hz(to_rate))
    }

    pub fn as_tuple(&self) -> (u64, u64) {
        (self.decimation, self.interpolation)
    }
}

/// Round a rate to whole Hz; negative and non-finite rates become zero.
pub fn whole_hz(rate: f64) -> u64 {
    if rate.is_finite() && rate > 0.0 {
        rate.round() as u64
    } else {
        0
    }
}
