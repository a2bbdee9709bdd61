//! Typed numeric entries
//!
//! Text fields accept anything `f64` parses, including exponent forms such
//! as `"1e6"`, and keep the whole-number part. Parsing and clamping are
//! separate so callers choose their own fallback on a bad entry.

use crate::error::{Result, SdrError};

/// Bounds for the audio-rate entry.
pub const AUDIO_RATE_ENTRY: NumericEntry = NumericEntry::new(1_000, 60_000);

/// Parse a typed number, truncating toward zero.
pub fn parse_numeric_entry(text: &str) -> Result<i64> {
    let trimmed = text.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() < i64::MAX as f64 => Ok(value.trunc() as i64),
        _ => Err(SdrError::InvalidEntry(text.to_string())),
    }
}

/// An integer entry limited to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericEntry {
    min: i64,
    max: i64,
}

impl NumericEntry {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Clamp a stored or typed value into range. `NaN` becomes the minimum.
    pub fn clamp_f64(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min as f64;
        }
        value.clamp(self.min as f64, self.max as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_exponent_forms() {
        assert_eq!(parse_numeric_entry("48000").unwrap(), 48_000);
        assert_eq!(parse_numeric_entry(" 1e6 ").unwrap(), 1_000_000);
        assert_eq!(parse_numeric_entry("-2.9").unwrap(), -2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "abc", "NaN", "inf", "1e400"] {
            assert!(
                matches!(parse_numeric_entry(text), Err(SdrError::InvalidEntry(_))),
                "{:?} should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_audio_rate_entry_clamps() {
        let typed = |text: &str| {
            parse_numeric_entry(text).map(|hz| AUDIO_RATE_ENTRY.clamp_f64(hz as f64))
        };
        assert_eq!(typed("96000").unwrap(), 60_000.0);
        assert_eq!(typed("10").unwrap(), 1_000.0);
        assert_eq!(typed("44100.7").unwrap(), 44_100.0);
        assert!(typed("fast").is_err());
        assert_eq!(AUDIO_RATE_ENTRY.clamp_f64(f64::NAN), 1_000.0);
    }
}
