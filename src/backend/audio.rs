//! Audio output device
//!
//! Audio I/O itself is out of scope; the radio only needs to know whether a
//! device opened at the requested rate.

use crate::error::{Result, SdrError};

/// Audio output device
#[cfg_attr(test, mockall::automock)]
pub trait AudioBackend: Send {
    /// Open (or reopen) the device at `rate` samples per second.
    fn open(&mut self, rate: f64) -> Result<()>;
}

/// Accepts any positive rate and discards output.
#[derive(Debug, Default)]
pub struct NullAudio {
    opened_at: Option<f64>,
}

impl NullAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rate of the last successful `open`.
    pub fn opened_at(&self) -> Option<f64> {
        self.opened_at
    }
}

impl AudioBackend for NullAudio {
    fn open(&mut self, rate: f64) -> Result<()> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(SdrError::AudioSink(format!("unsupported rate {}", rate)));
        }
        tracing::debug!("Null audio opened at {} Hz", rate);
        self.opened_at = Some(rate);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_audio_rejects_zero_rate() {
        let mut audio = NullAudio::new();
        assert!(audio.open(0.0).is_err());
        assert_eq!(audio.opened_at(), None);
        audio.open(48_000.0).unwrap();
        assert_eq!(audio.opened_at(), Some(48_000.0));
    }
}
