//! Pan offset and CW tone offset, merged into one translation frequency.

use crate::types::Mode;

/// Spacing constant for CW reception. The tone offset is half of it.
pub const CW_BASE_HZ: f64 = 750.0;

/// Limit `f` to `[-limit, limit]`, keeping its sign.
pub fn clamp(f: f64, limit: f64) -> f64 {
    if f.abs() <= limit {
        f
    } else {
        limit.copysign(f)
    }
}

/// Combines the user's pan offset and the mode's tone offset.
///
/// The front-end side and the translate stage apply the offset from opposite
/// ends of the same mix, hence the two signs in [`effective_translation`].
///
/// [`effective_translation`]: FrequencyOffsetCoordinator::effective_translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyOffsetCoordinator {
    pan_offset_hz: f64,
    cw_tone_offset_hz: f64,
    audio_rate: f64,
}

impl FrequencyOffsetCoordinator {
    pub fn new(audio_rate: f64) -> Self {
        Self {
            pan_offset_hz: 0.0,
            cw_tone_offset_hz: 0.0,
            audio_rate,
        }
    }

    pub fn pan_offset_hz(&self) -> f64 {
        self.pan_offset_hz
    }

    pub fn set_pan_offset(&mut self, hz: f64) {
        self.pan_offset_hz = hz;
    }

    pub fn cw_tone_offset_hz(&self) -> f64 {
        self.cw_tone_offset_hz
    }

    pub fn audio_rate(&self) -> f64 {
        self.audio_rate
    }

    pub fn set_audio_rate(&mut self, rate: f64) {
        self.audio_rate = rate;
    }

    /// Set the tone offset for `mode`: `+CW_BASE/2` upper, `-CW_BASE/2` lower, else 0.
    pub fn set_mode(&mut self, mode: Mode) {
        self.cw_tone_offset_hz = match mode {
            Mode::CwUsb => CW_BASE_HZ / 2.0,
            Mode::CwLsb => -CW_BASE_HZ / 2.0,
            _ => 0.0,
        };
    }

    /// Pan offset limited to half the audio rate.
    pub fn clamped_pan(&self) -> f64 {
        clamp(self.pan_offset_hz, self.audio_rate / 2.0)
    }

    pub fn effective_translation(&self, for_front_end: bool) -> f64 {
        let pan = self.clamped_pan();
        if for_front_end {
            pan - self.cw_tone_offset_hz
        } else {
            -(pan + self.cw_tone_offset_hz)
        }
    }
}
