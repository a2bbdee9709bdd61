//! Core domain types shared across the radio, display and pipeline modules.

use crate::error::SdrError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Demodulation mode. Selects the stage topology wired by [`crate::radio::Radio`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "FM")]
    Fm,
    #[default]
    #[serde(rename = "WFM")]
    Wfm,
    #[serde(rename = "USB")]
    Usb,
    #[serde(rename = "LSB")]
    Lsb,
    #[serde(rename = "CW_USB")]
    CwUsb,
    #[serde(rename = "CW_LSB")]
    CwLsb,
}

impl Mode {
    /// All modes, in selector order.
    pub fn all() -> &'static [Mode] {
        &[
            Mode::Am,
            Mode::Fm,
            Mode::Wfm,
            Mode::Usb,
            Mode::Lsb,
            Mode::CwUsb,
            Mode::CwLsb,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Am => "AM",
            Mode::Fm => "FM",
            Mode::Wfm => "WFM",
            Mode::Usb => "USB",
            Mode::Lsb => "LSB",
            Mode::CwUsb => "CW_USB",
            Mode::CwLsb => "CW_LSB",
        }
    }

    /// Position in the mode selector.
    pub fn index(&self) -> usize {
        match self {
            Mode::Am => 0,
            Mode::Fm => 1,
            Mode::Wfm => 2,
            Mode::Usb => 3,
            Mode::Lsb => 4,
            Mode::CwUsb => 5,
            Mode::CwLsb => 6,
        }
    }

    pub fn from_index(index: usize) -> Result<Self, SdrError> {
        Self::all()
            .get(index)
            .copied()
            .ok_or_else(|| SdrError::UnrecognizedMode(index.to_string()))
    }

    /// Single-sideband family: demodulated with the phasing (Hilbert) chain.
    pub fn is_phasing(&self) -> bool {
        matches!(self, Mode::Usb | Mode::Lsb | Mode::CwUsb | Mode::CwLsb)
    }

    pub fn is_cw(&self) -> bool {
        matches!(self, Mode::CwUsb | Mode::CwLsb)
    }

    pub fn is_upper_sideband(&self) -> bool {
        matches!(self, Mode::Usb | Mode::CwUsb)
    }

    /// Coefficient applied to the second phasing arm before summation.
    pub fn sideband_sign(&self) -> Option<f32> {
        if !self.is_phasing() {
            None
        } else if self.is_upper_sideband() {
            Some(1.0)
        } else {
            Some(-1.0)
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = SdrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::all()
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| SdrError::UnrecognizedMode(s.to_string()))
    }
}

/// Channel filter bandwidth selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bandwidth {
    #[default]
    Wide,
    Medium,
    Narrow,
}

impl Bandwidth {
    pub fn all() -> &'static [Bandwidth] {
        &[Bandwidth::Wide, Bandwidth::Medium, Bandwidth::Narrow]
    }

    /// Index into the per-filter bandwidth tables.
    pub fn index(&self) -> usize {
        match self {
            Bandwidth::Wide => 0,
            Bandwidth::Medium => 1,
            Bandwidth::Narrow => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::all().get(index).copied()
    }

    /// Pick this bandwidth's entry from a `{wide, medium, narrow}` table.
    pub fn select<T: Copy>(&self, table: [T; 3]) -> T {
        table[self.index()]
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bandwidth::Wide => f.write_str("wide"),
            Bandwidth::Medium => f.write_str("medium"),
            Bandwidth::Narrow => f.write_str("narrow"),
        }
    }
}

/// Build/run status of the radio, orthogonal to the selected mode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RadioStatus {
    /// Nothing has been built yet.
    #[default]
    Unbuilt,
    /// Built and wired, not streaming.
    Stopped,
    /// Built, wired and streaming.
    Running,
    /// The front-end reported no gain stages.
    NoDevice,
    /// A rate read back as zero; construction postponed until it is known.
    Deferred,
    /// The audio sink failed; nothing is wired.
    Errored(String),
}

impl RadioStatus {
    /// Whether the start control should be enabled.
    pub fn can_start(&self) -> bool {
        matches!(self, RadioStatus::Stopped | RadioStatus::Running)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, RadioStatus::Running)
    }
}

impl fmt::Display for RadioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RadioStatus::Unbuilt => f.write_str("Unbuilt"),
            RadioStatus::Stopped => f.write_str("Stopped"),
            RadioStatus::Running => f.write_str("Running"),
            RadioStatus::NoDevice => f.write_str("No device"),
            RadioStatus::Deferred => f.write_str("Waiting for rate"),
            RadioStatus::Errored(msg) => write!(f, "Error: {}", msg),
        }
    }
}
