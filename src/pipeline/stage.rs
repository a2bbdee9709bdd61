//! Stage abstraction for the signal path.
//!
//! A stage is an opaque DSP unit owned by the streaming engine. This crate
//! only knows three things about it:
//! - **role**: what it does in the chain, which fixes its port signature;
//! - **identity**: a `StageId` that stays valid for the stage's lifetime;
//! - **coefficients**: a payload that can be swapped in place while the
//!   stage keeps running, so a bandwidth change never replaces the unit.

use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::id::StageId;
use crate::pipeline::port::SignalType::{Complex, PowerVector, Real};
use crate::pipeline::port::{PortDescriptor, PortDirection};

static SOURCE: &[PortDescriptor] = &[PortDescriptor::output("out", Complex)];
static COMPLEX_TO_COMPLEX: &[PortDescriptor] = &[
    PortDescriptor::input("in", Complex),
    PortDescriptor::output("out", Complex),
];
static REAL_TO_REAL: &[PortDescriptor] = &[
    PortDescriptor::input("in", Real),
    PortDescriptor::output("out", Real),
];
static COMPLEX_TO_REAL: &[PortDescriptor] = &[
    PortDescriptor::input("in", Complex),
    PortDescriptor::output("out", Real),
];
static REAL_TO_COMPLEX: &[PortDescriptor] = &[
    PortDescriptor::input("in", Real),
    PortDescriptor::output("out", Complex),
];
static SPLIT: &[PortDescriptor] = &[
    PortDescriptor::input("in", Complex),
    PortDescriptor::output("re", Real),
    PortDescriptor::output("im", Real),
];
static SUM: &[PortDescriptor] = &[
    PortDescriptor::input("a", Real),
    PortDescriptor::input("b", Real),
    PortDescriptor::output("out", Real),
];
static POWER_FFT: &[PortDescriptor] = &[
    PortDescriptor::input("in", Complex),
    PortDescriptor::output("out", PowerVector),
];
static SPECTRUM_PROBE: &[PortDescriptor] = &[PortDescriptor::input("in", PowerVector)];
static AUDIO_SINK: &[PortDescriptor] = &[PortDescriptor::input("in", Real)];

/// Logical role of a stage in the signal path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageRole {
    Source,
    LogPowerFft,
    SpectrumProbe,
    ResampleNarrow,
    ResampleWide,
    Translate,
    LowPassAm,
    LowPassFm,
    LowPassWfm,
    LowPassSsb,
    BandPassCw,
    SquelchComplex,
    SquelchReal,
    AgcComplex,
    AgcReal,
    Magnitude,
    NbfmDemod,
    WfmDemod,
    ComplexSplit,
    HilbertArm1,
    HilbertArm2,
    RealPart,
    ImagPart,
    SidebandSign,
    Sum,
    Volume,
    AudioSink,
}

impl StageRole {
    pub fn name(&self) -> &'static str {
        match self {
            StageRole::Source => "source",
            StageRole::LogPowerFft => "log-power-fft",
            StageRole::SpectrumProbe => "spectrum-probe",
            StageRole::ResampleNarrow => "resample-narrow",
            StageRole::ResampleWide => "resample-wide",
            StageRole::Translate => "translate",
            StageRole::LowPassAm => "low-pass-AM",
            StageRole::LowPassFm => "low-pass-FM",
            StageRole::LowPassWfm => "low-pass-WFM",
            StageRole::LowPassSsb => "low-pass-SSB",
            StageRole::BandPassCw => "band-pass-CW",
            StageRole::SquelchComplex => "squelch-complex",
            StageRole::SquelchReal => "squelch-real",
            StageRole::AgcComplex => "agc-complex",
            StageRole::AgcReal => "agc-real",
            StageRole::Magnitude => "magnitude",
            StageRole::NbfmDemod => "nbfm-demod",
            StageRole::WfmDemod => "wfm-demod",
            StageRole::ComplexSplit => "complex-split",
            StageRole::HilbertArm1 => "hilbert-arm-1",
            StageRole::HilbertArm2 => "hilbert-arm-2",
            StageRole::RealPart => "real-part",
            StageRole::ImagPart => "imag-part",
            StageRole::SidebandSign => "sideband-sign",
            StageRole::Sum => "sum",
            StageRole::Volume => "volume",
            StageRole::AudioSink => "audio-sink",
        }
    }

    pub fn ports(&self) -> &'static [PortDescriptor] {
        match self {
            StageRole::Source => SOURCE,
            StageRole::LogPowerFft => POWER_FFT,
            StageRole::SpectrumProbe => SPECTRUM_PROBE,
            StageRole::ResampleNarrow
            | StageRole::ResampleWide
            | StageRole::Translate
            | StageRole::LowPassAm
            | StageRole::LowPassFm
            | StageRole::LowPassWfm
            | StageRole::SquelchComplex
            | StageRole::AgcComplex => COMPLEX_TO_COMPLEX,
            StageRole::LowPassSsb
            | StageRole::BandPassCw
            | StageRole::SquelchReal
            | StageRole::AgcReal
            | StageRole::SidebandSign
            | StageRole::Volume => REAL_TO_REAL,
            StageRole::Magnitude
            | StageRole::NbfmDemod
            | StageRole::WfmDemod
            | StageRole::RealPart
            | StageRole::ImagPart => COMPLEX_TO_REAL,
            StageRole::HilbertArm1 | StageRole::HilbertArm2 => REAL_TO_COMPLEX,
            StageRole::ComplexSplit => SPLIT,
            StageRole::Sum => SUM,
            StageRole::AudioSink => AUDIO_SINK,
        }
    }

    /// Sources have no input ports.
    pub fn is_source(&self) -> bool {
        !self.ports().iter().any(|p| p.direction == PortDirection::Input)
    }

    /// Sinks have no output ports.
    pub fn is_sink(&self) -> bool {
        !self.ports().iter().any(|p| p.direction == PortDirection::Output)
    }

    /// One of the five channel filters owned by the filter bank.
    pub fn is_channel_filter(&self) -> bool {
        matches!(
            self,
            StageRole::LowPassAm
                | StageRole::LowPassFm
                | StageRole::LowPassWfm
                | StageRole::LowPassSsb
                | StageRole::BandPassCw
        )
    }

    /// Whether `coefficients` is a payload this role can carry.
    pub fn accepts(&self, coefficients: &Coefficients) -> bool {
        match coefficients {
            Coefficients::None => !self.is_channel_filter(),
            Coefficients::Filter(_) => self.is_channel_filter(),
            Coefficients::Resample { .. } => {
                matches!(self, StageRole::ResampleNarrow | StageRole::ResampleWide)
            }
            Coefficients::Translate { .. } => *self == StageRole::Translate,
            Coefficients::Squelch { .. } => {
                matches!(self, StageRole::SquelchComplex | StageRole::SquelchReal)
            }
            Coefficients::Agc { .. } => matches!(self, StageRole::AgcComplex | StageRole::AgcReal),
            Coefficients::Gain(_) => matches!(self, StageRole::Volume | StageRole::SidebandSign),
            Coefficients::NbfmDemod { .. } => *self == StageRole::NbfmDemod,
            Coefficients::WfmDemod { .. } => *self == StageRole::WfmDemod,
            Coefficients::Hilbert { .. } => {
                matches!(self, StageRole::HilbertArm1 | StageRole::HilbertArm2)
            }
            Coefficients::PowerFft { .. } => *self == StageRole::LogPowerFft,
            Coefficients::Rate(_) => matches!(self, StageRole::Source | StageRole::AudioSink),
        }
    }
}

/// Window applied by the external filter designer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DesignWindow {
    Hamming,
}

/// Frequency response requested from the filter designer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterResponse {
    LowPass { cutoff_hz: f64 },
    BandPass { low_hz: f64, high_hz: f64 },
}

/// Design parameters for one channel filter. The streaming library turns
/// these into taps; this crate never computes taps itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterDesign {
    pub response: FilterResponse,
    pub sample_rate: f64,
    pub transition_hz: f64,
    pub window: DesignWindow,
    pub beta: f64,
}

/// Replaceable coefficient payload of a stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Coefficients {
    None,
    Filter(FilterDesign),
    Resample {
        decimation: u64,
        interpolation: u64,
    },
    Translate {
        center_hz: f64,
        sample_rate: f64,
    },
    Squelch {
        threshold_db: f64,
        alpha: f64,
    },
    Agc {
        attack: f64,
        decay: f64,
        reference: f64,
        max_gain: f64,
    },
    Gain(f32),
    NbfmDemod {
        audio_rate: f64,
        quad_rate: f64,
        tau: f64,
        max_deviation: f64,
    },
    WfmDemod {
        quad_rate: f64,
        audio_decimation: u32,
    },
    Hilbert {
        taps: usize,
        beta: f64,
    },
    PowerFft {
        sample_rate: f64,
        fft_size: usize,
        frame_rate: u32,
        avg_alpha: f64,
    },
    /// Stream rate for the source and the audio sink.
    Rate(f64),
}

/// A live stage: stable id, fixed role, swappable coefficients.
#[derive(Debug, Clone)]
pub struct Stage {
    id: StageId,
    role: StageRole,
    coefficients: Coefficients,
    revision: u64,
}

impl Stage {
    pub fn new(id: StageId, role: StageRole, coefficients: Coefficients) -> PipelineResult<Self> {
        if !role.accepts(&coefficients) {
            return Err(PipelineError::CoefficientMismatch {
                stage: id,
                role: role.name(),
            });
        }
        Ok(Self {
            id,
            role,
            coefficients,
            revision: 0,
        })
    }

    pub fn id(&self) -> StageId {
        self.id
    }

    pub fn role(&self) -> StageRole {
        self.role
    }

    pub fn name(&self) -> &'static str {
        self.role.name()
    }

    pub fn ports(&self) -> &'static [PortDescriptor] {
        self.role.ports()
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Number of in-place coefficient updates since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Swap the coefficient payload without touching identity or connections.
    pub fn set_coefficients(&mut self, coefficients: Coefficients) -> PipelineResult<()> {
        if !self.role.accepts(&coefficients) {
            return Err(PipelineError::CoefficientMismatch {
                stage: self.id,
                role: self.role.name(),
            });
        }
        self.coefficients = coefficients;
        self.revision += 1;
        Ok(())
    }
}
