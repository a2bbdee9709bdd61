//! Per-mode stage wiring.
//!
//! `CoreStages` and `ChainStages` are both created once and live for the
//! radio's lifetime. A full rebuild rewires them and refreshes the chain's
//! coefficients in place. Channel filters come from the [`FilterBank`].
//!
//! ```text
//! AM   src → rs(n) → xlate → lp-AM  → sq(c) → agc(c) → mag  → vol → audio
//! FM   src → rs(n) → xlate → lp-FM  → sq(c) → agc(c) → nbfm → vol → audio
//! WFM  src → rs(w) → xlate → lp-WFM → sq(c) → agc(c) → wfm  → vol → audio
//! SSB  src → rs(n) → xlate → sq(c) → split ─re→ hilb1 → real ───────→ sum.a
//!                                          └im→ hilb2 → imag → sign → sum.b
//!      sum → lp-SSB | bp-CW → sq(r) → agc(r) → vol → audio
//! all  src → log-power-fft → spectrum-probe
//! ```

use crate::error::Result;
use crate::pipeline::error::PipelineError;
use crate::pipeline::graph::FlowGraph;
use crate::pipeline::id::{EdgeId, PortId, StageId};
use crate::pipeline::stage::{Coefficients, StageRole};
use crate::radio::filters::FilterBank;
use crate::radio::ratio::ResampleRatio;
use crate::types::Mode;

/// Taps in each Hilbert arm.
pub const HILBERT_TAPS: usize = 128;
/// Squelch averaging constant.
pub const SQUELCH_ALPHA: f64 = 1e-4;
/// Narrowband FM de-emphasis time constant.
pub const NBFM_TAU: f64 = 75e-6;
/// Narrowband FM maximum deviation.
pub const NBFM_MAX_DEVIATION: f64 = 6e3;

/// Stages that survive rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreStages {
    pub source: StageId,
    pub translate: StageId,
    pub power_fft: StageId,
    pub spectrum_probe: StageId,
    pub audio_sink: StageId,
}

/// Everything a rebuild needs to parameterize the chain stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainParams {
    pub mode: Mode,
    pub narrow: ResampleRatio,
    pub wide: ResampleRatio,
    pub audio_rate: f64,
    pub intermediate_rate: f64,
    pub squelch_level_db: f64,
    pub volume: f32,
}

impl ChainParams {
    /// Decimation inside the wideband demodulator, intermediate to audio.
    pub fn audio_decimation(&self) -> u32 {
        if self.audio_rate > 0.0 {
            (self.intermediate_rate / self.audio_rate).round().max(1.0) as u32
        } else {
            1
        }
    }
}

/// Mode-specific stages, rewired on every full rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainStages {
    pub resample_narrow: StageId,
    pub resample_wide: StageId,
    pub squelch_complex: StageId,
    pub squelch_real: StageId,
    pub agc_complex: StageId,
    pub agc_real: StageId,
    pub magnitude: StageId,
    pub nbfm_demod: StageId,
    pub wfm_demod: StageId,
    pub split: StageId,
    pub hilbert_1: StageId,
    pub hilbert_2: StageId,
    pub real_part: StageId,
    pub imag_part: StageId,
    pub sideband_sign: StageId,
    pub sum: StageId,
    pub volume: StageId,
}

fn agc() -> Coefficients {
    Coefficients::Agc {
        attack: 1e-1,
        decay: 1e-2,
        reference: 1.0,
        max_gain: 1.0,
    }
}

impl ChainStages {
    /// Role and coefficients of every chain stage, in [`ChainStages::ids`] order.
    fn layout(params: &ChainParams) -> [(StageRole, Coefficients); 17] {
        let squelch = Coefficients::Squelch {
            threshold_db: params.squelch_level_db,
            alpha: SQUELCH_ALPHA,
        };
        let hilbert = Coefficients::Hilbert {
            taps: HILBERT_TAPS,
            beta: crate::radio::filters::DESIGN_BETA,
        };
        // Only phasing chains wire the sign stage.
        let sign = params.mode.sideband_sign().unwrap_or(1.0);

        [
            (
                StageRole::ResampleNarrow,
                Coefficients::Resample {
                    decimation: params.narrow.decimation,
                    interpolation: params.narrow.interpolation,
                },
            ),
            (
                StageRole::ResampleWide,
                Coefficients::Resample {
                    decimation: params.wide.decimation,
                    interpolation: params.wide.interpolation,
                },
            ),
            (StageRole::SquelchComplex, squelch.clone()),
            (StageRole::SquelchReal, squelch),
            (StageRole::AgcComplex, agc()),
            (StageRole::AgcReal, agc()),
            (StageRole::Magnitude, Coefficients::None),
            (
                StageRole::NbfmDemod,
                Coefficients::NbfmDemod {
                    audio_rate: params.audio_rate,
                    quad_rate: params.audio_rate,
                    tau: NBFM_TAU,
                    max_deviation: NBFM_MAX_DEVIATION,
                },
            ),
            (
                StageRole::WfmDemod,
                Coefficients::WfmDemod {
                    quad_rate: params.intermediate_rate,
                    audio_decimation: params.audio_decimation(),
                },
            ),
            (StageRole::ComplexSplit, Coefficients::None),
            (StageRole::HilbertArm1, hilbert.clone()),
            (StageRole::HilbertArm2, hilbert),
            (StageRole::RealPart, Coefficients::None),
            (StageRole::ImagPart, Coefficients::None),
            (StageRole::SidebandSign, Coefficients::Gain(sign)),
            (StageRole::Sum, Coefficients::None),
            (StageRole::Volume, Coefficients::Gain(params.volume)),
        ]
    }

    /// Add the chain stages to `graph`. Called once per radio.
    pub fn create(graph: &mut FlowGraph, params: &ChainParams) -> Result<Self> {
        let [
            resample_narrow,
            resample_wide,
            squelch_complex,
            squelch_real,
            agc_complex,
            agc_real,
            magnitude,
            nbfm_demod,
            wfm_demod,
            split,
            hilbert_1,
            hilbert_2,
            real_part,
            imag_part,
            sideband_sign,
            sum,
            volume,
        ] = Self::layout(params);
        let mut add = |(role, coefficients): (StageRole, Coefficients)| {
            graph.add_stage(role, coefficients)
        };

        Ok(Self {
            resample_narrow: add(resample_narrow)?,
            resample_wide: add(resample_wide)?,
            squelch_complex: add(squelch_complex)?,
            squelch_real: add(squelch_real)?,
            agc_complex: add(agc_complex)?,
            agc_real: add(agc_real)?,
            magnitude: add(magnitude)?,
            nbfm_demod: add(nbfm_demod)?,
            wfm_demod: add(wfm_demod)?,
            split: add(split)?,
            hilbert_1: add(hilbert_1)?,
            hilbert_2: add(hilbert_2)?,
            real_part: add(real_part)?,
            imag_part: add(imag_part)?,
            sideband_sign: add(sideband_sign)?,
            sum: add(sum)?,
            volume: add(volume)?,
        })
    }

    /// Re-parameterize the existing stages for `params`. Ids do not change.
    pub fn update(&self, graph: &mut FlowGraph, params: &ChainParams) -> Result<()> {
        for (id, (_, coefficients)) in self.ids().into_iter().zip(Self::layout(params)) {
            graph.update_coefficients(id, coefficients)?;
        }
        Ok(())
    }

    pub fn ids(&self) -> [StageId; 17] {
        [
            self.resample_narrow,
            self.resample_wide,
            self.squelch_complex,
            self.squelch_real,
            self.agc_complex,
            self.agc_real,
            self.magnitude,
            self.nbfm_demod,
            self.wfm_demod,
            self.split,
            self.hilbert_1,
            self.hilbert_2,
            self.real_part,
            self.imag_part,
            self.sideband_sign,
            self.sum,
            self.volume,
        ]
    }
}

/// Collects edges while wiring so a failure can report what was made.
struct Wiring<'a> {
    graph: &'a mut FlowGraph,
    edges: Vec<EdgeId>,
}

impl Wiring<'_> {
    fn port(&mut self, from: PortId, to: PortId) -> Result<()> {
        let edge = self.graph.connect(from, to)?;
        self.edges.push(edge);
        Ok(())
    }

    /// Connect the first output of each stage to the first input of the next.
    fn chain(&mut self, stages: &[StageId]) -> Result<()> {
        for pair in stages.windows(2) {
            self.port(pair[0].port(0), pair[1].port(0))?;
        }
        Ok(())
    }
}

/// Wire the spectrum branch and `mode`'s audio chain.
///
/// The graph must be stopped and hold no edges. On error the caller is
/// expected to `disconnect_all`, leaving no partial topology.
pub fn wire(
    graph: &mut FlowGraph,
    mode: Mode,
    core: &CoreStages,
    chain: &ChainStages,
    filters: &FilterBank,
) -> Result<Vec<EdgeId>> {
    let filter = |role: StageRole| {
        filters
            .stage_for(role)
            .ok_or(PipelineError::InvalidStage(StageId::INVALID))
    };

    let mut w = Wiring {
        graph,
        edges: Vec::new(),
    };

    w.chain(&[core.source, core.power_fft, core.spectrum_probe])?;

    match mode {
        Mode::Am => w.chain(&[
            core.source,
            chain.resample_narrow,
            core.translate,
            filter(StageRole::LowPassAm)?,
            chain.squelch_complex,
            chain.agc_complex,
            chain.magnitude,
            chain.volume,
            core.audio_sink,
        ])?,
        Mode::Fm => w.chain(&[
            core.source,
            chain.resample_narrow,
            core.translate,
            filter(StageRole::LowPassFm)?,
            chain.squelch_complex,
            chain.agc_complex,
            chain.nbfm_demod,
            chain.volume,
            core.audio_sink,
        ])?,
        Mode::Wfm => w.chain(&[
            core.source,
            chain.resample_wide,
            core.translate,
            filter(StageRole::LowPassWfm)?,
            chain.squelch_complex,
            chain.agc_complex,
            chain.wfm_demod,
            chain.volume,
            core.audio_sink,
        ])?,
        Mode::Usb | Mode::Lsb | Mode::CwUsb | Mode::CwLsb => {
            let post_sum = if mode.is_cw() {
                filter(StageRole::BandPassCw)?
            } else {
                filter(StageRole::LowPassSsb)?
            };

            w.chain(&[
                core.source,
                chain.resample_narrow,
                core.translate,
                chain.squelch_complex,
                chain.split,
            ])?;
            w.port(chain.split.port(0), chain.hilbert_1.port(0))?;
            w.port(chain.split.port(1), chain.hilbert_2.port(0))?;
            w.chain(&[chain.hilbert_1, chain.real_part])?;
            w.chain(&[chain.hilbert_2, chain.imag_part, chain.sideband_sign])?;
            w.port(chain.real_part.port(0), chain.sum.port(0))?;
            w.port(chain.sideband_sign.port(0), chain.sum.port(1))?;
            w.chain(&[
                chain.sum,
                post_sum,
                chain.squelch_real,
                chain.agc_real,
                chain.volume,
                core.audio_sink,
            ])?;
        }
    }

    tracing::debug!("Wired {} topology with {} edges", mode, w.edges.len());
    Ok(w.edges)
}

/// Roles that carry signal in `mode`'s topology, spectrum branch included.
pub fn connected_roles(mode: Mode) -> Vec<StageRole> {
    let mut roles = vec![
        StageRole::Source,
        StageRole::LogPowerFft,
        StageRole::SpectrumProbe,
        StageRole::Translate,
        StageRole::Volume,
        StageRole::AudioSink,
    ];
    let chain: &[StageRole] = match mode {
        Mode::Am => &[
            StageRole::ResampleNarrow,
            StageRole::LowPassAm,
            StageRole::SquelchComplex,
            StageRole::AgcComplex,
            StageRole::Magnitude,
        ],
        Mode::Fm => &[
            StageRole::ResampleNarrow,
            StageRole::LowPassFm,
            StageRole::SquelchComplex,
            StageRole::AgcComplex,
            StageRole::NbfmDemod,
        ],
        Mode::Wfm => &[
            StageRole::ResampleWide,
            StageRole::LowPassWfm,
            StageRole::SquelchComplex,
            StageRole::AgcComplex,
            StageRole::WfmDemod,
        ],
        Mode::Usb | Mode::Lsb | Mode::CwUsb | Mode::CwLsb => &[
            StageRole::ResampleNarrow,
            StageRole::SquelchComplex,
            StageRole::ComplexSplit,
            StageRole::HilbertArm1,
            StageRole::HilbertArm2,
            StageRole::RealPart,
            StageRole::ImagPart,
            StageRole::SidebandSign,
            StageRole::Sum,
            StageRole::SquelchReal,
            StageRole::AgcReal,
        ],
    };
    roles.extend_from_slice(chain);
    if mode.is_cw() {
        roles.push(StageRole::BandPassCw);
    } else if mode.is_phasing() {
        roles.push(StageRole::LowPassSsb);
    }
    roles
}
