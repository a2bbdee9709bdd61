//! The five channel filters and their bandwidth tables.
//!
//! Filter stages are created once and then only ever receive new
//! coefficients, so a bandwidth change never replaces a running unit.

use crate::error::Result;
use crate::pipeline::graph::FlowGraph;
use crate::pipeline::id::StageId;
use crate::pipeline::stage::{
    Coefficients, DesignWindow, FilterDesign, FilterResponse, StageRole,
};
use crate::radio::offset::CW_BASE_HZ;
use crate::radio::PipelineConfiguration;

/// Shape parameter handed to the filter designer with every design.
pub const DESIGN_BETA: f64 = 6.76;

const AM_CUTOFFS: [f64; 3] = [8_000.0, 3_000.0, 2_000.0];
const FM_CUTOFFS: [f64; 3] = [8_000.0, 6_000.0, 4_000.0];
const WFM_CUTOFFS: [f64; 3] = [60e3, 40e3, 20e3];
const SSB_CUTOFFS: [f64; 3] = [5_000.0, 2_400.0, 1_800.0];
const CW_HALF_WIDTHS: [f64; 3] = [CW_BASE_HZ * 2.0 / 3.0, CW_BASE_HZ / 2.0, CW_BASE_HZ / 3.0];

/// Roles owned by the bank, in slot order.
pub const FILTER_ROLES: [StageRole; 5] = [
    StageRole::LowPassAm,
    StageRole::LowPassFm,
    StageRole::LowPassWfm,
    StageRole::LowPassSsb,
    StageRole::BandPassCw,
];

/// Compute the design for one channel filter under `config`.
///
/// Returns `None` for roles that are not channel filters.
pub fn design_for(role: StageRole, config: &PipelineConfiguration) -> Option<FilterDesign> {
    let bw = config.bandwidth;
    let audio = config.audio_rate;
    let (response, sample_rate, transition_hz) = match role {
        StageRole::LowPassAm => (
            FilterResponse::LowPass {
                cutoff_hz: bw.select(AM_CUTOFFS),
            },
            audio,
            500.0,
        ),
        StageRole::LowPassFm => (
            FilterResponse::LowPass {
                cutoff_hz: bw.select(FM_CUTOFFS),
            },
            audio,
            500.0,
        ),
        StageRole::LowPassWfm => (
            FilterResponse::LowPass {
                cutoff_hz: bw.select(WFM_CUTOFFS),
            },
            config.intermediate_rate,
            4e3,
        ),
        StageRole::LowPassSsb => (
            FilterResponse::LowPass {
                cutoff_hz: bw.select(SSB_CUTOFFS),
            },
            audio,
            100.0,
        ),
        StageRole::BandPassCw => {
            let half = bw.select(CW_HALF_WIDTHS);
            (
                FilterResponse::BandPass {
                    low_hz: CW_BASE_HZ - half,
                    high_hz: CW_BASE_HZ + half,
                },
                audio,
                100.0,
            )
        }
        _ => return None,
    };

    Some(FilterDesign {
        response,
        sample_rate,
        transition_hz,
        window: DesignWindow::Hamming,
        beta: DESIGN_BETA,
    })
}

/// Holds the stage id of each channel filter once it exists.
#[derive(Debug, Clone, Default)]
pub struct FilterBank {
    slots: [Option<StageId>; 5],
}

impl FilterBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute all five designs. Existing stages are updated in place,
    /// missing ones are created. Never touches edges.
    pub fn rebuild(&mut self, graph: &mut FlowGraph, config: &PipelineConfiguration) -> Result<()> {
        for (slot, role) in self.slots.iter_mut().zip(FILTER_ROLES) {
            let Some(design) = design_for(role, config) else {
                continue;
            };
            let coefficients = Coefficients::Filter(design);

            match *slot {
                Some(id) if graph.stage(id).is_some() => {
                    graph.update_coefficients(id, coefficients)?;
                }
                _ => {
                    let id = graph.add_stage(role, coefficients)?;
                    tracing::debug!("Created {} filter as {:?}", role.name(), id);
                    *slot = Some(id);
                }
            }
        }

        tracing::debug!(
            "Filter bank rebuilt for {} bandwidth (audio {} Hz, intermediate {} Hz)",
            config.bandwidth,
            config.audio_rate,
            config.intermediate_rate
        );
        Ok(())
    }

    /// Stage id of the filter with `role`, if it has been built.
    pub fn stage_for(&self, role: StageRole) -> Option<StageId> {
        FILTER_ROLES
            .iter()
            .position(|r| *r == role)
            .and_then(|idx| self.slots[idx])
    }

    /// Whether every filter has a stage.
    pub fn is_built(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// `(role, id)` for every built filter.
    pub fn stages(&self) -> impl Iterator<Item = (StageRole, StageId)> + '_ {
        FILTER_ROLES
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(role, slot)| slot.map(|id| (*role, id)))
    }
}
