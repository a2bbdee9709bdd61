//! The receive signal path and its reconfiguration rules.
//!
//! [`Radio`] owns the stage graph, the filter bank and the collaborators. It
//! is the only place that mutates a [`PipelineConfiguration`], and it does so
//! through three kinds of change:
//!
//! - **Full rebuild** (mode, sample rate, audio rate, first build): halt and
//!   drain, disconnect everything, recompute ratios and offsets, rebuild the
//!   filters in place, recreate the chain stages and wire the new topology.
//!   Streaming resumes if it was running.
//! - **Coefficient change** (bandwidth, tuning offset, squelch, volume):
//!   in-place updates only; the topology and every `StageId` survive.
//! - **Start/Stop**: open or close the streaming gate. Stop never fails.

pub mod filters;
pub mod offset;
pub mod ratio;
pub mod topology;

use crate::backend::{AudioBackend, FrontEnd, FrontEndOptions, DEFAULT_LNA_GAIN, LNA_STAGE};
use crate::config::RadioConfig;
use crate::error::{Result, ResultExt, SdrError};
use crate::pipeline::error::PipelineError;
use crate::pipeline::bridge::{EdgeSnapshot, StageSnapshot, TopologySnapshot};
use crate::pipeline::graph::{FlowGraph, StreamGate};
use crate::pipeline::id::StageId;
use crate::pipeline::stage::{Coefficients, StageRole};
use crate::spectrum::FftWindow;
use crate::types::{Bandwidth, Mode, RadioStatus};

pub use filters::FilterBank;
pub use offset::{clamp, FrequencyOffsetCoordinator, CW_BASE_HZ};
pub use ratio::{gcd, ResampleRatio};
pub use topology::{ChainParams, ChainStages, CoreStages};

/// Rate between the RF and audio rates used by the wideband chain.
pub const INTERMEDIATE_RATE: f64 = 240e3;

/// Spectrum branch parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumSettings {
    pub fft_size: usize,
    pub frame_rate: u32,
    pub avg_alpha: f64,
    pub window: FftWindow,
}

impl Default for SpectrumSettings {
    fn default() -> Self {
        Self {
            fft_size: 4096,
            frame_rate: 60,
            avg_alpha: 0.5,
            window: FftWindow::default(),
        }
    }
}

/// Everything that shapes the signal path.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfiguration {
    pub mode: Mode,
    pub rf_sample_rate: f64,
    pub audio_rate: f64,
    pub intermediate_rate: f64,
    pub bandwidth: Bandwidth,
    pub offsets: FrequencyOffsetCoordinator,
    pub squelch_level_db: f64,
    pub volume: f32,
}

impl Default for PipelineConfiguration {
    fn default() -> Self {
        Self::from(&RadioConfig::default())
    }
}

impl From<&RadioConfig> for PipelineConfiguration {
    fn from(config: &RadioConfig) -> Self {
        let mut offsets = FrequencyOffsetCoordinator::new(config.audio_rate);
        offsets.set_mode(config.mode);
        Self {
            mode: config.mode,
            rf_sample_rate: config.sample_rate,
            audio_rate: config.audio_rate,
            intermediate_rate: INTERMEDIATE_RATE,
            bandwidth: config.bandwidth,
            offsets,
            squelch_level_db: config.squelch_db,
            volume: config.volume,
        }
    }
}

impl PipelineConfiguration {
    /// Rate seen by the translate stage and the channel filter that follows.
    pub fn channel_rate(&self) -> f64 {
        if self.mode == Mode::Wfm {
            self.intermediate_rate
        } else {
            self.audio_rate
        }
    }
}

/// Stages created on the first successful build and kept afterwards.
#[derive(Debug, Clone, Copy)]
struct PersistentStages {
    source: StageId,
    translate: StageId,
    power_fft: StageId,
    spectrum_probe: StageId,
}

/// The signal-path state machine.
pub struct Radio {
    config: PipelineConfiguration,
    spectrum: SpectrumSettings,
    tuned_hz: f64,
    front_end: Box<dyn FrontEnd>,
    audio: Box<dyn AudioBackend>,
    graph: FlowGraph,
    filters: FilterBank,
    persistent: Option<PersistentStages>,
    audio_sink: Option<StageId>,
    audio_rate_opened: Option<f64>,
    chain: Option<ChainStages>,
    options: Option<FrontEndOptions>,
    status: RadioStatus,
    /// Why the last build failed; `start` reports it while `Errored`.
    last_failure: Option<SdrError>,
}

impl Radio {
    pub fn new(
        config: PipelineConfiguration,
        front_end: Box<dyn FrontEnd>,
        audio: Box<dyn AudioBackend>,
    ) -> Self {
        Self {
            config,
            spectrum: SpectrumSettings::default(),
            tuned_hz: 0.0,
            front_end,
            audio,
            graph: FlowGraph::new(),
            filters: FilterBank::new(),
            persistent: None,
            audio_sink: None,
            audio_rate_opened: None,
            chain: None,
            options: None,
            status: RadioStatus::Unbuilt,
            last_failure: None,
        }
    }

    pub fn with_spectrum(mut self, spectrum: SpectrumSettings) -> Self {
        self.spectrum = spectrum;
        self
    }

    // ── Accessors ──

    pub fn config(&self) -> &PipelineConfiguration {
        &self.config
    }

    pub fn status(&self) -> &RadioStatus {
        &self.status
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn tuned_hz(&self) -> f64 {
        self.tuned_hz
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn filters(&self) -> &FilterBank {
        &self.filters
    }

    pub fn chain(&self) -> Option<&ChainStages> {
        self.chain.as_ref()
    }

    pub fn offsets(&self) -> &FrequencyOffsetCoordinator {
        &self.config.offsets
    }

    /// Option tables from the last build, if the device was found.
    pub fn options(&self) -> Option<&FrontEndOptions> {
        self.options.as_ref()
    }

    /// Rate the front end is actually running at.
    pub fn live_sample_rate(&self) -> f64 {
        self.front_end.sample_rate()
    }

    /// Gate for worker threads that consume the stream.
    pub fn gate(&self) -> StreamGate {
        self.graph.gate()
    }

    pub fn core_stages(&self) -> Option<CoreStages> {
        let persistent = self.persistent?;
        Some(CoreStages {
            source: persistent.source,
            translate: persistent.translate,
            power_fft: persistent.power_fft,
            spectrum_probe: persistent.spectrum_probe,
            audio_sink: self.audio_sink?,
        })
    }

    pub fn topology(&self) -> TopologySnapshot {
        TopologySnapshot {
            stages: self
                .graph
                .stages()
                .map(|stage| StageSnapshot {
                    id: stage.id(),
                    role: stage.role(),
                    revision: stage.revision(),
                })
                .collect(),
            edges: self
                .graph
                .edges()
                .iter()
                .map(|edge| EdgeSnapshot {
                    id: edge.id,
                    from: edge.from,
                    to: edge.to,
                })
                .collect(),
        }
    }

    /// Roles of the stages currently touched by an edge.
    pub fn connected_roles(&self) -> Vec<StageRole> {
        self.graph
            .connected_stages()
            .into_iter()
            .filter_map(|id| self.graph.stage(id))
            .map(|stage| stage.role())
            .collect()
    }

    // ── Full rebuild ──

    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.config.mode = mode;
        self.config.offsets.set_mode(mode);
        self.rebuild()
    }

    pub fn set_sample_rate(&mut self, hz: f64) -> Result<()> {
        self.config.rf_sample_rate = hz;
        self.rebuild()
    }

    pub fn set_audio_rate(&mut self, hz: f64) -> Result<()> {
        self.config.audio_rate = hz;
        self.config.offsets.set_audio_rate(hz);
        self.rebuild()
    }

    /// Halt, drain, rewire for the current configuration, and resume if
    /// streaming was on. Safe to call repeatedly and from error paths.
    pub fn rebuild(&mut self) -> Result<()> {
        let resume = self.graph.is_streaming();
        self.halt()?;

        match self.build() {
            Ok(true) => {
                self.status = RadioStatus::Stopped;
                self.last_failure = None;
                tracing::info!(
                    "Rebuilt {} pipeline at {} Hz (audio {} Hz)",
                    self.config.mode,
                    self.config.rf_sample_rate,
                    self.config.audio_rate
                );
                if resume {
                    self.start()?;
                }
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                // Leave nothing half-wired behind.
                if let Err(cleanup) = self.graph.disconnect_all() {
                    tracing::warn!("Cleanup after failed build failed: {}", cleanup);
                }
                if !matches!(self.status, RadioStatus::NoDevice | RadioStatus::Errored(_)) {
                    self.status = RadioStatus::Errored(e.to_string());
                }
                self.last_failure = Some(e.replay());
                Err(e)
            }
        }
    }

    /// Stop the gate, wait for in-flight work, and drop every edge.
    fn halt(&mut self) -> Result<()> {
        self.graph.stop();
        self.graph.wait();
        self.graph.disconnect_all()?;
        Ok(())
    }

    /// Returns `Ok(false)` when construction was deferred.
    fn build(&mut self) -> Result<bool> {
        if self.front_end.gain_stage_names().is_empty() {
            tracing::warn!("Front end reports no gain stages; nothing built");
            self.status = RadioStatus::NoDevice;
            self.options = None;
            return Err(SdrError::DeviceNotFound);
        }
        self.front_end
            .set_gain(DEFAULT_LNA_GAIN, LNA_STAGE, 0)
            .context("Failed to set LNA gain")?;

        let options = FrontEndOptions::query(self.front_end.as_ref());
        if let Some(rate) = options.resolve_sample_rate(self.config.rf_sample_rate) {
            self.config.rf_sample_rate = rate;
            self.front_end
                .set_sample_rate(rate)
                .context("Failed to set sample rate")?;
        }
        self.options = Some(options);

        // Trust the readback over the request.
        let live_rate = self.front_end.sample_rate();
        let ratios = ResampleRatio::from_rates(live_rate, self.config.audio_rate).and_then(
            |narrow| {
                ResampleRatio::from_rates(live_rate, self.config.intermediate_rate)
                    .map(|wide| (narrow, wide))
            },
        );
        let (narrow, wide) = match ratios {
            Ok(pair) => pair,
            Err(e @ SdrError::DegenerateRate { .. }) => {
                tracing::warn!("Deferring build: {}", e);
                self.status = RadioStatus::Deferred;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        self.config.rf_sample_rate = live_rate;

        self.ensure_audio_sink()?;
        self.filters.rebuild(&mut self.graph, &self.config)?;
        self.ensure_persistent_stages()?;

        let params = ChainParams {
            mode: self.config.mode,
            narrow,
            wide,
            audio_rate: self.config.audio_rate,
            intermediate_rate: self.config.intermediate_rate,
            squelch_level_db: self.config.squelch_level_db,
            volume: self.config.volume,
        };
        let chain = match self.chain {
            Some(chain) => {
                chain.update(&mut self.graph, &params)?;
                chain
            }
            None => {
                let chain = ChainStages::create(&mut self.graph, &params)?;
                self.chain = Some(chain);
                chain
            }
        };

        let core = self
            .core_stages()
            .ok_or(SdrError::Pipeline(PipelineError::InvalidStage(StageId::INVALID)))?;
        topology::wire(
            &mut self.graph,
            self.config.mode,
            &core,
            &chain,
            &self.filters,
        )?;
        self.graph.compiled_plan().verify()?;
        Ok(true)
    }

    /// Open the audio device and create its stage on first use; reopen on a
    /// rate change but keep the stage.
    fn ensure_audio_sink(&mut self) -> Result<()> {
        let rate = self.config.audio_rate;
        if self.audio_rate_opened != Some(rate) {
            if let Err(e) = self.audio.open(rate) {
                tracing::warn!("Audio sink failed at {} Hz: {}", rate, e);
                self.status = RadioStatus::Errored(e.to_string());
                self.audio_rate_opened = None;
                return Err(match e {
                    SdrError::AudioSink(_) => e,
                    other => SdrError::AudioSink(other.to_string()),
                });
            }
            self.audio_rate_opened = Some(rate);
        }

        match self.audio_sink {
            Some(id) => self.graph.update_coefficients(id, Coefficients::Rate(rate))?,
            None => {
                let id = self
                    .graph
                    .add_stage(StageRole::AudioSink, Coefficients::Rate(rate))?;
                self.audio_sink = Some(id);
            }
        }
        Ok(())
    }

    fn ensure_persistent_stages(&mut self) -> Result<()> {
        let source = Coefficients::Rate(self.config.rf_sample_rate);
        let translate = self.translate_coefficients();
        let power_fft = Coefficients::PowerFft {
            sample_rate: self.config.rf_sample_rate,
            fft_size: self.spectrum.fft_size,
            frame_rate: self.spectrum.frame_rate,
            avg_alpha: self.spectrum.avg_alpha,
        };

        match self.persistent {
            Some(p) => {
                self.graph.update_coefficients(p.source, source)?;
                self.graph.update_coefficients(p.translate, translate)?;
                self.graph.update_coefficients(p.power_fft, power_fft)?;
            }
            None => {
                self.persistent = Some(PersistentStages {
                    source: self.graph.add_stage(StageRole::Source, source)?,
                    translate: self.graph.add_stage(StageRole::Translate, translate)?,
                    power_fft: self.graph.add_stage(StageRole::LogPowerFft, power_fft)?,
                    spectrum_probe: self
                        .graph
                        .add_stage(StageRole::SpectrumProbe, Coefficients::None)?,
                });
            }
        }
        Ok(())
    }

    fn translate_coefficients(&self) -> Coefficients {
        Coefficients::Translate {
            center_hz: self.config.offsets.effective_translation(false),
            sample_rate: self.config.channel_rate(),
        }
    }

    // ── In-place changes ──

    /// Select a filter width. Only coefficients change.
    pub fn set_bandwidth(&mut self, bandwidth: Bandwidth) -> Result<()> {
        self.config.bandwidth = bandwidth;
        if self.filters.is_built() {
            self.filters.rebuild(&mut self.graph, &self.config)?;
        }
        Ok(())
    }

    /// Retune the front end and re-center the translate stage.
    pub fn set_frequency(&mut self, hz: f64) -> Result<()> {
        self.tuned_hz = hz;
        self.front_end
            .set_center_freq(hz, 0)
            .with_context(|| format!("Failed to tune to {} Hz", hz))?;
        self.update_translation()
    }

    /// Move the demodulated channel away from the tuned center.
    pub fn set_pan_offset(&mut self, hz: f64) -> Result<()> {
        self.config.offsets.set_pan_offset(hz);
        self.update_translation()
    }

    fn update_translation(&mut self) -> Result<()> {
        if let Some(p) = self.persistent {
            let coefficients = self.translate_coefficients();
            self.graph.update_coefficients(p.translate, coefficients)?;
        }
        Ok(())
    }

    pub fn set_squelch(&mut self, level_db: f64) -> Result<()> {
        self.config.squelch_level_db = level_db;
        if let Some(chain) = self.chain {
            let squelch = |graph: &mut FlowGraph, id| {
                graph.update_coefficients(
                    id,
                    Coefficients::Squelch {
                        threshold_db: level_db,
                        alpha: topology::SQUELCH_ALPHA,
                    },
                )
            };
            squelch(&mut self.graph, chain.squelch_complex)?;
            squelch(&mut self.graph, chain.squelch_real)?;
        }
        Ok(())
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.config.volume = volume;
        if let Some(chain) = self.chain {
            self.graph
                .update_coefficients(chain.volume, Coefficients::Gain(volume))?;
        }
        Ok(())
    }

    /// Analog bandwidth of the front end, snapped to a supported value.
    pub fn set_front_end_bandwidth(&mut self, hz: f64) -> Result<f64> {
        let resolved = self
            .options
            .as_ref()
            .and_then(|options| options.resolve_bandwidth(hz))
            .unwrap_or(hz);
        self.front_end
            .set_bandwidth(resolved)
            .context("Failed to set front-end bandwidth")?;
        Ok(resolved)
    }

    // ── Streaming ──

    /// Begin streaming. Refused unless a build has succeeded.
    pub fn start(&mut self) -> Result<()> {
        if !self.status.can_start() {
            return Err(match &self.status {
                RadioStatus::NoDevice => SdrError::DeviceNotFound,
                RadioStatus::Errored(msg) => match &self.last_failure {
                    Some(failure) => failure.replay(),
                    None => SdrError::Config(format!("cannot start: {}", msg)),
                },
                other => SdrError::Config(format!("cannot start while {}", other)),
            });
        }
        if self.tuned_hz > 0.0 {
            self.front_end
                .set_center_freq(self.tuned_hz, 0)
                .context("Failed to tune before start")?;
        }
        self.graph.start();
        self.status = RadioStatus::Running;
        Ok(())
    }

    /// Stop streaming and wait for in-flight work. Never fails.
    pub fn stop(&mut self) {
        self.graph.stop();
        self.graph.wait();
        if self.status == RadioStatus::Running {
            self.status = RadioStatus::Stopped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::audio::MockAudioBackend;
    use crate::backend::frontend::MockFrontEnd;
    use crate::backend::{NullAudio, SimulatedFrontEnd};

    fn radio_with(mode: Mode) -> Radio {
        let mut config = PipelineConfiguration::default();
        config.mode = mode;
        config.offsets.set_mode(mode);
        Radio::new(
            config,
            Box::new(SimulatedFrontEnd::new()),
            Box::new(NullAudio::new()),
        )
    }

    #[test]
    fn test_first_build_wires_default_mode() {
        let mut radio = radio_with(Mode::Wfm);
        radio.rebuild().unwrap();
        assert_eq!(radio.status(), &RadioStatus::Stopped);

        let mut roles = radio.connected_roles();
        let mut expected = topology::connected_roles(Mode::Wfm);
        roles.sort_by_key(|r| r.name());
        expected.sort_by_key(|r| r.name());
        assert_eq!(roles, expected);
    }

    #[test]
    fn test_no_gain_stages_builds_nothing() {
        let mut fe = MockFrontEnd::new();
        fe.expect_gain_stage_names().returning(Vec::new);
        fe.expect_set_gain().never();
        let mut radio = Radio::new(
            PipelineConfiguration::default(),
            Box::new(fe),
            Box::new(NullAudio::new()),
        );

        assert!(matches!(radio.rebuild(), Err(SdrError::DeviceNotFound)));
        assert_eq!(radio.status(), &RadioStatus::NoDevice);
        assert_eq!(radio.graph().stage_count(), 0);
        assert!(matches!(radio.start(), Err(SdrError::DeviceNotFound)));
        radio.stop();
    }

    #[test]
    fn test_audio_failure_leaves_no_edges() {
        let mut audio = MockAudioBackend::new();
        audio
            .expect_open()
            .returning(|_| Err(SdrError::AudioSink("busy".into())));
        let mut radio = Radio::new(
            PipelineConfiguration::default(),
            Box::new(SimulatedFrontEnd::new()),
            Box::new(audio),
        );

        assert!(matches!(radio.rebuild(), Err(SdrError::AudioSink(_))));
        assert!(matches!(radio.status(), RadioStatus::Errored(_)));
        assert!(radio.graph().edges().is_empty());
        assert!(radio.start().is_err());
        radio.stop();
    }

    #[test]
    fn test_front_end_failure_reported_by_start() {
        let mut fe = MockFrontEnd::new();
        fe.expect_gain_stage_names()
            .returning(|| vec!["LNA".to_string()]);
        fe.expect_set_gain()
            .returning(|_, _, _| Err(SdrError::FrontEnd("gain rejected".into())));
        let mut radio = Radio::new(
            PipelineConfiguration::default(),
            Box::new(fe),
            Box::new(NullAudio::new()),
        );

        assert!(radio.rebuild().is_err());
        assert!(matches!(radio.status(), RadioStatus::Errored(_)));

        let err = radio.start().unwrap_err();
        assert!(err.is_user_facing());
        match err {
            SdrError::WithContext { source, .. } => {
                assert!(matches!(*source, SdrError::FrontEnd(_)))
            }
            other => panic!("expected a front-end failure, got {:?}", other),
        }
    }

    #[test]
    fn test_audio_failure_reported_by_start() {
        let mut audio = MockAudioBackend::new();
        audio
            .expect_open()
            .returning(|_| Err(SdrError::AudioSink("busy".into())));
        let mut radio = Radio::new(
            PipelineConfiguration::default(),
            Box::new(SimulatedFrontEnd::new()),
            Box::new(audio),
        );

        assert!(radio.rebuild().is_err());
        assert!(matches!(radio.start(), Err(SdrError::AudioSink(_))));
    }

    #[test]
    fn test_zero_rate_defers() {
        let mut fe = MockFrontEnd::new();
        fe.expect_gain_stage_names()
            .returning(|| vec!["LNA".to_string()]);
        fe.expect_set_gain().returning(|_, _, _| Ok(()));
        fe.expect_bandwidth_range().returning(Vec::new);
        fe.expect_sample_rate_options().returning(Vec::new);
        fe.expect_set_sample_rate().returning(|_| Ok(()));
        fe.expect_sample_rate().return_const(0.0);

        let mut radio = Radio::new(
            PipelineConfiguration::default(),
            Box::new(fe),
            Box::new(NullAudio::new()),
        );
        radio.rebuild().unwrap();
        assert_eq!(radio.status(), &RadioStatus::Deferred);
        assert!(radio.graph().edges().is_empty());
        assert!(radio.start().is_err());
    }

    #[test]
    fn test_bandwidth_change_keeps_edges() {
        let mut radio = radio_with(Mode::Am);
        radio.rebuild().unwrap();
        radio.start().unwrap();
        let before = radio.graph().edges().to_vec();

        radio.set_bandwidth(Bandwidth::Narrow).unwrap();

        assert_eq!(radio.graph().edges(), before.as_slice());
        assert!(radio.status().is_running());
        let am = radio.filters().stage_for(StageRole::LowPassAm).unwrap();
        assert_eq!(radio.graph().stage(am).unwrap().revision(), 1);
    }

    #[test]
    fn test_mode_change_restarts_streaming() {
        let mut radio = radio_with(Mode::Am);
        radio.rebuild().unwrap();
        radio.start().unwrap();

        radio.set_mode(Mode::Usb).unwrap();
        assert!(radio.status().is_running());
        assert!(radio.graph().is_streaming());
        assert!(radio.connected_roles().contains(&StageRole::LowPassSsb));
        assert!(!radio.connected_roles().contains(&StageRole::LowPassAm));
    }

    #[test]
    fn test_translate_keeps_identity_across_rebuilds() {
        let mut radio = radio_with(Mode::Fm);
        radio.rebuild().unwrap();
        let before = radio.core_stages().unwrap();
        radio.set_mode(Mode::CwLsb).unwrap();
        let after = radio.core_stages().unwrap();
        assert_eq!(before, after);

        let translate = radio.graph().stage(after.translate).unwrap();
        assert_eq!(
            translate.coefficients(),
            &Coefficients::Translate {
                center_hz: 375.0,
                sample_rate: 48_000.0,
            }
        );
    }

    #[test]
    fn test_set_frequency_updates_front_end_and_translate() {
        let fe = SimulatedFrontEnd::new();
        let handle = fe.clone();
        let mut radio = Radio::new(
            PipelineConfiguration::default(),
            Box::new(fe),
            Box::new(NullAudio::new()),
        );
        radio.rebuild().unwrap();
        let edges = radio.graph().edges().to_vec();

        radio.set_pan_offset(5_000.0).unwrap();
        radio.set_frequency(101.1e6).unwrap();

        assert_eq!(handle.center_freq(), 101.1e6);
        assert_eq!(handle.gain(LNA_STAGE), Some(DEFAULT_LNA_GAIN));
        assert_eq!(radio.graph().edges(), edges.as_slice());
        let translate = radio.core_stages().unwrap().translate;
        match radio.graph().stage(translate).unwrap().coefficients() {
            Coefficients::Translate { center_hz, .. } => assert_eq!(*center_hz, -5_000.0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_mode_cycling_reuses_chain_stages() {
        let mut radio = radio_with(Mode::Am);
        radio.rebuild().unwrap();
        let chain = *radio.chain().unwrap();
        let count = radio.graph().stage_count();

        for i in 0..1000 {
            let mode = if i % 2 == 0 { Mode::Usb } else { Mode::Am };
            radio.set_mode(mode).unwrap();
        }

        assert_eq!(radio.graph().stage_count(), count);
        assert_eq!(radio.chain().unwrap().ids(), chain.ids());
        assert_eq!(radio.status(), &RadioStatus::Stopped);
    }

    #[test]
    fn test_every_mode_feeds_both_sinks() {
        let mut radio = radio_with(Mode::Am);
        radio.rebuild().unwrap();
        let core = radio.core_stages().unwrap();

        for &mode in Mode::all() {
            radio.set_mode(mode).unwrap();
            let plan = radio.graph.compiled_plan();
            assert_eq!(plan.verify(), Ok(()), "mode {}", mode);
            assert!(plan.carries(core.audio_sink), "mode {}", mode);
            assert!(plan.carries(core.spectrum_probe), "mode {}", mode);
            assert_eq!(plan.order.first(), Some(&core.source));
        }
    }

    #[test]
    fn test_plan_check_flags_unfed_audio_sink() {
        let mut radio = radio_with(Mode::Am);
        radio.rebuild().unwrap();
        let core = radio.core_stages().unwrap();

        // Spectrum branch only: the audio sink hears nothing.
        radio.halt().unwrap();
        radio
            .graph
            .connect(core.source.port(0), core.power_fft.port(0))
            .unwrap();
        radio
            .graph
            .connect(core.power_fft.port(0), core.spectrum_probe.port(0))
            .unwrap();

        assert_eq!(
            radio.graph.compiled_plan().verify(),
            Err(PipelineError::StarvedSink(core.audio_sink))
        );
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut radio = radio_with(Mode::Wfm);
        radio.stop();
        radio.rebuild().unwrap();
        radio.start().unwrap();
        radio.stop();
        radio.stop();
        assert_eq!(radio.status(), &RadioStatus::Stopped);
        radio.rebuild().unwrap();
        radio.rebuild().unwrap();
        assert_eq!(radio.status(), &RadioStatus::Stopped);
    }
}
