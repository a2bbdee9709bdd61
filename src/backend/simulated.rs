//! Simulated receiver for running without hardware
//!
//! `SimulatedFrontEnd` implements [`FrontEnd`] over shared tuning state, and
//! hands out [`SimulatedSamples`] that synthesize IQ for the current tuning:
//! a set of carriers at absolute frequencies plus uniform noise.

use crate::backend::frontend::FrontEnd;
use crate::error::{Result, SdrError};
use crate::spectrum::engine::SampleSource;
use rustfft::num_complex::Complex32;
use std::f64::consts::TAU;
use std::sync::{Arc, PoisonError, RwLock};

/// A carrier visible to the simulated receiver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedSignal {
    /// Absolute frequency in Hz
    pub freq_hz: f64,
    /// Linear amplitude
    pub amplitude: f32,
}

#[derive(Debug, Clone)]
struct Tuning {
    center_hz: f64,
    sample_rate: f64,
    bandwidth: f64,
    gains: Vec<(String, f64)>,
}

/// Simulated tunable receiver
#[derive(Debug, Clone)]
pub struct SimulatedFrontEnd {
    tuning: Arc<RwLock<Tuning>>,
    gain_names: Vec<String>,
    sample_rates: Vec<f64>,
    bandwidths: Vec<f64>,
    signals: Vec<SimulatedSignal>,
    noise_amplitude: f32,
}

impl SimulatedFrontEnd {
    /// A receiver with `LNA`/`VGA` gain stages and a handful of RTL-style rates.
    pub fn new() -> Self {
        Self {
            tuning: Arc::new(RwLock::new(Tuning {
                center_hz: 0.0,
                sample_rate: 0.0,
                bandwidth: 0.0,
                gains: Vec::new(),
            })),
            gain_names: vec!["LNA".to_string(), "VGA".to_string()],
            sample_rates: vec![1.024e6, 2.048e6, 2.4e6, 3.2e6],
            bandwidths: Vec::new(),
            signals: Vec::new(),
            noise_amplitude: 1e-3,
        }
    }

    /// A receiver that reports no gain stages, as when no device is plugged in.
    pub fn absent() -> Self {
        Self {
            gain_names: Vec::new(),
            ..Self::new()
        }
    }

    /// Report these sample rates instead; an empty list exercises the fallback table.
    pub fn with_sample_rates(mut self, rates: Vec<f64>) -> Self {
        self.sample_rates = rates;
        self
    }

    pub fn with_bandwidths(mut self, bandwidths: Vec<f64>) -> Self {
        self.bandwidths = bandwidths;
        self
    }

    pub fn with_signal(mut self, freq_hz: f64, amplitude: f32) -> Self {
        self.signals.push(SimulatedSignal { freq_hz, amplitude });
        self
    }

    pub fn with_noise(mut self, amplitude: f32) -> Self {
        self.noise_amplitude = amplitude;
        self
    }

    pub fn center_freq(&self) -> f64 {
        self.read().center_hz
    }

    pub fn bandwidth(&self) -> f64 {
        self.read().bandwidth
    }

    /// Last value set on `stage`.
    pub fn gain(&self, stage: &str) -> Option<f64> {
        self.read()
            .gains
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, value)| *value)
    }

    /// IQ generator that follows this receiver's tuning.
    pub fn samples(&self) -> SimulatedSamples {
        SimulatedSamples {
            tuning: Arc::clone(&self.tuning),
            signals: self.signals.clone(),
            noise_amplitude: self.noise_amplitude,
            sample_index: 0,
            seed: 0x2545_F491_4F6C_DD1D,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tuning> {
        self.tuning.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tuning> {
        self.tuning.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatedFrontEnd {
    fn default() -> Self {
        Self::new()
    }
}

impl FrontEnd for SimulatedFrontEnd {
    fn gain_stage_names(&self) -> Vec<String> {
        self.gain_names.clone()
    }

    fn set_gain(&mut self, value: f64, stage: &str, channel: usize) -> Result<()> {
        if channel != 0 {
            return Err(SdrError::FrontEnd(format!("no channel {}", channel)));
        }
        let mut tuning = self.write();
        tuning.gains.retain(|(name, _)| name != stage);
        tuning.gains.push((stage.to_string(), value));
        Ok(())
    }

    fn bandwidth_range(&self) -> Vec<f64> {
        self.bandwidths.clone()
    }

    fn set_bandwidth(&mut self, hz: f64) -> Result<()> {
        self.write().bandwidth = hz;
        Ok(())
    }

    fn sample_rate_options(&self) -> Vec<f64> {
        self.sample_rates.clone()
    }

    fn set_sample_rate(&mut self, hz: f64) -> Result<()> {
        if !(hz.is_finite() && hz >= 0.0) {
            return Err(SdrError::FrontEnd(format!("invalid sample rate {}", hz)));
        }
        self.write().sample_rate = hz;
        Ok(())
    }

    fn sample_rate(&self) -> f64 {
        self.read().sample_rate
    }

    fn set_center_freq(&mut self, hz: f64, channel: usize) -> Result<()> {
        if channel != 0 {
            return Err(SdrError::FrontEnd(format!("no channel {}", channel)));
        }
        self.write().center_hz = hz;
        Ok(())
    }
}

/// IQ stream synthesized from the shared tuning.
#[derive(Debug)]
pub struct SimulatedSamples {
    tuning: Arc<RwLock<Tuning>>,
    signals: Vec<SimulatedSignal>,
    noise_amplitude: f32,
    sample_index: u64,
    seed: u64,
}

impl SimulatedSamples {
    /// xorshift64, mapped to `[-1, 1)`
    fn next_noise(&mut self) -> f32 {
        let mut s = self.seed;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.seed = s;
        ((s >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0) as f32
    }
}

impl SampleSource for SimulatedSamples {
    fn sample_rate(&self) -> f64 {
        self.tuning
            .read()
            .map(|t| t.sample_rate)
            .unwrap_or(0.0)
    }

    fn read_block(&mut self, buf: &mut [Complex32]) -> Result<usize> {
        let (center_hz, rate) = {
            let tuning = self.tuning.read().unwrap_or_else(PoisonError::into_inner);
            (tuning.center_hz, tuning.sample_rate)
        };
        if rate <= 0.0 {
            return Ok(0);
        }

        // Carriers outside the sampled band alias away; leave them out.
        let visible: Vec<(f64, f32)> = self
            .signals
            .iter()
            .map(|s| (s.freq_hz - center_hz, s.amplitude))
            .filter(|(offset, _)| offset.abs() < rate / 2.0)
            .collect();

        for sample in buf.iter_mut() {
            let t = self.sample_index as f64 / rate;
            let mut acc = Complex32::new(0.0, 0.0);
            for &(offset, amplitude) in &visible {
                let phase = (TAU * offset * t) % TAU;
                acc += Complex32::from_polar(amplitude, phase as f32);
            }
            let noise = Complex32::new(self.next_noise(), self.next_noise());
            *sample = acc + noise * self.noise_amplitude;
            self.sample_index = self.sample_index.wrapping_add(1);
        }
        Ok(buf.len())
    }
}
