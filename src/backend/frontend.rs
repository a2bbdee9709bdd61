//! FrontEnd trait for the tunable receiver
//!
//! This module provides the interface the radio uses to drive hardware, plus
//! the option tables derived from what the device reports.

use crate::error::Result;

/// Gain applied to the `LNA` stage whenever a device is present.
pub const DEFAULT_LNA_GAIN: f64 = 100.0;
/// Name of the gain stage set on build.
pub const LNA_STAGE: &str = "LNA";

/// Tunable receiver front end
///
/// All methods address channel 0 unless a channel is given. Implementations
/// must be `Send` so the radio can be owned by the control thread.
#[cfg_attr(test, mockall::automock)]
pub trait FrontEnd: Send {
    /// Names of the gain stages. Empty means no device is attached.
    fn gain_stage_names(&self) -> Vec<String>;

    fn set_gain(&mut self, value: f64, stage: &str, channel: usize) -> Result<()>;

    /// Analog bandwidths the device supports. May be empty.
    fn bandwidth_range(&self) -> Vec<f64>;

    fn set_bandwidth(&mut self, hz: f64) -> Result<()>;

    /// Sample rates the device supports. May be empty.
    fn sample_rate_options(&self) -> Vec<f64>;

    fn set_sample_rate(&mut self, hz: f64) -> Result<()>;

    /// Rate the device is actually running at; zero until one is applied.
    fn sample_rate(&self) -> f64;

    fn set_center_freq(&mut self, hz: f64, channel: usize) -> Result<()>;
}

/// Bandwidth and sample-rate choices offered to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontEndOptions {
    pub bandwidths: Vec<f64>,
    pub sample_rates: Vec<f64>,
}

impl FrontEndOptions {
    /// Query `front_end` and apply fallbacks.
    pub fn query(front_end: &dyn FrontEnd) -> Self {
        Self::from_reported(front_end.bandwidth_range(), front_end.sample_rate_options())
    }

    /// Build option tables from device-reported values.
    ///
    /// - no bandwidths: `10^3 ..= 10^8` in decades
    /// - no sample rates: `n * 10^6` for `n` in `1..=23`
    /// - whole-MHz rates below the slowest reported one are prepended
    pub fn from_reported(bandwidths: Vec<f64>, sample_rates: Vec<f64>) -> Self {
        let bandwidths = if bandwidths.is_empty() {
            (3..=8).map(|exp| 10f64.powi(exp)).collect()
        } else {
            bandwidths
        };

        let mut device_rates = if sample_rates.is_empty() {
            (1..=23).map(|n| n as f64 * 1e6).collect()
        } else {
            sample_rates
        };
        device_rates.retain(|r| r.is_finite() && *r > 0.0);
        device_rates.sort_by(f64::total_cmp);
        device_rates.dedup();

        let slowest = device_rates.first().copied().unwrap_or(f64::INFINITY);
        let mut sample_rates: Vec<f64> = (1..=9)
            .map(|n| n as f64 * 1e6)
            .take_while(|r| *r < slowest)
            .collect();
        sample_rates.extend(device_rates);

        Self {
            bandwidths,
            sample_rates,
        }
    }

    /// The option equal to `requested`, else the nearest one.
    pub fn resolve_sample_rate(&self, requested: f64) -> Option<f64> {
        nearest(&self.sample_rates, requested)
    }

    pub fn resolve_bandwidth(&self, requested: f64) -> Option<f64> {
        nearest(&self.bandwidths, requested)
    }
}

fn nearest(options: &[f64], requested: f64) -> Option<f64> {
    options
        .iter()
        .copied()
        .min_by(|a, b| (a - requested).abs().total_cmp(&(b - requested).abs()))
}
