//! Log-power FFT for the spectrum branch
//!
//! Turns blocks of IQ samples into power spectra in dB:
//! - window the block
//! - forward FFT
//! - `|X|^2 / N^2` per bin, exponentially averaged across frames
//! - `10 log10` and an `fft_shift` so DC lands in the middle

use crate::error::SdrError;
use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Floor added before taking the log, about -200 dB.
const POWER_FLOOR: f32 = 1e-20;

/// Taper applied to each block before the transform.
///
/// Wider main lobes trade resolution for lower leakage; `Rectangular`
/// resolves close carriers best, `Blackman` keeps weak ones visible next to
/// strong ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FftWindow {
    Rectangular,
    Hann,
    #[default]
    Hamming,
    Blackman,
}

impl FftWindow {
    pub fn all() -> &'static [FftWindow] {
        &[
            FftWindow::Rectangular,
            FftWindow::Hann,
            FftWindow::Hamming,
            FftWindow::Blackman,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            FftWindow::Rectangular => "rectangular",
            FftWindow::Hann => "hann",
            FftWindow::Hamming => "hamming",
            FftWindow::Blackman => "blackman",
        }
    }

    /// Cosine-sum terms `a0 - a1 cos(x) + a2 cos(2x)`.
    fn terms(&self) -> (f64, f64, f64) {
        match self {
            FftWindow::Rectangular => (1.0, 0.0, 0.0),
            FftWindow::Hann => (0.5, 0.5, 0.0),
            FftWindow::Hamming => (0.54, 0.46, 0.0),
            FftWindow::Blackman => (0.42, 0.5, 0.08),
        }
    }

    /// `n` periodic taps, clamped to `[0, 1]`.
    pub fn taps(&self, n: usize) -> Vec<f32> {
        let (a0, a1, a2) = self.terms();
        (0..n)
            .map(|i| {
                let x = 2.0 * PI * i as f64 / n as f64;
                (a0 - a1 * x.cos() + a2 * (2.0 * x).cos()).clamp(0.0, 1.0) as f32
            })
            .collect()
    }
}

impl fmt::Display for FftWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FftWindow {
    type Err = SdrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|w| w.name() == wanted)
            .ok_or_else(|| SdrError::InvalidEntry(s.to_string()))
    }
}

/// Rotate a spectrum so the zero-frequency bin sits at index `len / 2`.
///
/// Negative frequencies occupy the upper `len / 2` bins of the transform;
/// they move to the front.
pub fn fft_shift<T>(bins: &mut [T]) {
    let half = bins.len() / 2;
    bins.rotate_right(half);
}
/// Windowed, averaged log-power spectrum of complex blocks
pub struct LogPowerFft {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex32>,
    scratch: Vec<Complex32>,
    averaged: Vec<f32>,
    output: Vec<f32>,
    avg_alpha: f32,
    primed: bool,
}

impl LogPowerFft {
    /// `avg_alpha` is the weight of the newest frame, in `(0, 1]`.
    pub fn new(size: usize, window: FftWindow, avg_alpha: f64) -> Self {
        let size = size.max(1);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(size);
        let scratch = vec![Complex32::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self {
            fft,
            window: window.taps(size),
            buffer: vec![Complex32::new(0.0, 0.0); size],
            scratch,
            averaged: vec![0.0; size],
            output: vec![0.0; size],
            avg_alpha: (avg_alpha as f32).clamp(f32::EPSILON, 1.0),
            primed: false,
        }
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Forget the running average.
    pub fn reset(&mut self) {
        self.primed = false;
    }

    /// Process one block and return the centered spectrum in dB.
    ///
    /// Short blocks are zero-padded; long ones are truncated.
    pub fn process(&mut self, block: &[Complex32]) -> &[f32] {
        let n = self.buffer.len();
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            *slot = block.get(i).map_or(Complex32::new(0.0, 0.0), |s| s * self.window[i]);
        }
        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let norm = 1.0 / (n as f32 * n as f32);
        for (avg, bin) in self.averaged.iter_mut().zip(&self.buffer) {
            let power = bin.norm_sqr() * norm;
            if self.primed {
                *avg += self.avg_alpha * (power - *avg);
            } else {
                *avg = power;
            }
        }
        self.primed = true;

        for (out, avg) in self.output.iter_mut().zip(&self.averaged) {
            *out = 10.0 * (avg + POWER_FLOOR).log10();
        }
        fft_shift(&mut self.output);
        &self.output
    }
}

impl std::fmt::Debug for LogPowerFft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogPowerFft")
            .field("size", &self.size())
            .field("avg_alpha", &self.avg_alpha)
            .finish()
    }
}
