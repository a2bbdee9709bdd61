//! Frequency/zoom coordinate mapping
//!
//! The spectrum display shows a window `[lo, hi]` of the normalized band
//! `[0, 1]`, where 0 is `center - sample_rate/2` and 1 is
//! `center + sample_rate/2`. Zooming narrows the window symmetrically; the
//! widest zoom keeps a sliver of the band visible.
//!
//! [`CoordinateMapper`] owns the window. [`DisplayMapping`] adds the tuned
//! frequency, sample rate, dB scale and pixel size, and turns all of that
//! into pixel positions, readouts and scale labels.

use crate::config::RadioConfig;

/// Largest zoom factor; the visible window never collapses.
pub const ZOOM_MAX: f64 = 0.499;

/// dB scale restored by a view reset.
pub const RESET_DB_LO: f64 = -120.0;
pub const RESET_DB_HI: f64 = 10.0;

/// Frequency scale divisions.
pub const FREQUENCY_STEPS: usize = 10;

/// Linear map of `x` from `[xa, xb]` onto `[ya, yb]`.
#[inline]
pub fn lerp(x: f64, xa: f64, xb: f64, ya: f64, yb: f64) -> f64 {
    (x - xa) * (yb - ya) / (xb - xa) + ya
}

/// Clamp a zoom factor to `[0, ZOOM_MAX]`. NaN maps to no zoom.
pub fn clamp_zoom(z: f64) -> f64 {
    if z.is_nan() {
        0.0
    } else {
        z.clamp(0.0, ZOOM_MAX)
    }
}

/// Maps between normalized display position and normalized band position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    zoom: f64,
    window_lo: f64,
    window_hi: f64,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self {
            zoom: 0.0,
            window_lo: 0.0,
            window_hi: 1.0,
        }
    }
}

impl CoordinateMapper {
    pub fn new(zoom: f64) -> Self {
        let mut mapper = Self::default();
        mapper.set_zoom(zoom);
        mapper
    }

    /// Set the zoom factor, clamped; returns the value kept.
    pub fn set_zoom(&mut self, z: f64) -> f64 {
        let z = clamp_zoom(z);
        self.zoom = z;
        self.window_lo = z;
        self.window_hi = 1.0 - z;
        z
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom > 0.0
    }

    /// Visible `(lo, hi)` of the normalized band.
    pub fn window(&self) -> (f64, f64) {
        (self.window_lo, self.window_hi)
    }

    /// Display position to band position.
    #[inline]
    pub fn to_window(&self, x: f64) -> f64 {
        x * (self.window_hi - self.window_lo) + self.window_lo
    }

    /// Band position to display position.
    #[inline]
    pub fn from_window(&self, x: f64) -> f64 {
        (self.window_lo - x) / (self.window_lo - self.window_hi)
    }

    /// Window moved left by `shift` of the band, re-clamped to `[0, 1]`.
    pub fn shifted_window(&self, shift: f64) -> (f64, f64) {
        (
            (self.window_lo - shift).max(0.0),
            (self.window_hi - shift).min(1.0),
        )
    }

    /// One wheel notch: `z += 0.1 * direction * (0.5 - z)`.
    pub fn wheel(&mut self, direction: f64) -> f64 {
        let z = self.zoom + 0.1 * direction * (0.5 - self.zoom);
        self.set_zoom(z)
    }
}

/// A labelled tick on the frequency scale.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTick {
    pub x: f64,
    pub hz: f64,
    pub label: String,
}

/// A labelled line on the dB scale.
#[derive(Debug, Clone, PartialEq)]
pub struct DbLabel {
    pub y: f64,
    pub db: f64,
    pub label: String,
}

/// Values under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Readout {
    pub hz: f64,
    pub db: f64,
}

impl Readout {
    pub fn frequency_text(&self) -> String {
        format!("{:.3} MHz", self.hz / 1e6)
    }

    pub fn level_text(&self) -> String {
        format!("{:.1} db", self.db)
    }
}

/// View state of the spectrum display.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMapping {
    pub mapper: CoordinateMapper,
    pub center_freq: f64,
    pub sample_rate: f64,
    pub db_lo: f64,
    pub db_hi: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayMapping {
    pub fn new(width: f64, height: f64) -> Self {
        Self::from_config(&RadioConfig::default(), width, height)
    }

    pub fn from_config(config: &RadioConfig, width: f64, height: f64) -> Self {
        Self {
            mapper: CoordinateMapper::new(config.zoom),
            center_freq: config.frequency,
            sample_rate: config.sample_rate,
            db_lo: config.db_lo,
            db_hi: config.db_hi,
            width,
            height,
        }
    }

    /// Copy the persistent view state back into `config`.
    pub fn store_into(&self, config: &mut RadioConfig) {
        config.zoom = self.mapper.zoom();
        config.db_lo = self.db_lo;
        config.db_hi = self.db_hi;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Frequency at band position `n` in `[0, 1]`.
    pub fn band_frequency(&self, n: f64) -> f64 {
        let half = self.sample_rate / 2.0;
        lerp(n, 0.0, 1.0, self.center_freq - half, self.center_freq + half)
    }

    /// Frequency under pixel column `x`.
    pub fn frequency_at(&self, x: f64) -> f64 {
        self.band_frequency(self.mapper.to_window(x / self.width))
    }

    /// dB level under pixel row `y` (row 0 is the top).
    pub fn db_at(&self, y: f64) -> f64 {
        lerp(y, self.height, 0.0, self.db_lo, self.db_hi)
    }

    pub fn readout(&self, x: f64, y: f64) -> Readout {
        Readout {
            hz: self.frequency_at(x),
            db: self.db_at(y),
        }
    }

    /// Pixel position of sample `index` of a `len`-long slice at level `db`.
    #[inline]
    pub fn trace_point(&self, index: usize, len: usize, db: f32) -> (f32, f32) {
        let px = lerp(index as f64, 0.0, len as f64, 0.0, self.width);
        let py = lerp(db as f64, self.db_hi, self.db_lo, 0.0, self.height);
        (px as f32, py as f32)
    }

    /// Pixel column of the tuned center frequency.
    pub fn center_marker_x(&self) -> f64 {
        self.width * self.mapper.from_window(0.5)
    }

    /// Labels for the `FREQUENCY_STEPS - 1` interior divisions.
    pub fn frequency_ticks(&self) -> Vec<FrequencyTick> {
        let steps = FREQUENCY_STEPS as f64;
        (1..FREQUENCY_STEPS)
            .map(|n| {
                let n = n as f64;
                let hz = self.band_frequency(self.mapper.to_window(n / steps));
                FrequencyTick {
                    x: lerp(n, 0.0, steps, 0.0, self.width),
                    hz,
                    label: format_mhz(hz),
                }
            })
            .collect()
    }

    /// One label every tenth of the height, skipping both edges.
    pub fn db_labels(&self) -> Vec<DbLabel> {
        let height = self.height.max(0.0) as usize;
        let step = height / 10;
        if step == 0 {
            return Vec::new();
        }
        (step..height.saturating_sub(step))
            .step_by(step)
            .map(|y| {
                let y = y as f64;
                let db = self.db_at(y);
                DbLabel {
                    y,
                    db,
                    label: format!("{:4}", db.trunc() as i64),
                }
            })
            .collect()
    }

    /// Restore the unzoomed view and the reset dB scale.
    pub fn reset_view(&mut self) {
        self.mapper.set_zoom(0.0);
        self.db_lo = RESET_DB_LO;
        self.db_hi = RESET_DB_HI;
    }

    /// Move both dB bounds by `delta`.
    pub fn shift_db(&mut self, delta: f64) {
        self.db_lo -= delta;
        self.db_hi -= delta;
    }

    /// Scale the dB span about `anchor_db`. Zooming in stops at a 5 dB span.
    pub fn scale_db(&mut self, direction: f64, anchor_db: f64) {
        if self.db_hi - self.db_lo > 5.0 || direction < 0.0 {
            let wd = direction * 0.05;
            self.db_hi -= wd * (self.db_hi - anchor_db);
            self.db_lo -= wd * (self.db_lo - anchor_db);
        }
    }
}

/// MHz label with fewer decimals as the frequency grows.
pub fn format_mhz(hz: f64) -> String {
    let magnitude = (1.0 + hz.max(0.0) / 1e6).log10();
    let decimals = (3 - (magnitude + 0.5) as i64).max(0) as usize;
    format!("{:.*}", decimals, hz / 1e6)
}
