//! Display side of the spectrum branch
//!
//! [`SpectrumFeed`] takes the frame waiting in the [`FrameMailbox`], cuts out
//! the zoomed part of the band, and hands it to the waterfall as raw dB
//! values and to the trace as pixel coordinates. It also keeps the
//! smoothed signal-strength reading taken from the middle of the view.

use crate::display::mapping::DisplayMapping;
use crate::radio::offset::FrequencyOffsetCoordinator;
use crate::spectrum::fft::fft_shift;
use crate::spectrum::mailbox::{FrameMailbox, SpectrumFrame};

/// One-pole smoothing constant of the signal-strength reading.
pub const SIGNAL_SMOOTHING: f32 = 1.0 / 5.0;

/// Receives one line of dB values per displayed frame.
#[cfg_attr(test, mockall::automock)]
pub trait WaterfallSink {
    fn accept_line(&mut self, line: &[f32]);
}

/// Receives the trace as `(x, y)` pixel coordinates.
#[cfg_attr(test, mockall::automock)]
pub trait TraceSink {
    fn accept_points(&mut self, points: &[(f32, f32)]);
}

/// Discards everything. For running without a display.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl WaterfallSink for NullSink {
    fn accept_line(&mut self, _line: &[f32]) {}
}

impl TraceSink for NullSink {
    fn accept_points(&mut self, _points: &[(f32, f32)]) {}
}

/// Turns frames into display lines and trace points.
#[derive(Debug, Default)]
pub struct SpectrumFeed {
    signal_strength: f32,
    centered: Vec<f32>,
    points: Vec<(f32, f32)>,
    frames_shown: u64,
}

impl SpectrumFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smoothed level at the middle of the view, in dB.
    pub fn signal_strength(&self) -> f32 {
        self.signal_strength
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }

    /// Take the waiting frame, if any, and display it.
    pub fn poll(
        &mut self,
        mailbox: &FrameMailbox,
        view: &DisplayMapping,
        offsets: &FrequencyOffsetCoordinator,
        waterfall: &mut dyn WaterfallSink,
        trace: &mut dyn TraceSink,
    ) -> Option<f32> {
        let frame = mailbox.take()?;
        self.on_frame(&frame, view, offsets, waterfall, trace)
    }

    /// Display one frame. Returns the updated signal strength, or `None`
    /// when nothing of the frame is visible.
    pub fn on_frame(
        &mut self,
        frame: &SpectrumFrame,
        view: &DisplayMapping,
        offsets: &FrequencyOffsetCoordinator,
        waterfall: &mut dyn WaterfallSink,
        trace: &mut dyn TraceSink,
    ) -> Option<f32> {
        let len = frame.len();
        if len == 0 || !view.has_area() {
            return None;
        }

        self.centered.clear();
        self.centered.extend_from_slice(&frame.power_db);
        if !frame.centered {
            fft_shift(&mut self.centered);
        }

        // When zoomed, follow the demodulated channel rather than the
        // tuned center.
        let (lo, hi) = if view.mapper.is_zoomed() && view.sample_rate != 0.0 {
            view.mapper
                .shifted_window(offsets.effective_translation(true) / view.sample_rate)
        } else {
            view.mapper.window()
        };
        let start = (lo * len as f64) as usize;
        let end = ((hi * len as f64) as usize).min(len);
        if end <= start {
            return None;
        }
        let visible = &self.centered[start..end];
        let size = visible.len();

        let middle = visible[size / 2];
        self.signal_strength += (middle - self.signal_strength) * SIGNAL_SMOOTHING;

        waterfall.accept_line(visible);

        self.points.clear();
        self.points.extend(
            visible
                .iter()
                .enumerate()
                .map(|(i, &db)| view.trace_point(i, size, db)),
        );
        trace.accept_points(&self.points);

        self.frames_shown += 1;
        Some(self.signal_strength)
    }
}
