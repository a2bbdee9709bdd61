//! Spectrum display geometry
//!
//! Rendering itself happens elsewhere; this module owns the view state and
//! the math shared by drawing and input handling.
//!
//! # Components
//!
//! - [`CoordinateMapper`] - zoom window over the normalized band
//! - [`DisplayMapping`] - view state plus pixel, frequency and dB conversions
//! - [`GestureHandler`] - drag, wheel, key and click handling

pub mod gesture;
pub mod mapping;

pub use gesture::{DisplayEvent, DisplayKey, GestureHandler, GestureOutcome};
pub use mapping::{
    clamp_zoom, format_mhz, lerp, CoordinateMapper, DbLabel, DisplayMapping, FrequencyTick,
    Readout, ZOOM_MAX,
};
