//! External collaborators: the receiver front end and the audio device
//!
//! The radio never talks to hardware directly. It drives a [`FrontEnd`] for
//! gain, bandwidth, sample rate and tuning, and opens an [`AudioBackend`]
//! once per build.
//!
//! # Components
//!
//! - [`FrontEnd`] / [`FrontEndOptions`] - receiver controls and the option tables derived from them
//! - [`SimulatedFrontEnd`] - synthesized carriers for running without hardware
//! - [`AudioBackend`] / [`NullAudio`] - audio device that only has to open

pub mod audio;
pub mod frontend;
pub mod simulated;

pub use audio::{AudioBackend, NullAudio};
pub use frontend::{FrontEnd, FrontEndOptions, DEFAULT_LNA_GAIN, LNA_STAGE};
pub use simulated::{SimulatedFrontEnd, SimulatedSamples, SimulatedSignal};
