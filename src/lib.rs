//! # sdrvis-rs: SDR receiver signal path and spectrum view
//!
//! Reconfigures a software-defined-radio demodulation pipeline as the user
//! switches modes, rates and filters, and maps the live spectrum onto a
//! zoomable frequency display.
//!
//! ## Architecture
//!
//! - **Radio**: mode state machine that wires the stage graph for each demodulation mode
//! - **Pipeline**: stage graph with typed ports, in-place coefficient updates and a streaming gate
//! - **Spectrum**: producer thread, log-power FFT and a single-slot mailbox to the display
//! - **Display**: frequency/zoom coordinate mapping and pan/zoom gestures
//! - **Communication**: crossbeam channels between the UI and the control loop
//!
//! ## Configuration
//!
//! Settings are stored in the platform-appropriate data directory under
//! `dev.sdrvis.sdrvis-rs`:
//!
//! - **Linux**: `~/.local/share/dev.sdrvis.sdrvis-rs/`
//! - **macOS**: `~/Library/Application Support/dev.sdrvis.sdrvis-rs/`
//! - **Windows**: `%APPDATA%\dev.sdrvis.sdrvis-rs\`
//!
//! ## Example
//!
//! ```ignore
//! use sdrvis_rs::{
//!     backend::{NullAudio, SimulatedFrontEnd},
//!     config::{ConfigStore, JsonFileStore},
//!     pipeline::RadioBridge,
//!     radio::{PipelineConfiguration, Radio},
//!     spectrum::FrameMailbox,
//!     RadioApp,
//! };
//!
//! let store = JsonFileStore::default_location()?;
//! let config = store.load_or_default();
//! let radio = Radio::new(
//!     PipelineConfiguration::from(&config),
//!     Box::new(SimulatedFrontEnd::new()),
//!     Box::new(NullAudio::new()),
//! );
//! let (bridge, cmd_rx, event_tx) = RadioBridge::new();
//! let mut app = RadioApp::new(radio, config, Box::new(store), FrameMailbox::new(), cmd_rx, event_tx);
//! app.initialize(true);
//! std::thread::spawn(move || app.run());
//! ```

pub mod app;
pub mod backend;
pub mod config;
pub mod display;
pub mod error;
pub mod pipeline;
pub mod radio;
pub mod spectrum;
pub mod types;

// Re-export commonly used types
pub use app::RadioApp;
pub use backend::{AudioBackend, FrontEnd, SimulatedFrontEnd};
pub use config::{ConfigStore, JsonFileStore, MemoryStore, RadioConfig};
pub use display::{CoordinateMapper, DisplayEvent, DisplayMapping};
pub use error::{Result, SdrError};
pub use pipeline::{RadioBridge, RadioCommand, RadioEvent};
pub use radio::{PipelineConfiguration, Radio};
pub use spectrum::{FrameMailbox, SpectrumFeed, SpectrumFrame};
pub use types::{Bandwidth, Mode, RadioStatus};
