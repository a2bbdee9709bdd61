//! Spectrum branch: from IQ blocks to display lines
//!
//! # Data Flow
//!
//! ```text
//! SampleSource -> SpectrumProducer (LogPowerFft) -> FrameMailbox -> SpectrumFeed -> sinks
//!                 [producer thread]                 [one slot]      [control loop]
//! ```
//!
//! The mailbox holds at most one frame. A frame offered while one is still
//! waiting is dropped.

pub mod engine;
pub mod feed;
pub mod fft;
pub mod mailbox;

pub use engine::{SampleSource, SpectrumProducer};
pub use feed::{NullSink, SpectrumFeed, TraceSink, WaterfallSink, SIGNAL_SMOOTHING};
pub use fft::{fft_shift, FftWindow, LogPowerFft};
pub use mailbox::{FrameMailbox, MailboxStats, SpectrumFrame};
