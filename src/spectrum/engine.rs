//! Spectrum producer thread
//!
//! While the graph is streaming, the producer pulls blocks of IQ from a
//! [`SampleSource`], runs them through [`LogPowerFft`], and offers the
//! result to the [`FrameMailbox`] at the configured frame rate. Each block
//! is processed under a [`StreamGate`] guard, so stopping the graph waits
//! for the block in progress before topology changes.

use crate::error::{Result, SdrError};
use crate::pipeline::graph::StreamGate;
use crate::radio::SpectrumSettings;
use crate::spectrum::fft::LogPowerFft;
use crate::spectrum::mailbox::{FrameMailbox, SpectrumFrame};
use rustfft::num_complex::Complex32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How long the producer sleeps while the gate is closed.
const IDLE_POLL: Duration = Duration::from_millis(5);

/// A stream of complex baseband samples.
#[cfg_attr(test, mockall::automock)]
pub trait SampleSource: Send {
    /// Current rate in samples per second; zero when unknown.
    fn sample_rate(&self) -> f64;

    /// Fill `buf` and return how many samples were written.
    fn read_block(&mut self, buf: &mut [Complex32]) -> Result<usize>;
}

/// Background thread producing spectrum frames.
pub struct SpectrumProducer {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl SpectrumProducer {
    /// Start the producer thread.
    pub fn spawn(
        source: Box<dyn SampleSource>,
        gate: StreamGate,
        mailbox: FrameMailbox,
        settings: SpectrumSettings,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let worker = ProducerLoop {
            source,
            gate,
            mailbox,
            fft: LogPowerFft::new(settings.fft_size, settings.window, settings.avg_alpha),
            block: vec![Complex32::new(0.0, 0.0); settings.fft_size.max(1)],
            frame_interval: frame_interval(settings.frame_rate),
            sequence: 0,
            running: Arc::clone(&running),
        };

        let handle = std::thread::Builder::new()
            .name("spectrum-producer".to_string())
            .spawn(move || worker.run())
            .map_err(|e| SdrError::Config(format!("Failed to start spectrum producer: {}", e)))?;

        Ok(Self {
            handle: Some(handle),
            running,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the thread to exit and join it.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Spectrum producer panicked");
            }
        }
    }
}

impl Drop for SpectrumProducer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn frame_interval(frame_rate: u32) -> Duration {
    if frame_rate == 0 {
        Duration::ZERO
    } else {
        Duration::from_micros(1_000_000 / frame_rate as u64)
    }
}

struct ProducerLoop {
    source: Box<dyn SampleSource>,
    gate: StreamGate,
    mailbox: FrameMailbox,
    fft: LogPowerFft,
    block: Vec<Complex32>,
    frame_interval: Duration,
    sequence: u64,
    running: Arc<AtomicBool>,
}

impl ProducerLoop {
    fn run(mut self) {
        tracing::info!("Spectrum producer started ({} bins)", self.fft.size());
        let mut last_frame = Instant::now();

        while self.running.load(Ordering::SeqCst) {
            let produced = match self.gate.enter() {
                Some(_guard) => self.produce(),
                None => {
                    std::thread::sleep(IDLE_POLL);
                    continue;
                }
            };

            match produced {
                Ok(true) => {}
                Ok(false) => std::thread::sleep(IDLE_POLL),
                Err(e) => {
                    tracing::warn!("Spectrum source read failed: {}", e);
                    std::thread::sleep(IDLE_POLL);
                }
            }
            self.rate_limit(&mut last_frame);
        }

        tracing::info!("Spectrum producer stopped");
    }

    /// Returns `Ok(false)` when the source had nothing to give.
    fn produce(&mut self) -> Result<bool> {
        let read = self.source.read_block(&mut self.block)?;
        if read == 0 {
            return Ok(false);
        }
        let power_db = self.fft.process(&self.block[..read]).to_vec();
        self.sequence += 1;
        self.mailbox.offer(SpectrumFrame {
            power_db,
            centered: true,
            sequence: self.sequence,
        });
        Ok(true)
    }

    fn rate_limit(&self, last_frame: &mut Instant) {
        if self.frame_interval.is_zero() {
            std::thread::yield_now();
            return;
        }
        let elapsed = last_frame.elapsed();
        if elapsed < self.frame_interval {
            std::thread::sleep(self.frame_interval - elapsed);
        }
        *last_frame = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::graph::FlowGraph;
    use crate::spectrum::fft::FftWindow;

    fn settings() -> SpectrumSettings {
        SpectrumSettings {
            fft_size: 64,
            frame_rate: 500,
            avg_alpha: 1.0,
            window: FftWindow::Rectangular,
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        false
    }

    #[test]
    fn test_frame_interval() {
        assert_eq!(frame_interval(60), Duration::from_micros(16_666));
        assert_eq!(frame_interval(0), Duration::ZERO);
    }

    #[test]
    fn test_no_frames_while_stopped() {
        let mut source = MockSampleSource::new();
        source.expect_read_block().never();
        let graph = FlowGraph::new();
        let mailbox = FrameMailbox::new();

        let mut producer =
            SpectrumProducer::spawn(Box::new(source), graph.gate(), mailbox.clone(), settings())
                .unwrap();
        std::thread::sleep(Duration::from_millis(20));
        producer.shutdown();
        assert!(!mailbox.is_occupied());
    }

    #[test]
    fn test_frames_flow_while_streaming() {
        let mut source = MockSampleSource::new();
        source.expect_read_block().returning(|buf| {
            buf.fill(Complex32::new(1.0, 0.0));
            Ok(buf.len())
        });
        let mut graph = FlowGraph::new();
        let mailbox = FrameMailbox::new();
        let mut producer =
            SpectrumProducer::spawn(Box::new(source), graph.gate(), mailbox.clone(), settings())
                .unwrap();

        graph.start();
        assert!(wait_for(|| mailbox.is_occupied()));
        graph.stop();
        graph.wait();

        let frame = mailbox.take().unwrap();
        assert_eq!(frame.len(), 64);
        assert!(frame.centered);
        // DC input peaks in the middle bin
        let peak = frame
            .power_db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(32));

        producer.shutdown();
        assert!(!producer.is_running());
    }

    #[test]
    fn test_read_errors_do_not_stop_the_thread() {
        let mut source = MockSampleSource::new();
        let mut calls = 0;
        source.expect_read_block().returning(move |buf| {
            calls += 1;
            if calls < 3 {
                Err(SdrError::FrontEnd("overrun".into()))
            } else {
                buf.fill(Complex32::new(0.5, 0.5));
                Ok(buf.len())
            }
        });
        let mut graph = FlowGraph::new();
        let mailbox = FrameMailbox::new();
        let _producer =
            SpectrumProducer::spawn(Box::new(source), graph.gate(), mailbox.clone(), settings())
                .unwrap();

        graph.start();
        assert!(wait_for(|| mailbox.is_occupied()));
        graph.stop();
        graph.wait();
    }
}
