//! sdrvis-rs - Main Entry Point
//!
//! Runs the receiver headless against the simulated front end: builds the
//! signal path for the configured mode, streams spectrum frames through the
//! control loop for a while, and logs what the display would show.

use anyhow::{anyhow, Context};
use clap::Parser;
use sdrvis_rs::{
    backend::{NullAudio, SimulatedFrontEnd},
    config::{parse_numeric_entry, ConfigStore, JsonFileStore, MemoryStore, RadioConfig},
    pipeline::{RadioBridge, RadioEvent},
    radio::{PipelineConfiguration, Radio, SpectrumSettings},
    spectrum::{FftWindow, FrameMailbox, SpectrumProducer},
    types::Mode,
    RadioApp,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless SDR receiver with a simulated front end", long_about = None)]
struct Args {
    /// Demodulation mode (AM, FM, WFM, USB, LSB, CW_USB, CW_LSB)
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Tuned frequency in Hz
    #[arg(short, long, value_parser = parse_hz)]
    frequency: Option<f64>,

    /// Front-end sample rate in Hz
    #[arg(short, long, value_parser = parse_hz)]
    sample_rate: Option<f64>,

    /// Audio rate in Hz
    #[arg(short, long, value_parser = parse_hz)]
    audio_rate: Option<f64>,

    /// Simulated carrier frequencies in Hz; defaults to one 100 kHz above the tuned frequency
    #[arg(long = "signal", value_parser = parse_hz)]
    signals: Vec<f64>,

    /// Spectrum window (rectangular, hann, hamming, blackman)
    #[arg(short, long)]
    window: Option<FftWindow>,

    /// Seconds to run before shutting down
    #[arg(short, long, default_value_t = 5.0)]
    duration: f64,

    /// Settings file; defaults to the platform data directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load settings from a TOML preset instead of the settings file
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Write the effective settings as a TOML preset and exit
    #[arg(long)]
    export_preset: Option<PathBuf>,

    /// Keep settings in memory only
    #[arg(long, default_value_t = false)]
    no_save: bool,

    /// Also write logs to daily files in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_dir.as_deref());

    tracing::info!("Starting sdrvis-rs");

    let store: Box<dyn ConfigStore> = if args.no_save {
        Box::new(MemoryStore::new())
    } else {
        match &args.config {
            Some(path) => Box::new(JsonFileStore::new(path)),
            None => Box::new(JsonFileStore::default_location()?),
        }
    };

    let mut config = match &args.preset {
        Some(path) => RadioConfig::import_toml(path)
            .with_context(|| format!("Failed to load preset {}", path.display()))?,
        None => store.load_or_default(),
    };
    apply_overrides(&mut config, &args);
    let config = config.sanitized();

    if let Some(path) = &args.export_preset {
        config.export_toml(path)?;
        tracing::info!("Wrote preset to {}", path.display());
        return Ok(());
    }

    let mut front_end = SimulatedFrontEnd::new();
    if args.signals.is_empty() {
        front_end = front_end.with_signal(config.frequency + 100e3, 0.5);
    }
    for hz in &args.signals {
        front_end = front_end.with_signal(*hz, 0.5);
    }
    let samples = front_end.samples();

    let settings = SpectrumSettings {
        fft_size: config.fft_size,
        frame_rate: config.frame_rate,
        window: config.fft_window,
        ..SpectrumSettings::default()
    };
    let radio = Radio::new(
        PipelineConfiguration::from(&config),
        Box::new(front_end),
        Box::new(NullAudio::new()),
    )
    .with_spectrum(settings);

    let mailbox = FrameMailbox::new();
    let mut producer =
        SpectrumProducer::spawn(Box::new(samples), radio.gate(), mailbox.clone(), settings)?;

    let (bridge, cmd_rx, event_tx) = RadioBridge::new();
    let mut app = RadioApp::new(radio, config, store, mailbox.clone(), cmd_rx, event_tx);
    app.initialize(true);
    let control = std::thread::Builder::new()
        .name("radio-control".to_string())
        .spawn(move || app.run())
        .context("Failed to start control loop")?;

    let deadline = Instant::now() + Duration::from_secs_f64(args.duration.max(0.0));
    let mut last_report = Instant::now();
    let mut level = None;
    while Instant::now() < deadline {
        for event in bridge.drain() {
            match event {
                RadioEvent::SignalStrength(db) => level = Some(db),
                RadioEvent::Status(status) => tracing::info!("Status: {}", status),
                RadioEvent::Notification(message) => tracing::warn!("{}", message),
                RadioEvent::Tuned(hz) => tracing::info!("Tuned to {:.3} MHz", hz / 1e6),
                _ => {}
            }
        }
        if last_report.elapsed() >= Duration::from_secs(1) {
            if let Some(db) = level {
                tracing::info!("Signal strength {:.1} dB", db);
            }
            last_report = Instant::now();
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    tracing::info!("Shutting down...");
    bridge.shutdown();
    control
        .join()
        .map_err(|_| anyhow!("Control loop panicked"))?;
    producer.shutdown();

    let stats = mailbox.stats();
    tracing::info!(
        "Delivered {} spectrum frames, dropped {}",
        stats.delivered,
        stats.dropped
    );
    Ok(())
}

/// Whole hertz; accepts forms like `106.5e6`.
fn parse_hz(text: &str) -> sdrvis_rs::Result<f64> {
    parse_numeric_entry(text).map(|hz| hz as f64)
}

fn apply_overrides(config: &mut RadioConfig, args: &Args) {
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(hz) = args.frequency {
        config.frequency = hz;
    }
    if let Some(hz) = args.sample_rate {
        config.sample_rate = hz;
    }
    if let Some(hz) = args.audio_rate {
        config.audio_rate = hz;
    }
    if let Some(window) = args.window {
        config.fft_window = window;
    }
}

/// Console logging, plus a daily file when `log_dir` is given. The guard
/// must live until exit so buffered lines reach the file.
fn init_logging(
    log_dir: Option<&Path>,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "sdrvis.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sdrvis_rs=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}
