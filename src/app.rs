//! Control loop
//!
//! `RadioApp` is the single context that reconfigures the radio. It drains
//! [`RadioCommand`]s from the bridge, applies them to the [`Radio`], the
//! display view and the persisted [`RadioConfig`], and drains the spectrum
//! mailbox into the display sinks. Every user-driven change is saved.
//!
//! # Example
//!
//! ```ignore
//! let (bridge, cmd_rx, event_tx) = RadioBridge::new();
//! let app = RadioApp::new(radio, config, store, mailbox, cmd_rx, event_tx);
//! let handle = std::thread::spawn(move || app.run());
//! bridge.start();
//! ```

use crate::config::{ConfigStore, RadioConfig, AUDIO_RATE_ENTRY};
use crate::display::gesture::{DisplayEvent, GestureHandler};
use crate::display::mapping::DisplayMapping;
use crate::error::{Result, SdrError};
use crate::pipeline::bridge::{RadioCommand, RadioEvent};
use crate::radio::Radio;
use crate::spectrum::feed::{NullSink, SpectrumFeed, TraceSink, WaterfallSink};
use crate::spectrum::mailbox::FrameMailbox;
use crate::types::RadioStatus;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::time::Duration;

/// Default display size until the UI reports one.
const DEFAULT_VIEW: (f64, f64) = (1024.0, 400.0);

/// The control loop and everything it owns.
pub struct RadioApp {
    radio: Radio,
    config: RadioConfig,
    store: Box<dyn ConfigStore>,
    view: DisplayMapping,
    gestures: GestureHandler,
    feed: SpectrumFeed,
    mailbox: FrameMailbox,
    waterfall: Box<dyn WaterfallSink + Send>,
    trace: Box<dyn TraceSink + Send>,
    cmd_rx: Receiver<RadioCommand>,
    event_tx: Sender<RadioEvent>,
    last_status: Option<RadioStatus>,
    tick: Duration,
}

impl RadioApp {
    pub fn new(
        radio: Radio,
        config: RadioConfig,
        store: Box<dyn ConfigStore>,
        mailbox: FrameMailbox,
        cmd_rx: Receiver<RadioCommand>,
        event_tx: Sender<RadioEvent>,
    ) -> Self {
        let view = DisplayMapping::from_config(&config, DEFAULT_VIEW.0, DEFAULT_VIEW.1);
        let tick = Duration::from_micros(1_000_000 / config.frame_rate.max(1) as u64);
        Self {
            radio,
            config,
            store,
            view,
            gestures: GestureHandler::new(),
            feed: SpectrumFeed::new(),
            mailbox,
            waterfall: Box::new(NullSink),
            trace: Box::new(NullSink),
            cmd_rx,
            event_tx,
            last_status: None,
            tick,
        }
    }

    /// Route display output somewhere other than the null sinks.
    pub fn with_sinks(
        mut self,
        waterfall: Box<dyn WaterfallSink + Send>,
        trace: Box<dyn TraceSink + Send>,
    ) -> Self {
        self.waterfall = waterfall;
        self.trace = trace;
        self
    }

    pub fn radio(&self) -> &Radio {
        &self.radio
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    pub fn view(&self) -> &DisplayMapping {
        &self.view
    }

    pub fn signal_strength(&self) -> f32 {
        self.feed.signal_strength()
    }

    /// First build and tune from the stored settings, then optionally start.
    pub fn initialize(&mut self, autostart: bool) {
        let built = self.radio.rebuild();
        self.report(built);
        self.sync_view_rate();

        let frequency = self.config.frequency;
        let tuned = self.radio.set_frequency(frequency);
        self.report(tuned);
        self.emit(RadioEvent::Tuned(frequency));

        if let Some(hz) = self.config.front_end_bandwidth {
            let resolved = self.radio.set_front_end_bandwidth(hz).map(|_| ());
            self.report(resolved);
        }

        if autostart && self.radio.status().can_start() {
            let started = self.radio.start();
            self.report(started);
        }
        self.emit_status();
    }

    /// Run until a `Shutdown` command arrives or the bridge goes away.
    pub fn run(mut self) {
        tracing::info!("Control loop started");
        while self.step() {}

        self.radio.stop();
        self.emit_status();
        self.emit(RadioEvent::Shutdown);
        tracing::info!("Control loop stopped");
    }

    /// One pass: wait up to a frame for commands, handle all that are
    /// queued, then show the waiting spectrum frame. Returns `false` once
    /// the loop should exit.
    pub fn step(&mut self) -> bool {
        let first = match self.cmd_rx.recv_timeout(self.tick) {
            Ok(cmd) => Some(cmd),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => return false,
        };
        let pending = first.into_iter().chain(std::iter::from_fn(|| self.cmd_rx.try_recv().ok()));
        let commands: Vec<RadioCommand> = pending.collect();
        for cmd in commands {
            if !self.handle_command(cmd) {
                return false;
            }
        }

        self.poll_spectrum();
        true
    }

    /// Apply one command. Returns `false` on `Shutdown`.
    pub fn handle_command(&mut self, cmd: RadioCommand) -> bool {
        match cmd {
            RadioCommand::Start => {
                let started = self.radio.start();
                self.report(started);
            }
            RadioCommand::Stop => self.radio.stop(),
            RadioCommand::SetMode(mode) => {
                self.config.mode = mode;
                let rebuilt = self.radio.set_mode(mode);
                self.report(rebuilt);
                self.persist();
            }
            RadioCommand::SetSampleRate(hz) => {
                let rebuilt = self.radio.set_sample_rate(hz);
                self.report(rebuilt);
                self.config.sample_rate = self.radio.config().rf_sample_rate;
                self.sync_view_rate();
                self.persist();
            }
            RadioCommand::SetAudioRate(hz) => {
                let hz = AUDIO_RATE_ENTRY.clamp_f64(hz);
                self.config.audio_rate = hz;
                let rebuilt = self.radio.set_audio_rate(hz);
                self.report(rebuilt);
                self.persist();
            }
            RadioCommand::SetBandwidth(bandwidth) => {
                self.config.bandwidth = bandwidth;
                let updated = self.radio.set_bandwidth(bandwidth);
                self.report(updated);
                self.persist();
            }
            RadioCommand::SetFrequency(hz) => {
                self.tune(hz);
                self.persist();
            }
            RadioCommand::SetFrontEndBandwidth(hz) => {
                match self.radio.set_front_end_bandwidth(hz) {
                    Ok(resolved) => self.config.front_end_bandwidth = Some(resolved),
                    Err(e) => self.report(Err(e)),
                }
                self.persist();
            }
            RadioCommand::SetSquelch(db) => {
                self.config.squelch_db = db;
                let updated = self.radio.set_squelch(db);
                self.report(updated);
                self.persist();
            }
            RadioCommand::SetVolume(volume) => {
                self.config.volume = volume;
                let updated = self.radio.set_volume(volume);
                self.report(updated);
                self.persist();
            }
            RadioCommand::Display(event) => self.handle_display(event),
            RadioCommand::ResizeDisplay { width, height } => self.view.resize(width, height),
            RadioCommand::RequestTopology => {
                let snapshot = self.radio.topology();
                self.emit(RadioEvent::Topology(snapshot));
            }
            RadioCommand::Shutdown => return false,
        }
        self.emit_status();
        true
    }

    fn handle_display(&mut self, event: DisplayEvent) {
        let outcome = self.gestures.handle(event, &mut self.view);
        if let Some(hz) = outcome.retune {
            self.tune(hz);
        }
        if outcome.view_changed {
            self.view.store_into(&mut self.config);
        }
        if matches!(
            event,
            DisplayEvent::PointerMove { .. } | DisplayEvent::Leave
        ) {
            let readout = self
                .gestures
                .readout(&self.view)
                .map(|readout| (readout.hz, readout.db));
            self.emit(RadioEvent::Pointer(readout));
        }
        if outcome.retune.is_some() || outcome.view_changed {
            self.persist();
        }
    }

    fn tune(&mut self, hz: f64) {
        self.config.frequency = hz;
        self.view.center_freq = hz;
        let tuned = self.radio.set_frequency(hz);
        self.report(tuned);
        self.emit(RadioEvent::Tuned(hz));
    }

    fn poll_spectrum(&mut self) {
        let shown = self.feed.poll(
            &self.mailbox,
            &self.view,
            self.radio.offsets(),
            self.waterfall.as_mut(),
            self.trace.as_mut(),
        );
        if let Some(level) = shown {
            self.emit(RadioEvent::SignalStrength(level));
        }
    }

    fn sync_view_rate(&mut self) {
        let live = self.radio.live_sample_rate();
        if live > 0.0 {
            self.view.sample_rate = live;
        }
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.config) {
            tracing::warn!("Failed to save radio config: {}", e);
        }
    }

    /// Log an error and forward the ones the user has to act on.
    fn report(&self, result: Result<()>) {
        if let Err(e) = result {
            tracing::warn!("{}", e);
            if e.is_user_facing() || matches!(e, SdrError::Pipeline(_)) {
                self.emit(RadioEvent::Notification(e.to_string()));
            }
        }
    }

    fn emit_status(&mut self) {
        let status = self.radio.status().clone();
        if self.last_status.as_ref() != Some(&status) {
            self.last_status = Some(status.clone());
            self.emit(RadioEvent::Status(status));
        }
    }

    /// Never blocks: a UI that stops draining loses events, not the radio.
    fn emit(&self, event: RadioEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("Event receiver gone");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{NullAudio, SimulatedFrontEnd};
    use crate::config::MemoryStore;
    use crate::pipeline::bridge::RadioBridge;
    use crate::radio::PipelineConfiguration;
    use crate::spectrum::mailbox::SpectrumFrame;
    use crate::types::{Bandwidth, Mode};

    fn app() -> (RadioApp, RadioBridge, SimulatedFrontEnd) {
        let config = RadioConfig::default();
        let front_end = SimulatedFrontEnd::new();
        let handle = front_end.clone();
        let radio = Radio::new(
            PipelineConfiguration::from(&config),
            Box::new(front_end),
            Box::new(NullAudio::new()),
        );
        let (bridge, cmd_rx, event_tx) = RadioBridge::new();
        let app = RadioApp::new(
            radio,
            config,
            Box::new(MemoryStore::new()),
            FrameMailbox::new(),
            cmd_rx,
            event_tx,
        );
        (app, bridge, handle)
    }

    #[test]
    fn test_initialize_tunes_and_starts() {
        let (mut app, bridge, front_end) = app();
        app.initialize(true);
        assert_eq!(app.radio().status(), &RadioStatus::Running);
        assert_eq!(front_end.center_freq(), 106.5e6);
        assert_eq!(app.view().sample_rate, 2.4e6);

        let events = bridge.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, RadioEvent::Status(RadioStatus::Running))));
    }

    #[test]
    fn test_commands_update_config() {
        let (mut app, _bridge, _) = app();
        app.initialize(false);

        assert!(app.handle_command(RadioCommand::SetMode(Mode::Lsb)));
        assert!(app.handle_command(RadioCommand::SetBandwidth(Bandwidth::Narrow)));
        assert!(app.handle_command(RadioCommand::SetAudioRate(96_000.0)));
        assert_eq!(app.config().mode, Mode::Lsb);
        assert_eq!(app.config().bandwidth, Bandwidth::Narrow);
        assert_eq!(app.config().audio_rate, 60_000.0);
        assert_eq!(app.radio().config().audio_rate, 60_000.0);
        assert!(!app.handle_command(RadioCommand::Shutdown));
    }

    #[test]
    fn test_double_click_retunes_radio() {
        let (mut app, bridge, front_end) = app();
        app.initialize(false);
        bridge.drain();

        app.handle_command(RadioCommand::ResizeDisplay {
            width: 1000.0,
            height: 400.0,
        });
        app.handle_command(RadioCommand::Display(DisplayEvent::DoubleClick {
            x: 750.0,
            y: 10.0,
        }));

        // A quarter of 2.4 MHz above center
        assert_eq!(front_end.center_freq(), 107.1e6);
        assert_eq!(app.config().frequency, 107.1e6);
        assert!(bridge
            .drain()
            .iter()
            .any(|e| matches!(e, RadioEvent::Tuned(hz) if *hz == 107.1e6)));
    }

    #[test]
    fn test_step_drains_mailbox() {
        let (mut app, bridge, _) = app();
        app.initialize(false);
        app.mailbox.offer(SpectrumFrame::new(vec![-50.0; 64], true));

        assert!(app.step());
        assert!(!app.mailbox.is_occupied());
        assert!(app.signal_strength() < 0.0);
        assert!(bridge
            .drain()
            .iter()
            .any(|e| matches!(e, RadioEvent::SignalStrength(_))));
    }

    #[test]
    fn test_run_exits_on_shutdown() {
        let (app, bridge, _) = app();
        let handle = std::thread::spawn(move || app.run());
        bridge.shutdown();
        handle.join().unwrap();
        assert!(bridge
            .drain()
            .iter()
            .any(|e| matches!(e, RadioEvent::Shutdown)));
    }

    #[test]
    fn test_missing_device_is_notified() {
        let config = RadioConfig::default();
        let radio = Radio::new(
            PipelineConfiguration::from(&config),
            Box::new(SimulatedFrontEnd::absent()),
            Box::new(NullAudio::new()),
        );
        let (bridge, cmd_rx, event_tx) = RadioBridge::new();
        let mut app = RadioApp::new(
            radio,
            config,
            Box::new(MemoryStore::new()),
            FrameMailbox::new(),
            cmd_rx,
            event_tx,
        );
        app.initialize(true);

        let events = bridge.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, RadioEvent::Notification(msg) if msg.contains("Device not found"))));
        assert!(events
            .iter()
            .any(|e| matches!(e, RadioEvent::Status(RadioStatus::NoDevice))));
    }
}
