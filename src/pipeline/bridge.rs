//! Thread boundary between the control loop and whatever drives it (UI, CLI).
//!
//! Commands flow in through a bounded crossbeam channel; status changes,
//! user-facing notifications and readouts flow back as `RadioEvent`s.

use crate::display::gesture::DisplayEvent;
use crate::pipeline::id::{EdgeId, PortId, StageId};
use crate::pipeline::stage::StageRole;
use crate::types::{Bandwidth, Mode, RadioStatus};
use crossbeam_channel::{bounded, Receiver, Sender};

/// Messages sent from the control loop to the UI thread.
#[derive(Debug, Clone)]
pub enum RadioEvent {
    /// Streaming status changed.
    Status(RadioStatus),

    /// Something the user should see (device missing, audio failure, bad entry).
    Notification(String),

    /// Tuned frequency changed (drag, double click, direct entry).
    Tuned(f64),

    /// Smoothed signal strength in dB.
    SignalStrength(f32),

    /// Frequency and level under the pointer; `None` once the pointer leaves.
    Pointer(Option<(f64, f64)>),

    /// Stage graph snapshot.
    Topology(TopologySnapshot),

    /// Control loop is shutting down.
    Shutdown,
}

/// Snapshot of a single stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSnapshot {
    pub id: StageId,
    pub role: StageRole,
    pub revision: u64,
}

/// Snapshot of a single edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeSnapshot {
    pub id: EdgeId,
    pub from: PortId,
    pub to: PortId,
}

/// Complete topology snapshot of the stage graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopologySnapshot {
    pub stages: Vec<StageSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

impl TopologySnapshot {
    /// Roles of stages touched by at least one edge.
    pub fn connected_roles(&self) -> Vec<StageRole> {
        self.stages
            .iter()
            .filter(|stage| {
                self.edges
                    .iter()
                    .any(|edge| edge.from.stage() == stage.id || edge.to.stage() == stage.id)
            })
            .map(|stage| stage.role)
            .collect()
    }
}

/// Commands sent to the control loop.
#[derive(Debug, Clone)]
pub enum RadioCommand {
    /// Start streaming.
    Start,
    /// Stop streaming.
    Stop,
    /// Switch demodulation mode (full rebuild).
    SetMode(Mode),
    /// Change the RF sample rate (full rebuild).
    SetSampleRate(f64),
    /// Change the audio rate (full rebuild).
    SetAudioRate(f64),
    /// Select a channel filter width (in-place update).
    SetBandwidth(Bandwidth),
    /// Retune the front end.
    SetFrequency(f64),
    /// Front-end analog bandwidth.
    SetFrontEndBandwidth(f64),
    /// Squelch threshold in dB.
    SetSquelch(f64),
    /// Audio volume.
    SetVolume(f32),
    /// Pointer, wheel and key input on the spectrum display.
    Display(DisplayEvent),
    /// Resize the spectrum display.
    ResizeDisplay { width: f64, height: f64 },
    /// Request a stage graph snapshot.
    RequestTopology,
    /// Shut down the control loop.
    Shutdown,
}

/// Channel capacity for commands (UI → control loop).
const CMD_CHANNEL_CAPACITY: usize = 256;
/// Channel capacity for events (control loop → UI).
const EVENT_CHANNEL_CAPACITY: usize = 1_024;

/// UI-side handle for communicating with the control loop.
pub struct RadioBridge {
    pub cmd_tx: Sender<RadioCommand>,
    pub event_rx: Receiver<RadioEvent>,
}

impl RadioBridge {
    /// Create a new bridge pair: `(bridge_for_ui, cmd_rx, event_tx)`.
    ///
    /// The control loop owns `cmd_rx` and `event_tx`.
    pub fn new() -> (Self, Receiver<RadioCommand>, Sender<RadioEvent>) {
        let (cmd_tx, cmd_rx) = bounded(CMD_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = bounded(EVENT_CHANNEL_CAPACITY);
        (Self { cmd_tx, event_rx }, cmd_rx, event_tx)
    }

    /// Drain all pending events.
    pub fn drain(&self) -> Vec<RadioEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Try to receive a single event without blocking.
    pub fn try_recv(&self) -> Option<RadioEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn send_command(&self, cmd: RadioCommand) -> bool {
        self.cmd_tx.send(cmd).is_ok()
    }

    pub fn start(&self) {
        let _ = self.cmd_tx.send(RadioCommand::Start);
    }

    pub fn stop(&self) {
        let _ = self.cmd_tx.send(RadioCommand::Stop);
    }

    pub fn set_mode(&self, mode: Mode) {
        let _ = self.cmd_tx.send(RadioCommand::SetMode(mode));
    }

    pub fn set_frequency(&self, hz: f64) {
        let _ = self.cmd_tx.send(RadioCommand::SetFrequency(hz));
    }

    pub fn set_bandwidth(&self, bandwidth: Bandwidth) {
        let _ = self.cmd_tx.send(RadioCommand::SetBandwidth(bandwidth));
    }

    pub fn display(&self, event: DisplayEvent) {
        let _ = self.cmd_tx.send(RadioCommand::Display(event));
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(RadioCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_round_trip() {
        let (bridge, cmd_rx, event_tx) = RadioBridge::new();

        bridge.set_mode(Mode::Am);
        bridge.start();
        assert!(matches!(cmd_rx.try_recv(), Ok(RadioCommand::SetMode(Mode::Am))));
        assert!(matches!(cmd_rx.try_recv(), Ok(RadioCommand::Start)));

        event_tx.send(RadioEvent::Tuned(7.1e6)).unwrap();
        event_tx.send(RadioEvent::Shutdown).unwrap();
        let events = bridge.drain();
        assert_eq!(events.len(), 2);
        assert!(bridge.try_recv().is_none());
    }

    #[test]
    fn test_connected_roles() {
        let snapshot = TopologySnapshot {
            stages: vec![
                StageSnapshot {
                    id: StageId(0),
                    role: StageRole::Source,
                    revision: 0,
                },
                StageSnapshot {
                    id: StageId(1),
                    role: StageRole::LowPassAm,
                    revision: 2,
                },
                StageSnapshot {
                    id: StageId(2),
                    role: StageRole::LogPowerFft,
                    revision: 0,
                },
            ],
            edges: vec![EdgeSnapshot {
                id: EdgeId(0),
                from: StageId(0).port(0),
                to: StageId(2).port(0),
            }],
        };
        assert_eq!(
            snapshot.connected_roles(),
            vec![StageRole::Source, StageRole::LogPowerFft]
        );
    }
}
