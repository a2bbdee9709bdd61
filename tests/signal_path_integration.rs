//! Integration tests for signal path reconfiguration
//!
//! These tests drive a `Radio` through whole sessions:
//! - Every mode wires exactly its own stages
//! - Filter and tuning changes never touch the wiring
//! - Failed and deferred builds leave nothing half-connected

mod common;

use common::builders::RadioBuilder;
use common::mock_helpers::{create_absent_front_end, create_test_front_end, MockAudio};
use sdrvis_rs::pipeline::{Coefficients, StageRole};
use sdrvis_rs::radio::topology;
use sdrvis_rs::types::{Bandwidth, Mode, RadioStatus};
use sdrvis_rs::SdrError;
use std::collections::HashSet;

fn filter_role(mode: Mode) -> StageRole {
    match mode {
        Mode::Am => StageRole::LowPassAm,
        Mode::Fm => StageRole::LowPassFm,
        Mode::Wfm => StageRole::LowPassWfm,
        Mode::Usb | Mode::Lsb => StageRole::LowPassSsb,
        Mode::CwUsb | Mode::CwLsb => StageRole::BandPassCw,
    }
}

#[test]
fn test_every_mode_wires_its_own_stages() {
    let mut radio = RadioBuilder::new().built();
    radio.start().unwrap();

    for &mode in Mode::all() {
        radio.set_mode(mode).unwrap();

        let wired: HashSet<StageRole> = radio.connected_roles().into_iter().collect();
        let expected: HashSet<StageRole> = topology::connected_roles(mode).into_iter().collect();
        assert_eq!(wired, expected, "wiring for {}", mode);
        assert!(wired.contains(&filter_role(mode)));
        assert!(radio.graph().is_streaming(), "{} should resume", mode);
    }
}

#[test]
fn test_phasing_modes_set_the_wired_sideband_sign() {
    let mut radio = RadioBuilder::new().mode(Mode::Usb).built();
    radio.start().unwrap();
    let chain = *radio.chain().unwrap();
    let sum_b = chain.sum.port(1);

    for (mode, sign) in [
        (Mode::Usb, 1.0),
        (Mode::Lsb, -1.0),
        (Mode::CwUsb, 1.0),
        (Mode::CwLsb, -1.0),
        (Mode::Usb, 1.0),
    ] {
        radio.set_mode(mode).unwrap();

        // The stage feeding the sum's second arm is the one that flips.
        let feeding = radio.graph().upstream_of(sum_b).map(|port| port.stage());
        assert_eq!(feeding, Some(chain.sideband_sign), "{}", mode);
        let stage = radio.graph().stage(chain.sideband_sign).unwrap();
        assert_eq!(stage.coefficients(), &Coefficients::Gain(sign), "{}", mode);
        assert_eq!(radio.chain().unwrap().sideband_sign, chain.sideband_sign);
    }
}

#[test]
fn test_mode_cycle_keeps_shared_stages() {
    let mut radio = RadioBuilder::new().mode(Mode::Am).built();
    let core = radio.core_stages().unwrap();
    let filters: Vec<_> = radio.filters().stages().collect();

    for &mode in Mode::all().iter().chain(Mode::all()) {
        radio.set_mode(mode).unwrap();
    }

    assert_eq!(radio.core_stages().unwrap(), core);
    assert_eq!(radio.filters().stages().collect::<Vec<_>>(), filters);
}

#[test]
fn test_bandwidth_changes_in_every_mode_keep_edges() {
    for &mode in Mode::all() {
        let mut radio = RadioBuilder::new().mode(mode).built();
        radio.start().unwrap();
        let edges = radio.graph().edges().to_vec();
        let filter = radio.filters().stage_for(filter_role(mode)).unwrap();
        let before = radio.graph().stage(filter).unwrap().coefficients().clone();

        for &bandwidth in Bandwidth::all() {
            radio.set_bandwidth(bandwidth).unwrap();
        }
        radio.set_bandwidth(Bandwidth::Wide).unwrap();

        assert_eq!(radio.graph().edges(), edges.as_slice(), "edges in {}", mode);
        let stage = radio.graph().stage(filter).unwrap();
        assert_eq!(stage.revision(), Bandwidth::all().len() as u64 + 1);
        assert_eq!(stage.coefficients(), &before);
        assert!(radio.status().is_running());
    }
}

#[test]
fn test_retune_while_streaming_keeps_edges() {
    let mut radio = RadioBuilder::new()
        .mode(Mode::Usb)
        .front_end(create_test_front_end(2.4e6))
        .built();
    radio.start().unwrap();
    let edges = radio.graph().edges().to_vec();

    radio.set_frequency(7.074e6).unwrap();
    radio.set_pan_offset(-12_000.0).unwrap();
    radio.set_squelch(-80.0).unwrap();
    radio.set_volume(0.25).unwrap();

    assert_eq!(radio.graph().edges(), edges.as_slice());
    assert_eq!(radio.tuned_hz(), 7.074e6);
    let translate = radio.core_stages().unwrap().translate;
    match radio.graph().stage(translate).unwrap().coefficients() {
        Coefficients::Translate { center_hz, .. } => assert_eq!(*center_hz, 12_000.0),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_sample_rate_snaps_to_front_end() {
    let mut radio = RadioBuilder::new()
        .sample_rate(2.0e6)
        .front_end(create_test_front_end(2.4e6))
        .built();

    assert_eq!(radio.config().rf_sample_rate, 2.4e6);
    radio.set_sample_rate(1.0e6).unwrap();
    assert_eq!(radio.live_sample_rate(), 2.4e6);
    assert_eq!(radio.status(), &RadioStatus::Stopped);
}

#[test]
fn test_absent_device_then_retry() {
    let mut radio = RadioBuilder::new()
        .front_end(create_absent_front_end())
        .build();

    for _ in 0..2 {
        assert!(matches!(radio.rebuild(), Err(SdrError::DeviceNotFound)));
    }
    assert_eq!(radio.status(), &RadioStatus::NoDevice);
    assert!(radio.graph().edges().is_empty());
    assert!(radio.start().is_err());
}

#[test]
fn test_audio_recovers_after_rate_change() {
    let mut audio = MockAudio::new();
    audio
        .expect_open()
        .returning(|rate| {
            if rate > 48_000.0 {
                Err(SdrError::AudioSink(format!("unsupported rate {}", rate)))
            } else {
                Ok(())
            }
        });
    let mut radio = RadioBuilder::new().audio_rate(50_000.0).audio(audio).build();

    assert!(matches!(radio.rebuild(), Err(SdrError::AudioSink(_))));
    assert!(radio.graph().edges().is_empty());
    assert!(matches!(radio.status(), RadioStatus::Errored(_)));

    radio.set_audio_rate(44_100.0).unwrap();
    assert_eq!(radio.status(), &RadioStatus::Stopped);
    assert!(!radio.graph().edges().is_empty());
    radio.start().unwrap();
}

#[test]
fn test_zero_audio_rate_defers_build() {
    let mut radio = RadioBuilder::new().audio_rate(0.0).build();

    radio.rebuild().unwrap();
    assert_eq!(radio.status(), &RadioStatus::Deferred);
    assert!(radio.graph().edges().is_empty());

    radio.set_audio_rate(48_000.0).unwrap();
    assert_eq!(radio.status(), &RadioStatus::Stopped);
}
