//! Persisted calibration and config survive a simulated restart.

use crate::mock_io::{MemPrefs, MockTemperature, MockVoltage, RecordingSink};

use phprobe::app::commands::PhCommand;
use phprobe::app::events::PhEvent;
use phprobe::app::ports::ConfigPort;
use phprobe::app::service::PhProbeService;
use phprobe::calibration::BufferPoint;
use phprobe::config::{NoReadingPolicy, ProbeConfig};

fn boot(prefs: MemPrefs) -> (PhProbeService<MemPrefs>, RecordingSink) {
    let config = ConfigPort::load(&prefs).unwrap_or_default();
    let mut app = PhProbeService::new(config, prefs);
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    (app, sink)
}

#[test]
fn calibration_survives_restart() {
    let (mut app, mut sink) = boot(MemPrefs::new());
    app.handle_command(
        PhCommand::Calibrate(BufferPoint::Neutral),
        &MockVoltage(Some(1.45)),
        &mut sink,
    );
    app.handle_command(
        PhCommand::Calibrate(BufferPoint::Acid),
        &MockVoltage(Some(2.0)),
        &mut sink,
    );
    let before = app
        .tick(&MockVoltage(Some(1.8)), &MockTemperature(21.0), &mut sink)
        .unwrap();
    let snapshot = app.calibration();

    let (mut app, mut sink) = boot(app.into_preferences());

    assert_eq!(app.calibration(), snapshot);
    assert!(app.is_calibrated());
    assert_eq!(sink.events.first(), Some(&PhEvent::Started(snapshot)));

    let after = app
        .tick(&MockVoltage(Some(1.8)), &MockTemperature(21.0), &mut sink)
        .unwrap();
    assert_eq!(after.ph, before.ph);
}

#[test]
fn reset_survives_restart() {
    let (mut app, mut sink) = boot(MemPrefs::new());
    app.handle_command(
        PhCommand::Calibrate(BufferPoint::Neutral),
        &MockVoltage(Some(1.45)),
        &mut sink,
    );
    app.handle_command(PhCommand::ResetCalibration, &MockVoltage(None), &mut sink);

    let (app, _) = boot(app.into_preferences());
    let neutral = app.calibration().neutral;
    assert!(!neutral.is_calibrated);
    assert!((neutral.voltage_mv - 1450.0).abs() < 1e-3);
}

#[test]
fn unpersisted_calibration_is_lost_on_restart() {
    let (mut app, mut sink) = boot(MemPrefs::failing());
    app.handle_command(
        PhCommand::Calibrate(BufferPoint::Neutral),
        &MockVoltage(Some(1.45)),
        &mut sink,
    );
    assert!(app.calibration().neutral.is_calibrated);

    let (app, _) = boot(app.into_preferences());
    let neutral = app.calibration().neutral;
    assert!(!neutral.is_calibrated);
    assert_eq!(neutral.voltage_mv, BufferPoint::Neutral.default_voltage_mv());
}

#[test]
fn policy_change_survives_restart() {
    let (mut app, mut sink) = boot(MemPrefs::new());
    app.handle_command(
        PhCommand::SetNoReadingPolicy(NoReadingPolicy::Skip),
        &MockVoltage(None),
        &mut sink,
    );
    assert!(app.persist_config());
    assert!(!app.persist_config(), "nothing left to save");
    assert_eq!(
        app.preferences().stored_config().map(|c| c.no_reading_policy),
        Some(NoReadingPolicy::Skip)
    );

    let (mut app, mut sink) = boot(app.into_preferences());
    assert_eq!(app.config().no_reading_policy, NoReadingPolicy::Skip);
    assert!(
        app.tick(&MockVoltage(None), &MockTemperature(25.0), &mut sink)
            .is_none()
    );
}

#[test]
fn first_boot_uses_factory_defaults() {
    let (app, _) = boot(MemPrefs::new());
    let snap = app.calibration();
    assert_eq!(snap.neutral.voltage_mv, 1500.0);
    assert_eq!(snap.acid.voltage_mv, 2032.44);
    assert!(!app.is_calibrated());
    assert_eq!(app.config(), &ProbeConfig::default());
}
