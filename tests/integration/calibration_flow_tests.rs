//! Command → procedure → store → converter, end to end through the service.

use crate::mock_io::{MemPrefs, MockTemperature, MockVoltage, RecordingSink};

use phprobe::app::commands::{CommandReply, PhCommand};
use phprobe::app::events::{PhEvent, ReadingSource};
use phprobe::app::service::PhProbeService;
use phprobe::calibration::{AcceptancePolicy, BufferPoint};
use phprobe::config::ProbeConfig;
use phprobe::error::CalibrationError;

const TOL: f32 = 1e-3;

fn make_app(prefs: MemPrefs) -> (PhProbeService<MemPrefs>, RecordingSink) {
    let mut app = PhProbeService::new(ProbeConfig::default(), prefs);
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    (app, sink)
}

#[test]
fn two_point_calibration_moves_the_line() {
    let (mut app, mut sink) = make_app(MemPrefs::new());
    let at_25 = MockTemperature(25.0);

    let reply = app.handle_command(
        PhCommand::Calibrate(BufferPoint::Neutral),
        &MockVoltage(Some(1.45)),
        &mut sink,
    );
    assert_eq!(reply, CommandReply::Done { persisted: true });
    assert!(!app.is_calibrated(), "one point is not a full calibration");

    let reply = app.handle_command(
        PhCommand::Calibrate(BufferPoint::Acid),
        &MockVoltage(Some(2.0)),
        &mut sink,
    );
    assert_eq!(reply, CommandReply::Done { persisted: true });
    assert!(app.is_calibrated());
    assert!(app.preferences().has_slot(BufferPoint::Acid.flag_slot().0));

    let neutral = app.tick(&MockVoltage(Some(1.45)), &at_25, &mut sink).unwrap();
    assert!((neutral.ph - 7.0).abs() < TOL, "got {}", neutral.ph);
    let acid = app.tick(&MockVoltage(Some(2.0)), &at_25, &mut sink).unwrap();
    assert!((acid.ph - 4.0).abs() < TOL, "got {}", acid.ph);
}

#[test]
fn out_of_window_voltage_is_rejected_without_mutation() {
    let (mut app, mut sink) = make_app(MemPrefs::new());
    let before = app.calibration();

    let reply = app.handle_command(
        PhCommand::Calibrate(BufferPoint::Neutral),
        &MockVoltage(Some(2.0)),
        &mut sink,
    );

    assert!(matches!(
        reply,
        CommandReply::Rejected {
            error: CalibrationError::OutOfRange {
                point: BufferPoint::Neutral,
                ..
            }
        }
    ));
    assert_eq!(app.calibration(), before);
    assert_eq!(app.preferences().writes, 0);
    assert!(matches!(sink.last(), Some(PhEvent::CalibrationRejected(_))));
}

#[test]
fn permissive_policy_accepts_wide_voltages() {
    let (mut app, mut sink) = make_app(MemPrefs::new());
    app.handle_command(
        PhCommand::SetAcceptancePolicy(AcceptancePolicy::Permissive),
        &MockVoltage(None),
        &mut sink,
    );

    let reply = app.handle_command(
        PhCommand::Calibrate(BufferPoint::Neutral),
        &MockVoltage(Some(1.2)),
        &mut sink,
    );
    assert_eq!(reply, CommandReply::Done { persisted: true });
    assert!((app.calibration().neutral.voltage_mv - 1200.0).abs() < TOL);
    assert_eq!(app.status().acceptance_policy, AcceptancePolicy::Permissive);
}

#[test]
fn calibration_without_reading_fails() {
    let (mut app, mut sink) = make_app(MemPrefs::new());
    let reply = app.handle_command(
        PhCommand::Calibrate(BufferPoint::Acid),
        &MockVoltage(None),
        &mut sink,
    );
    assert_eq!(
        reply,
        CommandReply::Rejected {
            error: CalibrationError::NoReading
        }
    );
    assert!(!app.calibration().acid.is_calibrated);
}

#[test]
fn coinciding_points_are_rejected_as_degenerate() {
    let (mut app, mut sink) = make_app(MemPrefs::new());
    app.handle_command(
        PhCommand::SetAcceptancePolicy(AcceptancePolicy::Permissive),
        &MockVoltage(None),
        &mut sink,
    );

    // Acid buffer reading that lands exactly on the stored neutral voltage.
    let reply = app.handle_command(
        PhCommand::Calibrate(BufferPoint::Acid),
        &MockVoltage(Some(1.5)),
        &mut sink,
    );
    assert!(matches!(
        reply,
        CommandReply::Rejected {
            error: CalibrationError::DegenerateCalibration { .. }
        }
    ));
    assert!((app.calibration().acid.voltage_mv - 2032.44).abs() < TOL);
}

#[test]
fn reset_clears_flags_and_keeps_voltages() {
    let (mut app, mut sink) = make_app(MemPrefs::new());
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
    assert!(app.is_calibrated());

    let reply = app.handle_command(PhCommand::ResetCalibration, &MockVoltage(None), &mut sink);
    assert_eq!(reply, CommandReply::Done { persisted: true });

    let snap = app.calibration();
    assert!(!app.is_calibrated());
    assert!(!snap.neutral.is_calibrated && !snap.acid.is_calibrated);
    assert!((snap.neutral.voltage_mv - 1450.0).abs() < TOL);
    assert!((snap.acid.voltage_mv - 2000.0).abs() < TOL);

    // The line still uses the captured voltages.
    let r = app
        .tick(&MockVoltage(Some(2.0)), &MockTemperature(25.0), &mut sink)
        .unwrap();
    assert!((r.ph - 4.0).abs() < TOL);
}

#[test]
fn persistence_failure_keeps_in_memory_calibration() {
    let (mut app, mut sink) = make_app(MemPrefs::failing());

    let reply = app.handle_command(
        PhCommand::Calibrate(BufferPoint::Neutral),
        &MockVoltage(Some(1.45)),
        &mut sink,
    );

    assert_eq!(reply, CommandReply::Done { persisted: false });
    assert!(!app.preferences().has_slot(BufferPoint::Neutral.voltage_slot().0));
    let neutral = app.calibration().neutral;
    assert!(neutral.is_calibrated);
    assert!((neutral.voltage_mv - 1450.0).abs() < TOL);
}

#[test]
fn lost_temperature_sensor_still_publishes() {
    let (mut app, mut sink) = make_app(MemPrefs::new());
    let r = app
        .tick(&MockVoltage(Some(1.5)), &MockTemperature(f32::NAN), &mut sink)
        .unwrap();
    assert_eq!(r.source, ReadingSource::Measured);
    assert!(r.temperature_substituted);
    assert!((r.ph - 7.0).abs() < TOL);
}

#[test]
fn status_reports_last_published_ph() {
    let (mut app, mut sink) = make_app(MemPrefs::new());
    assert_eq!(app.status().last_ph, None);

    app.tick(&MockVoltage(Some(1.5)), &MockTemperature(25.0), &mut sink);
    let status = app.status();
    assert!(!status.fully_calibrated);
    assert!((status.last_ph.unwrap() - 7.0).abs() < TOL);
    assert_eq!(status.acceptance_policy, AcceptancePolicy::Strict);
}

#[test]
fn each_tick_publishes_one_reading_event() {
    let (mut app, mut sink) = make_app(MemPrefs::new());
    for _ in 0..4 {
        app.tick(&MockVoltage(Some(1.7)), &MockTemperature(25.0), &mut sink);
    }
    app.tick(&MockVoltage(None), &MockTemperature(25.0), &mut sink);

    assert_eq!(sink.count(|e| matches!(e, PhEvent::Reading(_))), 5);
    assert_eq!(sink.count(|e| matches!(e, PhEvent::ReadingSkipped)), 0);
}
