//! Console lines driving the service, replies rendered as JSON.

use crate::mock_io::{MemPrefs, MockTemperature, MockVoltage, RecordingSink};

use phprobe::adapters::reading::AtomicReading;
use phprobe::app::commands::COMMAND_TABLE;
use phprobe::app::console::{self, ConsoleLine};
use phprobe::app::service::PhProbeService;
use phprobe::config::ProbeConfig;

/// Feed a script through the parser the way the console thread does and
/// collect the rendered replies.
fn run_script(
    app: &mut PhProbeService<MemPrefs>,
    voltage: &AtomicReading,
    temperature: &AtomicReading,
    script: &str,
) -> Vec<String> {
    let mut sink = RecordingSink::new();
    let mut replies = Vec::new();
    for line in script.lines() {
        match console::parse(line) {
            Ok(ConsoleLine::Command(cmd)) => {
                let reply = app.handle_command(cmd, voltage, &mut sink);
                replies.push(console::render_reply(&reply));
            }
            Ok(ConsoleLine::Voltage(v)) => voltage.publish(v),
            Ok(ConsoleLine::Temperature(t)) => temperature.publish(t),
            Ok(ConsoleLine::Empty) => {}
            Err(e) => replies.push(console::render_error(&e.to_string())),
        }
    }
    replies
}

#[test]
fn every_table_command_parses() {
    for (name, cmd) in COMMAND_TABLE {
        assert_eq!(console::parse(name), Ok(ConsoleLine::Command(*cmd)));
    }
}

#[test]
fn scripted_calibration_session() {
    let mut app = PhProbeService::new(ProbeConfig::default(), MemPrefs::new());
    app.start(&mut RecordingSink::new());
    let voltage = AtomicReading::new();
    let temperature = AtomicReading::new();

    let replies = run_script(
        &mut app,
        &voltage,
        &temperature,
        "# pH 7 buffer\n\
         calibrate_neutral\n\
         voltage 1.45\n\
         temperature 24.0\n\
         calibrate_neutral\n\
         voltage 2.0\n\
         calibrate_acid\n\
         is_calibrated\n\
         calibrate_base\n",
    );

    assert_eq!(
        replies,
        vec![
            r#"{"reply":"rejected","error":"NoReading"}"#.to_string(),
            r#"{"reply":"done","persisted":true}"#.to_string(),
            r#"{"reply":"done","persisted":true}"#.to_string(),
            r#"{"reply":"calibrated","calibrated":true}"#.to_string(),
            r#"{"reply":"error","message":"unknown command 'calibrate_base'"}"#.to_string(),
        ]
    );
    assert!(app.is_calibrated());

    let reading = app
        .tick(&voltage, &temperature, &mut RecordingSink::new())
        .unwrap();
    // 24 °C flattens the slope by 3 %.
    assert!((reading.ph - 4.09).abs() < 1e-3, "got {}", reading.ph);
}

#[test]
fn disconnected_temperature_feed_is_substituted() {
    let mut app = PhProbeService::new(ProbeConfig::default(), MemPrefs::new());
    app.start(&mut RecordingSink::new());
    let voltage = AtomicReading::new();
    let temperature = AtomicReading::new();

    run_script(&mut app, &voltage, &temperature, "voltage 1.5\ntemperature nan\n");

    let reading = app
        .tick(&voltage, &temperature, &mut RecordingSink::new())
        .unwrap();
    assert!(reading.temperature_substituted);
    assert!((reading.ph - 7.0).abs() < 1e-3);

    // Same result through the plain mocks.
    let direct = app
        .tick(
            &MockVoltage(Some(1.5)),
            &MockTemperature(f32::NAN),
            &mut RecordingSink::new(),
        )
        .unwrap();
    assert_eq!(direct.ph, reading.ph);
}
