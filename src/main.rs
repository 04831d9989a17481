//! pH probe firmware main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  AtomicReading ×2      LogEventSink      NvsAdapter            │
//! │  (Voltage/Temperature) (EventSink)       (Preference+Config)   │
//! │  console thread ── CMD_CHANNEL ┐                               │
//! │                               ▼                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            PhProbeService (pure logic)                 │    │
//! │  │  Converter · CalibrationProcedure · CalibrationStore   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  PollTimer (fixed-interval measurement tick)                   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;
use std::time::Instant;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{info, warn};

use phprobe::adapters::log_sink::LogEventSink;
use phprobe::adapters::nvs::NvsAdapter;
use phprobe::adapters::reading::AtomicReading;
use phprobe::app::channels::CMD_CHANNEL;
use phprobe::app::console::{self, ConsoleLine};
use phprobe::app::ports::ConfigPort;
use phprobe::app::service::PhProbeService;
use phprobe::config::ProbeConfig;
use phprobe::scheduler::PollTimer;

/// Latest probe voltage, in volts.
static PROBE_VOLTAGE: AtomicReading = AtomicReading::new();
/// Latest water temperature, in °C.
static WATER_TEMPERATURE: AtomicReading = AtomicReading::new();

/// Longest single sleep, so console commands stay responsive.
const MAX_SLEEP_MS: u32 = 50;

// ── Console thread ────────────────────────────────────────────
//
// Sample feed lines go straight into the atomics; commands are handed to
// the control loop so they never interleave with a tick.

fn spawn_console() -> Result<()> {
    std::thread::Builder::new()
        .name("console".into())
        .stack_size(8 * 1024)
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!("Console: read failed: {}", e);
                        continue;
                    }
                };
                match console::parse(&line) {
                    Ok(ConsoleLine::Command(cmd)) => {
                        if CMD_CHANNEL.try_send(cmd).is_err() {
                            warn!("Console: command queue full, dropping {:?}", cmd);
                            println!("{}", console::render_error("command queue full"));
                        }
                    }
                    Ok(ConsoleLine::Voltage(v)) => PROBE_VOLTAGE.publish(v),
                    Ok(ConsoleLine::Temperature(t)) => WATER_TEMPERATURE.publish(t),
                    Ok(ConsoleLine::Empty) => {}
                    Err(e) => println!("{}", console::render_error(&e.to_string())),
                }
            }
            info!("Console: input closed");
        })?;
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("phprobe v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(nvs) => nvs,
        Err(e) => {
            warn!("NVS init failed ({}), calibration will not survive a restart", e);
            NvsAdapter::degraded()
        }
    };
    let config = match ConfigPort::load(&nvs) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            ProbeConfig::default()
        }
    };

    // ── 3. Construct app service ──────────────────────────────
    let mut timer = PollTimer::new(config.update_interval_ms);
    info!(
        "Measuring every {} ms (persistence {})",
        timer.interval_ms(),
        if nvs.is_persistent() { "on" } else { "off" }
    );
    let mut log_sink = LogEventSink::new();
    let mut app = PhProbeService::new(config, nvs);
    app.start(&mut log_sink);

    spawn_console()?;

    info!("System ready. Entering measurement loop.");

    // ── 4. Control loop ───────────────────────────────────────
    let mut last = Instant::now();
    loop {
        while let Ok(cmd) = CMD_CHANNEL.try_receive() {
            let reply = app.handle_command(cmd, &PROBE_VOLTAGE, &mut log_sink);
            println!("{}", console::render_reply(&reply));
            app.persist_config();
        }

        let now = Instant::now();
        let elapsed_ms = u32::try_from(now.duration_since(last).as_millis()).unwrap_or(u32::MAX);
        last = now;

        if timer.advance(elapsed_ms) {
            app.tick(&PROBE_VOLTAGE, &WATER_TEMPERATURE, &mut log_sink);
        }

        FreeRtos::delay_ms(timer.until_next_ms().clamp(1, MAX_SLEEP_MS));
    }
}
