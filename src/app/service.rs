//! Application service, the hexagonal core.
//!
//! [`PhProbeService`] owns the calibration store, the calibration procedure
//! and the live configuration.  All I/O flows through port traits injected
//! at call sites, so the whole service is testable with mock adapters.
//!
//! ```text
//!  VoltageSource ─────▶ ┌────────────────────────────┐ ──▶ EventSink
//!  TemperatureSource ─▶ │       PhProbeService       │
//!  PhCommand ─────────▶ │ Converter · Procedure      │ ──▶ CommandReply
//!                       │ CalibrationStore ◀▶ Prefs  │
//!                       └────────────────────────────┘
//! ```
//!
//! Ticks and commands are driven from one loop, so a tick never observes a
//! half-applied calibration.

use log::{debug, error, info, warn};

use crate::calibration::{
    BufferPoint, CalibrationOutcome, CalibrationProcedure, CalibrationSnapshot, CalibrationStore,
    ConversionLine, Persistence,
};
use crate::config::{NoReadingPolicy, ProbeConfig};
use crate::error::{CalibrationError, Error, Result};

use super::commands::{CommandReply, PhCommand, StatusReport};
use super::events::{PhEvent, PhReading, ReadingSource};
use super::ports::{ConfigPort, EventSink, PreferencePort, TemperatureSource, VoltageSource};

/// Probe voltage in millivolts, or `None` while the source has nothing usable.
pub fn read_voltage_mv(source: &impl VoltageSource) -> Option<f32> {
    if !source.has_valid_reading() {
        return None;
    }
    let mv = source.current_value() * 1000.0;
    mv.is_finite().then_some(mv)
}

// ───────────────────────────────────────────────────────────────
// PhProbeService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct PhProbeService<P> {
    store: CalibrationStore<P>,
    procedure: CalibrationProcedure,
    config: ProbeConfig,
    last_reading: Option<PhReading>,
    tick_count: u64,
    config_dirty: bool,
}

impl<P: PreferencePort> PhProbeService<P> {
    /// Construct the service.  Calibration stays at factory defaults until
    /// [`start`](Self::start) loads it.
    pub fn new(config: ProbeConfig, prefs: P) -> Self {
        Self {
            store: CalibrationStore::new(prefs),
            procedure: CalibrationProcedure::new(config.acceptance_policy),
            config,
            last_reading: None,
            tick_count: 0,
            config_dirty: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load persisted calibration and announce readiness.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.store.load();
        let snapshot = self.store.snapshot();
        sink.emit(&PhEvent::Started(snapshot));
        info!(
            "PhProbeService started: neutral={:.2}mV acid={:.2}mV calibrated={}",
            snapshot.neutral.voltage_mv,
            snapshot.acid.voltage_mv,
            snapshot.is_fully_calibrated()
        );
    }

    // ── Per-tick measurement ──────────────────────────────────

    /// Run one measurement cycle and return what was published, if anything.
    pub fn tick(
        &mut self,
        voltage: &impl VoltageSource,
        temperature: &impl TemperatureSource,
        sink: &mut impl EventSink,
    ) -> Option<PhReading> {
        self.tick_count += 1;

        match self.measure(voltage, temperature) {
            Ok(Some(reading)) => {
                debug!(
                    "pH: {:.2} ({:?}) at {:?} mV, {:?} °C",
                    reading.ph, reading.source, reading.voltage_mv, reading.temperature_c
                );
                self.last_reading = Some(reading);
                sink.emit(&PhEvent::Reading(reading));
                Some(reading)
            }
            Ok(None) => {
                sink.emit(&PhEvent::ReadingSkipped);
                None
            }
            Err(Error::Conversion(e)) => {
                error!("pH: conversion failed: {}", e);
                sink.emit(&PhEvent::ConversionFailed(e));
                None
            }
            Err(e) => {
                error!("pH: measurement failed: {}", e);
                None
            }
        }
    }

    fn measure(
        &self,
        voltage: &impl VoltageSource,
        temperature: &impl TemperatureSource,
    ) -> Result<Option<PhReading>> {
        let Some(voltage_mv) = read_voltage_mv(voltage) else {
            return Ok(match self.config.no_reading_policy {
                NoReadingPolicy::PublishDefault => {
                    warn!(
                        "pH: no valid voltage reading yet, publishing default {:.1}",
                        self.config.default_ph
                    );
                    Some(PhReading::fallback(self.config.default_ph))
                }
                NoReadingPolicy::Skip => {
                    warn!("pH: no valid voltage reading yet, skipping");
                    None
                }
            });
        };

        let snapshot = self.store.snapshot();
        let line =
            ConversionLine::derive(temperature.current_value(), &snapshot.neutral, &snapshot.acid)?;
        let ph = line.ph_at(voltage_mv)?;

        Ok(Some(PhReading {
            ph,
            source: ReadingSource::Measured,
            voltage_mv: Some(voltage_mv),
            temperature_c: Some(line.temperature_c),
            temperature_substituted: line.temperature_substituted,
        }))
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.  The voltage source is only sampled by
    /// calibration commands.
    pub fn handle_command(
        &mut self,
        cmd: PhCommand,
        voltage: &impl VoltageSource,
        sink: &mut impl EventSink,
    ) -> CommandReply {
        match cmd {
            PhCommand::Calibrate(point) => match self.calibrate(point, voltage, sink) {
                Ok(outcome) => CommandReply::Done {
                    persisted: outcome.persistence.is_saved(),
                },
                Err(error) => CommandReply::Rejected { error },
            },
            PhCommand::ResetCalibration => CommandReply::Done {
                persisted: self.reset_calibration(sink).is_saved(),
            },
            PhCommand::QueryCalibrated => CommandReply::Calibrated {
                calibrated: self.is_calibrated(),
            },
            PhCommand::Status => CommandReply::Status(self.status()),
            PhCommand::SetAcceptancePolicy(policy) => {
                self.config.acceptance_policy = policy;
                self.procedure.set_policy(policy);
                self.config_dirty = true;
                info!("Acceptance policy set to {:?}", policy);
                CommandReply::Configured {
                    config: self.config.clone(),
                }
            }
            PhCommand::SetNoReadingPolicy(policy) => {
                self.config.no_reading_policy = policy;
                self.config_dirty = true;
                info!("No-reading policy set to {:?}", policy);
                CommandReply::Configured {
                    config: self.config.clone(),
                }
            }
        }
    }

    /// Capture the live voltage for `point`.
    pub fn calibrate(
        &mut self,
        point: BufferPoint,
        voltage: &impl VoltageSource,
        sink: &mut impl EventSink,
    ) -> core::result::Result<CalibrationOutcome, CalibrationError> {
        let result = self
            .procedure
            .calibrate(&mut self.store, point, read_voltage_mv(voltage));
        match result {
            Ok(outcome) => sink.emit(&PhEvent::CalibrationAccepted(outcome)),
            Err(e) => sink.emit(&PhEvent::CalibrationRejected(e)),
        }
        result
    }

    /// Re-open the uncalibrated state for both points.
    pub fn reset_calibration(&mut self, sink: &mut impl EventSink) -> Persistence {
        let persistence = self.procedure.reset(&mut self.store);
        sink.emit(&PhEvent::CalibrationReset(persistence));
        persistence
    }

    // ── Queries ───────────────────────────────────────────────

    /// True iff both calibration points have been captured.
    pub fn is_calibrated(&self) -> bool {
        self.store.is_fully_calibrated()
    }

    pub fn calibration(&self) -> CalibrationSnapshot {
        self.store.snapshot()
    }

    pub fn status(&self) -> StatusReport {
        let snapshot = self.store.snapshot();
        StatusReport {
            neutral: snapshot.neutral,
            acid: snapshot.acid,
            fully_calibrated: snapshot.is_fully_calibrated(),
            acceptance_policy: self.procedure.policy(),
            last_ph: self.last_reading.map(|r| r.ph),
        }
    }

    pub fn last_reading(&self) -> Option<PhReading> {
        self.last_reading
    }

    /// Total measurement ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn preferences(&self) -> &P {
        self.store.prefs()
    }

    /// Release the preference port (used to simulate a restart).
    pub fn into_preferences(self) -> P {
        self.store.into_prefs()
    }

    // ── Config persistence ────────────────────────────────────

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}

impl<P: PreferencePort + ConfigPort> PhProbeService<P> {
    /// Persist the config if a command changed it.  Returns `true` if saved.
    pub fn persist_config(&mut self) -> bool {
        if !self.config_dirty {
            return false;
        }
        match ConfigPort::save(self.store.prefs(), &self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config saved to NVS");
                true
            }
            Err(e) => {
                warn!("Config save failed: {}", e);
                false
            }
        }
    }
}
