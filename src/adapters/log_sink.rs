//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::{PhEvent, ReadingSource};
use crate::app::ports::EventSink;
use crate::calibration::Persistence;

/// Adapter that logs every [`PhEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &PhEvent) {
        match event {
            PhEvent::Started(snap) => {
                info!(
                    "START | neutral={:.2}mV{} acid={:.2}mV{}",
                    snap.neutral.voltage_mv,
                    if snap.neutral.is_calibrated { "*" } else { "" },
                    snap.acid.voltage_mv,
                    if snap.acid.is_calibrated { "*" } else { "" },
                );
            }
            PhEvent::Reading(r) => match r.source {
                ReadingSource::Measured => info!(
                    "PH    | pH={:.2} | V={:.2}mV | T={:.1}\u{00b0}C{}",
                    r.ph,
                    r.voltage_mv.unwrap_or(f32::NAN),
                    r.temperature_c.unwrap_or(f32::NAN),
                    if r.temperature_substituted { " (substituted)" } else { "" },
                ),
                ReadingSource::Default => info!("PH    | pH={:.2} | default, no voltage", r.ph),
            },
            PhEvent::ReadingSkipped => {
                info!("PH    | skipped, no voltage");
            }
            PhEvent::ConversionFailed(e) => {
                warn!("PH    | conversion failed: {}", e);
            }
            PhEvent::CalibrationAccepted(o) => {
                info!(
                    "CAL   | pH {:.1} ({}) = {:.2}mV{}",
                    o.point.reference_ph(),
                    o.point.name(),
                    o.voltage_mv,
                    if o.persistence.is_saved() { "" } else { " (not persisted)" },
                );
            }
            PhEvent::CalibrationRejected(e) => {
                warn!("CAL   | rejected: {}", e);
            }
            PhEvent::CalibrationReset(p) => match p {
                Persistence::Saved => info!("CAL   | indicators reset"),
                Persistence::Failed(e) => warn!("CAL   | indicators reset, not persisted: {}", e),
            },
        }
    }
}
