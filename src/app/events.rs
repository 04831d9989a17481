//! Outbound application events.
//!
//! The [`PhProbeService`](super::service::PhProbeService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, publish to a
//! home-automation bus, etc.

use serde::Serialize;

use crate::calibration::{CalibrationOutcome, CalibrationSnapshot, Persistence};
use crate::error::{CalibrationError, ConversionError};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum PhEvent {
    /// Calibration was loaded and the service is ready.
    Started(CalibrationSnapshot),

    /// A pH value was published for this tick.
    Reading(PhReading),

    /// No reading was available and the policy is to publish nothing.
    ReadingSkipped,

    /// The stored calibration cannot produce a pH value.
    ConversionFailed(ConversionError),

    CalibrationAccepted(CalibrationOutcome),

    CalibrationRejected(CalibrationError),

    /// Both calibrated flags were cleared.
    CalibrationReset(Persistence),
}

/// Where a published pH value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadingSource {
    /// Computed from a live voltage.
    Measured,
    /// Configured fallback while the voltage source has no reading.
    Default,
}

/// One published pH value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhReading {
    pub ph: f32,
    pub source: ReadingSource,
    /// Probe voltage the value was computed from (mV).
    pub voltage_mv: Option<f32>,
    /// Temperature the slope was compensated for (°C).
    pub temperature_c: Option<f32>,
    /// The reported temperature was not finite and 25 °C was used.
    pub temperature_substituted: bool,
}

impl PhReading {
    /// Fallback value published while no voltage is available.
    pub fn fallback(ph: f32) -> Self {
        Self {
            ph,
            source: ReadingSource::Default,
            voltage_mv: None,
            temperature_c: None,
            temperature_substituted: false,
        }
    }
}
