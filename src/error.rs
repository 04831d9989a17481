//! Unified error types for the pH probe firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the control
//! loop's error handling stays uniform. Variants are `Copy` so they can be
//! passed through the service and event sink without allocation.

use core::fmt;

use serde::Serialize;

use crate::app::ports::{ConfigError, StorageError};
use crate::calibration::BufferPoint;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// A calibration attempt was rejected.
    Calibration(CalibrationError),
    /// The voltage → pH line could not be evaluated.
    Conversion(ConversionError),
    /// A preference slot could not be read or written.
    Storage(StorageError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calibration(e) => write!(f, "calibration: {e}"),
            Self::Conversion(e) => write!(f, "conversion: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Calibration errors
// ---------------------------------------------------------------------------

/// Reasons a calibration attempt is rejected.  A rejected attempt never
/// mutates the stored calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CalibrationError {
    /// The voltage source has not produced a usable value yet.
    NoReading,
    /// The measured voltage lies outside the acceptance window.
    OutOfRange { point: BufferPoint, voltage_mv: f32 },
    /// The voltage coincides with the other point's voltage; the resulting
    /// line would have a zero denominator.
    DegenerateCalibration { point: BufferPoint, voltage_mv: f32 },
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoReading => write!(f, "no valid voltage reading"),
            Self::OutOfRange { point, voltage_mv } => write!(
                f,
                "{voltage_mv:.2} mV out of range for pH {:.1} calibration",
                point.reference_ph()
            ),
            Self::DegenerateCalibration { point, voltage_mv } => write!(
                f,
                "{voltage_mv:.2} mV for pH {:.1} coincides with the other calibration point",
                point.reference_ph()
            ),
        }
    }
}

impl From<CalibrationError> for Error {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}

// ---------------------------------------------------------------------------
// Conversion errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionError {
    /// Neutral and acid voltages coincide (zero-denominator slope).
    DegenerateCalibration,
    /// The input voltage is NaN or infinite.
    InvalidVoltage,
    /// The line evaluated to NaN or infinity for a finite input.
    NonFiniteResult,
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateCalibration => write!(f, "calibration points coincide"),
            Self::InvalidVoltage => write!(f, "voltage is not a finite number"),
            Self::NonFiniteResult => write!(f, "computed pH is not a finite number"),
        }
    }
}

impl From<ConversionError> for Error {
    fn from(e: ConversionError) -> Self {
        Self::Conversion(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
