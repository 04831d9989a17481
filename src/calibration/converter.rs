//! Voltage → pH conversion with slope temperature compensation.
//!
//! Voltages are mapped into a working coordinate centred on
//! [`MID_SCALE_MV`] and scaled by [`COORDINATE_SCALE`].  The line through
//! the two calibration points is then tilted by
//! `1 + 0.03 * (T - 25 °C)` and re-anchored so it still passes through
//! the neutral point.
//!
//! Everything here is pure; the only side effect is a warn-level log when
//! the temperature has to be substituted.

use log::warn;

use super::{
    BufferPoint, CalibrationPoint, COORDINATE_SCALE, MID_SCALE_MV, MIN_CALIBRATION_SPAN_MV,
    REFERENCE_TEMPERATURE_C, TEMPERATURE_COEFFICIENT_PER_C,
};
use crate::error::ConversionError;

/// Map a millivolt value into the working coordinate.
#[inline]
pub fn to_coordinate(voltage_mv: f32) -> f32 {
    (voltage_mv - MID_SCALE_MV) / COORDINATE_SCALE
}

/// Temperature the line is evaluated at, and whether it was substituted.
pub fn effective_temperature(temperature_c: f32) -> (f32, bool) {
    if temperature_c.is_finite() {
        (temperature_c, false)
    } else {
        (REFERENCE_TEMPERATURE_C, true)
    }
}

/// Relative slope correction; zero at the reference temperature.
#[inline]
pub fn temperature_coefficient(temperature_c: f32) -> f32 {
    TEMPERATURE_COEFFICIENT_PER_C * (temperature_c - REFERENCE_TEMPERATURE_C)
}

/// Uncompensated slope of the line through both calibration points.
pub fn base_slope(neutral_mv: f32, acid_mv: f32) -> Result<f32, ConversionError> {
    let span = (neutral_mv - acid_mv).abs();
    if span.is_nan() || span < MIN_CALIBRATION_SPAN_MV {
        return Err(ConversionError::DegenerateCalibration);
    }
    let rise = BufferPoint::Neutral.reference_ph() - BufferPoint::Acid.reference_ph();
    Ok(rise / (to_coordinate(neutral_mv) - to_coordinate(acid_mv)))
}

/// A compensated conversion line, derived once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionLine {
    pub slope: f32,
    pub intercept: f32,
    /// Temperature the slope was compensated for.
    pub temperature_c: f32,
    /// True when the supplied temperature was not finite and
    /// [`REFERENCE_TEMPERATURE_C`] was used instead.
    pub temperature_substituted: bool,
}

impl ConversionLine {
    pub fn derive(
        temperature_c: f32,
        neutral: &CalibrationPoint,
        acid: &CalibrationPoint,
    ) -> Result<Self, ConversionError> {
        let (temperature_c, temperature_substituted) = effective_temperature(temperature_c);
        if temperature_substituted {
            warn!("pH: water temperature invalid, using {REFERENCE_TEMPERATURE_C:.1}°C");
        }

        let slope = base_slope(neutral.voltage_mv, acid.voltage_mv)?
            * (1.0 + temperature_coefficient(temperature_c));
        let intercept = neutral.reference_ph - slope * to_coordinate(neutral.voltage_mv);

        Ok(Self {
            slope,
            intercept,
            temperature_c,
            temperature_substituted,
        })
    }

    /// pH at `voltage_mv`.
    pub fn ph_at(&self, voltage_mv: f32) -> Result<f32, ConversionError> {
        if !voltage_mv.is_finite() {
            return Err(ConversionError::InvalidVoltage);
        }
        let ph = self.slope * to_coordinate(voltage_mv) + self.intercept;
        if ph.is_finite() {
            Ok(ph)
        } else {
            Err(ConversionError::NonFiniteResult)
        }
    }
}

/// Compensated pH for one measurement.
pub fn compute(
    voltage_mv: f32,
    temperature_c: f32,
    neutral: &CalibrationPoint,
    acid: &CalibrationPoint,
) -> Result<f32, ConversionError> {
    ConversionLine::derive(temperature_c, neutral, acid)?.ph_at(voltage_mv)
}
