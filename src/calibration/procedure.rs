//! Calibration capture and reset.
//!
//! A capture validates the live probe voltage against the
//! [`AcceptancePolicy`] window for the buffer being calibrated, refuses
//! pairs that would collapse the conversion line, and only then writes the
//! voltage and the calibrated flag into the [`CalibrationStore`].

use log::{info, warn};

use super::store::CalibrationStore;
use super::{AcceptancePolicy, BufferPoint, MIN_CALIBRATION_SPAN_MV};
use crate::app::ports::{PreferencePort, StorageError};
use crate::error::CalibrationError;

/// Whether a state change reached persistent storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    Saved,
    /// The change is live in memory but may be lost on restart.
    Failed(StorageError),
}

impl Persistence {
    fn from_results(results: &[Result<(), StorageError>]) -> Self {
        results
            .iter()
            .find_map(|r| r.err())
            .map_or(Self::Saved, Self::Failed)
    }

    pub fn is_saved(self) -> bool {
        self == Self::Saved
    }
}

/// Result of an accepted calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOutcome {
    pub point: BufferPoint,
    pub voltage_mv: f32,
    pub persistence: Persistence,
}

#[derive(Debug, Clone, Copy)]
pub struct CalibrationProcedure {
    policy: AcceptancePolicy,
}

impl CalibrationProcedure {
    pub fn new(policy: AcceptancePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AcceptancePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: AcceptancePolicy) {
        self.policy = policy;
    }

    /// Capture `measured_voltage_mv` as the voltage of `point`.
    ///
    /// `None` means the voltage source has no reading yet.  On rejection
    /// the store is left untouched.
    pub fn calibrate<P: PreferencePort>(
        &self,
        store: &mut CalibrationStore<P>,
        point: BufferPoint,
        measured_voltage_mv: Option<f32>,
    ) -> Result<CalibrationOutcome, CalibrationError> {
        let Some(voltage_mv) = measured_voltage_mv.filter(|mv| mv.is_finite()) else {
            warn!(
                "Calibration: cannot calibrate pH {:.1}, no valid voltage reading",
                point.reference_ph()
            );
            return Err(CalibrationError::NoReading);
        };

        if !self.policy.window(point).contains(voltage_mv) {
            warn!(
                "Calibration: {:.2} mV out of range for pH {:.1} ({:?} policy)",
                voltage_mv,
                point.reference_ph(),
                self.policy
            );
            return Err(CalibrationError::OutOfRange { point, voltage_mv });
        }

        let other_mv = store.get(point.other()).voltage_mv;
        if (voltage_mv - other_mv).abs() < MIN_CALIBRATION_SPAN_MV {
            warn!(
                "Calibration: {:.2} mV for pH {:.1} coincides with {} point",
                voltage_mv,
                point.reference_ph(),
                point.other().name()
            );
            return Err(CalibrationError::DegenerateCalibration { point, voltage_mv });
        }

        let persistence = Persistence::from_results(&[
            store.commit(point, voltage_mv),
            store.set_calibrated(point, true),
        ]);
        match persistence {
            Persistence::Saved => info!(
                "Calibration: pH {:.1} completed at {:.2} mV",
                point.reference_ph(),
                voltage_mv
            ),
            Persistence::Failed(e) => warn!(
                "Calibration: pH {:.1} applied at {:.2} mV but not persisted: {}",
                point.reference_ph(),
                voltage_mv,
                e
            ),
        }

        Ok(CalibrationOutcome {
            point,
            voltage_mv,
            persistence,
        })
    }

    /// Clear both calibrated flags.  Voltages are kept.
    pub fn reset<P: PreferencePort>(&self, store: &mut CalibrationStore<P>) -> Persistence {
        let persistence = Persistence::from_results(&[
            store.set_calibrated(BufferPoint::Neutral, false),
            store.set_calibrated(BufferPoint::Acid, false),
        ]);
        match persistence {
            Persistence::Saved => info!("Calibration: indicators reset"),
            Persistence::Failed(e) => warn!("Calibration: indicators reset but not persisted: {}", e),
        }
        persistence
    }
}

impl Default for CalibrationProcedure {
    fn default() -> Self {
        Self::new(AcceptancePolicy::default())
    }
}
