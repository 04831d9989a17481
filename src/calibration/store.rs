//! Persisted calibration state.
//!
//! [`CalibrationStore`] owns both [`CalibrationPoint`]s and the
//! [`PreferencePort`] they are persisted through.  Slot layout:
//!
//! | Slot | Type | Content                    |
//! |------|------|----------------------------|
//! | 0    | f32  | neutral voltage (mV)       |
//! | 4    | f32  | acid voltage (mV)          |
//! | 8    | bool | neutral calibrated flag    |
//! | 9    | bool | acid calibrated flag       |
//!
//! In-memory state always takes effect, even when persisting fails: the
//! probe keeps measuring with the new calibration and the caller is told
//! it may not survive a restart.

use log::{debug, info, warn};

use super::{BufferPoint, CalibrationPoint, CalibrationSnapshot};
use crate::app::ports::{PreferencePort, StorageError};

pub struct CalibrationStore<P> {
    prefs: P,
    neutral: CalibrationPoint,
    acid: CalibrationPoint,
}

impl<P: PreferencePort> CalibrationStore<P> {
    /// Build a store at factory defaults.  Call [`load`](Self::load) once at
    /// startup to pick up persisted values.
    pub fn new(prefs: P) -> Self {
        Self {
            prefs,
            neutral: CalibrationPoint::factory(BufferPoint::Neutral),
            acid: CalibrationPoint::factory(BufferPoint::Acid),
        }
    }

    /// Populate both points from their slots.  A slot that is missing or
    /// unreadable leaves the in-memory value untouched.  A stored flag is
    /// only honoured when the same point's voltage loaded as well.
    pub fn load(&mut self) {
        for point in BufferPoint::ALL {
            let voltage_loaded = match self.prefs.load::<f32>(point.voltage_slot()) {
                Ok(Some(mv)) if mv.is_finite() => {
                    self.point_mut(point).voltage_mv = mv;
                    info!("Calibration: loaded {} voltage {:.2} mV", point.name(), mv);
                    true
                }
                Ok(Some(mv)) => {
                    warn!("Calibration: stored {} voltage {} ignored", point.name(), mv);
                    false
                }
                Ok(None) => {
                    debug!("Calibration: no stored {} voltage", point.name());
                    false
                }
                Err(e) => {
                    warn!("Calibration: {} voltage load failed: {}", point.name(), e);
                    false
                }
            };

            match self.prefs.load::<bool>(point.flag_slot()) {
                Ok(Some(true)) if !voltage_loaded => {
                    self.point_mut(point).is_calibrated = false;
                    warn!(
                        "Calibration: {} flag set but voltage missing, treating as uncalibrated",
                        point.name()
                    );
                }
                Ok(Some(flag)) => {
                    self.point_mut(point).is_calibrated = flag;
                    debug!("Calibration: loaded {} flag {}", point.name(), flag);
                }
                Ok(None) => debug!("Calibration: no stored {} flag", point.name()),
                Err(e) => warn!("Calibration: {} flag load failed: {}", point.name(), e),
            }
        }
    }

    pub fn get(&self, point: BufferPoint) -> CalibrationPoint {
        match point {
            BufferPoint::Neutral => self.neutral,
            BufferPoint::Acid => self.acid,
        }
    }

    pub fn snapshot(&self) -> CalibrationSnapshot {
        CalibrationSnapshot {
            neutral: self.neutral,
            acid: self.acid,
        }
    }

    pub fn is_calibrated(&self, point: BufferPoint) -> bool {
        self.get(point).is_calibrated
    }

    /// True iff both points have been calibrated.
    pub fn is_fully_calibrated(&self) -> bool {
        self.neutral.is_calibrated && self.acid.is_calibrated
    }

    /// Overwrite the voltage of `point` and persist it.
    pub(crate) fn commit(&mut self, point: BufferPoint, voltage_mv: f32) -> Result<(), StorageError> {
        self.point_mut(point).voltage_mv = voltage_mv;
        self.prefs.save(point.voltage_slot(), &voltage_mv)
    }

    /// Overwrite the calibrated flag of `point` and persist it.
    pub(crate) fn set_calibrated(&mut self, point: BufferPoint, calibrated: bool) -> Result<(), StorageError> {
        self.point_mut(point).is_calibrated = calibrated;
        self.prefs.save(point.flag_slot(), &calibrated)
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    /// Release the preference port, e.g. to hand it to a fresh store after
    /// a simulated restart.
    pub fn into_prefs(self) -> P {
        self.prefs
    }

    fn point_mut(&mut self, point: BufferPoint) -> &mut CalibrationPoint {
        match point {
            BufferPoint::Neutral => &mut self.neutral,
            BufferPoint::Acid => &mut self.acid,
        }
    }
}
