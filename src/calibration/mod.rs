//! Calibration and compensation engine.
//!
//! Maps a probe voltage and a water temperature to a compensated pH using
//! two buffer-solution calibration points:
//!
//! ```text
//!   VoltageSource ─┐
//!                  ├─▶ converter::compute ──▶ pH
//!   Temperature  ──┘          ▲
//!                             │ snapshot
//!   CalibrationProcedure ──▶ CalibrationStore ◀──▶ PreferencePort
//! ```
//!
//! [`BufferPoint`] names a calibration point and carries its fixed
//! constants; [`CalibrationPoint`] is its mutable, persisted state.

pub mod converter;
pub mod procedure;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::app::ports::SlotId;

pub use converter::{ConversionLine, compute};
pub use procedure::{CalibrationOutcome, CalibrationProcedure, Persistence};
pub use store::CalibrationStore;

/// Nominal mid-scale probe voltage; the origin of the working coordinate.
pub const MID_SCALE_MV: f32 = 1500.0;

/// Divider converting millivolt deltas into working-coordinate units.
pub const COORDINATE_SCALE: f32 = 3.0;

/// Temperature at which the slope needs no compensation.
pub const REFERENCE_TEMPERATURE_C: f32 = 25.0;

/// Relative slope change per degree away from the reference temperature.
pub const TEMPERATURE_COEFFICIENT_PER_C: f32 = 0.03;

/// Two calibration voltages closer than this give an unusable line.
pub const MIN_CALIBRATION_SPAN_MV: f32 = 0.01;

// ───────────────────────────────────────────────────────────────
// Buffer points
// ───────────────────────────────────────────────────────────────

/// The two buffer solutions the probe is calibrated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferPoint {
    /// pH 7.0 buffer.
    Neutral,
    /// pH 4.0 buffer.
    Acid,
}

impl BufferPoint {
    pub const ALL: [Self; 2] = [Self::Neutral, Self::Acid];

    pub const fn reference_ph(self) -> f32 {
        match self {
            Self::Neutral => 7.0,
            Self::Acid => 4.0,
        }
    }

    /// Voltage assumed until the point is calibrated.
    pub const fn default_voltage_mv(self) -> f32 {
        match self {
            Self::Neutral => 1500.0,
            Self::Acid => 2032.44,
        }
    }

    pub const fn voltage_slot(self) -> SlotId {
        match self {
            Self::Neutral => SlotId(0),
            Self::Acid => SlotId(4),
        }
    }

    pub const fn flag_slot(self) -> SlotId {
        match self {
            Self::Neutral => SlotId(8),
            Self::Acid => SlotId(9),
        }
    }

    pub const fn other(self) -> Self {
        match self {
            Self::Neutral => Self::Acid,
            Self::Acid => Self::Neutral,
        }
    }

    /// Lower-case name used by logs and the command surface.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Acid => "acid",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Calibration state
// ───────────────────────────────────────────────────────────────

/// Persisted state of one calibration point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationPoint {
    pub reference_ph: f32,
    pub voltage_mv: f32,
    pub is_calibrated: bool,
}

impl CalibrationPoint {
    /// Factory state: default voltage, not calibrated.
    pub const fn factory(point: BufferPoint) -> Self {
        Self {
            reference_ph: point.reference_ph(),
            voltage_mv: point.default_voltage_mv(),
            is_calibrated: false,
        }
    }
}

/// Both calibration points as read by one measurement tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationSnapshot {
    pub neutral: CalibrationPoint,
    pub acid: CalibrationPoint,
}

impl CalibrationSnapshot {
    pub fn get(&self, point: BufferPoint) -> CalibrationPoint {
        match point {
            BufferPoint::Neutral => self.neutral,
            BufferPoint::Acid => self.acid,
        }
    }

    pub fn is_fully_calibrated(&self) -> bool {
        self.neutral.is_calibrated && self.acid.is_calibrated
    }
}

impl Default for CalibrationSnapshot {
    fn default() -> Self {
        Self {
            neutral: CalibrationPoint::factory(BufferPoint::Neutral),
            acid: CalibrationPoint::factory(BufferPoint::Acid),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Acceptance windows
// ───────────────────────────────────────────────────────────────

/// Open voltage interval `(min_mv, max_mv)`; both bounds are excluded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceWindow {
    pub min_mv: f32,
    pub max_mv: f32,
}

impl AcceptanceWindow {
    pub fn contains(&self, voltage_mv: f32) -> bool {
        voltage_mv > self.min_mv && voltage_mv < self.max_mv
    }
}

/// Which voltages a calibration attempt may capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AcceptancePolicy {
    /// Physically plausible windows around each buffer's nominal voltage.
    #[default]
    Strict,
    /// Anything the ADC front end can report.
    Permissive,
}

impl AcceptancePolicy {
    pub const fn window(self, point: BufferPoint) -> AcceptanceWindow {
        match (self, point) {
            (Self::Strict, BufferPoint::Neutral) => AcceptanceWindow {
                min_mv: 1322.0,
                max_mv: 1678.0,
            },
            (Self::Strict, BufferPoint::Acid) => AcceptanceWindow {
                min_mv: 1854.0,
                max_mv: 2210.0,
            },
            (Self::Permissive, _) => AcceptanceWindow {
                min_mv: 0.0,
                max_mv: 3000.0,
            },
        }
    }
}
