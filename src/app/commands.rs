//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (serial console,
//! a home-automation bridge, a provisioning tool) that the
//! [`PhProbeService`](super::service::PhProbeService) interprets and acts upon.
//! Argument-free commands are reachable by name through [`COMMAND_TABLE`].

use serde::Serialize;

use crate::calibration::{AcceptancePolicy, BufferPoint, CalibrationPoint};
use crate::config::{NoReadingPolicy, ProbeConfig};
use crate::error::CalibrationError;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhCommand {
    /// Capture the live probe voltage as the given buffer's voltage.
    Calibrate(BufferPoint),

    /// Clear both calibrated flags (voltages are kept).
    ResetCalibration,

    /// Report whether both points are calibrated.
    QueryCalibrated,

    /// Report both calibration points and the last reading.
    Status,

    /// Switch the calibration acceptance windows.
    SetAcceptancePolicy(AcceptancePolicy),

    /// Switch the no-reading measurement behaviour.
    SetNoReadingPolicy(NoReadingPolicy),
}

/// Name → command dispatch table for argument-free commands.
pub const COMMAND_TABLE: &[(&str, PhCommand)] = &[
    ("calibrate_neutral", PhCommand::Calibrate(BufferPoint::Neutral)),
    ("calibrate_acid", PhCommand::Calibrate(BufferPoint::Acid)),
    ("reset_calibration_indicator", PhCommand::ResetCalibration),
    ("is_calibrated", PhCommand::QueryCalibrated),
    ("status", PhCommand::Status),
];

impl PhCommand {
    /// Look up an argument-free command by its table name.
    pub fn from_name(name: &str) -> Option<Self> {
        COMMAND_TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, cmd)| *cmd)
    }

    /// Table name, if this command is reachable by name alone.
    pub fn name(self) -> Option<&'static str> {
        COMMAND_TABLE
            .iter()
            .find(|(_, cmd)| *cmd == self)
            .map(|(n, _)| *n)
    }
}

/// Calibration state as reported to the command surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusReport {
    pub neutral: CalibrationPoint,
    pub acid: CalibrationPoint,
    pub fully_calibrated: bool,
    /// Windows the next calibration attempt is checked against.
    pub acceptance_policy: AcceptancePolicy,
    pub last_ph: Option<f32>,
}

/// Synchronous answer to a [`PhCommand`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum CommandReply {
    /// The command took effect.  `persisted` is false when storage failed
    /// and the change may not survive a restart.
    Done { persisted: bool },
    /// A calibration attempt was refused; nothing changed.
    Rejected { error: CalibrationError },
    Calibrated { calibrated: bool },
    Status(StatusReport),
    Configured { config: ProbeConfig },
}
