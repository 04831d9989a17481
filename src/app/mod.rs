//! Application core around the calibration engine.
//!
//! The measurement tick, command dispatch and console parsing for the pH
//! probe.  All interaction with hardware and flash happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod channels;
pub mod commands;
pub mod console;
pub mod events;
pub mod ports;
pub mod service;
