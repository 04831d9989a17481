//! Probe configuration parameters
//!
//! All tunable parameters for the pH probe.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

use crate::calibration::AcceptancePolicy;

/// What the measurement tick publishes while the voltage source has not
/// produced a reading yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoReadingPolicy {
    /// Publish [`ProbeConfig::default_ph`] marked as a default reading.
    #[default]
    PublishDefault,
    /// Publish nothing for this tick.
    Skip,
}

/// Core probe configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    // --- Timing ---
    /// Measurement tick interval (milliseconds)
    pub update_interval_ms: u32,

    // --- Calibration ---
    /// Voltage windows a calibration attempt must fall into
    pub acceptance_policy: AcceptancePolicy,

    // --- Measurement ---
    /// Behaviour while the voltage source has no reading
    pub no_reading_policy: NoReadingPolicy,
    /// pH published under [`NoReadingPolicy::PublishDefault`]
    pub default_ph: f32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 1000, // 1 Hz
            acceptance_policy: AcceptancePolicy::Strict,
            no_reading_policy: NoReadingPolicy::PublishDefault,
            default_ph: 7.0,
        }
    }
}

impl ProbeConfig {
    /// Range-check every field.  Used by [`ConfigPort`](crate::app::ports::ConfigPort)
    /// implementations before persisting.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(100..=60_000).contains(&self.update_interval_ms) {
            return Err("update_interval_ms must be 100–60000");
        }
        if !(0.0..=14.0).contains(&self.default_ph) {
            return Err("default_ph must be 0.0–14.0");
        }
        Ok(())
    }
}
