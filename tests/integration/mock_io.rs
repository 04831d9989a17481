//! Mock ports for integration tests.
//!
//! Sample sources are plain cells the test sets directly; `MemPrefs`
//! keeps slots in a map and can be switched into a failing mode to
//! exercise persistence failures.

use std::cell::RefCell;
use std::collections::HashMap;

use phprobe::app::events::PhEvent;
use phprobe::app::ports::{
    ConfigError, ConfigPort, EventSink, PreferencePort, SlotId, StorageError, TemperatureSource,
    VoltageSource,
};
use phprobe::config::ProbeConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;

// ── Sample sources ────────────────────────────────────────────

/// Probe voltage in volts; `None` means no reading yet.
pub struct MockVoltage(pub Option<f32>);

impl VoltageSource for MockVoltage {
    fn has_valid_reading(&self) -> bool {
        self.0.is_some()
    }

    fn current_value(&self) -> f32 {
        self.0.unwrap_or(f32::NAN)
    }
}

/// Water temperature in °C, NaN for a disconnected sensor.
pub struct MockTemperature(pub f32);

impl TemperatureSource for MockTemperature {
    fn current_value(&self) -> f32 {
        self.0
    }
}

// ── Preferences ───────────────────────────────────────────────

#[derive(Default)]
pub struct MemPrefs {
    slots: HashMap<u8, String>,
    config: RefCell<Option<ProbeConfig>>,
    pub fail_writes: bool,
    pub writes: usize,
}

impl MemPrefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn has_slot(&self, slot: u8) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn stored_config(&self) -> Option<ProbeConfig> {
        self.config.borrow().clone()
    }
}

impl PreferencePort for MemPrefs {
    fn load<T: DeserializeOwned>(&self, slot: SlotId) -> Result<Option<T>, StorageError> {
        match self.slots.get(&slot.0) {
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|_| StorageError::Corrupted),
            None => Ok(None),
        }
    }

    fn save<T: Serialize>(&mut self, slot: SlotId, value: &T) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        let raw = serde_json::to_string(value).map_err(|_| StorageError::IoError)?;
        self.slots.insert(slot.0, raw);
        self.writes += 1;
        Ok(())
    }
}

impl ConfigPort for MemPrefs {
    fn load(&self) -> Result<ProbeConfig, ConfigError> {
        Ok(self.config.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &ProbeConfig) -> Result<(), ConfigError> {
        if self.fail_writes {
            return Err(ConfigError::IoError);
        }
        config.validate().map_err(ConfigError::ValidationFailed)?;
        *self.config.borrow_mut() = Some(config.clone());
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<PhEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&PhEvent> {
        self.events.last()
    }

    pub fn count(&self, pred: impl Fn(&PhEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &PhEvent) {
        self.events.push(event.clone());
    }
}
