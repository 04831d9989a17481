//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PhProbeService (domain)
//! ```
//!
//! Driven adapters (sample sources, preference storage, event sinks)
//! implement these traits.  The [`PhProbeService`](super::service::PhProbeService)
//! and the [`calibration`](crate::calibration) core consume them via
//! generics, so the domain never touches hardware or flash directly.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ProbeConfig;

// ───────────────────────────────────────────────────────────────
// Sample ports (driven adapters: acquisition → domain)
// ───────────────────────────────────────────────────────────────

/// Probe voltage as produced by the upstream ADC channel.
pub trait VoltageSource {
    /// Whether the upstream channel has produced at least one usable value.
    fn has_valid_reading(&self) -> bool;

    /// Latest value in **volts**.  Only meaningful when
    /// [`has_valid_reading`](Self::has_valid_reading) is true.
    fn current_value(&self) -> f32;
}

/// Water temperature in degrees Celsius.  May report NaN or infinity when
/// the probe is disconnected.
pub trait TemperatureSource {
    fn current_value(&self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Preference port (driven adapter: domain ↔ NVS slots)
// ───────────────────────────────────────────────────────────────

/// Numeric preference slot.  Slot numbers are part of the persisted
/// layout and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub u8);

/// Typed key/value storage addressed by [`SlotId`].
///
/// Implementations own the encoding; callers only see typed values.
/// Writes must be atomic per slot.
pub trait PreferencePort {
    /// Load a slot.  `Ok(None)` means the slot was never written.
    fn load<T: DeserializeOwned>(&self, slot: SlotId) -> Result<Option<T>, StorageError>;

    /// Persist a slot.
    fn save<T: Serialize>(&mut self, slot: SlotId, value: &T) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the probe configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// values with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ProbeConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ProbeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &ProbeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`PhEvent`](super::events::PhEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::PhEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`PreferencePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
    /// Stored bytes do not decode as the requested type.
    Corrupted,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "stored value corrupted"),
        }
    }
}

impl core::error::Error for ConfigError {}
impl core::error::Error for StorageError {}
