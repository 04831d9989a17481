//! Lock-free sample cell shared between an acquisition task and the
//! measurement loop.
//!
//! The latest value is kept as `f32` bits in an `AtomicU32`; NaN means
//! "no reading".  Writers call [`AtomicReading::publish`] from any task,
//! the control loop reads it through [`VoltageSource`] /
//! [`TemperatureSource`].

use core::sync::atomic::{AtomicU32, Ordering};

use crate::app::ports::{TemperatureSource, VoltageSource};

/// Quiet NaN, the "no reading" marker.
const NO_READING: u32 = 0x7FC0_0000;

pub struct AtomicReading {
    bits: AtomicU32,
}

impl AtomicReading {
    /// An empty cell.  `const` so it can back a `static`.
    pub const fn new() -> Self {
        Self {
            bits: AtomicU32::new(NO_READING),
        }
    }

    /// Store the latest sample.  Publishing a non-finite value clears the cell.
    pub fn publish(&self, value: f32) {
        let bits = if value.is_finite() {
            value.to_bits()
        } else {
            NO_READING
        };
        self.bits.store(bits, Ordering::Release);
    }

    pub fn get(&self) -> Option<f32> {
        let value = f32::from_bits(self.bits.load(Ordering::Acquire));
        value.is_finite().then_some(value)
    }
}

impl Default for AtomicReading {
    fn default() -> Self {
        Self::new()
    }
}

impl VoltageSource for AtomicReading {
    fn has_valid_reading(&self) -> bool {
        self.get().is_some()
    }

    fn current_value(&self) -> f32 {
        self.get().unwrap_or(f32::NAN)
    }
}

impl TemperatureSource for AtomicReading {
    fn current_value(&self) -> f32 {
        self.get().unwrap_or(f32::NAN)
    }
}
