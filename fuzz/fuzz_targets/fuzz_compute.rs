//! Fuzz target: `calibration::compute`
//!
//! Feeds arbitrary voltages, temperatures and calibration pairs into the
//! converter.  It must never panic, and whenever it returns a pH that pH
//! is finite.
//!
//! cargo fuzz run fuzz_compute

#![no_main]

use libfuzzer_sys::fuzz_target;
use phprobe::calibration::{BufferPoint, CalibrationPoint, compute};

fn f32_at(data: &[u8], index: usize) -> f32 {
    let mut bytes = [0u8; 4];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = data.get(index * 4 + i).copied().unwrap_or(0);
    }
    f32::from_le_bytes(bytes)
}

fuzz_target!(|data: &[u8]| {
    let neutral = CalibrationPoint {
        voltage_mv: f32_at(data, 0),
        ..CalibrationPoint::factory(BufferPoint::Neutral)
    };
    let acid = CalibrationPoint {
        voltage_mv: f32_at(data, 1),
        ..CalibrationPoint::factory(BufferPoint::Acid)
    };

    if let Ok(ph) = compute(f32_at(data, 2), f32_at(data, 3), &neutral, &acid) {
        assert!(ph.is_finite(), "compute returned {}", ph);
    }
});
