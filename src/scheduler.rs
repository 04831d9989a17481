//! Measurement cadence.
//!
//! The main loop sleeps in short slices and feeds the elapsed time into a
//! [`PollTimer`]; the timer decides when the next measurement tick is due.
//!
//! ```text
//!   loop ──▶ advance(elapsed) ──▶ due? ──▶ PhProbeService.tick()
//!     ▲                              │
//!     └────── sleep(until_next) ◀────┘
//! ```

use log::debug;

// ═══════════════════════════════════════════════════════════════
//  Poll timer
// ═══════════════════════════════════════════════════════════════

/// Fixed-interval timer driven by elapsed wall time.
///
/// Ticks that were missed while the loop was busy are coalesced into one:
/// a late loop takes a single fresh reading rather than a burst.
#[derive(Debug, Clone)]
pub struct PollTimer {
    interval_ms: u32,
    elapsed_ms: u32,
}

impl PollTimer {
    /// A timer that is due immediately on the first `advance`.
    pub fn new(interval_ms: u32) -> Self {
        let interval_ms = interval_ms.max(1);
        Self {
            interval_ms,
            elapsed_ms: interval_ms,
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Account for `elapsed_ms` of wall time.  Returns `true` when a tick is due.
    pub fn advance(&mut self, elapsed_ms: u32) -> bool {
        self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
        if self.elapsed_ms < self.interval_ms {
            return false;
        }
        let missed = self.elapsed_ms / self.interval_ms - 1;
        if missed > 0 {
            debug!("PollTimer: coalesced {} missed tick(s)", missed);
        }
        self.elapsed_ms %= self.interval_ms;
        true
    }

    /// Milliseconds until the next tick is due.
    pub fn until_next_ms(&self) -> u32 {
        self.interval_ms.saturating_sub(self.elapsed_ms)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
