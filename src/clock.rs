use std::cell::Cell;
use std::rc::Rc;

use chrono::Utc;

/// Millisecond wall-clock source used by the limiter, the bot detector and
/// the footer year.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Reads the system clock through chrono (works on wasm via `Date.now`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Hand-driven clock. Clones share the same instant, so a test can keep one
/// handle and advance time under a controller that owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        ManualClock {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
