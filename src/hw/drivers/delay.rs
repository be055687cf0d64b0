// CLASSIFICATION: COMMUNITY
// Filename: delay.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Blocking millisecond delays for peripherals with a completion time.

use std::thread;
use std::time::Duration;

/// Busy or sleeping wait, in milliseconds.
pub trait DelayMs {
    fn delay_ms(&mut self, ms: u32);
}

impl<D: DelayMs + ?Sized> DelayMs for &mut D {
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

/// Delay backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDelay;

impl DelayMs for StdDelay {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Delay that returns immediately and records the requested total.
/// Used by tests and simulators where wall-clock waits add nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelay {
    pub total_ms: u64,
}

impl DelayMs for NoDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
    }
}
