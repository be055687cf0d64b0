// CLASSIFICATION: COMMUNITY
// Filename: relay.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! GPIO output driving the relay coil.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

/// Single digital output.
pub trait RelayPin {
    /// Drive the pin high (`true`) or low.
    fn set_level(&mut self, high: bool);
    /// Current output level.
    fn level(&self) -> bool;
}

/// Host stand-in that logs level changes. Clones share the same level so a
/// test can keep a handle while the device owns the pin.
#[derive(Debug, Clone, Default)]
pub struct HostPin {
    pin: u8,
    high: Arc<AtomicBool>,
}

impl HostPin {
    pub fn new(pin: u8) -> Self {
        Self {
            pin,
            high: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl RelayPin for HostPin {
    fn set_level(&mut self, high: bool) {
        let prev = self.high.swap(high, Ordering::SeqCst);
        if prev != high {
            info!("gpio{}: {}", self.pin, if high { "HIGH" } else { "LOW" });
        }
    }

    fn level(&self) -> bool {
        self.high.load(Ordering::SeqCst)
    }
}
