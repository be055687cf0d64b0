// CLASSIFICATION: COMMUNITY
// Filename: relay.rs · device v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Relay output with a non-blocking pulse timer.
//!
//! A pulse switches the relay on and records a deadline; the server loop
//! calls [`Relay::poll`] between requests to release it. Nothing here
//! sleeps, so a held relay never stalls a registry call.

use std::time::{Duration, Instant};

use log::{info, warn};

use crate::hw::drivers::relay::RelayPin;

/// Relay output plus an optional release deadline.
pub struct Relay<P> {
    pin: P,
    release_at: Option<Instant>,
}

impl<P: RelayPin> Relay<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            release_at: None,
        }
    }

    pub fn is_on(&self) -> bool {
        self.pin.level()
    }

    /// Latch the relay. Cancels any pending pulse.
    pub fn switch(&mut self, on: bool) {
        self.release_at = None;
        self.pin.set_level(on);
    }

    /// Switch on until `now + hold`. A new pulse replaces the old deadline.
    /// Returns `false`, leaving the relay untouched, when the deadline is not
    /// representable.
    pub fn pulse(&mut self, hold: Duration, now: Instant) -> bool {
        let Some(deadline) = now.checked_add(hold) else {
            warn!("relay: pulse of {:?} overflows the clock", hold);
            return false;
        };
        self.pin.set_level(true);
        self.release_at = Some(deadline);
        info!("relay: pulse for {:?}", hold);
        true
    }

    /// Deadline of the pending pulse, if any.
    pub fn pending_release(&self) -> Option<Instant> {
        self.release_at
    }

    /// Release an expired pulse. Returns `true` when the relay was switched
    /// off by this call.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.release_at {
            Some(deadline) if now >= deadline => {
                self.release_at = None;
                self.pin.set_level(false);
                info!("relay: pulse released");
                true
            }
            _ => false,
        }
    }
}
