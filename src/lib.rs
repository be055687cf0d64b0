// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v2.0
// Date Modified: 2026-10-19
// Author: Lukas Bower

//! Tag registry and relay controller.
//!
//! A fixed-capacity list of 11-digit access tags kept in byte-addressable
//! non-volatile storage, plus the device around it: settings, relay,
//! clock and a JSON control server.

/// Non-volatile byte stores (RAM image, host file, I²C EEPROM).
pub mod store;

/// Hardware driver traits: I²C bus, delays, relay output.
pub mod hw;

/// Fixed-slot tag registry.
pub mod registry;

/// Access controller: settings, relay, clock.
pub mod device;

/// JSON control server
pub mod http;

/// Daemon configuration.
pub mod config;
