// CLASSIFICATION: COMMUNITY
// Filename: mod.rs · hw drivers v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Peripheral driver traits.

pub mod delay;
pub mod i2c;
pub mod relay;
