// CLASSIFICATION: COMMUNITY
// Filename: mod.rs · hw v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Hardware abstraction: bus, delay and GPIO traits the firmware is written
//! against, plus host stand-ins.

pub mod drivers;
