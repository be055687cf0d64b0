// CLASSIFICATION: COMMUNITY
// Filename: i2c_eeprom.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! External 24C256-class EEPROM on an I²C bus.
//!
//! Every transaction starts with a 16-bit big-endian word address. Writes
//! are split at page boundaries because the part wraps inside a page, and
//! each page write is followed by the write-cycle delay. Once that delay
//! has elapsed the bytes are durable, so [`ByteStore::commit`] has nothing
//! left to do.

use log::trace;

use super::{check_range, ByteStore, StoreError};
use crate::hw::drivers::delay::DelayMs;
use crate::hw::drivers::i2c::I2CDevice;

/// Default 7-bit bus address of the part (A0..A2 tied low).
pub const EEPROM_I2C_ADDR: u8 = 0x50;
/// Page size of the 24C256.
pub const PAGE_SIZE: usize = 64;
/// Worst-case internal write cycle.
pub const WRITE_CYCLE_MS: u32 = 5;
/// Usable capacity of a 24C256.
pub const CAPACITY_24C256: usize = 32 * 1024;

/// [`ByteStore`] over an external EEPROM.
pub struct I2cEeprom<B, D> {
    bus: B,
    delay: D,
    address: u8,
    size: usize,
}

impl<B: I2CDevice, D: DelayMs> I2cEeprom<B, D> {
    /// Wrap a 24C256 at the default bus address.
    pub fn new(bus: B, delay: D) -> Self {
        Self::with_geometry(bus, delay, EEPROM_I2C_ADDR, CAPACITY_24C256)
    }

    /// Wrap a part with an explicit bus address and capacity.
    pub fn with_geometry(bus: B, delay: D, address: u8, size: usize) -> Self {
        Self {
            bus,
            delay,
            address,
            size,
        }
    }

    /// Give back the bus and delay provider.
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    fn word_address(addr: usize) -> [u8; 2] {
        [(addr >> 8) as u8, (addr & 0xFF) as u8]
    }
}

impl<B: I2CDevice, D: DelayMs> ByteStore for I2cEeprom<B, D> {
    fn len(&self) -> usize {
        self.size
    }

    fn read_bytes(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        check_range(addr, buf.len(), self.size)?;
        if buf.is_empty() {
            return Ok(());
        }
        self.bus
            .write_read(self.address, &Self::word_address(addr), buf)?;
        Ok(())
    }

    fn write_bytes(&mut self, addr: usize, data: &[u8]) -> Result<(), StoreError> {
        check_range(addr, data.len(), self.size)?;
        let mut offset = 0;
        while offset < data.len() {
            let at = addr + offset;
            let room = PAGE_SIZE - at % PAGE_SIZE;
            let chunk = room.min(data.len() - offset);
            let mut frame = Vec::with_capacity(2 + chunk);
            frame.extend_from_slice(&Self::word_address(at));
            frame.extend_from_slice(&data[offset..offset + chunk]);
            self.bus.write(self.address, &frame)?;
            self.delay.delay_ms(WRITE_CYCLE_MS);
            trace!("eeprom: page write {:#06x}+{}", at, chunk);
            offset += chunk;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
