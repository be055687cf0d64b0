// CLASSIFICATION: COMMUNITY
// Filename: mod.rs · store v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-19
//
// ─────────────────────────────────────────────────────────────
// tagrelay · Non-volatile Byte Store
//
// Every persistent byte the controller owns lives behind the
// [`ByteStore`] trait. Three back-ends are provided:
//
//   • [`MemStore`]  – RAM image with staged writes (on-chip EEPROM
//                     emulation, also used for power-loss tests)
//   • [`FileStore`] – host image file for the daemon
//   • [`I2cEeprom`] – external 24C256-class part on an I²C bus
//
// Writes are not durable until [`ByteStore::commit`] returns.
// ─────────────────────────────────────────────────────────────

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod file;
mod i2c_eeprom;
mod memory;

pub use file::FileStore;
pub use i2c_eeprom::{I2cEeprom, CAPACITY_24C256, EEPROM_I2C_ADDR, PAGE_SIZE, WRITE_CYCLE_MS};
pub use memory::MemStore;

use thiserror::Error;

use crate::hw::drivers::i2c::I2CError;

/// Value held by a cell that has never been written.
pub const ERASED: u8 = 0xFF;

/// Errors surfaced by [`ByteStore`] back-ends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Access beyond the end of the medium.
    #[error("address range {addr:#06x}+{len} exceeds store size {size}")]
    OutOfBounds {
        /// First address of the access.
        addr: usize,
        /// Number of bytes requested.
        len: usize,
        /// Total size of the medium.
        size: usize,
    },
    /// The medium lost power before the write became durable.
    #[error("power lost before commit")]
    PowerLoss,
    /// Bus transaction failed.
    #[error("i2c transfer failed: {0:?}")]
    Bus(I2CError),
    /// Host image file could not be read or written.
    #[error("image file error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<I2CError> for StoreError {
    fn from(err: I2CError) -> Self {
        StoreError::Bus(err)
    }
}

/// Byte-addressable non-volatile medium.
///
/// Only `len`, the two bulk transfers and `commit` are required; the
/// single-byte accessors are provided in terms of them.
pub trait ByteStore {
    /// Total addressable size in bytes.
    fn len(&self) -> usize;

    /// Fill `buf` with the bytes starting at `addr`.
    fn read_bytes(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StoreError>;

    /// Write `data` starting at `addr`. Not durable until [`commit`](Self::commit).
    fn write_bytes(&mut self, addr: usize, data: &[u8]) -> Result<(), StoreError>;

    /// Make every preceding write survive a power cycle.
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Read one byte.
    fn read_byte(&mut self, addr: usize) -> Result<u8, StoreError> {
        let mut buf = [0u8; 1];
        self.read_bytes(addr, &mut buf)?;
        Ok(buf[0])
    }

    /// Write one byte.
    fn write_byte(&mut self, addr: usize, value: u8) -> Result<(), StoreError> {
        self.write_bytes(addr, &[value])
    }

    /// Read a little-endian `u32`.
    fn read_u32(&mut self, addr: usize) -> Result<u32, StoreError> {
        let mut buf = [0u8; 4];
        self.read_bytes(addr, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Write a little-endian `u32`.
    fn write_u32(&mut self, addr: usize, value: u32) -> Result<(), StoreError> {
        self.write_bytes(addr, &value.to_le_bytes())
    }

    /// `true` when the medium has no addressable bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: ByteStore + ?Sized> ByteStore for &mut S {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn read_bytes(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        (**self).read_bytes(addr, buf)
    }

    fn write_bytes(&mut self, addr: usize, data: &[u8]) -> Result<(), StoreError> {
        (**self).write_bytes(addr, data)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }
}

impl<S: ByteStore + ?Sized> ByteStore for Box<S> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn read_bytes(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        (**self).read_bytes(addr, buf)
    }

    fn write_bytes(&mut self, addr: usize, data: &[u8]) -> Result<(), StoreError> {
        (**self).write_bytes(addr, data)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }
}

/// Reject accesses that fall outside a medium of `size` bytes.
pub(crate) fn check_range(addr: usize, len: usize, size: usize) -> Result<(), StoreError> {
    match addr.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(StoreError::OutOfBounds { addr, len, size }),
    }
}
