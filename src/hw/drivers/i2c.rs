// CLASSIFICATION: COMMUNITY
// Filename: i2c.rs v1.2
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! I²C bus abstraction used by the external EEPROM back-end.
//! Board support code implements [`I2CDevice`] for the real peripheral; the
//! store layer only ever talks to the trait.

/// Represents errors that can occur during I2C operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2CError {
    BusError,
    ArbitrationLost,
    NACKReceived,
    Timeout,
    InvalidAddress,
    Unknown,
}

/// Trait defining basic I2C operations.
pub trait I2CDevice {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2CError>;
    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), I2CError>;
    fn write_read(&mut self, address: u8, data: &[u8], buffer: &mut [u8]) -> Result<(), I2CError>;
}

impl<T: I2CDevice + ?Sized> I2CDevice for &mut T {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2CError> {
        (**self).write(address, data)
    }

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), I2CError> {
        (**self).read(address, buffer)
    }

    fn write_read(&mut self, address: u8, data: &[u8], buffer: &mut [u8]) -> Result<(), I2CError> {
        (**self).write_read(address, data, buffer)
    }
}
