// CLASSIFICATION: COMMUNITY
// Filename: test_i2c_eeprom.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use tagrelay::hw::drivers::delay::NoDelay;
use tagrelay::hw::drivers::i2c::{I2CDevice, I2CError};
use tagrelay::registry::{Layout, TagRegistry};
use tagrelay::store::{
    ByteStore, I2cEeprom, StoreError, CAPACITY_24C256, EEPROM_I2C_ADDR, PAGE_SIZE, WRITE_CYCLE_MS,
};

/// Bus model of a single 24C256: two address bytes, then data. Writes wrap
/// inside the current page like the real part.
struct SimEeprom {
    mem: Vec<u8>,
    pointer: usize,
    page_writes: usize,
}

impl SimEeprom {
    fn new() -> Self {
        Self {
            mem: vec![0xFF; CAPACITY_24C256],
            pointer: 0,
            page_writes: 0,
        }
    }
}

impl I2CDevice for SimEeprom {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), I2CError> {
        if address != EEPROM_I2C_ADDR {
            return Err(I2CError::NACKReceived);
        }
        if data.len() < 2 {
            return Err(I2CError::BusError);
        }
        let start = (usize::from(data[0]) << 8 | usize::from(data[1])) % self.mem.len();
        let page = start - start % PAGE_SIZE;
        for (i, byte) in data[2..].iter().enumerate() {
            let at = page + (start % PAGE_SIZE + i) % PAGE_SIZE;
            self.mem[at] = *byte;
        }
        if data.len() > 2 {
            self.page_writes += 1;
        }
        self.pointer = start;
        Ok(())
    }

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), I2CError> {
        if address != EEPROM_I2C_ADDR {
            return Err(I2CError::NACKReceived);
        }
        for byte in buffer.iter_mut() {
            *byte = self.mem[self.pointer];
            self.pointer = (self.pointer + 1) % self.mem.len();
        }
        Ok(())
    }

    fn write_read(&mut self, address: u8, data: &[u8], buffer: &mut [u8]) -> Result<(), I2CError> {
        self.write(address, data)?;
        self.read(address, buffer)
    }
}

#[test]
fn writes_split_at_page_boundaries() {
    let mut bus = SimEeprom::new();
    let mut delay = NoDelay::default();
    {
        let mut eeprom = I2cEeprom::new(&mut bus, &mut delay);
        let data: Vec<u8> = (0..100).collect();
        eeprom.write_bytes(60, &data).unwrap();
        eeprom.commit().unwrap();
        let mut back = vec![0u8; 100];
        eeprom.read_bytes(60, &mut back).unwrap();
        assert_eq!(back, data);
    }
    // 60..64, 64..128, 128..160
    assert_eq!(bus.page_writes, 3);
    assert_eq!(delay.total_ms, 3 * u64::from(WRITE_CYCLE_MS));
    assert_eq!(bus.mem[0..60], [0xFF; 60]);
}

#[test]
fn bounds_and_bus_errors_surface() {
    let mut eeprom = I2cEeprom::with_geometry(SimEeprom::new(), NoDelay::default(), 0x51, 1024);
    assert!(matches!(
        eeprom.write_byte(0, 1),
        Err(StoreError::Bus(I2CError::NACKReceived))
    ));
    assert!(matches!(
        eeprom.read_byte(1024),
        Err(StoreError::OutOfBounds { addr: 1024, .. })
    ));
}

#[test]
fn registry_over_external_eeprom() {
    let _ = env_logger::builder().is_test(true).try_init();
    let eeprom = I2cEeprom::new(SimEeprom::new(), NoDelay::default());
    let mut reg = TagRegistry::with_layout(eeprom, Layout::default()).unwrap();
    reg.clear_all().unwrap();
    for tag in ["100", "200", "300", "400", "500", "600"] {
        reg.insert(tag).unwrap();
    }
    reg.delete("200").unwrap();
    assert_eq!(reg.list().unwrap(), vec!["100", "300", "400", "500", "600"]);
    let (bus, _) = reg.into_store().release();
    // slot 1 starts at 75 and straddles no page; count is little-endian at 60
    assert_eq!(&bus.mem[60..64], &5u32.to_le_bytes());
    assert_eq!(&bus.mem[75..86], b"00000000300");
}
