// CLASSIFICATION: COMMUNITY
// Filename: memory.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! RAM-backed store modelling the on-chip EEPROM emulation: writes land in
//! a staging image and only reach the durable image on `commit`.

use log::{debug, warn};

use super::{check_range, ByteStore, StoreError, ERASED};

/// In-memory byte store with separate staged and durable images.
#[derive(Debug, Clone)]
pub struct MemStore {
    staged: Vec<u8>,
    durable: Vec<u8>,
    commits_left: Option<usize>,
    powered: bool,
}

impl MemStore {
    /// Create a store of `size` erased (`0xFF`) bytes.
    pub fn new(size: usize) -> Self {
        Self::from_image(vec![ERASED; size])
    }

    /// Create a store whose durable contents are `image`.
    pub fn from_image(image: Vec<u8>) -> Self {
        Self {
            staged: image.clone(),
            durable: image,
            commits_left: None,
            powered: true,
        }
    }

    /// Allow `n` more successful commits, then drop power. Every later
    /// write or commit fails with [`StoreError::PowerLoss`] until
    /// [`power_cycle`](Self::power_cycle).
    pub fn fail_after_commits(&mut self, n: usize) {
        self.commits_left = Some(n);
    }

    /// Simulate a restart: uncommitted writes are lost and power returns.
    pub fn power_cycle(&mut self) {
        if self.staged != self.durable {
            debug!("memstore: discarding uncommitted writes on power cycle");
        }
        self.staged.clone_from(&self.durable);
        self.commits_left = None;
        self.powered = true;
    }

    /// Contents that would survive a power cycle right now.
    pub fn durable_image(&self) -> &[u8] {
        &self.durable
    }

    fn ensure_powered(&self) -> Result<(), StoreError> {
        if self.powered {
            Ok(())
        } else {
            Err(StoreError::PowerLoss)
        }
    }
}

impl ByteStore for MemStore {
    fn len(&self) -> usize {
        self.staged.len()
    }

    fn read_bytes(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        check_range(addr, buf.len(), self.staged.len())?;
        buf.copy_from_slice(&self.staged[addr..addr + buf.len()]);
        Ok(())
    }

    fn write_bytes(&mut self, addr: usize, data: &[u8]) -> Result<(), StoreError> {
        self.ensure_powered()?;
        check_range(addr, data.len(), self.staged.len())?;
        self.staged[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_powered()?;
        if let Some(left) = self.commits_left.as_mut() {
            if *left == 0 {
                warn!("memstore: injected power loss at commit");
                self.powered = false;
                return Err(StoreError::PowerLoss);
            }
            *left -= 1;
        }
        self.durable.clone_from(&self.staged);
        Ok(())
    }
}
