// CLASSIFICATION: COMMUNITY
// Filename: file.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Host image file standing in for the EEPROM when the controller runs as a
//! daemon. The whole image is staged in memory; `commit` replaces the file
//! atomically.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tempfile::NamedTempFile;

use super::{check_range, ByteStore, StoreError, ERASED};

/// File-backed byte store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    image: Vec<u8>,
    dirty: bool,
}

impl FileStore {
    /// Open `path`, creating an erased image of `size` bytes if it does not
    /// exist. An existing shorter image is extended with erased cells; a
    /// longer one is truncated to `size`.
    pub fn open(path: impl AsRef<Path>, size: usize) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut image = match fs::read(&path) {
            Ok(bytes) => {
                debug!("filestore: loaded {} bytes from {:?}", bytes.len(), path);
                bytes
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("filestore: creating erased image {:?} ({} bytes)", path, size);
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        let resized = image.len() != size;
        image.resize(size, ERASED);
        let mut store = Self {
            path,
            image,
            dirty: resized,
        };
        store.commit()?;
        Ok(store)
    }

    /// Location of the backing image.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteStore for FileStore {
    fn len(&self) -> usize {
        self.image.len()
    }

    fn read_bytes(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StoreError> {
        check_range(addr, buf.len(), self.image.len())?;
        buf.copy_from_slice(&self.image[addr..addr + buf.len()]);
        Ok(())
    }

    fn write_bytes(&mut self, addr: usize, data: &[u8]) -> Result<(), StoreError> {
        check_range(addr, data.len(), self.image.len())?;
        self.image[addr..addr + data.len()].copy_from_slice(data);
        self.dirty = true;
        Ok(())
    }

    /// Write the whole image to a sibling temp file, sync it, then rename it
    /// over the image. A crash at any point leaves either the old or the
    /// new image on disk, never a truncated one.
    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let mut staged = NamedTempFile::new_in(&dir)?;
        staged.write_all(&self.image)?;
        staged.as_file().sync_all()?;
        staged.persist(&self.path).map_err(|e| e.error)?;
        debug!("filestore: committed {} bytes to {:?}", self.image.len(), self.path);
        self.dirty = false;
        Ok(())
    }
}
