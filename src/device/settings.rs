// CLASSIFICATION: COMMUNITY
// Filename: settings.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Single-field device settings stored below the tag region.
//!
//! | field              | addr | width |
//! |--------------------|------|-------|
//! | relay state        | 0    | 1     |
//! | operation method   | 1    | 1     |
//! | SSID               | 2    | 15+NUL|
//! | password           | 18   | 15+NUL|
//! | add master card    | 34   | 11    |
//! | remove master card | 45   | 11    |

use log::{debug, info};
use thiserror::Error;

use crate::registry::codec::{decode, encode, Slot, TAG_LEN};
use crate::registry::Layout;
use crate::store::{ByteStore, StoreError, ERASED};

pub const RELAY_STATE_ADDR: usize = 0;
pub const OP_METHOD_ADDR: usize = 1;
pub const SSID_ADDR: usize = 2;
pub const PASSWORD_ADDR: usize = 18;
pub const ADD_CARD_ADDR: usize = 34;
pub const REMOVE_CARD_ADDR: usize = 45;
pub const SSID_MAX_LEN: usize = 15;
pub const PASSWORD_MAX_LEN: usize = 15;

pub const DEFAULT_SSID: &str = "Smart-Elevator";
pub const DEFAULT_PASSWORD: &str = "Aa123123#";
pub const DEFAULT_ADD_CARD: &str = "21850107129";
pub const DEFAULT_REMOVE_CARD: &str = "00009870509";

/// Errors returned by [`Settings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("operation method must be 0 or 1, got {0}")]
    InvalidMethod(u8),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

type SettingsResult<T> = Result<T, SettingsError>;

/// Which master card a caller is addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MasterCard {
    Add,
    Remove,
}

impl MasterCard {
    fn addr(self) -> usize {
        match self {
            MasterCard::Add => ADD_CARD_ADDR,
            MasterCard::Remove => REMOVE_CARD_ADDR,
        }
    }
}

/// Borrowed view over the settings fields of a store.
pub struct Settings<'a, S> {
    store: &'a mut S,
    reserved: Layout,
}

impl<'a, S: ByteStore> Settings<'a, S> {
    /// `reserved` is the tag registry's layout; settings never write inside it.
    pub fn new(store: &'a mut S, reserved: Layout) -> Self {
        Self { store, reserved }
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> SettingsResult<()> {
        debug_assert!(
            (addr..addr + data.len()).all(|a| !self.reserved.owns(a)),
            "settings write at {:#x} inside tag region",
            addr
        );
        self.store.write_bytes(addr, data)?;
        self.store.commit()?;
        Ok(())
    }

    pub fn relay_state(&mut self) -> SettingsResult<bool> {
        Ok(self.store.read_byte(RELAY_STATE_ADDR)? == 1)
    }

    pub fn set_relay_state(&mut self, on: bool) -> SettingsResult<()> {
        self.write(RELAY_STATE_ADDR, &[u8::from(on)])
    }

    /// Stored operation method; anything other than 0 or 1 reads as 0.
    pub fn op_method(&mut self) -> SettingsResult<u8> {
        let method = self.store.read_byte(OP_METHOD_ADDR)?;
        Ok(if method <= 1 { method } else { 0 })
    }

    pub fn set_op_method(&mut self, method: u8) -> SettingsResult<()> {
        if method > 1 {
            return Err(SettingsError::InvalidMethod(method));
        }
        self.write(OP_METHOD_ADDR, &[method])?;
        info!("settings: operation method set to {}", method);
        Ok(())
    }

    pub fn ssid(&mut self) -> SettingsResult<String> {
        self.read_string(SSID_ADDR, SSID_MAX_LEN)
    }

    pub fn set_ssid(&mut self, ssid: &str) -> SettingsResult<()> {
        if ssid.is_empty() {
            return Err(SettingsError::Empty("ssid"));
        }
        self.write_string(SSID_ADDR, ssid, SSID_MAX_LEN)?;
        info!("settings: ssid set to {:?}", ssid);
        Ok(())
    }

    pub fn password(&mut self) -> SettingsResult<String> {
        self.read_string(PASSWORD_ADDR, PASSWORD_MAX_LEN)
    }

    pub fn set_password(&mut self, password: &str) -> SettingsResult<()> {
        if password.is_empty() {
            return Err(SettingsError::Empty("password"));
        }
        self.write_string(PASSWORD_ADDR, password, PASSWORD_MAX_LEN)?;
        info!("settings: password updated");
        Ok(())
    }

    /// Write the fallback access-point credentials if either stored value
    /// is missing. Returns `true` when the fallback was written.
    pub fn ensure_network(&mut self, ssid: &str, password: &str) -> SettingsResult<bool> {
        if !self.ssid()?.is_empty() && !self.password()?.is_empty() {
            return Ok(false);
        }
        info!("settings: ssid or password unset, storing fallback AP credentials");
        self.set_ssid(ssid)?;
        self.set_password(password)?;
        Ok(true)
    }

    /// Canonical form of a master card.
    pub fn card(&mut self, which: MasterCard) -> SettingsResult<String> {
        let mut slot: Slot = [0u8; TAG_LEN];
        self.store.read_bytes(which.addr(), &mut slot)?;
        Ok(decode(&slot))
    }

    /// Store a master card. `tag` must already be validated.
    pub fn set_card(&mut self, which: MasterCard, tag: &str) -> SettingsResult<()> {
        let slot = encode(tag);
        self.write(which.addr(), &slot)?;
        info!("settings: {:?} card set to {}", which, decode(&slot));
        Ok(())
    }

    /// Defaults for every settings field. The tag region is reset by the
    /// caller through the registry.
    pub fn restore_defaults(&mut self) -> SettingsResult<()> {
        self.set_relay_state(false)?;
        self.set_ssid(DEFAULT_SSID)?;
        self.set_password(DEFAULT_PASSWORD)?;
        self.set_card(MasterCard::Add, DEFAULT_ADD_CARD)?;
        self.set_card(MasterCard::Remove, DEFAULT_REMOVE_CARD)?;
        self.set_op_method(0)?;
        Ok(())
    }

    /// NUL-terminated string of at most `max_len` bytes. An erased cell also
    /// ends the string, so a blank part reads as empty.
    fn read_string(&mut self, addr: usize, max_len: usize) -> SettingsResult<String> {
        let mut buf = vec![0u8; max_len];
        self.store.read_bytes(addr, &mut buf)?;
        let end = buf
            .iter()
            .position(|&b| b == 0 || b == ERASED)
            .unwrap_or(max_len);
        Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
    }

    /// Store `data` truncated to `max_len` bytes plus a NUL terminator.
    fn write_string(&mut self, addr: usize, data: &str, max_len: usize) -> SettingsResult<()> {
        let mut end = data.len().min(max_len);
        while !data.is_char_boundary(end) {
            end -= 1;
        }
        if end < data.len() {
            debug!("settings: truncating {:?} to {} bytes", data, end);
        }
        let mut bytes = Vec::with_capacity(end + 1);
        bytes.extend_from_slice(&data.as_bytes()[..end]);
        bytes.push(0);
        self.write(addr, &bytes)
    }
}
