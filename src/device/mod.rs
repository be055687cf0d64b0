// CLASSIFICATION: COMMUNITY
// Filename: mod.rs · device v0.4
// Author: Lukas Bower
// Date Modified: 2026-10-19
//
// ─────────────────────────────────────────────────────────────
// tagrelay · Access Controller Device
//
// Ties the tag registry, the settings fields, the relay and the
// clock to one byte store. The device is owned by exactly one
// caller (the control server loop); share it across threads only
// through [`SharedDevice`].
//
// Boot sequence:
//   1. open the registry at its layout
//   2. factory-reset a blank part (count never written)
//   3. finish any delete interrupted by power loss
//   4. store fallback AP credentials if unset
//   5. restore the persisted relay state
// ─────────────────────────────────────────────────────────────

pub mod clock;
pub mod relay;
pub mod settings;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{error, info, warn};
use thiserror::Error;

use crate::hw::drivers::relay::RelayPin;
use crate::registry::{Layout, RegistryError, RepairOutcome, TagRegistry};
use crate::store::ByteStore;
use clock::{ClockError, Rtc, TimeFields};
use relay::Relay;
use settings::{Settings, SettingsError};

/// Firmware version reported on the status endpoint.
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Relay hold after an authorized tag is presented.
pub const DEFAULT_PULSE: Duration = Duration::from_secs(5);
/// Longest relay pulse accepted from any caller.
pub const MAX_PULSE: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Clock(#[from] ClockError),
    #[error("relay pulse duration must be between 1 s and {} s", MAX_PULSE.as_secs())]
    InvalidDuration,
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Boot-time parameters.
#[derive(Debug, Clone)]
pub struct BootOptions {
    pub layout: Layout,
    pub ap_ssid: String,
    pub ap_password: String,
    pub pulse: Duration,
}

impl Default for BootOptions {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            ap_ssid: settings::DEFAULT_SSID.to_owned(),
            ap_password: settings::DEFAULT_PASSWORD.to_owned(),
            pulse: DEFAULT_PULSE,
        }
    }
}

/// One access controller.
pub struct Device<S, P, C> {
    registry: TagRegistry<S>,
    relay: Relay<P>,
    clock: C,
    pulse: Duration,
    booted_at: Instant,
}

/// Device guarded for callers on more than one thread. Hold the lock only
/// for a single operation; relay pulses never need it held.
pub type SharedDevice<S, P, C> = Arc<Mutex<Device<S, P, C>>>;

impl<S: ByteStore, P: RelayPin, C: Rtc> Device<S, P, C> {
    pub fn boot(store: S, pin: P, clock: C, opts: &BootOptions) -> DeviceResult<Self> {
        let registry = TagRegistry::with_layout(store, opts.layout)?;
        let mut device = Self {
            registry,
            relay: Relay::new(pin),
            clock,
            pulse: opts.pulse,
            booted_at: Instant::now(),
        };

        match device.registry.count() {
            Ok(count) => info!("device: {} tags registered", count),
            Err(RegistryError::CountOutOfRange { count, .. }) => {
                warn!("device: tag count {:#x} unreadable, treating part as blank", count);
                device.factory_reset()?;
            }
            Err(e) => return Err(e.into()),
        }
        match device.registry.repair() {
            Ok(RepairOutcome::Clean) => {}
            Ok(RepairOutcome::Compacted { removed }) => {
                warn!("device: recovered interrupted delete at slot {}", removed);
            }
            // list() skips erased slots and lookups still answer, so keep
            // serving what is readable
            Err(e @ (RegistryError::ErasedSlot { .. } | RegistryError::DuplicateSlots { .. })) => {
                error!("device: tag region damaged, serving it as-is: {}", e);
            }
            Err(e) => return Err(e.into()),
        }
        device
            .settings()
            .ensure_network(&opts.ap_ssid, &opts.ap_password)?;
        let on = device.settings().relay_state()?;
        device.relay.switch(on);
        info!("device: booted, relay {}", if on { "on" } else { "off" });
        Ok(device)
    }

    pub fn registry(&mut self) -> &mut TagRegistry<S> {
        &mut self.registry
    }

    /// Power the device down, handing back its store.
    pub fn into_store(self) -> S {
        self.registry.into_store()
    }

    pub fn settings(&mut self) -> Settings<'_, S> {
        let layout = *self.registry.layout();
        Settings::new(self.registry.store_mut(), layout)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn time(&self) -> TimeFields {
        self.clock.now().into()
    }

    pub fn set_time(&mut self, fields: TimeFields) -> DeviceResult<()> {
        let to = fields.to_naive()?;
        self.clock.adjust(to);
        Ok(())
    }

    pub fn uptime(&self) -> Duration {
        self.booted_at.elapsed()
    }

    pub fn relay_on(&self) -> bool {
        self.relay.is_on()
    }

    /// Latch the relay and persist the new state.
    pub fn set_relay(&mut self, on: bool) -> DeviceResult<()> {
        self.relay.switch(on);
        self.settings().set_relay_state(on)?;
        Ok(())
    }

    /// Switch the relay on for `hold`; [`tick`](Self::tick) releases it.
    pub fn pulse_relay(&mut self, hold: Duration, now: Instant) -> DeviceResult<()> {
        if hold.is_zero() || hold > MAX_PULSE || !self.relay.pulse(hold, now) {
            return Err(DeviceError::InvalidDuration);
        }
        self.settings().set_relay_state(true)?;
        Ok(())
    }

    /// Present a tag at the reader. An authorized tag pulses the relay for
    /// the configured hold. `tag` must already be validated.
    pub fn use_tag(&mut self, tag: &str, now: Instant) -> DeviceResult<bool> {
        let found = self.registry.contains(tag)?;
        if found {
            info!("device: tag {} authorized", tag);
            let hold = self.pulse;
            self.pulse_relay(hold, now)?;
        } else {
            info!("device: tag {} rejected", tag);
        }
        Ok(found)
    }

    /// Housekeeping between requests: release an expired relay pulse.
    pub fn tick(&mut self, now: Instant) -> DeviceResult<()> {
        if self.relay.poll(now) {
            self.settings().set_relay_state(false)?;
        }
        Ok(())
    }

    /// Earliest instant [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.relay.pending_release()
    }

    /// Clear the tag registry and restore every setting to its default.
    pub fn factory_reset(&mut self) -> DeviceResult<()> {
        info!("device: factory reset");
        self.registry.clear_all()?;
        self.settings().restore_defaults()?;
        self.relay.switch(false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::drivers::relay::HostPin;
    use crate::store::MemStore;
    use clock::SystemRtc;

    fn blank() -> MemStore {
        MemStore::new(Layout::default().end())
    }

    #[test]
    fn blank_part_boots_with_defaults() {
        let mut device =
            Device::boot(blank(), HostPin::new(16), SystemRtc::default(), &BootOptions::default())
                .unwrap();
        assert_eq!(device.registry().count().unwrap(), 0);
        assert_eq!(device.settings().ssid().unwrap(), settings::DEFAULT_SSID);
        assert!(!device.relay_on());
    }

    #[test]
    fn relay_state_survives_reboot() {
        let opts = BootOptions::default();
        let mut device =
            Device::boot(blank(), HostPin::new(16), SystemRtc::default(), &opts).unwrap();
        device.set_relay(true).unwrap();
        let store = device.into_store();
        let device = Device::boot(store, HostPin::new(16), SystemRtc::default(), &opts).unwrap();
        assert!(device.relay_on());
    }

    #[test]
    fn authorized_tag_pulses_relay() {
        let gpio = HostPin::new(16);
        let mut device =
            Device::boot(blank(), gpio.clone(), SystemRtc::default(), &BootOptions::default())
                .unwrap();
        device.registry().insert("123").unwrap();
        let t0 = Instant::now();
        assert!(!device.use_tag("999", t0).unwrap());
        assert!(!gpio.level());
        assert!(device.use_tag("123", t0).unwrap());
        assert!(gpio.level());
        assert_eq!(device.next_deadline(), Some(t0 + DEFAULT_PULSE));
        // registry stays usable while the relay is held
        device.registry().insert("456").unwrap();
        device.tick(t0 + DEFAULT_PULSE).unwrap();
        assert!(!gpio.level());
        assert!(!device.settings().relay_state().unwrap());
    }

    #[test]
    fn zero_pulse_rejected() {
        let mut device =
            Device::boot(blank(), HostPin::new(16), SystemRtc::default(), &BootOptions::default())
                .unwrap();
        assert!(matches!(
            device.pulse_relay(Duration::ZERO, Instant::now()),
            Err(DeviceError::InvalidDuration)
        ));
        for hold in [MAX_PULSE + Duration::from_secs(1), Duration::MAX] {
            assert!(matches!(
                device.pulse_relay(hold, Instant::now()),
                Err(DeviceError::InvalidDuration)
            ));
        }
        assert!(!device.relay_on());
    }

    #[test]
    fn damaged_tag_region_still_boots() {
        let mut reg = TagRegistry::new(blank()).unwrap();
        reg.clear_all().unwrap();
        reg.insert("1").unwrap();
        reg.insert("2").unwrap();
        let addr = reg.layout().slot_addr(0);
        reg.store_mut().write_byte(addr, crate::store::ERASED).unwrap();
        reg.store_mut().commit().unwrap();

        let mut device = Device::boot(
            reg.into_store(),
            HostPin::new(16),
            SystemRtc::default(),
            &BootOptions::default(),
        )
        .unwrap();
        assert_eq!(device.registry().list().unwrap(), vec!["2"]);
        assert!(device.registry().contains("2").unwrap());
        assert_eq!(device.registry().count().unwrap(), 2);
    }

    #[test]
    fn shared_device_serializes_callers() {
        use std::thread;

        let gpio = HostPin::new(16);
        let mut device =
            Device::boot(blank(), gpio.clone(), SystemRtc::default(), &BootOptions::default())
                .unwrap();
        for n in 1..=40u32 {
            device.registry().insert(&n.to_string()).unwrap();
        }
        let shared: SharedDevice<MemStore, HostPin, SystemRtc> = Arc::new(Mutex::new(device));

        let deleter = {
            let shared = shared.clone();
            thread::spawn(move || {
                for n in (1..=40u32).filter(|n| n % 2 == 1) {
                    shared.lock().unwrap().registry().delete(&n.to_string()).unwrap();
                }
            })
        };
        let reader = {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let found = shared.lock().unwrap().use_tag("2", Instant::now()).unwrap();
                    assert!(found);
                }
            })
        };
        deleter.join().unwrap();
        reader.join().unwrap();

        let mut device = shared.lock().unwrap();
        let evens: Vec<String> = (1..=40u32)
            .filter(|n| n % 2 == 0)
            .map(|n| n.to_string())
            .collect();
        assert_eq!(device.registry().list().unwrap(), evens);
        assert_eq!(device.registry().verify().unwrap(), 20);
        assert!(gpio.level());
    }

    #[test]
    fn factory_reset_clears_tags() {
        let mut device =
            Device::boot(blank(), HostPin::new(16), SystemRtc::default(), &BootOptions::default())
                .unwrap();
        device.registry().insert("1").unwrap();
        device.settings().set_ssid("lab").unwrap();
        device.factory_reset().unwrap();
        assert!(device.registry().list().unwrap().is_empty());
        assert_eq!(device.settings().ssid().unwrap(), settings::DEFAULT_SSID);
    }
}
