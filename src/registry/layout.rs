// CLASSIFICATION: COMMUNITY
// Filename: layout.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Address arithmetic for the tag region: one little-endian `u32` count
//! followed by `max_tags` slots of [`TAG_LEN`] bytes.

use super::codec::TAG_LEN;

/// Address of the 4-byte tag count on deployed units.
pub const COUNT_ADDR: usize = 60;
/// First slot address on deployed units.
pub const SLOTS_BASE_ADDR: usize = 64;
/// Slot capacity on deployed units.
pub const MAX_TAGS: u32 = 300;
/// Width of the count field.
pub const COUNT_LEN: usize = 4;

/// Placement of the registry inside a byte store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub count_addr: usize,
    pub slots_base: usize,
    pub max_tags: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(COUNT_ADDR, SLOTS_BASE_ADDR, MAX_TAGS)
    }
}

impl Layout {
    pub const fn new(count_addr: usize, slots_base: usize, max_tags: u32) -> Self {
        Self {
            count_addr,
            slots_base,
            max_tags,
        }
    }

    /// Deployed addresses with a different slot capacity.
    pub const fn with_capacity(max_tags: u32) -> Self {
        Self::new(COUNT_ADDR, SLOTS_BASE_ADDR, max_tags)
    }

    /// Address of slot `index`.
    pub fn slot_addr(&self, index: u32) -> usize {
        self.slots_base + index as usize * TAG_LEN
    }

    /// One past the last byte of the slot array.
    pub fn slots_end(&self) -> usize {
        self.slot_addr(self.max_tags)
    }

    /// One past the highest byte the registry owns.
    pub fn end(&self) -> usize {
        self.slots_end().max(self.count_addr + COUNT_LEN)
    }

    /// `true` when the count field and slot array share a byte.
    pub fn overlaps(&self) -> bool {
        let count_end = self.count_addr + COUNT_LEN;
        self.count_addr < self.slots_end() && self.slots_base < count_end
    }

    /// `true` when `addr` falls inside the registry's region.
    pub fn owns(&self, addr: usize) -> bool {
        (self.count_addr..self.count_addr + COUNT_LEN).contains(&addr)
            || (self.slots_base..self.slots_end()).contains(&addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deployed_layout_addresses() {
        let layout = Layout::default();
        assert_eq!(layout.slot_addr(0), 64);
        assert_eq!(layout.slot_addr(1), 75);
        assert_eq!(layout.slots_end(), 64 + 300 * 11);
        assert_eq!(layout.end(), 3364);
        assert!(!layout.overlaps());
    }

    #[test]
    fn overlap_detected() {
        assert!(Layout::new(64, 60, 2).overlaps());
        assert!(Layout::new(70, 64, 2).overlaps());
        assert!(!Layout::new(0, 4, 2).overlaps());
    }

    #[test]
    fn ownership_covers_count_and_slots_only() {
        let layout = Layout::default();
        assert!(layout.owns(60));
        assert!(layout.owns(63));
        assert!(layout.owns(64));
        assert!(!layout.owns(59));
        assert!(!layout.owns(layout.slots_end()));
    }
}
