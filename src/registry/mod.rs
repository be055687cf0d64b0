// CLASSIFICATION: COMMUNITY
// Filename: mod.rs · registry v0.4
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Whitelist of authorized tags kept in non-volatile storage.
//!
//! The region is a `u32` count followed by fixed-width slots. Slots
//! `[0, count)` hold distinct canonical tags with no gaps; everything at or
//! past `count` is stale and never read as data. Nothing is cached: each
//! call goes back to the store, so a power cycle can never leave the
//! registry out of step with the medium.

pub mod codec;
pub mod layout;

use std::collections::HashMap;

use log::{debug, info, warn};
use thiserror::Error;

use crate::store::{ByteStore, StoreError, ERASED};
use codec::{decode, encode, trim, Slot};
pub use codec::{TagError, TAG_LEN};
pub use layout::{Layout, COUNT_ADDR, MAX_TAGS, SLOTS_BASE_ADDR};

/// Errors returned by [`TagRegistry`] operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tag already registered")]
    DuplicateTag,
    #[error("registry full ({max} tags)")]
    RegistryFull { max: u32 },
    #[error("tag not found")]
    NotFound,
    #[error("stored tag count {count} exceeds capacity {max}")]
    CountOutOfRange { count: u32, max: u32 },
    #[error("slot {index} inside the live range was never written")]
    ErasedSlot { index: u32 },
    #[error("slots {first} and {second} hold the same tag")]
    DuplicateSlots { first: u32, second: u32 },
    #[error("registry region ends at {need} but store holds {have} bytes")]
    LayoutTooLarge { need: usize, have: usize },
    #[error("registry count field overlaps the slot array")]
    LayoutOverlap,
    #[error(transparent)]
    Store(#[from] StoreError),
}

type RegistryResult<T> = Result<T, RegistryError>;

/// Result of [`TagRegistry::repair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairOutcome {
    /// The region already satisfied every invariant.
    Clean,
    /// An interrupted delete was finished by dropping the duplicate at
    /// `removed`.
    Compacted { removed: u32 },
}

/// Tag whitelist over a [`ByteStore`].
pub struct TagRegistry<S> {
    store: S,
    layout: Layout,
}

impl<S: ByteStore> TagRegistry<S> {
    /// Registry at the deployed addresses.
    pub fn new(store: S) -> RegistryResult<Self> {
        Self::with_layout(store, Layout::default())
    }

    /// Registry at an explicit layout. Fails if the layout does not fit the
    /// store or its count field overlaps the slots.
    pub fn with_layout(store: S, layout: Layout) -> RegistryResult<Self> {
        if layout.overlaps() {
            return Err(RegistryError::LayoutOverlap);
        }
        if layout.end() > store.len() {
            return Err(RegistryError::LayoutTooLarge {
                need: layout.end(),
                have: store.len(),
            });
        }
        Ok(Self { store, layout })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Direct store access for collaborators that own other address
    /// ranges. Writes inside [`Layout::owns`] are forbidden.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Number of live tags.
    pub fn count(&mut self) -> RegistryResult<u32> {
        let count = self.store.read_u32(self.layout.count_addr)?;
        if count > self.layout.max_tags {
            return Err(RegistryError::CountOutOfRange {
                count,
                max: self.layout.max_tags,
            });
        }
        Ok(count)
    }

    fn write_count(&mut self, count: u32) -> RegistryResult<()> {
        debug_assert!(count <= self.layout.max_tags);
        self.store.write_u32(self.layout.count_addr, count)?;
        self.store.commit()?;
        Ok(())
    }

    fn read_slot(&mut self, index: u32) -> RegistryResult<Slot> {
        let mut slot = [0u8; TAG_LEN];
        self.store
            .read_bytes(self.layout.slot_addr(index), &mut slot)?;
        Ok(slot)
    }

    fn write_slot(&mut self, index: u32, slot: &Slot) -> RegistryResult<()> {
        debug_assert!(index < self.layout.max_tags);
        self.store.write_bytes(self.layout.slot_addr(index), slot)?;
        self.store.commit()?;
        Ok(())
    }

    fn scan(&mut self, wanted: &Slot, count: u32) -> RegistryResult<Option<u32>> {
        for index in 0..count {
            if self.read_slot(index)? == *wanted {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Index of `tag`, if registered. `tag` must already be validated.
    pub fn find(&mut self, tag: &str) -> RegistryResult<Option<u32>> {
        let wanted = encode(tag);
        let count = self.count()?;
        let found = self.scan(&wanted, count)?;
        debug!("registry: lookup {} -> {:?}", decode(&wanted), found);
        Ok(found)
    }

    pub fn contains(&mut self, tag: &str) -> RegistryResult<bool> {
        Ok(self.find(tag)?.is_some())
    }

    /// Append `tag`, returning its slot index.
    ///
    /// The slot is committed before the count, so a power loss in between
    /// leaves only an orphan in a stale slot.
    pub fn insert(&mut self, tag: &str) -> RegistryResult<u32> {
        let slot = encode(tag);
        let count = self.count()?;
        if self.scan(&slot, count)?.is_some() {
            info!("registry: {} already present", decode(&slot));
            return Err(RegistryError::DuplicateTag);
        }
        if count >= self.layout.max_tags {
            warn!("registry: full at {} tags", count);
            return Err(RegistryError::RegistryFull {
                max: self.layout.max_tags,
            });
        }
        self.write_slot(count, &slot)?;
        self.write_count(count + 1)?;
        debug_assert_eq!(self.read_slot(count).ok(), Some(slot));
        info!("registry: added {} at slot {}", decode(&slot), count);
        Ok(count)
    }

    /// Remove `tag`, shifting every later slot down by one.
    ///
    /// Each shifted slot is committed before the next, and the count last.
    /// Power loss mid-shift leaves one tag in two adjacent slots with the
    /// old count; [`repair`](Self::repair) finishes the job on next boot.
    pub fn delete(&mut self, tag: &str) -> RegistryResult<()> {
        let wanted = encode(tag);
        let count = self.count()?;
        let index = match self.scan(&wanted, count)? {
            Some(index) => index,
            None => {
                info!("registry: {} not found for delete", decode(&wanted));
                return Err(RegistryError::NotFound);
            }
        };
        self.compact_from(index, count)?;
        debug_assert!(matches!(self.scan(&wanted, count - 1), Ok(None)));
        info!("registry: removed {} from slot {}", decode(&wanted), index);
        Ok(())
    }

    fn compact_from(&mut self, index: u32, count: u32) -> RegistryResult<()> {
        for i in index..count.saturating_sub(1) {
            let next = self.read_slot(i + 1)?;
            self.write_slot(i, &next)?;
        }
        self.write_count(count - 1)
    }

    /// Forget every tag. Slot bytes stay on the medium but are unreachable.
    pub fn clear_all(&mut self) -> RegistryResult<()> {
        self.write_count(0)?;
        info!("registry: cleared");
        Ok(())
    }

    /// Live tags in slot order, display-trimmed. Slots whose first byte is
    /// erased are skipped.
    pub fn list(&mut self) -> RegistryResult<Vec<String>> {
        Ok(self
            .list_canonical()?
            .iter()
            .map(|tag| trim(tag).to_owned())
            .collect())
    }

    /// Live tags in slot order, in canonical padded form.
    pub fn list_canonical(&mut self) -> RegistryResult<Vec<String>> {
        let count = self.count()?;
        let mut tags = Vec::with_capacity(count as usize);
        for index in 0..count {
            let slot = self.read_slot(index)?;
            if slot[0] == ERASED {
                warn!("registry: slot {} below count {} is erased", index, count);
                continue;
            }
            tags.push(decode(&slot));
        }
        Ok(tags)
    }

    fn live_slots(&mut self) -> RegistryResult<Vec<Slot>> {
        let count = self.count()?;
        (0..count).map(|i| self.read_slot(i)).collect()
    }

    /// Check the region invariants, returning the live count when they hold.
    pub fn verify(&mut self) -> RegistryResult<u32> {
        let slots = self.live_slots()?;
        check_slots(&slots, None)?;
        Ok(slots.len() as u32)
    }

    /// Finish a delete that lost power mid-compaction.
    ///
    /// Uniqueness holds before a delete starts, so an interrupted shift
    /// leaves exactly one adjacent duplicate pair `(j, j + 1)` with the tail
    /// after it not yet moved. Dropping `j + 1` completes the delete. Any
    /// other violation is reported and left alone.
    pub fn repair(&mut self) -> RegistryResult<RepairOutcome> {
        let slots = self.live_slots()?;
        let pair = slots.windows(2).position(|w| w[0] == w[1]);
        let Some(first) = pair else {
            check_slots(&slots, None)?;
            return Ok(RepairOutcome::Clean);
        };
        let removed = first as u32 + 1;
        check_slots(&slots, Some(removed))?;
        warn!(
            "registry: finishing interrupted delete, dropping duplicate at slot {}",
            removed
        );
        self.compact_from(removed, slots.len() as u32)?;
        Ok(RepairOutcome::Compacted { removed })
    }
}

/// Uniqueness and written-ness of the live slots, ignoring index `skip`.
fn check_slots(slots: &[Slot], skip: Option<u32>) -> RegistryResult<()> {
    let mut seen: HashMap<&Slot, u32> = HashMap::with_capacity(slots.len());
    for (index, slot) in slots.iter().enumerate() {
        let index = index as u32;
        if Some(index) == skip {
            continue;
        }
        if slot[0] == ERASED {
            return Err(RegistryError::ErasedSlot { index });
        }
        if let Some(&first) = seen.get(slot) {
            return Err(RegistryError::DuplicateSlots {
                first,
                second: index,
            });
        }
        seen.insert(slot, index);
    }
    Ok(())
}
