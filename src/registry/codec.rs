// CLASSIFICATION: COMMUNITY
// Filename: codec.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-19
//
// ─────────────────────────────────────────────────────────────
// tagrelay · Fixed-Width Tag Codec
//
// Tags are stored as exactly `TAG_LEN` ASCII bytes, left-padded
// with '0'. The codec is pure; no storage is touched here.
//
// # Public API
// * [`validate`] – caller-side check (length, digits)
// * [`pad`]      – left-pad to any fixed width
// * [`encode`]   – tag string → canonical slot bytes
// * [`decode`]   – slot bytes → string, untouched
// * [`trim`]     – lossy display form (all leading '0' removed)
// ─────────────────────────────────────────────────────────────

#![forbid(unsafe_code)]

use thiserror::Error;

/// Width of one canonical tag.
pub const TAG_LEN: usize = 11;

/// Raw bytes of one record slot.
pub type Slot = [u8; TAG_LEN];

/// Rejections raised before a tag reaches the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("tag length {len} exceeds {max} digits")]
    InvalidLength { len: usize, max: usize },
    #[error("tag contains non-digit {ch:?} at position {pos}")]
    InvalidCharacter { ch: char, pos: usize },
}

/// Check that `tag` is a decimal string no longer than [`TAG_LEN`].
pub fn validate(tag: &str) -> Result<(), TagError> {
    if let Some((pos, ch)) = tag.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        return Err(TagError::InvalidCharacter { ch, pos });
    }
    if tag.len() > TAG_LEN {
        return Err(TagError::InvalidLength {
            len: tag.len(),
            max: TAG_LEN,
        });
    }
    Ok(())
}

/// Left-pad `tag` with ASCII '0' to exactly `W` bytes.
///
/// `tag.len() <= W` is a precondition. If it is violated the rightmost `W`
/// bytes are kept (and debug builds panic).
pub fn pad<const W: usize>(tag: &str) -> [u8; W] {
    let bytes = tag.as_bytes();
    debug_assert!(bytes.len() <= W, "tag {:?} wider than {}", tag, W);
    let mut out = [b'0'; W];
    let take = bytes.len().min(W);
    out[W - take..].copy_from_slice(&bytes[bytes.len() - take..]);
    out
}

/// Canonical slot bytes for `tag`.
pub fn encode(tag: &str) -> Slot {
    pad::<TAG_LEN>(tag)
}

/// Slot bytes as a string, without trimming.
pub fn decode(slot: &Slot) -> String {
    String::from_utf8_lossy(slot).into_owned()
}

/// Display form: every leading '0' removed.
///
/// Lossy. A tag whose digits genuinely start with zero loses them too, and
/// an all-zero tag becomes the empty string. Never feed the result back
/// into the registry expecting the same slot.
pub fn trim(value: &str) -> &str {
    value.trim_start_matches('0')
}
