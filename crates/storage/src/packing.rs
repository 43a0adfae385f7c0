//! Locating packed values inside 32-byte storage words.
//!
//! Offsets follow the compiler's layout convention: offset 0 is the
//! rightmost (least significant) byte of the word, so a value of `len` bytes
//! at `offset` occupies bytes `[32 - offset - len, 32 - offset)` of the
//! big-endian word.
//!
//! Values of 32 bytes or more always start a fresh slot. Smaller values share
//! a slot with their neighbours until the next one would not fit.

use alloy_primitives::B256;

/// Size of a storage word in bytes.
pub const WORD_SIZE: usize = 32;

/// Raised when a value would not fit in the remainder of its word.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("value of {bytes} bytes at offset {offset} would span slot boundary")]
pub struct SlotBoundaryError {
    pub offset: usize,
    pub bytes: usize,
}

/// Number of consecutive words read for a value of `bytes` bytes.
#[inline]
pub const fn slots_spanned(bytes: usize) -> usize {
    if bytes == 0 { 1 } else { (bytes - 1) / WORD_SIZE + 1 }
}

/// Cuts the `bytes`-wide window at `offset` out of a word.
#[inline]
pub fn extract_window(
    word: &B256,
    offset: usize,
    bytes: usize,
) -> Result<&[u8], SlotBoundaryError> {
    if offset + bytes > WORD_SIZE {
        return Err(SlotBoundaryError { offset, bytes });
    }
    Ok(&word[WORD_SIZE - offset - bytes..WORD_SIZE - offset])
}

/// Widens a value of at most one word to a full word.
///
/// `pad_right` keeps the data at the high-order end, as for `bytesN`.
/// Returns `None` if `data` is longer than a word.
pub fn widen(data: &[u8], pad_right: bool) -> Option<B256> {
    if data.len() > WORD_SIZE {
        return None;
    }
    let mut word = B256::ZERO;
    if pad_right {
        word.0[..data.len()].copy_from_slice(data);
    } else {
        word.0[WORD_SIZE - data.len()..].copy_from_slice(data);
    }
    Some(word)
}

/// Walks the `(slot delta, byte offset)` positions of consecutive array
/// elements of `element_bytes` bytes each, starting at the array's first slot.
///
/// The iterator is unbounded; callers `take` the element count.
#[derive(Debug, Clone)]
pub struct ElementCursor {
    element_bytes: usize,
    slot: usize,
    offset: usize,
}

impl ElementCursor {
    pub const fn new(element_bytes: usize) -> Self {
        Self { element_bytes, slot: 0, offset: 0 }
    }
}

impl Iterator for ElementCursor {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let position = (self.slot, self.offset);
        if self.element_bytes >= WORD_SIZE {
            self.slot += slots_spanned(self.element_bytes);
        } else {
            self.offset += self.element_bytes;
            if self.offset + self.element_bytes > WORD_SIZE {
                self.slot += 1;
                self.offset = 0;
            }
        }
        Some(position)
    }
}
