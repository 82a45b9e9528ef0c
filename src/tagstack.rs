use crate::import_stdlib;
import_stdlib!();

use crate::error::{Error, Result};

/// Tag numbers this small and below are stored inline; default from §3/§5.
pub const MAX_TAGS_PER_ITEM: usize = 4;
/// Default size of the per-decoder overflow table for tag numbers above
/// `0xFFFE` (§3 "Tag-number compression").
pub const DEFAULT_MAX_OVERFLOW_TAGS: usize = 4;

const NO_TAG: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Literal(u16),
    Overflow(u8),
}

/// The compressed, fixed-size stack of tag numbers accumulated on one item
/// (§3 "Tag-number compression", §4.4).
///
/// Values `<= 0xFFFE` are stored as a 16-bit literal inline. Larger values
/// are appended to the owning decoder's [`TagOverflowTable`] and the slot
/// records only the table index, keeping `Item` POD-sized regardless of how
/// large a tag number appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagStack {
    slots: [Slot; MAX_TAGS_PER_ITEM],
    len: usize,
}

impl TagStack {
    pub(crate) fn new() -> Self {
        Self { slots: [Slot::Literal(NO_TAG); MAX_TAGS_PER_ITEM], len: 0 }
    }

    /// Pushes a tag number onto this item's stack.
    ///
    /// Callers (the tag-number accumulator, §4.4) push tags in the order
    /// they appear on the wire, outermost first. Each push shifts the
    /// existing entries outward by one slot so the most recently pushed tag
    /// — the one nearest the data item — always lands at index 0, matching
    /// `get`'s "index 0 = innermost" contract.
    ///
    /// Fails with [`Error::TooManyTags`] once `MAX_TAGS_PER_ITEM` entries
    /// have been pushed; per §4.4 the caller should keep consuming wrapping
    /// tag numbers after this so traversal can still proceed.
    pub(crate) fn push(&mut self, value: u64, overflow: &mut TagOverflowTable) -> Result<()> {
        if self.len >= MAX_TAGS_PER_ITEM {
            return Err(Error::TooManyTags(MAX_TAGS_PER_ITEM));
        }
        let slot = if value <= (NO_TAG - 1) as u64 {
            Slot::Literal(value as u16)
        } else {
            Slot::Overflow(overflow.insert(value)?)
        };
        for i in (1..=self.len).rev() {
            self.slots[i] = self.slots[i - 1];
        }
        self.slots[0] = slot;
        self.len += 1;
        Ok(())
    }

    /// The number of tag numbers on this item.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the tag number at `index` (0 = innermost, i.e. the tag number
    /// that appeared closest to the data item on the wire).
    pub fn get(&self, index: usize, overflow: &TagOverflowTable) -> Option<u64> {
        if index >= self.len {
            return None;
        }
        Some(match self.slots[index] {
            Slot::Literal(v) => v as u64,
            Slot::Overflow(i) => overflow.get(i),
        })
    }

    /// Removes and returns the innermost (index 0) tag number, shifting the
    /// remaining entries down one slot. Used by the tag-content dispatch
    /// table (§4.8) once a callback has consumed that tag number.
    pub(crate) fn pop_innermost(&mut self, overflow: &TagOverflowTable) -> Option<u64> {
        if self.len == 0 {
            return None;
        }
        let value = self.get(0, overflow);
        for i in 1..self.len {
            self.slots[i - 1] = self.slots[i];
        }
        self.len -= 1;
        value
    }

    /// Returns an iterator-friendly `Vec` of this item's tag numbers,
    /// innermost first. Allocates; intended for the reporting-time
    /// conveniences (diagnostic notation, dispatch), not the hot traversal
    /// path.
    pub fn to_vec(&self, overflow: &TagOverflowTable) -> Vec<u64> {
        (0..self.len).filter_map(|i| self.get(i, overflow)).collect()
    }
}

impl Default for TagStack {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-decoder overflow table backing [`TagStack`] for tag numbers above
/// `0xFFFE`. Bounded to `DEFAULT_MAX_OVERFLOW_TAGS` entries by default;
/// entries are appended and never evicted for the lifetime of the decoder,
/// so the same large tag number reused across many items only costs one
/// slot.
#[derive(Debug, Clone)]
pub struct TagOverflowTable {
    entries: Vec<u64>,
    capacity: usize,
}

impl TagOverflowTable {
    pub fn new(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity), capacity }
    }

    fn insert(&mut self, value: u64) -> Result<u8> {
        if let Some(i) = self.entries.iter().position(|&v| v == value) {
            return Ok(i as u8);
        }
        if self.entries.len() >= self.capacity {
            return Err(Error::TooManyTags(self.capacity));
        }
        self.entries.push(value);
        Ok((self.entries.len() - 1) as u8)
    }

    fn get(&self, index: u8) -> u64 {
        self.entries[index as usize]
    }
}

impl Default for TagOverflowTable {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OVERFLOW_TAGS)
    }
}

/// Tracks which tag numbers on the item at a given input offset the caller
/// has already consumed (§4.7).
///
/// Independent of the accumulator in §4.4: the cursor exists so callers can
/// poll tag numbers one at a time before deciding how to decode the data
/// item that follows, without the dispatch table (§4.8) having run yet. The
/// cursor resets automatically whenever it is asked about a different
/// offset than the one it last saw.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagCursor {
    offset: Option<usize>,
    index: usize,
}

impl TagCursor {
    pub fn new() -> Self {
        Self { offset: None, index: 0 }
    }

    /// Returns the next unconsumed tag number for the item at `offset`, or
    /// `None` once all of `stack` has been consumed. Resets the cursor first
    /// if `offset` differs from the last call.
    pub fn next(&mut self, offset: usize, stack: &TagStack, overflow: &TagOverflowTable) -> Option<u64> {
        if self.offset != Some(offset) {
            self.offset = Some(offset);
            self.index = 0;
        }
        let value = stack.get(self.index, overflow);
        if value.is_some() {
            self.index += 1;
        }
        value
    }

    /// Whether every tag number on the item at `offset` has been consumed
    /// through this cursor. Used by the spiffy-decode layer (§4.9) to decide
    /// whether "unprocessed tag number" should be raised.
    pub fn is_exhausted(&self, offset: usize, stack: &TagStack) -> bool {
        self.offset == Some(offset) && self.index >= stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_and_overflow_round_trip() {
        // pushes happen outermost first (1, then the overflow value, then
        // 100 closest to the data); each push lands at index 0, so the
        // final order is innermost first.
        let mut overflow = TagOverflowTable::new(4);
        let mut stack = TagStack::new();
        stack.push(1, &mut overflow).unwrap();
        stack.push(0x1_0000_0000, &mut overflow).unwrap();
        stack.push(100, &mut overflow).unwrap();
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.get(0, &overflow), Some(100));
        assert_eq!(stack.get(1, &overflow), Some(0x1_0000_0000));
        assert_eq!(stack.get(2, &overflow), Some(1));
        assert_eq!(stack.get(3, &overflow), None);
    }

    #[test]
    fn too_many_tags_on_one_item() {
        let mut overflow = TagOverflowTable::new(4);
        let mut stack = TagStack::new();
        for i in 0..MAX_TAGS_PER_ITEM {
            stack.push(i as u64, &mut overflow).unwrap();
        }
        assert!(stack.push(99, &mut overflow).is_err());
    }

    #[test]
    fn overflow_table_exhaustion() {
        let mut overflow = TagOverflowTable::new(2);
        let mut stack = TagStack::new();
        stack.push(0x1_0000_0000, &mut overflow).unwrap();
        stack.push(0x2_0000_0000, &mut overflow).unwrap();
        assert!(stack.push(0x3_0000_0000, &mut overflow).is_err());
    }

    #[test]
    fn pop_innermost_shifts_remaining_entries() {
        // 1 is pushed first (outermost), 2 second (innermost, closest to
        // the data); pop_innermost must remove 2.
        let mut overflow = TagOverflowTable::new(4);
        let mut stack = TagStack::new();
        stack.push(1, &mut overflow).unwrap();
        stack.push(2, &mut overflow).unwrap();
        assert_eq!(stack.pop_innermost(&overflow), Some(2));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.get(0, &overflow), Some(1));
    }

    #[test]
    fn cursor_resets_on_offset_change() {
        let mut overflow = TagOverflowTable::new(4);
        let mut stack = TagStack::new();
        stack.push(1, &mut overflow).unwrap();
        stack.push(2, &mut overflow).unwrap();
        let mut cursor = TagCursor::new();
        assert_eq!(cursor.next(10, &stack, &overflow), Some(2));
        assert_eq!(cursor.next(10, &stack, &overflow), Some(1));
        assert_eq!(cursor.next(10, &stack, &overflow), None);
        assert!(cursor.is_exhausted(10, &stack));
        assert_eq!(cursor.next(20, &stack, &overflow), Some(2));
    }
}
