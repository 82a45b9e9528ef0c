use crate::import_stdlib;
import_stdlib!();

use crate::allocator::Allocator;
use crate::conformance::{DecoderConfig, DecoderFlags};
use crate::dispatch::DispatchTable;
use crate::error::{Error, Result};
use crate::head::{decode_head, head_len, MajorType, INDEFINITE};
use crate::item::{Count, Item, ItemCase, Label};
use crate::nesting::{FrameKind, NestingStack};
use crate::tagstack::{TagCursor, TagOverflowTable, TagStack};
use crate::exact::ExactFrom;
use half::f16;

/// An item produced by the atomic decoder (§4.2), before string reassembly,
/// tag accumulation, or map-pair coalescing have run.
///
/// Three of these variants (`IndefiniteStringHeader`, `TagNumber`, `Break`)
/// never reach a caller: they are consumed by the layers above. They exist
/// as a distinct type from [`ItemCase`] because `ItemCase` only describes
/// what `Decoder::get_next` surfaces.
enum Atomic<'a> {
    Item(ItemCase<'a>),
    IndefiniteStringHeader(MajorType),
    TagNumber(u64),
    Break,
}

enum ItemCaseOrTag<'a> {
    Item(ItemCase<'a>),
    Tag(u64),
    Break,
}

/// A tag stack accumulated by `next_tag_number` ahead of the item it
/// belongs to, so that a later `get_next`/`enter_bstr_wrapped` call doesn't
/// re-decode the same tag-number heads from scratch (§4.7).
struct PeekedTags {
    /// Input offset where the first tag-number head (or the item itself, if
    /// untagged) begins.
    offset: usize,
    /// Total bytes occupied by the tag-number heads already peeked.
    tag_bytes_len: usize,
    stack: TagStack,
}

/// Canonical ordering key for a map-entry label (§6, RFC 8949 §4.2.1):
/// bucketed by major type, then by the encoded head's length, then by the
/// numeric value or string length, then by payload bytes. Comparing these
/// tuples is equivalent to comparing the labels' canonical encoded bytes.
fn label_sort_key<'a>(label: &Label<'a>) -> (u8, usize, u64, &'a [u8]) {
    match *label {
        Label::Unsigned(n) => (0, head_len(n), n, &[]),
        Label::Signed(n) => {
            if n >= 0 {
                (0, head_len(n as u64), n as u64, &[])
            } else {
                let arg = (-1 - n) as u64;
                (1, head_len(arg), arg, &[])
            }
        }
        Label::ByteString(b) => (2, head_len(b.len() as u64), b.len() as u64, b),
        Label::Text(s) => (3, head_len(s.len() as u64), s.len() as u64, s.as_bytes()),
    }
}

/// A streaming CBOR decoder over a borrowed input buffer (§3, §4).
///
/// `Decoder` holds no owned data beyond its bookkeeping (nesting stack, tag
/// overflow table, cursor): every string and byte slice an [`Item`] carries
/// borrows either directly from `input` (definite strings — zero-copy) or
/// from the installed [`Allocator`]'s arena (indefinite strings). A decoder
/// must not be shared across threads (§5); create one per thread.
pub struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    end: usize,
    config: DecoderConfig,
    nesting: NestingStack<'a>,
    tag_overflow: TagOverflowTable,
    tag_cursor: TagCursor,
    allocator: Option<&'a mut dyn Allocator>,
    /// Tag numbers already consumed from the input by `next_tag_number` for
    /// the upcoming item, cached so `decode_tag_layer` doesn't redo the work.
    peeked: Option<PeekedTags>,
    /// Registered tag-content callbacks (§4.8). Taken out of `self` while
    /// running so a callback can still call back into the decoder.
    dispatch_table: Option<DispatchTable>,
    /// Set by an unrecoverable error or the first recoverable error of a
    /// sequence (§7 "Propagation"); subsequent calls through `get_next`
    /// become no-ops (they just return the latched error) once set.
    latch: Option<Error>,
}

impl<'a> Decoder<'a> {
    pub fn new(input: &'a [u8], config: DecoderConfig) -> Result<Self> {
        if input.len() > config.limits.max_input_len {
            return Err(Error::InputTooLarge(input.len(), config.limits.max_input_len));
        }
        Ok(Self {
            input,
            pos: 0,
            end: input.len(),
            nesting: NestingStack::new(config.limits.max_nesting_depth),
            tag_overflow: TagOverflowTable::new(config.limits.max_overflow_tags),
            tag_cursor: TagCursor::new(),
            allocator: None,
            peeked: None,
            dispatch_table: None,
            config,
            latch: None,
        })
    }

    /// Installs the allocator used to reassemble indefinite-length strings
    /// (§4.3). Decoding an indefinite string with none installed fails with
    /// [`Error::NoStringAllocator`].
    pub fn set_allocator(&mut self, allocator: &'a mut dyn Allocator) {
        self.allocator = Some(allocator);
    }

    /// Installs the tag-content dispatch table (§4.8). Without one, items
    /// surface with their raw tag numbers still on their tag stack.
    pub fn set_dispatch_table(&mut self, table: DispatchTable) {
        self.dispatch_table = Some(table);
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Mutable access to the decoder's configuration, for flags that only
    /// need to change between calls (e.g. enabling `ONLY_SORTED_MAPS` only
    /// for a particular [`Decoder::find_by_label`] call).
    pub fn config_mut(&mut self) -> &mut DecoderConfig {
        &mut self.config
    }

    /// Bytes remaining between the cursor and the current end of input (or
    /// the clamp installed by `enter_bstr_wrapped`).
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.pos)
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.end && self.nesting.is_empty()
    }

    /// Fails if any array or map is still open — the top-level caller's way
    /// of checking a full document was consumed (§7 "array-or-map-still-open").
    pub fn finish(&self) -> Result<()> {
        if !self.nesting.is_empty() {
            return Err(Error::ArrayOrMapStillOpen);
        }
        if self.pos != self.end {
            return Err(Error::ExtraBytes(self.end - self.pos));
        }
        Ok(())
    }

    /// Polls the tag-number cursor for the upcoming item, without consuming
    /// the item itself (§4.7).
    ///
    /// The first call at a given cursor position decodes (and caches) every
    /// tag-number head in front of the item — tag numbers are themselves
    /// just CBOR heads, so this never needs to look past them into the
    /// item's payload. A later `get_next`/`enter_bstr_wrapped` call picks
    /// the cached tags back up instead of re-decoding them. Returns `None`
    /// once the item at this position carries no more (or no) tag numbers.
    pub fn next_tag_number(&mut self) -> Option<u64> {
        let item_start = self.pos;
        if self.peeked.as_ref().map(|p| p.offset) != Some(item_start) {
            let (stack, tag_bytes_len) = self.peek_tag_stack().ok()?;
            self.peeked = Some(PeekedTags { offset: item_start, tag_bytes_len, stack });
        }
        let stack = self.peeked.as_ref().unwrap().stack;
        self.tag_cursor.next(item_start, &stack, &self.tag_overflow)
    }

    /// Decodes only the tag-number heads in front of the cursor, leaving
    /// `self.pos` unmoved; used by `next_tag_number` to peek ahead.
    fn peek_tag_stack(&mut self) -> Result<(TagStack, usize)> {
        let mut pos = self.pos;
        let mut stack = TagStack::new();
        loop {
            let head = decode_head(&self.input[pos..self.end], self.config.flags)?;
            if head.major != MajorType::Tagged {
                break;
            }
            if stack.push(head.arg, &mut self.tag_overflow).is_err() {
                log::debug!("tag-number stack overflow while peeking at offset {pos}");
            }
            pos += head.len;
        }
        Ok((stack, pos - self.pos))
    }

    // -- layer 1+2: head + atomic item ---------------------------------------

    fn decode_atomic(&mut self) -> Result<(Atomic<'a>, usize)> {
        let offset = self.pos;
        let remaining = &self.input[self.pos..self.end];
        let head = decode_head(remaining, self.config.flags)?;
        self.pos += head.len;

        let atomic = match head.major {
            MajorType::Unsigned => {
                if head.is_indefinite() {
                    return Err(Error::BadInteger);
                }
                Atomic::Item(if head.arg <= i64::MAX as u64 {
                    ItemCase::SignedInt(head.arg as i64)
                } else {
                    ItemCase::UnsignedInt(head.arg)
                })
            }
            MajorType::Negative => {
                if head.is_indefinite() {
                    return Err(Error::BadInteger);
                }
                Atomic::Item(if head.arg <= i64::MAX as u64 {
                    ItemCase::SignedInt(-1 - head.arg as i64)
                } else {
                    ItemCase::NegativeBig(head.arg)
                })
            }
            MajorType::ByteString | MajorType::Text => {
                if head.is_indefinite() {
                    Atomic::IndefiniteStringHeader(head.major)
                } else {
                    let len = head.arg as usize;
                    if head.arg > self.config.limits.max_input_len as u64 {
                        return Err(Error::StringTooLong(head.arg));
                    }
                    let bytes = self.take(len)?;
                    Atomic::Item(if head.major == MajorType::ByteString {
                        ItemCase::ByteString(bytes)
                    } else {
                        ItemCase::TextString(str::from_utf8(bytes).map_err(|_| Error::IndefiniteStringChunk)?)
                    })
                }
            }
            MajorType::Array | MajorType::Map => {
                let count = if head.is_indefinite() {
                    Count::Indefinite
                } else {
                    if head.arg > self.config.limits.max_items_per_aggregate as u64 {
                        return Err(Error::ArrayTooLong(head.arg, self.config.limits.max_items_per_aggregate as u64));
                    }
                    let items = if head.major == MajorType::Map { head.arg.saturating_mul(2) } else { head.arg };
                    Count::Definite(items as u32)
                };
                Atomic::Item(if head.major == MajorType::Array {
                    ItemCase::Array(count)
                } else if self.config.flags.contains(DecoderFlags::MAP_AS_ARRAY) {
                    ItemCase::MapAsArray(count)
                } else {
                    ItemCase::Map(count)
                })
            }
            MajorType::Tagged => {
                if head.is_indefinite() {
                    return Err(Error::BadInteger);
                }
                Atomic::TagNumber(head.arg)
            }
            MajorType::Simple => self.decode_simple_or_float(head.info, head.arg)?,
        };
        Ok((atomic, offset))
    }

    fn decode_simple_or_float(&mut self, info: u8, arg: u64) -> Result<Atomic<'a>> {
        if info == INDEFINITE {
            return Ok(Atomic::Break);
        }
        let reject_simple = self.config.flags.contains(DecoderFlags::DISALLOW_DCBOR_SIMPLES);
        let reject_unreduced = self.config.flags.contains(DecoderFlags::ONLY_REDUCED_FLOATS);
        match info {
            20 => Ok(Atomic::Item(ItemCase::Bool(false))),
            21 => Ok(Atomic::Item(ItemCase::Bool(true))),
            22 => Ok(Atomic::Item(ItemCase::Null)),
            23 => Ok(Atomic::Item(ItemCase::Undefined)),
            24 => {
                // A one-byte simple is only a valid (preferred) encoding for
                // codes >= 32; 0..=19 belong inline, 20..=23 are the cases
                // above (§6).
                if arg <= 31 {
                    return Err(Error::BadInteger);
                }
                if reject_simple {
                    return Err(Error::DcborConformance);
                }
                Ok(Atomic::Item(ItemCase::Simple(arg as u8)))
            }
            25 => Ok(Atomic::Item(ItemCase::Half(f16::from_bits(arg as u16).to_f64()))),
            26 => {
                let v = f32::from_bits(arg as u32);
                if reject_unreduced && f16::exact_from_f32(v).is_some() {
                    return Err(Error::DcborConformance);
                }
                Ok(Atomic::Item(ItemCase::Single(v as f64)))
            }
            27 => {
                let v = f64::from_bits(arg);
                if reject_unreduced && f32::exact_from_f64(v).is_some() {
                    return Err(Error::DcborConformance);
                }
                Ok(Atomic::Item(ItemCase::Double(v)))
            }
            v if v < 20 => {
                if reject_simple {
                    return Err(Error::DcborConformance);
                }
                Ok(Atomic::Item(ItemCase::Simple(v)))
            }
            _ => Err(Error::BadType7(info)),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.end {
            return Err(Error::HitEnd);
        }
        let slice = &self.input[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    // -- layer 3: indefinite-length string reassembly ------------------------

    fn decode_string_layer(&mut self) -> Result<(ItemCaseOrTag<'a>, usize)> {
        let (atomic, offset) = self.decode_atomic()?;
        match atomic {
            Atomic::Item(case) => Ok((ItemCaseOrTag::Item(case), offset)),
            Atomic::TagNumber(v) => Ok((ItemCaseOrTag::Tag(v), offset)),
            Atomic::Break => Ok((ItemCaseOrTag::Break, offset)),
            Atomic::IndefiniteStringHeader(major) => {
                let reassembled = self.reassemble_indefinite_string(major)?;
                Ok((ItemCaseOrTag::Item(reassembled), offset))
            }
        }
    }

    fn reassemble_indefinite_string(&mut self, outer_major: MajorType) -> Result<ItemCase<'a>> {
        let mut len = 0usize;
        let mut ptr: Option<*mut u8> = None;
        loop {
            let (atomic, _) = self.decode_atomic()?;
            let chunk: &[u8] = match (atomic, outer_major) {
                (Atomic::Break, _) => break,
                (Atomic::Item(ItemCase::ByteString(chunk)), MajorType::ByteString) => chunk,
                (Atomic::Item(ItemCase::TextString(chunk)), MajorType::Text) => chunk.as_bytes(),
                _ => return Err(Error::IndefiniteStringChunk),
            };
            let allocator = self.allocator.as_deref_mut().ok_or(Error::NoStringAllocator)?;
            let new_len = len + chunk.len();
            let new_ptr = allocator.reallocate(ptr, len, new_len).ok_or(Error::StringAllocate(new_len))?;
            // SAFETY: `new_ptr` was just returned by the installed allocator
            // as valid for `new_len` bytes, and `chunk` does not overlap it.
            unsafe {
                core::ptr::copy_nonoverlapping(chunk.as_ptr(), new_ptr.add(len), chunk.len());
            }
            ptr = Some(new_ptr);
            len = new_len;
        }
        let bytes: &'a [u8] = match ptr {
            Some(ptr) => unsafe { core::slice::from_raw_parts(ptr, len) },
            None => &[],
        };
        Ok(match outer_major {
            MajorType::ByteString => ItemCase::ByteString(bytes),
            MajorType::Text => ItemCase::TextString(str::from_utf8(bytes).map_err(|_| Error::IndefiniteStringChunk)?),
            _ => unreachable!("outer_major is always a string type here"),
        })
    }

    // -- layer 4: tag-number accumulation -------------------------------------

    /// Decodes one item through the tag-accumulation layer, without map-pair
    /// coalescing or dispatch. Exposed `pub(crate)` so tag-content callbacks
    /// (§4.8, `dispatch.rs`) that need to pull further raw items out of a
    /// tag's content — e.g. the two elements of an exponent/mantissa array —
    /// can do so without going through the full `get_next` pipeline again.
    pub(crate) fn decode_tag_layer(&mut self) -> Result<Item<'a>> {
        loop {
            let item_start = self.pos;
            let mut stack = match self.peeked.take() {
                Some(peeked) if peeked.offset == item_start => {
                    self.pos = peeked.offset + peeked.tag_bytes_len;
                    peeked.stack
                }
                other => {
                    self.peeked = other;
                    TagStack::new()
                }
            };
            let case = loop {
                let (result, offset) = self.decode_string_layer()?;
                match result {
                    ItemCaseOrTag::Tag(value) => {
                        if stack.push(value, &mut self.tag_overflow).is_err() {
                            log::debug!("tag-number stack overflow at offset {offset}");
                            // Keep consuming wrapping tag numbers per §4.4
                            // so traversal can still proceed.
                        }
                    }
                    ItemCaseOrTag::Item(case) => break case,
                    ItemCaseOrTag::Break => {
                        self.nesting.close_indefinite()?;
                        self.nesting.ascend_after_item();
                        continue;
                    }
                }
            };
            let level = self.nesting.depth();
            let mut item = Item::new(case, level, item_start);
            item.tags = stack;
            return Ok(item);
        }
    }

    // -- layer 5: map-pair coalescing -----------------------------------------

    fn decode_map_pair_layer(&mut self) -> Result<Item<'a>> {
        let in_map = matches!(self.nesting.current(), Some(f) if f.kind == FrameKind::Map);
        if !in_map {
            return self.decode_tag_layer();
        }
        let label_item = self.decode_tag_layer()?;
        let label = Self::item_to_label(&label_item)?;
        if self.config.flags.contains(DecoderFlags::MAP_STRINGS_ONLY) && !matches!(label, Label::Text(_)) {
            return Err(Error::MapLabelType);
        }
        if self.config.flags.contains(DecoderFlags::ONLY_SORTED_MAPS) {
            let frame = self.nesting.current_mut().expect("in_map implies a current frame");
            if let Some(prev) = frame.last_label {
                match label_sort_key(&prev).cmp(&label_sort_key(&label)) {
                    core::cmp::Ordering::Equal => return Err(Error::DuplicateLabel),
                    core::cmp::Ordering::Greater => return Err(Error::Unsorted),
                    core::cmp::Ordering::Less => {}
                }
            }
            self.nesting.current_mut().unwrap().last_label = Some(label);
        }
        // The label consumed one raw sub-item of the frame's doubled count
        // (§4.5); the value's own consumption is accounted for below by the
        // caller's `ascend_after_item` call, same as any other item.
        self.nesting.ascend_after_item();
        let mut value_item = self.decode_tag_layer()?;
        value_item.label = Some(label);
        Ok(value_item)
    }

    pub(crate) fn item_to_label(item: &Item<'a>) -> Result<Label<'a>> {
        match item.case {
            ItemCase::SignedInt(n) => Ok(Label::Signed(n)),
            ItemCase::UnsignedInt(n) => Ok(Label::Unsigned(n)),
            ItemCase::TextString(s) => Ok(Label::Text(s)),
            ItemCase::ByteString(b) => Ok(Label::ByteString(b)),
            _ => Err(Error::MapLabelType),
        }
    }

    // -- layer 6: ascend/descend, public entry point -------------------------

    /// Decodes and returns the next item in pre-order traversal (§2, §4.6).
    ///
    /// Aggregates are surfaced as their own item (with their count) and
    /// descended into automatically: the next call returns the aggregate's
    /// first child. Ascent out of completed aggregates also happens
    /// automatically and is reflected in the returned item's `next_level`,
    /// unless a frame was marked bounded via `enter`.
    pub fn get_next(&mut self) -> Result<Item<'a>> {
        if let Some(err) = self.latch.clone() {
            return Err(err);
        }
        let result = self.get_next_raw_inner().and_then(|item| self.run_dispatch(item));
        if let Err(ref e) = result {
            if !e.is_recoverable() && self.latch.is_none() {
                self.latch = Some(e.clone());
            }
        }
        result
    }

    /// Like [`Decoder::get_next`], but without tag-content dispatch (§4.8):
    /// the item surfaces with its original tag stack untouched. Used by the
    /// spiffy-decode layer (§4.9), which needs to check a `TagRequirement`
    /// against the item's raw tags before any callback converts it.
    pub(crate) fn get_next_raw(&mut self) -> Result<Item<'a>> {
        if let Some(err) = self.latch.clone() {
            return Err(err);
        }
        let result = self.get_next_raw_inner();
        if let Err(ref e) = result {
            if !e.is_recoverable() && self.latch.is_none() {
                self.latch = Some(e.clone());
            }
        }
        result
    }

    fn get_next_raw_inner(&mut self) -> Result<Item<'a>> {
        let mut item = self.decode_map_pair_layer()?;

        if item.case.is_aggregate() {
            let (count, kind) = match item.case {
                ItemCase::Array(c) => (c, FrameKind::Array),
                ItemCase::Map(c) => (c, FrameKind::Map),
                ItemCase::MapAsArray(c) => (c, FrameKind::MapAsArray),
                _ => unreachable!(),
            };
            item.level = self.nesting.depth();
            self.nesting.descend(kind, count, false, None, self.pos)?;
            item.next_level = if matches!(count, Count::Definite(0)) {
                self.nesting.ascend_after_item()
            } else {
                self.nesting.depth()
            };
        } else {
            item.level = self.nesting.depth();
            item.next_level = self.nesting.ascend_after_item();
        }
        Ok(item)
    }

    /// Runs registered tag-content callbacks over `item`'s tag stack,
    /// innermost first, stopping at the first tag number with no registered
    /// callback (§4.8). That tag, and everything outward of it, is left on
    /// the item's tag stack for the caller.
    fn run_dispatch(&mut self, mut item: Item<'a>) -> Result<Item<'a>> {
        let Some(table) = self.dispatch_table.take() else {
            return Ok(item);
        };
        loop {
            let Some(tag) = item.tags.get(0, &self.tag_overflow) else { break };
            let Some(callback) = table.lookup(tag) else { break };
            item.tags.pop_innermost(&self.tag_overflow);
            item = match callback(self, tag, item) {
                Ok(item) => item,
                Err(e) => {
                    self.dispatch_table = Some(table);
                    return Err(e);
                }
            };
        }
        self.dispatch_table = Some(table);
        Ok(item)
    }

    /// Marks the frame opened by the aggregate item just returned from
    /// `get_next` as bounded: ascent will pause there (`next_level` reads 0)
    /// until the caller calls the matching `exit`.
    pub fn enter(&mut self) -> Result<()> {
        match self.nesting.current_mut() {
            Some(frame) => {
                frame.bounded = true;
                Ok(())
            }
            None => Err(Error::MapNotEntered),
        }
    }

    /// Exits a frame previously entered with `enter`.
    pub fn exit(&mut self, kind: FrameKind) -> Result<()> {
        self.nesting.exit_bounded(kind)?;
        Ok(())
    }

    /// Enters a byte-string-wrapped CBOR item (tag 24 or 63; §4.12).
    ///
    /// Call this in place of `get_next` when the tag-number cursor shows the
    /// upcoming item is tagged 24/63. Repositions the decoder onto the
    /// wrapped bytes; `exit_bstr_wrapped` restores the outer cursor.
    pub fn enter_bstr_wrapped(&mut self) -> Result<()> {
        let item = self.decode_map_pair_layer()?;
        let bytes = match item.case {
            ItemCase::ByteString(b) => b,
            _ => return Err(Error::UnexpectedType),
        };
        let saved_end = self.end;
        let start = bytes.as_ptr() as usize - self.input.as_ptr() as usize;
        let end = start + bytes.len();
        self.nesting.descend(FrameKind::BstrWrapped, Count::Definite(1), true, Some(saved_end), start)?;
        self.pos = start;
        self.end = end;
        Ok(())
    }

    /// Exits a region entered with `enter_bstr_wrapped`, restoring the
    /// cursor to just past the wrapping byte string in the outer buffer.
    pub fn exit_bstr_wrapped(&mut self) -> Result<()> {
        let saved_end = self.nesting.exit_bounded(FrameKind::BstrWrapped)?;
        let resume_at = self.end;
        self.end = saved_end.unwrap_or(self.end);
        self.pos = resume_at;
        Ok(())
    }

    pub(crate) fn tag_overflow(&self) -> &TagOverflowTable {
        &self.tag_overflow
    }

    /// The innermost open frame, if any. Used by map search (§4.10) to
    /// validate a bounded map is current before rewinding into it.
    pub(crate) fn current_frame(&self) -> Option<&crate::nesting::Frame<'a>> {
        self.nesting.current()
    }

    /// The raw input cursor position. Map search (§4.10) saves this before
    /// rewinding into a bounded map's content and restores it afterward.
    pub(crate) fn raw_pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn set_raw_pos(&mut self, pos: usize) {
        self.pos = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::DecoderConfig;

    fn decoder(bytes: &[u8]) -> Decoder<'_> {
        Decoder::new(bytes, DecoderConfig::default()).unwrap()
    }

    #[test]
    fn empty_map() {
        let mut d = decoder(&[0xa0]);
        let item = d.get_next().unwrap();
        assert!(matches!(item.case, ItemCase::Map(Count::Definite(0))));
        assert_eq!(item.next_level, 0);
        d.finish().unwrap();
    }

    #[test]
    fn map_as_array_mode() {
        let bytes = [0xa2, 0x01, 0x02, 0x03, 0x04];
        let mut config = DecoderConfig::default();
        config.flags = DecoderFlags::MAP_AS_ARRAY;
        let mut d = Decoder::new(&bytes, config).unwrap();
        let item = d.get_next().unwrap();
        assert!(matches!(item.case, ItemCase::MapAsArray(Count::Definite(4))));
        for expected in [1, 2, 3, 4] {
            let item = d.get_next().unwrap();
            assert!(matches!(item.case, ItemCase::SignedInt(n) if n == expected));
        }
        d.finish().unwrap();
    }

    #[test]
    fn default_mode_coalesces_map_pairs() {
        let bytes = [0xa2, 0x01, 0x02, 0x03, 0x04];
        let mut d = decoder(&bytes);
        let map_item = d.get_next().unwrap();
        assert!(matches!(map_item.case, ItemCase::Map(Count::Definite(4))));
        let first = d.get_next().unwrap();
        assert!(matches!(first.label, Some(Label::Signed(1))));
        assert!(matches!(first.case, ItemCase::SignedInt(2)));
        let second = d.get_next().unwrap();
        assert!(matches!(second.label, Some(Label::Signed(3))));
        assert!(matches!(second.case, ItemCase::SignedInt(4)));
        d.finish().unwrap();
    }

    #[test]
    fn nested_array_with_break() {
        let bytes = [0x9f, 0x01, 0x9f, 0x02, 0x03, 0xff, 0x04, 0xff];
        let mut d = decoder(&bytes);
        let outer = d.get_next().unwrap();
        assert_eq!(outer.level, 0);
        let one = d.get_next().unwrap();
        assert!(matches!(one.case, ItemCase::SignedInt(1)));
        assert_eq!(one.level, 1);
        let inner = d.get_next().unwrap();
        assert_eq!(inner.level, 1);
        let two = d.get_next().unwrap();
        assert!(matches!(two.case, ItemCase::SignedInt(2)));
        assert_eq!(two.level, 2);
        let three = d.get_next().unwrap();
        assert!(matches!(three.case, ItemCase::SignedInt(3)));
        assert_eq!(three.level, 2);
        let four = d.get_next().unwrap();
        assert!(matches!(four.case, ItemCase::SignedInt(4)));
        assert_eq!(four.level, 1);
        assert_eq!(four.next_level, 0);
        d.finish().unwrap();
    }

    #[test]
    fn bstr_wrapped_round_trip() {
        let bytes = [0xd8, 0x18, 0x45, 0x82, 0x01, 0x82, 0x02, 0x03];
        let mut d = decoder(&bytes);
        assert_eq!(d.next_tag_number(), Some(24));
        d.enter_bstr_wrapped().unwrap();
        let arr = d.get_next().unwrap();
        assert!(matches!(arr.case, ItemCase::Array(Count::Definite(2))));
        let one = d.get_next().unwrap();
        assert!(matches!(one.case, ItemCase::SignedInt(1)));
        let _inner = d.get_next().unwrap();
        let two = d.get_next().unwrap();
        assert!(matches!(two.case, ItemCase::SignedInt(2)));
        let three = d.get_next().unwrap();
        assert!(matches!(three.case, ItemCase::SignedInt(3)));
        d.exit_bstr_wrapped().unwrap();
        assert_eq!(d.pos, 8);
        d.finish().unwrap();
    }

    #[test]
    fn indefinite_string_without_allocator_fails() {
        let bytes = [0x7f, 0x65, b'H', b'e', b'l', b'l', b'o', 0xff];
        let mut d = decoder(&bytes);
        assert!(matches!(d.get_next(), Err(Error::NoStringAllocator)));
    }

    #[test]
    fn indefinite_string_with_allocator_reassembles() {
        use crate::allocator::BumpAllocator;
        let bytes = [
            0x7f, 0x65, b'H', b'e', b'l', b'l', b'o', 0x64, b'_', b'w', b'o', b'r', 0x63, b'l', b'd', b'!', 0xff,
        ];
        let mut backing = [0u8; 64];
        let mut alloc = BumpAllocator::new(&mut backing).unwrap();
        let mut d = decoder(&bytes);
        d.set_allocator(&mut alloc);
        let item = d.get_next().unwrap();
        assert!(matches!(item.case, ItemCase::TextString(s) if s == "Hello_world!"));
        d.finish().unwrap();
    }

    #[test]
    fn three_entry_map_fully_closes() {
        // {1: 2, 3: 4, 5: 6} - regression test for the map frame's count
        // being tracked in raw (label+value) sub-items while coalesced pairs
        // only surface one item per entry.
        let bytes = [0xa3, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let mut d = decoder(&bytes);
        let map_item = d.get_next().unwrap();
        assert!(matches!(map_item.case, ItemCase::Map(Count::Definite(6))));
        for (k, v) in [(1, 2), (3, 4), (5, 6)] {
            let pair = d.get_next().unwrap();
            assert!(matches!(pair.label, Some(Label::Signed(n)) if n == k));
            assert!(matches!(pair.case, ItemCase::SignedInt(n) if n == v));
        }
        d.finish().unwrap();
    }

    #[test]
    fn sorted_maps_accepts_canonical_order() {
        let bytes = [0xa2, 0x01, 0x02, 0x03, 0x04];
        let mut config = DecoderConfig::default();
        config.flags = DecoderFlags::ONLY_SORTED_MAPS;
        let mut d = Decoder::new(&bytes, config).unwrap();
        d.get_next().unwrap();
        d.get_next().unwrap();
        d.get_next().unwrap();
        d.finish().unwrap();
    }

    #[test]
    fn sorted_maps_rejects_out_of_order_keys() {
        let bytes = [0xa2, 0x03, 0x04, 0x01, 0x02];
        let mut config = DecoderConfig::default();
        config.flags = DecoderFlags::ONLY_SORTED_MAPS;
        let mut d = Decoder::new(&bytes, config).unwrap();
        d.get_next().unwrap();
        assert!(matches!(d.get_next(), Err(Error::Unsorted)));
    }

    #[test]
    fn sorted_maps_rejects_duplicate_keys() {
        let bytes = [0xa2, 0x01, 0x02, 0x01, 0x04];
        let mut config = DecoderConfig::default();
        config.flags = DecoderFlags::ONLY_SORTED_MAPS;
        let mut d = Decoder::new(&bytes, config).unwrap();
        d.get_next().unwrap();
        assert!(matches!(d.get_next(), Err(Error::DuplicateLabel)));
    }

    #[test]
    fn dcbor_simples_are_rejected() {
        let bytes = [0xf8, 0x20]; // simple(32)
        let mut config = DecoderConfig::default();
        config.flags = DecoderFlags::DISALLOW_DCBOR_SIMPLES;
        let mut d = Decoder::new(&bytes, config).unwrap();
        assert!(matches!(d.get_next(), Err(Error::DcborConformance)));
    }

    #[test]
    fn reduced_floats_rejects_double_with_shorter_form() {
        // 1.5 as a double, which fits losslessly in a single.
        let bytes = [0xfb, 0x3f, 0xf8, 0, 0, 0, 0, 0, 0];
        let mut config = DecoderConfig::default();
        config.flags = DecoderFlags::ONLY_REDUCED_FLOATS;
        let mut d = Decoder::new(&bytes, config).unwrap();
        assert!(matches!(d.get_next(), Err(Error::DcborConformance)));
    }

    #[test]
    fn reduced_floats_accepts_irreducible_double() {
        // 0.1 as a double has no lossless single/half representation.
        let bytes = [0xfb, 0x3f, 0xb9, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a];
        let mut config = DecoderConfig::default();
        config.flags = DecoderFlags::ONLY_REDUCED_FLOATS;
        let mut d = Decoder::new(&bytes, config).unwrap();
        assert!(d.get_next().is_ok());
    }
}
