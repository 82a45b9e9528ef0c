use crate::import_stdlib;
import_stdlib!();

use crate::conformance::{EncoderConfig, EncoderFlags};
use crate::error::{Error, Result};
use crate::exact::ExactFrom;
use crate::head::{encode_break, encode_head, encode_indefinite_head, head_len, MajorType};
use crate::known_tags;
use half::f16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Array,
    Map,
}

struct Frame {
    kind: FrameKind,
    /// Declared item count at `open` time: pairs for a map, elements for an
    /// array. `None` for an indefinite-length aggregate.
    declared: Option<u32>,
    /// How many items (array) or pairs (map) have actually been written.
    written: u32,
    /// For `Map` frames: true when the next write begins a new pair's key.
    at_label: bool,
    /// Offset where the aggregate's content begins, just past its head.
    content_start: usize,
    /// Offset where the key currently being written started.
    key_start: usize,
    /// Offset where the key currently being written ended (value starts).
    key_end: usize,
    /// `(key_start, key_end, pair_end)` for each pair written so far, kept
    /// only when `SORT_MAPS` is set so `close_map` can reorder them.
    entry_spans: Vec<(usize, usize, usize)>,
}

/// A streaming CBOR encoder over a caller-supplied output buffer (§4.11).
///
/// Dual of [`crate::decode::Decoder`]: callers open and close arrays/maps
/// explicitly instead of the decoder's automatic descend/ascend, and every
/// typed writer emits the shortest (preferred) head for its argument,
/// matching canonical form unconditionally — there is no
/// "non-preferred-but-valid" output mode to opt out of.
pub struct Encoder<'a> {
    out: &'a mut [u8],
    pos: usize,
    config: EncoderConfig,
    nesting: Vec<Frame>,
}

impl<'a> Encoder<'a> {
    pub fn new(out: &'a mut [u8], config: EncoderConfig) -> Self {
        Self { out, pos: 0, config, nesting: Vec::new() }
    }

    /// Bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.out[..self.pos]
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Fails if any array or map opened with this encoder is still open.
    pub fn finish(&self) -> Result<()> {
        if !self.nesting.is_empty() {
            return Err(Error::ArrayOrMapStillOpen);
        }
        Ok(())
    }

    fn reserve(&mut self, len: usize) -> Result<usize> {
        if self.pos + len > self.out.len() {
            return Err(Error::BufferTooSmall(len, self.out.len() - self.pos));
        }
        let at = self.pos;
        self.pos += len;
        Ok(at)
    }

    fn write_head(&mut self, major: MajorType, arg: u64) -> Result<()> {
        let len = head_len(arg);
        let at = self.reserve(len)?;
        encode_head(&mut self.out[at..at + len], major, arg)?;
        Ok(())
    }

    fn write_bytes_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let at = self.reserve(bytes.len())?;
        self.out[at..at + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Called before every item-writing method (typed writer or nested
    /// open), so a `Map` frame can remember where the current key began.
    fn enter_item(&mut self) {
        if let Some(frame) = self.nesting.last_mut() {
            if frame.kind == FrameKind::Map && frame.at_label {
                frame.key_start = self.pos;
            }
        }
    }

    /// Called after every item-writing method finishes, to advance the
    /// enclosing frame's bookkeeping (§4.11 "close-count validation").
    fn leave_item(&mut self) {
        let sort_maps = self.config.flags.contains(EncoderFlags::SORT_MAPS);
        let pos = self.pos;
        if let Some(frame) = self.nesting.last_mut() {
            match frame.kind {
                FrameKind::Array => {
                    frame.written += 1;
                }
                FrameKind::Map => {
                    if frame.at_label {
                        frame.key_end = pos;
                        frame.at_label = false;
                    } else {
                        frame.written += 1;
                        frame.at_label = true;
                        if sort_maps {
                            frame.entry_spans.push((frame.key_start, frame.key_end, pos));
                        }
                    }
                }
            }
        }
    }

    // -- aggregates -----------------------------------------------------

    /// Opens a definite-length array of `count` elements (§4.11).
    pub fn open_array(&mut self, count: u32) -> Result<()> {
        self.enter_item();
        self.write_head(MajorType::Array, count as u64)?;
        let content_start = self.pos;
        self.nesting.push(Frame {
            kind: FrameKind::Array,
            declared: Some(count),
            written: 0,
            at_label: false,
            content_start,
            key_start: 0,
            key_end: 0,
            entry_spans: Vec::new(),
        });
        Ok(())
    }

    /// Opens an indefinite-length array, closed the same way as a definite
    /// one, by `close_array`.
    pub fn open_array_indefinite(&mut self) -> Result<()> {
        self.enter_item();
        let at = self.reserve(1)?;
        encode_indefinite_head(&mut self.out[at..at + 1], MajorType::Array)?;
        let content_start = self.pos;
        self.nesting.push(Frame {
            kind: FrameKind::Array,
            declared: None,
            written: 0,
            at_label: false,
            content_start,
            key_start: 0,
            key_end: 0,
            entry_spans: Vec::new(),
        });
        Ok(())
    }

    pub fn close_array(&mut self) -> Result<()> {
        self.close_frame(FrameKind::Array)
    }

    /// Opens a definite-length map of `pairs` key/value pairs. Keys and
    /// values are written with the same typed writers used for top-level or
    /// array items; the encoder alternates key/value interpretation
    /// internally.
    pub fn open_map(&mut self, pairs: u32) -> Result<()> {
        self.enter_item();
        self.write_head(MajorType::Map, pairs as u64)?;
        let content_start = self.pos;
        self.nesting.push(Frame {
            kind: FrameKind::Map,
            declared: Some(pairs),
            written: 0,
            at_label: true,
            content_start,
            key_start: content_start,
            key_end: content_start,
            entry_spans: Vec::new(),
        });
        Ok(())
    }

    pub fn open_map_indefinite(&mut self) -> Result<()> {
        self.enter_item();
        let at = self.reserve(1)?;
        encode_indefinite_head(&mut self.out[at..at + 1], MajorType::Map)?;
        let content_start = self.pos;
        self.nesting.push(Frame {
            kind: FrameKind::Map,
            declared: None,
            written: 0,
            at_label: true,
            content_start,
            key_start: content_start,
            key_end: content_start,
            entry_spans: Vec::new(),
        });
        Ok(())
    }

    /// Closes a map, failing with [`Error::CloseMismatch`] if the declared
    /// pair count wasn't matched exactly, or if a key was written without a
    /// matching value. When `SORT_MAPS` is enabled, reorders the pairs just
    /// written into canonical order (shorter encoded key first, then
    /// bytewise) before returning.
    pub fn close_map(&mut self) -> Result<()> {
        {
            let frame = self.nesting.last().ok_or(Error::TooManyCloses)?;
            if frame.kind != FrameKind::Map {
                return Err(Error::CloseMismatch);
            }
            if !frame.at_label {
                return Err(Error::CloseMismatch);
            }
        }
        if self.config.flags.contains(EncoderFlags::SORT_MAPS) {
            self.sort_current_map()?;
        }
        self.close_frame(FrameKind::Map)
    }

    fn sort_current_map(&mut self) -> Result<()> {
        let frame = self.nesting.last().expect("checked by caller");
        let content_start = frame.content_start;
        let content_end = self.pos;
        let mut spans = frame.entry_spans.clone();
        spans.sort_by(|a, b| {
            let ak = &self.out[a.0..a.1];
            let bk = &self.out[b.0..b.1];
            ak.len().cmp(&bk.len()).then_with(|| ak.cmp(bk))
        });
        let mut scratch = Vec::with_capacity(content_end - content_start);
        for (start, _, end) in &spans {
            scratch.extend_from_slice(&self.out[*start..*end]);
        }
        self.out[content_start..content_end].copy_from_slice(&scratch);
        Ok(())
    }

    fn close_frame(&mut self, expected: FrameKind) -> Result<()> {
        let frame = self.nesting.pop().ok_or(Error::TooManyCloses)?;
        if frame.kind != expected {
            self.nesting.push(frame);
            return Err(Error::CloseMismatch);
        }
        match frame.declared {
            Some(n) if n == frame.written => {}
            Some(_) => return Err(Error::CloseMismatch),
            None => {
                let at = self.reserve(1)?;
                encode_break(&mut self.out[at..at + 1])?;
            }
        }
        self.leave_item();
        Ok(())
    }

    // -- scalars ----------------------------------------------------------

    /// Writes a tag number as a prefix of the item written immediately
    /// after it. Multiple calls stack, innermost tag written last (§4.4).
    /// Does not itself count as an item for the enclosing aggregate — only
    /// the content item that follows does.
    pub fn write_tag_number(&mut self, tag: u64) -> Result<()> {
        self.write_head(MajorType::Tagged, tag)
    }

    pub fn write_int(&mut self, value: i64) -> Result<()> {
        self.enter_item();
        if value >= 0 {
            self.write_head(MajorType::Unsigned, value as u64)?;
        } else {
            self.write_head(MajorType::Negative, (-1 - value) as u64)?;
        }
        self.leave_item();
        Ok(())
    }

    pub fn write_uint(&mut self, value: u64) -> Result<()> {
        self.enter_item();
        self.write_head(MajorType::Unsigned, value)?;
        self.leave_item();
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.enter_item();
        self.write_head(MajorType::ByteString, bytes.len() as u64)?;
        self.write_bytes_raw(bytes)?;
        self.leave_item();
        Ok(())
    }

    pub fn write_text(&mut self, text: &str) -> Result<()> {
        self.enter_item();
        self.write_head(MajorType::Text, text.len() as u64)?;
        self.write_bytes_raw(text.as_bytes())?;
        self.leave_item();
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.enter_item();
        let at = self.reserve(1)?;
        self.out[at] = 0xf4 | (value as u8);
        self.leave_item();
        Ok(())
    }

    pub fn write_null(&mut self) -> Result<()> {
        self.enter_item();
        let at = self.reserve(1)?;
        self.out[at] = 0xf6;
        self.leave_item();
        Ok(())
    }

    pub fn write_undefined(&mut self) -> Result<()> {
        self.enter_item();
        let at = self.reserve(1)?;
        self.out[at] = 0xf7;
        self.leave_item();
        Ok(())
    }

    pub fn write_simple(&mut self, value: u8) -> Result<()> {
        self.enter_item();
        if value < 20 {
            let at = self.reserve(1)?;
            self.out[at] = 0xe0 | value;
        } else {
            let at = self.reserve(2)?;
            self.out[at] = 0xf8;
            self.out[at + 1] = value;
        }
        self.leave_item();
        Ok(())
    }

    /// Writes `value` using the shortest of half/single/double precision
    /// that represents it exactly (§4.11, §6 canonical form).
    pub fn write_float(&mut self, value: f64) -> Result<()> {
        self.enter_item();
        if let Some(h) = f16::exact_from_f64(value) {
            let at = self.reserve(3)?;
            self.out[at] = 0xf9;
            self.out[at + 1..at + 3].copy_from_slice(&h.to_bits().to_be_bytes());
        } else if let Some(s) = f32::exact_from_f64(value) {
            let at = self.reserve(5)?;
            self.out[at] = 0xfa;
            self.out[at + 1..at + 5].copy_from_slice(&s.to_bits().to_be_bytes());
        } else {
            let at = self.reserve(9)?;
            self.out[at] = 0xfb;
            self.out[at + 1..at + 9].copy_from_slice(&value.to_bits().to_be_bytes());
        }
        self.leave_item();
        Ok(())
    }

    // -- tagged convenience writers, dual of `spiffy.rs` -------------------

    pub fn write_date_epoch(&mut self, seconds: f64) -> Result<()> {
        self.write_tag_number(known_tags::DATE_EPOCH)?;
        self.write_float(seconds)
    }

    pub fn write_days_epoch(&mut self, days: i64) -> Result<()> {
        self.write_tag_number(known_tags::DAYS_EPOCH)?;
        self.write_int(days)
    }

    pub fn write_uri(&mut self, uri: &str) -> Result<()> {
        self.write_tag_number(known_tags::URI)?;
        self.write_text(uri)
    }

    pub fn write_uuid(&mut self, bytes: &[u8; 16]) -> Result<()> {
        self.write_tag_number(known_tags::BINARY_UUID)?;
        self.write_bytes(bytes)
    }

    pub fn write_wrapped_cbor(&mut self, encoded: &[u8]) -> Result<()> {
        self.write_tag_number(known_tags::WRAPPED_CBOR)?;
        self.write_bytes(encoded)
    }
}
