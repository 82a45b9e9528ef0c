use crate::import_stdlib;
import_stdlib!();

use crate::error::{Error, Result};
use crate::item::{Count, Label};

/// Default maximum nesting depth (§5 "Limits").
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// The kind of aggregate a [`Frame`] was opened for (§3 "Decoder nesting
/// stack").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Array,
    Map,
    /// A map traversed under `MAP_AS_ARRAY` (§6): counted like an array
    /// (2×entries) but remembered as having originated from a map so
    /// diagnostics can say so.
    MapAsArray,
    /// A byte string entered via `enter_bstr_wrapped` (§4.12).
    BstrWrapped,
}

/// One entry in the decoder's nesting stack (§3).
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub kind: FrameKind,
    pub count: Count,
    /// Set once a caller has explicitly entered this frame (`enter`,
    /// `enter_bstr_wrapped`); ascent stops here until the matching `exit`.
    pub bounded: bool,
    /// For `BstrWrapped` frames, the input buffer's end before entry, so it
    /// can be restored by `exit_bstr_wrapped` (§4.12).
    pub saved_input_end: Option<usize>,
    /// The previous pair's label in a `Map` frame, kept so `ONLY_SORTED_MAPS`
    /// (§6) can check canonical order and duplicate labels without
    /// re-decoding earlier entries.
    pub last_label: Option<Label<'a>>,
    /// Input offset of the first raw sub-item of this aggregate (just past
    /// its head), so map search (§4.10) can rewind to the beginning.
    pub content_start: usize,
    /// The frame's `count` as it was at `descend` time, before any
    /// decrements; map search (§4.10) uses this to know how far it can scan.
    pub initial_count: Count,
}

impl<'a> Frame<'a> {
    fn remaining(&self) -> Option<u32> {
        match self.count {
            Count::Definite(n) => Some(n),
            Count::Indefinite => None,
        }
    }

    fn decrement(&mut self) {
        if let Count::Definite(n) = self.count {
            self.count = Count::Definite(n.saturating_sub(1));
        }
    }

    fn is_definite_complete(&self) -> bool {
        matches!(self.remaining(), Some(0))
    }
}

/// A bounded-depth stack of open aggregates (§3 "Decoder nesting stack",
/// §4.6 "Traversal ascent/descent").
///
/// Depth is fixed at construction (default [`DEFAULT_MAX_DEPTH`]) and the
/// stack lives on the decoder itself rather than the heap, matching the
/// no-allocation-in-the-hot-path requirement; pushing past the configured
/// depth is the only way `descend` fails.
#[derive(Debug, Clone)]
pub struct NestingStack<'a> {
    frames: Vec<Frame<'a>>,
    max_depth: usize,
}

impl<'a> NestingStack<'a> {
    pub fn new(max_depth: usize) -> Self {
        Self { frames: Vec::with_capacity(max_depth), max_depth }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn current(&self) -> Option<&Frame<'a>> {
        self.frames.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut Frame<'a>> {
        self.frames.last_mut()
    }

    /// Pushes a new frame, descending into a newly opened aggregate (§4.6).
    pub fn descend(
        &mut self,
        kind: FrameKind,
        count: Count,
        bounded: bool,
        saved_input_end: Option<usize>,
        content_start: usize,
    ) -> Result<()> {
        if self.frames.len() >= self.max_depth {
            return Err(Error::ArrayNestingTooDeep(self.max_depth));
        }
        self.frames.push(Frame {
            kind,
            count,
            bounded,
            saved_input_end,
            last_label: None,
            content_start,
            initial_count: count,
        });
        Ok(())
    }

    /// Called after an atomic (non-aggregate) item was produced: decrements
    /// the current frame's remaining count and ascends out of any frames
    /// whose definite count has reached zero. Ascent stops at a bounded
    /// frame. Returns the next nesting level, or 0 if a bounded region has
    /// just ended.
    pub fn ascend_after_item(&mut self) -> usize {
        self.settle()
    }

    /// Called after a break marker (0xFF) closed the innermost indefinite
    /// aggregate (§4.6). The caller is responsible for having verified a
    /// matching indefinite frame exists.
    pub fn close_indefinite(&mut self) -> Result<()> {
        match self.frames.last() {
            Some(f) if matches!(f.count, Count::Indefinite) => {
                self.frames.pop();
                Ok(())
            }
            _ => Err(Error::BadBreak),
        }
    }

    fn settle(&mut self) -> usize {
        if let Some(frame) = self.frames.last_mut() {
            frame.decrement();
        }
        loop {
            match self.frames.last() {
                Some(frame) if frame.is_definite_complete() => {
                    let bounded = frame.bounded;
                    self.frames.pop();
                    if bounded {
                        return 0;
                    }
                    if let Some(parent) = self.frames.last_mut() {
                        parent.decrement();
                    }
                }
                _ => break,
            }
        }
        self.frames.len()
    }

    /// Explicitly exits a bounded frame entered via `enter`/`enter_bstr_wrapped`.
    /// Fails with [`Error::ArrayOrMapUnconsumed`] if the frame still has
    /// unconsumed definite items.
    pub fn exit_bounded(&mut self, expected: FrameKind) -> Result<Option<usize>> {
        match self.frames.last() {
            Some(f) if f.bounded && f.kind == expected => {
                if matches!(f.remaining(), Some(n) if n > 0) {
                    return Err(Error::ArrayOrMapUnconsumed);
                }
                let saved = f.saved_input_end;
                self.frames.pop();
                if let Some(parent) = self.frames.last_mut() {
                    parent.decrement();
                }
                Ok(saved)
            }
            Some(_) => Err(Error::NotAMap),
            None => Err(Error::MapNotEntered),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descend_respects_max_depth() {
        let mut stack = NestingStack::new(2);
        stack.descend(FrameKind::Array, Count::Indefinite, false, None, 0).unwrap();
        stack.descend(FrameKind::Array, Count::Indefinite, false, None, 0).unwrap();
        assert!(stack.descend(FrameKind::Array, Count::Indefinite, false, None, 0).is_err());
    }

    #[test]
    fn definite_ascend_cascades() {
        let mut stack = NestingStack::new(10);
        stack.descend(FrameKind::Array, Count::Definite(1), false, None, 0).unwrap();
        stack.descend(FrameKind::Array, Count::Definite(1), false, None, 0).unwrap();
        // innermost array has one item; producing it empties both frames.
        let level = stack.ascend_after_item();
        assert_eq!(level, 0);
        assert!(stack.is_empty());
    }

    #[test]
    fn bounded_frame_stops_ascent() {
        let mut stack = NestingStack::new(10);
        stack.descend(FrameKind::Array, Count::Definite(1), true, None, 0).unwrap();
        let level = stack.ascend_after_item();
        assert_eq!(level, 0);
        // frame is still present; caller must exit explicitly.
        assert_eq!(stack.depth(), 1);
        stack.exit_bounded(FrameKind::Array).unwrap();
        assert!(stack.is_empty());
    }
}
