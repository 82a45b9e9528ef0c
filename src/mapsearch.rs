use crate::conformance::DecoderFlags;
use crate::decode::Decoder;
use crate::error::{Error, Result};
use crate::item::{Count, Item, Label};
use crate::nesting::FrameKind;

/// Label equality across two possibly-different input lifetimes: the
/// template a caller hands to `find_by_label` rarely borrows from the same
/// buffer as the map being searched.
fn labels_equal(a: &Label<'_>, b: &Label<'_>) -> bool {
    match (a, b) {
        (Label::Signed(x), Label::Signed(y)) => x == y,
        (Label::Unsigned(x), Label::Unsigned(y)) => x == y,
        (Label::Text(x), Label::Text(y)) => x == y,
        (Label::ByteString(x), Label::ByteString(y)) => x == y,
        _ => false,
    }
}

impl<'a> Decoder<'a> {
    /// Searches the current bounded map for an entry whose label matches
    /// `template`, scanning from the beginning of the map regardless of
    /// where the cursor currently sits (§4.10).
    ///
    /// The map must have been entered with [`Decoder::enter`] and must be of
    /// definite length: an indefinite map's total entry count isn't known
    /// without a full traversal, so it's rejected with
    /// [`Error::UnexpectedType`] rather than scanned partially.
    ///
    /// As a side effect, raises [`Error::DuplicateLabel`] if
    /// `ONLY_SORTED_MAPS` is enabled and a second entry with the same label
    /// is found after the first match.
    pub fn find_by_label(&mut self, template: Label<'_>) -> Result<Item<'a>> {
        let frame = self.current_frame().ok_or(Error::MapNotEntered)?;
        if frame.kind != FrameKind::Map {
            return Err(Error::NotAMap);
        }
        if !frame.bounded {
            return Err(Error::MapNotEntered);
        }
        let total_pairs = match frame.initial_count {
            Count::Definite(n) => n / 2,
            Count::Indefinite => return Err(Error::UnexpectedType),
        };
        let content_start = frame.content_start;
        let check_duplicates = self.config().flags.contains(DecoderFlags::ONLY_SORTED_MAPS);

        let saved_pos = self.raw_pos();
        self.set_raw_pos(content_start);

        let mut found: Option<Item<'a>> = None;
        let mut duplicate = false;
        for _ in 0..total_pairs {
            let label_item = self.decode_tag_layer()?;
            let label = Decoder::item_to_label(&label_item)?;
            let value_item = self.decode_tag_layer()?;
            if labels_equal(&label, &template) {
                if found.is_some() {
                    duplicate = true;
                } else {
                    let mut item = value_item;
                    item.label = Some(label);
                    found = Some(item);
                    if !check_duplicates {
                        break;
                    }
                }
            }
        }
        self.set_raw_pos(saved_pos);

        if duplicate && check_duplicates {
            return Err(Error::DuplicateLabel);
        }
        found.ok_or(Error::LabelNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::DecoderConfig;
    use crate::item::ItemCase;

    fn entered_map(bytes: &[u8]) -> Decoder<'_> {
        let mut d = Decoder::new(bytes, DecoderConfig::default()).unwrap();
        d.get_next().unwrap();
        d.enter().unwrap();
        d
    }

    #[test]
    fn finds_entry_by_integer_label_out_of_order() {
        // {1: 10, 2: 20, 3: 30}
        let bytes = [0xa3, 0x01, 0x0a, 0x02, 0x14, 0x03, 0x18, 0x1e];
        let mut d = entered_map(&bytes);
        let item = d.find_by_label(Label::Signed(3)).unwrap();
        assert!(matches!(item.case(), ItemCase::SignedInt(30)));
        // the decoder's real cursor is untouched: normal traversal still
        // starts from the first pair.
        let first = d.get_next().unwrap();
        assert!(matches!(first.label, Some(Label::Signed(1))));
    }

    #[test]
    fn finds_entry_by_text_label() {
        // {"a": 1, "b": 2}
        let bytes = [0xa2, 0x61, b'a', 0x01, 0x61, b'b', 0x02];
        let mut d = entered_map(&bytes);
        let item = d.find_by_label(Label::Text("b")).unwrap();
        assert!(matches!(item.case(), ItemCase::SignedInt(2)));
    }

    #[test]
    fn missing_label_is_reported() {
        let bytes = [0xa1, 0x01, 0x0a];
        let mut d = entered_map(&bytes);
        assert!(matches!(d.find_by_label(Label::Signed(9)), Err(Error::LabelNotFound)));
    }

    #[test]
    fn duplicate_label_rejected_under_sorted_maps() {
        let bytes = [0xa2, 0x01, 0x0a, 0x01, 0x14];
        let mut d = Decoder::new(&bytes, DecoderConfig::default()).unwrap();
        d.get_next().unwrap();
        d.enter().unwrap();
        // ONLY_SORTED_MAPS wasn't set at decode time (so the duplicate wasn't
        // already rejected while coalescing pairs); enable it just for this
        // search to exercise the side-effect check in isolation.
        d.config_mut().flags |= DecoderFlags::ONLY_SORTED_MAPS;
        assert!(matches!(d.find_by_label(Label::Signed(1)), Err(Error::DuplicateLabel)));
    }

    #[test]
    fn indefinite_map_rejected() {
        let bytes = [0xbf, 0x01, 0x0a, 0xff];
        let mut d = Decoder::new(&bytes, DecoderConfig::default()).unwrap();
        d.get_next().unwrap();
        d.enter().unwrap();
        assert!(matches!(d.find_by_label(Label::Signed(1)), Err(Error::UnexpectedType)));
    }
}
