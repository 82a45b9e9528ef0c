use crate::conformance::DecoderFlags;
use crate::decode::Decoder;
use crate::dispatch::{epoch_date_callback, epoch_days_callback, string_content_callback};
use crate::error::{Error, Result};
use crate::item::{Item, ItemCase, Label};
use crate::known_tags;

/// How strictly a spiffy accessor checks the tag number on the item it reads
/// (§4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRequirement {
    /// The item must carry exactly this tag number as its innermost tag.
    Require(u64),
    /// The item must carry no tag number at all.
    NotATag,
    /// If a tag number is present it must be this one; an untagged item is
    /// also accepted.
    Optional(u64),
    /// Accept whatever tag number (or none) is present, without applying any
    /// content callback — the item's raw case is returned as-is.
    AllowAdditional,
}

impl<'a> Decoder<'a> {
    fn verify_tag_requirement(&self, item: &Item<'a>, req: TagRequirement) -> Result<()> {
        let innermost = item.tags().get(0, self.tag_overflow());
        match req {
            TagRequirement::NotATag => {
                if innermost.is_some() {
                    return Err(Error::UnexpectedType);
                }
            }
            TagRequirement::Require(expected) => match innermost {
                Some(t) if t == expected => {}
                Some(t) => return Err(Error::UnexpectedTagNumber(expected, t)),
                None => return Err(Error::MissingTagNumber(expected)),
            },
            TagRequirement::Optional(expected) => {
                if let Some(t) = innermost {
                    if t != expected {
                        return Err(Error::UnexpectedTagNumber(expected, t));
                    }
                }
            }
            TagRequirement::AllowAdditional => {}
        }
        Ok(())
    }

    /// Applies a single tag-content callback to `item` if its innermost tag
    /// is `expected_tag`, mirroring what `run_dispatch` (§4.8) would do for
    /// that one tag — used so a spiffy accessor gets the same typed content
    /// whether or not a dispatch table happens to be installed.
    fn apply_tag_callback(
        &mut self,
        mut item: Item<'a>,
        expected_tag: u64,
        callback: fn(&mut Decoder<'a>, u64, Item<'a>) -> Result<Item<'a>>,
    ) -> Result<Item<'a>> {
        if item.tags().get(0, self.tag_overflow()) == Some(expected_tag) {
            item.tags.pop_innermost(self.tag_overflow());
            item = callback(self, expected_tag, item)?;
        }
        Ok(item)
    }

    fn check_unprocessed(&self, item: &Item<'a>) -> Result<()> {
        if !self.config().flags.contains(DecoderFlags::ALLOW_UNPROCESSED_TAG_NUMBERS) && !item.tags().is_empty() {
            return Err(Error::UnprocessedTagNumber);
        }
        Ok(())
    }

    fn next_typed<T>(
        &mut self,
        req: TagRequirement,
        tag: u64,
        callback: fn(&mut Decoder<'a>, u64, Item<'a>) -> Result<Item<'a>>,
        extract: fn(&ItemCase<'a>) -> Option<T>,
    ) -> Result<T> {
        let item = self.get_next_raw()?;
        self.verify_tag_requirement(&item, req)?;
        let item = self.apply_tag_callback(item, tag, callback)?;
        self.check_unprocessed(&item)?;
        extract(item.case()).ok_or(Error::UnexpectedType)
    }

    fn labeled_typed<T>(
        &mut self,
        label: Label<'_>,
        req: TagRequirement,
        tag: u64,
        callback: fn(&mut Decoder<'a>, u64, Item<'a>) -> Result<Item<'a>>,
        extract: fn(&ItemCase<'a>) -> Option<T>,
    ) -> Result<T> {
        let item = self.find_by_label(label)?;
        self.verify_tag_requirement(&item, req)?;
        let item = self.apply_tag_callback(item, tag, callback)?;
        self.check_unprocessed(&item)?;
        extract(item.case()).ok_or(Error::UnexpectedType)
    }
}

/// Declares a trio of accessors (next-in-stream, by-integer-label,
/// by-text-label) for one tag-content kind, each applying the same
/// `TagRequirement` check and tag-content callback (§4.9).
macro_rules! spiffy_accessors {
    ($next:ident, $by_int:ident, $by_text:ident, $tag:expr, $callback:expr, $ret:ty, $pat:pat => $out:expr) => {
        impl<'a> Decoder<'a> {
            #[doc = concat!("Reads the next item in the stream as ", stringify!($next), " (\u{a7}4.9).")]
            pub fn $next(&mut self, req: TagRequirement) -> Result<$ret> {
                self.next_typed(req, $tag, $callback, |case| match case {
                    $pat => Some($out),
                    _ => None,
                })
            }

            #[doc = concat!("Looks up a map entry by integer label and reads it as ", stringify!($next), " (\u{a7}4.9, \u{a7}4.10).")]
            pub fn $by_int(&mut self, label: i64, req: TagRequirement) -> Result<$ret> {
                self.labeled_typed(Label::Signed(label), req, $tag, $callback, |case| match case {
                    $pat => Some($out),
                    _ => None,
                })
            }

            #[doc = concat!("Looks up a map entry by text label and reads it as ", stringify!($next), " (\u{a7}4.9, \u{a7}4.10).")]
            pub fn $by_text(&mut self, label: &str, req: TagRequirement) -> Result<$ret> {
                self.labeled_typed(Label::Text(label), req, $tag, $callback, |case| match case {
                    $pat => Some($out),
                    _ => None,
                })
            }
        }
    };
}

spiffy_accessors!(
    get_next_date_epoch, get_date_epoch_by_int_label, get_date_epoch_by_text_label,
    known_tags::DATE_EPOCH, epoch_date_callback, f64,
    ItemCase::DateEpoch(v) => *v
);

spiffy_accessors!(
    get_next_days_epoch, get_days_epoch_by_int_label, get_days_epoch_by_text_label,
    known_tags::DAYS_EPOCH, epoch_days_callback, i64,
    ItemCase::DaysEpoch(v) => *v
);

spiffy_accessors!(
    get_next_uri, get_uri_by_int_label, get_uri_by_text_label,
    known_tags::URI, string_content_callback, &'a str,
    ItemCase::Uri(s) => *s
);

spiffy_accessors!(
    get_next_regex, get_regex_by_int_label, get_regex_by_text_label,
    known_tags::REGEX, string_content_callback, &'a str,
    ItemCase::Regex(s) => *s
);

spiffy_accessors!(
    get_next_uuid, get_uuid_by_int_label, get_uuid_by_text_label,
    known_tags::BINARY_UUID, string_content_callback, &'a [u8],
    ItemCase::Uuid(b) => *b
);

spiffy_accessors!(
    get_next_wrapped_cbor, get_wrapped_cbor_by_int_label, get_wrapped_cbor_by_text_label,
    known_tags::WRAPPED_CBOR, string_content_callback, &'a [u8],
    ItemCase::WrappedCbor(b) => *b
);

impl<'a> Decoder<'a> {
    /// Reads the next item in the stream as a plain, untagged (or
    /// additional-tags-allowed) text string (§4.9).
    pub fn get_next_text(&mut self, req: TagRequirement) -> Result<&'a str> {
        let item = self.get_next_raw()?;
        self.verify_tag_requirement(&item, req)?;
        self.check_unprocessed(&item)?;
        match item.case() {
            ItemCase::TextString(s) => Ok(s),
            _ => Err(Error::UnexpectedType),
        }
    }

    /// Looks up a map entry by integer label and reads it as a plain text
    /// string (§4.9, §4.10).
    pub fn get_text_by_int_label(&mut self, label: i64, req: TagRequirement) -> Result<&'a str> {
        let item = self.find_by_label(Label::Signed(label))?;
        self.verify_tag_requirement(&item, req)?;
        self.check_unprocessed(&item)?;
        match item.case() {
            ItemCase::TextString(s) => Ok(s),
            _ => Err(Error::UnexpectedType),
        }
    }

    /// Looks up a map entry by text label and reads it as a plain text
    /// string (§4.9, §4.10).
    pub fn get_text_by_text_label(&mut self, label: &str, req: TagRequirement) -> Result<&'a str> {
        let item = self.find_by_label(Label::Text(label))?;
        self.verify_tag_requirement(&item, req)?;
        self.check_unprocessed(&item)?;
        match item.case() {
            ItemCase::TextString(s) => Ok(s),
            _ => Err(Error::UnexpectedType),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::DecoderConfig;

    #[test]
    fn next_in_stream_epoch_date_requires_tag() {
        // tag 1, unsigned 1509928128
        let bytes = [0xc1, 0x1a, 0x5a, 0x0b, 0xe0, 0xc0];
        let mut d = Decoder::new(&bytes, DecoderConfig::default()).unwrap();
        let v = d.get_next_date_epoch(TagRequirement::Require(known_tags::DATE_EPOCH)).unwrap();
        assert_eq!(v, 1_509_928_128.0);
        d.finish().unwrap();
    }

    #[test]
    fn next_in_stream_rejects_wrong_tag() {
        let bytes = [0xc1, 0x1a, 0x5a, 0x0b, 0xe0, 0xc0];
        let mut d = Decoder::new(&bytes, DecoderConfig::default()).unwrap();
        let err = d.get_next_date_epoch(TagRequirement::Require(known_tags::DAYS_EPOCH)).unwrap_err();
        assert!(matches!(err, Error::UnexpectedTagNumber(100, 1)));
    }

    #[test]
    fn missing_tag_number_reported() {
        let bytes = [0x01];
        let mut d = Decoder::new(&bytes, DecoderConfig::default()).unwrap();
        let err = d.get_next_date_epoch(TagRequirement::Require(known_tags::DATE_EPOCH)).unwrap_err();
        assert!(matches!(err, Error::MissingTagNumber(1)));
    }

    #[test]
    fn by_int_label_reads_uri() {
        // {1: 32("a:")}
        let bytes = [0xa1, 0x01, 0xd8, 0x20, 0x62, b'a', b':'];
        let mut d = Decoder::new(&bytes, DecoderConfig::default()).unwrap();
        d.get_next().unwrap();
        d.enter().unwrap();
        let uri = d.get_uri_by_int_label(1, TagRequirement::Require(known_tags::URI)).unwrap();
        assert_eq!(uri, "a:");
    }

    #[test]
    fn by_text_label_reads_plain_text() {
        // {"name": "alice"}
        let bytes = [0xa1, 0x64, b'n', b'a', b'm', b'e', 0x65, b'a', b'l', b'i', b'c', b'e'];
        let mut d = Decoder::new(&bytes, DecoderConfig::default()).unwrap();
        d.get_next().unwrap();
        d.enter().unwrap();
        let name = d.get_text_by_text_label("name", TagRequirement::NotATag).unwrap();
        assert_eq!(name, "alice");
    }

    #[test]
    fn unprocessed_tag_number_rejected_by_default() {
        // tag 1234 wrapping an untagged text string, required as plain text.
        let bytes = [0xd9, 0x04, 0xd2, 0x61, b'x'];
        let mut d = Decoder::new(&bytes, DecoderConfig::default()).unwrap();
        let err = d.get_next_text(TagRequirement::AllowAdditional).unwrap_err();
        assert!(matches!(err, Error::UnprocessedTagNumber));
    }

    #[test]
    fn unprocessed_tag_number_allowed_under_compat_flag() {
        let bytes = [0xd9, 0x04, 0xd2, 0x61, b'x'];
        let mut config = DecoderConfig::default();
        config.flags = DecoderFlags::ALLOW_UNPROCESSED_TAG_NUMBERS;
        let mut d = Decoder::new(&bytes, config).unwrap();
        let s = d.get_next_text(TagRequirement::AllowAdditional).unwrap();
        assert_eq!(s, "x");
    }
}
