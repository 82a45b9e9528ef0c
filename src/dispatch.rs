use crate::import_stdlib;
import_stdlib!();

use crate::decode::Decoder;
use crate::error::{Error, Result};
use crate::item::{Count, Item, ItemCase, Mantissa};
use crate::known_tags;

/// A registered tag-content callback (§4.8).
///
/// Receives the owning decoder (so callbacks like exponent/mantissa can pull
/// further raw items out of the tag's content), the tag number that matched,
/// and the item with that tag number already popped off its stack. Returns
/// the item with its case replaced by the typed result.
pub type TagCallback = for<'a> fn(&mut Decoder<'a>, u64, Item<'a>) -> Result<Item<'a>>;

/// A table of `(tag-number, callback)` pairs a [`Decoder`] consults after
/// producing each top-level item (§4.8).
#[derive(Clone, Default)]
pub struct DispatchTable {
    entries: Vec<(u64, TagCallback)>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Registers `callback` for `tag`, replacing any previous registration.
    pub fn register(&mut self, tag: u64, callback: TagCallback) {
        if let Some(existing) = self.entries.iter_mut().find(|(t, _)| *t == tag) {
            existing.1 = callback;
        } else {
            self.entries.push((tag, callback));
        }
    }

    pub(crate) fn lookup(&self, tag: u64) -> Option<TagCallback> {
        self.entries.iter().find(|(t, _)| *t == tag).map(|(_, c)| *c)
    }
}

/// Builds the dispatch table for every tag number §6's registry defines a
/// content transform for: epoch-date, epoch-days, the string-content family
/// (date-text, days-text, URI, regex, MIME, base64/base64url, bignums,
/// wrapped CBOR), and exponent/mantissa (decimal-fraction, bigfloat).
///
/// Tags 21–23 (conversion hints), 61 (CWT), and 55799 (self-describe) are
/// left unregistered — the registry names them but defines no item-level
/// transform for them; they stay on the tag stack for the caller.
pub fn standard_dispatch_table() -> DispatchTable {
    let mut table = DispatchTable::new();
    table.register(known_tags::DATE_EPOCH, epoch_date_callback);
    table.register(known_tags::DAYS_EPOCH, epoch_days_callback);
    for tag in [
        known_tags::DATE_TEXT,
        known_tags::DAYS_TEXT,
        known_tags::URI,
        known_tags::REGEX,
        known_tags::MIME,
        known_tags::BASE64,
        known_tags::BASE64URL,
        known_tags::POS_BIGNUM,
        known_tags::NEG_BIGNUM,
        known_tags::BINARY_UUID,
        known_tags::BINARY_MIME,
        known_tags::WRAPPED_CBOR,
        known_tags::WRAPPED_CBOR_SEQUENCE,
    ] {
        table.register(tag, string_content_callback);
    }
    table.register(known_tags::DECIMAL_FRACTION, exponent_mantissa_callback);
    table.register(known_tags::BIGFLOAT, exponent_mantissa_callback);
    table
}

pub(crate) fn epoch_date_callback<'a>(_decoder: &mut Decoder<'a>, _tag: u64, mut item: Item<'a>) -> Result<Item<'a>> {
    let seconds = match item.case {
        ItemCase::SignedInt(n) => n as f64,
        ItemCase::UnsignedInt(_) => return Err(Error::DateOverflow),
        ItemCase::Half(f) | ItemCase::Single(f) | ItemCase::Double(f) => f,
        _ => return Err(Error::UnexpectedType),
    };
    if !seconds.is_finite() {
        return Err(Error::DateOverflow);
    }
    item.case = ItemCase::DateEpoch(seconds);
    Ok(item)
}

pub(crate) fn epoch_days_callback<'a>(_decoder: &mut Decoder<'a>, _tag: u64, mut item: Item<'a>) -> Result<Item<'a>> {
    match item.case {
        ItemCase::SignedInt(n) => {
            item.case = ItemCase::DaysEpoch(n);
            Ok(item)
        }
        _ => Err(Error::UnexpectedType),
    }
}

pub(crate) fn string_content_callback<'a>(_decoder: &mut Decoder<'a>, tag: u64, mut item: Item<'a>) -> Result<Item<'a>> {
    item.case = match (tag, item.case) {
        (known_tags::DATE_TEXT, ItemCase::TextString(s)) => ItemCase::DateString(s),
        (known_tags::DAYS_TEXT, ItemCase::TextString(s)) => ItemCase::DaysString(s),
        (known_tags::URI, ItemCase::TextString(s)) => ItemCase::Uri(s),
        (known_tags::REGEX, ItemCase::TextString(s)) => ItemCase::Regex(s),
        (known_tags::MIME, ItemCase::TextString(s)) => ItemCase::MimeText(s),
        (known_tags::BASE64, ItemCase::TextString(s)) => ItemCase::Base64(s.as_bytes()),
        (known_tags::BASE64URL, ItemCase::TextString(s)) => ItemCase::Base64Url(s.as_bytes()),
        (known_tags::POS_BIGNUM, ItemCase::ByteString(b)) => ItemCase::PosBignum(b),
        (known_tags::NEG_BIGNUM, ItemCase::ByteString(b)) => ItemCase::NegBignum(b),
        (known_tags::BINARY_UUID, ItemCase::ByteString(b)) if b.len() == 16 => ItemCase::Uuid(b),
        (known_tags::BINARY_MIME, ItemCase::ByteString(b)) => ItemCase::MimeBinary(b),
        (known_tags::WRAPPED_CBOR, ItemCase::ByteString(b)) => ItemCase::WrappedCbor(b),
        (known_tags::WRAPPED_CBOR_SEQUENCE, ItemCase::ByteString(b)) => ItemCase::WrappedCborSequence(b),
        _ => return Err(Error::UnexpectedType),
    };
    Ok(item)
}

/// Decodes the two-element `[exponent, mantissa]` array that tags 4
/// (decimal-fraction) and 5 (bigfloat) wrap, pulling both elements directly
/// off the decoder rather than surfacing the array to the caller.
fn exponent_mantissa_callback<'a>(decoder: &mut Decoder<'a>, tag: u64, item: Item<'a>) -> Result<Item<'a>> {
    if !matches!(item.case, ItemCase::Array(Count::Definite(2))) {
        return Err(Error::BadExpAndMantissa);
    }

    let exponent_item = decoder.decode_tag_layer()?;
    let exponent = match exponent_item.case {
        ItemCase::SignedInt(n) => n,
        _ => return Err(Error::BadExpAndMantissa),
    };

    let mantissa_item = decoder.decode_tag_layer()?;
    let mantissa = match mantissa_item.case {
        ItemCase::SignedInt(n) => Mantissa::Signed(n),
        ItemCase::UnsignedInt(n) => Mantissa::Unsigned(n),
        ItemCase::NegativeBig(n) => Mantissa::NegativeBig(n),
        ItemCase::ByteString(b) => match mantissa_item.tags.get(0, decoder.tag_overflow()) {
            Some(t) if t == known_tags::POS_BIGNUM => Mantissa::PosBignum(b),
            Some(t) if t == known_tags::NEG_BIGNUM => Mantissa::NegBignum(b),
            _ => return Err(Error::BadExpAndMantissa),
        },
        _ => return Err(Error::BadExpAndMantissa),
    };

    let mut result = item;
    result.case = if tag == known_tags::DECIMAL_FRACTION {
        ItemCase::DecimalFraction { exponent, mantissa }
    } else {
        ItemCase::BigFloat { exponent, mantissa }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::DecoderConfig;

    fn decoder(bytes: &[u8]) -> Decoder<'_> {
        let mut d = Decoder::new(bytes, DecoderConfig::default()).unwrap();
        d.set_dispatch_table(standard_dispatch_table());
        d
    }

    #[test]
    fn epoch_date_promotes_unsigned_integer() {
        // tag 1, unsigned 1509928128
        let bytes = [0xc1, 0x1a, 0x5a, 0x0b, 0xe0, 0xc0];
        let mut d = decoder(&bytes);
        let item = d.get_next().unwrap();
        assert!(matches!(item.case, ItemCase::DateEpoch(s) if s == 1_509_928_128.0));
        assert!(item.tags.is_empty());
    }

    #[test]
    fn uri_text_is_promoted() {
        // tag 32, "a:"
        let bytes = [0xd8, 0x20, 0x62, b'a', b':'];
        let mut d = decoder(&bytes);
        let item = d.get_next().unwrap();
        assert!(matches!(item.case, ItemCase::Uri(s) if s == "a:"));
    }

    #[test]
    fn decimal_fraction_reads_exponent_and_mantissa() {
        // tag 4, [-2, 27315] == 273.15
        let bytes = [0xc4, 0x82, 0x21, 0x19, 0x6a, 0xb3];
        let mut d = decoder(&bytes);
        let item = d.get_next().unwrap();
        match item.case {
            ItemCase::DecimalFraction { exponent, mantissa } => {
                assert_eq!(exponent, -2);
                assert!(matches!(mantissa, Mantissa::Signed(27315)));
            }
            other => panic!("unexpected case: {other:?}"),
        }
        d.finish().unwrap();
    }

    #[test]
    fn unrecognized_tag_stays_on_stack() {
        let bytes = [0xd9, 0x04, 0xd2, 0x01]; // tag 1234, int 1
        let mut d = decoder(&bytes);
        let item = d.get_next().unwrap();
        assert!(matches!(item.case, ItemCase::SignedInt(1)));
        assert_eq!(item.tags.get(0, d.tag_overflow()), Some(1234));
    }
}
