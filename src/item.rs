use crate::import_stdlib;
import_stdlib!();

use crate::tagstack::TagStack;

/// The mantissa half of a decimal-fraction or bigfloat tag-content item
/// (§4.8's exponent/mantissa callback).
///
/// The legacy source carries two incompatible mappings for the case where
/// the mantissa is a 65-bit negative integer: one widens it to its own
/// variant, one folds it into the bignum case. This crate keeps the 65-bit
/// negative case distinct (see `DESIGN.md`) rather than silently coercing it
/// into `NegBignum`, since folding loses the fact that the value came from a
/// plain integer encoding rather than a bignum byte string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mantissa<'a> {
    Signed(i64),
    Unsigned(u64),
    NegativeBig(u64),
    PosBignum(&'a [u8]),
    NegBignum(&'a [u8]),
}

/// The discriminator of a decoded map-entry label.
///
/// §4.5 restricts labels to integer, unsigned, text, and byte string by
/// default; `MAP_STRINGS_ONLY` (§6) narrows this further to text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Label<'a> {
    Signed(i64),
    Unsigned(u64),
    Text(&'a str),
    ByteString(&'a [u8]),
}

/// The remaining-count field of an aggregate item (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    Definite(u32),
    Indefinite,
}

/// The discriminator of a decoded item (§3 "Decoded item").
///
/// Variants above the `-- tag content --` marker are produced directly by
/// the atomic decoder (§4.2); variants below it only ever appear after a
/// registered tag-content callback (§4.8) has run. A caller who registers no
/// callbacks never sees the lower variants — the item stays a plain
/// `ByteString`/`TextString`/`SignedInt` with the tag number still on its
/// stack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemCase<'a> {
    SignedInt(i64),
    UnsignedInt(u64),
    /// Negative integers whose true value needs 65 bits: the raw argument
    /// `n` such that the value is `-(n+1)`.
    NegativeBig(u64),
    ByteString(&'a [u8]),
    TextString(&'a str),
    Array(Count),
    Map(Count),
    /// An array surfaced because `MAP_AS_ARRAY` was set while decoding a map.
    MapAsArray(Count),
    Simple(u8),
    Bool(bool),
    Null,
    Undefined,
    Half(f64),
    Single(f64),
    Double(f64),
    /// The 0xFF marker, consumed internally by the traversal layer (§4.6)
    /// and never surfaced through `Decoder::get_next`.
    Break,

    // -- tag content --
    DateString(&'a str),
    DateEpoch(f64),
    DaysString(&'a str),
    DaysEpoch(i64),
    Uri(&'a str),
    Base64(&'a [u8]),
    Base64Url(&'a [u8]),
    Regex(&'a str),
    MimeText(&'a str),
    MimeBinary(&'a [u8]),
    Uuid(&'a [u8]),
    PosBignum(&'a [u8]),
    NegBignum(&'a [u8]),
    DecimalFraction { exponent: i64, mantissa: Mantissa<'a> },
    BigFloat { exponent: i64, mantissa: Mantissa<'a> },
    WrappedCbor(&'a [u8]),
    WrappedCborSequence(&'a [u8]),
}

impl<'a> ItemCase<'a> {
    /// A short, stable name for this case, used by diagnostic notation and
    /// error messages. Not part of the wire format.
    pub fn type_name(&self) -> &'static str {
        match self {
            ItemCase::SignedInt(_) => "int",
            ItemCase::UnsignedInt(_) => "uint",
            ItemCase::NegativeBig(_) => "negative-big",
            ItemCase::ByteString(_) => "bytes",
            ItemCase::TextString(_) => "text",
            ItemCase::Array(_) => "array",
            ItemCase::Map(_) => "map",
            ItemCase::MapAsArray(_) => "map-as-array",
            ItemCase::Simple(_) => "simple",
            ItemCase::Bool(_) => "bool",
            ItemCase::Null => "null",
            ItemCase::Undefined => "undefined",
            ItemCase::Half(_) => "half",
            ItemCase::Single(_) => "single",
            ItemCase::Double(_) => "double",
            ItemCase::Break => "break",
            ItemCase::DateString(_) => "date-string",
            ItemCase::DateEpoch(_) => "date-epoch",
            ItemCase::DaysString(_) => "days-string",
            ItemCase::DaysEpoch(_) => "days-epoch",
            ItemCase::Uri(_) => "uri",
            ItemCase::Base64(_) => "base64",
            ItemCase::Base64Url(_) => "base64url",
            ItemCase::Regex(_) => "regex",
            ItemCase::MimeText(_) => "mime-text",
            ItemCase::MimeBinary(_) => "mime-binary",
            ItemCase::Uuid(_) => "uuid",
            ItemCase::PosBignum(_) => "pos-bignum",
            ItemCase::NegBignum(_) => "neg-bignum",
            ItemCase::DecimalFraction { .. } => "decimal-fraction",
            ItemCase::BigFloat { .. } => "bigfloat",
            ItemCase::WrappedCbor(_) => "wrapped-cbor",
            ItemCase::WrappedCborSequence(_) => "wrapped-cbor-sequence",
        }
    }

    /// Whether this case is an aggregate that the traversal layer descends
    /// into (§4.6).
    pub fn is_aggregate(&self) -> bool {
        matches!(self, ItemCase::Array(_) | ItemCase::Map(_) | ItemCase::MapAsArray(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ItemCase::Half(_) | ItemCase::Single(_) | ItemCase::Double(_))
    }
}

/// A single decoded CBOR item (§3), borrowed from the decoder's input
/// buffer for its lifetime.
///
/// `Item` is `Copy`: it is a small, POD-like record (discriminator, value
/// payload, optional label, nesting bookkeeping, compressed tag stack) sized
/// to live on the stack, per the "keep the item record POD-copyable" design
/// note. Definite strings borrow directly from the input; indefinite
/// strings borrow from the decoder's installed allocator arena instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item<'a> {
    pub(crate) case: ItemCase<'a>,
    pub(crate) label: Option<Label<'a>>,
    pub(crate) level: usize,
    pub(crate) next_level: usize,
    pub(crate) tags: TagStack,
    pub(crate) offset: usize,
}

impl<'a> Item<'a> {
    pub(crate) fn new(case: ItemCase<'a>, level: usize, offset: usize) -> Self {
        Self { case, label: None, level, next_level: level, tags: TagStack::new(), offset }
    }

    /// The item's discriminator and payload.
    pub fn case(&self) -> &ItemCase<'a> {
        &self.case
    }

    /// The map-entry label this item was found under, if the enclosing
    /// aggregate was a map and not in `MAP_AS_ARRAY` mode (§4.5).
    pub fn label(&self) -> Option<&Label<'a>> {
        self.label.as_ref()
    }

    /// The nesting level of this item (top level = 0).
    pub fn level(&self) -> usize {
        self.level
    }

    /// The nesting level of the item that will be produced next; 0 signals
    /// that a bounded region has just ended (§4.6).
    pub fn next_level(&self) -> usize {
        self.next_level
    }

    /// The byte offset in the input buffer where this item's head began.
    /// Used by the tag-number cursor (§4.7) to detect re-decodes of the same
    /// position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The tag numbers accumulated on this item, innermost first (§4.4).
    pub fn tags(&self) -> &TagStack {
        &self.tags
    }

    pub fn is_aggregate(&self) -> bool {
        self.case.is_aggregate()
    }
}
