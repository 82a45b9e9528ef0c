import_stdlib!();

/// Every way a `Decoder` or `Encoder` operation can fail.
///
/// The variants are grouped the way the core's error taxonomy groups them:
/// well-formedness, supportability, structural limits, aggregate balance,
/// lookup, type mismatches, domain (date/number) overflow, resource
/// exhaustion, conformance, and tag-content callback failure. See
/// [`Error::is_recoverable`] for which of these leave the decoder's cursor
/// in a usable state.
///
/// ```
/// use cbor_core::prelude::*;
///
/// let err = Error::UnexpectedType;
/// assert!(err.to_string().contains("expected type"));
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, Clone, ThisError)]
pub enum Error {
    // --- Well-formedness --------------------------------------------------
    /// A CBOR major-7 additional-info value has no defined meaning.
    #[error("unsupported major-7 additional-info value {0}")]
    BadType7(u8),
    /// There was more input after the item the caller asked to decode.
    #[error("{0} extra bytes past the end of the decoded item")]
    ExtraBytes(usize),
    /// A chunk of an indefinite-length string had the wrong major type, or
    /// was itself of indefinite length.
    #[error("indefinite-length string chunk was malformed")]
    IndefiniteStringChunk,
    /// A break (0xff) appeared where no indefinite-length aggregate was open.
    #[error("break encountered outside an indefinite-length aggregate")]
    BadBreak,
    /// The input ended before a complete item could be decoded.
    #[error("early end of CBOR input")]
    HitEnd,
    /// An integer argument was not encoded in its minimal (preferred) form.
    #[error("integer argument was not minimally encoded")]
    BadInteger,

    // --- Supportability -----------------------------------------------
    /// Reserved additional-info value 28, 29, or 30.
    #[error("reserved additional-info value {0} is not supported")]
    Unsupported(u8),
    /// Tag numbers are disabled by decoder configuration.
    #[error("tag numbers are disabled by decoder configuration")]
    TagsDisabled,
    /// Indefinite-length arrays/maps are disabled by decoder configuration.
    #[error(
        "indefinite-length arrays/maps are disabled by decoder configuration"
    )]
    IndefArraysDisabled,
    /// Indefinite-length strings are disabled by decoder configuration.
    #[error("indefinite-length strings are disabled by decoder configuration")]
    IndefStringsDisabled,
    /// All floating point is disabled by decoder configuration.
    #[error("floating point values are disabled by decoder configuration")]
    AllFloatDisabled,
    /// Half-precision float support is disabled by decoder configuration.
    #[error("half-precision floats are disabled by decoder configuration")]
    HalfPrecisionDisabled,
    /// Hardware float widening is disabled (native width only) at build time.
    #[error("hardware float conversions are disabled at build time")]
    HwFloatDisabled,

    // --- Structural limits --------------------------------------------
    /// Array/map nesting exceeded the configured maximum depth.
    #[error("array/map nesting exceeded the configured maximum depth ({0})")]
    ArrayNestingTooDeep(usize),
    /// An array or map claimed more items than the configured maximum.
    #[error("array/map item count {0} exceeds the configured maximum ({1})")]
    ArrayTooLong(u64, u64),
    /// More tag numbers were stacked on one item than the configured maximum.
    #[error("more than {0} tag numbers were stacked on one item")]
    TooManyTags(usize),
    /// A string's length exceeds what the host index type can represent.
    #[error("string length {0} is too long to index")]
    StringTooLong(u64),
    /// The input buffer is larger than the decoder supports.
    #[error("input length {0} exceeds the maximum supported ({1})")]
    InputTooLarge(usize, usize),

    // --- Aggregate balance ----------------------------------------------
    /// The caller asked for a top-level decode but an aggregate was left open.
    #[error("an array or map was left open at end of decode")]
    ArrayOrMapStillOpen,
    /// The encoder's close count didn't match the open count at this level.
    #[error(
        "close() call did not match the count of items opened at this level"
    )]
    CloseMismatch,
    /// The encoder received more `close()` calls than `open()` calls.
    #[error("close() called with no matching open aggregate")]
    TooManyCloses,
    /// A bounded region (entered explicitly) was not fully consumed on exit.
    #[error(
        "a bounded array or map region was not fully consumed before exit"
    )]
    ArrayOrMapUnconsumed,

    // --- Lookup ----------------------------------------------------------
    /// A map-search template did not match any label in the current map.
    #[error("label not found in current map")]
    LabelNotFound,
    /// Two entries in a decoded map carried the same label.
    #[error("duplicate label in decoded map")]
    DuplicateLabel,
    /// An operation that requires a bounded map was called outside one.
    #[error("no map has been entered")]
    MapNotEntered,
    /// The current bounded aggregate is not a map.
    #[error("current bounded aggregate is not a map")]
    NotAMap,
    /// A map label's type was not one of the types the decoder allows.
    #[error("map label type is not allowed by decoder configuration")]
    MapLabelType,

    // --- Type --------------------------------------------------------
    /// The decoded item's type did not match what the caller required.
    #[error("decoded item did not have the expected type")]
    UnexpectedType,
    /// The decoded item carried a tag number different from what was required.
    #[error("expected tag number {0}, found {1}")]
    UnexpectedTagNumber(u64, u64),
    /// A `Require`d tag number was absent from the item.
    #[error("expected tag number {0} but item carried none")]
    MissingTagNumber(u64),
    /// The item still carried tag numbers that no cursor call or callback
    /// consumed.
    #[error("item has unprocessed tag numbers")]
    UnprocessedTagNumber,
    /// A decimal-fraction/bigfloat's `[exponent, mantissa]` array was malformed.
    #[error("exponent/mantissa array was malformed")]
    BadExpAndMantissa,

    // --- Domain --------------------------------------------------------
    /// An epoch-date float was NaN, infinite, or otherwise out of range.
    #[error("date value overflowed its representable range")]
    DateOverflow,
    /// A date-string item's content wasn't a valid ISO-8601/RFC-3339 date.
    #[error("could not parse date string")]
    InvalidDateString,
    /// An integer conversion target was too small for the decoded value.
    #[error("integer value out of range for the target type")]
    IntOverflow,
    /// A numeric conversion overflowed or underflowed its target range.
    #[error("numeric conversion overflowed or underflowed")]
    ConversionOverUnderFlow,
    /// A sign conversion (e.g. unsigned to bignum) was not representable.
    #[error("numeric value's sign could not be converted")]
    NumberSignConversion,

    // --- Resource -----------------------------------------------------
    /// The encoder's output buffer was too small for the requested write.
    #[error("output buffer too small ({0} bytes needed, {1} available)")]
    BufferTooSmall(usize, usize),
    /// A requested buffer size exceeds what the allocator can service.
    #[error("requested buffer size {0} is too large")]
    BufferTooLarge(usize),
    /// The string allocator could not satisfy an allocation/reallocation
    /// request.
    #[error("string allocator failed to satisfy allocation of {0} bytes")]
    StringAllocate(usize),
    /// An indefinite-length string was encountered with no allocator
    /// installed.
    #[error("no string allocator installed for indefinite-length string")]
    NoStringAllocator,
    /// The built-in pool allocator's backing buffer is too large or too
    /// small.
    #[error("memory pool size {0} is invalid")]
    MemPoolSize(usize),

    // --- Conformance ----------------------------------------------------
    /// `ONLY_PREFERRED_NUMBERS` rejected a non-minimal integer/float encoding.
    #[error("value was not encoded in preferred (shortest) form")]
    PreferredConformance,
    /// A dCBOR-restricted simple value, indefinite length, or unreduced float
    /// was encountered while dCBOR conformance is enabled.
    #[error("value violates dCBOR conformance restrictions")]
    DcborConformance,
    /// `ONLY_SORTED_MAPS` rejected a map whose keys were not in canonical
    /// order.
    #[error("map keys are not in canonical sorted order")]
    Unsorted,
    /// `ONLY_REDUCED_FLOATS` was requested but float-reduction support was
    /// compiled out; raised at decoder construction, not per item.
    #[error(
        "cannot honor ONLY_REDUCED_FLOATS: float-reduction support is not compiled in"
    )]
    CantCheckFloatConformance,

    // --- Callback --------------------------------------------------------
    /// A registered tag-content callback returned an error.
    #[error("tag-content callback failed")]
    CallbackFail,
    /// A tag-content callback left the item in a state later stages can't
    /// recover from.
    #[error("tag-content callback produced an unrecoverable item")]
    UnrecoverableTagContent,

    /// A caller-supplied message not otherwise covered above.
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Whether the decoder's cursor is still usable after this error.
    ///
    /// Type and label mismatches and out-of-range conversions are
    /// recoverable: the item that failed can be skipped and the cursor
    /// advanced to the next one. Truncated input, broken breaks, and
    /// nesting-balance violations are unrecoverable: the traversal state no
    /// longer describes a valid prefix of the document, and further calls on
    /// the same decoder should be treated as no-ops once latched (see
    /// `Decoder::get_next`'s latch field).
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Error::HitEnd
                | Error::BadBreak
                | Error::ArrayNestingTooDeep(_)
                | Error::ArrayOrMapStillOpen
                | Error::CloseMismatch
                | Error::TooManyCloses
                | Error::ArrayOrMapUnconsumed
                | Error::IndefiniteStringChunk
                | Error::NoStringAllocator
                | Error::StringAllocate(_)
                | Error::BufferTooSmall(_, _)
                | Error::BufferTooLarge(_)
                | Error::MemPoolSize(_)
                | Error::CantCheckFloatConformance
                | Error::UnrecoverableTagContent
        )
    }
}

impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Custom(message.to_string())
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Custom(message)
    }
}

pub type Result<T> = StdResult<T, Error>;
