use crate::tag::Tag;
use crate::tags_store::TagsStore;

/// Standard tag numbers the decoder recognizes by default (§6 "Tag number
/// registry").
pub const DATE_TEXT: u64 = 0;
pub const DATE_EPOCH: u64 = 1;
pub const POS_BIGNUM: u64 = 2;
pub const NEG_BIGNUM: u64 = 3;
pub const DECIMAL_FRACTION: u64 = 4;
pub const BIGFLOAT: u64 = 5;
pub const BASE64URL_HINT: u64 = 21;
pub const BASE64_HINT: u64 = 22;
pub const BASE16_HINT: u64 = 23;
pub const WRAPPED_CBOR: u64 = 24;
pub const URI: u64 = 32;
pub const BASE64URL: u64 = 33;
pub const BASE64: u64 = 34;
pub const REGEX: u64 = 35;
pub const MIME: u64 = 36;
pub const BINARY_UUID: u64 = 37;
pub const CWT: u64 = 61;
pub const WRAPPED_CBOR_SEQUENCE: u64 = 63;
pub const DAYS_EPOCH: u64 = 100;
pub const BINARY_MIME: u64 = 257;
pub const DAYS_TEXT: u64 = 1004;
pub const SELF_DESCRIBE_CBOR: u64 = 55799;

/// Builds a [`TagsStore`] pre-populated with the names of every tag number
/// in §6's registry, for use by diagnostic notation and error messages.
pub fn standard_tags() -> TagsStore {
    TagsStore::new([
        Tag::new_with_static_name(DATE_TEXT, "date"),
        Tag::new_with_static_name(DATE_EPOCH, "epoch-date"),
        Tag::new_with_static_name(POS_BIGNUM, "pos-bignum"),
        Tag::new_with_static_name(NEG_BIGNUM, "neg-bignum"),
        Tag::new_with_static_name(DECIMAL_FRACTION, "decimal-fraction"),
        Tag::new_with_static_name(BIGFLOAT, "bigfloat"),
        Tag::new_with_static_name(BASE64URL_HINT, "base64url-hint"),
        Tag::new_with_static_name(BASE64_HINT, "base64-hint"),
        Tag::new_with_static_name(BASE16_HINT, "base16-hint"),
        Tag::new_with_static_name(WRAPPED_CBOR, "wrapped-cbor"),
        Tag::new_with_static_name(URI, "uri"),
        Tag::new_with_static_name(BASE64URL, "base64url"),
        Tag::new_with_static_name(BASE64, "base64"),
        Tag::new_with_static_name(REGEX, "regex"),
        Tag::new_with_static_name(MIME, "mime"),
        Tag::new_with_static_name(BINARY_UUID, "uuid"),
        Tag::new_with_static_name(CWT, "cwt"),
        Tag::new_with_static_name(WRAPPED_CBOR_SEQUENCE, "wrapped-cbor-sequence"),
        Tag::new_with_static_name(DAYS_EPOCH, "epoch-days"),
        Tag::new_with_static_name(BINARY_MIME, "binary-mime"),
        Tag::new_with_static_name(DAYS_TEXT, "days"),
        Tag::new_with_static_name(SELF_DESCRIBE_CBOR, "self-describe-cbor"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags_store::TagsStoreTrait;

    #[test]
    fn standard_tags_are_named() {
        let tags = standard_tags();
        assert_eq!(tags.name_for_value(DATE_EPOCH), "epoch-date");
        assert_eq!(tags.name_for_value(BINARY_UUID), "uuid");
        assert_eq!(tags.name_for_value(999), "999");
    }
}
