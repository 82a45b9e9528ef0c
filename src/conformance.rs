use crate::import_stdlib;
import_stdlib!();

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::nesting::DEFAULT_MAX_DEPTH;
use crate::tagstack::{DEFAULT_MAX_OVERFLOW_TAGS, MAX_TAGS_PER_ITEM};

bitflags! {
    /// Conformance and mode flags for a [`crate::decode::Decoder`] (§6
    /// "Decoder configuration flags").
    ///
    /// Modeled on QCBOR's OR-able `uint32_t` decode-mode constants; `bitflags`
    /// is the idiomatic Rust rendition of that pattern.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DecoderFlags: u32 {
        /// Reject integers and floats not encoded in their shortest form.
        const ONLY_PREFERRED_NUMBERS = 1 << 0;
        /// Reject floats that have a losslessly shorter representation.
        const ONLY_REDUCED_FLOATS = 1 << 1;
        /// Reject indefinite-length strings and aggregates outright.
        const NO_INDEF_LENGTH = 1 << 2;
        /// Reject simple values outside dCBOR's {false, true, null}, and
        /// `undefined`.
        const DISALLOW_DCBOR_SIMPLES = 1 << 3;
        /// Reject maps whose keys are not in canonical sorted order, or that
        /// contain a duplicate label.
        const ONLY_SORTED_MAPS = 1 << 4;
        /// Surface maps as arrays of 2×entries unlabeled items (§4.2).
        const MAP_AS_ARRAY = 1 << 5;
        /// Restrict map labels to text strings only.
        const MAP_STRINGS_ONLY = 1 << 6;
        /// v1-compatibility: do not raise `unprocessed-tag-number` for tag
        /// numbers left on the stack by the caller (§4.9).
        const ALLOW_UNPROCESSED_TAG_NUMBERS = 1 << 7;
    }
}

impl DecoderFlags {
    /// The flag set implied by "dCBOR" conformance: preferred numbers,
    /// reduced floats, no indefinite lengths, restricted simples, sorted
    /// maps.
    pub fn dcbor() -> Self {
        Self::ONLY_PREFERRED_NUMBERS
            | Self::ONLY_REDUCED_FLOATS
            | Self::NO_INDEF_LENGTH
            | Self::DISALLOW_DCBOR_SIMPLES
            | Self::ONLY_SORTED_MAPS
    }
}

bitflags! {
    /// Conformance flags for a [`crate::encode::Encoder`] (§6, dual of
    /// [`DecoderFlags`]).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EncoderFlags: u32 {
        /// Never emit indefinite-length strings or aggregates.
        const NO_INDEF_LENGTH = 1 << 0;
        /// Sort map entries by encoded key before emitting the map.
        const SORT_MAPS = 1 << 1;
    }
}

/// Runtime limits for a [`crate::decode::Decoder`] (§5 "Limits").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderLimits {
    pub max_nesting_depth: usize,
    pub max_items_per_aggregate: u32,
    pub max_tags_per_item: usize,
    pub max_overflow_tags: usize,
    pub max_input_len: usize,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_DEPTH,
            max_items_per_aggregate: 65_534,
            max_tags_per_item: MAX_TAGS_PER_ITEM,
            max_overflow_tags: DEFAULT_MAX_OVERFLOW_TAGS,
            max_input_len: u32::MAX as usize,
        }
    }
}

/// Bundled configuration for a [`crate::decode::Decoder`] (§6, §9).
///
/// Checked once at construction time, not per item: in particular,
/// requesting `ONLY_REDUCED_FLOATS` when float-reduction support has been
/// compiled out (the `hw-float-disabled`-style build configuration) fails
/// immediately with [`Error::CantCheckFloatConformance`] rather than being
/// silently ignored or raised on the first float encountered, per the §9
/// design note resolving that open question.
#[derive(Debug, Clone, Copy)]
pub struct DecoderConfig {
    pub flags: DecoderFlags,
    pub limits: DecoderLimits,
    /// Whether this build can check lossless float reduction. Always `true`
    /// unless a hypothetical `no-float-reduction` build configuration is in
    /// effect; present so the §9 interaction is a real, testable code path
    /// rather than a permanently-true constant.
    float_reduction_available: bool,
}

impl DecoderConfig {
    pub fn new(flags: DecoderFlags, limits: DecoderLimits) -> Result<Self> {
        let config = Self { flags, limits, float_reduction_available: true };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.flags.contains(DecoderFlags::ONLY_REDUCED_FLOATS) && !self.float_reduction_available {
            return Err(Error::CantCheckFloatConformance);
        }
        Ok(())
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self { flags: DecoderFlags::empty(), limits: DecoderLimits::default(), float_reduction_available: true }
    }
}

/// Bundled configuration for a [`crate::encode::Encoder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EncoderConfig {
    pub flags: EncoderFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dcbor_preset_combines_expected_flags() {
        let flags = DecoderFlags::dcbor();
        assert!(flags.contains(DecoderFlags::ONLY_PREFERRED_NUMBERS));
        assert!(flags.contains(DecoderFlags::ONLY_SORTED_MAPS));
        assert!(!flags.contains(DecoderFlags::MAP_AS_ARRAY));
    }

    #[test]
    fn default_config_validates() {
        assert!(DecoderConfig::new(DecoderFlags::empty(), DecoderLimits::default()).is_ok());
    }
}
