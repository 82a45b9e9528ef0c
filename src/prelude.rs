//! Re-exports the crate's public surface for `use cbor_core::prelude::*;`.

pub use crate::{
    standard_dispatch_table, Allocator, BumpAllocator, Count, Decoder,
    DecoderConfig, DecoderFlags, DecoderLimits, DispatchTable, Encoder,
    EncoderConfig, EncoderFlags, Error, FrameKind, Head, Item, ItemCase,
    Label, MajorType, Mantissa, Result, Tag, TagCursor, TagOverflowTable,
    TagRequirement, TagStack, TagsStore, TagsStoreTrait, TagCallback,
};

#[cfg(feature = "std")]
pub use crate::{diagnostic, diagnostic_annotated, hex, hex_annotated, hex_opt, Date, HexFormatOpts};
