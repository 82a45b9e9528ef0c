#![cfg_attr(not(feature = "std"), no_std)]
#![warn(rust_2018_idioms)]

//! # cbor-core: a streaming, allocation-free CBOR codec core
//!
//! `cbor-core` decodes and encodes [CBOR](https://cbor.io) (RFC 8949) over
//! caller-supplied buffers without allocating on the hot path. The decoder
//! pulls items out of an input buffer one at a time in pre-order traversal;
//! the encoder writes items into an output buffer the same way. Both borrow
//! from, or write into, buffers the caller owns — no heap allocation is
//! required unless the caller asks to reassemble an indefinite-length
//! string, for which it supplies its own [`Allocator`](allocator::Allocator).
//!
//! # Getting started
//!
//! ```
//! use cbor_core::prelude::*;
//!
//! let bytes = [0x83, 0x01, 0x02, 0x03]; // [1, 2, 3]
//! let mut decoder = Decoder::new(&bytes, DecoderConfig::default()).unwrap();
//! let array = decoder.get_next().unwrap();
//! assert!(matches!(array.case(), ItemCase::Array(Count::Definite(3))));
//! for expected in 1..=3 {
//!     let item = decoder.get_next().unwrap();
//!     assert!(matches!(item.case(), ItemCase::SignedInt(n) if *n == expected));
//! }
//! decoder.finish().unwrap();
//! ```
//!
//! # Conformance
//!
//! [`DecoderConfig`]/[`EncoderConfig`] carry bitflags (tightened-vs-relaxed
//! RFC 8949 conformance levels, deterministic-CBOR-only modes, and
//! backward-compatibility escape hatches) plus structural limits (nesting
//! depth, tag-stack size, input size). See `DESIGN.md` for the conformance
//! flag catalog and the policy decisions behind each default.

mod allocator;
pub use allocator::{Allocator, BumpAllocator};

mod conformance;
pub use conformance::{DecoderConfig, DecoderFlags, DecoderLimits, EncoderConfig, EncoderFlags};

mod decode;
pub use decode::Decoder;

mod dispatch;
pub use dispatch::{standard_dispatch_table, DispatchTable, TagCallback};

mod encode;
pub use encode::Encoder;

mod error;
pub use error::{Error, Result};

mod exact;
use exact::ExactFrom;

mod head;
pub use head::{Head, MajorType};

mod item;
pub use item::{Count, Item, ItemCase, Label, Mantissa};

mod known_tags;

mod mapsearch;

mod nesting;
pub use nesting::FrameKind;

mod spiffy;
pub use spiffy::TagRequirement;

mod stdlib;

mod tag;
pub use tag::Tag;

mod tags_store;
pub use tags_store::{TagsStore, TagsStoreTrait};

mod tagstack;
pub use tagstack::{TagCursor, TagOverflowTable, TagStack};

mod string_util;

#[cfg(feature = "std")]
mod date;
#[cfg(feature = "std")]
pub use date::Date;

#[cfg(feature = "std")]
mod diag;
#[cfg(feature = "std")]
pub use diag::{diagnostic, diagnostic_annotated};

#[cfg(feature = "std")]
mod dump;
#[cfg(feature = "std")]
pub use dump::{hex, hex_annotated, hex_opt, HexFormatOpts};

pub mod prelude;
