#![allow(unused_imports)]

#[cfg(feature = "std")]
#[doc(hidden)]
pub(crate) mod with_std {
    pub(crate) use std::borrow::ToOwned;
    pub(crate) use std::boxed::Box;
    pub(crate) use std::cmp;
    pub(crate) use std::collections::HashMap;
    pub(crate) use std::fmt;
    pub(crate) use std::format;
    pub(crate) use std::hash;
    pub(crate) use std::result::Result as StdResult;
    pub(crate) use std::str;
    pub(crate) use std::string::{String, ToString};
    pub(crate) use std::sync::{Arc, Mutex, MutexGuard, Once};
    pub(crate) use std::vec;
    pub(crate) use std::vec::Vec;
    pub(crate) use thiserror::Error as ThisError;
}

#[cfg(not(feature = "std"))]
#[cfg(feature = "no_std")]
#[doc(hidden)]
pub(crate) mod without_std {
    extern crate alloc;

    pub(crate) use alloc::borrow::ToOwned;
    pub(crate) use alloc::boxed::Box;
    pub(crate) use alloc::fmt;
    pub(crate) use alloc::format;
    pub(crate) use alloc::string::{String, ToString};
    pub(crate) use alloc::sync::Arc;
    pub(crate) use alloc::vec;
    pub(crate) use alloc::vec::Vec;
    pub(crate) use core::cmp;
    pub(crate) use core::hash;
    pub(crate) use core::result::Result as StdResult;
    pub(crate) use core::str;
    pub(crate) use hashbrown::HashMap;
    pub(crate) use spin::{Mutex, MutexGuard, Once};
    pub(crate) use thiserror_no_std::Error as ThisError;
}

/// Imports the std/no_std-appropriate set of collection, string, and
/// synchronization primitives used throughout the crate.
///
/// The core traversal and encoding paths (`Decoder`, `Encoder`,
/// `NestingStack`, `TagStack`, `BumpAllocator`) never reach for any of these:
/// they operate entirely over caller-supplied buffers and fixed-size arrays.
/// This macro exists for the configuration-time and reporting conveniences
/// (the tag registry, the tag-content dispatch table, diagnostic formatting)
/// that do need a map or a string builder.
#[macro_export]
#[doc(hidden)]
macro_rules! import_stdlib {
    () => {
        #[allow(unused_imports)]
        #[cfg(feature = "std")]
        use $crate::stdlib::with_std::*;
        #[allow(unused_imports)]
        #[cfg(not(feature = "std"))]
        use $crate::stdlib::without_std::*;
    };
}
