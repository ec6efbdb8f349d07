// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

cfg_if::cfg_if! {
    if #[cfg(loom)] {
        pub(crate) use loom::sync::atomic::{AtomicU32, AtomicU8, Ordering};
        #[cfg(feature = "debug")]
        pub(crate) use loom::sync::atomic::AtomicPtr;

        #[cfg(any(test, feature = "sim"))]
        pub(crate) use loom::thread_local;

        pub(crate) use loom::thread;
        #[cfg(test)]
        pub(crate) use loom::model;
        #[cfg(test)]
        pub(crate) use loom::sync::Arc;
    } else {
        pub(crate) use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};
        #[cfg(feature = "debug")]
        pub(crate) use core::sync::atomic::AtomicPtr;

        #[cfg(any(test, feature = "sim"))]
        pub(crate) use std::thread_local;

        #[cfg(test)]
        pub(crate) use std::sync::Arc;
        #[cfg(test)]
        pub(crate) use std::thread;

        #[cfg(test)]
        #[inline(always)]
        pub(crate) fn model<F>(f: F)
        where
            F: Fn() + Sync + Send + 'static,
        {
            f();
        }
    }
}

/// Wraps a `const fn` stripping the "constness" when compiled under loom.
///
/// loom's atomics track additional state and cannot be constructed in a `const` context.
macro_rules! loom_const_fn {
    (
        $(#[$meta:meta])*
        $vis:vis const fn $name:ident($($arg:ident: $T:ty),*) -> $Ret:ty $body:block
    ) => {
        $(#[$meta])*
        #[cfg(not(loom))]
        $vis const fn $name($($arg: $T),*) -> $Ret $body

        $(#[$meta])*
        #[cfg(loom)]
        $vis fn $name($($arg: $T),*) -> $Ret $body
    };
}

pub(crate) use loom_const_fn;
