// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Strategies for the one atomic step of the lock protocol: claiming a free owner word.

use core::fmt;

use crate::loom::{AtomicU32, Ordering};
use crate::mux::PortMux;
use crate::platform::Platform;

/// A conditional exchange on a lock's owner word.
///
/// # Safety
///
/// `compare_set` must behave as a single indivisible operation with respect to every other
/// `compare_set` on the same word: if the word holds `compare` it is replaced by `set`, and the
/// value observed before the operation is returned either way. A successful exchange must have
/// at least [`Ordering::Acquire`] semantics.
pub unsafe trait CompareSet {
    fn compare_set(&self, word: &AtomicU32, compare: u32, set: u32) -> u32;
}

/// Exchange through the processor's native compare-and-swap.
///
/// Only usable when the owner word lives in memory the atomic instructions can reach.
#[derive(Debug, Clone, Copy, Default)]
pub struct Direct;

// Safety: `compare_exchange` is atomic and uses `Acquire` on success
unsafe impl CompareSet for Direct {
    #[inline]
    fn compare_set(&self, word: &AtomicU32, compare: u32, set: u32) -> u32 {
        match word.compare_exchange(compare, set, Ordering::Acquire, Ordering::Relaxed) {
            Ok(prev) | Err(prev) => prev,
        }
    }
}

/// Exchange emulated with plain loads and stores inside a critical section of a helper lock.
///
/// For locks placed in memory without atomic read-modify-write support (e.g. external RAM).
/// The helper is an ordinary [`Direct`] lock with its own state, kept in memory that does
/// support atomics. Every exchange spins on the helper without a timeout.
pub struct Shadow<'a, P: Platform> {
    guard: &'a PortMux<P, Direct>,
}

// === impl Shadow ===

impl<'a, P: Platform> Shadow<'a, P> {
    pub const fn new(guard: &'a PortMux<P, Direct>) -> Self {
        Self { guard }
    }

    /// Returns the helper lock guarding the emulated exchange.
    pub fn guard(&self) -> &'a PortMux<P, Direct> {
        self.guard
    }
}

// Safety: all shadow exchanges on a word go through the same helper lock, so no two of them
// overlap. The `Acquire` load pairs with the `Release` store that frees the target lock.
unsafe impl<P: Platform> CompareSet for Shadow<'_, P> {
    #[track_caller]
    fn compare_set(&self, word: &AtomicU32, compare: u32, set: u32) -> u32 {
        self.guard.lock();

        let prev = word.load(Ordering::Acquire);
        if prev == compare {
            word.store(set, Ordering::Relaxed);
        }

        self.guard.release();
        prev
    }
}

impl<P: Platform> fmt::Debug for Shadow<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shadow")
            .field("guard", &core::ptr::from_ref(self.guard))
            .finish()
    }
}

impl<P: Platform> Clone for Shadow<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: Platform> Copy for Shadow<'_, P> {}
