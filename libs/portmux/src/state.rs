// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::core_id::{FREE_WORD, Owner};
use crate::diag::Violation;
use crate::loom::{AtomicU32, AtomicU8, Ordering, loom_const_fn};

/// Upper bound on the recursion count. Reaching it means the state is corrupt.
pub const MAX_COUNT: u8 = 0xFF;

/// The mutable record owned by a single lock.
///
/// `owner` is the only field both cores race on and is only ever transitioned away from free
/// through a [`CompareSet`](crate::CompareSet) backend. Everything else is written exclusively
/// by the core that currently owns the lock.
pub(crate) struct LockState {
    pub(crate) owner: AtomicU32,
    count: AtomicU8,
    #[cfg(feature = "debug")]
    pub(crate) last_lock: crate::diag::SiteRecord,
    #[cfg(feature = "debug")]
    pub(crate) last_unlock: crate::diag::SiteRecord,
}

/// A point-in-time view of a lock's state.
///
/// Only meaningful when taken by the owning core or when no core is inside an acquire or
/// release, since the two fields are read separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub owner: Owner,
    pub count: u8,
}

// === impl LockState ===

impl LockState {
    loom_const_fn! {
        pub(crate) const fn new() -> Self {
            Self {
                owner: AtomicU32::new(FREE_WORD),
                count: AtomicU8::new(0),
                #[cfg(feature = "debug")]
                last_lock: crate::diag::SiteRecord::new(),
                #[cfg(feature = "debug")]
                last_unlock: crate::diag::SiteRecord::new(),
            }
        }
    }

    #[inline]
    pub(crate) fn owner_word(&self) -> u32 {
        self.owner.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn owner(&self) -> Result<Owner, Violation> {
        Owner::from_word(self.owner_word())
    }

    #[inline]
    pub(crate) fn count(&self) -> u8 {
        self.count.load(Ordering::Relaxed)
    }

    /// Stores the recursion count. Must only be called by the owning core.
    #[cfg_attr(feature = "unicore", expect(dead_code, reason = "single-core builds never lock"))]
    #[inline]
    pub(crate) fn set_count(&self, count: u8) {
        self.count.store(count, Ordering::Relaxed);
    }

    /// Marks the lock free, publishing every write made while it was held.
    ///
    /// The count must already be zero so the next owner starts from a consistent state.
    #[cfg_attr(feature = "unicore", expect(dead_code, reason = "single-core builds never lock"))]
    #[inline]
    pub(crate) fn publish_free(&self) {
        debug_assert_eq!(self.count(), 0);
        self.owner.store(FREE_WORD, Ordering::Release);
    }

    /// Forces the owner word back to free without touching the count.
    ///
    /// Last-resort recovery from a corrupt owner word. Unsound if a core actually holds the lock.
    #[cfg(all(feature = "debug", not(feature = "unicore")))]
    pub(crate) fn coerce_free(&self) {
        self.owner.store(FREE_WORD, Ordering::Release);
    }

    /// Puts the record back into its initial state. Exclusive access makes this race-free.
    pub(crate) fn reset(&mut self) {
        self.owner.store(FREE_WORD, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
        #[cfg(feature = "debug")]
        {
            self.last_lock.clear();
            self.last_unlock.clear();
        }
    }

    /// Overwrites the raw fields. Used to simulate corruption in tests.
    #[cfg(test)]
    pub(crate) fn poke(&self, owner: u32, count: u8) {
        self.owner.store(owner, Ordering::SeqCst);
        self.count.store(count, Ordering::SeqCst);
    }
}
