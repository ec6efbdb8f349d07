// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Misuse reporting and call-site bookkeeping.
//!
//! Nothing in here influences whether a lock is acquired or released. With the `debug` feature
//! disabled, [`CallSite`] is zero-sized and the site records do not exist at all.

use core::fmt;
use core::panic::Location;

use crate::core_id::{CoreId, Owner};
use crate::state::MAX_COUNT;

/// A correctness violation detected by the lock protocols.
///
/// These are programming errors or memory corruption, never expected runtime conditions. The
/// protocols report them through `log` and then assert; they are not propagated as return
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("owner word {word:#x} is neither free nor a valid core")]
    CorruptOwner { word: u32 },
    #[error("recursion count {count} reached the maximum of {max}", max = MAX_COUNT)]
    CountOverflow { count: u8 },
    #[error("{owner} holds the lock with a recursion count of zero")]
    CountUnderflow { owner: CoreId },
    #[error("{core} released a lock owned by {owner}")]
    NotOwner { core: CoreId, owner: Owner },
}

/// The source location of a lock operation.
///
/// Captured through `#[track_caller]`, so callers never pass it explicitly.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    #[cfg(feature = "debug")]
    location: &'static Location<'static>,
}

// === impl CallSite ===

impl CallSite {
    #[track_caller]
    #[inline(always)]
    #[must_use]
    pub fn caller() -> Self {
        Self {
            #[cfg(feature = "debug")]
            location: Location::caller(),
        }
    }

    /// Returns the captured location, or `None` if the `debug` feature is disabled.
    #[must_use]
    pub fn location(&self) -> Option<&'static Location<'static>> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "debug")] {
                Some(self.location)
            } else {
                None
            }
        }
    }
}

impl fmt::Debug for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location() {
            Some(location) => write!(f, "{} line {}", location.file(), location.line()),
            None => f.write_str("<unknown>"),
        }
    }
}

/// Formats an optional call site, printing `<none>` if nothing was recorded yet.
#[cfg(any(test, feature = "debug"))]
pub(crate) struct MaybeSite(pub(crate) Option<CallSite>);

#[cfg(any(test, feature = "debug"))]
impl fmt::Display for MaybeSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(site) => fmt::Display::fmt(site, f),
            None => f.write_str("<none>"),
        }
    }
}

#[cfg(feature = "debug")]
pub(crate) use record::SiteRecord;

#[cfg(feature = "debug")]
mod record {
    use core::panic::Location;
    use core::ptr;

    use super::CallSite;
    use crate::loom::{AtomicPtr, Ordering, loom_const_fn};

    /// The most recent call site of some lock operation.
    ///
    /// Only written by the core owning the lock, but read by the other core when it times out,
    /// hence the atomic.
    pub(crate) struct SiteRecord(AtomicPtr<Location<'static>>);

    impl SiteRecord {
        loom_const_fn! {
            pub(crate) const fn new() -> Self {
                Self(AtomicPtr::new(ptr::null_mut()))
            }
        }

        pub(crate) fn set(&self, site: CallSite) {
            self.0
                .store(ptr::from_ref(site.location).cast_mut(), Ordering::Relaxed);
        }

        pub(crate) fn get(&self) -> Option<CallSite> {
            let ptr = self.0.load(Ordering::Relaxed);
            // Safety: the pointer is either null or was stored by `set` from a `&'static Location`
            let location = unsafe { ptr.as_ref() }?;
            Some(CallSite { location })
        }

        pub(crate) fn clear(&self) {
            self.0.store(ptr::null_mut(), Ordering::Relaxed);
        }
    }
}
