// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! `lock_api` adapters, for protecting data with a portmux instead of pairing calls by hand.

use core::num::NonZeroUsize;

use lock_api::GetThreadId;

use crate::mux::PortMux;
use crate::platform::{Platform, Timeout};

/// A mutex protecting data shared between the two cores.
pub type CoreMutex<P, T> = lock_api::Mutex<RawCoreMutex<P>, T>;
/// RAII guard of a [`CoreMutex`]. Must be dropped on the core that created it.
pub type CoreMutexGuard<'a, P, T> = lock_api::MutexGuard<'a, RawCoreMutex<P>, T>;

/// A mutex that the owning core may lock again without deadlocking.
///
/// Like any reentrant mutex, its guard only hands out shared references. Use a
/// [`RefCell`](core::cell::RefCell) for mutation.
pub type CoreReentrantMutex<P, T> = lock_api::ReentrantMutex<RawCoreMutex<P>, CoreThreadId<P>, T>;
/// RAII guard of a [`CoreReentrantMutex`]. The lock is freed when the outermost guard is dropped.
pub type CoreReentrantMutexGuard<'a, P, T> =
    lock_api::ReentrantMutexGuard<'a, RawCoreMutex<P>, CoreThreadId<P>, T>;

/// A non-recursive view of a [`PortMux`], suitable as a `lock_api` raw mutex.
///
/// `lock_api` hands out `&mut T` from a held mutex, so the same core must not be able to take
/// it twice. A nested [`lock`](lock_api::RawMutex::lock) therefore panics and a nested
/// [`try_lock`](lock_api::RawMutex::try_lock) fails, instead of recursing.
pub struct RawCoreMutex<P: Platform> {
    mux: PortMux<P>,
}

impl<P: Platform> RawCoreMutex<P> {
    /// Returns the underlying lock.
    pub fn as_portmux(&self) -> &PortMux<P> {
        &self.mux
    }
}

// Safety: only a depth-0 -> 1 acquire counts as taking the lock, nested acquires are undone
// immediately, so at most one guard exists at a time. Guards are not `Send`, so they are
// released on the core that owns the portmux.
unsafe impl<P: Platform> lock_api::RawMutex for RawCoreMutex<P> {
    const INIT: Self = Self {
        mux: PortMux::new(),
    };

    type GuardMarker = lock_api::GuardNoSend;

    #[track_caller]
    fn lock(&self) {
        match self.mux.acquire_depth(Timeout::Never) {
            Some(1) => {}
            Some(_) => {
                self.mux.release();
                panic!("CoreMutex locked recursively, use a CoreReentrantMutex instead");
            }
            None => panic!("CoreMutex: deadlock detected"),
        }
    }

    #[track_caller]
    fn try_lock(&self) -> bool {
        match self.mux.acquire_depth(Timeout::TRY) {
            Some(1) => true,
            Some(_) => {
                self.mux.release();
                false
            }
            None => false,
        }
    }

    #[track_caller]
    unsafe fn unlock(&self) {
        self.mux.release();
    }

    fn is_locked(&self) -> bool {
        self.mux.is_locked()
    }
}

/// Identifies the calling core to `lock_api`'s reentrant mutex.
pub struct CoreThreadId<P: Platform> {
    platform: P,
}

// Safety: `Platform::current_core` is unique per core, and a core is the unit of execution
// a portmux distinguishes.
unsafe impl<P: Platform> GetThreadId for CoreThreadId<P> {
    const INIT: Self = Self { platform: P::INIT };

    fn nonzero_thread_id(&self) -> NonZeroUsize {
        NonZeroUsize::MIN.saturating_add(self.platform.current_core().index())
    }
}
