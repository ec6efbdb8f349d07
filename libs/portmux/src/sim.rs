// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A simulated two-core machine for running lock code on a hosted target.
//!
//! Each OS thread (or loom thread) acts as the core it was bound to with [`enter`]. The cycle
//! counter is per thread as well and advances by a fixed step every time it is read, so a
//! timed-out acquire always terminates after a predictable number of attempts.

use core::cell::Cell;
use core::marker::PhantomData;

use crate::core_id::CoreId;
use crate::platform::Platform;

crate::loom::thread_local! {
    static CURRENT_CORE: Cell<Option<CoreId>> = Cell::new(None);
    static CYCLES: Cell<u32> = Cell::new(0);
    static CYCLES_PER_READ: Cell<u32> = Cell::new(1);
}

/// A [`Platform`] backed by the calling thread's simulated core binding and cycle counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimPlatform;

// Safety: `enter` requires callers to never bind two threads sharing a lock to the same core
unsafe impl Platform for SimPlatform {
    const INIT: Self = SimPlatform;

    #[track_caller]
    fn current_core(&self) -> CoreId {
        current().expect("thread is not bound to a simulated core, call `sim::enter` first")
    }

    fn cycle_count(&self) -> u32 {
        let step = CYCLES_PER_READ.with(Cell::get);
        CYCLES.with(|cycles| {
            let now = cycles.get();
            cycles.set(now.wrapping_add(step));
            now
        })
    }
}

/// Restores the previous core binding of the thread when dropped.
#[must_use = "the core binding is undone when the guard is dropped"]
#[derive(Debug)]
pub struct CoreGuard {
    prev: Option<CoreId>,
    // bindings are per thread
    _not_send: PhantomData<*mut ()>,
}

impl Drop for CoreGuard {
    fn drop(&mut self) {
        CURRENT_CORE.with(|current| current.set(self.prev));
    }
}

/// Binds the calling thread to `core` until the returned guard is dropped.
///
/// # Safety
///
/// While the guard is alive, no other thread that shares a lock with the calling thread may be
/// bound to the same core. Two threads acting as the same core would both be treated as the
/// owner of a lock held by that core.
pub unsafe fn enter(core: CoreId) -> CoreGuard {
    let prev = CURRENT_CORE.with(|current| current.replace(Some(core)));
    CoreGuard {
        prev,
        _not_send: PhantomData,
    }
}

/// Returns the core the calling thread is bound to, if any.
#[must_use]
pub fn current() -> Option<CoreId> {
    CURRENT_CORE.with(Cell::get)
}

/// Returns the calling thread's cycle counter without advancing it.
#[must_use]
pub fn cycles() -> u32 {
    CYCLES.with(Cell::get)
}

/// Moves the calling thread's cycle counter forward.
pub fn advance(cycles: u32) {
    CYCLES.with(|counter| counter.set(counter.get().wrapping_add(cycles)));
}

/// Sets how far the calling thread's cycle counter advances on every read.
///
/// # Panics
///
/// Panics if `step` is zero, which would make every timed acquire spin forever.
pub fn set_cycles_per_read(step: u32) {
    assert_ne!(step, 0, "a simulated cycle counter must make progress");
    CYCLES_PER_READ.with(|current| current.set(step));
}
