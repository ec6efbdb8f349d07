// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A recursive spinlock for dual-core systems.
//!
//! [`PortMux`] is the lowest-level mutual-exclusion primitive shared between the two cores of a
//! symmetric dual-core processor. It spins (optionally with a cycle-count timeout) until the
//! calling core owns it, lets the owning core re-enter it, and establishes the memory ordering
//! needed for data written under the lock to be visible to the next owner.
//!
//! ```
//! use portmux::{CoreId, PortMux, Timeout, sim};
//!
//! static MUX: PortMux<sim::SimPlatform> = PortMux::new();
//!
//! // Safety: no other thread uses `MUX`
//! let _core = unsafe { sim::enter(CoreId::Pro) };
//! assert!(MUX.acquire(Timeout::Cycles(1_000)));
//! assert!(MUX.acquire(Timeout::Never)); // recursive
//! MUX.release();
//! MUX.release();
//! assert!(!MUX.is_locked());
//! ```
//!
//! The crate only talks to the hardware through a [`Platform`] (which core am I, what does the
//! cycle counter read) and a [`CompareSet`] backend (the atomic claim of a free lock), so the
//! protocol runs unchanged against the [`sim`] platform on a hosted target.
//!
//! # Features
//!
//! - `unicore`: single-core build. Locks are never contended, acquire always succeeds and
//!   release does nothing.
//! - `debug`: records call sites, logs timeouts and recursive locks, and resets corrupt locks
//!   to free before acquiring them.
//! - `debug-recursive`: additionally logs recursive unlocks.
//! - `debug-timeout`: bounds [`Timeout::Never`] to [`Timeout::DEBUG_FORCED_CYCLES`] so
//!   deadlocks show up as failed acquires. Changes behaviour, never enable it in production.
//! - `sim`: exports the [`sim`] platform for tests of downstream crates.

#![cfg_attr(not(any(test, feature = "sim")), no_std)]

#[cfg(not(feature = "unicore"))]
mod backoff;
mod core_id;
mod diag;
mod exchange;
mod loom;
mod mux;
mod platform;
mod state;

#[cfg(all(not(loom), not(feature = "unicore")))]
mod raw;
#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use core_id::{CoreId, FREE_WORD, Owner};
pub use diag::{CallSite, Violation};
pub use exchange::{CompareSet, Direct, Shadow};
pub use mux::PortMux;
pub use platform::{Platform, Timeout, arch};
#[cfg(all(not(loom), not(feature = "unicore")))]
pub use raw::{
    CoreMutex, CoreMutexGuard, CoreReentrantMutex, CoreReentrantMutexGuard, CoreThreadId,
    RawCoreMutex,
};
pub use state::{MAX_COUNT, Snapshot};
