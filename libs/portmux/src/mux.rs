// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::fmt;

use crate::core_id::Owner;
use crate::diag::Violation;
use crate::exchange::{CompareSet, Direct};
use crate::loom::loom_const_fn;
use crate::platform::{Platform, Timeout};
use crate::state::{LockState, Snapshot};

cfg_if::cfg_if! {
    if #[cfg(not(feature = "unicore"))] {
        use crate::backoff::Backoff;
        use crate::core_id::FREE_WORD;
        use crate::state::MAX_COUNT;
    }
}

#[cfg(feature = "debug")]
use crate::diag::{CallSite, MaybeSite};

/// A recursive spinlock shared between the two cores of the system.
///
/// A core acquires the lock by swapping its own identity into the owner word, spinning while
/// the other core holds it. Acquiring a lock the calling core already holds only bumps the
/// recursion count; every successful acquire must be paired with exactly one [`release`] on the
/// same core.
///
/// The lock does not wrap the data it protects and never yields to a scheduler. Critical
/// sections must be short and must not wait on the other core.
///
/// # Backends
///
/// The one atomic step, claiming a free owner word, is delegated to a [`CompareSet`] backend:
/// [`Direct`] for locks in atomically addressable memory, [`Shadow`](crate::Shadow) for locks
/// that live elsewhere.
///
/// # Single-core builds
///
/// With the `unicore` feature enabled there is nothing to contend with: [`acquire`] always
/// succeeds and [`release`] does nothing.
///
/// [`acquire`]: PortMux::acquire
/// [`release`]: PortMux::release
pub struct PortMux<P: Platform, B: CompareSet = Direct> {
    state: LockState,
    platform: P,
    backend: B,
}

// === impl PortMux ===

impl<P: Platform> PortMux<P, Direct> {
    loom_const_fn! {
        /// Creates a new, free lock using the processor's native compare-and-swap.
        #[must_use]
        pub const fn new() -> Self {
            Self::with_parts(P::INIT, Direct)
        }
    }
}

impl<P: Platform, B: CompareSet> PortMux<P, B> {
    loom_const_fn! {
        /// Creates a new, free lock claiming its owner word through `backend`.
        #[must_use]
        pub const fn with_backend(backend: B) -> Self {
            Self::with_parts(P::INIT, backend)
        }
    }

    loom_const_fn! {
        /// Creates a new, free lock from an explicit platform instance and backend.
        #[must_use]
        pub const fn with_parts(platform: P, backend: B) -> Self {
            Self {
                state: LockState::new(),
                platform,
                backend,
            }
        }
    }

    /// Acquires the lock, spinning for at most `timeout`.
    ///
    /// Returns `true` once the calling core owns the lock, either because it was free or because
    /// this core already held it. Returns `false` if the other core kept holding it for longer
    /// than `timeout`; in that case the lock state is left untouched.
    ///
    /// With the `debug-timeout` feature, [`Timeout::Never`] is bounded as well; see
    /// [`Timeout::effective`].
    ///
    /// # Panics
    ///
    /// Panics if the recursion count would reach [`MAX_COUNT`](crate::MAX_COUNT). With debug
    /// assertions enabled, also panics if the lock state is found to be corrupt.
    #[track_caller]
    #[must_use = "if the acquire timed out the lock is not held"]
    #[inline]
    pub fn acquire(&self, timeout: Timeout) -> bool {
        self.acquire_depth(timeout).is_some()
    }

    /// Acquires the lock, spinning until it is available.
    ///
    /// # Panics
    ///
    /// Panics if the wait was bounded through the `debug-timeout` feature and ran out. Also
    /// panics wherever [`acquire`](Self::acquire) does.
    #[track_caller]
    #[inline]
    pub fn lock(&self) {
        let acquired = self.acquire(Timeout::Never);
        assert!(acquired, "portmux {self:p}: deadlock detected");
    }

    /// Acquires the lock if it is free or already held by the calling core, without spinning.
    #[track_caller]
    #[must_use = "if the lock was held by the other core it is not acquired"]
    #[inline]
    pub fn try_lock(&self) -> bool {
        self.acquire(Timeout::TRY)
    }

    /// Acquires the lock, returning the recursion depth reached on success.
    #[track_caller]
    #[cfg_attr(
        feature = "unicore",
        expect(clippy::unnecessary_wraps, reason = "always succeeds on a single core")
    )]
    pub(crate) fn acquire_depth(&self, timeout: Timeout) -> Option<u8> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "unicore")] {
                let _ = timeout;
                Some(1)
            } else {
                self.acquire_contended(timeout.effective())
            }
        }
    }

    #[cfg(not(feature = "unicore"))]
    #[track_caller]
    fn acquire_contended(&self, timeout: Timeout) -> Option<u8> {
        #[cfg(feature = "debug")]
        let site = CallSite::caller();

        #[cfg(feature = "debug")]
        if let Err(violation) = self.state.owner() {
            log::error!(
                "portmux {self:p} is uninitialized ({violation})! Called from {site}, resetting it to free"
            );
            self.state.coerce_free();
        }

        let core = self.platform.current_core();
        let other = core.other().to_word();
        let start = timeout.budget().map(|_| self.platform.cycle_count());

        let mut boff = Backoff::new();
        let prev = loop {
            let prev = self
                .backend
                .compare_set(&self.state.owner, FREE_WORD, core.to_word());

            if prev != other {
                break prev;
            }

            if let Some(start) = start
                && timeout.is_expired(start, self.platform.cycle_count())
            {
                #[cfg(feature = "debug")]
                log::error!(
                    "timeout on portmux {self:p}! last non-recursive lock {}, curr {site}; owner {:#x} count {}",
                    MaybeSite(self.state.last_lock.get()),
                    self.state.owner_word(),
                    self.state.count(),
                );
                return None;
            }

            boff.spin();
        };

        // we won the exchange (prev was free) or already owned the lock, anything else is garbage
        debug_assert!(
            prev == core.to_word() || prev == FREE_WORD,
            "portmux {self:p}: {}",
            Violation::CorruptOwner { word: prev }
        );

        let count = self.state.count();
        debug_assert_eq!(
            prev == FREE_WORD,
            count == 0,
            "portmux {self:p}: owner {prev:#x} with recursion count {count}"
        );

        assert!(
            count < MAX_COUNT - 1,
            "portmux {self:p}: {}",
            Violation::CountOverflow { count: count.saturating_add(1) }
        );
        let depth = count + 1;
        self.state.set_count(depth);

        #[cfg(feature = "debug")]
        if prev == FREE_WORD {
            self.state.last_lock.set(site);
        } else {
            log::debug!(
                "recursive lock on portmux {self:p}: count={count} last non-recursive lock {}, curr {site}",
                MaybeSite(self.state.last_lock.get()),
            );
        }

        Some(depth)
    }

    /// Releases one level of ownership held by the calling core.
    ///
    /// The lock becomes free once it has been released as many times as it was acquired. Freeing
    /// the lock publishes every write the core made while holding it to the next owner.
    ///
    /// # Panics
    ///
    /// Releasing a lock the calling core does not own is a programming error: it is logged and
    /// then panics in every build, since continuing would corrupt the lock. A corrupt owner word
    /// is treated the same way.
    #[track_caller]
    pub fn release(&self) {
        #[cfg(not(feature = "unicore"))]
        self.release_contended();
    }

    #[cfg(not(feature = "unicore"))]
    #[track_caller]
    fn release_contended(&self) {
        #[cfg(feature = "debug")]
        let site = CallSite::caller();

        let core = self.platform.current_core();
        let owner = match self.state.owner() {
            Ok(owner) => owner,
            Err(violation) => self.fatal(violation),
        };

        if owner != Owner::Core(core) {
            #[cfg(feature = "debug")]
            log::error!(
                "portmux {self:p} was already unlocked! last non-recursive unlock {}, last non-recursive lock {}, curr unlock {site}",
                MaybeSite(self.state.last_unlock.get()),
                MaybeSite(self.state.last_lock.get()),
            );
            self.fatal(Violation::NotOwner { core, owner });
        }

        let count = self.state.count();
        debug_assert!(
            count < MAX_COUNT,
            "portmux {self:p}: {}",
            Violation::CountOverflow { count }
        );

        let Some(count) = count.checked_sub(1) else {
            log::error!(
                "portmux {self:p}: {}, freeing it",
                Violation::CountUnderflow { owner: core }
            );
            if cfg!(debug_assertions) {
                panic!("portmux {self:p}: {}", Violation::CountUnderflow { owner: core });
            }
            self.state.publish_free();
            return;
        };
        self.state.set_count(count);

        if count == 0 {
            #[cfg(feature = "debug")]
            self.state.last_unlock.set(site);

            self.state.publish_free();
        } else {
            #[cfg(feature = "debug-recursive")]
            log::trace!(
                "recursive unlock on portmux {self:p}: count={count} last locked {}, curr {site}",
                MaybeSite(self.state.last_lock.get()),
            );
        }
    }

    #[cfg(not(feature = "unicore"))]
    #[cold]
    #[track_caller]
    fn fatal(&self, violation: Violation) -> ! {
        log::error!("portmux {self:p}: {violation}");
        panic!("portmux {self:p}: {violation}");
    }

    /// Returns the current owner.
    ///
    /// # Errors
    ///
    /// Returns [`Violation::CorruptOwner`] if the owner word holds an invalid value.
    pub fn owner(&self) -> Result<Owner, Violation> {
        self.state.owner()
    }

    /// Returns the owner and recursion count. See [`Snapshot`] for the caveats.
    ///
    /// # Errors
    ///
    /// Returns [`Violation::CorruptOwner`] if the owner word holds an invalid value.
    pub fn snapshot(&self) -> Result<Snapshot, Violation> {
        Ok(Snapshot {
            owner: self.state.owner()?,
            count: self.state.count(),
        })
    }

    /// Returns `true` if either core currently holds the lock.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.state.owner_word() != crate::core_id::FREE_WORD
    }

    /// Returns `true` if the calling core currently holds the lock.
    #[inline]
    pub fn is_owned_by_current_core(&self) -> bool {
        self.state.owner_word() == self.platform.current_core().to_word()
    }

    /// Returns how many times the owning core has acquired the lock, zero if it is free.
    #[inline]
    pub fn recursion_depth(&self) -> u8 {
        self.state.count()
    }

    /// Returns the call site of the most recent non-recursive acquire.
    #[cfg(feature = "debug")]
    pub fn last_lock_site(&self) -> Option<CallSite> {
        self.state.last_lock.get()
    }

    /// Returns the call site of the most recent release that freed the lock.
    #[cfg(feature = "debug")]
    pub fn last_unlock_site(&self) -> Option<CallSite> {
        self.state.last_unlock.get()
    }

    /// Puts the lock back into the free state, discarding any ownership.
    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Returns the platform this lock reads the current core and cycle counter from.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Returns the backend used to claim the owner word.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<P: Platform> Default for PortMux<P, Direct> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform, B: CompareSet> fmt::Debug for PortMux<P, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("PortMux");
        match self.state.owner() {
            Ok(owner) => s.field("owner", &owner),
            Err(violation) => s.field("owner", &violation),
        };
        s.field("count", &self.state.count()).finish_non_exhaustive()
    }
}

#[cfg(all(test, not(feature = "unicore")))]
mod tests {
    use super::*;
    use crate::core_id::CoreId;
    use crate::exchange::Shadow;
    use crate::loom::{Arc, AtomicU32, Ordering, thread};
    use crate::sim::{self, SimPlatform};

    type Mux = PortMux<SimPlatform>;

    fn on<R>(core: CoreId, f: impl FnOnce() -> R) -> R {
        // Safety: every test lock is only shared between threads bound to distinct cores
        let _core = unsafe { sim::enter(core) };
        f()
    }

    fn held_by(core: CoreId, count: u8) -> Snapshot {
        Snapshot {
            owner: Owner::Core(core),
            count,
        }
    }

    const FREE: Snapshot = Snapshot {
        owner: Owner::Free,
        count: 0,
    };

    #[test]
    fn fresh_lock_is_acquired() {
        crate::loom::model(|| {
            let mux = Mux::new();
            assert_eq!(mux.snapshot(), Ok(FREE));

            on(CoreId::Pro, || assert!(mux.acquire(Timeout::Never)));
            assert_eq!(mux.snapshot(), Ok(held_by(CoreId::Pro, 1)));
        });
    }

    #[test]
    fn owner_reacquires_recursively() {
        crate::loom::model(|| {
            let mux = Mux::new();
            on(CoreId::Pro, || {
                assert!(mux.acquire(Timeout::Never));
                assert!(mux.acquire(Timeout::Never));
                assert!(mux.is_owned_by_current_core());
            });
            assert_eq!(mux.snapshot(), Ok(held_by(CoreId::Pro, 2)));
        });
    }

    #[test]
    fn recursive_release_keeps_owner() {
        crate::loom::model(|| {
            let mux = Mux::new();
            on(CoreId::Pro, || {
                mux.lock();
                mux.lock();

                mux.release();
                assert_eq!(mux.snapshot(), Ok(held_by(CoreId::Pro, 1)));

                mux.release();
                assert_eq!(mux.snapshot(), Ok(FREE));
            });
        });
    }

    // spins for a thousand simulated cycles, too many branches for loom
    #[cfg(not(loom))]
    #[test]
    fn contended_acquire_times_out_without_side_effects() {
        let mux = Mux::new();
        on(CoreId::Pro, || mux.lock());

        on(CoreId::App, || {
            sim::set_cycles_per_read(10);
            let before = sim::cycles();

            assert!(!mux.acquire(Timeout::Cycles(1000)));

            assert!(sim::cycles().wrapping_sub(before) >= 1000);
            assert!(!mux.is_owned_by_current_core());
        });

        assert_eq!(mux.snapshot(), Ok(held_by(CoreId::Pro, 1)));
    }

    #[cfg(not(loom))]
    #[test]
    #[should_panic(expected = "released a lock owned by PRO")]
    fn release_by_non_owner_is_fatal() {
        let mux = Mux::new();
        on(CoreId::Pro, || mux.lock());
        on(CoreId::App, || mux.release());
    }

    #[cfg(not(loom))]
    #[test]
    #[should_panic(expected = "released a lock owned by free")]
    fn double_release_is_fatal() {
        let mux = Mux::new();
        on(CoreId::App, || {
            mux.lock();
            mux.release();
            mux.release();
        });
    }

    #[test]
    fn try_lock_fails_while_other_core_holds() {
        crate::loom::model(|| {
            let mux = Mux::new();
            on(CoreId::App, || assert!(mux.try_lock()));
            on(CoreId::Pro, || assert!(!mux.try_lock()));
            on(CoreId::App, || {
                assert!(mux.try_lock());
                assert_eq!(mux.recursion_depth(), 2);
                mux.release();
                mux.release();
            });
            on(CoreId::Pro, || assert!(mux.try_lock()));
            assert_eq!(mux.snapshot(), Ok(held_by(CoreId::Pro, 1)));
        });
    }

    #[test]
    fn released_lock_is_claimed_by_the_next_attempt() {
        crate::loom::model(|| {
            let mux = Mux::new();
            on(CoreId::Pro, || mux.lock());
            on(CoreId::App, || assert!(!mux.try_lock()));
            on(CoreId::Pro, || mux.release());
            on(CoreId::App, || assert!(mux.try_lock()));
            assert_eq!(mux.snapshot(), Ok(held_by(CoreId::App, 1)));
        });
    }

    #[cfg(not(loom))]
    #[test]
    #[should_panic(expected = "reached the maximum")]
    fn recursion_is_bounded() {
        let mux = Mux::new();
        on(CoreId::Pro, || {
            for _ in 0..MAX_COUNT {
                mux.lock();
            }
        });
    }

    #[cfg(not(loom))]
    #[test]
    fn deepest_recursion_unwinds() {
        let mux = Mux::new();
        on(CoreId::Pro, || {
            for _ in 0..MAX_COUNT - 1 {
                mux.lock();
            }
            assert_eq!(mux.recursion_depth(), MAX_COUNT - 1);
            for _ in 0..MAX_COUNT - 1 {
                mux.release();
            }
        });
        assert_eq!(mux.snapshot(), Ok(FREE));
    }

    #[test]
    fn reset_frees_a_held_lock() {
        crate::loom::model(|| {
            let mut mux = Mux::new();
            on(CoreId::Pro, || mux.lock());
            mux.reset();
            assert_eq!(mux.snapshot(), Ok(FREE));
        });
    }

    #[cfg(not(loom))]
    #[test]
    #[should_panic(expected = "neither free nor a valid core")]
    fn release_of_corrupt_lock_is_fatal() {
        let mux = Mux::new();
        mux.state.poke(0xDEAD_BEEF, 1);
        on(CoreId::Pro, || mux.release());
    }

    #[cfg(all(debug_assertions, not(loom)))]
    #[test]
    #[should_panic(expected = "recursion count of zero")]
    fn release_with_zero_count_is_caught() {
        let mux = Mux::new();
        mux.state.poke(CoreId::Pro.to_word(), 0);
        on(CoreId::Pro, || mux.release());
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn release_with_zero_count_frees_the_lock() {
        crate::loom::model(|| {
            let mux = Mux::new();
            mux.state.poke(CoreId::Pro.to_word(), 0);
            on(CoreId::Pro, || mux.release());
            assert_eq!(mux.snapshot(), Ok(FREE));
        });
    }

    #[cfg(all(feature = "debug", not(loom)))]
    #[test_log::test]
    fn corrupt_owner_is_recovered_in_debug_builds() {
        let mux = Mux::new();
        mux.state.poke(0xDEAD_BEEF, 0);
        on(CoreId::Pro, || assert!(mux.acquire(Timeout::Never)));
        assert_eq!(mux.snapshot(), Ok(held_by(CoreId::Pro, 1)));
    }

    #[cfg(all(feature = "debug", not(loom)))]
    #[test_log::test]
    fn call_sites_are_recorded() {
        let mux = Mux::new();
        on(CoreId::Pro, || {
            mux.lock();
            let first = mux.last_lock_site().unwrap();
            assert!(first.location().unwrap().file().ends_with("mux.rs"));

            // recursive acquires keep the original site
            mux.lock();
            assert_eq!(mux.last_lock_site(), Some(first));

            mux.release();
            assert!(mux.last_unlock_site().is_none());
            mux.release();
            assert!(mux.last_unlock_site().is_some());
        });
    }

    #[cfg(all(feature = "debug-timeout", not(loom)))]
    #[test_log::test]
    fn unbounded_acquire_is_bounded_in_debug_builds() {
        let mux = Mux::new();
        on(CoreId::Pro, || mux.lock());
        on(CoreId::App, || {
            sim::set_cycles_per_read(1000);
            assert!(!mux.acquire(Timeout::Never));
        });
    }

    #[test]
    fn two_cores_exclude_each_other() {
        const ROUNDS: u32 = if cfg!(loom) { 1 } else { 1000 };

        crate::loom::model(|| {
            let mux = Arc::new(Mux::new());
            let counter = Arc::new(AtomicU32::new(0));

            let worker = |core: CoreId| {
                let mux = mux.clone();
                let counter = counter.clone();
                move || {
                    on(core, || {
                        for _ in 0..ROUNDS {
                            mux.lock();
                            assert_eq!(mux.owner(), Ok(Owner::Core(core)));
                            // a non-atomic increment, only correct under mutual exclusion
                            let value = counter.load(Ordering::Relaxed);
                            counter.store(value + 1, Ordering::Relaxed);
                            mux.release();
                        }
                    });
                }
            };

            let pro = thread::spawn(worker(CoreId::Pro));
            let app = thread::spawn(worker(CoreId::App));
            pro.join().unwrap();
            app.join().unwrap();

            assert_eq!(counter.load(Ordering::Relaxed), 2 * ROUNDS);
            assert_eq!(mux.snapshot(), Ok(FREE));
        });
    }

    #[test]
    fn nested_sections_exclude_the_other_core() {
        crate::loom::model(|| {
            let mux = Arc::new(Mux::new());
            let counter = Arc::new(AtomicU32::new(0));

            let app = {
                let mux = mux.clone();
                let counter = counter.clone();
                thread::spawn(move || {
                    on(CoreId::App, || {
                        mux.lock();
                        mux.lock();
                        let value = counter.load(Ordering::Relaxed);
                        mux.release();
                        // still held once, the other core cannot have run in between
                        counter.store(value + 1, Ordering::Relaxed);
                        mux.release();
                    });
                })
            };

            on(CoreId::Pro, || {
                mux.lock();
                let value = counter.load(Ordering::Relaxed);
                counter.store(value + 1, Ordering::Relaxed);
                mux.release();
            });

            app.join().unwrap();
            assert_eq!(counter.load(Ordering::Relaxed), 2);
        });
    }

    #[cfg(not(loom))]
    #[test]
    fn shadow_backed_locks_exclude_each_other() {
        const ROUNDS: u32 = 500;

        let guard = Mux::new();
        let mux = PortMux::<SimPlatform, _>::with_backend(Shadow::new(&guard));
        let counter = AtomicU32::new(0);

        std::thread::scope(|s| {
            for core in CoreId::ALL {
                let mux = &mux;
                let counter = &counter;
                s.spawn(move || {
                    on(core, || {
                        for _ in 0..ROUNDS {
                            mux.lock();
                            let value = counter.load(Ordering::Relaxed);
                            counter.store(value + 1, Ordering::Relaxed);
                            mux.release();
                        }
                    });
                });
            }
        });

        assert_eq!(counter.load(Ordering::Relaxed), 2 * ROUNDS);
        assert_eq!(mux.snapshot(), Ok(FREE));
        assert!(!guard.is_locked());
    }

    #[cfg(not(loom))]
    mod props {
        use proptest::prelude::*;

        use super::*;

        #[derive(Debug, Clone, Copy)]
        enum Op {
            Acquire(CoreId),
            Release(CoreId),
        }

        fn op() -> impl Strategy<Value = Op> {
            (any::<bool>(), prop::sample::select(CoreId::ALL.to_vec())).prop_map(
                |(acquire, core)| {
                    if acquire {
                        Op::Acquire(core)
                    } else {
                        Op::Release(core)
                    }
                },
            )
        }

        proptest! {
            #[test]
            fn invariants_hold_across_two_cores(ops in prop::collection::vec(op(), 0..256)) {
                let mux = Mux::new();
                let mut model: Option<(CoreId, u8)> = None;

                for op in ops {
                    match op {
                        Op::Acquire(core) => {
                            let expected = match model {
                                None => Some((core, 1)),
                                Some((owner, count)) if owner == core && count < MAX_COUNT - 1 => {
                                    Some((core, count + 1))
                                }
                                Some((owner, _)) if owner == core => continue,
                                Some(_) => None,
                            };

                            let acquired = on(core, || mux.try_lock());
                            prop_assert_eq!(acquired, expected.is_some());
                            if expected.is_some() {
                                model = expected;
                            }
                        }
                        Op::Release(core) => {
                            // releasing a lock the core does not hold is covered by the
                            // `#[should_panic]` tests
                            let Some((owner, count)) = model else { continue };
                            if owner != core {
                                continue;
                            }
                            on(core, || mux.release());
                            model = (count > 1).then(|| (core, count - 1));
                        }
                    }

                    let snapshot = mux.snapshot().unwrap();
                    prop_assert_eq!(snapshot.owner == Owner::Free, snapshot.count == 0);
                    prop_assert!(snapshot.count < MAX_COUNT);
                    let expected = model.map_or(FREE, |(core, count)| held_by(core, count));
                    prop_assert_eq!(snapshot, expected);
                }
            }

            #[test]
            fn nested_acquires_unwind_to_free(depth in 1..MAX_COUNT, released in 0..MAX_COUNT) {
                let released = released.min(depth);
                let mux = Mux::new();

                on(CoreId::App, || {
                    for _ in 0..depth {
                        mux.lock();
                    }
                    for _ in 0..released {
                        mux.release();
                    }
                });

                let expected = if released == depth {
                    FREE
                } else {
                    held_by(CoreId::App, depth - released)
                };
                prop_assert_eq!(mux.snapshot(), Ok(expected));
            }
        }
    }
}
