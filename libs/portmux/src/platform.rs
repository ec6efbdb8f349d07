// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::core_id::CoreId;

/// The services a lock needs from the machine it runs on.
///
/// Implementations are usually zero-sized and read processor registers directly.
///
/// # Safety
///
/// `current_core` must return the identity of the core executing the call, and the two cores
/// of the system must never observe the same identity. Mutual exclusion depends on this.
///
/// `cycle_count` must be monotonic modulo wrap-around on each core.
pub unsafe trait Platform {
    /// Initial value for an instance of this platform, used by `const` lock constructors.
    const INIT: Self;

    /// Returns the identity of the calling core.
    fn current_core(&self) -> CoreId;

    /// Returns the current value of the calling core's free-running cycle counter.
    fn cycle_count(&self) -> u32;
}

/// How long an acquire may spin before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timeout {
    /// Spin until the lock is acquired.
    #[default]
    Never,
    /// Give up once more than this many cycles have elapsed.
    Cycles(u32),
}

// === impl Timeout ===

impl Timeout {
    /// Make a single attempt and give up as soon as the cycle counter moves.
    pub const TRY: Timeout = Timeout::Cycles(0);

    /// Bound applied to [`Timeout::Never`] when the `debug-timeout` feature is enabled.
    pub const DEBUG_FORCED_CYCLES: u32 = 10_000;

    /// Returns the cycle budget, or `None` for an unbounded wait.
    #[inline]
    #[must_use]
    pub const fn budget(self) -> Option<u32> {
        match self {
            Timeout::Never => None,
            Timeout::Cycles(cycles) => Some(cycles),
        }
    }

    /// Returns the timeout the acquire protocol actually honours.
    ///
    /// With `debug-timeout` enabled, [`Timeout::Never`] becomes
    /// [`Timeout::Cycles`]`(`[`Self::DEBUG_FORCED_CYCLES`]`)`, so a deadlock surfaces as a
    /// failed acquire instead of a hang. This changes observable behaviour and must never be
    /// enabled in production builds.
    #[inline]
    #[must_use]
    pub const fn effective(self) -> Self {
        match self {
            #[cfg(feature = "debug-timeout")]
            Timeout::Never => Timeout::Cycles(Self::DEBUG_FORCED_CYCLES),
            timeout => timeout,
        }
    }

    /// Returns `true` once `now - start` exceeds the budget. Handles counter wrap-around.
    #[inline]
    #[must_use]
    pub const fn is_expired(self, start: u32, now: u32) -> bool {
        match self {
            Timeout::Never => false,
            Timeout::Cycles(budget) => now.wrapping_sub(start) > budget,
        }
    }
}

impl From<u32> for Timeout {
    fn from(cycles: u32) -> Self {
        Timeout::Cycles(cycles)
    }
}

impl From<Option<u32>> for Timeout {
    fn from(cycles: Option<u32>) -> Self {
        cycles.map_or(Timeout::Never, Timeout::Cycles)
    }
}

/// Register accessors for implementing [`Platform`] on real hardware.
pub mod arch {
    cfg_if::cfg_if! {
        if #[cfg(any(target_arch = "riscv64", target_arch = "riscv32"))] {
            /// Reads the low 32 bits of the `cycle` CSR.
            #[inline(always)]
            #[must_use]
            pub fn cycle_count() -> u32 {
                let bits: usize;
                // Safety: reading the `cycle` CSR has no side effects
                unsafe {
                    core::arch::asm!("csrr {0}, cycle", out(reg) bits, options(nomem, nostack));
                }
                #[expect(clippy::cast_possible_truncation, reason = "wrap-around is expected")]
                let bits = bits as u32;
                bits
            }
        }
    }
}
