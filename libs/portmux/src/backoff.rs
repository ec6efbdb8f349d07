// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::hint;

/// An [exponential backoff] between two exchange attempts on a contended owner word.
///
/// Keeps the contending core off the interconnect while the other core works through its
/// critical section. The exponent is capped low, since portmux critical sections are short
/// and a timeout is only checked between attempts.
///
/// [exponential backoff]: https://en.wikipedia.org/wiki/Exponential_backoff
#[derive(Debug, Copy, Clone)]
pub(crate) struct Backoff {
    exp: u8,
    max: u8,
}

// === impl Backoff ===

impl Backoff {
    /// The default maximum exponent (2^6 spin hints).
    pub(crate) const DEFAULT_MAX_EXPONENT: u8 = 6;

    #[must_use]
    pub(crate) const fn new() -> Self {
        Self {
            exp: 0,
            max: Self::DEFAULT_MAX_EXPONENT,
        }
    }

    /// Issues `2^exp` spin loop hints, then bumps the exponent until it reaches the maximum.
    #[inline(always)]
    pub(crate) fn spin(&mut self) {
        // loom (and plain test threads) need the scheduler to run the other "core".
        // See https://github.com/tokio-rs/loom/issues/162#issuecomment-665128979
        #[cfg(any(test, loom))]
        crate::loom::thread::yield_now();

        let spins = 1_u32 << self.exp;
        for _ in 0..spins {
            hint::spin_loop();
        }

        if self.exp < self.max {
            self.exp += 1;
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
