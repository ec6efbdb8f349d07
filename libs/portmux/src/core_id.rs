// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use core::fmt;

use crate::diag::Violation;

/// Owner word value of a lock that is not held by either core.
pub const FREE_WORD: u32 = 0xB33F_FFFF;

/// XOR of the two core words. Applying it to one core's word yields the other.
const XOR_SWAP: u32 = CoreId::Pro.to_word() ^ CoreId::App.to_word();

/// Identity of one of the two execution cores.
///
/// The discriminants are the raw processor-id register values of the two cores. They are
/// non-zero and distinct from [`FREE_WORD`], so a core identity can be stored directly in a
/// lock's owner word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CoreId {
    /// The protocol CPU, core 0.
    Pro = 0xCDCD,
    /// The application CPU, core 1.
    App = 0xABAB,
}

// === impl CoreId ===

impl CoreId {
    /// Both cores, in index order.
    pub const ALL: [CoreId; 2] = [CoreId::Pro, CoreId::App];

    /// Returns the raw word stored in a lock's owner field when this core holds it.
    #[inline]
    #[must_use]
    pub const fn to_word(self) -> u32 {
        self as u32
    }

    /// Decodes a raw register value, returning `None` for anything that is not a core word.
    #[inline]
    #[must_use]
    pub const fn from_word(word: u32) -> Option<Self> {
        match word {
            0xCDCD => Some(CoreId::Pro),
            0xABAB => Some(CoreId::App),
            _ => None,
        }
    }

    /// Returns the identity of the other core.
    #[inline]
    #[must_use]
    pub const fn other(self) -> Self {
        match Self::from_word(self.to_word() ^ XOR_SWAP) {
            Some(other) => other,
            None => unreachable!(),
        }
    }

    /// Returns the zero-based index of this core.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            CoreId::Pro => 0,
            CoreId::App => 1,
        }
    }

    /// Returns the core with the given zero-based index, if there is one.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(CoreId::Pro),
            1 => Some(CoreId::App),
            _ => None,
        }
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreId::Pro => f.write_str("PRO"),
            CoreId::App => f.write_str("APP"),
        }
    }
}

/// The decoded owner word of a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Free,
    Core(CoreId),
}

// === impl Owner ===

impl Owner {
    /// Decodes an owner word.
    ///
    /// # Errors
    ///
    /// Returns [`Violation::CorruptOwner`] if the word is neither [`FREE_WORD`] nor a core word.
    #[inline]
    pub const fn from_word(word: u32) -> Result<Self, Violation> {
        if word == FREE_WORD {
            return Ok(Owner::Free);
        }
        match CoreId::from_word(word) {
            Some(core) => Ok(Owner::Core(core)),
            None => Err(Violation::CorruptOwner { word }),
        }
    }

    #[inline]
    #[must_use]
    pub const fn to_word(self) -> u32 {
        match self {
            Owner::Free => FREE_WORD,
            Owner::Core(core) => core.to_word(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_free(self) -> bool {
        matches!(self, Owner::Free)
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Free => f.write_str("free"),
            Owner::Core(core) => fmt::Display::fmt(core, f),
        }
    }
}
