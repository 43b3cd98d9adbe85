//! Interned identifier and literal text.
//!
//! Identifiers are compared constantly during compilation (every scope
//! lookup), so the arena stores them as `Name(u32)` handles into a
//! [`StringInterner`] instead of owned strings.

use rustc_hash::FxHashMap;
use std::fmt;

/// Interned string handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Name(u32);

impl Name {
    /// Pre-interned empty string.
    pub const EMPTY: Name = Name(0);

    /// Get raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self.0)
    }
}

/// String interner owned by a [`NodeArena`](crate::NodeArena).
///
/// Interning happens while the parser builds the tree; once compilation
/// finishes the interner is only read, so it needs no locking to be shared
/// across threads together with the arena.
pub struct StringInterner {
    map: FxHashMap<Box<str>, Name>,
    strings: Vec<Box<str>>,
}

impl StringInterner {
    /// Create an interner holding only the empty string.
    pub fn new() -> Self {
        let mut interner = Self {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(64),
        };
        interner.map.insert(Box::from(""), Name::EMPTY);
        interner.strings.push(Box::from(""));
        interner
    }

    /// Intern `s`, returning the existing handle when already present.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(&name) = self.map.get(s) {
            return name;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "a single source file never holds 4 billion distinct strings"
        )]
        let name = Name(self.strings.len() as u32);
        self.map.insert(Box::from(s), name);
        self.strings.push(Box::from(s));
        name
    }

    /// Look up an already-interned string without inserting it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.map.get(s).copied()
    }

    /// Resolve a handle back to its text.
    ///
    /// Handles from another interner resolve to the empty string.
    pub fn lookup(&self, name: Name) -> &str {
        self.strings
            .get(name.0 as usize)
            .map_or("", |s| s.as_ref())
    }

    /// Number of interned strings, including the empty string.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Always false: the empty string is pre-interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
