//! String interning for identifier deduplication.
//!
//! Names of declarations, members and type parameters are compared far more
//! often than they are printed, so they are stored once and handed around
//! as [`Atom`] handles. Equality of two atoms from the same [`Interner`] is
//! equality of the strings.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// Interned string handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty string, pre-registered by every interner.
    pub const EMPTY: Self = Self(0);
}

struct InternerState {
    strings: Vec<Arc<str>>,
    map: FxHashMap<Arc<str>, Atom>,
}

/// Thread-safe string interner.
pub struct Interner {
    state: RwLock<InternerState>,
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    pub fn new() -> Self {
        let empty: Arc<str> = Arc::from("");
        let mut map = FxHashMap::default();
        map.insert(empty.clone(), Atom::EMPTY);
        Self {
            state: RwLock::new(InternerState {
                strings: vec![empty],
                map,
            }),
        }
    }

    /// Intern `text`, returning the existing atom when already present.
    pub fn intern(&self, text: &str) -> Atom {
        {
            let state = self.state.read().unwrap_or_else(|e| e.into_inner());
            if let Some(&atom) = state.map.get(text) {
                return atom;
            }
        }

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        // Another writer may have won the race between the two locks.
        if let Some(&atom) = state.map.get(text) {
            return atom;
        }
        let arc: Arc<str> = Arc::from(text);
        let atom = Atom(state.strings.len() as u32);
        state.strings.push(arc.clone());
        state.map.insert(arc, atom);
        atom
    }

    /// Look up an already interned string without inserting it.
    pub fn get(&self, text: &str) -> Option<Atom> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.map.get(text).copied()
    }

    /// Resolve an atom back to its text.
    ///
    /// Atoms from a different interner resolve to the empty string.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state
            .strings
            .get(atom.0 as usize)
            .cloned()
            .unwrap_or_else(|| state.strings[0].clone())
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .strings
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let interner = Interner::new();
        let a = interner.intern("value");
        let b = interner.intern("value");
        assert_eq!(a, b);
        assert_eq!(&*interner.resolve(a), "value");
    }

    #[test]
    fn distinct_strings_get_distinct_atoms() {
        let interner = Interner::new();
        let a = interner.intern("x");
        let b = interner.intern("y");
        assert_ne!(a, b);
        assert_eq!(interner.get("x"), Some(a));
        assert_eq!(interner.get("z"), None);
    }

    #[test]
    fn empty_string_is_preregistered() {
        let interner = Interner::new();
        assert_eq!(interner.intern(""), Atom::EMPTY);
        assert!(interner.is_empty());
    }
}
