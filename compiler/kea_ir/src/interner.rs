//! String interner for identifier storage.
//!
//! Provides O(1) interning and lookup. The engine is single-threaded
//! by design, so the interner uses `RefCell` interior mutability
//! rather than per-shard locking.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::Name;

/// Interner storage.
///
/// Interned strings are leaked into `'static` storage; the interner
/// lives for the whole run, so the leak is the string's lifetime.
#[derive(Default)]
struct InternerInner {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents, indexed by `Name::raw()`.
    strings: Vec<&'static str>,
}

/// Single-threaded string interner.
///
/// `Name::EMPTY` (index 0) is pre-interned so `Name::default()` always
/// resolves to the empty string.
pub struct StringInterner {
    inner: RefCell<InternerInner>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned.
    pub fn new() -> Self {
        let interner = StringInterner {
            inner: RefCell::new(InternerInner::default()),
        };
        let empty = interner.intern("");
        debug_assert_eq!(empty, Name::EMPTY);
        interner
    }

    /// Intern a string, returning its `Name`.
    ///
    /// Interning the same content twice returns the same `Name`.
    pub fn intern(&self, s: &str) -> Name {
        let mut inner = self.inner.borrow_mut();
        if let Some(&idx) = inner.map.get(s) {
            return Name::from_raw(idx);
        }
        let owned: &'static str = Box::leak(s.to_owned().into_boxed_str());
        let idx = u32::try_from(inner.strings.len()).unwrap_or_else(|_| {
            // 4 billion identifiers will not fit in a Name; treat as a
            // host bug rather than a recoverable runtime condition.
            panic!("interner capacity exceeded")
        });
        inner.strings.push(owned);
        inner.map.insert(owned, idx);
        Name::from_raw(idx)
    }

    /// Look up the string for a `Name`.
    ///
    /// # Panics
    /// Panics if `name` did not come from this interner.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.inner.borrow().strings[name.raw() as usize]
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.inner.borrow().strings.len()
    }

    /// Whether the interner holds only the pre-interned empty string.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringInterner")
            .field("len", &self.len())
            .finish()
    }
}
