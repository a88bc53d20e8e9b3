//! String interning for identifiers and file names.
//!
//! Variable names held by the scope table and the file component of every
//! `SourceSpan` are interned so they compare as integers.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// An interned string identifier. A lightweight `u32` handle that resolves
/// back to the string through the `StringInterner` that produced it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct InternedString(Spur);

impl InternedString {
    /// Create from a raw lasso key.
    #[inline]
    pub fn from_spur(spur: Spur) -> Self {
        Self(spur)
    }

    /// Get the raw lasso key.
    #[inline]
    pub fn as_spur(self) -> Spur {
        self.0
    }
}

impl fmt::Debug for InternedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InternedString({:?})", self.0)
    }
}

/// Thread-safe string interner.
///
/// Cloning is cheap and shares the underlying table, so a parser pool can
/// hand the same interner to parsers running on different threads.
#[derive(Clone)]
pub struct StringInterner {
    rodeo: Arc<ThreadedRodeo>,
}

impl StringInterner {
    /// Create a new string interner.
    pub fn new() -> Self {
        Self {
            rodeo: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Create a new string interner with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let bytes = NonZeroUsize::new(capacity * 8).unwrap_or(NonZeroUsize::MIN);
        Self {
            rodeo: Arc::new(ThreadedRodeo::with_capacity(lasso::Capacity::new(
                capacity, bytes,
            ))),
        }
    }

    /// Intern a string, returning a handle to the interned value.
    #[inline]
    pub fn intern(&self, s: &str) -> InternedString {
        InternedString::from_spur(self.rodeo.get_or_intern(s))
    }

    /// Intern a static string.
    #[inline]
    pub fn intern_static(&self, s: &'static str) -> InternedString {
        InternedString::from_spur(self.rodeo.get_or_intern_static(s))
    }

    /// Look up an already-interned string without interning it if absent.
    #[inline]
    pub fn get(&self, s: &str) -> Option<InternedString> {
        self.rodeo.get(s).map(InternedString::from_spur)
    }

    /// Resolve an interned string handle back to its string content.
    #[inline]
    pub fn resolve(&self, key: InternedString) -> &str {
        self.rodeo.resolve(&key.as_spur())
    }

    /// Returns the number of interned strings.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns true if no strings have been interned.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }

    /// A `Display` adapter for `key`.
    pub fn display(&self, key: InternedString) -> DisplayInterned<'_> {
        DisplayInterned {
            key,
            interner: self,
        }
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringInterner")
            .field("len", &self.len())
            .finish()
    }
}

/// Displays an `InternedString` through its interner.
pub struct DisplayInterned<'a> {
    pub key: InternedString,
    pub interner: &'a StringInterner,
}

impl<'a> fmt::Display for DisplayInterned<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.interner.resolve(self.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_resolve() {
        let interner = StringInterner::new();
        let a = interner.intern("foo");
        let b = interner.intern("foo");
        let c = interner.intern("bar");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(interner.resolve(a), "foo");
        assert_eq!(interner.resolve(c), "bar");
    }

    #[test]
    fn test_get() {
        let interner = StringInterner::new();
        assert!(interner.get("@ivar").is_none());
        let a = interner.intern("@ivar");
        assert_eq!(interner.get("@ivar"), Some(a));
    }

    #[test]
    fn test_shared_between_clones() {
        let interner = StringInterner::with_capacity(4);
        let other = interner.clone();
        let a = interner.intern_static("main.rb");
        assert_eq!(other.get("main.rb"), Some(a));
        assert_eq!(other.display(a).to_string(), "main.rb");
    }
}
