//! Arena allocation for syntax trees.
//!
//! Every AST node produced by a parse is allocated from a bump arena owned
//! by the caller. Dropping the arena frees the whole tree at once.

use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;

/// Bump arena that owns the nodes, strings and child lists of parsed trees.
///
/// One arena may hold several trees (e.g. a file parse followed by
/// `eval` fragments); they all live until the arena is dropped or reset.
pub struct ParserArena {
    bump: Bump,
}

impl ParserArena {
    /// Create a new arena with default capacity.
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Create a new arena with the specified initial capacity in bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bump: Bump::with_capacity(capacity),
        }
    }

    /// Get a reference to the underlying bump allocator.
    #[inline]
    pub fn bump(&self) -> &Bump {
        &self.bump
    }

    /// Allocate a value in the arena and return a reference to it.
    #[inline]
    pub fn alloc<T>(&self, val: T) -> &T {
        self.bump.alloc(val)
    }

    /// Allocate a string slice in the arena.
    #[inline]
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    /// Copy a slice into the arena.
    #[inline]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> &[T] {
        self.bump.alloc_slice_copy(src)
    }

    /// Start a growable vector backed by the arena.
    #[inline]
    pub fn vec<T>(&self) -> BumpVec<'_, T> {
        BumpVec::new_in(&self.bump)
    }

    /// Returns the total bytes allocated in this arena.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Reset the arena, deallocating all objects but keeping the memory.
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}

impl Default for ParserArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_str_and_slice() {
        let arena = ParserArena::new();
        let s = arena.alloc_str("puts");
        let xs = arena.alloc_slice_copy(&[1u32, 2, 3]);
        assert_eq!(s, "puts");
        assert_eq!(xs, &[1, 2, 3]);
        assert!(arena.allocated_bytes() > 0);
    }

    #[test]
    fn test_arena_vec() {
        let arena = ParserArena::new();
        let mut v = arena.vec();
        v.push("a");
        v.push("b");
        let slice = v.into_bump_slice();
        assert_eq!(slice, &["a", "b"]);
    }
}
