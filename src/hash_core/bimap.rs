//! A bidirectional map composing two
//! [`crate::hash_core::dictionary::Dictionary`] instances.

use crate::error::{CollectionError, Result};
use crate::hash_core::dictionary::Dictionary;

/// A one-to-one mapping queryable from either side.
///
/// A natural description of this contract serializes inserts through a
/// process-wide monitor. In Rust, `&mut self` exclusivity already gives
/// every mutating method that guarantee; there is no concurrent caller for
/// a lock to exclude. A redundant `Mutex` here would protect nothing a
/// `&mut self` receiver does not already protect. See `DESIGN.md` for the
/// worked-through rationale.
pub struct BiMap<A, B> {
    forward: Dictionary<A, B>,
    backward: Dictionary<B, A>,
}

impl<A, B> BiMap<A, B>
where
    A: std::hash::Hash + Eq + Clone + 'static,
    B: std::hash::Hash + Eq + Clone + 'static,
{
    /// An empty bimap at the default capacity floor.
    pub fn new() -> Self {
        BiMap {
            forward: Dictionary::new(),
            backward: Dictionary::new(),
        }
    }

    /// The number of pairs stored.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether the bimap holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Maps `a` ↔ `b`. Fails with [`CollectionError::DuplicateValue`] if
    /// `b` is already mapped from a different `a`, leaving both sides
    /// unchanged (reject rather than silently repoint the existing pair).
    pub fn insert(&mut self, a: A, b: B) -> Result<()> {
        if let Some(existing_a) = self.backward.get(&b) {
            if existing_a != &a {
                return Err(CollectionError::DuplicateValue);
            }
            return Ok(());
        }
        if let Some(existing_b) = self.forward.get(&a) {
            if existing_b != &b {
                return Err(CollectionError::DuplicateValue);
            }
            return Ok(());
        }
        self.forward.insert(a.clone(), b.clone())?;
        self.backward.insert(b, a)?;
        Ok(())
    }

    /// Looks up the `B` mapped from `a`.
    pub fn get_by_left(&self, a: &A) -> Option<&B> {
        self.forward.get(a)
    }

    /// Looks up the `A` mapped from `b`.
    pub fn get_by_right(&self, b: &B) -> Option<&A> {
        self.backward.get(b)
    }

    /// Removes the pair keyed by `a`, if present, returning its `B` side.
    pub fn remove_by_left(&mut self, a: &A) -> Option<B> {
        let b = self.forward.remove(a)?;
        self.backward.remove(&b);
        Some(b)
    }

    /// Removes the pair keyed by `b`, if present, returning its `A` side.
    pub fn remove_by_right(&mut self, b: &B) -> Option<A> {
        let a = self.backward.remove(b)?;
        self.forward.remove(&a);
        Some(a)
    }

    /// Removes every pair, keeping current capacity.
    pub fn clear(&mut self) {
        self.forward.clear();
        self.backward.clear();
    }
}

impl<A, B> Default for BiMap<A, B>
where
    A: std::hash::Hash + Eq + Clone + 'static,
    B: std::hash::Hash + Eq + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup_both_directions() {
        let mut m: BiMap<&str, i32> = BiMap::new();
        m.insert("one", 1).unwrap();
        m.insert("two", 2).unwrap();
        assert_eq!(m.get_by_left(&"one"), Some(&1));
        assert_eq!(m.get_by_right(&2), Some(&"two"));
    }

    #[test]
    fn reinserting_the_same_pair_is_a_no_op() {
        let mut m: BiMap<&str, i32> = BiMap::new();
        m.insert("one", 1).unwrap();
        m.insert("one", 1).unwrap();
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn conflicting_value_is_rejected() {
        let mut m: BiMap<&str, i32> = BiMap::new();
        m.insert("one", 1).unwrap();
        let err = m.insert("uno", 1).unwrap_err();
        assert_eq!(err, CollectionError::DuplicateValue);
        assert_eq!(m.get_by_right(&1), Some(&"one"));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn remove_by_either_side_clears_both_directions() {
        let mut m: BiMap<&str, i32> = BiMap::new();
        m.insert("one", 1).unwrap();
        m.remove_by_left(&"one");
        assert_eq!(m.get_by_right(&1), None);

        m.insert("two", 2).unwrap();
        m.remove_by_right(&2);
        assert_eq!(m.get_by_left(&"two"), None);
    }
}
