//! A key/value map over [`crate::hash_core::table::HashTable`].

use crate::error::{CollectionError, Result};
use crate::hash_core::table::{HashTable, Iter as TableIter};

/// The ceiling past which the table resizes rather than keep probing.
pub const DICTIONARY_LOAD_FACTOR_CEILING: f64 = 0.82;

/// A hash map with quadratic-probing open addressing, adaptive resize, and
/// a randomized-rehash escape hatch.
pub struct Dictionary<K, V> {
    table: HashTable<K, V>,
}

impl<K: std::hash::Hash + Eq + 'static, V> Dictionary<K, V> {
    /// An empty dictionary at the default capacity floor.
    pub fn new() -> Self {
        Dictionary {
            table: HashTable::new(DICTIONARY_LOAD_FACTOR_CEILING),
        }
    }

    /// An empty dictionary pre-sized to hold `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Dictionary {
            table: HashTable::with_capacity(capacity, DICTIONARY_LOAD_FACTOR_CEILING),
        }
    }
}

impl<K: AsRef<str> + Eq + 'static, V> Dictionary<K, V> {
    /// A dictionary whose keys hash through [`AsRef<str>`] (the
    /// string-keyed comparer family).
    pub fn new_string_keyed() -> Self {
        Dictionary {
            table: HashTable::new_string_keyed(DICTIONARY_LOAD_FACTOR_CEILING),
        }
    }
}

impl<K, V> Default for Dictionary<K, V>
where
    K: std::hash::Hash + Eq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Dictionary<K, V> {
    /// The number of entries currently stored.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the dictionary holds no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The number of slots currently backing the dictionary.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Inserts `key` → `value`; returns `Ok(false)` without overwriting if
    /// `key` is already present.
    pub fn insert(&mut self, key: K, value: V) -> Result<bool> {
        self.table.insert(key, value)
    }

    /// Looks up `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.table.get(key)
    }

    /// Looks up `key` mutably.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.table.get_mut(key)
    }

    /// Looks up `key`, failing with [`CollectionError::KeyNotFound`] rather
    /// than returning `None` — for call sites that treat a missing key as
    /// an error, not a valid outcome.
    pub fn get_required(&self, key: &K) -> Result<&V> {
        self.table.get(key).ok_or(CollectionError::KeyNotFound)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.table.contains_key(key)
    }

    /// Removes `key`, returning its value if present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.table.remove(key)
    }

    /// Removes every entry, keeping current capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Grows the dictionary (if needed) to hold at least `capacity`
    /// entries without resizing.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        self.table.ensure_capacity(capacity);
    }

    /// Shrinks backing storage to fit the current entry count.
    pub fn trim_excess(&mut self) {
        self.table.trim_excess();
    }

    /// Whether the comparer has already swapped to its randomized variant.
    pub fn is_randomized(&self) -> bool {
        self.table.is_randomized()
    }

    /// A cursor over `(&K, &V)` pairs; see [`Iter`].
    pub fn iter(&self) -> Iter {
        Iter(self.table.iter())
    }
}

/// A cursor over a dictionary's entries. Mirrors
/// [`crate::hash_core::table::Iter`]: `next` borrows the dictionary only for
/// the call, so structural mutation between calls is reported as
/// [`CollectionError::ConcurrentModification`] rather than rejected by the
/// borrow checker.
pub struct Iter(TableIter);

impl Iter {
    /// Advances the cursor, borrowing `dict` only for this call.
    pub fn next<'a, K, V>(&mut self, dict: &'a Dictionary<K, V>) -> Option<Result<(&'a K, &'a V)>> {
        self.0.next(&dict.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_insert_and_lookup() {
        let mut d: Dictionary<&str, i32> = Dictionary::new();
        d.insert("a", 1).unwrap();
        d.insert("b", 2).unwrap();
        assert_eq!(d.get(&"a"), Some(&1));
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn get_required_surfaces_key_not_found() {
        let d: Dictionary<&str, i32> = Dictionary::new();
        assert_eq!(d.get_required(&"missing"), Err(CollectionError::KeyNotFound));
    }

    #[test]
    fn insert_does_not_overwrite_existing_key() {
        let mut d: Dictionary<&str, i32> = Dictionary::new();
        d.insert("a", 1).unwrap();
        assert!(!d.insert("a", 2).unwrap());
        assert_eq!(d.get(&"a"), Some(&1));
    }

    #[test]
    fn remove_then_reinsert_succeeds() {
        let mut d: Dictionary<&str, i32> = Dictionary::new();
        d.insert("a", 1).unwrap();
        d.remove(&"a");
        assert!(d.insert("a", 2).unwrap());
        assert_eq!(d.get(&"a"), Some(&2));
    }

    #[test]
    fn iter_visits_every_entry() {
        let mut d: Dictionary<i32, i32> = Dictionary::new();
        for i in 0..20 {
            d.insert(i, i * i).unwrap();
        }
        let mut it = d.iter();
        let mut seen = Vec::new();
        while let Some(r) = it.next(&d) {
            let (k, v) = r.unwrap();
            seen.push((*k, *v));
        }
        seen.sort();
        let expected: Vec<_> = (0..20).map(|i| (i, i * i)).collect();
        assert_eq!(seen, expected);
    }
}
