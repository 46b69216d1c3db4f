//! A hash set over [`crate::hash_core::table::HashTable`],
//! generalizing `maps::hash_set`'s iterator-adapter style for
//! union/intersection/difference.

use crate::error::Result;
use crate::hash_core::table::HashTable;

/// The ceiling past which the table resizes; looser than
/// [`crate::hash_core::dictionary::DICTIONARY_LOAD_FACTOR_CEILING`] since a
/// set's slots carry no value payload.
pub const SET_LOAD_FACTOR_CEILING: f64 = 0.85;

/// A hash set with the same open-addressing core as
/// [`crate::hash_core::dictionary::Dictionary`].
pub struct Set<T> {
    table: HashTable<T, ()>,
}

impl<T: std::hash::Hash + Eq + 'static> Set<T> {
    /// An empty set at the default capacity floor.
    pub fn new() -> Self {
        Set {
            table: HashTable::new(SET_LOAD_FACTOR_CEILING),
        }
    }

    /// An empty set pre-sized to hold `capacity` members.
    pub fn with_capacity(capacity: usize) -> Self {
        Set {
            table: HashTable::with_capacity(capacity, SET_LOAD_FACTOR_CEILING),
        }
    }
}

impl<T: std::hash::Hash + Eq + 'static> Default for Set<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Set<T> {
    /// The number of members.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the set holds no members.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Adds `value`; returns `Ok(false)` if it was already a member.
    pub fn insert(&mut self, value: T) -> Result<bool> {
        self.table.insert(value, ())
    }

    /// Whether `value` is a member.
    pub fn contains(&self, value: &T) -> bool {
        self.table.contains_key(value)
    }

    /// Removes `value`, returning whether it had been a member.
    pub fn remove(&mut self, value: &T) -> bool {
        self.table.remove(value).is_some()
    }

    /// Removes every member, keeping current capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// An iterator over the set's members, in no particular order.
    ///
    /// Unlike [`crate::hash_core::table::Iter`], this holds an ordinary
    /// shared borrow of the set for its whole lifetime (the usual
    /// [`Iterator`] contract), which is what the set-algebra combinators
    /// below need to chain and filter with.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let table = &self.table;
        let mut cursor = table.iter();
        std::iter::from_fn(move || loop {
            match cursor.next(table)? {
                Ok((key, _)) => return Some(key),
                Err(_) => return None,
            }
        })
    }
}

impl<T: std::hash::Hash + Eq + 'static + Clone> Set<T> {
    /// Members present in either `self` or `other`.
    pub fn union<'a>(&'a self, other: &'a Set<T>) -> impl Iterator<Item = T> + 'a {
        self.iter()
            .cloned()
            .chain(other.iter().filter(move |v| !self.contains(v)).cloned())
    }

    /// Members present in both `self` and `other`.
    pub fn intersection<'a>(&'a self, other: &'a Set<T>) -> impl Iterator<Item = &'a T> {
        self.iter().filter(move |v| other.contains(v))
    }

    /// Members present in `self` but absent from `other`.
    pub fn difference<'a>(&'a self, other: &'a Set<T>) -> impl Iterator<Item = &'a T> {
        self.iter().filter(move |v| !other.contains(v))
    }

    /// Members present in exactly one of `self`, `other`.
    pub fn symmetric_difference<'a>(&'a self, other: &'a Set<T>) -> impl Iterator<Item = T> + 'a {
        self.difference(other)
            .cloned()
            .chain(other.difference(self).cloned())
    }
}
