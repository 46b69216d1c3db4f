//! The open-addressing hash core shared by [`crate::hash_core::dictionary::Dictionary`],
//! [`crate::hash_core::set::Set`], and [`crate::hash_core::bimap::BiMap`]
//! and a randomized-rehash defense against collision flooding.
//!
//! Generalizes `maps::hash_lib::HashMap` (fixed
//! `DefaultHasher`, backward-shift deletion, no adaptive growth) into a
//! table whose key comparer can be swapped at runtime and whose growth
//! factor tracks a moving average of post-resize fill rate.

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::{CollectionError, Result};
use crate::primitives::hashing::{
    next_power_of_two, Comparer, ComparerFlavor, DefaultObjectComparer, DefaultStringComparer,
    RandomizedObjectComparer, RandomizedStringComparer,
};

/// A probe threshold beyond which a single insert is treated as evidence of
/// adversarial collision flooding.
const RANDOMIZED_REHASH_PROBE_THRESHOLD: usize = 100;

/// One cell of the table. `Tombstone` is distinguished from `Empty` because
/// only `Empty` may stop a lookup probe; a lookup must cross tombstones to
/// find keys displaced past a deletion.
#[derive(Debug, Clone)]
enum Slot<K, V> {
    Empty,
    Tombstone,
    Live { hash: u32, key: K, value: V },
}

impl<K, V> Slot<K, V> {
    fn is_live(&self) -> bool {
        matches!(self, Slot::Live { .. })
    }
}

/// An open-addressing hash table with quadratic probing, adaptive resize,
/// and a randomized-rehash escape hatch against collision flooding.
pub struct HashTable<K, V> {
    slots: Vec<Slot<K, V>>,
    mask: usize,
    count: usize,
    /// Highest index ever written; bounds the rescan during a resize so it
    /// never walks past the table's high-water mark.
    last_touched_index: usize,
    comparer: Box<dyn Comparer<K>>,
    comparer_flavor: ComparerFlavor,
    /// Captured at construction, when the caller's bound (`Hash + Eq` vs
    /// `AsRef<str> + Eq`) is still in scope; lets the generic impl below
    /// swap comparers without re-deriving that bound per flavor at
    /// rehash time.
    make_randomized: fn() -> Box<dyn Comparer<K>>,
    resize_factor: usize,
    moving_fill_rate: f64,
    moving_seeded: bool,
    max_probe_steps: usize,
    version: u32,
    load_factor_ceiling: f64,
}

impl<K: Debug, V: Debug> Debug for HashTable<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashTable")
            .field("count", &self.count)
            .field("capacity", &self.slots.len())
            .field("flavor", &self.comparer_flavor)
            .field("comparer", &self.comparer)
            .finish()
    }
}

impl<K, V> HashTable<K, V> {
    fn with_comparer(
        capacity: usize,
        load_factor_ceiling: f64,
        comparer: Box<dyn Comparer<K>>,
        comparer_flavor: ComparerFlavor,
        make_randomized: fn() -> Box<dyn Comparer<K>>,
    ) -> Self {
        let capacity = next_power_of_two(capacity);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot::Empty);
        HashTable {
            slots,
            mask: capacity - 1,
            count: 0,
            last_touched_index: 0,
            comparer,
            comparer_flavor,
            make_randomized,
            resize_factor: 4,
            moving_fill_rate: 0.0,
            moving_seeded: false,
            max_probe_steps: 0,
            version: 0,
            load_factor_ceiling,
        }
    }

    /// The number of live key/value pairs.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the table holds no live pairs.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The number of slots currently backing the table.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether this table's comparer has already been swapped to its
    /// randomized variant.
    pub fn is_randomized(&self) -> bool {
        self.comparer.is_randomized()
    }
}

impl<K: Hash + Eq + 'static, V> HashTable<K, V> {
    /// A table with the default capacity floor and the standard-library
    /// default comparer.
    pub fn new(load_factor_ceiling: f64) -> Self {
        Self::with_capacity(0, load_factor_ceiling)
    }

    /// A table pre-sized (rounded to the next power of two) to hold at
    /// least `capacity` entries without resizing.
    pub fn with_capacity(capacity: usize, load_factor_ceiling: f64) -> Self {
        Self::with_comparer(
            capacity,
            load_factor_ceiling,
            Box::new(DefaultObjectComparer),
            ComparerFlavor::Object,
            || Box::new(RandomizedObjectComparer::seeded()),
        )
    }
}

impl<K: AsRef<str> + Eq + 'static, V> HashTable<K, V> {
    /// A table whose comparer hashes through [`AsRef<str>`], so its
    /// randomized escape hatch re-hashes with MurmurHash3 rather than
    /// XOR-ing the standard-library digest.
    pub fn new_string_keyed(load_factor_ceiling: f64) -> Self {
        Self::with_comparer(
            0,
            load_factor_ceiling,
            Box::new(DefaultStringComparer),
            ComparerFlavor::String,
            || Box::new(RandomizedStringComparer::seeded()),
        )
    }
}

impl<K, V> HashTable<K, V> {
    fn probe(&self, hash: u32) -> usize {
        (hash as usize) & self.mask
    }

    fn quadratic_step(&self, base: usize, k: usize) -> usize {
        base.wrapping_add(k.wrapping_mul(k)) & self.mask
    }

    /// Returns the slot index holding `key`, crossing tombstones but
    /// stopping at the first never-used slot.
    fn find_index(&self, key: &K) -> Option<usize> {
        let h = self.comparer.hash(key);
        let mut idx = self.probe(h);
        let mut k = 0usize;
        loop {
            match &self.slots[idx] {
                Slot::Live {
                    hash,
                    key: existing,
                    ..
                } if *hash == h && self.comparer.equals(key, existing) => return Some(idx),
                Slot::Empty => return None,
                _ => {
                    k += 1;
                    if k > self.slots.len() {
                        return None;
                    }
                    idx = self.quadratic_step(idx, k);
                }
            }
        }
    }

    /// Returns a reference to the value mapped from `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        let idx = self.find_index(key)?;
        match &self.slots[idx] {
            Slot::Live { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value mapped from `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.find_index(key)?;
        match &mut self.slots[idx] {
            Slot::Live { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Whether `key` is currently mapped.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find_index(key).is_some()
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.find_index(key)?;
        let removed = std::mem::replace(&mut self.slots[idx], Slot::Tombstone);
        self.count -= 1;
        self.version = self.version.wrapping_add(1);
        match removed {
            Slot::Live { value, .. } => Some(value),
            _ => unreachable!("find_index only returns indices of Live slots"),
        }
    }

    /// Inserts `key` → `value`, aborting without overwriting if `key` is
    /// already mapped (a deliberate departure from a conventional map's
    /// overwrite-on-put).
    ///
    /// Scans past tombstones only while checking for a collision; the
    /// first tombstone or never-used slot encountered becomes the
    /// insertion point, so a duplicate key sitting behind a tombstone is
    /// not detected. This is the literal reading of the probe-termination
    /// rule, not an oversight.
    pub fn insert(&mut self, key: K, value: V) -> Result<bool> {
        let h = self.comparer.hash(&key);
        let mut idx = self.probe(h);
        let mut k = 0usize;
        loop {
            match &self.slots[idx] {
                Slot::Live {
                    hash,
                    key: existing,
                    ..
                } if *hash == h && self.comparer.equals(&key, existing) => {
                    return Ok(false);
                }
                Slot::Live { .. } => {
                    k += 1;
                    if k > self.slots.len() {
                        return Err(CollectionError::Corruption(
                            "probe exhausted capacity without finding a free slot",
                        ));
                    }
                    idx = self.quadratic_step(idx, k);
                }
                Slot::Tombstone | Slot::Empty => break,
            }
        }

        self.slots[idx] = Slot::Live {
            hash: h,
            key,
            value,
        };
        self.count += 1;
        self.version = self.version.wrapping_add(1);
        self.last_touched_index = self.last_touched_index.max(idx);

        if k > self.max_probe_steps {
            self.max_probe_steps = k;
            if k > RANDOMIZED_REHASH_PROBE_THRESHOLD && !self.comparer.is_randomized() {
                tracing::warn!(probe_steps = k, "randomized rehash triggered");
                self.trigger_randomized_rehash();
            }
        }

        self.maybe_resize();
        Ok(true)
    }

    fn rebuild(&mut self, new_capacity: usize, recompute_hash: bool) {
        let new_capacity = next_power_of_two(new_capacity);
        let mut new_slots = Vec::with_capacity(new_capacity);
        new_slots.resize_with(new_capacity, || Slot::Empty);
        let new_mask = new_capacity - 1;

        let old_slots = std::mem::replace(&mut self.slots, Vec::new());
        let scan_to = self.last_touched_index.min(old_slots.len().saturating_sub(1));
        let mut new_last_touched = 0usize;

        for slot in old_slots.into_iter().take(scan_to + 1) {
            if let Slot::Live { hash, key, value } = slot {
                let h = if recompute_hash {
                    self.comparer.hash(&key)
                } else {
                    hash
                };
                let mut idx = (h as usize) & new_mask;
                let mut k = 0usize;
                while new_slots[idx].is_live() {
                    k += 1;
                    idx = idx.wrapping_add(k.wrapping_mul(k)) & new_mask;
                }
                new_slots[idx] = Slot::Live {
                    hash: h,
                    key,
                    value,
                };
                new_last_touched = new_last_touched.max(idx);
            }
        }

        self.slots = new_slots;
        self.mask = new_mask;
        self.last_touched_index = new_last_touched;
        self.max_probe_steps = 0;
    }

    fn trigger_randomized_rehash(&mut self) {
        self.comparer = (self.make_randomized)();
        let capacity = self.slots.len();
        self.rebuild(capacity, true);
    }

    fn maybe_resize(&mut self) {
        let len = self.slots.len();
        let fill = self.count as f64 / len as f64;
        if fill < self.load_factor_ceiling {
            return;
        }

        let new_len = next_power_of_two(len * self.resize_factor);
        let projected_fill = self.count as f64 / new_len as f64;
        if self.moving_seeded {
            self.moving_fill_rate = 0.7 * self.moving_fill_rate + 0.3 * projected_fill;
        } else {
            self.moving_fill_rate = projected_fill;
            self.moving_seeded = true;
        }

        self.resize_factor = if self.moving_fill_rate > 0.30 {
            2
        } else if self.moving_fill_rate < 0.28 {
            4
        } else {
            self.resize_factor
        };

        tracing::debug!(
            old_capacity = len,
            new_capacity = new_len,
            moving_fill_rate = self.moving_fill_rate,
            "hash table resize"
        );
        self.rebuild(new_len, false);
    }

    /// Grows the table (if needed) so it can hold at least `capacity`
    /// entries without resizing.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let target = next_power_of_two(capacity);
        if target > self.slots.len() {
            self.rebuild(target, false);
        }
    }

    /// Shrinks backing storage to the smallest power of two that still
    /// respects the load-factor ceiling for the current entry count.
    pub fn trim_excess(&mut self) {
        let minimum = ((self.count as f64 / self.load_factor_ceiling).ceil() as usize).max(1);
        let target = next_power_of_two(minimum);
        if target < self.slots.len() {
            self.rebuild(target, false);
        }
    }

    /// Removes every entry, keeping the table's current capacity.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.count = 0;
        self.last_touched_index = 0;
        self.max_probe_steps = 0;
        self.version = self.version.wrapping_add(1);
    }

    /// A cursor over `(&K, &V)` pairs; see [`Iter`].
    pub fn iter(&self) -> Iter {
        Iter {
            index: 0,
            version: self.version,
            errored: false,
        }
    }
}

/// A cursor over a table's live entries.
///
/// Unlike [`std::iter::Iterator`], `next` borrows the table only for the
/// duration of the call instead of capturing a borrow at construction time,
/// so the table can be mutated freely between calls. A mutation landing
/// between two calls is detected by comparing the table's version counter
/// against the snapshot taken when the cursor was created: the next call
/// yields one [`CollectionError::ConcurrentModification`], after which the
/// cursor is exhausted.
pub struct Iter {
    index: usize,
    version: u32,
    errored: bool,
}

impl Iter {
    /// Advances the cursor, borrowing `table` only for this call.
    pub fn next<'a, K, V>(
        &mut self,
        table: &'a HashTable<K, V>,
    ) -> Option<std::result::Result<(&'a K, &'a V), CollectionError>> {
        if self.errored {
            return None;
        }
        if table.version != self.version {
            self.errored = true;
            return Some(Err(CollectionError::ConcurrentModification));
        }
        while self.index < table.slots.len() {
            let i = self.index;
            self.index += 1;
            if let Slot::Live { key, value, .. } = &table.slots[i] {
                return Some(Ok((key, value)));
            }
        }
        None
    }
}
