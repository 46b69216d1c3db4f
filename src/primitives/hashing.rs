//! Hash normalization, MurmurHash3, and the swappable key-comparer contract.
//!
//! This generalizes `maps::hash_lib` (which hard-codes a
//! single `DefaultHasher` + MAD-compression pipeline) into a pluggable
//! [`Comparer`] so the hash core can swap from a deterministic default to a
//! randomized variant mid-table, per the anti-collision-flooding design.

use std::collections::hash_map::DefaultHasher;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use crate::primitives::entropy::EntropySource;

/// Strips the sign bit so a hash code can be stored as a non-negative `u31`.
pub const HASH_MASK: u32 = 0x7FFF_FFFF;

/// Rounds `n` up to the next power of two, with an `8`-entry floor matching
/// the hash containers' default-capacity floor.
pub fn next_power_of_two(n: usize) -> usize {
    let floor = 8usize;
    if n <= floor {
        return floor;
    }
    n.next_power_of_two()
}

/// 32-bit MurmurHash3 (`x86_32` variant), seeded so randomized rehashing can
/// key the digest with process entropy.
pub fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    const C1: u32 = 0xcc9e2d51;
    const C2: u32 = 0x1b873593;

    let mut hash = seed;
    let chunks = data.chunks_exact(4);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(C1);
        k = k.rotate_left(15);
        k = k.wrapping_mul(C2);

        hash ^= k;
        hash = hash.rotate_left(13);
        hash = hash.wrapping_mul(5).wrapping_add(0xe6546b64);
    }

    let mut k1 = 0u32;
    match remainder.len() {
        3 => {
            k1 ^= (remainder[2] as u32) << 16;
            k1 ^= (remainder[1] as u32) << 8;
            k1 ^= remainder[0] as u32;
        }
        2 => {
            k1 ^= (remainder[1] as u32) << 8;
            k1 ^= remainder[0] as u32;
        }
        1 => {
            k1 ^= remainder[0] as u32;
        }
        _ => {}
    }
    if !remainder.is_empty() {
        k1 = k1.wrapping_mul(C1);
        k1 = k1.rotate_left(15);
        k1 = k1.wrapping_mul(C2);
        hash ^= k1;
    }

    hash ^= data.len() as u32;
    hash ^= hash >> 16;
    hash = hash.wrapping_mul(0x85ebca6b);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0xc2b2ae35);
    hash ^= hash >> 16;
    hash
}

/// The value contract keys must satisfy: a deterministic hash
/// consistent with equality, and an equality check. Implementations are
/// swapped at runtime by [`crate::hash_core::table::HashTable`] when probe
/// depth indicates adversarial collision flooding; `is_randomized` prevents
/// repeat swaps.
pub trait Comparer<K>: Debug {
    /// Returns a masked, non-tombstone hash code for `key`.
    fn hash(&self, key: &K) -> u32;
    /// Returns whether `a` and `b` denote the same key.
    fn equals(&self, a: &K, b: &K) -> bool;
    /// True once this comparer has already been swapped to a randomized
    /// variant; prevents repeat-swapping.
    fn is_randomized(&self) -> bool;
}

fn std_hash<K: Hash + ?Sized>(key: &K) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// A masked 31-bit standard-library hash, for callers that only need a
/// bucket index and don't participate in the swappable-[`Comparer`]
/// machinery — e.g. the BVH's secondary value→node index.
pub fn std_hash_u32<K: Hash + ?Sized>(key: &K) -> u32 {
    (std_hash(key) as u32) & HASH_MASK
}

/// Which family of randomized comparer a table's default belongs to; a
/// capability marker tested by pattern match rather than runtime type
/// identity, selected once at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparerFlavor {
    /// Arbitrary `Hash + Eq` keys; the randomized escape hatch XORs the
    /// standard-library hash with process entropy.
    Object,
    /// String-like keys; the randomized escape hatch re-hashes with
    /// MurmurHash3 seeded from process entropy.
    String,
}

/// The ecosystem-default comparer for arbitrary `Hash + Eq` keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultObjectComparer;

impl<K: Hash + Eq> Comparer<K> for DefaultObjectComparer {
    fn hash(&self, key: &K) -> u32 {
        (std_hash(key) as u32) & HASH_MASK
    }
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
    fn is_randomized(&self) -> bool {
        false
    }
}

/// The randomized escape-hatch comparer for arbitrary `Hash + Eq` keys.
#[derive(Debug, Clone, Copy)]
pub struct RandomizedObjectComparer {
    entropy: u64,
}

impl RandomizedObjectComparer {
    pub fn seeded() -> Self {
        RandomizedObjectComparer {
            entropy: EntropySource::global().next_u64(),
        }
    }
}

impl<K: Hash + Eq> Comparer<K> for RandomizedObjectComparer {
    fn hash(&self, key: &K) -> u32 {
        ((std_hash(key) ^ self.entropy) as u32) & HASH_MASK
    }
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
    fn is_randomized(&self) -> bool {
        true
    }
}

/// The ecosystem-default comparer for string-like keys.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStringComparer;

impl<K: AsRef<str> + Eq> Comparer<K> for DefaultStringComparer {
    fn hash(&self, key: &K) -> u32 {
        (std_hash(key.as_ref()) as u32) & HASH_MASK
    }
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
    fn is_randomized(&self) -> bool {
        false
    }
}

/// The randomized escape-hatch comparer for string-like keys: MurmurHash3
/// seeded with the entropy value truncated to 31 bits.
#[derive(Debug, Clone, Copy)]
pub struct RandomizedStringComparer {
    seed31: u32,
}

impl RandomizedStringComparer {
    pub fn seeded() -> Self {
        RandomizedStringComparer {
            seed31: (EntropySource::global().next_u64() as u32) & HASH_MASK,
        }
    }
}

impl<K: AsRef<str> + Eq> Comparer<K> for RandomizedStringComparer {
    fn hash(&self, key: &K) -> u32 {
        murmur3_32(key.as_ref().as_bytes(), self.seed31) & HASH_MASK
    }
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
    fn is_randomized(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_power_of_two_floors_at_eight() {
        assert_eq!(next_power_of_two(0), 8);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(8), 8);
        assert_eq!(next_power_of_two(9), 16);
        assert_eq!(next_power_of_two(31), 32);
        assert_eq!(next_power_of_two(32), 32);
    }

    #[test]
    fn murmur3_is_deterministic_for_a_fixed_seed() {
        let a = murmur3_32(b"hello world", 42);
        let b = murmur3_32(b"hello world", 42);
        assert_eq!(a, b);
    }

    #[test]
    fn murmur3_seed_changes_digest() {
        let a = murmur3_32(b"hello world", 1);
        let b = murmur3_32(b"hello world", 2);
        assert_ne!(a, b);
    }

    #[test]
    fn murmur3_handles_all_tail_lengths() {
        // Exercises the 0/1/2/3-byte remainder branches.
        for len in 0..8 {
            let data = vec![0xABu8; len];
            let _ = murmur3_32(&data, 7);
        }
    }

    #[test]
    fn default_object_comparer_is_not_randomized() {
        let c = DefaultObjectComparer;
        assert!(!Comparer::<i32>::is_randomized(&c));
        assert!(Comparer::<i32>::equals(&c, &5, &5));
        assert!(!Comparer::<i32>::equals(&c, &5, &6));
    }

    #[test]
    fn randomized_object_comparer_marks_itself() {
        let c = RandomizedObjectComparer::seeded();
        assert!(Comparer::<i32>::is_randomized(&c));
    }

    #[test]
    fn masked_hash_never_sets_the_sign_bit() {
        let c = DefaultObjectComparer;
        for k in 0..1000i64 {
            assert_eq!(Comparer::<i64>::hash(&c, &k) & !HASH_MASK, 0);
        }
    }
}
