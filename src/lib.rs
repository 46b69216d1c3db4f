/*! # About
High-throughput, low-allocation in-memory collections for latency-sensitive
workloads: games, simulations, and spatial queries that can't tolerate GC
pauses or per-operation heap churn. Two families of containers, built on a
shared set of flat, array-backed primitives.

# Primitives
Flat building blocks the hash core and the BVH are built on top of; none of
these are meant to be reached for directly outside this crate, but they're
public because their invariants are part of what makes the containers above
them correct.

- [Entropy source](crate::primitives::entropy): a process-wide, lazily
  buffered source of randomness for the randomized-rehash escape hatch.
- [Hashing](crate::primitives::hashing): MurmurHash3, hash-code masking, and
  the swappable [`Comparer`](crate::primitives::hashing::Comparer) contract.

# Sequences
- [Ring queue](crate::sequences::ring_queue): a fixed-capacity, power-of-two
  FIFO.
- [Slot map](crate::sequences::slot_map): a stable-handle arena with
  LIFO free-slot reuse.
- [Integer stack](crate::sequences::int_stack): the BVH's reusable,
  thread-local traversal stack.

# Hash containers
Open-addressing tables with quadratic probing, adaptive resize, and a
randomized-rehash defense against adversarial collision flooding.

- [Dictionary](crate::hash_core::dictionary::Dictionary): a key/value map.
- [Set](crate::hash_core::set::Set): a hash set with the usual set algebra.
- [BiMap](crate::hash_core::bimap::BiMap): a bidirectional one-to-one map.

# BVH
- [Bvh](crate::bvh::tree::Bvh): an arena-allocated bounding volume hierarchy
  with balance-aware insertion, incremental bounds propagation, and a
  readers-writer concurrency contract for concurrent spatial queries.

# Errors
All fallible operations return [`error::CollectionError`] via
[`error::Result`].
*/

pub mod bvh;
pub mod error;
pub mod hash_core;
pub mod pool;
pub mod primitives;
pub mod sequences;

pub use bvh::Bvh;
pub use error::{CollectionError, Result};
pub use hash_core::{BiMap, Dictionary, Set};
