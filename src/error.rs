//! The error taxonomy shared by every container in this crate.
//!
//! Read-only lookups (`get`, `contains`, `find_*`) never return
//! [`CollectionError`]; they use `Option`/`bool` for the not-found case.
//! The variants below are reserved for mutating APIs and for invariants
//! that are only violated by programmer error or a live-iterator hazard.

use thiserror::Error;

/// Errors surfaced by the hash containers and the BVH.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CollectionError {
    /// A null/absent key, value, or bound volume where one is mandatory,
    /// or a malformed capacity request.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A mandatory-lookup API (e.g. indexed `get`) was called with a key
    /// that is not present.
    #[error("key not found")]
    KeyNotFound,

    /// A `BiMap` insert whose reverse side is already occupied by a
    /// different key.
    #[error("value already mapped from a different key")]
    DuplicateValue,

    /// A structural mutation was observed by a live iterator.
    #[error("container mutated while iterating")]
    ConcurrentModification,

    /// An internal invariant was violated (e.g. a bucket entry points at a
    /// non-leaf node). Not expected to occur in normal operation.
    #[error("internal invariant violated: {0}")]
    Corruption(&'static str),

    /// A pool collaborator was used after it was disposed.
    #[error("object used after disposal")]
    ObjectDisposed,
}

/// Convenience alias used throughout the crate's public APIs.
pub type Result<T> = std::result::Result<T, CollectionError>;
