//! The collaborator contract for object pooling.
//!
//! This trait names the *contract* a pooled collaborator must meet,
//! not a concrete pool implementation; none of this crate's containers
//! currently rent from a pool, but the BVH's arena reuse (free-stack index
//! recycling in [`crate::bvh::tree::Bvh`]) is the same shape this trait
//! names, so it is kept as the seam a future pooled allocator would plug
//! into.

use crate::error::{CollectionError, Result};

/// A value that can be lent out, returned, and reset for reuse.
///
/// Implementations must treat a `release` after an earlier `release` (or a
/// method call after `release` without an intervening `rent`) as
/// [`CollectionError::ObjectDisposed`].
pub trait Rentable<T> {
    /// Leases `self`, returning an error if it is already on loan.
    fn rent(&mut self) -> Result<&mut T>;
    /// Returns `self` to the pool, clearing it for the next renter.
    fn release(&mut self) -> Result<()>;
    /// Resets internal state without changing loan status.
    fn clear(&mut self);
}
