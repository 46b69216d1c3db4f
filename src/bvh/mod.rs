//! The bounding-volume-hierarchy engine: arena allocation, a secondary
//! value→node index, and readers-writer concurrency.

pub mod bounds;
pub mod node;
pub mod tree;

pub use bounds::{BoundVolume, Bounds};
pub use tree::Bvh;
