//! The axis-aligned bound-volume contract the BVH is built against.
//!
//! Generalizes the index-math style used elsewhere in this crate (bin heap's `2i+1`/`2i+2`
//! relationships, arena_gentree's index links) into geometry: the [`Bounds`]
//! trait is a "value contract" for bounding volumes, so a downstream crate
//! could swap in a different volume representation (spheres, 2D rects)
//! without touching [`crate::bvh::tree::Bvh`].

/// The side-effect-free, total operations a bounding volume must provide
/// for bounding volumes.
pub trait Bounds: Clone + PartialEq {
    /// The componentwise-min/max box enclosing both `self` and `other`.
    fn union(&self, other: &Self) -> Self;
    /// Whether `self` and `other` overlap on every axis.
    fn intersects(&self, other: &Self) -> bool;
    /// The volume enclosed by `self`.
    fn volume(&self) -> f32;
    /// The volume increase `self` would incur absorbing `other`:
    /// `floor(volume(union(self, other)) - volume(other))`.
    fn cost(&self, other: &Self) -> f32 {
        (self.union(other).volume() - other.volume()).floor()
    }
}

/// An axis-aligned box in three dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundVolume {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundVolume {
    /// Builds a box from raw min/max corners. Callers are responsible for
    /// `min[i] <= max[i]` on every axis; a degenerate (point) box is legal.
    pub fn new(min: [f32; 3], max: [f32; 3]) -> BoundVolume {
        BoundVolume { min, max }
    }

    /// The box's midpoint.
    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// The box's extent on each axis.
    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    /// Whether `point` lies within (or on the boundary of) this box.
    pub fn contains_point(&self, point: [f32; 3]) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

impl Bounds for BoundVolume {
    fn union(&self, other: &Self) -> Self {
        BoundVolume {
            min: [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
                self.min[2].min(other.min[2]),
            ],
            max: [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
                self.max[2].max(other.max[2]),
            ],
        }
    }

    fn intersects(&self, other: &Self) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }

    fn volume(&self) -> f32 {
        let size = self.size();
        size[0] * size[1] * size[2]
    }
}
