//! Axis-aligned bounding boxes.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Tolerance used by overlap tests so that boxes resting exactly on a face
/// are not reported as penetrating.
pub const OVERLAP_EPSILON: f32 = 1e-4;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from its corners.
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box whose bottom face is centred on `feet` with the given full size.
    #[must_use]
    pub fn from_feet(feet: Vec3, size: Vec3) -> Self {
        let half = Vec3::new(size.x / 2.0, 0.0, size.z / 2.0);
        Self {
            min: feet - half,
            max: feet + half + Vec3::new(0.0, size.y, 0.0),
        }
    }

    /// Box centred on `center` with the given half extents.
    #[must_use]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// The unit box occupied by the voxel at `cell`.
    #[must_use]
    pub fn voxel(cell: IVec3) -> Self {
        let min = cell.as_vec3();
        Self {
            min,
            max: min + Vec3::ONE,
        }
    }

    /// Returns this box moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns `true` if the boxes share volume (touching faces do not count).
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x - OVERLAP_EPSILON
            && self.max.x > other.min.x + OVERLAP_EPSILON
            && self.min.y < other.max.y - OVERLAP_EPSILON
            && self.max.y > other.min.y + OVERLAP_EPSILON
            && self.min.z < other.max.z - OVERLAP_EPSILON
            && self.max.z > other.min.z + OVERLAP_EPSILON
    }

    /// Returns `true` if the boxes overlap or touch.
    #[must_use]
    pub fn touches(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Every voxel cell this box could share volume with, limited to the
    /// inclusive range `lo..=hi`. Non-finite corners saturate into the range.
    pub fn cells_within(&self, lo: IVec3, hi: IVec3) -> impl Iterator<Item = IVec3> + use<> {
        let min = self.min.floor().as_ivec3().clamp(lo, hi);
        let max = self.max.floor().as_ivec3().clamp(lo, hi);
        (min.x..=max.x).flat_map(move |x| {
            (min.y..=max.y).flat_map(move |y| (min.z..=max.z).map(move |z| IVec3::new(x, y, z)))
        })
    }

    /// Centre point of the box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}
