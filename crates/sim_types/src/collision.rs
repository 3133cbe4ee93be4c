//! Collision query results.
//!
//! Nothing in this module is stored: collisions are recomputed from current
//! positions every time they are asked for.

use serde::{Deserialize, Serialize};
use sim_math::{BVec3, IVec3, Vec3};

use crate::entity_type::BlockId;
use crate::ids::{EntityId, PlayerId};

/// How two bodies meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionKind {
    /// Solid bodies pushing against each other.
    Contact,
    /// At least one side is a sensor.
    Intersection,
}

/// What a body collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionTarget {
    /// A solid voxel. Cells outside the grid are reported with
    /// [`crate::OUT_OF_BOUNDS_BLOCK`].
    Block {
        /// Cell coordinates.
        position: IVec3,
        /// Block type.
        block: BlockId,
    },
    /// Another entity.
    Entity(EntityId),
    /// A player.
    Player(PlayerId),
}

/// A single contact or intersection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    /// Contact or intersection.
    pub kind: CollisionKind,
    /// The other side.
    pub target: CollisionTarget,
    /// Face normal pointing out of the target (zero for body overlaps).
    pub normal: Vec3,
    /// Displacement that would move the querying body out of the target
    /// (zero for body overlaps).
    pub resolution: Vec3,
}

impl Collision {
    /// A body-vs-body overlap.
    #[must_use]
    pub fn overlap(kind: CollisionKind, target: CollisionTarget) -> Self {
        Self {
            kind,
            target,
            normal: Vec3::ZERO,
            resolution: Vec3::ZERO,
        }
    }

    /// The entity on the other side, if any.
    #[must_use]
    pub fn entity(&self) -> Option<EntityId> {
        match self.target {
            CollisionTarget::Entity(id) => Some(id),
            _ => None,
        }
    }
}

/// Outcome of sweeping a player box along a desired displacement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementResult {
    /// Displacement after clipping each axis at first contact.
    pub corrected_displacement: Vec3,
    /// Whether any axis was clipped.
    pub would_have_collided: bool,
    /// Whether the box rests on a solid voxel after moving.
    pub is_on_ground: bool,
    /// Axes that were clipped.
    pub blocked: BVec3,
}

impl MovementResult {
    /// Zero the components of `velocity` along every blocked axis.
    #[must_use]
    pub fn constrain_velocity(&self, velocity: Vec3) -> Vec3 {
        Vec3::select(self.blocked, Vec3::ZERO, velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constrain_velocity_zeroes_blocked_axes() {
        let result = MovementResult {
            corrected_displacement: Vec3::ZERO,
            would_have_collided: true,
            is_on_ground: true,
            blocked: BVec3::new(false, true, false),
        };
        let v = result.constrain_velocity(Vec3::new(1.0, -5.0, 2.0));
        assert_eq!(v, Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn test_entity_target() {
        let c = Collision::overlap(CollisionKind::Contact, CollisionTarget::Entity(EntityId(7)));
        assert_eq!(c.entity(), Some(EntityId(7)));
        let c = Collision::overlap(CollisionKind::Contact, CollisionTarget::Player(PlayerId(7)));
        assert_eq!(c.entity(), None);
    }
}
