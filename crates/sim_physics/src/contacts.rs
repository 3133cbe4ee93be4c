//! Block penetration queries.
//!
//! For every solid voxel a box penetrates, each of the voxel's six faces
//! proposes an escape vector that pushes the box just past that face. Only
//! escapes that leave the box clear of every solid voxel are reported, so
//! a script can pick any of them and be sure it lands somewhere free.

use sim_math::{Aabb, Vec3};
use sim_types::{Collision, CollisionKind, CollisionTarget};

use crate::blocks::BlockGrid;

/// Escape vectors overshoot the face by this factor so the resolved box
/// does not rest exactly on the voxel.
pub const RESOLUTION_SCALE: f32 = 1.1;

const FACE_NORMALS: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

/// All block collisions of `body`, reported with the given `kind`.
///
/// A penetrated voxel with no freeing escape still produces one entry,
/// using its shallowest face, so the contact is never lost.
#[must_use]
pub fn block_collisions(grid: &BlockGrid, body: &Aabb, kind: CollisionKind) -> Vec<Collision> {
    let mut collisions = Vec::new();
    for cell in grid.cells_near(body) {
        if !grid.is_solid(cell) {
            continue;
        }
        let voxel = Aabb::voxel(cell);
        if !voxel.overlaps(body) {
            continue;
        }
        let target = CollisionTarget::Block {
            position: cell,
            block: grid.collision_block(cell),
        };

        let escapes: Vec<(Vec3, Vec3)> = FACE_NORMALS
            .iter()
            .map(|&normal| (normal, escape_through(body, &voxel, normal)))
            .collect();

        let before = collisions.len();
        for &(normal, resolution) in &escapes {
            if is_clear(grid, &body.translated(resolution)) {
                collisions.push(Collision {
                    kind,
                    target,
                    normal,
                    resolution,
                });
            }
        }
        if collisions.len() == before
            && let Some(&(normal, resolution)) = escapes
                .iter()
                .min_by(|a, b| a.1.length_squared().total_cmp(&b.1.length_squared()))
        {
            collisions.push(Collision {
                kind,
                target,
                normal,
                resolution,
            });
        }
    }
    collisions
}

/// Displacement moving `body` out of `voxel` through the face with `normal`.
fn escape_through(body: &Aabb, voxel: &Aabb, normal: Vec3) -> Vec3 {
    let depth = if normal.max_element() > 0.0 {
        // Positive face: body min must reach voxel max.
        (voxel.max - body.min).dot(normal)
    } else {
        (body.max - voxel.min).dot(-normal)
    };
    normal * depth * RESOLUTION_SCALE
}

fn is_clear(grid: &BlockGrid, body: &Aabb) -> bool {
    !grid
        .cells_near(body)
        .any(|cell| grid.is_solid(cell) && Aabb::voxel(cell).overlaps(body))
}
