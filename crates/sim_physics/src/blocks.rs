//! Dense voxel block grid.

use serde::{Deserialize, Serialize};
use sim_math::{Aabb, IVec3};
use sim_types::{BlockId, EMPTY_BLOCK, OUT_OF_BOUNDS_BLOCK};
use thiserror::Error;

/// Upper bound on the number of cells in a grid.
pub const MAX_BLOCKS: usize = 1 << 28;

/// Errors produced when building a grid from external data.
#[derive(Debug, Error)]
pub enum BlockGridError {
    /// A dimension was zero or negative.
    #[error("invalid grid size {0}")]
    InvalidSize(IVec3),
    /// The grid would hold more than [`MAX_BLOCKS`] cells.
    #[error("grid of size {0} is too large")]
    TooLarge(IVec3),
    /// The block list does not match the declared size.
    #[error("grid of size {size} needs {expected} blocks, got {actual}")]
    LengthMismatch {
        size: IVec3,
        expected: usize,
        actual: usize,
    },
    /// The JSON document could not be parsed.
    #[error("invalid grid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct RawGrid {
    size: IVec3,
    blocks: Vec<BlockId>,
}

/// A box of voxels starting at the origin.
///
/// Cells are stored x-fastest, then z, then y. Everything outside
/// `[0, size)` is solid for collision purposes and reads as
/// [`EMPTY_BLOCK`] through [`BlockGrid::block_at`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct BlockGrid {
    size: IVec3,
    blocks: Vec<BlockId>,
}

impl TryFrom<RawGrid> for BlockGrid {
    type Error = BlockGridError;

    fn try_from(raw: RawGrid) -> Result<Self, Self::Error> {
        let expected = Self::volume(raw.size)?;
        if raw.blocks.len() != expected {
            return Err(BlockGridError::LengthMismatch {
                size: raw.size,
                expected,
                actual: raw.blocks.len(),
            });
        }
        Ok(Self {
            size: raw.size,
            blocks: raw.blocks,
        })
    }
}

impl BlockGrid {
    /// An empty grid of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`BlockGridError::InvalidSize`] if any dimension is not positive.
    pub fn new(size: IVec3) -> Result<Self, BlockGridError> {
        let volume = Self::volume(size)?;
        Ok(Self {
            size,
            blocks: vec![EMPTY_BLOCK; volume],
        })
    }

    /// Parse a grid from its JSON form: `{"size": [x, y, z], "blocks": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the block list does not
    /// match the size.
    pub fn from_json(json: &str) -> Result<Self, BlockGridError> {
        Ok(serde_json::from_str(json)?)
    }

    fn volume(size: IVec3) -> Result<usize, BlockGridError> {
        if size.cmple(IVec3::ZERO).any() {
            return Err(BlockGridError::InvalidSize(size));
        }
        (size.x as usize)
            .checked_mul(size.y as usize)
            .and_then(|v| v.checked_mul(size.z as usize))
            .filter(|&v| v <= MAX_BLOCKS)
            .ok_or(BlockGridError::TooLarge(size))
    }

    /// Grid dimensions.
    #[must_use]
    pub fn size(&self) -> IVec3 {
        self.size
    }

    /// Returns `true` if `cell` lies inside the grid.
    #[must_use]
    pub fn in_bounds(&self, cell: IVec3) -> bool {
        cell.cmpge(IVec3::ZERO).all() && cell.cmplt(self.size).all()
    }

    fn index(&self, cell: IVec3) -> Option<usize> {
        self.in_bounds(cell).then(|| {
            (cell.y as usize * self.size.z as usize + cell.z as usize) * self.size.x as usize
                + cell.x as usize
        })
    }

    /// Block at `cell`, or [`EMPTY_BLOCK`] outside the grid.
    #[must_use]
    pub fn block_at(&self, cell: IVec3) -> BlockId {
        self.index(cell).map_or(EMPTY_BLOCK, |i| self.blocks[i])
    }

    /// Block at `cell` as seen by collision queries: cells outside the grid
    /// report [`OUT_OF_BOUNDS_BLOCK`].
    #[must_use]
    pub fn collision_block(&self, cell: IVec3) -> BlockId {
        self.index(cell).map_or(OUT_OF_BOUNDS_BLOCK, |i| self.blocks[i])
    }

    /// Returns `true` if `cell` blocks movement. Outside the grid is solid.
    #[must_use]
    pub fn is_solid(&self, cell: IVec3) -> bool {
        self.collision_block(cell) != EMPTY_BLOCK
    }

    /// Cells `aabb` could share volume with, limited to the grid plus a
    /// one-cell solid shell around it. Cells further out behave exactly like
    /// the shell, so queries never need to look past it.
    pub fn cells_near(&self, aabb: &Aabb) -> impl Iterator<Item = IVec3> + use<> {
        aabb.cells_within(IVec3::NEG_ONE, self.size)
    }

    /// Set a single block. Writes outside the grid are ignored and return
    /// `false`.
    pub fn set_block(&mut self, cell: IVec3, block: BlockId) -> bool {
        match self.index(cell) {
            Some(i) => {
                self.blocks[i] = block;
                true
            }
            None => false,
        }
    }

    /// Fill the inclusive box `min..=max`, clamped to the grid.
    pub fn fill(&mut self, min: IVec3, max: IVec3, block: BlockId) {
        let lo = min.max(IVec3::ZERO);
        let hi = max.min(self.size - IVec3::ONE);
        for y in lo.y..=hi.y {
            for z in lo.z..=hi.z {
                for x in lo.x..=hi.x {
                    self.set_block(IVec3::new(x, y, z), block);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use sim_math::Vec3;

    use super::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = BlockGrid::new(IVec3::new(4, 4, 4)).unwrap();
        assert_eq!(grid.block_at(IVec3::new(1, 2, 3)), EMPTY_BLOCK);
        assert!(!grid.is_solid(IVec3::new(1, 2, 3)));
    }

    #[test]
    fn test_invalid_size_rejected() {
        assert!(matches!(
            BlockGrid::new(IVec3::new(4, 0, 4)),
            Err(BlockGridError::InvalidSize(_))
        ));
    }

    #[test]
    fn test_out_of_bounds_is_solid_but_reads_empty() {
        let grid = BlockGrid::new(IVec3::new(2, 2, 2)).unwrap();
        let outside = IVec3::new(-1, 0, 0);
        assert!(grid.is_solid(outside));
        assert_eq!(grid.block_at(outside), EMPTY_BLOCK);
        assert_eq!(grid.collision_block(outside), OUT_OF_BOUNDS_BLOCK);
    }

    #[test]
    fn test_absurd_size_rejected() {
        assert!(matches!(
            BlockGrid::new(IVec3::new(i32::MAX, i32::MAX, i32::MAX)),
            Err(BlockGridError::TooLarge(_))
        ));
        let json = r#"{ "size": [100000, 100000, 100000], "blocks": [] }"#;
        assert!(BlockGrid::from_json(json).is_err());
    }

    #[test]
    fn test_cells_near_stop_at_the_shell() {
        let grid = BlockGrid::new(IVec3::new(2, 2, 2)).unwrap();
        let far = Aabb::new(Vec3::splat(-1e6), Vec3::splat(1e6));
        let cells: Vec<_> = grid.cells_near(&far).collect();
        assert_eq!(cells.len(), 4 * 4 * 4);
        assert!(
            cells
                .iter()
                .all(|c| c.cmpge(IVec3::NEG_ONE).all() && c.cmple(IVec3::splat(2)).all())
        );
    }

    #[test]
    fn test_fill_clamps_to_grid() {
        let mut grid = BlockGrid::new(IVec3::new(3, 3, 3)).unwrap();
        grid.fill(IVec3::new(-5, 0, -5), IVec3::new(5, 0, 5), 1);
        assert!(grid.is_solid(IVec3::new(2, 0, 2)));
        assert!(!grid.is_solid(IVec3::new(2, 1, 2)));
    }

    #[test]
    fn test_set_block_outside_ignored() {
        let mut grid = BlockGrid::new(IVec3::new(2, 2, 2)).unwrap();
        assert!(!grid.set_block(IVec3::new(2, 0, 0), 1));
        assert!(grid.set_block(IVec3::new(1, 1, 1), 3));
        assert_eq!(grid.block_at(IVec3::new(1, 1, 1)), 3);
    }

    #[test]
    fn test_from_json() {
        let grid = BlockGrid::from_json(r#"{"size": [2, 1, 1], "blocks": [0, 7]}"#).unwrap();
        assert_eq!(grid.block_at(IVec3::new(1, 0, 0)), 7);
    }

    #[test]
    fn test_from_json_length_mismatch() {
        let err = BlockGrid::from_json(r#"{"size": [2, 2, 1], "blocks": [0, 7]}"#).unwrap_err();
        assert!(matches!(err, BlockGridError::Json(_)));
    }
}
