//! # Block Module
//!
//! This module provides the core block-related functionality for the voxel engine.
//! Blocks are plain numeric ids; everything a block *is* (opacity, emission, textures,
//! what it drops) lives in the data-driven [`BlockCatalog`](catalog::BlockCatalog).

use cgmath::Point3;

pub mod block_side;
pub mod catalog;

/// The integer type used to identify blocks in chunk storage and in the catalog.
pub type BlockId = i16;

/// The air block. Cells holding it are considered empty.
pub const AIR: BlockId = 0;

/// Returned by lookups that cross into an unlinked neighbour.
///
/// Never stored in a chunk. Lighting treats it as fully opaque and meshing treats it
/// as "nothing to cull against".
pub const UNKNOWN_BLOCK: BlockId = -1;

/// A single non-air block together with its chunk-local coordinates.
///
/// Chunks hand these out for occupied cells only; an empty cell has no `BlockState`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockState {
    /// The catalog id of the block.
    pub id: BlockId,
    /// X coordinate within the owning chunk.
    pub local_x: u8,
    /// Y coordinate within the owning chunk.
    pub local_y: u8,
    /// Z coordinate within the owning chunk.
    pub local_z: u8,
}

impl BlockState {
    /// Creates a block state for the given id and chunk-local position.
    pub fn new(id: BlockId, local_x: u8, local_y: u8, local_z: u8) -> Self {
        BlockState {
            id,
            local_x,
            local_y,
            local_z,
        }
    }

    /// The chunk-local position as a point.
    pub fn local_position(&self) -> Point3<usize> {
        Point3::new(
            self.local_x as usize,
            self.local_y as usize,
            self.local_z as usize,
        )
    }
}
