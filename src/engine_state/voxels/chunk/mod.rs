//! # Chunk Module
//!
//! This module provides the `Chunk` struct and the handles used to share chunks between
//! the main thread and the regeneration worker.
//!
//! ## Storage
//!
//! A chunk is a `CHUNK_WIDTH x CHUNK_HEIGHT x CHUNK_WIDTH` column of blocks:
//! - `blocks`: a dense grid of block ids, indexed `(y * W + z) * W + x`
//! - `solid_array`: a bit vector (1 bit per cell) marking non-air cells, so the mesher
//!   can skip straight to occupied cells
//! - `heights`: per-column `highest non-air y + 1`, kept up to date on every edit
//! - `lightmap`: the packed light grid produced by the last lighting pass
//!
//! ### Performance Characteristics
//! - **Block Lookup**: O(1)
//! - **Solidity Check**: O(1) - Just check the bit in `solid_array`
//! - **Edit**: O(1), or O(H) when the highest block of a column is removed

use std::fmt;

use bitvec::prelude::BitVec;
use log::warn;
use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::core::{MtResource, MtWeak};
use crate::engine_state::lighting::LightMap;

use super::block::{BlockId, BlockState, AIR};
use chunk_iteration::ChunkBlockIterator;
use neighbors::NeighborDirection;

pub mod chunk_creation;
pub mod chunk_iteration;
pub mod neighbors;

/// The width and depth of a chunk in blocks.
pub const CHUNK_WIDTH: usize = 16;
/// The height of a chunk in blocks.
pub const CHUNK_HEIGHT: usize = 128;
/// The number of blocks in a single horizontal plane of a chunk.
pub const CHUNK_PLANE_SIZE: usize = CHUNK_WIDTH * CHUNK_WIDTH;
/// The total number of blocks in a chunk.
pub const CHUNK_SIZE: usize = CHUNK_PLANE_SIZE * CHUNK_HEIGHT;

/// Chunk coordinates on the horizontal grid. Chunks span the full world height.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkPosition {
    pub x: i32,
    pub z: i32,
}

impl ChunkPosition {
    pub const fn new(x: i32, z: i32) -> Self {
        ChunkPosition { x, z }
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        ChunkPosition::new(self.x + dx, self.z + dz)
    }

    /// World coordinates of the chunk's (0, 0) column.
    pub fn world_origin(self) -> (i32, i32) {
        (self.x * CHUNK_WIDTH as i32, self.z * CHUNK_WIDTH as i32)
    }

    /// Splits a world column into the owning chunk and the chunk-local column.
    pub fn from_world(world_x: i32, world_z: i32) -> (Self, usize, usize) {
        let width = CHUNK_WIDTH as i32;
        (
            ChunkPosition::new(world_x.div_euclid(width), world_z.div_euclid(width)),
            world_x.rem_euclid(width) as usize,
            world_z.rem_euclid(width) as usize,
        )
    }
}

impl fmt::Display for ChunkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// A full-height column of voxel blocks together with its computed light.
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    position: ChunkPosition,

    /// Dense block ids, `(y * W + z) * W + x`.
    blocks: Box<[BlockId]>,

    /// One bit per cell, set when the cell holds a non-air block.
    ///
    /// Uses the same indexing as `blocks`.
    solid_array: BitVec,

    /// `highest non-air y + 1` per column, indexed `z * W + x`. 0 for an empty column.
    heights: Box<[u8]>,

    lightmap: LightMap,

    /// Weak links to the four horizontal neighbours, indexed by `NeighborDirection`.
    neighbors: [Option<WeakChunkHandle>; 4],

    /// Set by every edit, cleared when a new lightmap is installed.
    light_stale: bool,
}

impl Chunk {
    /// Creates a new, completely empty chunk (all blocks are air).
    pub fn new(position: ChunkPosition) -> Self {
        Chunk {
            position,
            blocks: vec![AIR; CHUNK_SIZE].into_boxed_slice(),
            solid_array: BitVec::repeat(false, CHUNK_SIZE),
            heights: vec![0; CHUNK_PLANE_SIZE].into_boxed_slice(),
            lightmap: LightMap::new(),
            neighbors: Default::default(),
            light_stale: true,
        }
    }

    pub fn position(&self) -> ChunkPosition {
        self.position
    }

    #[inline]
    pub fn index(x: usize, y: usize, z: usize) -> usize {
        (y * CHUNK_WIDTH + z) * CHUNK_WIDTH + x
    }

    /// Inverse of [`Chunk::index`].
    #[inline]
    pub fn coordinates(index: usize) -> (usize, usize, usize) {
        let x = index % CHUNK_WIDTH;
        let z = (index / CHUNK_WIDTH) % CHUNK_WIDTH;
        let y = index / CHUNK_PLANE_SIZE;
        (x, y, z)
    }

    /// Block id at in-range chunk-local coordinates.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn block_id(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[Self::index(x, y, z)]
    }

    /// Block id at signed chunk-local coordinates without leaving the chunk.
    ///
    /// `y` outside the world reads as air; `x`/`z` outside the chunk give `None` so the
    /// caller can continue the lookup in a neighbour.
    pub fn local_block_id(&self, x: i32, y: i32, z: i32) -> Option<BlockId> {
        let width = CHUNK_WIDTH as i32;
        if !(0..width).contains(&x) || !(0..width).contains(&z) {
            return None;
        }
        if !(0..CHUNK_HEIGHT as i32).contains(&y) {
            return Some(AIR);
        }
        Some(self.block_id(x as usize, y as usize, z as usize))
    }

    /// The block at the given cell, or `None` for air and out-of-range coordinates.
    pub fn get_block(&self, x: usize, y: usize, z: usize) -> Option<BlockState> {
        if x >= CHUNK_WIDTH || z >= CHUNK_WIDTH || y >= CHUNK_HEIGHT {
            return None;
        }
        let id = self.block_id(x, y, z);
        (id != AIR).then(|| BlockState::new(id, x as u8, y as u8, z as u8))
    }

    /// Checks if the block at the specified chunk-relative coordinates is non-air.
    #[inline]
    pub fn is_block_solid(&self, x: usize, y: usize, z: usize) -> bool {
        self.solid_array[Self::index(x, y, z)]
    }

    /// Writes a block and returns the id it replaced.
    ///
    /// Out-of-range coordinates and negative ids are rejected with a warning and leave
    /// the chunk untouched.
    pub fn set_block(&mut self, x: usize, y: usize, z: usize, id: BlockId) -> Option<BlockId> {
        if x >= CHUNK_WIDTH || z >= CHUNK_WIDTH || y >= CHUNK_HEIGHT {
            warn!(
                "Rejected write of block {} at ({}, {}, {}) in chunk {}: out of range",
                id, x, y, z, self.position
            );
            return None;
        }
        if id < AIR {
            warn!(
                "Rejected write of block {} at ({}, {}, {}) in chunk {}: negative id",
                id, x, y, z, self.position
            );
            return None;
        }

        let index = Self::index(x, y, z);
        let previous = std::mem::replace(&mut self.blocks[index], id);
        self.solid_array.set(index, id != AIR);
        self.update_height(x, y, z, id);
        self.light_stale = true;
        Some(previous)
    }

    fn update_height(&mut self, x: usize, y: usize, z: usize, id: BlockId) {
        let column = z * CHUNK_WIDTH + x;
        let height = self.heights[column] as usize;
        if id != AIR {
            if y + 1 > height {
                self.heights[column] = (y + 1) as u8;
            }
        } else if y + 1 == height {
            self.heights[column] = self.scan_height(x, z) as u8;
        }
    }

    fn scan_height(&self, x: usize, z: usize) -> usize {
        (0..CHUNK_HEIGHT)
            .rev()
            .find(|&y| self.is_block_solid(x, y, z))
            .map_or(0, |y| y + 1)
    }

    /// Recomputes every column height from the block grid.
    pub(crate) fn rebuild_heights(&mut self) {
        for z in 0..CHUNK_WIDTH {
            for x in 0..CHUNK_WIDTH {
                self.heights[z * CHUNK_WIDTH + x] = self.scan_height(x, z) as u8;
            }
        }
    }

    /// `highest non-air y + 1` of a column, 0 when the column is empty.
    #[inline]
    pub fn height_at(&self, x: usize, z: usize) -> usize {
        self.heights[z * CHUNK_WIDTH + x] as usize
    }

    pub fn heights(&self) -> &[u8] {
        &self.heights
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    /// Number of non-air cells.
    pub fn block_count(&self) -> usize {
        self.solid_array.count_ones()
    }

    /// Iterates over every non-air block in storage order.
    pub fn iter_blocks(&self) -> ChunkBlockIterator<'_> {
        ChunkBlockIterator::new(self)
    }

    pub fn lightmap(&self) -> &LightMap {
        &self.lightmap
    }

    /// Installs a freshly computed lightmap, returning the old one.
    pub fn replace_lightmap(&mut self, lightmap: LightMap) -> LightMap {
        self.light_stale = false;
        std::mem::replace(&mut self.lightmap, lightmap)
    }

    /// `true` when an edit happened after the last lighting pass.
    pub fn is_light_stale(&self) -> bool {
        self.light_stale
    }

    /// The live neighbour in `direction`, if linked and still loaded.
    pub fn neighbor(&self, direction: NeighborDirection) -> Option<ChunkHandle> {
        self.neighbors[direction as usize]
            .as_ref()
            .and_then(WeakChunkHandle::upgrade)
    }

    pub(crate) fn neighbor_link(&self, direction: NeighborDirection) -> Option<&WeakChunkHandle> {
        self.neighbors[direction as usize].as_ref()
    }

    pub(crate) fn set_neighbor_link(
        &mut self,
        direction: NeighborDirection,
        link: Option<WeakChunkHandle>,
    ) -> Option<WeakChunkHandle> {
        std::mem::replace(&mut self.neighbors[direction as usize], link)
    }
}

/// A shared, lockable chunk together with its immutable position.
///
/// The position is stored outside the lock so schedulers and link validation can read
/// it without touching the chunk.
#[derive(Clone)]
pub struct ChunkHandle {
    position: ChunkPosition,
    resource: MtResource<Chunk>,
}

impl ChunkHandle {
    pub fn new(chunk: Chunk) -> Self {
        ChunkHandle {
            position: chunk.position(),
            resource: MtResource::new(chunk),
        }
    }

    pub fn position(&self) -> ChunkPosition {
        self.position
    }

    /// Locks the chunk for reading.
    pub fn get(&self) -> RwLockReadGuard<'_, Chunk> {
        self.resource.get()
    }

    /// Locks the chunk for writing.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, Chunk> {
        self.resource.get_mut()
    }

    pub fn downgrade(&self) -> WeakChunkHandle {
        WeakChunkHandle {
            position: self.position,
            resource: self.resource.downgrade(),
        }
    }

    pub fn ptr_eq(&self, other: &ChunkHandle) -> bool {
        self.resource.ptr_eq(&other.resource)
    }

    /// Identity of the underlying allocation.
    pub fn id(&self) -> usize {
        self.resource.id()
    }
}

impl fmt::Debug for ChunkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkHandle")
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

/// Non-owning counterpart of [`ChunkHandle`], used for neighbour back-links.
#[derive(Clone)]
pub struct WeakChunkHandle {
    position: ChunkPosition,
    resource: MtWeak<Chunk>,
}

impl WeakChunkHandle {
    pub fn position(&self) -> ChunkPosition {
        self.position
    }

    pub fn upgrade(&self) -> Option<ChunkHandle> {
        self.resource.upgrade().map(|resource| ChunkHandle {
            position: self.position,
            resource,
        })
    }

    /// `true` when this link points at `handle`.
    pub fn refers_to(&self, handle: &ChunkHandle) -> bool {
        self.upgrade().is_some_and(|linked| linked.ptr_eq(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_block_tracks_heights() {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
        assert_eq!(chunk.height_at(3, 4), 0);

        chunk.set_block(3, 10, 4, 1);
        chunk.set_block(3, 20, 4, 1);
        assert_eq!(chunk.height_at(3, 4), 21);

        chunk.set_block(3, 20, 4, AIR);
        assert_eq!(chunk.height_at(3, 4), 11);

        chunk.set_block(3, 10, 4, AIR);
        assert_eq!(chunk.height_at(3, 4), 0);
        assert_eq!(chunk.block_count(), 0);
    }

    #[test]
    fn test_invalid_writes_are_rejected() {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
        assert_eq!(chunk.set_block(0, CHUNK_HEIGHT, 0, 1), None);
        assert_eq!(chunk.set_block(CHUNK_WIDTH, 0, 0, 1), None);
        assert_eq!(chunk.set_block(0, 0, 0, -1), None);
        assert_eq!(chunk.block_count(), 0);
    }

    #[test]
    fn test_edit_marks_light_stale() {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
        chunk.replace_lightmap(LightMap::new());
        assert!(!chunk.is_light_stale());
        chunk.set_block(1, 1, 1, 2);
        assert!(chunk.is_light_stale());
    }

    #[test]
    fn test_local_lookup_bounds() {
        let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
        chunk.set_block(0, 0, 0, 4);
        assert_eq!(chunk.local_block_id(0, 0, 0), Some(4));
        assert_eq!(chunk.local_block_id(0, -1, 0), Some(AIR));
        assert_eq!(chunk.local_block_id(0, CHUNK_HEIGHT as i32, 0), Some(AIR));
        assert_eq!(chunk.local_block_id(-1, 0, 0), None);
        assert_eq!(chunk.local_block_id(0, 0, CHUNK_WIDTH as i32), None);
    }

    #[test]
    fn test_world_split() {
        assert_eq!(
            ChunkPosition::from_world(-1, 17),
            (ChunkPosition::new(-1, 1), CHUNK_WIDTH - 1, 1)
        );
        assert_eq!(ChunkPosition::new(2, -3).world_origin(), (32, -48));
    }

    #[test]
    fn test_index_round_trip() {
        let index = Chunk::index(5, 77, 9);
        assert_eq!(Chunk::coordinates(index), (5, 77, 9));
    }
}
