//! # World Module
//!
//! The `World` owns every loaded chunk by position, keeps their neighbour links in
//! sync as chunks come and go, and routes block edits to the chunk that owns the
//! edited cell.
//!
//! ## Coordinates
//!
//! Block edits are addressed relative to a chunk and may fall outside it
//! horizontally. Such coordinates are resolved by walking neighbour links one chunk
//! at a time, so a lookup never depends on the position map and behaves the same
//! as it would for code that only holds a chunk handle.
//!
//! ## Regeneration
//!
//! Every change that alters what a chunk looks like (an edit, a new or removed
//! neighbour) schedules that chunk on the world's [`ChunkScheduler`]. Finished
//! meshes are collected with [`World::process_completed_tasks`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::engine_state::task_management::{ChunkScheduler, MeshSink, SchedulerError};
use crate::engine_state::voxels::block::{BlockId, AIR, UNKNOWN_BLOCK};
use crate::engine_state::voxels::chunk::neighbors::{self, NeighborDirection};
use crate::engine_state::voxels::chunk::{
    Chunk, ChunkHandle, ChunkPosition, CHUNK_HEIGHT, CHUNK_WIDTH,
};
use crate::engine_state::VoxelContext;

/// Terrain used by [`World::add_chunk_at`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ChunkGenerator {
    /// Perlin height field of stone, dirt and grass. Names missing from the catalog
    /// generate air.
    Perlin { seed: u32 },
    /// The same block in every cell up to `height`.
    Flat { block: BlockId, height: usize },
    /// Nothing but air.
    Empty,
}

/// A sparse grid of chunks and the scheduler that keeps their meshes current.
pub struct World {
    context: Arc<VoxelContext>,
    chunks: HashMap<ChunkPosition, ChunkHandle>,
    scheduler: ChunkScheduler,
}

impl World {
    /// Creates an empty world and starts its regeneration worker.
    pub fn new(context: Arc<VoxelContext>) -> Result<Self, SchedulerError> {
        let scheduler = ChunkScheduler::new(context.clone())?;
        Ok(Self::with_scheduler(context, scheduler))
    }

    /// Creates an empty world around an existing scheduler.
    pub fn with_scheduler(context: Arc<VoxelContext>, scheduler: ChunkScheduler) -> Self {
        World {
            context,
            chunks: HashMap::new(),
            scheduler,
        }
    }

    /// Generates and inserts a chunk, unless one is already loaded at `position`.
    pub fn add_chunk_at(&mut self, position: ChunkPosition, generator: ChunkGenerator) -> ChunkHandle {
        if let Some(existing) = self.chunks.get(&position) {
            return existing.clone();
        }

        let catalog = self.context.catalog();
        let named = |name: &str| catalog.id_by_name(name).unwrap_or(AIR);
        let chunk = match generator {
            ChunkGenerator::Perlin { seed } => Chunk::perlin(
                position,
                seed,
                named("stone"),
                named("dirt"),
                named("grass"),
            ),
            ChunkGenerator::Flat { block, height } => {
                Chunk::flat(position, &vec![block; height.min(CHUNK_HEIGHT)])
            }
            ChunkGenerator::Empty => Chunk::new(position),
        };
        self.insert_chunk(chunk)
    }

    /// Inserts `chunk`, replacing any chunk already at its position.
    ///
    /// The chunk is linked to every loaded neighbour; it and those neighbours are
    /// scheduled for regeneration since their shared seams changed.
    pub fn insert_chunk(&mut self, chunk: Chunk) -> ChunkHandle {
        let position = chunk.position();
        if self.chunks.contains_key(&position) {
            debug!("Replacing chunk {}", position);
            self.remove_chunk(position);
        }

        let handle = ChunkHandle::new(chunk);
        let mut linked = Vec::new();
        for direction in NeighborDirection::ALL {
            let Some(neighbor) = self.chunks.get(&direction.neighbor_of(position)) else {
                continue;
            };
            if neighbors::link(&handle, direction, neighbor) {
                linked.push(neighbor.clone());
            }
        }
        self.chunks.insert(position, handle.clone());

        let threaded = self.context.config().threaded;
        for neighbor in &linked {
            self.scheduler.request_regeneration(neighbor, false, threaded);
        }
        self.scheduler.request_regeneration(&handle, true, threaded);

        info!(
            "Inserted chunk {} with {} linked neighbours ({} chunks loaded)",
            position,
            linked.len(),
            self.chunks.len()
        );
        handle
    }

    /// Removes the chunk at `position`, unlinking it from its neighbours.
    ///
    /// The former neighbours are scheduled for regeneration. A regeneration of the
    /// removed chunk that is already queued still runs and still reports a result.
    pub fn remove_chunk(&mut self, position: ChunkPosition) -> Option<ChunkHandle> {
        let handle = self.chunks.remove(&position)?;
        let former_neighbors = neighbors::unlink_all(&handle);

        let threaded = self.context.config().threaded;
        for neighbor in &former_neighbors {
            self.scheduler.request_regeneration(neighbor, false, threaded);
        }

        info!(
            "Removed chunk {} ({} chunks loaded)",
            position,
            self.chunks.len()
        );
        Some(handle)
    }

    pub fn chunk(&self, position: ChunkPosition) -> Option<&ChunkHandle> {
        self.chunks.get(&position)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &ChunkHandle> {
        self.chunks.values()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// The block at `(x, y, z)` relative to `chunk`.
    ///
    /// Horizontal coordinates outside the chunk are resolved through its neighbour
    /// links. Heights outside the world are air; cells in a chunk that is not linked
    /// are [`UNKNOWN_BLOCK`].
    pub fn get_block_id(&self, chunk: &ChunkHandle, x: i32, y: i32, z: i32) -> BlockId {
        if !(0..CHUNK_HEIGHT as i32).contains(&y) {
            return AIR;
        }
        match locate(chunk, x, z) {
            Some((owner, local_x, local_z)) => owner.get().block_id(local_x, y as usize, local_z),
            None => UNKNOWN_BLOCK,
        }
    }

    /// The block at world coordinates, or [`UNKNOWN_BLOCK`] if its chunk is not loaded.
    pub fn block_at(&self, world_x: i32, y: i32, world_z: i32) -> BlockId {
        let (position, local_x, local_z) = ChunkPosition::from_world(world_x, world_z);
        match self.chunks.get(&position) {
            Some(chunk) => self.get_block_id(chunk, local_x as i32, y, local_z as i32),
            None => UNKNOWN_BLOCK,
        }
    }

    /// Writes `id` at `(x, y, z)` relative to `chunk`.
    ///
    /// The owning chunk is found through neighbour links. When `update_chunk` is set it
    /// is scheduled at high priority together with any neighbour that shares the
    /// edited column's edge. Returns `false` (and changes nothing) for heights outside
    /// the world, negative ids and cells in unlinked chunks.
    pub fn place_block(
        &self,
        chunk: &ChunkHandle,
        x: i32,
        y: i32,
        z: i32,
        id: BlockId,
        update_chunk: bool,
    ) -> bool {
        if !(0..CHUNK_HEIGHT as i32).contains(&y) {
            warn!(
                "Rejected placing block {} at ({}, {}, {}) from chunk {}: height out of range",
                id,
                x,
                y,
                z,
                chunk.position()
            );
            return false;
        }
        if id < AIR {
            warn!(
                "Rejected placing block {} at ({}, {}, {}) from chunk {}: negative id",
                id,
                x,
                y,
                z,
                chunk.position()
            );
            return false;
        }
        let Some((owner, local_x, local_z)) = locate(chunk, x, z) else {
            warn!(
                "Rejected placing block {} at ({}, {}, {}) from chunk {}: owning chunk is not linked",
                id,
                x,
                y,
                z,
                chunk.position()
            );
            return false;
        };

        let previous = owner.get_mut().set_block(local_x, y as usize, local_z, id);
        if previous.is_none() {
            return false;
        }
        if update_chunk {
            self.request_update(&owner, true, local_x, local_z);
        }
        true
    }

    /// Replaces the block at `(x, y, z)` relative to `chunk` with air.
    ///
    /// Returns what the destroyed block drops. Destroying air (or a cell that cannot
    /// be resolved) drops nothing and schedules nothing.
    pub fn destroy_block(&self, chunk: &ChunkHandle, x: i32, y: i32, z: i32) -> Option<BlockId> {
        if !(0..CHUNK_HEIGHT as i32).contains(&y) {
            warn!(
                "Rejected destroying block at ({}, {}, {}) from chunk {}: height out of range",
                x,
                y,
                z,
                chunk.position()
            );
            return None;
        }
        let Some((owner, local_x, local_z)) = locate(chunk, x, z) else {
            warn!(
                "Rejected destroying block at ({}, {}, {}) from chunk {}: owning chunk is not linked",
                x,
                y,
                z,
                chunk.position()
            );
            return None;
        };

        let previous = {
            let mut owner_chunk = owner.get_mut();
            if owner_chunk.block_id(local_x, y as usize, local_z) == AIR {
                return None;
            }
            owner_chunk.set_block(local_x, y as usize, local_z, AIR)?
        };
        self.request_update(&owner, true, local_x, local_z);

        self.context.catalog().entry_or_missing(previous).resolve_drop()
    }

    /// [`place_block`](Self::place_block) addressed by world coordinates.
    pub fn place_block_at(&self, world_x: i32, y: i32, world_z: i32, id: BlockId) -> bool {
        let (position, local_x, local_z) = ChunkPosition::from_world(world_x, world_z);
        let Some(chunk) = self.chunks.get(&position) else {
            warn!(
                "Rejected placing block {} at world ({}, {}, {}): chunk {} is not loaded",
                id, world_x, y, world_z, position
            );
            return false;
        };
        self.place_block(chunk, local_x as i32, y, local_z as i32, id, true)
    }

    /// [`destroy_block`](Self::destroy_block) addressed by world coordinates.
    pub fn destroy_block_at(&self, world_x: i32, y: i32, world_z: i32) -> Option<BlockId> {
        let (position, local_x, local_z) = ChunkPosition::from_world(world_x, world_z);
        let chunk = self.chunks.get(&position)?;
        self.destroy_block(chunk, local_x as i32, y, local_z as i32)
    }

    /// Schedules `chunk` after an edit in column `(edit_x, edit_z)`, threaded per the
    /// engine configuration.
    pub fn request_update(&self, chunk: &ChunkHandle, high_priority: bool, edit_x: usize, edit_z: usize) {
        self.scheduler.request_update(
            chunk,
            high_priority,
            edit_x,
            edit_z,
            self.context.config().threaded,
        );
    }

    pub fn is_queued(&self, chunk: &ChunkHandle) -> bool {
        self.scheduler.is_queued(chunk)
    }

    /// Blocks until the scheduler has nothing left to do, or `timeout` passes.
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        self.scheduler.wait_for_idle(timeout)
    }

    pub fn process_completed_tasks(&self, sink: &mut dyn MeshSink) -> usize {
        self.scheduler.process_completed_tasks(sink)
    }

    pub fn scheduler(&self) -> &ChunkScheduler {
        &self.scheduler
    }

    pub fn context(&self) -> &VoxelContext {
        &self.context
    }
}

/// Walks neighbour links from `chunk` to the chunk owning column `(x, z)`.
///
/// Returns the owner and the column in its local coordinates, or `None` if a link on
/// the way is missing.
fn locate(chunk: &ChunkHandle, mut x: i32, mut z: i32) -> Option<(ChunkHandle, usize, usize)> {
    let width = CHUNK_WIDTH as i32;
    let mut current = chunk.clone();
    loop {
        let direction = if x < 0 {
            x += width;
            NeighborDirection::Left
        } else if x >= width {
            x -= width;
            NeighborDirection::Right
        } else if z < 0 {
            z += width;
            NeighborDirection::Back
        } else if z >= width {
            z -= width;
            NeighborDirection::Front
        } else {
            return Some((current, x as usize, z as usize));
        };
        let next = current.get().neighbor(direction)?;
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::config::EngineConfig;
    use crate::engine_state::voxels::block::catalog::BlockCatalog;

    fn inline_world() -> World {
        let config = EngineConfig {
            threaded: false,
            ..EngineConfig::default()
        };
        let context = VoxelContext::new(BlockCatalog::builtin().unwrap(), config);
        World::new(Arc::new(context)).unwrap()
    }

    #[test]
    fn test_insert_links_existing_neighbours() {
        let mut world = inline_world();
        let center = world.add_chunk_at(ChunkPosition::new(0, 0), ChunkGenerator::Empty);
        let right = world.add_chunk_at(ChunkPosition::new(1, 0), ChunkGenerator::Empty);

        let linked = center.get().neighbor(NeighborDirection::Right).unwrap();
        assert!(linked.ptr_eq(&right));
        let back = right.get().neighbor(NeighborDirection::Left).unwrap();
        assert!(back.ptr_eq(&center));

        world.remove_chunk(ChunkPosition::new(1, 0));
        assert!(center.get().neighbor(NeighborDirection::Right).is_none());
        assert_eq!(world.chunk_count(), 1);
    }

    #[test]
    fn test_block_lookup_crosses_links() {
        let mut world = inline_world();
        let origin = world.add_chunk_at(ChunkPosition::new(0, 0), ChunkGenerator::Empty);
        let right = world.add_chunk_at(ChunkPosition::new(1, 0), ChunkGenerator::Empty);
        right.get_mut().set_block(2, 10, 3, 4);

        assert_eq!(world.get_block_id(&origin, CHUNK_WIDTH as i32 + 2, 10, 3), 4);
        assert_eq!(world.get_block_id(&origin, -1, 10, 3), UNKNOWN_BLOCK);
        assert_eq!(world.get_block_id(&origin, 0, -1, 0), AIR);
        assert_eq!(world.get_block_id(&origin, 0, CHUNK_HEIGHT as i32, 0), AIR);
        assert_eq!(world.block_at(CHUNK_WIDTH as i32 + 2, 10, 3), 4);
    }

    #[test]
    fn test_destroy_resolves_drops() {
        let mut world = inline_world();
        let chunk = world.add_chunk_at(ChunkPosition::new(0, 0), ChunkGenerator::Empty);
        let catalog = world.context().catalog();
        let stone = catalog.id_by_name("stone").unwrap();
        let cobblestone = catalog.id_by_name("cobblestone").unwrap();
        let bedrock = catalog.id_by_name("bedrock").unwrap();

        assert!(world.place_block(&chunk, 1, 1, 1, stone, true));
        assert_eq!(world.destroy_block(&chunk, 1, 1, 1), Some(cobblestone));
        assert!(world.place_block(&chunk, 1, 1, 1, bedrock, true));
        assert_eq!(world.destroy_block(&chunk, 1, 1, 1), None);
        assert_eq!(world.get_block_id(&chunk, 1, 1, 1), AIR);
        assert_eq!(world.destroy_block(&chunk, 1, 1, 1), None);
    }

    #[test]
    fn test_invalid_placements_are_rejected() {
        let mut world = inline_world();
        let chunk = world.add_chunk_at(ChunkPosition::new(0, 0), ChunkGenerator::Empty);
        assert!(!world.place_block(&chunk, 0, CHUNK_HEIGHT as i32, 0, 1, true));
        assert!(!world.place_block(&chunk, 0, 0, 0, -3, true));
        assert!(!world.place_block(&chunk, 0, 0, -1, 1, true));
        assert_eq!(chunk.get().block_count(), 0);
    }
}
