//! # Regeneration Tasks
//!
//! A regeneration relights and remeshes one chunk from its current blocks. Both steps
//! read the same neighbourhood snapshot, so the mesh always matches the light it was
//! built against.
//!
//! ## Task Lifecycle
//! 1. The chunk is locked for writing
//! 2. Light and mesh are generated; a panic in either is caught and turned into a
//!    [`GenerationError`]
//! 3. The result is handed to a completion callback while the lock is still held
//! 4. The lock is released

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use log::{debug, warn};
use thiserror::Error;
use web_time::Instant;

use crate::engine_state::meshing::ChunkMesh;
use crate::engine_state::voxels::chunk::neighbors::ChunkNeighborhood;
use crate::engine_state::voxels::chunk::{Chunk, ChunkHandle, ChunkPosition};
use crate::engine_state::VoxelContext;

/// A fault raised while regenerating one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("regeneration of chunk {position} panicked: {message}")]
    Panicked {
        position: ChunkPosition,
        message: String,
    },
}

impl GenerationError {
    pub fn position(&self) -> ChunkPosition {
        match self {
            GenerationError::Panicked { position, .. } => *position,
        }
    }
}

/// The outcome of one regeneration.
pub type TaskResult = Result<ChunkMesh, GenerationError>;

/// The work a regeneration performs on a locked chunk.
///
/// The engine uses [`LightAndMesh`]; other pipelines can be plugged into the scheduler
/// to instrument or replace it.
pub trait ChunkPipeline: Send + Sync {
    fn run(&self, context: &VoxelContext, chunk: &mut Chunk) -> ChunkMesh;
}

/// Lighting followed by meshing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LightAndMesh;

impl ChunkPipeline for LightAndMesh {
    fn run(&self, context: &VoxelContext, chunk: &mut Chunk) -> ChunkMesh {
        regenerate(context, chunk)
    }
}

/// Relights and remeshes `chunk`.
pub fn regenerate(context: &VoxelContext, chunk: &mut Chunk) -> ChunkMesh {
    let start = Instant::now();

    let neighborhood = ChunkNeighborhood::capture(chunk);
    context
        .light_propagator()
        .generate_light_with(chunk, &neighborhood);
    let mesh = context
        .mesh_builder()
        .generate_mesh_with(chunk, &neighborhood);

    let elapsed = start.elapsed();
    if elapsed > context.config().slow_generation_threshold() {
        warn!(
            "Regenerating chunk {} took {:?} ({} faces)",
            chunk.position(),
            elapsed,
            mesh.face_count()
        );
    } else {
        debug!(
            "Regenerated chunk {} in {:?} ({} faces)",
            chunk.position(),
            elapsed,
            mesh.face_count()
        );
    }
    mesh
}

/// Runs `pipeline` with panics converted into [`GenerationError`].
///
/// Chunk locks never poison, so the chunk stays usable after a fault; it keeps
/// whatever lightmap it had before.
pub fn regenerate_guarded(
    context: &VoxelContext,
    pipeline: &dyn ChunkPipeline,
    chunk: &mut Chunk,
) -> TaskResult {
    let position = chunk.position();
    panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(context, chunk))).map_err(|payload| {
        GenerationError::Panicked {
            position,
            message: panic_message(payload.as_ref()),
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// One queued regeneration of a chunk.
pub struct RegenerationTask {
    handle: ChunkHandle,
}

impl RegenerationTask {
    pub fn new(handle: ChunkHandle) -> Self {
        RegenerationTask { handle }
    }

    pub fn handle(&self) -> &ChunkHandle {
        &self.handle
    }

    /// Runs the regeneration under the chunk's write lock and passes the result to
    /// `complete` before the lock is released.
    pub fn process<F, R>(&self, context: &VoxelContext, pipeline: &dyn ChunkPipeline, complete: F) -> R
    where
        F: FnOnce(TaskResult) -> R,
    {
        let mut chunk = self.handle.get_mut();
        let result = regenerate_guarded(context, pipeline, &mut chunk);
        let completed = complete(result);
        drop(chunk);
        completed
    }
}
