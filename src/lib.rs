#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Engine
//!
//! Light propagation, face meshing and background regeneration for a chunked voxel
//! world.
//!
//! Chunks are 16x128x16 columns of blocks linked to their four horizontal
//! neighbours. Every edit re-lights and re-meshes the edited chunk on a single
//! background worker, together with the neighbours whose seams it touches, and the
//! resulting face buffers are handed to whatever renders them.
//!
//! ## Key Modules
//!
//! * `core` - Shared, lock-protected resource handles
//! * `engine_state` - Blocks, chunks, lighting, meshing and the regeneration scheduler
//!
//! ## Usage
//!
//! ```rust,no_run
//! fn main() {
//!     if let Err(err) = voxel_engine::run() {
//!         eprintln!("{err}");
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use thiserror::Error;
use web_time::Instant;

use engine_state::config::{ConfigError, EngineConfig};
use engine_state::meshing::ChunkMesh;
use engine_state::task_management::SchedulerError;
use engine_state::voxels::block::catalog::{BlockCatalog, CatalogError};
use engine_state::voxels::block::AIR;
use engine_state::voxels::chunk::{ChunkPosition, CHUNK_HEIGHT, CHUNK_WIDTH};
use engine_state::voxels::world::{ChunkGenerator, World};
use engine_state::VoxelContext;

pub mod core;
pub mod engine_state;

/// Environment variable naming an optional JSON engine configuration.
pub const CONFIG_PATH_VARIABLE: &str = "VOXEL_ENGINE_CONFIG";

const DEMO_RADIUS: i32 = 1;
const DEMO_SEED: u32 = 7;
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Anything that stops [`run`] from finishing.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read engine configuration {path}: {source}")]
    ConfigFile {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Sets up `env_logger` on stdout, filtered by `RUST_LOG`.
///
/// Calling it more than once is harmless.
pub fn init_logger() {
    let mut log_builder = env_logger::Builder::new();
    let _ = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init();
}

/// Loads the configuration named by [`CONFIG_PATH_VARIABLE`], or the defaults.
pub fn load_config() -> Result<EngineConfig, EngineError> {
    let Ok(path) = std::env::var(CONFIG_PATH_VARIABLE) else {
        return Ok(EngineConfig::default());
    };
    let json = std::fs::read_to_string(&path).map_err(|source| EngineError::ConfigFile {
        path: path.clone(),
        source,
    })?;
    info!("Loaded engine configuration from {}", path);
    Ok(EngineConfig::from_json_str(&json)?)
}

/// Builds a small world, edits it and reports the resulting meshes.
pub fn run() -> Result<(), EngineError> {
    init_logger();
    info!("Logger initialized");

    let start = Instant::now();
    let context = Arc::new(VoxelContext::new(BlockCatalog::builtin()?, load_config()?));
    let mut world = World::new(context.clone())?;

    for x in -DEMO_RADIUS..=DEMO_RADIUS {
        for z in -DEMO_RADIUS..=DEMO_RADIUS {
            world.add_chunk_at(ChunkPosition::new(x, z), ChunkGenerator::Perlin { seed: DEMO_SEED });
        }
    }

    let catalog = context.catalog();
    let glowstone = catalog.id_by_name("glowstone").unwrap_or_default();
    let glass = catalog.id_by_name("glass").unwrap_or_default();
    let edge = CHUNK_WIDTH as i32 - 1;
    for (world_x, world_z, id) in [(0, 0, glowstone), (edge, 4, glass), (edge, edge, glowstone)] {
        let surface = (0..CHUNK_HEIGHT as i32)
            .rev()
            .find(|&y| world.block_at(world_x, y, world_z) != AIR)
            .map_or(0, |y| y + 1);
        world.place_block_at(world_x, surface, world_z, id);
    }
    let drop = world.destroy_block_at(3, 0, 3);
    info!("Destroyed a block at (3, 0, 3), dropped {:?}", drop);

    if !world.wait_for_idle(IDLE_TIMEOUT) {
        warn!(
            "Regeneration still busy after {:?} ({} chunks queued)",
            IDLE_TIMEOUT,
            world.scheduler().pending_count()
        );
    }

    let mut meshes: HashMap<ChunkPosition, ChunkMesh> = HashMap::new();
    let delivered = world.process_completed_tasks(&mut meshes);
    let mut positions: Vec<_> = meshes.keys().copied().collect();
    positions.sort_by_key(|position| (position.x, position.z));
    for position in positions {
        let mesh = &meshes[&position];
        info!(
            "Chunk {}: {} opaque faces, {} liquid faces",
            position,
            mesh.opaque.face_count(),
            mesh.liquid.face_count()
        );
    }
    info!(
        "Regenerated {} chunks ({} results) in {:?}",
        meshes.len(),
        delivered,
        start.elapsed()
    );
    Ok(())
}
