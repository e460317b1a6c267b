//! # Engine State Module
//!
//! Everything needed to keep a mutable voxel world lit and meshed.
//!
//! ## Key Components
//!
//! * `VoxelContext` - The shared, read-only context handed to every stage
//! * `config` - Engine tunables
//! * `lighting` - Flood-fill light propagation
//! * `meshing` - Face culling and mesh generation
//! * `task_management` - The background regeneration scheduler
//! * `voxels` - Blocks, chunks and the chunk store
//!
//! ## Data Flow
//!
//! 1. An edit goes through the [`World`](voxels::world::World)
//! 2. The world asks the scheduler to regenerate the edited chunk and the neighbours
//!    sharing its edge
//! 3. The worker relights and remeshes each chunk under its lock
//! 4. Finished meshes are drained on the main thread into a renderer-facing sink

use crate::engine_state::voxels::block::catalog::{BlockCatalog, CatalogError};

use config::EngineConfig;
use lighting::LightPropagator;
use meshing::{BiomeColors, MeshBuilder};

pub mod config;
pub mod lighting;
pub mod meshing;
pub mod task_management;
pub mod voxels;

/// Read-only state shared by lighting, meshing and the scheduler.
///
/// There is no global: every stage receives the context it works against, usually as
/// an `Arc<VoxelContext>` shared with the worker thread.
pub struct VoxelContext {
    catalog: BlockCatalog,
    config: EngineConfig,
    biome_colors: BiomeColors,
}

impl VoxelContext {
    pub fn new(catalog: BlockCatalog, config: EngineConfig) -> Self {
        let biome_colors = BiomeColors::new(config.biome_seed);
        VoxelContext {
            catalog,
            config,
            biome_colors,
        }
    }

    /// The bundled block catalog with default settings.
    pub fn builtin() -> Result<Self, CatalogError> {
        Ok(Self::new(BlockCatalog::builtin()?, EngineConfig::default()))
    }

    pub fn with_biome_colors(mut self, biome_colors: BiomeColors) -> Self {
        self.biome_colors = biome_colors;
        self
    }

    pub fn catalog(&self) -> &BlockCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn biome_colors(&self) -> &BiomeColors {
        &self.biome_colors
    }

    pub fn light_propagator(&self) -> LightPropagator<'_> {
        LightPropagator::new(&self.catalog)
    }

    pub fn mesh_builder(&self) -> MeshBuilder<'_> {
        MeshBuilder::new(&self.catalog, &self.biome_colors)
    }
}
