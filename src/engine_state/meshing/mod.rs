//! Mesh generation for voxel chunks.
//!
//! This module converts a chunk's blocks and its computed lightmap into two
//! GPU-friendly buffers: lit faces for everything that is not a liquid, and unlit
//! faces for liquids. Faces hidden behind another block are culled, including faces
//! on the seam to a linked neighbour chunk.
//!
//! # Architecture
//! - [`MeshBuilder`]: walks the occupied cells of a chunk and emits visible faces
//! - [`Face`]: the four corners of one block side in emission order
//! - [`ChunkMesh`] / [`FaceBuffer`]: the resulting indexed buffers
//! - [`BiomeColors`]: the per-position tint lookup

use log::trace;
use web_time::Instant;

use crate::engine_state::lighting::PackedLight;
use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::catalog::BlockCatalog;
use crate::engine_state::voxels::block::{BlockId, BlockState, AIR, UNKNOWN_BLOCK};
use crate::engine_state::voxels::chunk::neighbors::ChunkNeighborhood;
use crate::engine_state::voxels::chunk::{Chunk, CHUNK_HEIGHT};

mod face;
mod mesh;
mod tint;
mod vertex;

pub use face::Face;
pub use mesh::{ChunkMesh, FaceBuffer, QUAD_INDICES};
pub use tint::{BiomeColors, WHITE};
pub use vertex::{LiquidVertex, OpaqueVertex};

/// Decides whether the face of `working_id` that looks at `neighbor_id` is visible.
///
/// - air and the unknown sentinel never hide a face
/// - a transparent neighbour hides it only when it is the same block and that block
///   culls itself
/// - anything else hides it
pub fn should_draw_face(catalog: &BlockCatalog, working_id: BlockId, neighbor_id: BlockId) -> bool {
    if neighbor_id == AIR || neighbor_id == UNKNOWN_BLOCK {
        return true;
    }
    let neighbor = catalog.entry_or_missing(neighbor_id);
    if !neighbor.is_transparent() {
        return false;
    }
    neighbor_id != working_id || !neighbor.transparency_culls_self
}

/// Builds [`ChunkMesh`]es from chunk data.
pub struct MeshBuilder<'a> {
    catalog: &'a BlockCatalog,
    biome_colors: &'a BiomeColors,
}

impl<'a> MeshBuilder<'a> {
    pub fn new(catalog: &'a BlockCatalog, biome_colors: &'a BiomeColors) -> Self {
        MeshBuilder {
            catalog,
            biome_colors,
        }
    }

    /// Meshes `chunk` against its current neighbours.
    ///
    /// Reads the lightmap as it is; run lighting first for correct face light.
    pub fn generate_mesh(&self, chunk: &Chunk) -> ChunkMesh {
        let neighborhood = ChunkNeighborhood::capture(chunk);
        self.generate_mesh_with(chunk, &neighborhood)
    }

    /// Like [`generate_mesh`](Self::generate_mesh) with an already captured neighbourhood.
    pub fn generate_mesh_with(&self, chunk: &Chunk, neighborhood: &ChunkNeighborhood) -> ChunkMesh {
        let start = Instant::now();
        let mut mesh = ChunkMesh::new(chunk.position());

        for block in chunk.iter_blocks() {
            for side in BlockSide::all() {
                let offset = side.offset();
                let position = block.local_position();
                let neighbor_id = neighborhood.block_id(
                    position.x as i32 + offset.x,
                    position.y as i32 + offset.y,
                    position.z as i32 + offset.z,
                );
                if !should_draw_face(self.catalog, block.id, neighbor_id) {
                    continue;
                }
                self.emit_face(chunk, &block, side, &mut mesh);
            }
        }

        trace!(
            "Generated mesh for chunk {} ({} opaque faces, {} liquid faces) in {:?}",
            chunk.position(),
            mesh.opaque.face_count(),
            mesh.liquid.face_count(),
            start.elapsed()
        );
        mesh
    }

    fn emit_face(&self, chunk: &Chunk, block: &BlockState, side: BlockSide, mesh: &mut ChunkMesh) {
        let entry = self.catalog.entry_or_missing(block.id);
        let position = block.local_position();
        let face = Face::new(position.x, position.y, position.z, block.id, side);
        let corners = face.corners();
        let atlas_uvs = Face::atlas_uvs(entry.texture(side));

        if entry.is_liquid() {
            let normal = side.normal();
            let vertices = std::array::from_fn(|corner| LiquidVertex {
                position: corners[corner].into(),
                uv: atlas_uvs[corner],
                normal,
            });
            mesh.liquid.push_quad(vertices);
            return;
        }

        let light = face_light(chunk, block, side).raw() as u32;
        let (origin_x, origin_z) = chunk.position().world_origin();
        let color = self.biome_colors.tint(
            entry,
            origin_x + position.x as i32,
            origin_z + position.z as i32,
        );
        let quad_uvs = Face::quad_uvs();
        let mask_uvs = Face::atlas_uvs(entry.mask_texture(side));

        let vertices = std::array::from_fn(|corner| OpaqueVertex {
            position: corners[corner].into(),
            uv: quad_uvs[corner],
            atlas_uv: atlas_uvs[corner],
            mask_uv: mask_uvs[corner],
            color,
            light,
        });
        mesh.opaque.push_quad(vertices);
    }
}

/// Light for one face: the cell one step outward along the face normal.
///
/// Faces looking past the top or bottom of the world are fully lit.
pub fn face_light(chunk: &Chunk, block: &BlockState, side: BlockSide) -> PackedLight {
    let position = block.local_position();
    if (side == BlockSide::TOP && position.y == CHUNK_HEIGHT - 1)
        || (side == BlockSide::BOTTOM && position.y == 0)
    {
        return PackedLight::FULLY_LIT;
    }
    let offset = side.offset();
    chunk
        .lightmap()
        .get_local(
            position.x as i32 + offset.x,
            position.y as i32 + offset.y,
            position.z as i32 + offset.z,
        )
        .unwrap_or(PackedLight::FULLY_LIT)
}
