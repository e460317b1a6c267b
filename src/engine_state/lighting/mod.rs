//! # Lighting
//!
//! Flood-fill light propagation over a chunk's 3x3 footprint.
//!
//! A pass runs in two phases:
//! 1. **Seed**: sky cells at or above each column's height get sun 15, emissive blocks
//!    get their color, and the cells those values should spread from are pushed.
//! 2. **Propagate**: cells are popped off a worklist and raise their six neighbours
//!    until nothing changes.
//!
//! The outermost ring of footprint columns is held at full sun, standing in for the
//! open world beyond the loaded neighbourhood. Missing neighbour chunks read as
//! [`UNKNOWN_BLOCK`](crate::engine_state::voxels::block::UNKNOWN_BLOCK), which blocks
//! every channel.
//!
//! Light only ever increases during a pass, so the converged grid does not depend on
//! the order cells are popped in.

use log::trace;
use web_time::Instant;

use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::catalog::{BlockCatalog, MAX_NIBBLE};
use crate::engine_state::voxels::block::AIR;
use crate::engine_state::voxels::chunk::neighbors::ChunkNeighborhood;
use crate::engine_state::voxels::chunk::{Chunk, CHUNK_HEIGHT, CHUNK_WIDTH};

mod packed_light;

pub use packed_light::{LightChannel, LightMap, PackedLight, LIGHTMAP_SIZE, LIGHTMAP_WIDTH, MAX_LIGHT};

/// Width of the saturated ring around the footprint, in columns.
pub const SKY_RING_WIDTH: usize = 1;

/// A footprint cell waiting to spread its light.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct LightNode {
    fx: u8,
    y: u8,
    fz: u8,
}

impl LightNode {
    #[inline]
    fn new(fx: usize, y: usize, fz: usize) -> Self {
        LightNode {
            fx: fx as u8,
            y: y as u8,
            fz: fz as u8,
        }
    }
}

/// Computes lightmaps from block data and the catalog.
pub struct LightPropagator<'a> {
    catalog: &'a BlockCatalog,
}

impl<'a> LightPropagator<'a> {
    pub fn new(catalog: &'a BlockCatalog) -> Self {
        LightPropagator { catalog }
    }

    /// Recomputes `chunk`'s lightmap from its current blocks and linked neighbours.
    pub fn generate_light(&self, chunk: &mut Chunk) {
        let neighborhood = ChunkNeighborhood::capture(chunk);
        self.generate_light_with(chunk, &neighborhood);
    }

    /// Like [`generate_light`](Self::generate_light) with an already captured
    /// neighbourhood. The new grid replaces the old one only once it has converged.
    pub fn generate_light_with(&self, chunk: &mut Chunk, neighborhood: &ChunkNeighborhood) {
        let start = Instant::now();
        let lightmap = self.compute(neighborhood);
        chunk.replace_lightmap(lightmap);
        trace!(
            "Generated light for chunk {} in {:?}",
            chunk.position(),
            start.elapsed()
        );
    }

    /// Runs a full lighting pass and returns the converged grid.
    pub fn compute(&self, neighborhood: &ChunkNeighborhood) -> LightMap {
        let mut lightmap = LightMap::new();
        let mut worklist = Vec::with_capacity(LIGHTMAP_WIDTH * LIGHTMAP_WIDTH * 2);

        self.seed(neighborhood, &mut lightmap, &mut worklist);
        self.propagate(neighborhood, &mut lightmap, &mut worklist);

        lightmap
    }

    fn seed(
        &self,
        neighborhood: &ChunkNeighborhood,
        lightmap: &mut LightMap,
        worklist: &mut Vec<LightNode>,
    ) {
        let heights = column_heights(neighborhood);
        let column = |fx: usize, fz: usize| heights[fz * LIGHTMAP_WIDTH + fx];

        for fz in 0..LIGHTMAP_WIDTH {
            for fx in 0..LIGHTMAP_WIDTH {
                let height = column(fx, fz);
                for y in height..CHUNK_HEIGHT {
                    let mut light = lightmap.get(fx, y, fz);
                    light.set_sun(MAX_LIGHT);
                    lightmap.set(fx, y, fz, light);
                }

                // Ring columns are forced open but their emitters still shine.
                let (x, z) = local_column(fx, fz);
                for y in 0..neighborhood.height(x, z).min(CHUNK_HEIGHT) {
                    let id = neighborhood.block_id(x, y as i32, z);
                    if id == AIR {
                        continue;
                    }
                    if let Some(color) = self.catalog.emission(id) {
                        let mut light = lightmap.get(fx, y, fz);
                        light.set_red(color.red);
                        light.set_green(color.green);
                        light.set_blue(color.blue);
                        lightmap.set(fx, y, fz, light);
                        worklist.push(LightNode::new(fx, y, fz));
                    }
                }

                // A column of a chunk that is not loaded keeps its sky for faces
                // looking into it, but never spreads it.
                if !neighborhood.is_present(chunk_step(x), chunk_step(z)) {
                    continue;
                }

                worklist.push(LightNode::new(fx, height.min(CHUNK_HEIGHT - 1), fz));

                // Sky cells beside a taller column spread sideways under its overhang.
                let tallest_adjacent = [(-1, 0), (1, 0), (0, -1), (0, 1)]
                    .into_iter()
                    .filter_map(|(dx, dz)| {
                        let nx = fx.checked_add_signed(dx)?;
                        let nz = fz.checked_add_signed(dz)?;
                        (nx < LIGHTMAP_WIDTH && nz < LIGHTMAP_WIDTH).then(|| column(nx, nz))
                    })
                    .max()
                    .unwrap_or(0)
                    .min(CHUNK_HEIGHT);
                for y in (height + 1)..tallest_adjacent {
                    worklist.push(LightNode::new(fx, y, fz));
                }
            }
        }
    }

    fn propagate(
        &self,
        neighborhood: &ChunkNeighborhood,
        lightmap: &mut LightMap,
        worklist: &mut Vec<LightNode>,
    ) {
        while let Some(node) = worklist.pop() {
            let (fx, y, fz) = (node.fx as usize, node.y as usize, node.fz as usize);
            let current = lightmap.get(fx, y, fz);

            for side in BlockSide::all() {
                let offset = side.offset();
                let (Some(nx), Some(ny), Some(nz)) = (
                    fx.checked_add_signed(offset.x as isize),
                    y.checked_add_signed(offset.y as isize),
                    fz.checked_add_signed(offset.z as isize),
                ) else {
                    continue;
                };
                if nx >= LIGHTMAP_WIDTH || nz >= LIGHTMAP_WIDTH || ny >= CHUNK_HEIGHT {
                    continue;
                }

                let (x, z) = local_column(nx, nz);
                let neighbor_id = neighborhood.block_id(x, ny as i32, z);
                let neighbor = lightmap.get(nx, ny, nz);
                let mut raised = neighbor;

                if neighbor_id == AIR {
                    let sun = if side == BlockSide::BOTTOM && current.sun() == MAX_LIGHT {
                        MAX_LIGHT
                    } else {
                        current.sun().saturating_sub(1)
                    };
                    if sun > raised.sun() {
                        raised.set_sun(sun);
                    }
                }

                let opacity = self.catalog.opacity(neighbor_id);
                if opacity < MAX_NIBBLE {
                    let attenuation = if neighbor_id == AIR { 1 } else { opacity };
                    for channel in LightChannel::COLORS {
                        let value = current.get(channel).saturating_sub(attenuation);
                        if value > raised.get(channel) {
                            raised.set(channel, value);
                        }
                    }
                }

                if raised != neighbor {
                    lightmap.set(nx, ny, nz, raised);
                    worklist.push(LightNode::new(nx, ny, nz));
                }
            }
        }
    }
}

/// `true` for columns in the saturated outer ring.
#[inline]
pub fn is_sky_ring(fx: usize, fz: usize) -> bool {
    let far = LIGHTMAP_WIDTH - SKY_RING_WIDTH;
    fx < SKY_RING_WIDTH || fz < SKY_RING_WIDTH || fx >= far || fz >= far
}

/// Footprint column to centre-local column.
#[inline]
fn local_column(fx: usize, fz: usize) -> (i32, i32) {
    (
        fx as i32 - CHUNK_WIDTH as i32,
        fz as i32 - CHUNK_WIDTH as i32,
    )
}

/// Chunk offset from the centre owning a centre-local coordinate.
#[inline]
fn chunk_step(local: i32) -> i32 {
    local.div_euclid(CHUNK_WIDTH as i32)
}

/// Height each footprint column's sunlight starts at. Ring columns are open sky.
fn column_heights(neighborhood: &ChunkNeighborhood) -> Vec<usize> {
    let mut heights = vec![0; LIGHTMAP_WIDTH * LIGHTMAP_WIDTH];
    for fz in 0..LIGHTMAP_WIDTH {
        for fx in 0..LIGHTMAP_WIDTH {
            if is_sky_ring(fx, fz) {
                continue;
            }
            let (x, z) = local_column(fx, fz);
            heights[fz * LIGHTMAP_WIDTH + fx] = neighborhood.height(x, z);
        }
    }
    heights
}
