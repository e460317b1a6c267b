//! # Chunk Creation Module
//!
//! Stand-ins for terrain generation: a builder that fills a chunk cell by cell in
//! storage order, and a handful of fill patterns built on top of it.

use noise::{NoiseFn, Perlin};

use crate::engine_state::voxels::block::{BlockId, AIR};

use super::{Chunk, ChunkPosition, CHUNK_HEIGHT, CHUNK_SIZE, CHUNK_WIDTH};

/// Scaling factor applied to world coordinates when sampling Perlin noise.
pub const PERLIN_SCALE_FACTOR: f64 = 0.02;
/// Height the Perlin terrain oscillates around.
pub const PERLIN_BASE_HEIGHT: f64 = 48.0;
/// Peak deviation of the Perlin terrain from its base height.
pub const PERLIN_AMPLITUDE: f64 = 16.0;

/// Fills a chunk one cell at a time, x fastest, then z, then y.
///
/// Writes go straight to storage; column heights are computed once in
/// [`return_chunk`](Self::return_chunk).
pub struct ChunkCreationIterator {
    chunk: Chunk,
    /// Index of the next cell to be written.
    cursor: usize,
}

impl ChunkCreationIterator {
    pub fn new(position: ChunkPosition) -> Self {
        ChunkCreationIterator {
            chunk: Chunk::new(position),
            cursor: 0,
        }
    }

    /// Writes `id` to the current cell and advances. Calls past the last cell are ignored.
    pub fn push_block(&mut self, id: BlockId) {
        if self.cursor >= CHUNK_SIZE {
            return;
        }
        if id > AIR {
            self.chunk.blocks[self.cursor] = id;
            self.chunk.solid_array.set(self.cursor, true);
        }
        self.cursor += 1;
    }

    /// Finalizes the chunk. Cells never pushed stay air.
    pub fn return_chunk(mut self) -> Chunk {
        self.chunk.rebuild_heights();
        self.chunk
    }
}

impl Chunk {
    /// Solid layers from the bottom up: `layers[0]` fills y = 0, and so on.
    pub fn flat(position: ChunkPosition, layers: &[BlockId]) -> Self {
        let mut cci = ChunkCreationIterator::new(position);
        for &id in layers.iter().take(CHUNK_HEIGHT) {
            for _ in 0..CHUNK_WIDTH * CHUNK_WIDTH {
                cci.push_block(id);
            }
        }
        cci.return_chunk()
    }

    /// Random scatter of `id` with the given fill ratio, reproducible from `seed`.
    pub fn random(position: ChunkPosition, id: BlockId, density: f64, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut cci = ChunkCreationIterator::new(position);
        for _ in 0..CHUNK_SIZE {
            if rng.f64() < density {
                cci.push_block(id);
            } else {
                cci.push_block(AIR);
            }
        }
        cci.return_chunk()
    }

    /// Rolling height-field terrain sampled from 2D Perlin noise.
    ///
    /// Columns are `stone` up to three blocks below the surface, `filler` above that
    /// and `surface` on top. Neighbouring chunks sampled with the same seed line up.
    pub fn perlin(
        position: ChunkPosition,
        seed: u32,
        stone: BlockId,
        filler: BlockId,
        surface: BlockId,
    ) -> Self {
        let perlin = Perlin::new(seed);
        let (origin_x, origin_z) = position.world_origin();

        let mut column_heights = [0usize; CHUNK_WIDTH * CHUNK_WIDTH];
        for z in 0..CHUNK_WIDTH {
            for x in 0..CHUNK_WIDTH {
                let sample = perlin.get([
                    (origin_x + x as i32) as f64 * PERLIN_SCALE_FACTOR,
                    (origin_z + z as i32) as f64 * PERLIN_SCALE_FACTOR,
                ]);
                let height = PERLIN_BASE_HEIGHT + sample * PERLIN_AMPLITUDE;
                column_heights[z * CHUNK_WIDTH + x] =
                    (height.round() as usize).clamp(1, CHUNK_HEIGHT - 1);
            }
        }

        let mut cci = ChunkCreationIterator::new(position);
        for y in 0..CHUNK_HEIGHT {
            for height in column_heights {
                let id = if y + 1 == height {
                    surface
                } else if y + 4 >= height && y < height {
                    filler
                } else if y < height {
                    stone
                } else {
                    AIR
                };
                cci.push_block(id);
            }
        }
        cci.return_chunk()
    }
}
