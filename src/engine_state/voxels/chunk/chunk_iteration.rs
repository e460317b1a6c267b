//! # Chunk Iteration Module
//!
//! This module provides an iterator for traversing all non-air blocks in a chunk.
//!
//! The iterator walks the set bits of the chunk's `solid_array`, so air cells are
//! skipped a machine word at a time instead of one by one.

use bitvec::slice::IterOnes;
use bitvec::{order::Lsb0, prelude::BitVec};

use crate::engine_state::voxels::block::BlockState;

use super::Chunk;

/// An iterator over all non-air blocks in a chunk, in storage order
/// (x fastest, then z, then y).
pub struct ChunkBlockIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    /// Positions of the set bits in the chunk's solid array
    ones: IterOnes<'a, usize, Lsb0>,
}

impl<'a> ChunkBlockIterator<'a> {
    /// Creates a new `ChunkBlockIterator` positioned at the first non-air block.
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        let solid_array: &'a BitVec = &chunk_ref.solid_array;
        ChunkBlockIterator {
            chunk_ref,
            ones: solid_array.iter_ones(),
        }
    }
}

impl Iterator for ChunkBlockIterator<'_> {
    type Item = BlockState;

    fn next(&mut self) -> Option<BlockState> {
        let index = self.ones.next()?;
        let (x, y, z) = Chunk::coordinates(index);
        Some(BlockState::new(
            self.chunk_ref.blocks[index],
            x as u8,
            y as u8,
            z as u8,
        ))
    }
}
