//! # Chunk Neighbours
//!
//! Chunks form a doubly linked 2D grid through weak links to their four horizontal
//! neighbours. Links are always written in pairs: if `a.right == b` then `b.left == a`.
//!
//! Each side of a pair is written under its own lock, one after the other, so a caller
//! never holds two chunk locks at once.
//!
//! [`ChunkNeighborhood`] is the read side: a snapshot of the 3x3 chunks around a chunk,
//! taken once per regeneration so lighting and meshing see one consistent view.

use log::{debug, warn};

use crate::engine_state::voxels::block::{BlockId, AIR, UNKNOWN_BLOCK};

use super::{Chunk, ChunkHandle, ChunkPosition, CHUNK_HEIGHT, CHUNK_WIDTH};

/// One of the four horizontal neighbour slots of a chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NeighborDirection {
    /// -X
    Left = 0,
    /// +X
    Right = 1,
    /// -Z
    Back = 2,
    /// +Z
    Front = 3,
}

impl NeighborDirection {
    pub const ALL: [NeighborDirection; 4] = [
        NeighborDirection::Left,
        NeighborDirection::Right,
        NeighborDirection::Back,
        NeighborDirection::Front,
    ];

    pub fn opposite(self) -> Self {
        match self {
            NeighborDirection::Left => NeighborDirection::Right,
            NeighborDirection::Right => NeighborDirection::Left,
            NeighborDirection::Back => NeighborDirection::Front,
            NeighborDirection::Front => NeighborDirection::Back,
        }
    }

    /// Chunk-grid step `(dx, dz)` towards this neighbour.
    pub fn offset(self) -> (i32, i32) {
        match self {
            NeighborDirection::Left => (-1, 0),
            NeighborDirection::Right => (1, 0),
            NeighborDirection::Back => (0, -1),
            NeighborDirection::Front => (0, 1),
        }
    }

    /// The two directions perpendicular to this one.
    pub fn perpendicular(self) -> [NeighborDirection; 2] {
        match self {
            NeighborDirection::Left | NeighborDirection::Right => {
                [NeighborDirection::Front, NeighborDirection::Back]
            }
            NeighborDirection::Back | NeighborDirection::Front => {
                [NeighborDirection::Left, NeighborDirection::Right]
            }
        }
    }

    /// The position a neighbour in this direction must have.
    pub fn neighbor_of(self, position: ChunkPosition) -> ChunkPosition {
        let (dx, dz) = self.offset();
        position.offset(dx, dz)
    }
}

/// Links `chunk` and `neighbor` in both directions.
///
/// `neighbor` must sit exactly one step from `chunk` in `direction`; anything else
/// (including linking a chunk to itself) is rejected with a warning and changes nothing.
/// A previous neighbour in that slot is unlinked first.
pub fn link(chunk: &ChunkHandle, direction: NeighborDirection, neighbor: &ChunkHandle) -> bool {
    let expected = direction.neighbor_of(chunk.position());
    if neighbor.position() != expected || neighbor.ptr_eq(chunk) {
        warn!(
            "Rejected {:?} link from chunk {} to chunk {}: expected a chunk at {}",
            direction,
            chunk.position(),
            neighbor.position(),
            expected
        );
        return false;
    }

    let already_linked = chunk
        .get()
        .neighbor_link(direction)
        .is_some_and(|existing| existing.refers_to(neighbor));
    if !already_linked {
        unlink(chunk, direction);
        unlink(neighbor, direction.opposite());
    }

    chunk
        .get_mut()
        .set_neighbor_link(direction, Some(neighbor.downgrade()));
    neighbor
        .get_mut()
        .set_neighbor_link(direction.opposite(), Some(chunk.downgrade()));

    debug!(
        "Linked chunk {} {:?} to chunk {}",
        chunk.position(),
        direction,
        neighbor.position()
    );
    true
}

/// Clears the link in `direction` and the neighbour's reciprocal link back to `chunk`.
///
/// Returns the former neighbour if it was still alive.
pub fn unlink(chunk: &ChunkHandle, direction: NeighborDirection) -> Option<ChunkHandle> {
    let former = chunk.get_mut().set_neighbor_link(direction, None)?;
    let neighbor = former.upgrade()?;

    let mut neighbor_chunk = neighbor.get_mut();
    let points_back = neighbor_chunk
        .neighbor_link(direction.opposite())
        .is_some_and(|existing| existing.refers_to(chunk));
    if points_back {
        neighbor_chunk.set_neighbor_link(direction.opposite(), None);
    }
    drop(neighbor_chunk);

    Some(neighbor)
}

/// Unlinks every neighbour of `chunk`, returning the ones that were still alive.
pub fn unlink_all(chunk: &ChunkHandle) -> Vec<ChunkHandle> {
    NeighborDirection::ALL
        .into_iter()
        .filter_map(|direction| unlink(chunk, direction))
        .collect()
}

/// Owned copy of the data lighting and meshing read from one chunk.
#[derive(Clone)]
struct NeighborSnapshot {
    blocks: Box<[BlockId]>,
    heights: Box<[u8]>,
}

impl NeighborSnapshot {
    fn capture(chunk: &Chunk) -> Self {
        NeighborSnapshot {
            blocks: chunk.blocks().into(),
            heights: chunk.heights().into(),
        }
    }
}

/// The 3x3 chunks around a centre chunk, captured once.
///
/// Coordinates are chunk-local to the centre: `x` and `z` range over
/// `-CHUNK_WIDTH..2 * CHUNK_WIDTH`.
pub struct ChunkNeighborhood {
    center: ChunkPosition,
    /// Indexed `(dz + 1) * 3 + (dx + 1)`.
    chunks: [Option<NeighborSnapshot>; 9],
}

impl ChunkNeighborhood {
    /// Snapshots `chunk` and whatever neighbours are linked around it.
    ///
    /// Called while the centre chunk is locked by the caller, so the centre is read
    /// from `chunk` directly and any handle resolving to the centre's position is
    /// skipped. Neighbours are read-locked one at a time.
    pub fn capture(chunk: &Chunk) -> Self {
        let center = chunk.position();
        let mut neighborhood = ChunkNeighborhood {
            center,
            chunks: Default::default(),
        };
        neighborhood.chunks[Self::slot(0, 0)] = Some(NeighborSnapshot::capture(chunk));

        for direction in NeighborDirection::ALL {
            if let Some(handle) = chunk.neighbor(direction) {
                neighborhood.capture_handle(&handle);
            }
        }

        let diagonals = [
            (NeighborDirection::Left, NeighborDirection::Back),
            (NeighborDirection::Left, NeighborDirection::Front),
            (NeighborDirection::Right, NeighborDirection::Back),
            (NeighborDirection::Right, NeighborDirection::Front),
        ];
        for (horizontal, depth) in diagonals {
            let diagonal = Self::two_hops(chunk, horizontal, depth)
                .or_else(|| Self::two_hops(chunk, depth, horizontal));
            if let Some(handle) = diagonal {
                neighborhood.capture_handle(&handle);
            }
        }

        neighborhood
    }

    fn two_hops(
        chunk: &Chunk,
        first: NeighborDirection,
        second: NeighborDirection,
    ) -> Option<ChunkHandle> {
        let step = chunk.neighbor(first)?;
        if step.position() == chunk.position() {
            return None;
        }
        let step_chunk = step.get();
        step_chunk.neighbor(second)
    }

    fn capture_handle(&mut self, handle: &ChunkHandle) {
        let dx = handle.position().x - self.center.x;
        let dz = handle.position().z - self.center.z;
        if (dx, dz) == (0, 0) || dx.abs() > 1 || dz.abs() > 1 {
            return;
        }
        let slot = Self::slot(dx, dz);
        if self.chunks[slot].is_none() {
            self.chunks[slot] = Some(NeighborSnapshot::capture(&handle.get()));
        }
    }

    #[inline]
    fn slot(dx: i32, dz: i32) -> usize {
        ((dz + 1) * 3 + (dx + 1)) as usize
    }

    /// Resolves centre-local `(x, z)` to a snapshot and the local column within it.
    #[inline]
    fn locate(&self, x: i32, z: i32) -> Option<(&NeighborSnapshot, usize, usize)> {
        let width = CHUNK_WIDTH as i32;
        if !(-width..2 * width).contains(&x) || !(-width..2 * width).contains(&z) {
            return None;
        }
        let dx = x.div_euclid(width);
        let dz = z.div_euclid(width);
        let snapshot = self.chunks[Self::slot(dx, dz)].as_ref()?;
        Some((
            snapshot,
            x.rem_euclid(width) as usize,
            z.rem_euclid(width) as usize,
        ))
    }

    pub fn center(&self) -> ChunkPosition {
        self.center
    }

    /// `true` when the chunk `(dx, dz)` steps from the centre was captured.
    pub fn is_present(&self, dx: i32, dz: i32) -> bool {
        dx.abs() <= 1 && dz.abs() <= 1 && self.chunks[Self::slot(dx, dz)].is_some()
    }

    /// Block id at centre-local coordinates.
    ///
    /// `y` outside the world is air. Cells outside the 3x3 footprint or in a chunk
    /// that was not linked read as [`UNKNOWN_BLOCK`].
    #[inline]
    pub fn block_id(&self, x: i32, y: i32, z: i32) -> BlockId {
        if !(0..CHUNK_HEIGHT as i32).contains(&y) {
            return AIR;
        }
        match self.locate(x, z) {
            Some((snapshot, lx, lz)) => snapshot.blocks[Chunk::index(lx, y as usize, lz)],
            None => UNKNOWN_BLOCK,
        }
    }

    /// Column height at centre-local coordinates; 0 for missing chunks.
    #[inline]
    pub fn height(&self, x: i32, z: i32) -> usize {
        self.locate(x, z)
            .map_or(0, |(snapshot, lx, lz)| snapshot.heights[lz * CHUNK_WIDTH + lx] as usize)
    }
}
