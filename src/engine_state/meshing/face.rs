use cgmath::Point3;

use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::catalog::UvRect;
use crate::engine_state::voxels::block::BlockId;

/// Represents a single quad face of a voxel in the mesh.
///
/// A face is defined by four corner points (lower-left, lower-right, upper-right,
/// upper-left). Listed in that order the corners wind counter-clockwise when seen from
/// outside the block, which is the order the quad is emitted in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Lower-left corner of the face in chunk coordinates
    pub ll: Point3<f32>,
    /// Lower-right corner of the face in chunk coordinates
    pub lr: Point3<f32>,
    /// Upper-right corner of the face in chunk coordinates
    pub ur: Point3<f32>,
    /// Upper-left corner of the face in chunk coordinates
    pub ul: Point3<f32>,
    /// The block the face belongs to
    pub block_id: BlockId,
    /// Which side of the block this face represents
    pub block_side: BlockSide,
}

impl Face {
    /// Creates the face of the block at `(x, y, z)` on the given side.
    pub fn new(x: usize, y: usize, z: usize, block_id: BlockId, block_side: BlockSide) -> Self {
        let (x, y, z) = (x as f32, y as f32, z as f32);
        let [ll, lr, ur, ul] = match block_side {
            BlockSide::TOP => [
                Point3::new(x, y + 1.0, z),
                Point3::new(x, y + 1.0, z + 1.0),
                Point3::new(x + 1.0, y + 1.0, z + 1.0),
                Point3::new(x + 1.0, y + 1.0, z),
            ],
            BlockSide::BOTTOM => [
                Point3::new(x, y, z),
                Point3::new(x + 1.0, y, z),
                Point3::new(x + 1.0, y, z + 1.0),
                Point3::new(x, y, z + 1.0),
            ],
            BlockSide::FRONT => [
                Point3::new(x, y, z + 1.0),
                Point3::new(x + 1.0, y, z + 1.0),
                Point3::new(x + 1.0, y + 1.0, z + 1.0),
                Point3::new(x, y + 1.0, z + 1.0),
            ],
            BlockSide::BACK => [
                Point3::new(x + 1.0, y, z),
                Point3::new(x, y, z),
                Point3::new(x, y + 1.0, z),
                Point3::new(x + 1.0, y + 1.0, z),
            ],
            BlockSide::RIGHT => [
                Point3::new(x + 1.0, y, z + 1.0),
                Point3::new(x + 1.0, y, z),
                Point3::new(x + 1.0, y + 1.0, z),
                Point3::new(x + 1.0, y + 1.0, z + 1.0),
            ],
            BlockSide::LEFT => [
                Point3::new(x, y, z),
                Point3::new(x, y, z + 1.0),
                Point3::new(x, y + 1.0, z + 1.0),
                Point3::new(x, y + 1.0, z),
            ],
        };

        Face {
            ll,
            lr,
            ur,
            ul,
            block_id,
            block_side,
        }
    }

    /// Corners in emission order.
    pub fn corners(&self) -> [Point3<f32>; 4] {
        [self.ll, self.lr, self.ur, self.ul]
    }

    /// Quad-space UV of each corner, matching [`corners`](Self::corners).
    pub fn quad_uvs() -> [[f32; 2]; 4] {
        [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]
    }

    /// Atlas UV of each corner for the given rectangle. An unused rectangle stays
    /// unused at every corner.
    pub fn atlas_uvs(rect: UvRect) -> [[f32; 2]; 4] {
        if rect.is_unused() {
            return [[-1.0, -1.0]; 4];
        }
        [
            [rect.u0(), rect.v1()],
            [rect.u1(), rect.v1()],
            [rect.u1(), rect.v0()],
            [rect.u0(), rect.v0()],
        ]
    }
}
