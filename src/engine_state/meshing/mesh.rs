//! Mesh data structures produced by the mesher and handed to the renderer.

use bytemuck::Pod;

use crate::engine_state::voxels::chunk::ChunkPosition;

use super::vertex::{LiquidVertex, OpaqueVertex};

/// Index pattern of one quad: two triangles over its four vertices.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// An independently indexed vertex/index buffer pair.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBuffer<V> {
    /// The vertex data, four vertices per face
    pub vertices: Vec<V>,
    /// The index data, six indices per face
    pub indices: Vec<u32>,
}

impl<V: Pod> FaceBuffer<V> {
    pub fn new() -> Self {
        FaceBuffer {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Appends one quad and its indices, offset by the vertices already present.
    pub fn push_quad(&mut self, vertices: [V; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&vertices);
        self.indices.extend(QUAD_INDICES.iter().map(|index| base + index));
    }

    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The vertex buffer as raw bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The index buffer as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

impl<V: Pod> Default for FaceBuffer<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// The geometry of one chunk: lit faces and liquid faces in separate buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMesh {
    pub position: ChunkPosition,
    pub opaque: FaceBuffer<OpaqueVertex>,
    pub liquid: FaceBuffer<LiquidVertex>,
}

impl ChunkMesh {
    pub fn new(position: ChunkPosition) -> Self {
        ChunkMesh {
            position,
            opaque: FaceBuffer::new(),
            liquid: FaceBuffer::new(),
        }
    }

    pub fn face_count(&self) -> usize {
        self.opaque.face_count() + self.liquid.face_count()
    }

    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.liquid.is_empty()
    }
}
