//! Vertex formats emitted by the mesher.
//!
//! Both formats are plain `#[repr(C)]` data so whole buffers can be viewed as bytes
//! for upload. How the renderer binds the attributes is up to the renderer.

use bytemuck::{Pod, Zeroable};

/// A vertex of an opaque (or non-liquid transparent) block face.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Quad UV: 2x f32 (8 bytes)
/// - Atlas UV: 2x f32 (8 bytes)
/// - Mask UV: 2x f32 (8 bytes), all `-1.0` when the block has no mask
/// - Color: 4x f32 (16 bytes)
/// - Light: u32 (4 bytes), the packed sun/red/green/blue nibbles in the low 16 bits
///
/// Total size: 56 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct OpaqueVertex {
    /// Chunk-local position
    pub position: [f32; 3],
    /// Corner of the quad, each component 0.0 or 1.0
    pub uv: [f32; 2],
    /// Texture atlas coordinates
    pub atlas_uv: [f32; 2],
    /// Mask overlay atlas coordinates
    pub mask_uv: [f32; 2],
    /// Tint color
    pub color: [f32; 4],
    pub light: u32,
}

/// A vertex of a liquid face. Liquids are drawn unlit in their own pass.
///
/// Total size: 32 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LiquidVertex {
    /// Chunk-local position
    pub position: [f32; 3],
    /// Texture atlas coordinates
    pub uv: [f32; 2],
    /// Outward face normal
    pub normal: [f32; 3],
}
