use voxel_engine::engine_state::lighting::PackedLight;
use voxel_engine::engine_state::meshing::{BiomeColors, ChunkMesh, MeshBuilder, WHITE};
use voxel_engine::engine_state::voxels::block::catalog::BlockCatalog;
use voxel_engine::engine_state::voxels::block::BlockId;
use voxel_engine::engine_state::voxels::chunk::neighbors::{link, unlink, NeighborDirection};
use voxel_engine::engine_state::voxels::chunk::{Chunk, ChunkHandle, ChunkPosition};
use voxel_engine::engine_state::VoxelContext;

fn context() -> VoxelContext {
    VoxelContext::builtin().unwrap()
}

fn id(context: &VoxelContext, name: &str) -> BlockId {
    context.catalog().id_by_name(name).unwrap()
}

fn mesh(context: &VoxelContext, chunk: &mut Chunk) -> ChunkMesh {
    context.light_propagator().generate_light(chunk);
    context.mesh_builder().generate_mesh(chunk)
}

#[test]
fn lone_opaque_block_has_six_faces() {
    let context = context();
    let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
    chunk.set_block(8, 64, 8, id(&context, "stone"));
    let mesh = mesh(&context, &mut chunk);

    assert_eq!(mesh.opaque.face_count(), 6);
    assert_eq!(mesh.opaque.vertices.len(), 24);
    assert_eq!(mesh.opaque.indices.len(), 36);
    assert!(mesh.liquid.is_empty());
    assert!(mesh.opaque.vertices.iter().all(|vertex| vertex.color == WHITE));
}

#[test]
fn shared_face_between_opaque_blocks_is_culled() {
    let context = context();
    let stone = id(&context, "stone");
    let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
    chunk.set_block(8, 64, 8, stone);
    chunk.set_block(9, 64, 8, stone);
    assert_eq!(mesh(&context, &mut chunk).opaque.face_count(), 10);
}

#[test]
fn self_culling_depends_on_the_block() {
    let context = context();
    let glass = id(&context, "glass");
    let leaves = id(&context, "oak_leaves");

    let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
    chunk.set_block(4, 10, 4, glass);
    chunk.set_block(4, 10, 5, glass);
    assert_eq!(mesh(&context, &mut chunk).opaque.face_count(), 10);

    let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
    chunk.set_block(4, 10, 4, leaves);
    chunk.set_block(4, 10, 5, leaves);
    assert_eq!(mesh(&context, &mut chunk).opaque.face_count(), 12);
}

#[test]
fn liquids_go_to_their_own_buffer() {
    let context = context();
    let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
    chunk.set_block(3, 20, 3, id(&context, "water"));
    chunk.set_block(3, 19, 3, id(&context, "stone"));
    let mesh = mesh(&context, &mut chunk);

    // Water never draws against the stone below it; the stone still shows through.
    assert_eq!(mesh.liquid.face_count(), 5);
    assert_eq!(mesh.opaque.face_count(), 6);
    assert_eq!(mesh.liquid.index_bytes().len(), 5 * 6 * 4);
    assert_eq!(mesh.liquid.vertex_bytes().len(), 5 * 4 * 32);
}

#[test]
fn faces_carry_the_light_in_front_of_them() {
    let context = context();
    let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
    chunk.set_block(8, 64, 8, id(&context, "stone"));
    let mesh = mesh(&context, &mut chunk);

    let sun = |vertex_light: u32| PackedLight(vertex_light as u16).sun();
    let shaded = mesh
        .opaque
        .vertices
        .iter()
        .filter(|vertex| sun(vertex.light) == 14)
        .count();
    let open = mesh
        .opaque
        .vertices
        .iter()
        .filter(|vertex| sun(vertex.light) == 15)
        .count();
    // Only the bottom face looks into the block's shadow.
    assert_eq!(shaded, 4);
    assert_eq!(open, 20);
}

#[test]
fn grass_is_tinted_by_biome() {
    let context = context();
    let mut chunk = Chunk::new(ChunkPosition::new(2, -3));
    chunk.set_block(5, 40, 6, id(&context, "grass"));
    let mesh = mesh(&context, &mut chunk);

    let expected = BiomeColors::new(context.config().biome_seed).color_at(2 * 16 + 5, -3 * 16 + 6);
    assert!(mesh.opaque.vertices.iter().all(|vertex| vertex.color == expected));
    assert!(mesh.opaque.vertices.iter().any(|vertex| vertex.mask_uv[0] >= 0.0));
}

#[test]
fn seam_faces_follow_neighbour_links() {
    let context = context();
    let stone = id(&context, "stone");
    let left = ChunkHandle::new(Chunk::new(ChunkPosition::new(0, 0)));
    let right = ChunkHandle::new(Chunk::new(ChunkPosition::new(1, 0)));
    left.get_mut().set_block(15, 30, 7, stone);
    right.get_mut().set_block(0, 30, 7, stone);

    // Unlinked: the neighbour is unknown and the seam face is drawn.
    let lone = MeshBuilder::new(context.catalog(), context.biome_colors()).generate_mesh(&left.get());
    assert_eq!(lone.opaque.face_count(), 6);

    assert!(link(&left, NeighborDirection::Right, &right));
    let joined = context.mesh_builder().generate_mesh(&left.get());
    assert_eq!(joined.opaque.face_count(), 5);

    unlink(&right, NeighborDirection::Left);
    let split = context.mesh_builder().generate_mesh(&left.get());
    assert_eq!(split.opaque.face_count(), 6);
}
