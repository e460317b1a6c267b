use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use voxel_engine::engine_state::config::EngineConfig;
use voxel_engine::engine_state::meshing::ChunkMesh;
use voxel_engine::engine_state::voxels::block::catalog::BlockCatalog;
use voxel_engine::engine_state::voxels::block::{BlockId, AIR, UNKNOWN_BLOCK};
use voxel_engine::engine_state::voxels::chunk::neighbors::NeighborDirection;
use voxel_engine::engine_state::voxels::chunk::{ChunkPosition, CHUNK_HEIGHT, CHUNK_WIDTH};
use voxel_engine::engine_state::voxels::world::{ChunkGenerator, World};
use voxel_engine::engine_state::VoxelContext;

const SEED: u32 = 11;

fn world(threaded: bool) -> World {
    let config = EngineConfig {
        threaded,
        ..EngineConfig::default()
    };
    let context = VoxelContext::new(BlockCatalog::builtin().unwrap(), config);
    World::new(Arc::new(context)).unwrap()
}

fn load_square(world: &mut World, radius: i32) {
    for x in -radius..=radius {
        for z in -radius..=radius {
            world.add_chunk_at(ChunkPosition::new(x, z), ChunkGenerator::Perlin { seed: SEED });
        }
    }
}

fn assert_links_symmetric(world: &World) {
    for chunk in world.chunks() {
        for direction in NeighborDirection::ALL {
            let Some(neighbor) = chunk.get().neighbor(direction) else {
                continue;
            };
            assert_eq!(neighbor.position(), direction.neighbor_of(chunk.position()));
            let back = neighbor.get().neighbor(direction.opposite()).unwrap();
            assert!(back.ptr_eq(chunk), "{:?} link of {} is one-sided", direction, chunk.position());
        }
    }
}

#[test]
fn neighbour_links_stay_symmetric() {
    let mut world = world(false);
    load_square(&mut world, 1);
    assert_eq!(world.chunk_count(), 9);
    assert_links_symmetric(&world);

    let center = world.chunk(ChunkPosition::new(0, 0)).unwrap().clone();
    for direction in NeighborDirection::ALL {
        assert!(center.get().neighbor(direction).is_some());
    }

    world.remove_chunk(ChunkPosition::new(0, 0));
    assert_links_symmetric(&world);
    for direction in NeighborDirection::ALL {
        assert!(center.get().neighbor(direction).is_none());
        let position = direction.neighbor_of(ChunkPosition::new(0, 0));
        let former = world.chunk(position).unwrap();
        assert!(former.get().neighbor(direction.opposite()).is_none());
    }

    world.add_chunk_at(ChunkPosition::new(0, 0), ChunkGenerator::Empty);
    assert_links_symmetric(&world);
    let replacement = world.chunk(ChunkPosition::new(0, 0)).unwrap();
    assert!(!replacement.ptr_eq(&center));
    for direction in NeighborDirection::ALL {
        assert!(replacement.get().neighbor(direction).is_some());
    }
}

#[test]
fn lookups_walk_across_several_chunks() {
    let mut world = world(false);
    load_square(&mut world, 1);
    let corner = world.chunk(ChunkPosition::new(-1, -1)).unwrap().clone();
    let far = world.chunk(ChunkPosition::new(1, 1)).unwrap().clone();
    far.get_mut().set_block(3, 100, 4, 7);

    let width = CHUNK_WIDTH as i32;
    assert_eq!(world.get_block_id(&corner, 2 * width + 3, 100, 2 * width + 4), 7);
    assert_eq!(world.block_at(width + 3, 100, width + 4), 7);
    assert_eq!(world.get_block_id(&corner, -1, 10, 0), UNKNOWN_BLOCK);
    assert_eq!(world.get_block_id(&corner, 3 * width, 10, 0), UNKNOWN_BLOCK);
    assert_eq!(world.get_block_id(&corner, 0, CHUNK_HEIGHT as i32 + 5, 0), AIR);
}

#[test]
fn place_destroy_round_trip_regenerates_identically() {
    let mut world = world(false);
    load_square(&mut world, 1);
    let chunk = world.chunk(ChunkPosition::new(0, 0)).unwrap().clone();
    let glowstone = world.context().catalog().id_by_name("glowstone").unwrap();

    let before = world.scheduler().regenerate_now(&chunk).unwrap();
    let light_before = chunk.get().lightmap().as_raw().to_vec();

    let y = CHUNK_HEIGHT as i32 - 2;
    assert!(world.place_block(&chunk, 5, y, 9, glowstone, true));
    assert_eq!(world.get_block_id(&chunk, 5, y, 9), glowstone);
    let lit = world.scheduler().regenerate_now(&chunk).unwrap();
    assert_ne!(lit.opaque.vertex_bytes(), before.opaque.vertex_bytes());

    assert_eq!(world.destroy_block(&chunk, 5, y, 9), Some(glowstone));
    assert_eq!(world.get_block_id(&chunk, 5, y, 9), AIR);

    let after = world.scheduler().regenerate_now(&chunk).unwrap();
    assert_eq!(after.opaque.vertex_bytes(), before.opaque.vertex_bytes());
    assert_eq!(after.opaque.index_bytes(), before.opaque.index_bytes());
    assert_eq!(after.liquid.vertex_bytes(), before.liquid.vertex_bytes());
    assert_eq!(chunk.get().lightmap().as_raw(), light_before.as_slice());

    let again = world.scheduler().regenerate_now(&chunk).unwrap();
    assert_eq!(again, after);
}

#[test]
fn edits_on_a_seam_reach_both_chunks() {
    let mut world = world(true);
    load_square(&mut world, 1);
    assert!(world.wait_for_idle(Duration::from_secs(30)));
    let mut meshes: HashMap<ChunkPosition, ChunkMesh> = HashMap::new();
    world.process_completed_tasks(&mut meshes);
    assert_eq!(meshes.len(), 9);

    let origin = world.chunk(ChunkPosition::new(0, 0)).unwrap().clone();
    let stone = world.context().catalog().id_by_name("stone").unwrap();
    assert!(world.place_block(&origin, CHUNK_WIDTH as i32 - 1, 120, 4, stone, true));
    assert!(world.wait_for_idle(Duration::from_secs(30)));

    let mut updated: Vec<ChunkMesh> = Vec::new();
    world.process_completed_tasks(&mut updated);
    let mut positions: Vec<_> = updated.iter().map(|mesh| mesh.position).collect();
    positions.sort_by_key(|position| (position.x, position.z));
    assert_eq!(
        positions,
        vec![
            ChunkPosition::new(0, 0),
            ChunkPosition::new(1, -1),
            ChunkPosition::new(1, 0),
            ChunkPosition::new(1, 1),
        ]
    );
}

#[test]
fn randomized_edits_match_a_simple_model() {
    let mut inline = world(false);
    let mut threaded = world(true);
    load_square(&mut inline, 1);
    load_square(&mut threaded, 1);

    let ids: Vec<BlockId> = inline.context().catalog().entries().map(|entry| entry.id).collect();
    let mut expected: HashMap<(i32, i32, i32), BlockId> = HashMap::new();
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    let span = 3 * CHUNK_WIDTH as i32;

    for _ in 0..300 {
        let world_x = rng.i32(0..span) - CHUNK_WIDTH as i32;
        let world_z = rng.i32(0..span) - CHUNK_WIDTH as i32;
        let y = rng.i32(0..CHUNK_HEIGHT as i32);
        if rng.bool() {
            let id = ids[rng.usize(0..ids.len())];
            assert!(inline.place_block_at(world_x, y, world_z, id));
            assert!(threaded.place_block_at(world_x, y, world_z, id));
            expected.insert((world_x, y, world_z), id);
        } else {
            let dropped = inline.destroy_block_at(world_x, y, world_z);
            assert_eq!(threaded.destroy_block_at(world_x, y, world_z), dropped);
            expected.insert((world_x, y, world_z), AIR);
        }
    }

    assert!(threaded.wait_for_idle(Duration::from_secs(60)));
    for (&(world_x, y, world_z), &id) in &expected {
        assert_eq!(inline.block_at(world_x, y, world_z), id);
        assert_eq!(threaded.block_at(world_x, y, world_z), id);
    }
    for chunk in threaded.chunks() {
        assert!(!threaded.is_queued(chunk));
        assert!(!chunk.get().is_light_stale());
    }
    assert_links_symmetric(&inline);
}
