use voxel_engine::engine_state::lighting::{is_sky_ring, LightPropagator, LIGHTMAP_WIDTH};
use voxel_engine::engine_state::voxels::block::catalog::BlockCatalog;
use voxel_engine::engine_state::voxels::block::{BlockId, AIR};
use voxel_engine::engine_state::voxels::chunk::neighbors::{link, NeighborDirection};
use voxel_engine::engine_state::voxels::chunk::{
    Chunk, ChunkHandle, ChunkPosition, CHUNK_HEIGHT, CHUNK_WIDTH,
};

fn catalog() -> BlockCatalog {
    BlockCatalog::builtin().unwrap()
}

fn id(catalog: &BlockCatalog, name: &str) -> BlockId {
    catalog.id_by_name(name).unwrap()
}

#[test]
fn red_emitter_in_open_air() {
    let catalog = catalog();
    let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
    chunk.set_block(8, 64, 8, id(&catalog, "red_lamp"));
    LightPropagator::new(&catalog).generate_light(&mut chunk);

    let red = |x: i32, y: i32, z: i32| chunk.lightmap().get_local(x, y, z).unwrap().red();
    assert_eq!(red(9, 64, 8), 14);
    assert_eq!(red(10, 64, 8), 13);
    assert_eq!(red(0, 64, 0), 0);
    assert_eq!(red(16, 64, 16), 0);
    assert_eq!(chunk.lightmap().get_local(9, 64, 8).unwrap().green(), 0);
}

#[test]
fn block_light_never_exceeds_distance_decay() {
    let catalog = catalog();
    let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
    chunk.set_block(8, 64, 8, id(&catalog, "red_lamp"));
    chunk.set_block(9, 65, 8, id(&catalog, "stone"));
    chunk.set_block(7, 64, 9, id(&catalog, "glass"));
    LightPropagator::new(&catalog).generate_light(&mut chunk);

    for y in 48..80i32 {
        for z in 0..CHUNK_WIDTH as i32 {
            for x in 0..CHUNK_WIDTH as i32 {
                let distance = (x - 8).abs() + (y - 64).abs() + (z - 8).abs();
                let bound = 15i32.saturating_sub(distance).max(0);
                let red = chunk.lightmap().get_local(x, y, z).unwrap().red() as i32;
                assert!(
                    red <= bound,
                    "red {} at ({}, {}, {}) exceeds {}",
                    red,
                    x,
                    y,
                    z,
                    bound
                );
            }
        }
    }

    // Straight along +Z from the emitter nothing is in the way.
    for step in 1..8 {
        let red = chunk.lightmap().get_local(8, 64, 8 + step).unwrap().red();
        assert_eq!(red as i32, 15 - step);
    }
}

#[test]
fn outer_ring_is_saturated_even_under_terrain() {
    let catalog = catalog();
    let stone = id(&catalog, "stone");
    let mut handles = Vec::new();
    for x in -1..=1 {
        for z in -1..=1 {
            let chunk = Chunk::flat(ChunkPosition::new(x, z), &[stone; 100]);
            handles.push(ChunkHandle::new(chunk));
        }
    }
    let at = |x: i32, z: i32| {
        handles
            .iter()
            .find(|handle| handle.position() == ChunkPosition::new(x, z))
            .unwrap()
            .clone()
    };
    for x in -1..=1 {
        for z in -1..=1 {
            if x < 1 {
                link(&at(x, z), NeighborDirection::Right, &at(x + 1, z));
            }
            if z < 1 {
                link(&at(x, z), NeighborDirection::Front, &at(x, z + 1));
            }
        }
    }

    let center = at(0, 0);
    LightPropagator::new(&catalog).generate_light(&mut center.get_mut());
    let center = center.get();
    let lightmap = center.lightmap();

    for y in 0..CHUNK_HEIGHT {
        for fz in 0..LIGHTMAP_WIDTH {
            for fx in 0..LIGHTMAP_WIDTH {
                if is_sky_ring(fx, fz) {
                    assert_eq!(lightmap.get(fx, y, fz).sun(), 15);
                }
            }
        }
    }
    // Inside solid terrain, away from the ring, it is dark.
    assert_eq!(lightmap.get_local(8, 50, 8).unwrap().sun(), 0);
    assert_eq!(lightmap.get_local(8, 100, 8).unwrap().sun(), 15);
}

#[test]
fn emitter_light_crosses_chunk_seams() {
    let catalog = catalog();
    let left = ChunkHandle::new(Chunk::new(ChunkPosition::new(0, 0)));
    let right = ChunkHandle::new(Chunk::new(ChunkPosition::new(1, 0)));
    assert!(link(&left, NeighborDirection::Right, &right));
    left.get_mut().set_block(15, 64, 8, id(&catalog, "red_lamp"));

    LightPropagator::new(&catalog).generate_light(&mut right.get_mut());
    let right = right.get();
    assert_eq!(right.lightmap().get_local(-1, 64, 8).unwrap().red(), 15);
    assert_eq!(right.lightmap().get_local(0, 64, 8).unwrap().red(), 14);
    assert_eq!(right.lightmap().get_local(3, 64, 8).unwrap().red(), 11);
}

#[test]
fn missing_neighbours_block_light() {
    let catalog = catalog();
    let mut chunk = Chunk::new(ChunkPosition::new(0, 0));
    chunk.set_block(0, 64, 8, id(&catalog, "red_lamp"));
    LightPropagator::new(&catalog).generate_light(&mut chunk);

    assert_eq!(chunk.lightmap().get_local(1, 64, 8).unwrap().red(), 14);
    assert_eq!(chunk.lightmap().get_local(-1, 64, 8).unwrap().red(), 0);
    assert_eq!(chunk.local_block_id(-1, 64, 8), None);
    assert_eq!(chunk.block_id(1, 64, 8), AIR);
}

#[test]
fn sun_stays_out_of_caves_behind_unloaded_chunks() {
    let catalog = catalog();
    let stone = id(&catalog, "stone");
    let center = ChunkHandle::new(Chunk::flat(ChunkPosition::new(0, 0), &[stone; 64]));
    center.get_mut().set_block(0, 30, 8, AIR);

    LightPropagator::new(&catalog).generate_light(&mut center.get_mut());
    assert_eq!(center.get().lightmap().get_local(0, 30, 8).unwrap().sun(), 0);

    // Once an open chunk is linked across that seam, its sky reaches the pocket.
    let open = ChunkHandle::new(Chunk::new(ChunkPosition::new(-1, 0)));
    assert!(link(&center, NeighborDirection::Left, &open));
    LightPropagator::new(&catalog).generate_light(&mut center.get_mut());
    assert_eq!(center.get().lightmap().get_local(-1, 30, 8).unwrap().sun(), 15);
    assert_eq!(center.get().lightmap().get_local(0, 30, 8).unwrap().sun(), 14);
}
