use std::sync::Arc;
use std::time::Duration;

use cavern::{CaveSettings, CaveSystem, FrustumSettings, Observer};
use cavern_field::FieldParams;
use cavern_geom::{IVec3, Vec3};
use cavern_mesh_cpu::{SurfaceAlgorithm, SurfaceSettings};
use cavern_runtime::{ChunkPool, ColliderMode, ParentId, PoolSettings};

const SIZE: i32 = 4;

fn pool(collider: ColliderMode) -> ChunkPool {
    let settings = PoolSettings {
        chunk_size: IVec3::splat(SIZE),
        field: FieldParams {
            scale: Vec3::ONE,
            offset: Vec3::ZERO,
        },
        surface: SurfaceSettings {
            algorithm: SurfaceAlgorithm::Cube,
            weld_vertices: true,
            threshold: 0.0,
        },
        finalize_meshes: false,
        workers: 8,
        threads: Some(2),
        collider,
        collider_delay: Duration::from_millis(50),
    };
    ChunkPool::new(settings, Arc::new(|p: Vec3| p.y - 0.3))
}

fn settings(extents: i32) -> CaveSettings {
    CaveSettings {
        extents: IVec3::splat(extents),
        update_distance: 3.0,
        update_angle_deg: 5.0,
        frustum: None,
    }
}

fn at(position: Vec3) -> Observer {
    Observer {
        position,
        forward: Vec3::FORWARD,
    }
}

#[test]
fn first_update_activates_the_neighbourhood() {
    let mut pool = pool(ColliderMode::None);
    let mut cave = CaveSystem::new(ParentId(0), IVec3::splat(SIZE), settings(1));
    assert!(cave.update(&mut pool, &at(Vec3::ZERO)));
    assert_eq!(cave.coords().count(), 27);
    assert_eq!(cave.chunk_count(), 27);
    assert!(cave.chunk_at(IVec3::new(-4, 4, 0)).is_some());
    assert!(cave.chunk_at(IVec3::new(8, 0, 0)).is_none());
    assert_eq!(pool.stats().indexed, 27);
}

#[test]
fn center_record_gets_highest_priority() {
    let mut pool = pool(ColliderMode::None);
    let mut cave = CaveSystem::new(ParentId(0), IVec3::splat(SIZE), settings(1));
    cave.update(&mut pool, &at(Vec3::new(0.4, 0.0, -0.4)));
    let center = pool.data_at(IVec3::ZERO).expect("center");
    assert_eq!(center.priority(), 0);
    let corner = pool.data_at(IVec3::splat(4)).expect("corner");
    assert_eq!(corner.priority(), -48);
}

#[test]
fn small_moves_do_not_update() {
    let mut pool = pool(ColliderMode::None);
    let mut cave = CaveSystem::new(ParentId(0), IVec3::splat(SIZE), settings(1));
    assert!(cave.update(&mut pool, &at(Vec3::ZERO)));
    assert!(!cave.update(&mut pool, &at(Vec3::new(2.0, 0.0, 1.0))));
    assert!(!cave.update(&mut pool, &at(Vec3::new(0.0, 3.0, 0.0))));
}

#[test]
fn moving_one_chunk_swaps_a_slab() {
    let mut pool = pool(ColliderMode::None);
    let mut cave = CaveSystem::new(ParentId(0), IVec3::splat(SIZE), settings(1));
    cave.update(&mut pool, &at(Vec3::ZERO));
    assert!(cave.update(&mut pool, &at(Vec3::new(4.0, 0.0, 0.0))));

    assert_eq!(cave.coords().count(), 27);
    assert!(cave.coords().all(|c| c.x >= 0 && c.x <= 8));
    assert!(cave.chunk_at(IVec3::new(-4, 0, 0)).is_none());
    assert!(cave.chunk_at(IVec3::new(8, 0, 0)).is_some());
    let stats = pool.stats();
    assert_eq!(stats.buffered, 9);
    assert_eq!(stats.indexed, 36);
    assert_eq!(pool.reclaim(), 9);
}

#[test]
fn position_rounds_to_the_chunk_grid() {
    let cave = CaveSystem::new(ParentId(0), IVec3::splat(SIZE), settings(1));
    assert_eq!(
        cave.grid_center(Vec3::new(5.9, -2.1, 1.9)),
        IVec3::new(4, -4, 0)
    );
    assert_eq!(cave.grid_center(Vec3::new(-6.1, 1.0, 10.0)), IVec3::new(-8, 0, 12));
}

#[test]
fn reset_deactivates_and_forces_next_update() {
    let mut pool = pool(ColliderMode::None);
    let mut cave = CaveSystem::new(ParentId(0), IVec3::splat(SIZE), settings(1));
    cave.update(&mut pool, &at(Vec3::ZERO));
    cave.reset(&mut pool);
    assert_eq!(cave.coords().count(), 0);
    assert_eq!(cave.chunk_count(), 0);
    assert_eq!(pool.stats().buffered, 27);
    assert!(cave.update(&mut pool, &at(Vec3::ZERO)));
    assert_eq!(cave.chunk_count(), 27);
}

#[test]
fn all_chunks_active_once_colliders_attach() {
    let mut pool = pool(ColliderMode::Immediate);
    let mut cave = CaveSystem::new(ParentId(0), IVec3::splat(SIZE), settings(1));
    assert!(!cave.all_chunks_active(&pool));
    cave.update(&mut pool, &at(Vec3::ZERO));
    assert!(!cave.all_chunks_active(&pool));

    let mut now = Duration::ZERO;
    for _ in 0..5000 {
        now += Duration::from_millis(16);
        pool.tick(now);
        if cave.all_chunks_active(&pool) {
            break;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    assert!(cave.all_chunks_active(&pool));

    // new activations invalidate the cached answer
    cave.update(&mut pool, &at(Vec3::new(8.0, 0.0, 0.0)));
    assert!(!cave.all_chunks_active(&pool));
}

#[test]
fn two_observers_share_records() {
    let mut pool = pool(ColliderMode::None);
    let mut a = CaveSystem::new(ParentId(1), IVec3::splat(SIZE), settings(1));
    let mut b = CaveSystem::new(ParentId(2), IVec3::splat(SIZE), settings(1));
    a.update(&mut pool, &at(Vec3::ZERO));
    b.update(&mut pool, &at(Vec3::new(4.0, 0.0, 0.0)));
    assert_eq!(pool.stats().indexed, 36);
    assert_eq!(pool.stats().chunks, 54);

    a.reset(&mut pool);
    // the shared 18 records are still held by b
    assert_eq!(pool.stats().buffered, 9);
}

fn frustum_settings() -> CaveSettings {
    CaveSettings {
        frustum: Some(FrustumSettings {
            fov_y_deg: 60.0,
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
        }),
        ..settings(2)
    }
}

#[test]
fn frustum_mode_culls_and_updates_on_turn() {
    let mut pool = pool(ColliderMode::None);
    let mut cave = CaveSystem::new(ParentId(0), IVec3::splat(SIZE), frustum_settings());
    assert!(cave.update(&mut pool, &at(Vec3::ZERO)));
    let seen = cave.coords().count();
    assert!(seen > 0 && seen < 125);
    assert!(cave.coords().all(|c| c.z >= -SIZE));

    let slight = Observer {
        position: Vec3::ZERO,
        forward: Vec3::new(0.02, 0.0, 1.0).normalized(),
    };
    assert!(!cave.update(&mut pool, &slight));

    let behind = Observer {
        position: Vec3::ZERO,
        forward: Vec3::new(0.0, 0.0, -1.0),
    };
    assert!(cave.update(&mut pool, &behind));
    assert!(cave.coords().all(|c| c.z <= SIZE));
    assert!(cave.chunk_at(IVec3::new(0, 0, 8)).is_none());
}

#[test]
fn turning_is_ignored_without_frustum() {
    let mut pool = pool(ColliderMode::None);
    let mut cave = CaveSystem::new(ParentId(0), IVec3::splat(SIZE), settings(1));
    cave.update(&mut pool, &at(Vec3::ZERO));
    let behind = Observer {
        position: Vec3::ZERO,
        forward: Vec3::new(0.0, 0.0, -1.0),
    };
    assert!(!cave.update(&mut pool, &behind));
}
