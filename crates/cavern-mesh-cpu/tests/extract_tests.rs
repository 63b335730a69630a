use cavern_field::Volume;
use cavern_geom::{IVec3, Vec3};
use cavern_mesh_cpu::{
    ChunkMesh, MeshBuffer, MeshLookup, SurfaceAlgorithm, SurfaceSettings, build_chunk_mesh,
    extract_surface,
};

fn settings(algorithm: SurfaceAlgorithm, weld: bool) -> SurfaceSettings {
    SurfaceSettings {
        algorithm,
        weld_vertices: weld,
        threshold: 0.0,
    }
}

fn run(volume: &Volume, algorithm: SurfaceAlgorithm, weld: bool) -> MeshBuffer {
    let lookup = MeshLookup::new(algorithm);
    let mut buf = MeshBuffer::new();
    extract_surface(volume, &lookup, &settings(algorithm, weld), &mut buf);
    buf
}

fn sorted(v: Vec<Vec3>) -> Vec<(f32, f32, f32)> {
    let mut out: Vec<_> = v.into_iter().map(|p| (p.x, p.y, p.z)).collect();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap());
    out
}

#[test]
fn single_inside_corner_yields_one_triangle() {
    let mut vol = Volume::new(IVec3::splat(2));
    vol.fill_with(|x, y, z| if (x, y, z) == (0, 0, 0) { -1.0 } else { 1.0 });
    let buf = run(&vol, SurfaceAlgorithm::Cube, false);
    assert_eq!(buf.vertices.len(), 3);
    assert_eq!(buf.indices, vec![0, 1, 2]);
    assert_eq!(
        sorted(buf.vertices),
        vec![(0.0, 0.0, 0.5), (0.0, 0.5, 0.0), (0.5, 0.0, 0.0)]
    );
}

#[test]
fn uniform_volumes_produce_no_geometry() {
    for value in [1.0f32, -1.0] {
        let mut vol = Volume::new(IVec3::new(4, 3, 5));
        vol.fill_with(|_, _, _| value);
        for algorithm in [SurfaceAlgorithm::Cube, SurfaceAlgorithm::Tetrahedron] {
            for weld in [false, true] {
                let buf = run(&vol, algorithm, weld);
                assert!(buf.vertices.is_empty(), "{algorithm:?} value {value}");
                assert!(buf.indices.is_empty());
            }
        }
    }
}

#[test]
fn planar_field_vertices_lie_on_plane() {
    let mut vol = Volume::new(IVec3::splat(3));
    vol.fill_with(|_, y, _| y as f32 - 1.5);
    for algorithm in [SurfaceAlgorithm::Cube, SurfaceAlgorithm::Tetrahedron] {
        let buf = run(&vol, algorithm, false);
        assert!(!buf.is_empty(), "{algorithm:?}");
        assert_eq!(buf.indices.len() % 3, 0);
        for p in &buf.vertices {
            assert_eq!(p.y, 1.5, "{algorithm:?} vertex {p:?}");
            assert!((0.0..=3.0).contains(&p.x) && (0.0..=3.0).contains(&p.z));
        }
    }
}

#[test]
fn planar_field_cube_covers_each_column_with_two_triangles() {
    let mut vol = Volume::new(IVec3::splat(3));
    vol.fill_with(|_, y, _| y as f32 - 1.5);
    let buf = run(&vol, SurfaceAlgorithm::Cube, true);
    // one crossing cell per (x, z) column, two triangles each
    assert_eq!(buf.triangle_count(), 3 * 3 * 2);
    // welded grid of 4x4 shared corners
    assert_eq!(buf.vertex_count(), 16);
}

#[test]
fn tetrahedra_emit_more_triangles_than_cubes() {
    let mut vol = Volume::new(IVec3::splat(3));
    vol.fill_with(|x, y, z| {
        let p = Vec3::new(x as f32, y as f32, z as f32) - Vec3::splat(1.5);
        p.length() - 1.2
    });
    let cube = run(&vol, SurfaceAlgorithm::Cube, false);
    let tetra = run(&vol, SurfaceAlgorithm::Tetrahedron, false);
    assert!(cube.triangle_count() > 0);
    assert!(tetra.triangle_count() > cube.triangle_count());
}

#[test]
fn threshold_shifts_the_surface() {
    let mut vol = Volume::new(IVec3::splat(2));
    vol.fill_with(|_, y, _| y as f32);
    let lookup = MeshLookup::new(SurfaceAlgorithm::Cube);
    let mut buf = MeshBuffer::new();
    let s = SurfaceSettings {
        algorithm: SurfaceAlgorithm::Cube,
        weld_vertices: true,
        threshold: 0.25,
    };
    extract_surface(&vol, &lookup, &s, &mut buf);
    assert!(!buf.is_empty());
    assert!(buf.vertices.iter().all(|p| p.y == 0.25));
}

#[test]
fn extraction_reuses_and_clears_buffer() {
    let mut vol = Volume::new(IVec3::splat(2));
    vol.fill_with(|x, y, z| if (x, y, z) == (0, 0, 0) { -1.0 } else { 1.0 });
    let lookup = MeshLookup::new(SurfaceAlgorithm::Cube);
    let s = settings(SurfaceAlgorithm::Cube, true);
    let mut buf = MeshBuffer::new();
    extract_surface(&vol, &lookup, &s, &mut buf);
    extract_surface(&vol, &lookup, &s, &mut buf);
    assert_eq!(buf.triangle_count(), 1);
    assert_eq!(buf.vertex_count(), 3);
}

#[test]
fn finalized_mesh_has_unit_normals_and_tight_bounds() {
    let mut vol = Volume::new(IVec3::splat(3));
    vol.fill_with(|_, y, _| y as f32 - 1.5);
    let lookup = MeshLookup::new(SurfaceAlgorithm::Cube);
    let mesh = build_chunk_mesh(&vol, &lookup, &settings(SurfaceAlgorithm::Cube, true));
    assert_eq!(mesh.normals.len(), mesh.positions.len());
    for n in &mesh.normals {
        assert!((n.length() - 1.0).abs() < 1e-5);
        // flat surface: every normal is vertical
        assert!(n.x.abs() < 1e-5 && n.z.abs() < 1e-5);
    }
    assert_eq!(mesh.bounds.min, Vec3::new(0.0, 1.5, 0.0));
    assert_eq!(mesh.bounds.max, Vec3::new(3.0, 1.5, 3.0));
}

#[test]
fn empty_mesh_finalizes_to_origin_bounds() {
    let buf = MeshBuffer::new();
    let mesh = ChunkMesh::from_buffer(&buf);
    assert!(mesh.is_empty());
    assert_eq!(mesh.bounds.min, Vec3::ZERO);
    assert_eq!(mesh.bounds.max, Vec3::ZERO);
}

#[test]
fn lookup_reports_its_algorithm() {
    assert_eq!(MeshLookup::new(SurfaceAlgorithm::Cube).case_count(), 256);
    assert_eq!(MeshLookup::new(SurfaceAlgorithm::Tetrahedron).case_count(), 16);
    assert_eq!(
        MeshLookup::new(SurfaceAlgorithm::Tetrahedron).algorithm(),
        SurfaceAlgorithm::Tetrahedron
    );
}
