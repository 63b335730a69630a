use cavern_field::Volume;
use cavern_geom::Vec3;

use crate::lookup::{CubeLookup, MeshLookup, SurfaceAlgorithm, TetraLookup};
use crate::mesh_build::MeshBuffer;

/// Per-pool extraction policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSettings {
    pub algorithm: SurfaceAlgorithm,
    pub weld_vertices: bool,
    /// Corners at or below this value count as inside.
    pub threshold: f32,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            algorithm: SurfaceAlgorithm::Tetrahedron,
            weld_vertices: true,
            threshold: 0.0,
        }
    }
}

/// Crossing fraction along an edge from `v0` to `v1`. A flat edge yields the
/// threshold itself rather than NaN.
#[inline]
pub fn crossing_offset(v0: f32, v1: f32, threshold: f32) -> f32 {
    let delta = v1 - v0;
    if delta == 0.0 {
        threshold
    } else {
        (threshold - v0) / delta
    }
}

/// Clears `out` and extracts the isosurface of `volume` into it, using the
/// kernel matching `lookup`. Positions are in volume-local units.
pub fn extract_surface(
    volume: &Volume,
    lookup: &MeshLookup,
    settings: &SurfaceSettings,
    out: &mut MeshBuffer,
) {
    out.clear_keep_capacity();
    match lookup {
        MeshLookup::Cube(tables) => march_cubes(volume, tables, settings, out),
        MeshLookup::Tetrahedron(tables) => march_tetrahedra(volume, tables, settings, out),
    }
    log::trace!(
        target: "jobs",
        "extracted {} tris ({} verts) at {:?}",
        out.triangle_count(),
        out.vertex_count(),
        volume.position()
    );
}

#[inline]
fn cell_corners(volume: &Volume, offsets: &[[i32; 3]; 8], x: usize, y: usize, z: usize) -> [f32; 8] {
    let mut corners = [0.0f32; 8];
    for (i, o) in offsets.iter().enumerate() {
        corners[i] = volume.get(x + o[0] as usize, y + o[1] as usize, z + o[2] as usize);
    }
    corners
}

fn march_cubes(volume: &Volume, t: &CubeLookup, settings: &SurfaceSettings, out: &mut MeshBuffer) {
    let size = volume.size();
    let (sx, sy, sz) = (size.x as usize, size.y as usize, size.z as usize);
    let threshold = settings.threshold;
    let mut edge_verts = [Vec3::ZERO; 12];

    for x in 0..sx {
        for y in 0..sy {
            for z in 0..sz {
                let corners = cell_corners(volume, t.corner_offsets, x, y, z);
                let mut case = 0usize;
                for (i, &v) in corners.iter().enumerate() {
                    if v <= threshold {
                        case |= 1 << i;
                    }
                }
                let flags = t.edge_flags[case];
                if flags == 0 {
                    continue;
                }

                for e in 0..12 {
                    if flags & (1 << e) == 0 {
                        continue;
                    }
                    let [a, b] = t.edge_corners[e];
                    let offset = crossing_offset(corners[a], corners[b], threshold);
                    let o = t.corner_offsets[a];
                    let d = t.edge_directions[e];
                    edge_verts[e] = Vec3::new(
                        x as f32 + (o[0] as f32 + offset * d[0]),
                        y as f32 + (o[1] as f32 + offset * d[1]),
                        z as f32 + (o[2] as f32 + offset * d[2]),
                    );
                }

                for &slot in t.triangles[case].iter().take_while(|&&s| s >= 0) {
                    out.push_corner(edge_verts[slot as usize], settings.weld_vertices);
                }
            }
        }
    }
}

fn march_tetrahedra(
    volume: &Volume,
    t: &TetraLookup,
    settings: &SurfaceSettings,
    out: &mut MeshBuffer,
) {
    let size = volume.size();
    let (sx, sy, sz) = (size.x as usize, size.y as usize, size.z as usize);
    let threshold = settings.threshold;
    let mut cube_pos = [Vec3::ZERO; 8];
    let mut edge_verts = [Vec3::ZERO; 6];

    for x in 0..sx {
        for y in 0..sy {
            for z in 0..sz {
                let corners = cell_corners(volume, t.corner_offsets, x, y, z);
                for (i, o) in t.corner_offsets.iter().enumerate() {
                    cube_pos[i] = Vec3::new(
                        (x as i32 + o[0]) as f32,
                        (y as i32 + o[1]) as f32,
                        (z as i32 + o[2]) as f32,
                    );
                }

                for &tetra in t.cube_corners.iter() {
                    let values = tetra.map(|c| corners[c]);
                    let mut case = 0usize;
                    for (i, &v) in values.iter().enumerate() {
                        if v <= threshold {
                            case |= 1 << i;
                        }
                    }
                    let flags = t.edge_flags[case];
                    if flags == 0 {
                        continue;
                    }

                    for e in 0..6 {
                        if flags & (1 << e) == 0 {
                            continue;
                        }
                        let [a, b] = t.edge_corners[e];
                        let offset = crossing_offset(values[a], values[b], threshold);
                        let p0 = cube_pos[tetra[a]];
                        let p1 = cube_pos[tetra[b]];
                        edge_verts[e] = p0 * (1.0 - offset) + p1 * offset;
                    }

                    for &slot in t.triangles[case].iter().take_while(|&&s| s >= 0) {
                        out.push_corner(edge_verts[slot as usize], settings.weld_vertices);
                    }
                }
            }
        }
    }
}
