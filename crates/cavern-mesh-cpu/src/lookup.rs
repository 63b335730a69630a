use serde::Deserialize;

use crate::tables::{
    CUBE_CORNER_OFFSETS, CUBE_EDGE_CORNERS, CUBE_EDGE_DIRECTIONS, CUBE_EDGE_FLAGS, CUBE_TRIANGLES,
    TETRA_CUBE_CORNERS, TETRA_EDGE_CORNERS, TETRA_EDGE_FLAGS, TETRA_TRIANGLES,
};

/// Isosurface extraction algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceAlgorithm {
    Cube,
    #[default]
    Tetrahedron,
}

impl SurfaceAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            SurfaceAlgorithm::Cube => "cube",
            SurfaceAlgorithm::Tetrahedron => "tetrahedron",
        }
    }
}

/// Marching-cubes tables: 256 cases over 12 edges.
#[derive(Debug)]
pub struct CubeLookup {
    pub corner_offsets: &'static [[i32; 3]; 8],
    pub edge_corners: &'static [[usize; 2]; 12],
    pub edge_directions: &'static [[f32; 3]; 12],
    pub edge_flags: &'static [u16; 256],
    pub triangles: &'static [[i8; 16]; 256],
}

/// Marching-tetrahedra tables: 6 tetrahedra per cell, 16 cases over 6 edges.
#[derive(Debug)]
pub struct TetraLookup {
    pub corner_offsets: &'static [[i32; 3]; 8],
    pub cube_corners: &'static [[usize; 4]; 6],
    pub edge_corners: &'static [[usize; 2]; 6],
    pub edge_flags: &'static [u8; 16],
    pub triangles: &'static [[i8; 7]; 16],
}

/// Read-only topology tables for one algorithm. Built once by the pool and
/// shared by every extraction pass.
#[derive(Debug)]
pub enum MeshLookup {
    Cube(CubeLookup),
    Tetrahedron(TetraLookup),
}

impl MeshLookup {
    pub fn new(algorithm: SurfaceAlgorithm) -> Self {
        match algorithm {
            SurfaceAlgorithm::Cube => MeshLookup::Cube(CubeLookup {
                corner_offsets: &CUBE_CORNER_OFFSETS,
                edge_corners: &CUBE_EDGE_CORNERS,
                edge_directions: &CUBE_EDGE_DIRECTIONS,
                edge_flags: &CUBE_EDGE_FLAGS,
                triangles: &CUBE_TRIANGLES,
            }),
            SurfaceAlgorithm::Tetrahedron => MeshLookup::Tetrahedron(TetraLookup {
                corner_offsets: &CUBE_CORNER_OFFSETS,
                cube_corners: &TETRA_CUBE_CORNERS,
                edge_corners: &TETRA_EDGE_CORNERS,
                edge_flags: &TETRA_EDGE_FLAGS,
                triangles: &TETRA_TRIANGLES,
            }),
        }
    }

    pub fn algorithm(&self) -> SurfaceAlgorithm {
        match self {
            MeshLookup::Cube(_) => SurfaceAlgorithm::Cube,
            MeshLookup::Tetrahedron(_) => SurfaceAlgorithm::Tetrahedron,
        }
    }

    /// Number of distinct case indices.
    pub fn case_count(&self) -> usize {
        match self {
            MeshLookup::Cube(t) => t.edge_flags.len(),
            MeshLookup::Tetrahedron(t) => t.edge_flags.len(),
        }
    }
}
