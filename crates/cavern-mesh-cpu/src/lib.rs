//! CPU isosurface extraction: case tables, welded mesh buffers and the
//! marching cubes / marching tetrahedra kernels.
#![forbid(unsafe_code)]

mod chunk;
mod extract;
mod lookup;
mod mesh_build;
mod tables;

pub use chunk::{ChunkMesh, vertex_normals};
pub use extract::{SurfaceSettings, crossing_offset, extract_surface};
pub use lookup::{CubeLookup, MeshLookup, SurfaceAlgorithm, TetraLookup};
pub use mesh_build::{MeshBuffer, WeldKey};

use cavern_field::Volume;

/// Extracts `volume` into a fresh buffer and finalizes it.
pub fn build_chunk_mesh(
    volume: &Volume,
    lookup: &MeshLookup,
    settings: &SurfaceSettings,
) -> ChunkMesh {
    let mut buf = MeshBuffer::new();
    extract_surface(volume, lookup, settings, &mut buf);
    ChunkMesh::from_buffer(&buf)
}
