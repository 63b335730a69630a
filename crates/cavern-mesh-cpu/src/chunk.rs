use cavern_geom::{Aabb, Vec3};

use crate::mesh_build::MeshBuffer;

/// Finalized, immutable mesh handed to renderable handles.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub normals: Vec<Vec3>,
    /// Local-space bounds of `positions`.
    pub bounds: Aabb,
}

impl ChunkMesh {
    /// Copies the buffer and derives bounds and per-vertex normals.
    pub fn from_buffer(buf: &MeshBuffer) -> Self {
        let positions = buf.vertices.clone();
        let indices = buf.indices.clone();
        let normals = vertex_normals(&positions, &indices);
        let bounds = Aabb::from_points(positions.iter().copied()).unwrap_or_default();
        Self {
            positions,
            indices,
            normals,
            bounds,
        }
    }

    /// Copies positions and indices only, leaving normals empty and bounds at
    /// the origin.
    pub fn raw(buf: &MeshBuffer) -> Self {
        Self {
            positions: buf.vertices.clone(),
            indices: buf.indices.clone(),
            normals: Vec::new(),
            bounds: Aabb::default(),
        }
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Area-weighted average of adjacent face normals, following triangle winding.
pub fn vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    for n in &mut acc {
        *n = n.normalized();
    }
    acc
}
