use cavern_geom::Vec3;
use hashbrown::HashMap;

/// Exact-equality key for a vertex position. Coincident points reached
/// through different edges can round differently and will not collide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WeldKey([u32; 3]);

impl From<Vec3> for WeldKey {
    #[inline]
    fn from(p: Vec3) -> Self {
        // `+ 0.0` folds -0.0 onto 0.0 so keys agree with float equality.
        WeldKey([(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()])
    }
}

/// Position-only triangle list produced by one extraction pass.
#[derive(Default, Clone, Debug)]
pub struct MeshBuffer {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    weld: HashMap<WeldKey, u32>,
}

impl MeshBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all arrays but retains capacity for reuse across passes.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.weld.clear();
    }

    /// Appends one triangle corner. With `weld` set, a previously emitted
    /// vertex at the identical position is referenced instead of duplicated.
    #[inline]
    pub fn push_corner(&mut self, p: Vec3, weld: bool) {
        if weld {
            let next = self.vertices.len() as u32;
            let idx = *self.weld.entry(WeldKey::from(p)).or_insert(next);
            if idx == next {
                self.vertices.push(p);
            }
            self.indices.push(idx);
        } else {
            self.indices.push(self.vertices.len() as u32);
            self.vertices.push(p);
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welding_reuses_identical_positions() {
        let mut buf = MeshBuffer::new();
        let a = Vec3::new(0.5, 0.0, 0.0);
        let b = Vec3::new(0.0, 0.5, 0.0);
        buf.push_corner(a, true);
        buf.push_corner(b, true);
        buf.push_corner(a, true);
        assert_eq!(buf.vertices, vec![a, b]);
        assert_eq!(buf.indices, vec![0, 1, 0]);
    }

    #[test]
    fn unwelded_corners_are_distinct() {
        let mut buf = MeshBuffer::new();
        let a = Vec3::new(0.5, 0.0, 0.0);
        buf.push_corner(a, false);
        buf.push_corner(a, false);
        assert_eq!(buf.vertex_count(), 2);
        assert_eq!(buf.indices, vec![0, 1]);
    }

    #[test]
    fn clear_resets_weld_map() {
        let mut buf = MeshBuffer::new();
        let a = Vec3::new(1.0, 2.0, 3.0);
        buf.push_corner(a, true);
        let cap = buf.vertices.capacity();
        buf.clear_keep_capacity();
        assert!(buf.is_empty());
        assert_eq!(buf.vertices.capacity(), cap);
        buf.push_corner(a, true);
        assert_eq!(buf.indices, vec![0]);
    }

    #[test]
    fn signed_zeros_share_a_key() {
        assert_eq!(
            WeldKey::from(Vec3::new(0.0, 0.0, 0.0)),
            WeldKey::from(Vec3::new(-0.0, 0.0, 0.0))
        );
    }
}
