use std::sync::Arc;

use cavern_geom::{Aabb, Frustum, IVec3};
use hashbrown::HashMap;

/// Chunk-aligned boxes around a center, memoized per coordinate.
pub struct BoundsCollection {
    size: IVec3,
    scaled_extents: IVec3,
    cache: HashMap<IVec3, Arc<Aabb>>,
}

impl BoundsCollection {
    pub fn new(chunk_size: IVec3, extents: IVec3) -> Self {
        assert!(
            chunk_size.x > 0 && chunk_size.y > 0 && chunk_size.z > 0,
            "chunk size must be positive, got {chunk_size:?}"
        );
        assert!(
            extents.x >= 0 && extents.y >= 0 && extents.z >= 0,
            "extents must be non-negative, got {extents:?}"
        );
        Self {
            size: chunk_size,
            scaled_extents: chunk_size.scale(extents),
            cache: HashMap::new(),
        }
    }

    #[inline]
    pub fn chunk_size(&self) -> IVec3 {
        self.size
    }

    /// Number of boxes built so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Lazily yields one box per cell in `center ± size * extents`, x-major.
    /// Restart by calling again.
    pub fn iter(&mut self, center: IVec3) -> BoundsIter<'_> {
        let min = center - self.scaled_extents;
        let max = center + self.scaled_extents;
        BoundsIter {
            size: self.size,
            cache: &mut self.cache,
            min,
            max,
            cursor: Some(min),
        }
    }

    /// Like [`BoundsCollection::iter`], skipping boxes outside `frustum`.
    /// Skipped boxes are still cached.
    pub fn visible<'a>(
        &'a mut self,
        center: IVec3,
        frustum: Option<&'a Frustum>,
    ) -> impl Iterator<Item = Arc<Aabb>> + 'a {
        self.iter(center)
            .filter(move |b| frustum.is_none_or(|f| f.contains_aabb(b)))
    }
}

pub struct BoundsIter<'a> {
    size: IVec3,
    cache: &'a mut HashMap<IVec3, Arc<Aabb>>,
    min: IVec3,
    max: IVec3,
    cursor: Option<IVec3>,
}

impl Iterator for BoundsIter<'_> {
    type Item = Arc<Aabb>;

    fn next(&mut self) -> Option<Arc<Aabb>> {
        let pos = self.cursor?;
        // z innermost, then y, then x
        let mut next = pos;
        next.z += self.size.z;
        if next.z > self.max.z {
            next.z = self.min.z;
            next.y += self.size.y;
            if next.y > self.max.y {
                next.y = self.min.y;
                next.x += self.size.x;
            }
        }
        self.cursor = (next.x <= self.max.x).then_some(next);

        let size = self.size;
        let bounds = self
            .cache
            .entry(pos)
            .or_insert_with(|| Arc::new(Aabb::from_center_size(pos.as_vec3(), size.as_vec3())));
        Some(Arc::clone(bounds))
    }
}
