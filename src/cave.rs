use cavern_geom::{Frustum, IVec3, Vec3};
use cavern_runtime::{BoundsCollection, ChunkId, ChunkPool, ParentId};
use hashbrown::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrustumSettings {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaveSettings {
    pub extents: IVec3,
    pub update_distance: f32,
    pub update_angle_deg: f32,
    /// Cull enumerated boxes against the observer's view when set.
    pub frustum: Option<FrustumSettings>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observer {
    pub position: Vec3,
    pub forward: Vec3,
}

/// Keeps the chunks around one observer activated in a shared pool.
pub struct CaveSystem {
    parent: ParentId,
    settings: CaveSettings,
    chunk_size: IVec3,
    bounds: BoundsCollection,
    coords: HashSet<IVec3>,
    chunks: HashMap<IVec3, ChunkId>,
    prev_pos: Option<Vec3>,
    prev_fwd: Option<Vec3>,
    frustum: Option<Frustum>,
    all_active: bool,
}

impl CaveSystem {
    pub fn new(parent: ParentId, chunk_size: IVec3, settings: CaveSettings) -> Self {
        Self {
            parent,
            settings,
            chunk_size,
            bounds: BoundsCollection::new(chunk_size, settings.extents),
            coords: HashSet::new(),
            chunks: HashMap::new(),
            prev_pos: None,
            prev_fwd: None,
            frustum: None,
            all_active: false,
        }
    }

    #[inline]
    pub fn parent(&self) -> ParentId {
        self.parent
    }

    #[inline]
    pub fn settings(&self) -> &CaveSettings {
        &self.settings
    }

    /// Coordinates enumerated by the last update.
    pub fn coords(&self) -> impl Iterator<Item = IVec3> + '_ {
        self.coords.iter().copied()
    }

    pub fn chunk_at(&self, coord: IVec3) -> Option<ChunkId> {
        self.chunks.get(&coord).copied()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Grid point nearest to `pos`.
    pub fn grid_center(&self, pos: Vec3) -> IVec3 {
        let s = self.chunk_size;
        let inv = Vec3::new(1.0 / s.x as f32, 1.0 / s.y as f32, 1.0 / s.z as f32);
        pos.scale(inv).round_to_int().scale(s)
    }

    fn must_update(&mut self, observer: &Observer) -> bool {
        let moved = self.prev_pos.is_none_or(|prev| {
            (observer.position - prev).length_sq()
                > self.settings.update_distance * self.settings.update_distance
        });
        let turned = self.settings.frustum.is_some()
            && self.prev_fwd.is_none_or(|prev| {
                observer.forward.angle_deg(prev) > self.settings.update_angle_deg
            });
        if !(moved || turned) {
            return false;
        }
        self.prev_pos = Some(observer.position);
        if let Some(f) = self.settings.frustum {
            self.prev_fwd = Some(observer.forward);
            self.frustum = Some(Frustum::perspective(
                observer.position,
                observer.forward,
                Vec3::UP,
                f.fov_y_deg,
                f.aspect,
                f.near,
                f.far,
            ));
        }
        true
    }

    /// Re-enumerates around the observer when it moved or turned far enough.
    /// Returns whether an update ran.
    pub fn update(&mut self, pool: &mut ChunkPool, observer: &Observer) -> bool {
        if !self.must_update(observer) {
            return false;
        }
        let center = self.grid_center(observer.position);
        let previous = std::mem::take(&mut self.coords);
        let mut entered = 0usize;
        for b in self.bounds.visible(center, self.frustum.as_ref()) {
            let v = b.center().round_to_int();
            if !self.coords.insert(v) || previous.contains(&v) {
                continue;
            }
            let priority = -(v - center).length_sq();
            let id = pool.activate(v, self.parent, priority);
            self.chunks.insert(v, id);
            self.all_active = false;
            entered += 1;
        }

        let mut left = 0usize;
        for v in previous.difference(&self.coords) {
            pool.deactivate(*v, self.parent);
            self.chunks.remove(v);
            left += 1;
        }
        log::debug!(
            target: "cave",
            "observer {:?} at {:?}: {} entered, {} left, {} tracked",
            self.parent,
            center,
            entered,
            left,
            self.coords.len()
        );
        true
    }

    /// Drops every activation; the next update re-enumerates from scratch.
    pub fn reset(&mut self, pool: &mut ChunkPool) {
        for v in self.coords.drain() {
            pool.deactivate(v, self.parent);
        }
        self.chunks.clear();
        self.prev_pos = None;
        self.prev_fwd = None;
        self.frustum = None;
        self.all_active = false;
        log::debug!(target: "cave", "observer {:?} reset", self.parent);
    }

    /// True once every activated handle has its collider. Always false with
    /// nothing activated.
    pub fn all_chunks_active(&mut self, pool: &ChunkPool) -> bool {
        if self.all_active {
            return true;
        }
        if self.chunks.is_empty() {
            return false;
        }
        self.all_active = self.chunks.values().all(|&id| pool.chunk(id).is_active());
        self.all_active
    }
}
