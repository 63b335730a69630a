use std::sync::Arc;
use std::time::Duration;

use cavern_geom::{IVec3, Vec3};
use cavern_mesh_cpu::ChunkMesh;
use serde::Deserialize;

use crate::stagger::StaggerCounter;

/// Identity of the transform a set of chunks is parented to (one per
/// observer-driven cave system).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParentId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub parent: ParentId,
    pub coord: IVec3,
}

impl ChunkKey {
    pub const fn new(parent: ParentId, coord: IVec3) -> Self {
        Self { parent, coord }
    }
}

/// Index of a renderable handle in the pool's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub(crate) usize);

impl ChunkId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// When a shown chunk gets its collision mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColliderMode {
    Immediate,
    #[default]
    Delayed,
    /// Immediate the first time the handle is shown, delayed afterwards.
    DelayedOnReuse,
    None,
}

/// Renderable handle: shows a record's mesh under one parent.
#[derive(Debug)]
pub struct Chunk {
    key: ChunkKey,
    origin: Vec3,
    visible: bool,
    is_active: bool,
    mode: ColliderMode,
    mesh: Option<Arc<ChunkMesh>>,
    collider: Option<Arc<ChunkMesh>>,
    collider_due: Option<Duration>,
}

impl Chunk {
    pub(crate) fn new(mode: ColliderMode) -> Self {
        Self {
            key: ChunkKey::new(ParentId(0), IVec3::ZERO),
            origin: Vec3::ZERO,
            visible: false,
            is_active: false,
            mode,
            mesh: None,
            collider: None,
            collider_due: None,
        }
    }

    #[inline]
    pub fn key(&self) -> ChunkKey {
        self.key
    }

    /// Local position under the parent: the record's bounds minimum.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True once the chunk is shown and its collider is in place.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn mesh(&self) -> Option<&Arc<ChunkMesh>> {
        self.mesh.as_ref()
    }

    pub fn collider(&self) -> Option<&Arc<ChunkMesh>> {
        self.collider.as_ref()
    }

    pub fn collider_mode(&self) -> ColliderMode {
        self.mode
    }

    pub(crate) fn collider_pending(&self) -> bool {
        self.collider_due.is_some()
    }

    pub(crate) fn place(&mut self, key: ChunkKey, origin: Vec3) {
        self.is_active = false;
        self.key = key;
        self.origin = origin;
    }

    /// Shows (with `mesh`) or hides the chunk. Returns true when the collider
    /// was attached during this call.
    pub(crate) fn set_active(
        &mut self,
        active: bool,
        mesh: Option<Arc<ChunkMesh>>,
        now: Duration,
        delay: Duration,
        stagger: &mut StaggerCounter,
    ) -> bool {
        self.visible = active;
        self.mesh = mesh;
        if !active {
            self.collider = None;
            self.collider_due = None;
            self.is_active = false;
            return false;
        }
        match self.mode {
            ColliderMode::Immediate => {
                self.attach_collider();
                true
            }
            ColliderMode::Delayed => {
                self.collider_due = Some(now + delay * stagger.next());
                false
            }
            ColliderMode::DelayedOnReuse => {
                self.attach_collider();
                self.mode = ColliderMode::Delayed;
                true
            }
            ColliderMode::None => {
                self.is_active = true;
                false
            }
        }
    }

    /// Attaches a delayed collider whose time has come.
    pub(crate) fn poll_collider(&mut self, now: Duration) -> bool {
        match self.collider_due {
            Some(due) if due <= now => {
                self.collider_due = None;
                self.attach_collider();
                true
            }
            _ => false,
        }
    }

    fn attach_collider(&mut self) {
        self.collider = self.mesh.clone();
        self.is_active = true;
    }
}
