use std::sync::Arc;

use cavern_geom::Vec3;
use cavern_mesh_cpu::ChunkMesh;

use crate::chunk::ChunkKey;

/// Visibility changes queued by the pool for the host's renderer.
#[derive(Clone, Debug)]
pub enum ChunkEvent {
    Shown {
        key: ChunkKey,
        origin: Vec3,
        mesh: Arc<ChunkMesh>,
    },
    Hidden {
        key: ChunkKey,
    },
    ColliderAttached {
        key: ChunkKey,
    },
}

impl ChunkEvent {
    pub fn key(&self) -> ChunkKey {
        match self {
            ChunkEvent::Shown { key, .. }
            | ChunkEvent::Hidden { key }
            | ChunkEvent::ColliderAttached { key } => *key,
        }
    }
}

/// Consumer of produced geometry (rendering, physics).
pub trait RenderSink {
    fn show(&mut self, key: ChunkKey, origin: Vec3, mesh: &Arc<ChunkMesh>);
    fn hide(&mut self, key: ChunkKey);
    fn collider_attached(&mut self, _key: ChunkKey) {}
}

/// Routes one event to the matching sink method.
pub fn dispatch(sink: &mut dyn RenderSink, event: &ChunkEvent) {
    match event {
        ChunkEvent::Shown { key, origin, mesh } => sink.show(*key, *origin, mesh),
        ChunkEvent::Hidden { key } => sink.hide(*key),
        ChunkEvent::ColliderAttached { key } => sink.collider_attached(*key),
    }
}
