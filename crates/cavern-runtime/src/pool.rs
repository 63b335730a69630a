use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use cavern_field::{FieldParams, ScalarField};
use cavern_geom::IVec3;
use cavern_mesh_cpu::{ChunkMesh, MeshLookup, SurfaceSettings};
use hashbrown::HashMap;

use crate::chunk::{Chunk, ChunkId, ChunkKey, ColliderMode, ParentId};
use crate::data::{Advance, ChunkData, DataId};
use crate::events::{ChunkEvent, RenderSink, dispatch};
use crate::job::{WorkerBudget, Workers};
use crate::pipeline::{FieldGenerator, Pipeline, SurfaceExtractor};
use crate::stagger::StaggerCounter;

#[derive(Clone, Debug)]
pub struct PoolSettings {
    /// Cells per chunk on each axis.
    pub chunk_size: IVec3,
    pub field: FieldParams,
    pub surface: SurfaceSettings,
    /// Recompute normals and bounds for every produced mesh.
    pub finalize_meshes: bool,
    /// Pipeline slots shared by all records.
    pub workers: usize,
    /// Rayon threads; defaults to one per core, capped at `workers`.
    pub threads: Option<usize>,
    pub collider: ColliderMode,
    pub collider_delay: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            chunk_size: IVec3::splat(10),
            field: FieldParams::default(),
            surface: SurfaceSettings::default(),
            finalize_meshes: true,
            workers: 32,
            threads: None,
            collider: ColliderMode::Delayed,
            collider_delay: Duration::from_millis(50),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub records: usize,
    pub indexed: usize,
    pub free_records: usize,
    pub buffered: usize,
    pub scheduled: usize,
    pub chunks: usize,
    pub free_chunks: usize,
    pub visible: usize,
    pub busy_workers: usize,
    pub available_workers: usize,
}

/// Owns every chunk record and renderable handle, recycles both, and drives
/// the field/mesh pipeline under a fixed worker budget.
pub struct ChunkPool {
    settings: PoolSettings,
    pipeline: Pipeline,
    budget: WorkerBudget,
    stagger: StaggerCounter,
    now: Duration,

    data: Vec<ChunkData>,
    data_by_pos: HashMap<IVec3, DataId>,
    buffered: Vec<DataId>,
    free_data: VecDeque<DataId>,
    scheduled: Vec<DataId>,
    scheduled_dirty: bool,

    chunks: Vec<Chunk>,
    chunks_by_key: HashMap<ChunkKey, ChunkId>,
    free_chunks: VecDeque<ChunkId>,
    pending_colliders: Vec<ChunkId>,

    events: Vec<ChunkEvent>,
    released: bool,
}

impl ChunkPool {
    pub fn new(settings: PoolSettings, field: Arc<dyn ScalarField>) -> Self {
        let size = settings.chunk_size;
        assert!(
            size.x > 0 && size.y > 0 && size.z > 0,
            "chunk size must be positive, got {size:?}"
        );
        assert!(settings.workers > 0, "worker count must be positive");

        let workers = match settings.threads {
            Some(n) => Workers::new(n),
            None => Workers::with_max_threads(settings.workers),
        };
        let lookup = Arc::new(MeshLookup::new(settings.surface.algorithm));
        let pipeline = Pipeline {
            workers,
            generator: FieldGenerator::new(field, settings.field),
            extractor: SurfaceExtractor::new(lookup, settings.surface, settings.finalize_meshes),
        };
        log::info!(
            target: "pool",
            "chunk pool: size {:?}, {} slots on {} threads, {} extraction",
            size,
            settings.workers,
            pipeline.workers.threads(),
            settings.surface.algorithm.name()
        );
        Self {
            budget: WorkerBudget::new(settings.workers),
            settings,
            pipeline,
            stagger: StaggerCounter::new(),
            now: Duration::ZERO,
            data: Vec::new(),
            data_by_pos: HashMap::new(),
            buffered: Vec::new(),
            free_data: VecDeque::new(),
            scheduled: Vec::new(),
            scheduled_dirty: false,
            chunks: Vec::new(),
            chunks_by_key: HashMap::new(),
            free_chunks: VecDeque::new(),
            pending_colliders: Vec::new(),
            events: Vec::new(),
            released: false,
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    pub fn chunk_size(&self) -> IVec3 {
        self.settings.chunk_size
    }

    pub fn chunk(&self, id: ChunkId) -> &Chunk {
        &self.chunks[id.0]
    }

    pub fn data(&self, id: DataId) -> &ChunkData {
        &self.data[id.0]
    }

    pub fn data_at(&self, pos: IVec3) -> Option<&ChunkData> {
        self.data_by_pos.get(&pos).map(|id| &self.data[id.0])
    }

    pub fn chunk_for(&self, key: ChunkKey) -> Option<ChunkId> {
        self.chunks_by_key.get(&key).copied()
    }

    pub fn records(&self) -> impl Iterator<Item = &ChunkData> {
        self.data.iter()
    }

    pub fn budget(&self) -> &WorkerBudget {
        &self.budget
    }

    /// Shows a handle for `coord` under `parent`, creating or recycling the
    /// record and the handle as needed. A record that already finished its
    /// mesh shows the handle immediately.
    pub fn activate(&mut self, coord: IVec3, parent: ParentId, priority: i64) -> ChunkId {
        assert!(!self.released, "activate on a released pool");
        let data_id = match self.data_by_pos.get(&coord) {
            Some(&id) => id,
            None => self.claim_data(coord, priority),
        };

        let key = ChunkKey::new(parent, coord);
        let chunk_id = match self.chunks_by_key.get(&key) {
            Some(&id) => id,
            None => {
                let id = self.claim_chunk();
                let origin = self.data[data_id.0].bounds().min;
                self.chunks[id.0].place(key, origin);
                self.chunks_by_key.insert(key, id);
                id
            }
        };

        let data = &mut self.data[data_id.0];
        data.active = true;
        if !data.chunks.contains(&chunk_id) {
            data.chunks.push(chunk_id);
        }
        let mesh = if data.has_up_to_date_mesh() {
            data.mesh().cloned()
        } else {
            None
        };
        self.show_chunk(chunk_id, mesh);
        chunk_id
    }

    /// Hides and recycles the handle for `coord` under `parent`. The record
    /// is parked for reclamation once no handle references it.
    pub fn deactivate(&mut self, coord: IVec3, parent: ParentId) -> Option<ChunkId> {
        let key = ChunkKey::new(parent, coord);
        let chunk_id = self.chunks_by_key.remove(&key)?;
        self.show_chunk(chunk_id, None);
        self.free_chunks.push_back(chunk_id);

        let Some(&data_id) = self.data_by_pos.get(&coord) else {
            log::warn!(target: "pool", "deactivated {coord:?} without a record");
            return Some(chunk_id);
        };
        let data = &mut self.data[data_id.0];
        data.chunks.retain(|&c| c != chunk_id);
        if data.chunks.is_empty() {
            data.active = false;
            if !data.buffered {
                data.buffered = true;
                self.buffered.push(data_id);
            }
        }
        Some(chunk_id)
    }

    /// Moves records that stayed inactive since they were parked into the
    /// free queue. Run on a slow timer.
    pub fn reclaim(&mut self) -> usize {
        let mut freed = 0;
        for id in self.buffered.drain(..) {
            let data = &mut self.data[id.0];
            data.buffered = false;
            if !data.active {
                self.data_by_pos.remove(&data.position());
                self.free_data.push_back(id);
                freed += 1;
            }
        }
        if freed > 0 {
            log::debug!(
                target: "pool",
                "reclaimed {freed} records ({} free)",
                self.free_data.len()
            );
        }
        freed
    }

    /// Orders the scheduled list so the reverse scan visits the highest
    /// priority first.
    pub fn sort_by_priority(&mut self) {
        let data = &self.data;
        self.scheduled.sort_by_key(|id| data[id.0].priority());
        self.scheduled_dirty = false;
    }

    /// One scheduler pass at host time `now`.
    pub fn tick(&mut self, now: Duration) {
        self.now = now;
        self.stagger.on_tick();
        if self.scheduled_dirty {
            self.sort_by_priority();
        }

        for i in (0..self.scheduled.len()).rev() {
            let id = self.scheduled[i];
            let data = &mut self.data[id.0];
            let step = data.advance(&mut self.budget, &self.pipeline);
            if !step.is_completed() {
                continue;
            }
            data.scheduled = false;
            self.scheduled.remove(i);
            if step == Advance::JustCompleted {
                let mesh = data.mesh().cloned();
                let attached = data.chunks.clone();
                for chunk_id in attached {
                    self.show_chunk(chunk_id, mesh.clone());
                }
            }
        }

        self.poll_colliders();
    }

    pub fn drain_events(&mut self) -> Vec<ChunkEvent> {
        std::mem::take(&mut self.events)
    }

    /// Forwards and clears queued events.
    pub fn flush_events(&mut self, sink: &mut dyn RenderSink) {
        for event in self.events.drain(..) {
            dispatch(sink, &event);
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            records: self.data.len(),
            indexed: self.data_by_pos.len(),
            free_records: self.free_data.len(),
            buffered: self.buffered.len(),
            scheduled: self.scheduled.len(),
            chunks: self.chunks.len(),
            free_chunks: self.free_chunks.len(),
            visible: self.chunks.iter().filter(|c| c.is_visible()).count(),
            busy_workers: self.budget.in_use(),
            available_workers: self.budget.available(),
        }
    }

    /// Waits for all in-flight work and frees every record and handle.
    pub fn shutdown(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        for data in &mut self.data {
            data.cancel_jobs(&mut self.budget);
        }
        let records = self.data.len();
        self.data.clear();
        self.data_by_pos.clear();
        self.buffered.clear();
        self.free_data.clear();
        self.scheduled.clear();
        self.chunks.clear();
        self.chunks_by_key.clear();
        self.free_chunks.clear();
        self.pending_colliders.clear();
        log::info!(target: "pool", "released {records} records");
    }

    fn claim_data(&mut self, coord: IVec3, priority: i64) -> DataId {
        let id = match self.free_data.pop_front() {
            Some(id) => id,
            None => {
                let id = DataId(self.data.len());
                self.data.push(ChunkData::new(id, self.settings.chunk_size));
                log::trace!(target: "pool", "new record #{}", id.0);
                id
            }
        };
        let data = &mut self.data[id.0];
        data.cancel_jobs(&mut self.budget);
        data.set_position(coord);
        data.set_priority(priority);
        self.data_by_pos.insert(coord, id);
        // A recycled record may still sit in the scheduled list.
        if !data.scheduled {
            data.scheduled = true;
            self.scheduled.push(id);
        }
        self.scheduled_dirty = true;
        id
    }

    fn claim_chunk(&mut self) -> ChunkId {
        self.free_chunks.pop_front().unwrap_or_else(|| {
            let id = ChunkId(self.chunks.len());
            self.chunks.push(Chunk::new(self.settings.collider));
            id
        })
    }

    // Applies visibility and queues the matching events.
    fn show_chunk(&mut self, id: ChunkId, mesh: Option<Arc<ChunkMesh>>) {
        let chunk = &mut self.chunks[id.0];
        let was_visible = chunk.is_visible();
        let key = chunk.key();
        let origin = chunk.origin();
        let attached = chunk.set_active(
            mesh.is_some(),
            mesh.clone(),
            self.now,
            self.settings.collider_delay,
            &mut self.stagger,
        );
        match mesh {
            Some(mesh) => {
                self.events.push(ChunkEvent::Shown { key, origin, mesh });
                if attached {
                    self.events.push(ChunkEvent::ColliderAttached { key });
                }
                if chunk.collider_pending() {
                    self.pending_colliders.push(id);
                }
            }
            None if was_visible => self.events.push(ChunkEvent::Hidden { key }),
            None => {}
        }
    }

    fn poll_colliders(&mut self) {
        let now = self.now;
        let chunks = &mut self.chunks;
        let events = &mut self.events;
        self.pending_colliders.retain(|&id| {
            let chunk = &mut chunks[id.0];
            if chunk.poll_collider(now) {
                events.push(ChunkEvent::ColliderAttached { key: chunk.key() });
                return false;
            }
            chunk.collider_pending()
        });
    }
}

impl Drop for ChunkPool {
    fn drop(&mut self) {
        self.release();
    }
}
