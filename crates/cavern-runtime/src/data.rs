use std::mem;
use std::sync::Arc;

use cavern_field::Volume;
use cavern_geom::{Aabb, IVec3};
use cavern_mesh_cpu::{ChunkMesh, MeshBuffer};

use crate::chunk::ChunkId;
use crate::job::{JobHandle, WorkerBudget};
use crate::pipeline::{MeshOutput, Pipeline};

/// Index of a record in the pool's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataId(pub(crate) usize);

impl DataId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    Idle,
    FieldScheduled,
    MeshScheduled,
    Completed,
}

/// Outcome of one [`ChunkData::advance`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    Pending,
    /// The mesh finished during this call.
    JustCompleted,
    Completed,
}

impl Advance {
    #[inline]
    pub fn is_completed(self) -> bool {
        !matches!(self, Advance::Pending)
    }
}

// Buffers live in whichever stage currently owns them.
enum Stage {
    Idle {
        volume: Volume,
        buffer: MeshBuffer,
    },
    Field {
        job: JobHandle<Volume>,
        buffer: MeshBuffer,
    },
    Mesh {
        job: JobHandle<MeshOutput>,
    },
    Completed {
        volume: Volume,
        buffer: MeshBuffer,
    },
    // Only observable while a transition is in progress.
    Vacant,
}

/// Per-coordinate pipeline record: one volume, one mesh buffer, the handles
/// currently showing it, and its place in the scheduler.
pub struct ChunkData {
    id: DataId,
    position: IVec3,
    bounds: Aabb,
    priority: i64,
    stage: Stage,
    mesh: Option<Arc<ChunkMesh>>,
    pub(crate) chunks: Vec<ChunkId>,
    pub(crate) active: bool,
    pub(crate) buffered: bool,
    pub(crate) scheduled: bool,
}

impl ChunkData {
    pub fn new(id: DataId, size: IVec3) -> Self {
        let volume = Volume::new(size);
        Self {
            id,
            position: volume.position(),
            bounds: volume.bounds(),
            priority: 0,
            stage: Stage::Idle {
                volume,
                buffer: MeshBuffer::new(),
            },
            mesh: None,
            chunks: Vec::new(),
            active: false,
            buffered: false,
            scheduled: false,
        }
    }

    #[inline]
    pub fn id(&self) -> DataId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> IVec3 {
        self.position
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    #[inline]
    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i64) {
        self.priority = priority;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn attached(&self) -> &[ChunkId] {
        &self.chunks
    }

    pub fn state(&self) -> ChunkState {
        match self.stage {
            Stage::Idle { .. } => ChunkState::Idle,
            Stage::Field { .. } => ChunkState::FieldScheduled,
            Stage::Mesh { .. } => ChunkState::MeshScheduled,
            Stage::Completed { .. } => ChunkState::Completed,
            Stage::Vacant => unreachable!("chunk data observed mid-transition"),
        }
    }

    /// True while the record occupies a worker slot.
    #[inline]
    pub fn holds_slot(&self) -> bool {
        matches!(self.stage, Stage::Field { .. } | Stage::Mesh { .. })
    }

    #[inline]
    pub fn has_up_to_date_mesh(&self) -> bool {
        matches!(self.stage, Stage::Completed { .. })
    }

    /// Mesh from the last completed pass at the current position.
    pub fn mesh(&self) -> Option<&Arc<ChunkMesh>> {
        self.mesh.as_ref()
    }

    /// Volume contents, available only when no job holds the buffer.
    pub fn volume(&self) -> Option<&Volume> {
        match &self.stage {
            Stage::Idle { volume, .. } | Stage::Completed { volume, .. } => Some(volume),
            _ => None,
        }
    }

    /// Moves the record to `pos` and resets it to `Idle`.
    ///
    /// Panics if a job still owns the buffers; call [`ChunkData::cancel_jobs`]
    /// first.
    pub fn set_position(&mut self, pos: IVec3) {
        match mem::replace(&mut self.stage, Stage::Vacant) {
            Stage::Idle { mut volume, buffer } | Stage::Completed { mut volume, buffer } => {
                volume.set_position(pos);
                self.position = volume.position();
                self.bounds = volume.bounds();
                self.stage = Stage::Idle { volume, buffer };
                self.mesh = None;
            }
            _ => panic!("chunk data at {:?} repositioned with outstanding work", self.position),
        }
    }

    /// Drives the record one step through its pipeline.
    pub fn advance(&mut self, budget: &mut WorkerBudget, pipeline: &Pipeline) -> Advance {
        match &mut self.stage {
            Stage::Idle { .. } => {
                if !budget.try_acquire() {
                    return Advance::Pending;
                }
                let Stage::Idle { volume, buffer } = mem::replace(&mut self.stage, Stage::Vacant)
                else {
                    unreachable!()
                };
                let job = pipeline.generator.schedule(&pipeline.workers, volume);
                self.stage = Stage::Field { job, buffer };
                log::trace!(target: "jobs", "field scheduled at {:?}", self.position);
                Advance::Pending
            }
            Stage::Field { job, .. } => {
                if !job.is_completed() {
                    return Advance::Pending;
                }
                let Stage::Field { job, buffer } = mem::replace(&mut self.stage, Stage::Vacant)
                else {
                    unreachable!()
                };
                let volume = job.into_inner();
                let job = pipeline.extractor.schedule(&pipeline.workers, volume, buffer);
                self.stage = Stage::Mesh { job };
                log::trace!(target: "jobs", "mesh scheduled at {:?}", self.position);
                Advance::Pending
            }
            Stage::Mesh { job } => {
                if !job.is_completed() {
                    return Advance::Pending;
                }
                let Stage::Mesh { job } = mem::replace(&mut self.stage, Stage::Vacant) else {
                    unreachable!()
                };
                let MeshOutput {
                    volume,
                    buffer,
                    mesh,
                } = job.into_inner();
                budget.release();
                log::trace!(
                    target: "jobs",
                    "mesh completed at {:?}: {} tris",
                    self.position,
                    mesh.triangle_count()
                );
                self.mesh = Some(mesh);
                self.stage = Stage::Completed { volume, buffer };
                Advance::JustCompleted
            }
            Stage::Completed { .. } => Advance::Completed,
            Stage::Vacant => unreachable!("chunk data advanced mid-transition"),
        }
    }

    /// Waits for any in-flight job, releases its slot and returns the record
    /// to `Idle` with its buffers. The interrupted result is discarded.
    pub fn cancel_jobs(&mut self, budget: &mut WorkerBudget) {
        match mem::replace(&mut self.stage, Stage::Vacant) {
            Stage::Field { job, buffer } => {
                let volume = job.into_inner();
                budget.release();
                self.stage = Stage::Idle { volume, buffer };
                log::trace!(target: "jobs", "cancelled field job at {:?}", self.position);
            }
            Stage::Mesh { job } => {
                let MeshOutput { volume, buffer, .. } = job.into_inner();
                budget.release();
                self.stage = Stage::Idle { volume, buffer };
                log::trace!(target: "jobs", "cancelled mesh job at {:?}", self.position);
            }
            other => self.stage = other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Workers;
    use crate::pipeline::{FieldGenerator, SurfaceExtractor};
    use cavern_field::FieldParams;
    use cavern_geom::Vec3;
    use cavern_mesh_cpu::{MeshLookup, SurfaceAlgorithm, SurfaceSettings};

    fn pipeline() -> Pipeline {
        let settings = SurfaceSettings {
            algorithm: SurfaceAlgorithm::Cube,
            weld_vertices: true,
            threshold: 0.0,
        };
        Pipeline {
            workers: Workers::new(2),
            generator: FieldGenerator::new(
                Arc::new(|p: Vec3| p.y - 0.05),
                FieldParams {
                    scale: Vec3::ONE,
                    offset: Vec3::ZERO,
                },
            ),
            extractor: SurfaceExtractor::new(
                Arc::new(MeshLookup::new(SurfaceAlgorithm::Cube)),
                settings,
                true,
            ),
        }
    }

    fn run_to_completion(data: &mut ChunkData, budget: &mut WorkerBudget, p: &Pipeline) -> usize {
        let mut steps = 0;
        loop {
            steps += 1;
            match data.advance(budget, p) {
                Advance::JustCompleted => return steps,
                Advance::Completed => panic!("completed without transition"),
                Advance::Pending => std::thread::yield_now(),
            }
        }
    }

    #[test]
    fn idle_waits_for_a_slot() {
        let p = pipeline();
        let mut budget = WorkerBudget::new(1);
        assert!(budget.try_acquire());
        let mut data = ChunkData::new(DataId(0), IVec3::splat(4));
        assert_eq!(data.advance(&mut budget, &p), Advance::Pending);
        assert_eq!(data.state(), ChunkState::Idle);
        budget.release();
        data.advance(&mut budget, &p);
        assert_eq!(data.state(), ChunkState::FieldScheduled);
        assert_eq!(budget.available(), 0);
    }

    #[test]
    fn pipeline_runs_to_completion_and_releases_slot() {
        let p = pipeline();
        let mut budget = WorkerBudget::new(1);
        let mut data = ChunkData::new(DataId(0), IVec3::splat(4));
        let steps = run_to_completion(&mut data, &mut budget, &p);
        assert!(steps >= 3);
        assert_eq!(budget.available(), 1);
        assert!(data.has_up_to_date_mesh());
        let mesh = data.mesh().expect("mesh after completion");
        assert!(!mesh.is_empty());
        assert_eq!(data.advance(&mut budget, &p), Advance::Completed);
    }

    #[test]
    fn cancel_returns_slot_and_buffers() {
        let p = pipeline();
        let mut budget = WorkerBudget::new(1);
        let mut data = ChunkData::new(DataId(0), IVec3::splat(4));
        data.advance(&mut budget, &p);
        assert!(data.holds_slot());
        data.cancel_jobs(&mut budget);
        assert_eq!(budget.available(), 1);
        assert_eq!(data.state(), ChunkState::Idle);
        data.set_position(IVec3::new(8, 0, 0));
        assert_eq!(data.position(), IVec3::new(8, 0, 0));
        assert!(data.volume().is_some());
    }

    #[test]
    fn cancel_on_idle_is_a_no_op() {
        let mut budget = WorkerBudget::new(3);
        let mut data = ChunkData::new(DataId(0), IVec3::splat(2));
        data.cancel_jobs(&mut budget);
        assert_eq!(budget.available(), 3);
        assert_eq!(data.state(), ChunkState::Idle);
    }

    #[test]
    #[should_panic(expected = "outstanding work")]
    fn reposition_with_job_in_flight_panics() {
        let p = pipeline();
        let mut budget = WorkerBudget::new(1);
        let mut data = ChunkData::new(DataId(0), IVec3::splat(4));
        data.advance(&mut budget, &p);
        data.set_position(IVec3::ONE);
    }

    #[test]
    fn reposition_clears_completed_mesh() {
        let p = pipeline();
        let mut budget = WorkerBudget::new(1);
        let mut data = ChunkData::new(DataId(0), IVec3::splat(4));
        run_to_completion(&mut data, &mut budget, &p);
        data.set_position(IVec3::new(0, 40, 0));
        assert_eq!(data.state(), ChunkState::Idle);
        assert!(data.mesh().is_none());
    }
}
