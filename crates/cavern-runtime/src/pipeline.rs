use std::sync::Arc;

use cavern_field::{FieldParams, ScalarField, Volume, fill_volume};
use cavern_mesh_cpu::{ChunkMesh, MeshBuffer, MeshLookup, SurfaceSettings, extract_surface};

use crate::job::{JobHandle, Workers};

/// Schedules volume fills from a shared density source.
#[derive(Clone)]
pub struct FieldGenerator {
    field: Arc<dyn ScalarField>,
    params: FieldParams,
}

impl FieldGenerator {
    pub fn new(field: Arc<dyn ScalarField>, params: FieldParams) -> Self {
        Self { field, params }
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    /// Moves `volume` onto a worker and refills it in place.
    pub fn schedule(&self, workers: &Workers, mut volume: Volume) -> JobHandle<Volume> {
        let field = Arc::clone(&self.field);
        let params = self.params;
        workers.spawn(move || {
            fill_volume(&mut volume, field.as_ref(), &params);
            volume
        })
    }
}

/// Buffers and mesh returned by a finished extraction job.
pub struct MeshOutput {
    pub volume: Volume,
    pub buffer: MeshBuffer,
    pub mesh: Arc<ChunkMesh>,
}

/// Schedules surface extraction against the shared lookup table.
#[derive(Clone)]
pub struct SurfaceExtractor {
    lookup: Arc<MeshLookup>,
    settings: SurfaceSettings,
    finalize: bool,
}

impl SurfaceExtractor {
    pub fn new(lookup: Arc<MeshLookup>, settings: SurfaceSettings, finalize: bool) -> Self {
        Self {
            lookup,
            settings,
            finalize,
        }
    }

    pub fn settings(&self) -> &SurfaceSettings {
        &self.settings
    }

    pub fn lookup(&self) -> &Arc<MeshLookup> {
        &self.lookup
    }

    /// Moves a filled volume and a reusable buffer onto a worker. With
    /// `finalize` set the produced mesh carries normals and bounds.
    pub fn schedule(
        &self,
        workers: &Workers,
        volume: Volume,
        mut buffer: MeshBuffer,
    ) -> JobHandle<MeshOutput> {
        let lookup = Arc::clone(&self.lookup);
        let settings = self.settings;
        let finalize = self.finalize;
        workers.spawn(move || {
            extract_surface(&volume, &lookup, &settings, &mut buffer);
            let mesh = if finalize {
                ChunkMesh::from_buffer(&buffer)
            } else {
                ChunkMesh::raw(&buffer)
            };
            MeshOutput {
                volume,
                buffer,
                mesh: Arc::new(mesh),
            }
        })
    }
}

/// Everything a chunk record needs to push work through both stages.
#[derive(Clone)]
pub struct Pipeline {
    pub workers: Workers,
    pub generator: FieldGenerator,
    pub extractor: SurfaceExtractor,
}
