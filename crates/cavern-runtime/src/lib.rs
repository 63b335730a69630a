//! Chunk streaming runtime: async field/mesh jobs, pooled chunk records,
//! renderable handles and the region enumerator.
#![forbid(unsafe_code)]

mod bounds;
mod chunk;
mod data;
mod events;
mod job;
mod pipeline;
mod pool;
mod stagger;

pub use bounds::{BoundsCollection, BoundsIter};
pub use chunk::{Chunk, ChunkId, ChunkKey, ColliderMode, ParentId};
pub use data::{Advance, ChunkData, ChunkState, DataId};
pub use events::{ChunkEvent, RenderSink, dispatch};
pub use job::{JobHandle, WorkerBudget, Workers};
pub use pipeline::{FieldGenerator, MeshOutput, Pipeline, SurfaceExtractor};
pub use pool::{ChunkPool, PoolSettings, PoolStats};
pub use stagger::StaggerCounter;
