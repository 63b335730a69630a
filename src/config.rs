use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cavern_field::{FieldParams, NoiseField, NoiseKind};
use cavern_geom::{IVec3, Vec3};
use cavern_mesh_cpu::{SurfaceAlgorithm, SurfaceSettings};
use cavern_runtime::{ColliderMode, PoolSettings};
use serde::Deserialize;

use crate::cave::{CaveSettings, FrustumSettings};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CaveConfig {
    #[serde(default)]
    pub voxels: Voxels,
    #[serde(default)]
    pub field: Field,
    #[serde(default)]
    pub mesh: Mesh,
    #[serde(default)]
    pub pool: Pool,
    #[serde(default)]
    pub cave: Cave,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Voxels {
    /// Cells per chunk on each axis.
    #[serde(default = "default_voxel_size")]
    pub size: [i32; 3],
}
fn default_voxel_size() -> [i32; 3] {
    [10, 10, 10]
}
impl Default for Voxels {
    fn default() -> Self {
        Self {
            size: default_voxel_size(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Field {
    #[serde(default)]
    pub noise: NoiseKind,
    #[serde(default = "default_seed")]
    pub seed: i32,
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default)]
    pub offset: [f32; 3],
}
fn default_seed() -> i32 {
    1337
}
fn default_scale() -> [f32; 3] {
    [0.1, 0.1, 0.1]
}
impl Default for Field {
    fn default() -> Self {
        Self {
            noise: NoiseKind::default(),
            seed: default_seed(),
            scale: default_scale(),
            offset: [0.0; 3],
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Mesh {
    #[serde(default)]
    pub algorithm: SurfaceAlgorithm,
    #[serde(default = "default_true")]
    pub weld_vertices: bool,
    #[serde(default)]
    pub surface_threshold: f32,
    /// Recompute normals and bounds after extraction.
    #[serde(default = "default_true")]
    pub finalize: bool,
}
fn default_true() -> bool {
    true
}
impl Default for Mesh {
    fn default() -> Self {
        Self {
            algorithm: SurfaceAlgorithm::default(),
            weld_vertices: true,
            surface_threshold: 0.0,
            finalize: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Pool {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default = "default_reclaim_period")]
    pub reclaim_period_secs: f32,
    #[serde(default)]
    pub collider: ColliderMode,
    #[serde(default = "default_collider_delay")]
    pub collider_delay_secs: f32,
}
fn default_workers() -> usize {
    32
}
fn default_reclaim_period() -> f32 {
    1.0
}
fn default_collider_delay() -> f32 {
    0.05
}
impl Default for Pool {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            threads: None,
            reclaim_period_secs: default_reclaim_period(),
            collider: ColliderMode::default(),
            collider_delay_secs: default_collider_delay(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Cave {
    /// Chunks enumerated on each side of the center chunk.
    #[serde(default = "default_extents")]
    pub extents: [i32; 3],
    #[serde(default = "default_update_distance")]
    pub update_distance: f32,
    #[serde(default = "default_update_angle")]
    pub update_angle_deg: f32,
    #[serde(default)]
    pub use_frustum: bool,
    #[serde(default = "default_fov")]
    pub fov_y_deg: f32,
    #[serde(default = "default_aspect")]
    pub aspect: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}
fn default_extents() -> [i32; 3] {
    [3, 3, 3]
}
fn default_update_distance() -> f32 {
    5.0
}
fn default_update_angle() -> f32 {
    5.0
}
fn default_fov() -> f32 {
    60.0
}
fn default_aspect() -> f32 {
    16.0 / 9.0
}
fn default_near() -> f32 {
    0.1
}
fn default_far() -> f32 {
    100.0
}
impl Default for Cave {
    fn default() -> Self {
        Self {
            extents: default_extents(),
            update_distance: default_update_distance(),
            update_angle_deg: default_update_angle(),
            use_frustum: false,
            fov_y_deg: default_fov(),
            aspect: default_aspect(),
            near: default_near(),
            far: default_far(),
        }
    }
}

impl CaveConfig {
    /// Reads, parses and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml_str(&s)?;
        log::info!("loaded config from {}", path.display());
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: CaveConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.voxels.size.iter().any(|&n| n <= 0) {
            return Err(invalid(
                "voxels.size",
                format!("every axis must be positive, got {:?}", self.voxels.size),
            ));
        }
        for (name, v) in [("field.scale", self.field.scale), ("field.offset", self.field.offset)] {
            if v.iter().any(|c| !c.is_finite()) {
                return Err(invalid(name, format!("components must be finite, got {v:?}")));
            }
        }
        if !self.mesh.surface_threshold.is_finite() {
            return Err(invalid("mesh.surface_threshold", "must be finite"));
        }
        if self.pool.workers == 0 {
            return Err(invalid("pool.workers", "must be at least 1"));
        }
        if self.pool.threads == Some(0) {
            return Err(invalid("pool.threads", "must be at least 1 when set"));
        }
        if !(self.pool.reclaim_period_secs > 0.0 && self.pool.reclaim_period_secs.is_finite()) {
            return Err(invalid(
                "pool.reclaim_period_secs",
                format!("must be positive, got {}", self.pool.reclaim_period_secs),
            ));
        }
        if !(self.pool.collider_delay_secs >= 0.0 && self.pool.collider_delay_secs.is_finite()) {
            return Err(invalid("pool.collider_delay_secs", "must be non-negative"));
        }
        if self.cave.extents.iter().any(|&n| n < 0) {
            return Err(invalid(
                "cave.extents",
                format!("must be non-negative, got {:?}", self.cave.extents),
            ));
        }
        if !(self.cave.update_distance > 0.0 && self.cave.update_distance.is_finite()) {
            return Err(invalid("cave.update_distance", "must be positive"));
        }
        if !(self.cave.update_angle_deg >= 0.0 && self.cave.update_angle_deg.is_finite()) {
            return Err(invalid("cave.update_angle_deg", "must be non-negative"));
        }
        if self.cave.use_frustum {
            let c = &self.cave;
            if !(c.fov_y_deg > 0.0 && c.fov_y_deg < 180.0) {
                return Err(invalid("cave.fov_y_deg", "must be in (0, 180)"));
            }
            if !(c.aspect > 0.0 && c.aspect.is_finite()) {
                return Err(invalid("cave.aspect", "must be positive"));
            }
            if !(c.near > 0.0 && c.far > c.near && c.far.is_finite()) {
                return Err(invalid("cave.near", "require 0 < near < far"));
            }
        }
        Ok(())
    }

    pub fn chunk_size(&self) -> IVec3 {
        IVec3::from(self.voxels.size)
    }

    pub fn reclaim_period(&self) -> Duration {
        Duration::from_secs_f32(self.pool.reclaim_period_secs)
    }

    pub fn noise_field(&self) -> NoiseField {
        NoiseField::new(self.field.noise, self.field.seed)
    }

    pub fn pool_settings(&self) -> PoolSettings {
        let [sx, sy, sz] = self.field.scale;
        let [ox, oy, oz] = self.field.offset;
        PoolSettings {
            chunk_size: self.chunk_size(),
            field: FieldParams {
                scale: Vec3::new(sx, sy, sz),
                offset: Vec3::new(ox, oy, oz),
            },
            surface: SurfaceSettings {
                algorithm: self.mesh.algorithm,
                weld_vertices: self.mesh.weld_vertices,
                threshold: self.mesh.surface_threshold,
            },
            finalize_meshes: self.mesh.finalize,
            workers: self.pool.workers,
            threads: self.pool.threads,
            collider: self.pool.collider,
            collider_delay: Duration::from_secs_f32(self.pool.collider_delay_secs),
        }
    }

    pub fn cave_settings(&self) -> CaveSettings {
        let c = &self.cave;
        CaveSettings {
            extents: IVec3::from(c.extents),
            update_distance: c.update_distance,
            update_angle_deg: c.update_angle_deg,
            frustum: c.use_frustum.then_some(FrustumSettings {
                fov_y_deg: c.fov_y_deg,
                aspect: c.aspect,
                near: c.near,
                far: c.far,
            }),
        }
    }
}
