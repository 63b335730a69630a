use cavern_geom::Vec3;
use fastnoise_lite::{FastNoiseLite, NoiseType};
use serde::Deserialize;

use crate::ScalarField;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseKind {
    #[default]
    Perlin,
    OpenSimplex2,
    OpenSimplex2s,
    Cellular,
    ValueCubic,
    Value,
}

impl NoiseKind {
    fn noise_type(self) -> NoiseType {
        match self {
            NoiseKind::Perlin => NoiseType::Perlin,
            NoiseKind::OpenSimplex2 => NoiseType::OpenSimplex2,
            NoiseKind::OpenSimplex2s => NoiseType::OpenSimplex2S,
            NoiseKind::Cellular => NoiseType::Cellular,
            NoiseKind::ValueCubic => NoiseType::ValueCubic,
            NoiseKind::Value => NoiseType::Value,
        }
    }
}

/// Gradient/value noise density source.
///
/// Frequency is pinned to 1.0: spatial scaling is applied by the generator
/// before sampling, so the same noise can be reused across chunk sizes.
pub struct NoiseField {
    kind: NoiseKind,
    seed: i32,
    noise: FastNoiseLite,
}

impl NoiseField {
    pub fn new(kind: NoiseKind, seed: i32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(kind.noise_type()));
        noise.set_frequency(Some(1.0));
        Self { kind, seed, noise }
    }

    #[inline]
    pub fn kind(&self) -> NoiseKind {
        self.kind
    }

    #[inline]
    pub fn seed(&self) -> i32 {
        self.seed
    }
}

impl ScalarField for NoiseField {
    #[inline]
    fn sample(&self, p: Vec3) -> f32 {
        self.noise.get_noise_3d(p.x, p.y, p.z)
    }
}
