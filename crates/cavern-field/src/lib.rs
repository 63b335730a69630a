//! Scalar-field volumes and the density sources that fill them.
#![forbid(unsafe_code)]

mod fill;
mod noise;
mod volume;

pub use fill::{FieldParams, fill_volume};
pub use noise::{NoiseField, NoiseKind};
pub use volume::Volume;

use cavern_geom::Vec3;

/// A pure, total density function over world space.
pub trait ScalarField: Send + Sync {
    fn sample(&self, p: Vec3) -> f32;
}

impl<F> ScalarField for F
where
    F: Fn(Vec3) -> f32 + Send + Sync,
{
    #[inline]
    fn sample(&self, p: Vec3) -> f32 {
        self(p)
    }
}
