use cavern_geom::Vec3;
use rayon::prelude::*;

use crate::{ScalarField, Volume};

/// Maps sample indices to field space: `p = (origin + i) * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldParams {
    pub scale: Vec3,
    pub offset: Vec3,
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            scale: Vec3::splat(0.1),
            offset: Vec3::ZERO,
        }
    }
}

/// Fills every padded sample of `volume` from `field`.
///
/// Each z-slab is written by one task; writes are disjoint so slabs run in
/// parallel on the current rayon pool.
pub fn fill_volume(volume: &mut Volume, field: &dyn ScalarField, params: &FieldParams) {
    let padded = volume.padded_size();
    let (px, py) = (padded.x as usize, padded.y as usize);
    let origin = volume.origin();
    let FieldParams { scale, offset } = *params;
    volume
        .samples_mut()
        .par_chunks_mut(px * py)
        .enumerate()
        .for_each(|(z, slab)| {
            for y in 0..py {
                for x in 0..px {
                    let local = Vec3::new(x as f32, y as f32, z as f32);
                    let p = (origin + local).scale(scale) + offset;
                    slab[x + y * px] = field.sample(p);
                }
            }
        });
}
