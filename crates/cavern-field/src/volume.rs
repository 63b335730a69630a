use cavern_geom::{Aabb, IVec3, Vec3};

/// Padded density grid for one chunk.
///
/// The grid holds `size + 1` samples per axis so that every cell in
/// `[0, size)` can read all eight of its corners. Samples are laid out
/// x-fastest, then y, then z. The buffer is allocated once and refilled in
/// place whenever the owning record moves to a new coordinate.
#[derive(Clone, Debug)]
pub struct Volume {
    position: IVec3,
    size: IVec3,
    padded: IVec3,
    bounds: Aabb,
    samples: Vec<f32>,
}

impl Volume {
    pub fn new(size: IVec3) -> Self {
        assert!(
            size.x > 0 && size.y > 0 && size.z > 0,
            "volume size must be positive on every axis, got {size:?}"
        );
        let padded = size + IVec3::ONE;
        let count = padded.product() as usize;
        let mut volume = Self {
            position: IVec3::ZERO,
            size,
            padded,
            bounds: Aabb::default(),
            samples: vec![0.0; count],
        };
        volume.set_position(IVec3::ZERO);
        volume
    }

    /// Re-centres the volume on `pos`. Sample contents are left untouched
    /// until the next fill.
    pub fn set_position(&mut self, pos: IVec3) {
        self.position = pos;
        self.bounds = Aabb::from_center_size(pos.as_vec3(), self.size.as_vec3());
    }

    #[inline]
    pub fn position(&self) -> IVec3 {
        self.position
    }

    #[inline]
    pub fn size(&self) -> IVec3 {
        self.size
    }

    #[inline]
    pub fn padded_size(&self) -> IVec3 {
        self.padded
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// World-space position of sample `(0, 0, 0)`.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.bounds.min
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        let px = self.padded.x as usize;
        let py = self.padded.y as usize;
        x + y * px + z * px * py
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        self.samples[self.idx(x, y, z)]
    }

    #[inline]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[inline]
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Overwrites every sample from a local-coordinate function.
    pub fn fill_with<F: FnMut(usize, usize, usize) -> f32>(&mut self, mut f: F) {
        let (px, py, pz) = (
            self.padded.x as usize,
            self.padded.y as usize,
            self.padded.z as usize,
        );
        for z in 0..pz {
            for y in 0..py {
                for x in 0..px {
                    let i = x + y * px + z * px * py;
                    self.samples[i] = f(x, y, z);
                }
            }
        }
    }
}
