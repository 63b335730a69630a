use cavern_field::{FieldParams, NoiseField, NoiseKind, ScalarField, Volume, fill_volume};
use cavern_geom::{IVec3, Vec3};
use proptest::prelude::*;

fn dim() -> impl Strategy<Value = i32> {
    1i32..=8
}

proptest! {
    // idx maps each padded (x,y,z) to a unique in-range index
    #[test]
    fn idx_is_unique_and_in_range(sx in dim(), sy in dim(), sz in dim()) {
        let v = Volume::new(IVec3::new(sx, sy, sz));
        let expect = ((sx + 1) * (sy + 1) * (sz + 1)) as usize;
        prop_assert_eq!(v.sample_count(), expect);
        let mut seen = vec![false; expect];
        for z in 0..=sz as usize { for y in 0..=sy as usize { for x in 0..=sx as usize {
            let i = v.idx(x, y, z);
            prop_assert!(i < expect);
            prop_assert!(!seen[i]);
            seen[i] = true;
        }}}
        prop_assert!(seen.into_iter().all(|b| b));
    }

    // Repositioning never changes the buffer length
    #[test]
    fn set_position_keeps_buffer(sx in dim(), sy in dim(), sz in dim(), px in -1000i32..1000, pz in -1000i32..1000) {
        let mut v = Volume::new(IVec3::new(sx, sy, sz));
        let before = v.sample_count();
        v.set_position(IVec3::new(px, 0, pz));
        prop_assert_eq!(v.sample_count(), before);
        prop_assert_eq!(v.bounds().center().round_to_int(), IVec3::new(px, 0, pz));
    }
}

#[test]
fn bounds_are_centred_on_position() {
    let mut v = Volume::new(IVec3::new(10, 10, 10));
    v.set_position(IVec3::new(20, -10, 0));
    assert_eq!(v.padded_size(), IVec3::new(11, 11, 11));
    assert_eq!(v.origin(), Vec3::new(15.0, -15.0, -5.0));
    assert_eq!(v.bounds().max, Vec3::new(25.0, -5.0, 5.0));
}

#[test]
#[should_panic]
fn zero_size_is_rejected() {
    let _ = Volume::new(IVec3::new(4, 0, 4));
}

#[test]
fn fill_volume_samples_scaled_world_positions() {
    let mut v = Volume::new(IVec3::new(4, 3, 2));
    v.set_position(IVec3::new(10, 0, 0));
    let params = FieldParams {
        scale: Vec3::new(2.0, 1.0, 1.0),
        offset: Vec3::new(0.0, 100.0, 0.0),
    };
    let field = |p: Vec3| p.x * 1000.0 + p.y + p.z * 0.001;
    fill_volume(&mut v, &field, &params);

    let origin = v.origin();
    for z in 0..3usize {
        for y in 0..4usize {
            for x in 0..5usize {
                let p = Vec3::new(
                    (origin.x + x as f32) * 2.0,
                    origin.y + y as f32 + 100.0,
                    origin.z + z as f32,
                );
                assert_eq!(v.get(x, y, z), field(p));
            }
        }
    }
}

#[test]
fn fill_with_uses_local_coordinates() {
    let mut v = Volume::new(IVec3::new(2, 2, 2));
    v.fill_with(|x, y, z| (x + 10 * y + 100 * z) as f32);
    assert_eq!(v.get(1, 2, 0), 21.0);
    assert_eq!(v.get(2, 0, 1), 102.0);
    assert_eq!(v.samples()[v.idx(2, 2, 2)], 222.0);
}

#[test]
fn noise_field_is_deterministic_and_finite() {
    let a = NoiseField::new(NoiseKind::Perlin, 7);
    let b = NoiseField::new(NoiseKind::Perlin, 7);
    for i in 0..64 {
        let p = Vec3::new(i as f32 * 0.37, -(i as f32) * 0.11, i as f32 * 0.05);
        let s = a.sample(p);
        assert!(s.is_finite());
        assert_eq!(s, b.sample(p));
    }
    assert_eq!(a.kind(), NoiseKind::Perlin);
    assert_eq!(a.seed(), 7);
}

#[test]
fn noise_fill_matches_sequential_sampling() {
    let field = NoiseField::new(NoiseKind::OpenSimplex2, 1337);
    let params = FieldParams::default();
    let mut v = Volume::new(IVec3::new(6, 6, 6));
    v.set_position(IVec3::new(-30, 12, 6));
    fill_volume(&mut v, &field, &params);
    let origin = v.origin();
    for (x, y, z) in [(0, 0, 0), (6, 6, 6), (3, 1, 5), (6, 0, 2)] {
        let p = (origin + Vec3::new(x as f32, y as f32, z as f32)).scale(params.scale);
        assert_eq!(v.get(x, y, z), field.sample(p));
    }
}
