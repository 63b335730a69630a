use cavern_geom::{Aabb, Frustum, IVec3, Vec3};

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn vec3_approx_eq(a: Vec3, b: Vec3, eps: f32) -> bool {
    approx_eq(a.x, b.x, eps) && approx_eq(a.y, b.y, eps) && approx_eq(a.z, b.z, eps)
}

#[test]
fn vec3_add_sub_neg() {
    let a = Vec3::new(1.0, 2.0, 3.0);
    let b = Vec3::new(-4.0, 5.0, -6.0);
    let c = a + b;
    assert!(vec3_approx_eq(c, Vec3::new(-3.0, 7.0, -3.0), 1e-6));
    assert!(vec3_approx_eq(c - a, b, 1e-6));
    assert!(vec3_approx_eq(-a, Vec3::new(-1.0, -2.0, -3.0), 1e-6));
}

#[test]
fn vec3_scale_is_componentwise() {
    let v = Vec3::new(1.5, -2.0, 4.0).scale(Vec3::new(2.0, 0.5, -1.0));
    assert!(vec3_approx_eq(v, Vec3::new(3.0, -1.0, -4.0), 1e-6));
}

#[test]
fn vec3_cross_basis() {
    let i = Vec3::new(1.0, 0.0, 0.0);
    let j = Vec3::new(0.0, 1.0, 0.0);
    let k = Vec3::new(0.0, 0.0, 1.0);
    assert!(vec3_approx_eq(i.cross(j), k, 1e-6));
    assert!(vec3_approx_eq(j.cross(k), i, 1e-6));
    assert!(vec3_approx_eq(k.cross(i), j, 1e-6));
}

#[test]
fn vec3_angle_deg() {
    assert!(approx_eq(Vec3::UP.angle_deg(Vec3::FORWARD), 90.0, 1e-4));
    assert!(approx_eq(Vec3::UP.angle_deg(Vec3::UP * 3.0), 0.0, 1e-3));
    assert!(approx_eq(Vec3::UP.angle_deg(-Vec3::UP), 180.0, 1e-3));
    // Degenerate input does not produce NaN
    assert_eq!(Vec3::ZERO.angle_deg(Vec3::UP), 0.0);
}

#[test]
fn vec3_round_to_int() {
    assert_eq!(Vec3::new(0.4, -0.4, 2.6).round_to_int(), IVec3::new(0, 0, 3));
    assert_eq!(Vec3::new(-2.6, 9.5, -9.5).round_to_int(), IVec3::new(-3, 10, -10));
}

#[test]
fn ivec3_scale_and_length() {
    let v = IVec3::new(2, -3, 4);
    assert_eq!(v.scale(IVec3::new(10, 10, 10)), IVec3::new(20, -30, 40));
    assert_eq!(v.length_sq(), 29);
    assert_eq!(IVec3::new(3, 4, 5).product(), 60);
    assert_eq!(v * -1, IVec3::new(-2, 3, -4));
}

#[test]
fn aabb_center_size_roundtrip() {
    let b = Aabb::from_center_size(Vec3::new(10.0, 0.0, -10.0), Vec3::new(10.0, 4.0, 2.0));
    assert!(vec3_approx_eq(b.min, Vec3::new(5.0, -2.0, -11.0), 1e-6));
    assert!(vec3_approx_eq(b.max, Vec3::new(15.0, 2.0, -9.0), 1e-6));
    assert!(vec3_approx_eq(b.center(), Vec3::new(10.0, 0.0, -10.0), 1e-6));
    assert!(vec3_approx_eq(b.size(), Vec3::new(10.0, 4.0, 2.0), 1e-6));
}

#[test]
fn aabb_from_points() {
    assert!(Aabb::from_points(std::iter::empty()).is_none());
    let b = Aabb::from_points([
        Vec3::new(1.0, 5.0, -1.0),
        Vec3::new(-2.0, 0.0, 3.0),
        Vec3::new(0.0, 2.0, 0.0),
    ])
    .unwrap();
    assert_eq!(b.min, Vec3::new(-2.0, 0.0, -1.0));
    assert_eq!(b.max, Vec3::new(1.0, 5.0, 3.0));
    assert!(b.contains_point(Vec3::new(0.0, 2.0, 0.0)));
    assert!(!b.contains_point(Vec3::new(0.0, 6.0, 0.0)));
}

fn looking_forward() -> Frustum {
    Frustum::perspective(Vec3::ZERO, Vec3::FORWARD, Vec3::UP, 60.0, 1.0, 0.1, 50.0)
}

#[test]
fn frustum_accepts_box_ahead() {
    let f = looking_forward();
    let ahead = Aabb::from_center_size(Vec3::new(0.0, 0.0, 10.0), Vec3::splat(2.0));
    assert!(f.contains_aabb(&ahead));
}

#[test]
fn frustum_rejects_box_behind_and_beyond_far() {
    let f = looking_forward();
    let behind = Aabb::from_center_size(Vec3::new(0.0, 0.0, -10.0), Vec3::splat(2.0));
    let far = Aabb::from_center_size(Vec3::new(0.0, 0.0, 80.0), Vec3::splat(2.0));
    assert!(!f.contains_aabb(&behind));
    assert!(!f.contains_aabb(&far));
}

#[test]
fn frustum_rejects_box_outside_side_planes() {
    let f = looking_forward();
    // 60 degree fov: at z = 10 the half-width is ~5.77
    let left = Aabb::from_center_size(Vec3::new(-20.0, 0.0, 10.0), Vec3::splat(2.0));
    let above = Aabb::from_center_size(Vec3::new(0.0, 20.0, 10.0), Vec3::splat(2.0));
    assert!(!f.contains_aabb(&left));
    assert!(!f.contains_aabb(&above));
}

#[test]
fn frustum_keeps_box_straddling_a_plane() {
    let f = looking_forward();
    let straddle = Aabb::from_center_size(Vec3::new(0.0, 0.0, 0.0), Vec3::splat(4.0));
    assert!(f.contains_aabb(&straddle));
}
