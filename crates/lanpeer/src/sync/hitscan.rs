use glam::Vec3;

/// Collision radius of a player body for hit tests.
pub const PLAYER_HIT_RADIUS: f32 = 0.35;

/// Distance along `dir` to the first intersection of the ray with a sphere,
/// or `None` when the sphere is missed or lies behind the origin. A ray that
/// starts inside the sphere reports the exit point. `dir` must be normalized.
pub fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let mut t = -b - root;
    if t < 0.0 {
        t = -b + root;
    }
    if t < 0.0 {
        return None;
    }
    Some(t)
}

/// Ray test with a direction that may be unnormalized or degenerate, as
/// received off the wire.
pub fn ray_hits_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> bool {
    match dir.try_normalize() {
        Some(dir) => ray_sphere(origin, dir, center, radius).is_some(),
        None => false,
    }
}
