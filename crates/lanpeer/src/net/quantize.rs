use glam::Vec3;

/// Centimeter resolution: 1 m is 100 wire units.
pub const POSITION_SCALE: f32 = 100.0;
pub const MAX_POSITION: f32 = i16::MAX as f32 / POSITION_SCALE;

pub const MAX_HEALTH: f32 = 100.0;

pub const ECONOMY_MAX: i32 = 60_000;
pub const DELTA_LIMIT: i32 = 120;
pub const JOIN_SECONDS_MAX: i32 = 65_000;

/// Saturates at the i16 range instead of wrapping.
#[inline]
pub fn quantize(meters: f32) -> i16 {
    let scaled = (meters * POSITION_SCALE).clamp(i16::MIN as f32, i16::MAX as f32);
    scaled.round() as i16
}

#[inline]
pub fn dequantize(q: i16) -> f32 {
    q as f32 / POSITION_SCALE
}

pub fn quantize_vec3(v: Vec3) -> [i16; 3] {
    [quantize(v.x), quantize(v.y), quantize(v.z)]
}

pub fn dequantize_vec3(q: [i16; 3]) -> Vec3 {
    Vec3::new(dequantize(q[0]), dequantize(q[1]), dequantize(q[2]))
}

pub fn quantize_health(health: f32) -> u8 {
    (((health / MAX_HEALTH) * 255.0) as i32).clamp(0, 255) as u8
}

pub fn dequantize_health(byte: u8) -> f32 {
    (byte as f32 / 255.0) * MAX_HEALTH
}

/// Ammo, cash and score travel as u16 capped below the type maximum.
pub fn clamp_counter(value: i32) -> u16 {
    value.clamp(0, ECONOMY_MAX) as u16
}

pub fn clamp_delta(value: i32) -> i8 {
    value.clamp(-DELTA_LIMIT, DELTA_LIMIT) as i8
}

pub fn clamp_join_seconds(seconds: f64) -> u16 {
    (seconds as i32).clamp(0, JOIN_SECONDS_MAX) as u16
}
