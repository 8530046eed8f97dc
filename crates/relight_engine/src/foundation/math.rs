//! Math utilities and types
//!
//! Light placement only needs a handful of vector types; colors live in
//! [`crate::foundation::color`].

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// World-space down axis, the default direction of a freshly created light
pub fn down() -> Vec3 {
    Vec3::new(0.0, -1.0, 0.0)
}

/// Normalize `v`, falling back to [`down`] for degenerate input
pub fn normalize_or_down(v: Vec3) -> Vec3 {
    v.try_normalize(f32::EPSILON).unwrap_or_else(down)
}
