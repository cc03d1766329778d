//! Axis conversion between the authoring convention and engine space.
//!
//! The authoring tool is right-handed with Z up and Y forward. The engine is
//! right-handed with Y up and -Z forward. The remap is a -90° turn about X:
//!
//! ```text
//! position:   (x, y, z)    -> (x, z, -y)
//! rotation:   (w, x, y, z) -> (w, x, z, -y)
//! ```
//!
//! Every raw coordinate crossing into the pipelines goes through this module
//! exactly once. Nothing else reorders components.

use glam::{Mat4, Quat, Vec3, Vec4};

/// Matrix form of [`to_engine_position`]
pub const ENGINE_FROM_SOURCE: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, -1.0, 0.0),
    Vec4::new(0.0, 1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.0, 1.0),
);

/// Matrix form of [`to_source_position`]
pub const SOURCE_FROM_ENGINE: Mat4 = Mat4::from_cols(
    Vec4::new(1.0, 0.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 1.0, 0.0),
    Vec4::new(0.0, -1.0, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 0.0, 1.0),
);

/// Convert an authoring-space position to engine space.
#[inline]
pub fn to_engine_position(p: Vec3) -> Vec3 {
    Vec3::new(p.x, p.z, -p.y)
}

/// Convert an authoring-space rotation to engine space.
#[inline]
pub fn to_engine_rotation(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, q.z, -q.y, q.w)
}

/// Inverse of [`to_engine_position`].
#[inline]
pub fn to_source_position(p: Vec3) -> Vec3 {
    Vec3::new(p.x, -p.z, p.y)
}

/// Inverse of [`to_engine_rotation`].
#[inline]
pub fn to_source_rotation(q: Quat) -> Quat {
    Quat::from_xyzw(q.x, -q.z, q.y, q.w)
}

/// Re-express a transform authored in engine axes in the source convention.
///
/// Import boundary for Y-up containers such as glTF, whose data has to be
/// handed to the pipelines in source axes.
#[inline]
pub fn to_source_matrix(m: Mat4) -> Mat4 {
    SOURCE_FROM_ENGINE * m * ENGINE_FROM_SOURCE
}
