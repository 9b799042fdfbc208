//! Math utilities and types
//!
//! Provides the fundamental math types used by the bounding volumes, the SAT
//! engine and the octree.

pub use nalgebra::{Matrix3, Matrix4, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Tolerance added by the SAT engine to each `|R[i][j]|` term
///
/// Keeps near-parallel edges (null cross product) from reporting a spurious
/// separation. The other overlap tests use no tolerance: separation always
/// needs a strict inequality, so touching shapes count as overlapping.
pub const EPSILON: f32 = f32::EPSILON;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Pi / 4
    pub const QUARTER_PI: f32 = PI * 0.25;
}

/// Math utility functions
pub mod utils {
    use super::{Mat4, Point3, Vec3};

    /// Apply an affine transform to a point
    pub fn transform_point(matrix: &Mat4, point: Vec3) -> Vec3 {
        matrix.transform_point(&Point3::from(point)).coords
    }

    /// Extract the i-th column of the upper-left 3x3 block.
    ///
    /// For a model matrix this is the world-space direction of the local
    /// axis `i`, scaled by whatever scale the matrix carries.
    pub fn basis_axis(matrix: &Mat4, i: usize) -> Vec3 {
        matrix.fixed_view::<3, 1>(0, i).into_owned()
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Translation followed by a per-axis scale of a unit primitive
    fn translate_scale(translation: Vec3, scale: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn translate_scale(translation: Vec3, scale: Vec3) -> Mat4 {
        Mat4::new_translation(&translation) * Mat4::new_nonuniform_scaling(&scale)
    }
}
