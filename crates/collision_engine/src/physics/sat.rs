//! Separating Axis Theorem test between two oriented boxes
//!
//! Two convex shapes are disjoint iff some axis exists onto which their
//! projections do not overlap. For a pair of boxes it is enough to try
//! fifteen candidates: the three face normals of each box and the nine cross
//! products of one edge direction from each box.
//!
//! The box axes are the columns of the upper-left 3x3 block of each model
//! matrix and are used as-is, without normalization, while the half widths
//! stay in model space. The test is therefore exact only for rigid
//! transforms (rotation and translation, scale 1). Any other scale, uniform
//! or not, stretches the projected center distance and the rotation terms
//! but not the half widths, so scaled boxes can be misclassified.

use super::bounding_volume::BoundingVolume;
use crate::foundation::math::{utils, Mat3, Mat4, Vec3, EPSILON};

/// Outcome of a SAT query
///
/// `NoSeparatingAxis` means the boxes overlap. Every other value names the
/// first axis that was found to separate them, in test order: face normals
/// of A, face normals of B, then the edge cross products `A_i x B_j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SatResult {
    /// No axis separates the boxes
    NoSeparatingAxis,
    /// A's local X axis
    Ax,
    /// A's local Y axis
    Ay,
    /// A's local Z axis
    Az,
    /// B's local X axis
    Bx,
    /// B's local Y axis
    By,
    /// B's local Z axis
    Bz,
    /// A's X cross B's X
    AxBx,
    /// A's X cross B's Y
    AxBy,
    /// A's X cross B's Z
    AxBz,
    /// A's Y cross B's X
    AyBx,
    /// A's Y cross B's Y
    AyBy,
    /// A's Y cross B's Z
    AyBz,
    /// A's Z cross B's X
    AzBx,
    /// A's Z cross B's Y
    AzBy,
    /// A's Z cross B's Z
    AzBz,
}

impl SatResult {
    fn face_a(i: usize) -> Self {
        match i {
            0 => Self::Ax,
            1 => Self::Ay,
            2 => Self::Az,
            _ => unreachable!("box axis index {i} out of range"),
        }
    }

    fn face_b(i: usize) -> Self {
        match i {
            0 => Self::Bx,
            1 => Self::By,
            2 => Self::Bz,
            _ => unreachable!("box axis index {i} out of range"),
        }
    }

    fn edge_cross(i: usize, j: usize) -> Self {
        match (i, j) {
            (0, 0) => Self::AxBx,
            (0, 1) => Self::AxBy,
            (0, 2) => Self::AxBz,
            (1, 0) => Self::AyBx,
            (1, 1) => Self::AyBy,
            (1, 2) => Self::AyBz,
            (2, 0) => Self::AzBx,
            (2, 1) => Self::AzBy,
            (2, 2) => Self::AzBz,
            _ => unreachable!("box axis pair ({i}, {j}) out of range"),
        }
    }

    /// True when some axis separates the boxes
    pub fn is_separated(self) -> bool {
        self != Self::NoSeparatingAxis
    }

    /// Separated along one of A's face normals
    pub fn is_face_a(self) -> bool {
        matches!(self, Self::Ax | Self::Ay | Self::Az)
    }

    /// Separated along one of B's face normals
    pub fn is_face_b(self) -> bool {
        matches!(self, Self::Bx | Self::By | Self::Bz)
    }

    /// Separated along an edge-edge cross product
    pub fn is_edge_cross(self) -> bool {
        self.is_separated() && !self.is_face_a() && !self.is_face_b()
    }

    /// World-space direction of the separating axis, `None` when overlapping
    ///
    /// Not normalized. Used by debug drawing to orient the separating plane.
    pub fn axis(self, a: &BoundingVolume, b: &BoundingVolume) -> Option<Vec3> {
        let a_axes = box_axes(a.model_matrix());
        let b_axes = box_axes(b.model_matrix());

        let axis = match self {
            Self::NoSeparatingAxis => return None,
            Self::Ax => a_axes[0],
            Self::Ay => a_axes[1],
            Self::Az => a_axes[2],
            Self::Bx => b_axes[0],
            Self::By => b_axes[1],
            Self::Bz => b_axes[2],
            Self::AxBx => a_axes[0].cross(&b_axes[0]),
            Self::AxBy => a_axes[0].cross(&b_axes[1]),
            Self::AxBz => a_axes[0].cross(&b_axes[2]),
            Self::AyBx => a_axes[1].cross(&b_axes[0]),
            Self::AyBy => a_axes[1].cross(&b_axes[1]),
            Self::AyBz => a_axes[1].cross(&b_axes[2]),
            Self::AzBx => a_axes[2].cross(&b_axes[0]),
            Self::AzBy => a_axes[2].cross(&b_axes[1]),
            Self::AzBz => a_axes[2].cross(&b_axes[2]),
        };
        Some(axis)
    }
}

fn box_axes(model: &Mat4) -> [Vec3; 3] {
    [
        utils::basis_axis(model, 0),
        utils::basis_axis(model, 1),
        utils::basis_axis(model, 2),
    ]
}

/// Run the 15-axis test, returning the first separating axis found
pub fn separating_axis_test(a: &BoundingVolume, b: &BoundingVolume) -> SatResult {
    let a_axes = box_axes(a.model_matrix());
    let b_axes = box_axes(b.model_matrix());
    let ea = a.half_width();
    let eb = b.half_width();

    // Rotation expressing B in A's frame
    let mut r = Mat3::zeros();
    for i in 0..3 {
        for j in 0..3 {
            r[(i, j)] = a_axes[i].dot(&b_axes[j]);
        }
    }

    // Translation between centers, in A's frame
    let t = b.center_global() - a.center_global();
    let t = Vec3::new(t.dot(&a_axes[0]), t.dot(&a_axes[1]), t.dot(&a_axes[2]));

    // Epsilon keeps parallel edges (null cross product) from separating
    let abs_r = r.abs().add_scalar(EPSILON);

    // L = A0, A1, A2
    for i in 0..3 {
        let ra = ea[i];
        let rb = eb[0] * abs_r[(i, 0)] + eb[1] * abs_r[(i, 1)] + eb[2] * abs_r[(i, 2)];
        if t[i].abs() > ra + rb {
            return SatResult::face_a(i);
        }
    }

    // L = B0, B1, B2
    for i in 0..3 {
        let ra = ea[0] * abs_r[(0, i)] + ea[1] * abs_r[(1, i)] + ea[2] * abs_r[(2, i)];
        let rb = eb[i];
        let distance = t[0] * r[(0, i)] + t[1] * r[(1, i)] + t[2] * r[(2, i)];
        if distance.abs() > ra + rb {
            return SatResult::face_b(i);
        }
    }

    // L = Ai x Bj
    for i in 0..3 {
        let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
        for j in 0..3 {
            let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
            let ra = ea[i1] * abs_r[(i2, j)] + ea[i2] * abs_r[(i1, j)];
            let rb = eb[j1] * abs_r[(i, j2)] + eb[j2] * abs_r[(i, j1)];
            let distance = t[i2] * r[(i1, j)] - t[i1] * r[(i2, j)];
            if distance.abs() > ra + rb {
                return SatResult::edge_cross(i, j);
            }
        }
    }

    SatResult::NoSeparatingAxis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants::QUARTER_PI, Mat4Ext};

    fn unit_cube_at(center: Vec3) -> BoundingVolume {
        let mut volume = BoundingVolume::from_center_extents(Vec3::zeros(), Vec3::new(0.5, 0.5, 0.5));
        volume.set_model_matrix(Mat4::new_translation(&center));
        volume
    }

    fn cube(half: f32, model: Mat4) -> BoundingVolume {
        let mut volume = BoundingVolume::from_center_extents(Vec3::zeros(), Vec3::new(half, half, half));
        volume.set_model_matrix(model);
        volume
    }

    #[test]
    fn test_identical_cubes_overlap() {
        let a = unit_cube_at(Vec3::new(1.0, 2.0, 3.0));
        let b = unit_cube_at(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(separating_axis_test(&a, &b), SatResult::NoSeparatingAxis);
    }

    #[test]
    fn test_disjoint_on_x_reports_face_ax() {
        // A spans x in [0, 1], B spans x in [3, 4]
        let a = unit_cube_at(Vec3::new(0.5, 0.5, 0.5));
        let b = unit_cube_at(Vec3::new(3.5, 0.5, 0.5));

        let result = separating_axis_test(&a, &b);
        assert_eq!(result, SatResult::Ax);
        assert!(result.is_face_a());
        assert!(!result.is_edge_cross());
    }

    #[test]
    fn test_disjoint_on_y_and_z() {
        let a = unit_cube_at(Vec3::zeros());
        assert_eq!(separating_axis_test(&a, &unit_cube_at(Vec3::new(0.0, -2.0, 0.0))), SatResult::Ay);
        assert_eq!(separating_axis_test(&a, &unit_cube_at(Vec3::new(0.0, 0.0, 2.0))), SatResult::Az);
    }

    #[test]
    fn test_face_of_b_separates() {
        // B is a thin slab tilted 45 degrees about Z, hovering over the cube
        // A along the slab normal. A's own faces all overlap it.
        let a = unit_cube_at(Vec3::zeros());
        let mut b = BoundingVolume::from_center_extents(Vec3::zeros(), Vec3::new(2.0, 0.1, 2.0));
        b.set_model_matrix(
            Mat4::new_translation(&Vec3::new(-0.75, 0.75, 0.0)) * Mat4::rotation_z(QUARTER_PI),
        );

        let result = separating_axis_test(&a, &b);
        assert_eq!(result, SatResult::By);
        assert!(result.is_face_b());

        // Swapping the roles turns the same plane into a face of A
        assert_eq!(separating_axis_test(&b, &a), SatResult::Ay);
    }

    #[test]
    fn test_touching_faces_are_not_separated() {
        let a = unit_cube_at(Vec3::zeros());
        let b = unit_cube_at(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(separating_axis_test(&a, &b), SatResult::NoSeparatingAxis);
    }

    #[test]
    fn test_edge_cross_axis_separates() {
        // A is turned 45 degrees about Z, B 45 degrees about Y, so A presents
        // an edge along Z and B an edge along Y. The boxes face each other
        // edge to edge and only the cross product of those edges splits them.
        let a = cube(1.0, Mat4::rotation_z(QUARTER_PI));
        let b = cube(
            1.0,
            Mat4::new_translation(&Vec3::new(3.0, 0.0, 0.0)) * Mat4::rotation_y(QUARTER_PI),
        );

        let result = separating_axis_test(&a, &b);
        assert!(result.is_separated());
        assert!(result.is_edge_cross(), "expected an edge axis, got {result:?}");
        assert_eq!(result, SatResult::AzBy);

        let axis = result.axis(&a, &b).unwrap().normalize();
        assert!(axis.x.abs() > 0.999);
    }

    #[test]
    fn test_edge_pair_close_enough_overlaps() {
        let a = cube(1.0, Mat4::rotation_z(QUARTER_PI));
        let b = cube(
            1.0,
            Mat4::new_translation(&Vec3::new(2.7, 0.0, 0.0)) * Mat4::rotation_y(QUARTER_PI),
        );
        assert_eq!(separating_axis_test(&a, &b), SatResult::NoSeparatingAxis);
    }

    #[test]
    fn test_parallel_edges_do_not_spuriously_separate() {
        // Same orientation: every cross product is (near) null
        let model = Mat4::rotation_x(0.3) * Mat4::rotation_y(1.1);
        let a = cube(1.0, model);
        let b = cube(1.0, Mat4::new_translation(&Vec3::new(0.5, 0.25, -0.25)) * model);
        assert_eq!(separating_axis_test(&a, &b), SatResult::NoSeparatingAxis);
    }

    #[test]
    fn test_result_is_order_independent_for_overlap() {
        let a = cube(1.0, Mat4::rotation_x(0.7));
        let b = cube(0.5, Mat4::new_translation(&Vec3::new(1.2, 0.3, 0.0)) * Mat4::rotation_z(0.4));
        assert_eq!(
            separating_axis_test(&a, &b).is_separated(),
            separating_axis_test(&b, &a).is_separated()
        );
    }

    #[test]
    fn test_axis_for_overlap_is_none() {
        let a = unit_cube_at(Vec3::zeros());
        assert!(SatResult::NoSeparatingAxis.axis(&a, &a).is_none());
    }

    #[test]
    fn test_unscaled_boxes_of_scaled_size_overlap() {
        // World size matches the scaled pair below
        let a = cube(2.0, Mat4::identity());
        let b = cube(2.0, Mat4::new_translation(&Vec3::new(3.0, 0.0, 0.0)));
        assert_eq!(separating_axis_test(&a, &b), SatResult::NoSeparatingAxis);
    }

    #[test]
    fn test_uniform_scale_reports_separation_for_overlapping_boxes() {
        // World AABBs are x in [-2, 2] and [1, 5]; half widths stay at 1
        let a = cube(1.0, Mat4::new_scaling(2.0));
        let b = cube(1.0, Mat4::new_translation(&Vec3::new(3.0, 0.0, 0.0)) * Mat4::new_scaling(2.0));

        assert!(a.global_aabb().intersects(&b.global_aabb()));
        assert_eq!(separating_axis_test(&a, &b), SatResult::Ax);
    }

    #[test]
    fn test_non_uniform_scale_reports_separation_for_overlapping_boxes() {
        // B is stretched to x in [-0.5, 5.5] and overlaps A
        let a = cube(1.0, Mat4::identity());
        let b = cube(
            1.0,
            Mat4::new_translation(&Vec3::new(2.5, 0.0, 0.0)) * Mat4::new_nonuniform_scaling(&Vec3::new(3.0, 1.0, 1.0)),
        );

        assert!(a.global_aabb().intersects(&b.global_aabb()));
        assert_eq!(separating_axis_test(&a, &b), SatResult::Bx);
    }
}
