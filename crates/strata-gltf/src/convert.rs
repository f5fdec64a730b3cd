//! Basis change from glTF's right-handed Y-up frame into Strata's Z-up frame.
//!
//! The change swaps the Y and Z axes. It is applied while reading, so every
//! consumer of accessor data and node transforms sees converted values.

use glam::{Mat4, Quat, Vec3, Vec4};

const BASIS: Mat4 = Mat4::from_cols(Vec4::X, Vec4::Z, Vec4::Y, Vec4::W);

pub fn convert_vec3(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

pub fn convert_quat(q: Quat) -> Quat {
    Quat::from_xyzw(-q.x, -q.z, -q.y, q.w)
}

pub fn convert_mat4(m: Mat4) -> Mat4 {
    BASIS * m * BASIS
}

/// Translation, rotation and scale of a node, already in the converted frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Decompose a matrix. A negative determinant is folded into the X scale.
    pub fn from_matrix(m: Mat4) -> Self {
        let (scale, rotation, translation) = m.to_scale_rotation_translation();
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }

    /// From a column-major glTF `matrix`.
    pub fn from_gltf_matrix(columns: &[f32; 16]) -> Self {
        Self::from_matrix(convert_mat4(Mat4::from_cols_array(columns)))
    }

    /// From glTF `translation`/`rotation`/`scale` fields.
    pub fn from_gltf_trs(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        let rotation = Quat::from_array(rotation);
        let rotation = if rotation.length_squared() > 0.0 {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        };
        Self {
            translation: convert_vec3(Vec3::from_array(translation)),
            rotation: convert_quat(rotation),
            scale: convert_vec3(Vec3::from_array(scale)),
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn is_identity(&self) -> bool {
        const TOLERANCE: f32 = 1e-6;
        self.translation.abs_diff_eq(Vec3::ZERO, TOLERANCE)
            && self.scale.abs_diff_eq(Vec3::ONE, TOLERANCE)
            && (self.rotation.abs_diff_eq(Quat::IDENTITY, TOLERANCE)
                || self.rotation.abs_diff_eq(-Quat::IDENTITY, TOLERANCE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_swaps_y_and_z() {
        assert_eq!(convert_vec3(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 3.0, 2.0));
    }

    #[test]
    fn test_matrix_and_trs_agree() {
        let rotation = Quat::from_rotation_y(0.7);
        let m = Mat4::from_scale_rotation_translation(Vec3::new(1.0, 2.0, 3.0), rotation, Vec3::new(4.0, 5.0, 6.0));
        let from_matrix = Transform::from_gltf_matrix(&m.to_cols_array());
        let from_trs = Transform::from_gltf_trs([4.0, 5.0, 6.0], rotation.to_array(), [1.0, 2.0, 3.0]);

        assert!(from_matrix.translation.abs_diff_eq(from_trs.translation, 1e-5));
        assert!(from_matrix.scale.abs_diff_eq(from_trs.scale, 1e-5));
        assert!(from_matrix.to_matrix().abs_diff_eq(from_trs.to_matrix(), 1e-5));
    }

    #[test]
    fn test_converted_point_matches_converted_matrix() {
        let m = Mat4::from_rotation_translation(Quat::from_rotation_x(0.3), Vec3::new(1.0, -2.0, 0.5));
        let p = Vec3::new(0.2, 0.4, 0.8);
        let expected = convert_vec3(m.transform_point3(p));
        let actual = convert_mat4(m).transform_point3(convert_vec3(p));
        assert!(expected.abs_diff_eq(actual, 1e-5));
    }

    #[test]
    fn test_identity_detection() {
        assert!(Transform::IDENTITY.is_identity());
        assert!(Transform::from_gltf_trs([0.0; 3], [0.0, 0.0, 0.0, 1.0], [1.0; 3]).is_identity());
        assert!(!Transform::from_gltf_trs([0.0, 1.0, 0.0], [0.0, 0.0, 0.0, 1.0], [1.0; 3]).is_identity());
    }
}
