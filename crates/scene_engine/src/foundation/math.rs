//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the matrix builders the scene hierarchy needs.
//! Rotations are authored in degrees by scene scripts and the control panel,
//! and converted to radians only when a matrix is built.

pub use nalgebra::{Matrix4, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// One of the three cartesian axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// Component index of this axis in a `Vec3`
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Parse an axis name (`x`, `y` or `z`, case-insensitive)
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "z" => Some(Self::Z),
            _ => None,
        }
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with the builders used by the scene hierarchy
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Rotate about X, then Y, then Z, with angles given in degrees.
    ///
    /// The result is `Rx * Ry * Rz`, so Z is applied to a vertex first.
    fn rotation_xyz_degrees(degrees: &Vec3) -> Mat4;

    /// `translate * Rx * Ry * Rz * scale`, rotation in degrees
    fn translate_rotate_scale(translate: &Vec3, rotate_degrees: &Vec3, scale: &Vec3) -> Mat4;

    /// World-space position of the local origin under this matrix
    fn origin(&self) -> Vec3;
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

    fn rotation_xyz_degrees(degrees: &Vec3) -> Mat4 {
        Self::rotation_x(utils::deg_to_rad(degrees.x))
            * Self::rotation_y(utils::deg_to_rad(degrees.y))
            * Self::rotation_z(utils::deg_to_rad(degrees.z))
    }

    fn translate_rotate_scale(translate: &Vec3, rotate_degrees: &Vec3, scale: &Vec3) -> Mat4 {
        Mat4::new_translation(translate)
            * Self::rotation_xyz_degrees(rotate_degrees)
            * Mat4::new_nonuniform_scaling(scale)
    }

    fn origin(&self) -> Vec3 {
        self.transform_point(&Point3::origin()).coords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_axis_parse() {
        assert_eq!(Axis::parse("x"), Some(Axis::X));
        assert_eq!(Axis::parse("Y"), Some(Axis::Y));
        assert_eq!(Axis::parse("z"), Some(Axis::Z));
        assert_eq!(Axis::parse("w"), None);
        assert_eq!(Axis::Z.index(), 2);
    }

    #[test]
    fn test_rotation_order_is_x_then_y_then_z() {
        let degrees = Vec3::new(90.0, 90.0, 0.0);
        let expected = Mat4::rotation_x(constants::PI / 2.0) * Mat4::rotation_y(constants::PI / 2.0);
        assert_relative_eq!(Mat4::rotation_xyz_degrees(&degrees), expected, epsilon = EPSILON);
    }

    #[test]
    fn test_translate_is_outermost() {
        let m = Mat4::translate_rotate_scale(
            &Vec3::new(5.0, 0.0, 0.0),
            &Vec3::new(0.0, 0.0, 90.0),
            &Vec3::new(2.0, 2.0, 2.0),
        );
        // (1,0,0) scaled to (2,0,0), rotated about Z to (0,2,0), then translated
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.coords, Vec3::new(5.0, 2.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(m.origin(), Vec3::new(5.0, 0.0, 0.0), epsilon = EPSILON);
    }
}
