//! Math types and glam re-exports.
//!
//! The glam types are re-exported so scene code does not need to depend on it
//! directly. [`Transform`] is the component the hierarchy pass reads and
//! writes.

pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

/// Local translation, rotation and scale of an entity, plus the world matrix
/// last computed by [`propagate_transforms`](crate::ecs::hierarchy::propagate_transforms).
///
/// Only the local fields are meant to be edited; `world` is overwritten on
/// every propagation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub world: Mat4,
}

impl Transform {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
        world: Mat4::IDENTITY,
    };

    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self::from_translation(Vec3::new(x, y, z))
    }

    /// Create a transform at the given 2D position (z = 0).
    pub fn from_xy(x: f32, y: f32) -> Self {
        Self::from_xyz(x, y, 0.0)
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Return a copy with uniform scale applied.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// The local `T * R * S` matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Translation column of the world matrix.
    pub fn world_translation(&self) -> Vec3 {
        self.world.w_axis.truncate()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_composes_trs() {
        let t = Transform::from_xyz(1.0, 2.0, 3.0)
            .with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2))
            .with_scale(2.0);
        // Unit X is scaled, rotated onto Y, then translated.
        let p = t.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(1.0, 4.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn world_translation_reads_world_matrix() {
        let mut t = Transform::default();
        assert_eq!(t.world_translation(), Vec3::ZERO);
        t.world = Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(t.world_translation(), Vec3::new(4.0, 5.0, 6.0));
    }
}
