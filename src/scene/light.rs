use glam::Vec3;

use super::TransformHandle;

/// Parameters specific to each light type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point {
        range: f32,
    },
    Spot {
        range: f32,
        /// Full cone angle, radians.
        angle: f32,
    },
}

/// A light source bound to a transform in the registry.
///
/// Position comes from the transform; direction is the transform's forward
/// axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
    pub transform: TransformHandle,
}

impl Light {
    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32, transform: TransformHandle) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Directional,
            transform,
        }
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, range: f32, transform: TransformHandle) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Point { range },
            transform,
        }
    }

    #[must_use]
    pub fn new_spot(
        color: Vec3,
        intensity: f32,
        range: f32,
        angle: f32,
        transform: TransformHandle,
    ) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Spot { range, angle },
            transform,
        }
    }
}
