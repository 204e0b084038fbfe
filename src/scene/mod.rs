//! Scene Registry
//!
//! Arena-backed storage for the entities the resource layer consumes:
//! - `transform`: position, rotation and scale
//! - `light`: light sources bound to transforms
//! - `camera`: the per-frame view point
//!
//! Transforms and lights live in slot maps addressed by generational
//! handles, so a handle kept past removal is detectably stale instead of
//! dangling.

pub mod camera;
pub mod light;
pub mod transform;

use slotmap::{SlotMap, new_key_type};

pub use camera::Camera;
pub use light::{Light, LightKind};
pub use transform::Transform;

new_key_type! {
    /// Handle to a [`Transform`] in a [`SceneRegistry`].
    pub struct TransformHandle;
    /// Handle to a [`Light`] in a [`SceneRegistry`].
    pub struct LightHandle;
}

/// Arena of scene entities.
#[derive(Debug, Default)]
pub struct SceneRegistry {
    transforms: SlotMap<TransformHandle, Transform>,
    lights: SlotMap<LightHandle, Light>,
}

impl SceneRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transform(&mut self, transform: Transform) -> TransformHandle {
        self.transforms.insert(transform)
    }

    #[must_use]
    pub fn transform(&self, handle: TransformHandle) -> Option<&Transform> {
        self.transforms.get(handle)
    }

    pub fn transform_mut(&mut self, handle: TransformHandle) -> Option<&mut Transform> {
        self.transforms.get_mut(handle)
    }

    pub fn remove_transform(&mut self, handle: TransformHandle) -> Option<Transform> {
        self.transforms.remove(handle)
    }

    pub fn add_light(&mut self, light: Light) -> LightHandle {
        self.lights.insert(light)
    }

    #[must_use]
    pub fn light(&self, handle: LightHandle) -> Option<&Light> {
        self.lights.get(handle)
    }

    pub fn light_mut(&mut self, handle: LightHandle) -> Option<&mut Light> {
        self.lights.get_mut(handle)
    }

    pub fn remove_light(&mut self, handle: LightHandle) -> Option<Light> {
        self.lights.remove(handle)
    }

    /// All live lights with their handles.
    pub fn lights(&self) -> impl Iterator<Item = (LightHandle, &Light)> {
        self.lights.iter()
    }

    #[must_use]
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }
}
