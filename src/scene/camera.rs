use glam::{Mat4, Vec3};

/// View point for a frame.
///
/// Plain data; the matrices are built at construction and read by the
/// constant-buffer updater once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Perspective camera at `position` looking toward `target`.
    ///
    /// The clip range must satisfy `0 < near < far`; a zero near plane
    /// degenerates the projection.
    #[must_use]
    pub fn new_perspective(
        position: Vec3,
        target: Vec3,
        fov_y_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        debug_assert!(near > 0.0 && far > near, "degenerate clip range {near}..{far}");
        Self {
            position,
            view: Mat4::look_at_rh(position, target, Vec3::Y),
            projection: Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect, near, far),
            near,
            far,
        }
    }

    /// Combined view-projection matrix.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}
