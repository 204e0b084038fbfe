//! Lighting Constant-Buffer Updater
//!
//! Bridges the scene registry and the deferred lighting shader: once per
//! frame, [`LightingPass::update`] classifies the frame's lights by type,
//! packs them into the fixed-size [`LightingUniforms`] payload and rewrites
//! the pass's constant buffer through the mapping guard.
//!
//! Capacity is bounded: at most [`MAX_POINT_LIGHTS`] point and
//! [`MAX_SPOT_LIGHTS`] spot lights land in the payload. Extra lights are
//! dropped, the counts reflect only written entries, and one warning per
//! affected update goes to the logger. The frame still renders.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::errors::{Result, RheaError};
use crate::logging::Logger;
use crate::resources::shader::ShaderVariation;
use crate::rhi::{ConstantBuffer, DeviceRef};
use crate::scene::{Camera, LightHandle, LightKind, SceneRegistry};

/// Point-light slots in the payload.
pub const MAX_POINT_LIGHTS: usize = 64;
/// Spot-light slots in the payload.
pub const MAX_SPOT_LIGHTS: usize = 64;

/// The lighting pass constant buffer, exactly as the shader reads it.
///
/// Everything is `Vec4`-aligned; intensities ride in the free lanes of
/// their light's parameter vector. Slots beyond the written counts stay
/// zero, so the shader can sample them safely.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightingUniforms {
    pub camera_position: Vec4,
    /// Fullscreen-quad transform for the resolve draw.
    pub world_view_projection: Mat4,
    pub view_projection_inverse: Mat4,

    pub dir_light_color: Vec4,
    pub dir_light_intensity: Vec4,
    pub dir_light_direction: Vec4,

    pub point_light_position: [Vec4; MAX_POINT_LIGHTS],
    pub point_light_color: [Vec4; MAX_POINT_LIGHTS],
    /// `(intensity, range, 0, 0)` per slot.
    pub point_light_intensity_range: [Vec4; MAX_POINT_LIGHTS],

    pub spot_light_color: [Vec4; MAX_SPOT_LIGHTS],
    pub spot_light_position: [Vec4; MAX_SPOT_LIGHTS],
    pub spot_light_direction: [Vec4; MAX_SPOT_LIGHTS],
    /// `(intensity, range, angle, 0)` per slot.
    pub spot_light_intensity_range_angle: [Vec4; MAX_SPOT_LIGHTS],

    pub point_light_count: f32,
    pub spot_light_count: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub viewport: Vec2,
    pub padding: Vec2,
}

/// Owns the deferred lighting shader binding and its constant buffer.
pub struct LightingPass {
    shader: Arc<ShaderVariation>,
    cbuffer: ConstantBuffer,
    log: Logger,
}

impl LightingPass {
    pub fn new(device: &DeviceRef, shader: Arc<ShaderVariation>, log: Logger) -> Result<Self> {
        let cbuffer = ConstantBuffer::create(device, "lighting pass", size_of::<LightingUniforms>())?;
        Ok(Self {
            shader,
            cbuffer,
            log,
        })
    }

    #[must_use]
    pub fn shader(&self) -> &Arc<ShaderVariation> {
        &self.shader
    }

    #[must_use]
    pub fn buffer(&self) -> &ConstantBuffer {
        &self.cbuffer
    }

    /// Repacks the frame's lights and rewrites the constant buffer.
    ///
    /// An uncompiled shader is an error and writes nothing. A missing
    /// camera or an empty light list is a quiet no-op that keeps the
    /// previous contents. Stale handles are skipped with a warning.
    pub fn update(
        &mut self,
        registry: &SceneRegistry,
        lights: &[LightHandle],
        camera: Option<&Camera>,
        viewport: Vec2,
    ) -> Result<()> {
        if !self.shader.is_compiled() {
            self.log.error(&format!(
                "lighting pass shader {} is not compiled",
                self.shader.id()
            ));
            return Err(RheaError::ShaderNotCompiled {
                variation: self.shader.id().to_owned(),
            });
        }
        let Some(camera) = camera else {
            return Ok(());
        };
        if lights.is_empty() {
            return Ok(());
        }

        let mut payload = LightingUniforms::zeroed();
        payload.camera_position = camera.position.extend(1.0);
        payload.world_view_projection = quad_transform(camera, viewport);
        payload.view_projection_inverse = camera.view_projection().inverse();

        let mut point_count = 0;
        let mut spot_count = 0;
        let mut dropped = 0usize;

        for &handle in lights {
            let Some(light) = registry.light(handle) else {
                self.log.warn("stale light handle skipped");
                continue;
            };
            let Some(transform) = registry.transform(light.transform) else {
                self.log.warn("light without a live transform skipped");
                continue;
            };

            match light.kind {
                // One directional slot; the last one in the list wins.
                LightKind::Directional => {
                    payload.dir_light_color = light.color.extend(1.0);
                    payload.dir_light_intensity = Vec4::splat(light.intensity);
                    payload.dir_light_direction = transform.forward().extend(0.0);
                }
                LightKind::Point { range } => {
                    if point_count == MAX_POINT_LIGHTS {
                        dropped += 1;
                        continue;
                    }
                    payload.point_light_position[point_count] = transform.position.extend(1.0);
                    payload.point_light_color[point_count] = light.color.extend(1.0);
                    payload.point_light_intensity_range[point_count] =
                        Vec4::new(light.intensity, range, 0.0, 0.0);
                    point_count += 1;
                }
                LightKind::Spot { range, angle } => {
                    if spot_count == MAX_SPOT_LIGHTS {
                        dropped += 1;
                        continue;
                    }
                    payload.spot_light_color[spot_count] = light.color.extend(1.0);
                    payload.spot_light_position[spot_count] = transform.position.extend(1.0);
                    payload.spot_light_direction[spot_count] = transform.forward().extend(0.0);
                    payload.spot_light_intensity_range_angle[spot_count] =
                        Vec4::new(light.intensity, range, angle, 0.0);
                    spot_count += 1;
                }
            }
        }

        if dropped > 0 {
            self.log.warn(&format!(
                "{dropped} lights over capacity were dropped this update"
            ));
        }

        payload.point_light_count = point_count as f32;
        payload.spot_light_count = spot_count as f32;
        payload.near_plane = camera.near;
        payload.far_plane = camera.far;
        payload.viewport = viewport;

        let mut mapped = self.cbuffer.map()?;
        mapped.bytes().copy_from_slice(bytemuck::bytes_of(&payload));
        Ok(())
    }
}

/// Transform of the fullscreen quad the resolve pass rasterizes: viewport
/// orthographic projection over a base view sitting at the near plane,
/// world left as identity.
///
/// The matrix stays finite for any input: a zero near plane would put the
/// eye on the look-at target and a zero viewport would collapse the
/// orthographic volume, so both are clamped away.
fn quad_transform(camera: &Camera, viewport: Vec2) -> Mat4 {
    let near = camera.near.max(1e-4);
    let far = camera.far.max(near + 1e-4);
    let half = (viewport * 0.5).max(Vec2::splat(0.5));
    let ortho = Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, near, far);
    let base_view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, near), Vec3::ZERO, Vec3::Y);
    ortho * base_view
}
