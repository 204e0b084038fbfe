//! Shader Variations
//!
//! A [`ShaderVariation`] is one compiled program specialization for a
//! material feature set. Variations live inside the shader cache and are
//! handed out as `Arc`s; equal feature sets always resolve to the same
//! instance, so pipeline state can be compared by pointer.

use std::fmt;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};
use parking_lot::Mutex;

use crate::errors::{Result, RheaError};
use crate::rhi::{ConstantBuffer, GpuHandle, RawHandle};

use super::features::MaterialFeatures;

/// Compilation lifecycle of a variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompileStatus {
    /// Build is in flight; not yet usable for drawing.
    Pending,
    /// Both stages compiled; usable.
    Compiled,
    /// Compilation failed; cached so the failure is not retried.
    Failed,
}

/// Per-material shading parameters uploaded to the variation's own
/// constant buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialParams {
    pub albedo_color: Vec4,
    pub uv_tiling: Vec2,
    pub uv_offset: Vec2,
    pub roughness: f32,
    pub metallic: f32,
    pub occlusion: f32,
    pub height_scale: f32,
}

impl Default for MaterialParams {
    fn default() -> Self {
        Self {
            albedo_color: Vec4::ONE,
            uv_tiling: Vec2::ONE,
            uv_offset: Vec2::ZERO,
            roughness: 1.0,
            metallic: 0.0,
            occlusion: 1.0,
            height_scale: 0.0,
        }
    }
}

/// One compiled program specialization.
pub struct ShaderVariation {
    id: String,
    features: MaterialFeatures,
    status: CompileStatus,
    vertex_module: Option<Arc<GpuHandle>>,
    pixel_module: Option<Arc<GpuHandle>>,
    material_buffer: Option<Mutex<ConstantBuffer>>,
}

impl ShaderVariation {
    /// A fully built variation. Module handles come from the cache's module
    /// library and may be shared across variations.
    pub(crate) fn compiled(
        features: MaterialFeatures,
        vertex_module: Arc<GpuHandle>,
        pixel_module: Arc<GpuHandle>,
        material_buffer: ConstantBuffer,
    ) -> Self {
        Self {
            id: features.fingerprint(),
            features,
            status: CompileStatus::Compiled,
            vertex_module: Some(vertex_module),
            pixel_module: Some(pixel_module),
            material_buffer: Some(Mutex::new(material_buffer)),
        }
    }

    /// A variation whose build failed. Cached so repeated requests do not
    /// retry the compiler.
    pub(crate) fn failed(features: MaterialFeatures) -> Self {
        Self {
            id: features.fingerprint(),
            features,
            status: CompileStatus::Failed,
            vertex_module: None,
            pixel_module: None,
            material_buffer: None,
        }
    }

    /// Canonical fingerprint, also the cache key.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn features(&self) -> MaterialFeatures {
        self.features
    }

    #[must_use]
    pub fn status(&self) -> CompileStatus {
        self.status
    }

    #[must_use]
    pub fn is_compiled(&self) -> bool {
        self.status == CompileStatus::Compiled
    }

    #[must_use]
    pub fn vertex_module(&self) -> Option<&Arc<GpuHandle>> {
        self.vertex_module.as_ref()
    }

    #[must_use]
    pub fn pixel_module(&self) -> Option<&Arc<GpuHandle>> {
        self.pixel_module.as_ref()
    }

    /// Uploads `params` to the variation's material buffer.
    ///
    /// Fails with [`RheaError::ShaderNotCompiled`] on variations without a
    /// built program.
    pub fn set_material_params(&self, params: &MaterialParams) -> Result<()> {
        let Some(buffer) = &self.material_buffer else {
            return Err(RheaError::ShaderNotCompiled {
                variation: self.id.clone(),
            });
        };
        let mut buffer = buffer.lock();
        let mut mapped = buffer.map()?;
        mapped.bytes().copy_from_slice(bytemuck::bytes_of(params));
        Ok(())
    }

    /// Backend handle of the material buffer, for binding.
    #[must_use]
    pub fn material_buffer_handle(&self) -> Option<RawHandle> {
        self.material_buffer
            .as_ref()
            .and_then(|buffer| buffer.lock().gpu().raw())
    }
}

impl fmt::Debug for ShaderVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderVariation")
            .field("id", &self.id)
            .field("features", &self.features)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
