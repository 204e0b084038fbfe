//! Texture Resources
//!
//! A [`Texture`] is either *hollow* (metadata only, as restored from a
//! serialized index) or *device-resident* (pixels decoded and uploaded).
//! Decoded bytes are transient; once uploaded they live on the device and
//! the host copy is dropped. The serialized form, [`TextureMeta`], never
//! carries pixel data.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rhi::{GpuHandle, RawHandle};

/// Semantic slot a texture feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureKind {
    Albedo,
    Roughness,
    Metallic,
    Normal,
    Height,
    Occlusion,
    Emission,
    Mask,
    CubeMap,
}

/// Serialized description of a cached texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureMeta {
    pub id: Uuid,
    pub name: String,
    pub path: Option<String>,
    pub kind: TextureKind,
    pub width: u32,
    pub height: u32,
}

/// One texture owned by the texture cache.
///
/// Identity is the `id`; file-backed textures additionally carry a unique
/// `path`. Device residency is interior-mutable so a hollow texture can be
/// hydrated in place without disturbing `Arc`s already handed out.
#[derive(Debug)]
pub struct Texture {
    id: Uuid,
    name: String,
    path: Option<String>,
    kind: TextureKind,
    width: u32,
    height: u32,
    gpu: Mutex<Option<GpuHandle>>,
}

impl Texture {
    /// A texture that is already on the device.
    pub(crate) fn new_resident(
        name: String,
        path: Option<String>,
        kind: TextureKind,
        width: u32,
        height: u32,
        gpu: GpuHandle,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            path,
            kind,
            width,
            height,
            gpu: Mutex::new(Some(gpu)),
        }
    }

    /// A programmatically created placeholder with no payload yet.
    pub(crate) fn new_empty(name: String, kind: TextureKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            path: None,
            kind,
            width: 0,
            height: 0,
            gpu: Mutex::new(None),
        }
    }

    /// A hollow texture restored from serialized metadata.
    pub(crate) fn from_meta(meta: TextureMeta) -> Self {
        Self {
            id: meta.id,
            name: meta.name,
            path: meta.path,
            kind: meta.kind,
            width: meta.width,
            height: meta.height,
            gpu: Mutex::new(None),
        }
    }

    /// Attaches the uploaded device allocation to a hollow texture.
    pub(crate) fn attach_gpu(&self, gpu: GpuHandle) {
        *self.gpu.lock() = Some(gpu);
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel payload currently lives on the device.
    #[must_use]
    pub fn is_resident(&self) -> bool {
        self.gpu.lock().is_some()
    }

    /// Backend handle of the device texture, for binding.
    #[must_use]
    pub fn gpu_handle(&self) -> Option<RawHandle> {
        self.gpu.lock().as_ref().and_then(GpuHandle::raw)
    }

    /// The serializable part of this texture.
    #[must_use]
    pub fn meta(&self) -> TextureMeta {
        TextureMeta {
            id: self.id,
            name: self.name.clone(),
            path: self.path.clone(),
            kind: self.kind,
            width: self.width,
            height: self.height,
        }
    }
}
