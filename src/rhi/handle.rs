//! Owned Device Allocations
//!
//! [`GpuHandle`] pairs a backend [`RawHandle`] with the metadata the layer
//! above needs (byte size, format tag, dynamic flag) and pins down ownership:
//! one handle per allocation, destroyed exactly once, never cloned.

use std::fmt;

use super::device::{DeviceRef, RawHandle, TextureFormat};

/// Element width of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    /// Bytes per index element.
    #[must_use]
    pub const fn stride(self) -> u32 {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// What an allocation holds, carrying the format data needed to bind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceTag {
    IndexBuffer(IndexFormat),
    VertexBuffer { stride: u32 },
    UniformBuffer,
    ShaderModule,
    Texture(TextureFormat),
    Semaphore,
}

/// Sole owner of one device allocation.
///
/// Not cloneable. Dropping the handle destroys the allocation exactly once;
/// [`release`](Self::release) does it early and is idempotent. The handle
/// keeps its [`DeviceRef`] alive, so an allocation can never outlive the
/// device that minted it.
pub struct GpuHandle {
    raw: Option<RawHandle>,
    size: usize,
    tag: ResourceTag,
    dynamic: bool,
    device: DeviceRef,
}

impl GpuHandle {
    #[must_use]
    pub fn new(device: DeviceRef, raw: RawHandle, size: usize, tag: ResourceTag, dynamic: bool) -> Self {
        Self {
            raw: Some(raw),
            size,
            tag,
            dynamic,
            device,
        }
    }

    /// Backend handle, or `None` after [`release`](Self::release).
    #[inline]
    #[must_use]
    pub fn raw(&self) -> Option<RawHandle> {
        self.raw
    }

    /// Byte size of the allocation.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> ResourceTag {
        self.tag
    }

    #[inline]
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> &DeviceRef {
        &self.device
    }

    /// Destroys the allocation now instead of at drop. Safe to call twice.
    pub fn release(&mut self) {
        if let Some(raw) = self.raw.take() {
            self.device.destroy_resource(raw);
        }
    }
}

impl Drop for GpuHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for GpuHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuHandle")
            .field("raw", &self.raw)
            .field("size", &self.size)
            .field("tag", &self.tag)
            .field("dynamic", &self.dynamic)
            .finish_non_exhaustive()
    }
}
