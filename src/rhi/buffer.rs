//! Index, Vertex and Constant Buffers
//!
//! Thin owners around one [`GpuHandle`] each, with the upload and mapping
//! discipline of the layer baked in:
//!
//! - **Static** buffers take their payload at creation (allocate, map, copy,
//!   unmap) and can never be mapped again.
//! - **Dynamic** buffers allocate empty and are rewritten through
//!   [`MappedBuffer`], an RAII guard that unmaps on every exit path. Their
//!   reported memory usage stays `0` until the first completed write.
//!
//! Element layout is explicit at the call site: an [`IndexFormat`] for index
//! buffers, a byte stride for vertex buffers. Draw-versus-write exclusion is
//! the caller's synchronization duty; these types only make *double mapping*
//! and *forgotten unmaps* unrepresentable.

use std::slice;

use crate::errors::{Result, RheaError};

use super::device::{BufferUsage, DeviceError, DeviceRef, MappedRegion, RawHandle};
use super::handle::{GpuHandle, IndexFormat, ResourceTag};

// ─── Shared core ──────────────────────────────────────────────────────────────

/// State shared by the three buffer kinds.
#[derive(Debug)]
struct BufferCore {
    gpu: GpuHandle,
    label: String,
    stride: u32,
    count: u32,
    memory_usage: usize,
}

impl BufferCore {
    /// Allocate and upload in one step. The buffer is immutable afterwards.
    fn create_static(
        device: &DeviceRef,
        label: String,
        stride: u32,
        data: &[u8],
        tag: ResourceTag,
        usage: BufferUsage,
    ) -> Result<Self> {
        if stride == 0 || data.len() % stride as usize != 0 {
            return Err(RheaError::BufferStrideMismatch {
                size: data.len(),
                stride,
            });
        }
        let raw = device.create_buffer(data.len(), usage)?;
        let gpu = GpuHandle::new(device.clone(), raw, data.len(), tag, false);

        // One-shot upload; `gpu` destroys the allocation if a step fails.
        let region = device.map(raw)?;
        // Safety: the region is exclusively ours until the unmap below and
        // spans the whole allocation, which equals `data.len()`.
        unsafe {
            slice::from_raw_parts_mut(region.ptr.as_ptr(), region.len).copy_from_slice(data);
        }
        device.unmap(raw)?;

        Ok(Self {
            gpu,
            label,
            stride,
            count: (data.len() / stride as usize) as u32,
            memory_usage: data.len(),
        })
    }

    /// Allocate `count` elements without contents. Mappable for rewriting.
    fn create_dynamic(
        device: &DeviceRef,
        label: String,
        stride: u32,
        count: u32,
        tag: ResourceTag,
        usage: BufferUsage,
    ) -> Result<Self> {
        let size = stride as usize * count as usize;
        let raw = device.create_buffer(size, usage | BufferUsage::DYNAMIC)?;
        let gpu = GpuHandle::new(device.clone(), raw, size, tag, true);
        Ok(Self {
            gpu,
            label,
            stride,
            count,
            // No write has completed yet.
            memory_usage: 0,
        })
    }

    fn map(&mut self) -> Result<MappedBuffer<'_>> {
        if !self.gpu.is_dynamic() {
            return Err(RheaError::BufferNotDynamic {
                label: self.label.clone(),
            });
        }
        let raw = self.raw()?;
        let region = self.gpu.device().map(raw)?;
        Ok(MappedBuffer { core: self, region })
    }

    fn raw(&self) -> Result<RawHandle> {
        self.gpu
            .raw()
            .ok_or(RheaError::DeviceError(DeviceError::InvalidHandle(
                RawHandle::NULL,
            )))
    }
}

// ─── Mapping guard ────────────────────────────────────────────────────────────

/// Write access to a mapped dynamic buffer.
///
/// Unmaps when dropped, on every exit path. The borrow on the owning buffer
/// makes a second concurrent map a compile error.
#[derive(Debug)]
pub struct MappedBuffer<'a> {
    core: &'a mut BufferCore,
    region: MappedRegion,
}

impl MappedBuffer<'_> {
    /// The whole mapped range.
    #[must_use]
    pub fn bytes(&mut self) -> &mut [u8] {
        // Safety: the region stays valid until our Drop unmaps it, and the
        // exclusive borrow chain makes us the only writer.
        unsafe { slice::from_raw_parts_mut(self.region.ptr.as_ptr(), self.region.len) }
    }

    /// Byte length of the mapped range.
    #[must_use]
    pub fn len(&self) -> usize {
        self.region.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.region.len == 0
    }
}

impl Drop for MappedBuffer<'_> {
    fn drop(&mut self) {
        let Ok(raw) = self.core.raw() else { return };
        match self.core.gpu.device().unmap(raw) {
            // The write is complete; usage now reflects the allocation.
            Ok(()) => self.core.memory_usage = self.core.gpu.size(),
            Err(err) => {
                log::error!(target: "rhea", "unmap of {} failed: {err}", self.core.label);
            }
        }
    }
}

// ─── Index buffer ─────────────────────────────────────────────────────────────

/// GPU index buffer with an explicit element format.
#[derive(Debug)]
pub struct IndexBuffer {
    core: BufferCore,
    format: IndexFormat,
}

impl IndexBuffer {
    /// Static index buffer holding `data`, which must be a whole number of
    /// `format` elements.
    pub fn create(
        device: &DeviceRef,
        label: impl Into<String>,
        format: IndexFormat,
        data: &[u8],
    ) -> Result<Self> {
        let core = BufferCore::create_static(
            device,
            label.into(),
            format.stride(),
            data,
            ResourceTag::IndexBuffer(format),
            BufferUsage::INDEX,
        )?;
        Ok(Self { core, format })
    }

    /// Dynamic index buffer with room for `count` elements.
    pub fn create_dynamic(
        device: &DeviceRef,
        label: impl Into<String>,
        format: IndexFormat,
        count: u32,
    ) -> Result<Self> {
        let core = BufferCore::create_dynamic(
            device,
            label.into(),
            format.stride(),
            count,
            ResourceTag::IndexBuffer(format),
            BufferUsage::INDEX,
        )?;
        Ok(Self { core, format })
    }

    /// Maps for rewriting. Static buffers refuse.
    pub fn map(&mut self) -> Result<MappedBuffer<'_>> {
        self.core.map()
    }

    #[must_use]
    pub fn format(&self) -> IndexFormat {
        self.format
    }

    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.core.count
    }

    #[must_use]
    pub fn stride(&self) -> u32 {
        self.core.stride
    }

    /// Bytes attributable to completed writes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.core.memory_usage
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.core.gpu.is_dynamic()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.core.label
    }

    #[must_use]
    pub fn gpu(&self) -> &GpuHandle {
        &self.core.gpu
    }
}

// ─── Vertex buffer ────────────────────────────────────────────────────────────

/// GPU vertex buffer with an explicit byte stride.
#[derive(Debug)]
pub struct VertexBuffer {
    core: BufferCore,
}

impl VertexBuffer {
    /// Static vertex buffer holding `data`, which must be a whole number of
    /// `stride`-sized elements.
    pub fn create(
        device: &DeviceRef,
        label: impl Into<String>,
        stride: u32,
        data: &[u8],
    ) -> Result<Self> {
        let core = BufferCore::create_static(
            device,
            label.into(),
            stride,
            data,
            ResourceTag::VertexBuffer { stride },
            BufferUsage::VERTEX,
        )?;
        Ok(Self { core })
    }

    /// Dynamic vertex buffer with room for `count` elements.
    pub fn create_dynamic(
        device: &DeviceRef,
        label: impl Into<String>,
        stride: u32,
        count: u32,
    ) -> Result<Self> {
        let core = BufferCore::create_dynamic(
            device,
            label.into(),
            stride,
            count,
            ResourceTag::VertexBuffer { stride },
            BufferUsage::VERTEX,
        )?;
        Ok(Self { core })
    }

    /// Maps for rewriting. Static buffers refuse.
    pub fn map(&mut self) -> Result<MappedBuffer<'_>> {
        self.core.map()
    }

    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.core.count
    }

    #[must_use]
    pub fn stride(&self) -> u32 {
        self.core.stride
    }

    /// Bytes attributable to completed writes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.core.memory_usage
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.core.gpu.is_dynamic()
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.core.label
    }

    #[must_use]
    pub fn gpu(&self) -> &GpuHandle {
        &self.core.gpu
    }
}

// ─── Constant buffer ──────────────────────────────────────────────────────────

/// Uniform-style buffer, always dynamic, rewritten whole each frame.
pub struct ConstantBuffer {
    core: BufferCore,
}

impl ConstantBuffer {
    /// Allocates `size` bytes of rewritable uniform storage.
    pub fn create(device: &DeviceRef, label: impl Into<String>, size: usize) -> Result<Self> {
        let core = BufferCore::create_dynamic(
            device,
            label.into(),
            size as u32,
            1,
            ResourceTag::UniformBuffer,
            BufferUsage::UNIFORM,
        )?;
        Ok(Self { core })
    }

    pub fn map(&mut self) -> Result<MappedBuffer<'_>> {
        self.core.map()
    }

    /// Byte size of the allocation.
    #[must_use]
    pub fn size(&self) -> usize {
        self.core.gpu.size()
    }

    /// Bytes attributable to completed writes.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.core.memory_usage
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.core.label
    }

    #[must_use]
    pub fn gpu(&self) -> &GpuHandle {
        &self.core.gpu
    }
}
