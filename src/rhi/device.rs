//! Graphics Device Capability
//!
//! The resource layer never names a concrete graphics API. Everything it
//! needs from the backend is the [`Device`] trait: raw allocation, shader
//! module creation, host mapping and destruction. Backends mint plain
//! [`RawHandle`]s; ownership, format tagging and destruction discipline live
//! in the wrappers built on top (`GpuHandle`, the buffer types, `Semaphore`).
//!
//! A software implementation for tests and headless tools ships as
//! [`NullDevice`](super::null::NullDevice).

use std::ptr::NonNull;
use std::sync::Arc;

use bitflags::bitflags;
use thiserror::Error;

// ─── Handles and descriptors ──────────────────────────────────────────────────

/// Opaque name of one device allocation.
///
/// Minted by the backend, never reused while the allocation is live.
/// Backends never mint [`RawHandle::NULL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle(pub u64);

impl RawHandle {
    /// The never-minted null handle, usable as a sentinel.
    pub const NULL: Self = Self(0);
}

bitflags! {
    /// Intended use of a buffer allocation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const INDEX = 1 << 0;
        const VERTEX = 1 << 1;
        const UNIFORM = 1 << 2;
        /// Host-visible; may be mapped and rewritten after creation.
        const DYNAMIC = 1 << 3;
    }
}

/// Pixel layout of a texture allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8,
    Rgba8Srgb,
}

impl TextureFormat {
    #[must_use]
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgba8 | Self::Rgba8Srgb => 4,
        }
    }
}

/// Creation parameters for a 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

impl TextureDesc {
    /// Byte length of a full pixel payload for this description.
    #[must_use]
    pub const fn payload_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel() as usize
    }
}

/// Host-visible view of a mapped allocation.
///
/// Valid until the matching [`Device::unmap`]; the backend keeps the memory
/// address-stable in between.
#[derive(Debug, Clone, Copy)]
pub struct MappedRegion {
    pub ptr: NonNull<u8>,
    pub len: usize,
}

// ─── Errors ───────────────────────────────────────────────────────────────────

/// Errors surfaced by [`Device`] implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The handle does not name a live allocation of this device.
    #[error("Unknown resource handle: {0:?}")]
    InvalidHandle(RawHandle),

    /// `map` was called while the allocation was already mapped.
    #[error("Resource already mapped: {0:?}")]
    AlreadyMapped(RawHandle),

    /// `unmap` was called while the allocation was not mapped.
    #[error("Resource is not mapped: {0:?}")]
    NotMapped(RawHandle),

    /// Zero-sized allocations are never valid.
    #[error("Zero-sized allocation rejected")]
    ZeroSize,

    /// The backend could not satisfy the allocation.
    #[error("Out of device memory")]
    OutOfMemory,

    /// The backend could not build a module from the given bytecode.
    #[error("Shader module rejected: {0}")]
    ShaderRejected(String),
}

// ─── The capability trait ─────────────────────────────────────────────────────

/// Everything the resource layer needs from a graphics backend.
///
/// Implementations must be thread-safe; caches call in concurrently. All
/// methods are synchronous from the caller's point of view, matching an
/// immediate-context graphics API.
pub trait Device: Send + Sync {
    /// Allocates `size` bytes of buffer storage. Zero sizes are rejected.
    fn create_buffer(&self, size: usize, usage: BufferUsage) -> Result<RawHandle, DeviceError>;

    /// Builds a shader module from stage bytecode (or source text the
    /// backend accepts).
    fn create_shader_module(&self, bytecode: &[u8]) -> Result<RawHandle, DeviceError>;

    /// Creates an immutable 2D texture initialized with `pixels`.
    fn create_texture(&self, desc: &TextureDesc, pixels: &[u8]) -> Result<RawHandle, DeviceError>;

    /// Creates a synchronization primitive resource.
    fn create_semaphore(&self) -> Result<RawHandle, DeviceError>;

    /// Maps a host-visible allocation for writing.
    fn map(&self, handle: RawHandle) -> Result<MappedRegion, DeviceError>;

    /// Unmaps a previously mapped allocation, completing the write.
    fn unmap(&self, handle: RawHandle) -> Result<(), DeviceError>;

    /// Releases the allocation behind `handle`.
    ///
    /// Infallible at this seam; backends are free to assert on handles they
    /// never issued or already destroyed.
    fn destroy_resource(&self, handle: RawHandle);
}

/// Shared handle to the backend in use.
pub type DeviceRef = Arc<dyn Device>;
