//! Render Hardware Interface
//!
//! The device seam and the owned resource wrappers built on top of it:
//! - `device`: the [`Device`] capability trait and its vocabulary types
//! - `null`: the software backend for tests and headless tools
//! - `handle`: single-owner allocation wrappers with format tags
//! - `buffer`: index/vertex/constant buffers and the mapping discipline
//! - `semaphore`: the validated submit-cycle primitive

pub mod buffer;
pub mod device;
pub mod handle;
pub mod null;
pub mod semaphore;

pub use buffer::{ConstantBuffer, IndexBuffer, MappedBuffer, VertexBuffer};
pub use device::{
    BufferUsage, Device, DeviceError, DeviceRef, MappedRegion, RawHandle, TextureDesc,
    TextureFormat,
};
pub use handle::{GpuHandle, IndexFormat, ResourceTag};
pub use null::NullDevice;
pub use semaphore::{Semaphore, SemaphoreState};
