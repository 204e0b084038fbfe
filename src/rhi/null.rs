//! Software Device Backend
//!
//! [`NullDevice`] implements the [`Device`] capability entirely in host
//! memory: buffers are zero-initialized byte blocks, shader modules are
//! validated but not translated, textures and semaphores are bookkeeping
//! entries. It enforces the full device contract (unknown handles, double
//! maps, zero sizes) and exposes readback and statistics helpers, which makes
//! it the backend for tests, asset pipelines and other headless tools.

use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::device::{BufferUsage, Device, DeviceError, MappedRegion, RawHandle, TextureDesc};

enum Slot {
    Buffer {
        data: Box<[u8]>,
        mapped: bool,
        usage: BufferUsage,
    },
    ShaderModule {
        bytes: usize,
    },
    Texture {
        bytes: usize,
    },
    Semaphore,
}

/// A [`Device`] that lives entirely in host memory.
pub struct NullDevice {
    slots: Mutex<FxHashMap<RawHandle, Slot>>,
    next: AtomicU64,
}

impl NullDevice {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(FxHashMap::default()),
            next: AtomicU64::new(1),
        }
    }

    fn mint(&self) -> RawHandle {
        RawHandle(self.next.fetch_add(1, Ordering::Relaxed))
    }

    // ─── Readback and statistics ─────────────────────────────────────────────

    /// Copy of a buffer's current contents, if `handle` names a live buffer.
    #[must_use]
    pub fn buffer_contents(&self, handle: RawHandle) -> Option<Vec<u8>> {
        match self.slots.lock().get(&handle) {
            Some(Slot::Buffer { data, .. }) => Some(data.to_vec()),
            _ => None,
        }
    }

    /// Usage flags a live buffer was created with.
    #[must_use]
    pub fn buffer_usage(&self, handle: RawHandle) -> Option<BufferUsage> {
        match self.slots.lock().get(&handle) {
            Some(Slot::Buffer { usage, .. }) => Some(*usage),
            _ => None,
        }
    }

    /// Whether a live buffer is currently mapped.
    #[must_use]
    pub fn is_mapped(&self, handle: RawHandle) -> bool {
        matches!(
            self.slots.lock().get(&handle),
            Some(Slot::Buffer { mapped: true, .. })
        )
    }

    /// Byte footprint of a live allocation (0 for semaphores).
    #[must_use]
    pub fn resource_size(&self, handle: RawHandle) -> Option<usize> {
        match self.slots.lock().get(&handle)? {
            Slot::Buffer { data, .. } => Some(data.len()),
            Slot::ShaderModule { bytes } | Slot::Texture { bytes } => Some(*bytes),
            Slot::Semaphore => Some(0),
        }
    }

    /// Total live allocations of every kind.
    #[must_use]
    pub fn live_resources(&self) -> usize {
        self.slots.lock().len()
    }

    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.count(|slot| matches!(slot, Slot::Buffer { .. }))
    }

    #[must_use]
    pub fn shader_module_count(&self) -> usize {
        self.count(|slot| matches!(slot, Slot::ShaderModule { .. }))
    }

    #[must_use]
    pub fn texture_count(&self) -> usize {
        self.count(|slot| matches!(slot, Slot::Texture { .. }))
    }

    fn count(&self, pred: impl Fn(&Slot) -> bool) -> usize {
        self.slots.lock().values().filter(|slot| pred(slot)).count()
    }
}

impl Default for NullDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for NullDevice {
    fn create_buffer(&self, size: usize, usage: BufferUsage) -> Result<RawHandle, DeviceError> {
        if size == 0 {
            return Err(DeviceError::ZeroSize);
        }
        let handle = self.mint();
        self.slots.lock().insert(
            handle,
            Slot::Buffer {
                data: vec![0u8; size].into_boxed_slice(),
                mapped: false,
                usage,
            },
        );
        Ok(handle)
    }

    fn create_shader_module(&self, bytecode: &[u8]) -> Result<RawHandle, DeviceError> {
        if bytecode.is_empty() {
            return Err(DeviceError::ShaderRejected("empty shader source".into()));
        }
        if std::str::from_utf8(bytecode).is_err() {
            return Err(DeviceError::ShaderRejected(
                "source is not valid UTF-8".into(),
            ));
        }
        let handle = self.mint();
        self.slots.lock().insert(
            handle,
            Slot::ShaderModule {
                bytes: bytecode.len(),
            },
        );
        Ok(handle)
    }

    fn create_texture(&self, desc: &TextureDesc, pixels: &[u8]) -> Result<RawHandle, DeviceError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(DeviceError::ZeroSize);
        }
        debug_assert_eq!(
            pixels.len(),
            desc.payload_len(),
            "texture payload does not match its description"
        );
        let handle = self.mint();
        self.slots.lock().insert(
            handle,
            Slot::Texture {
                bytes: pixels.len(),
            },
        );
        Ok(handle)
    }

    fn create_semaphore(&self) -> Result<RawHandle, DeviceError> {
        let handle = self.mint();
        self.slots.lock().insert(handle, Slot::Semaphore);
        Ok(handle)
    }

    fn map(&self, handle: RawHandle) -> Result<MappedRegion, DeviceError> {
        let mut slots = self.slots.lock();
        // Only buffers are host-visible here; anything else is invalid for map.
        let Some(Slot::Buffer { data, mapped, .. }) = slots.get_mut(&handle) else {
            return Err(DeviceError::InvalidHandle(handle));
        };
        if *mapped {
            return Err(DeviceError::AlreadyMapped(handle));
        }
        *mapped = true;
        // The block stays put while mapped: rehashing moves the Box pointer,
        // not the heap block it points to, and removal asserts !mapped.
        let ptr = NonNull::new(data.as_mut_ptr()).ok_or(DeviceError::InvalidHandle(handle))?;
        Ok(MappedRegion {
            ptr,
            len: data.len(),
        })
    }

    fn unmap(&self, handle: RawHandle) -> Result<(), DeviceError> {
        let mut slots = self.slots.lock();
        let Some(Slot::Buffer { mapped, .. }) = slots.get_mut(&handle) else {
            return Err(DeviceError::InvalidHandle(handle));
        };
        if !*mapped {
            return Err(DeviceError::NotMapped(handle));
        }
        *mapped = false;
        Ok(())
    }

    fn destroy_resource(&self, handle: RawHandle) {
        let mut slots = self.slots.lock();
        let removed = slots.remove(&handle);
        debug_assert!(removed.is_some(), "destroy of unknown handle {handle:?}");
        if let Some(Slot::Buffer { mapped, .. }) = removed {
            debug_assert!(!mapped, "destroy of mapped buffer {handle:?}");
        }
    }
}

impl Drop for NullDevice {
    fn drop(&mut self) {
        let slots = self.slots.get_mut();
        let mapped = slots
            .values()
            .any(|slot| matches!(slot, Slot::Buffer { mapped: true, .. }));
        debug_assert!(!mapped, "NullDevice dropped with mapped buffers");
        if !slots.is_empty() {
            log::warn!(
                target: "rhea",
                "NullDevice dropped with {} live resources",
                slots.len()
            );
        }
    }
}
