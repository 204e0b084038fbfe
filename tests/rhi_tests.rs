//! RHI Buffer and Handle Tests
//!
//! Tests for:
//! - IndexBuffer / VertexBuffer: static upload, payload readback, stride validation
//! - Dynamic buffers: MappedBuffer guard, unmap on drop, memory usage accounting
//! - ConstantBuffer: whole-allocation rewrites
//! - GpuHandle: single-owner destruction, idempotent early release
//! - Semaphore: device resource ownership

use std::sync::Arc;

use rhea::rhi::{BufferUsage, ResourceTag};
use rhea::{
    ConstantBuffer, DeviceRef, GpuHandle, IndexBuffer, IndexFormat, NullDevice, RheaError,
    Semaphore, VertexBuffer,
};

fn device() -> (Arc<NullDevice>, DeviceRef) {
    let null = Arc::new(NullDevice::new());
    let device: DeviceRef = null.clone();
    (null, device)
}

// ============================================================================
// Static buffers
// ============================================================================

#[test]
fn static_index_buffer_uploads_payload() {
    let (null, device) = device();
    let indices: [u16; 6] = [0, 1, 2, 2, 3, 0];
    let bytes: &[u8] = bytemuck::cast_slice(&indices);

    let buffer = IndexBuffer::create(&device, "quad indices", IndexFormat::U16, bytes).unwrap();
    assert_eq!(buffer.index_count(), 6);
    assert_eq!(buffer.stride(), 2);
    assert_eq!(buffer.format(), IndexFormat::U16);
    assert_eq!(buffer.label(), "quad indices");
    assert_eq!(buffer.memory_usage(), 12);
    assert!(!buffer.is_dynamic());

    let raw = buffer.gpu().raw().unwrap();
    assert_eq!(null.buffer_contents(raw).unwrap(), bytes);
    // The one-shot upload leaves nothing mapped behind.
    assert!(!null.is_mapped(raw));
    assert_eq!(null.buffer_usage(raw), Some(BufferUsage::INDEX));
}

#[test]
fn static_vertex_buffer_counts_elements_by_stride() {
    let (null, device) = device();
    // Three vertices of position + uv, 20 bytes each.
    let data = vec![7u8; 60];
    let buffer = VertexBuffer::create(&device, "mesh vertices", 20, &data).unwrap();
    assert_eq!(buffer.vertex_count(), 3);
    assert_eq!(buffer.stride(), 20);
    assert_eq!(buffer.memory_usage(), 60);

    let raw = buffer.gpu().raw().unwrap();
    assert_eq!(null.buffer_contents(raw).unwrap(), data);
    assert_eq!(null.buffer_usage(raw), Some(BufferUsage::VERTEX));
}

#[test]
fn static_buffer_rejects_ragged_payload() {
    let (null, device) = device();
    let err = IndexBuffer::create(&device, "bad", IndexFormat::U32, &[0u8; 10]).unwrap_err();
    assert!(matches!(
        err,
        RheaError::BufferStrideMismatch { size: 10, stride: 4 }
    ));

    let err = VertexBuffer::create(&device, "bad", 12, &[0u8; 20]).unwrap_err();
    assert!(matches!(err, RheaError::BufferStrideMismatch { .. }));

    // Zero stride can never divide a payload.
    let err = VertexBuffer::create(&device, "bad", 0, &[0u8; 20]).unwrap_err();
    assert!(matches!(
        err,
        RheaError::BufferStrideMismatch { stride: 0, .. }
    ));

    // Nothing was allocated along the way.
    assert_eq!(null.live_resources(), 0);
}

#[test]
fn static_buffer_refuses_to_map() {
    let (_null, device) = device();
    let mut buffer = IndexBuffer::create(&device, "static", IndexFormat::U16, &[0u8; 4]).unwrap();
    let err = buffer.map().unwrap_err();
    assert!(matches!(err, RheaError::BufferNotDynamic { label } if label == "static"));
}

// ============================================================================
// Dynamic buffers and the mapping guard
// ============================================================================

#[test]
fn dynamic_buffer_usage_counts_only_completed_writes() {
    let (null, device) = device();
    let mut buffer = VertexBuffer::create_dynamic(&device, "stream", 8, 16).unwrap();
    assert!(buffer.is_dynamic());
    assert_eq!(buffer.vertex_count(), 16);
    // Nothing has been written yet.
    assert_eq!(buffer.memory_usage(), 0);

    let raw = buffer.gpu().raw().unwrap();
    assert_eq!(
        null.buffer_usage(raw),
        Some(BufferUsage::VERTEX | BufferUsage::DYNAMIC)
    );

    {
        let mut mapped = buffer.map().unwrap();
        assert_eq!(mapped.len(), 128);
        assert!(null.is_mapped(raw));
        mapped.bytes().fill(0xAB);
    }
    // Guard dropped: unmapped and accounted.
    assert!(!null.is_mapped(raw));
    assert_eq!(buffer.memory_usage(), 128);
    assert_eq!(null.buffer_contents(raw).unwrap(), vec![0xAB; 128]);
}

#[test]
fn dynamic_index_buffer_rewrites_in_place() {
    let (null, device) = device();
    let mut buffer = IndexBuffer::create_dynamic(&device, "stream", IndexFormat::U32, 3).unwrap();
    let raw = buffer.gpu().raw().unwrap();

    let first: [u32; 3] = [1, 2, 3];
    buffer
        .map()
        .unwrap()
        .bytes()
        .copy_from_slice(bytemuck::cast_slice(&first));
    assert_eq!(
        null.buffer_contents(raw).unwrap(),
        bytemuck::cast_slice::<u32, u8>(&first)
    );

    let second: [u32; 3] = [9, 8, 7];
    buffer
        .map()
        .unwrap()
        .bytes()
        .copy_from_slice(bytemuck::cast_slice(&second));
    assert_eq!(
        null.buffer_contents(raw).unwrap(),
        bytemuck::cast_slice::<u32, u8>(&second)
    );
}

#[test]
fn constant_buffer_rewrites_whole_allocation() {
    let (null, device) = device();
    let mut buffer = ConstantBuffer::create(&device, "frame constants", 64).unwrap();
    assert_eq!(buffer.size(), 64);
    assert_eq!(buffer.memory_usage(), 0);

    let payload = [0x5Au8; 64];
    buffer.map().unwrap().bytes().copy_from_slice(&payload);

    assert_eq!(buffer.memory_usage(), 64);
    let raw = buffer.gpu().raw().unwrap();
    assert_eq!(null.buffer_contents(raw).unwrap(), payload);
    assert_eq!(
        null.buffer_usage(raw),
        Some(BufferUsage::UNIFORM | BufferUsage::DYNAMIC)
    );
}

// ============================================================================
// GpuHandle ownership
// ============================================================================

#[test]
fn buffers_destroy_their_allocation_on_drop() {
    let (null, device) = device();
    {
        let _buffer = VertexBuffer::create(&device, "scoped", 4, &[0u8; 16]).unwrap();
        assert_eq!(null.live_resources(), 1);
    }
    assert_eq!(null.live_resources(), 0);
}

#[test]
fn gpu_handle_release_is_idempotent() {
    let (null, device) = device();
    let raw = device.create_buffer(16, BufferUsage::VERTEX).unwrap();
    let mut handle = GpuHandle::new(
        device.clone(),
        raw,
        16,
        ResourceTag::VertexBuffer { stride: 4 },
        false,
    );
    assert_eq!(handle.raw(), Some(raw));
    assert_eq!(handle.size(), 16);
    assert_eq!(null.live_resources(), 1);

    handle.release();
    assert_eq!(handle.raw(), None);
    assert_eq!(null.live_resources(), 0);

    // A second release and the eventual drop are no-ops.
    handle.release();
    drop(handle);
    assert_eq!(null.live_resources(), 0);
}

// ============================================================================
// Semaphores
// ============================================================================

#[test]
fn semaphore_owns_a_device_resource() {
    let (null, device) = device();
    {
        let semaphore = Semaphore::new(&device, "frame").unwrap();
        assert_eq!(semaphore.label(), "frame");
        assert_eq!(null.live_resources(), 1);
    }
    assert_eq!(null.live_resources(), 0);
}
