//! Shader Variation Cache Tests
//!
//! Tests for:
//! - get_or_create: compile-once identity, shared Arcs, fingerprint keys
//! - Stage module library: vertex module sharing across pixel-only variations
//! - get_by_id: lookup without compilation
//! - clear: cold cache, outstanding Arcs stay usable
//! - Failure caching: compile errors reported once, never retried
//! - MaterialParams upload through a variation

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rhea::rhi::{BufferUsage, MappedRegion, TextureDesc};
use rhea::{
    CompileStatus, Device, DeviceError, Logger, MaterialFeatures, MaterialParams, MemorySink,
    NullDevice, RawHandle, RheaError, Severity, ShaderCache,
};

// ============================================================================
// Instrumented device
// ============================================================================

/// Counts shader module builds, optionally rejecting them all.
struct CountingDevice {
    inner: NullDevice,
    compiles: AtomicUsize,
    reject_shaders: bool,
}

impl CountingDevice {
    fn new(reject_shaders: bool) -> Self {
        Self {
            inner: NullDevice::new(),
            compiles: AtomicUsize::new(0),
            reject_shaders,
        }
    }

    fn compiles(&self) -> usize {
        self.compiles.load(Ordering::Relaxed)
    }
}

impl Device for CountingDevice {
    fn create_buffer(&self, size: usize, usage: BufferUsage) -> Result<RawHandle, DeviceError> {
        self.inner.create_buffer(size, usage)
    }

    fn create_shader_module(&self, bytecode: &[u8]) -> Result<RawHandle, DeviceError> {
        self.compiles.fetch_add(1, Ordering::Relaxed);
        if self.reject_shaders {
            return Err(DeviceError::ShaderRejected(
                "no compiler in this test".into(),
            ));
        }
        self.inner.create_shader_module(bytecode)
    }

    fn create_texture(&self, desc: &TextureDesc, pixels: &[u8]) -> Result<RawHandle, DeviceError> {
        self.inner.create_texture(desc, pixels)
    }

    fn create_semaphore(&self) -> Result<RawHandle, DeviceError> {
        self.inner.create_semaphore()
    }

    fn map(&self, handle: RawHandle) -> Result<MappedRegion, DeviceError> {
        self.inner.map(handle)
    }

    fn unmap(&self, handle: RawHandle) -> Result<(), DeviceError> {
        self.inner.unmap(handle)
    }

    fn destroy_resource(&self, handle: RawHandle) {
        self.inner.destroy_resource(handle);
    }
}

fn fixture(reject: bool) -> (Arc<CountingDevice>, Arc<MemorySink>, ShaderCache) {
    let device = Arc::new(CountingDevice::new(reject));
    let sink = Arc::new(MemorySink::new());
    let cache = ShaderCache::new(device.clone(), Logger::new(sink.clone()));
    (device, sink, cache)
}

// ============================================================================
// Identity and reuse
// ============================================================================

#[test]
fn same_features_share_one_variation() {
    let (device, _sink, cache) = fixture(false);
    let features = MaterialFeatures::ALBEDO | MaterialFeatures::NORMAL;

    let first = cache.get_or_create(features).unwrap();
    let second = cache.get_or_create(features).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.id(), "mat-albedo-normal");
    assert_eq!(first.status(), CompileStatus::Compiled);
    assert_eq!(cache.variation_count(), 1);
    // Two stages compiled once, never again.
    assert_eq!(device.compiles(), 2);
}

#[test]
fn distinct_features_get_distinct_variations() {
    let (_device, _sink, cache) = fixture(false);
    let plain = cache.get_or_create(MaterialFeatures::ALBEDO).unwrap();
    let masked = cache
        .get_or_create(MaterialFeatures::ALBEDO | MaterialFeatures::MASK)
        .unwrap();
    assert!(!Arc::ptr_eq(&plain, &masked));
    assert_ne!(plain.id(), masked.id());
    assert_eq!(cache.variation_count(), 2);
}

#[test]
fn compile_is_logged() {
    let (_device, sink, cache) = fixture(false);
    cache.get_or_create(MaterialFeatures::empty()).unwrap();
    assert!(sink.contains(Severity::Info, "compiled shader variation mat-untextured"));
}

// ============================================================================
// Stage module library
// ============================================================================

#[test]
fn pixel_only_variations_share_the_vertex_module() {
    let (device, _sink, cache) = fixture(false);
    let plain = cache.get_or_create(MaterialFeatures::ALBEDO).unwrap();
    let masked = cache
        .get_or_create(MaterialFeatures::ALBEDO | MaterialFeatures::MASK)
        .unwrap();

    // MASK only changes pixel code, so the vertex module is reused.
    assert!(Arc::ptr_eq(
        plain.vertex_module().unwrap(),
        masked.vertex_module().unwrap()
    ));
    assert!(!Arc::ptr_eq(
        plain.pixel_module().unwrap(),
        masked.pixel_module().unwrap()
    ));
    assert_eq!(cache.module_count(), 3);
    assert_eq!(device.compiles(), 3);
    assert_eq!(device.inner.shader_module_count(), 3);
}

#[test]
fn vertex_affecting_features_split_the_vertex_module() {
    let (_device, _sink, cache) = fixture(false);
    let flat = cache.get_or_create(MaterialFeatures::ALBEDO).unwrap();
    let bumpy = cache
        .get_or_create(MaterialFeatures::ALBEDO | MaterialFeatures::HEIGHT)
        .unwrap();
    assert!(!Arc::ptr_eq(
        flat.vertex_module().unwrap(),
        bumpy.vertex_module().unwrap()
    ));
}

// ============================================================================
// Lookup without compilation
// ============================================================================

#[test]
fn get_by_id_never_compiles() {
    let (device, _sink, cache) = fixture(false);
    assert!(cache.get_by_id("mat-albedo").is_none());
    assert_eq!(device.compiles(), 0);
    assert_eq!(cache.variation_count(), 0);

    let created = cache.get_or_create(MaterialFeatures::ALBEDO).unwrap();
    let found = cache.get_by_id("mat-albedo").unwrap();
    assert!(Arc::ptr_eq(&created, &found));
    assert_eq!(device.compiles(), 2);
}

// ============================================================================
// Clearing
// ============================================================================

#[test]
fn clear_makes_the_cache_cold() {
    let (device, sink, cache) = fixture(false);
    let before = cache.get_or_create(MaterialFeatures::NORMAL).unwrap();
    cache.clear();

    assert_eq!(cache.variation_count(), 0);
    assert_eq!(cache.module_count(), 0);
    assert!(cache.get_by_id("mat-normal").is_none());
    assert!(sink.contains(Severity::Info, "cleared"));

    // The outstanding Arc still works.
    assert!(before.is_compiled());

    // The next request is a real rebuild.
    let after = cache.get_or_create(MaterialFeatures::NORMAL).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(device.compiles(), 4);
}

// ============================================================================
// Failure caching
// ============================================================================

#[test]
fn compile_failure_is_reported_once_and_cached() {
    let (device, sink, cache) = fixture(true);

    let err = cache.get_or_create(MaterialFeatures::ALBEDO).unwrap_err();
    assert!(matches!(
        err,
        RheaError::ShaderCompileFailed { ref variation, .. } if variation == "mat-albedo"
    ));
    assert!(sink.contains(Severity::Error, "mat-albedo"));
    let attempts = device.compiles();

    // The failure is cached; later requests return it without recompiling.
    let cached = cache.get_or_create(MaterialFeatures::ALBEDO).unwrap();
    assert_eq!(cached.status(), CompileStatus::Failed);
    assert!(!cached.is_compiled());
    assert!(cached.vertex_module().is_none());
    assert_eq!(device.compiles(), attempts);
    assert_eq!(cache.variation_count(), 1);

    // A failed variation refuses parameter uploads.
    let err = cached
        .set_material_params(&MaterialParams::default())
        .unwrap_err();
    assert!(matches!(err, RheaError::ShaderNotCompiled { .. }));
}

// ============================================================================
// Material parameter upload
// ============================================================================

#[test]
fn material_params_reach_the_device() {
    let (device, _sink, cache) = fixture(false);
    let variation = cache.get_or_create(MaterialFeatures::ALBEDO).unwrap();

    let params = MaterialParams {
        roughness: 0.25,
        metallic: 1.0,
        ..MaterialParams::default()
    };
    variation.set_material_params(&params).unwrap();

    let raw = variation.material_buffer_handle().unwrap();
    let bytes = device.inner.buffer_contents(raw).unwrap();
    assert_eq!(bytes, bytemuck::bytes_of(&params));
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn concurrent_requests_build_once() {
    let (device, _sink, cache) = fixture(false);
    let features = MaterialFeatures::ALBEDO | MaterialFeatures::NORMAL;

    let variations: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| cache.get_or_create(features).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for variation in &variations[1..] {
        assert!(Arc::ptr_eq(&variations[0], variation));
    }
    assert_eq!(cache.variation_count(), 1);
    assert_eq!(device.compiles(), 2);
}
