//! Shader Variation Cache
//!
//! Deduplicates compiled programs by material feature fingerprint. On a miss
//! the cache composes the HLSL source for both stages (stage marker plus one
//! define per enabled feature, prepended to the G-buffer template), compiles
//! through the device and inserts before returning, all under the write
//! lock, so at most one build per fingerprint is ever in flight.
//!
//! Stage modules are interned in a source-hash library: the vertex stage
//! only depends on the geometry-affecting feature subset, so variations that
//! differ in pixel-only flags share one vertex module.
//!
//! Failures are cached as `Failed` variations. The compiling call reports
//! the error; later calls for the same fingerprint get the cached instance
//! back without touching the compiler again.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use slotmap::{SlotMap, new_key_type};
use xxhash_rust::xxh3::xxh3_128;

use crate::errors::{Result, RheaError};
use crate::logging::Logger;
use crate::resources::features::MaterialFeatures;
use crate::resources::shader::{MaterialParams, ShaderVariation};
use crate::rhi::{ConstantBuffer, DeviceRef, GpuHandle, ResourceTag};

const GBUFFER_TEMPLATE: &str = include_str!("shaders/gbuffer.hlsl");

new_key_type! {
    struct VariationKey;
}

struct CacheInner {
    variations: SlotMap<VariationKey, Arc<ShaderVariation>>,
    by_fingerprint: FxHashMap<String, VariationKey>,
    /// Stage modules keyed by xxh3 of their final source.
    modules: FxHashMap<u128, Arc<GpuHandle>>,
}

/// Cache of shader variations, shared by reference between subsystems.
pub struct ShaderCache {
    device: DeviceRef,
    log: Logger,
    inner: RwLock<CacheInner>,
}

impl ShaderCache {
    #[must_use]
    pub fn new(device: DeviceRef, log: Logger) -> Self {
        Self {
            device,
            log,
            inner: RwLock::new(CacheInner {
                variations: SlotMap::with_key(),
                by_fingerprint: FxHashMap::default(),
                modules: FxHashMap::default(),
            }),
        }
    }

    /// The variation for `features`, compiling it on first request.
    ///
    /// Two calls with the same feature set return the same `Arc`. A fresh
    /// compile failure is reported as [`RheaError::ShaderCompileFailed`] and
    /// cached; subsequent calls return the `Failed` variation as `Ok`, and
    /// callers branch on [`ShaderVariation::is_compiled`].
    pub fn get_or_create(&self, features: MaterialFeatures) -> Result<Arc<ShaderVariation>> {
        let fingerprint = features.fingerprint();

        {
            let inner = self.inner.read();
            if let Some(variation) = lookup(&inner, &fingerprint) {
                return Ok(variation);
            }
        }

        let mut inner = self.inner.write();
        // Someone else may have built it while we waited for the lock.
        if let Some(variation) = lookup(&inner, &fingerprint) {
            return Ok(variation);
        }

        match self.compile(&mut inner, features) {
            Ok(variation) => {
                let variation = Arc::new(variation);
                insert(&mut inner, &fingerprint, variation.clone());
                self.log
                    .info(&format!("compiled shader variation {fingerprint}"));
                Ok(variation)
            }
            Err(err) => {
                let reason = err.to_string();
                insert(
                    &mut inner,
                    &fingerprint,
                    Arc::new(ShaderVariation::failed(features)),
                );
                self.log.error(&format!(
                    "shader variation {fingerprint} failed to compile: {reason}"
                ));
                Err(RheaError::ShaderCompileFailed {
                    variation: fingerprint,
                    reason,
                })
            }
        }
    }

    /// Direct fingerprint lookup. Never compiles.
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<Arc<ShaderVariation>> {
        lookup(&self.inner.read(), id)
    }

    /// Drops every variation and the module library. Arcs already handed
    /// out stay alive; their device resources go when the last clone drops.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let dropped = inner.variations.len();
        inner.variations.clear();
        inner.by_fingerprint.clear();
        inner.modules.clear();
        self.log
            .info(&format!("shader cache cleared ({dropped} variations)"));
    }

    /// Number of cached variations, failed ones included.
    #[must_use]
    pub fn variation_count(&self) -> usize {
        self.inner.read().variations.len()
    }

    /// Number of distinct stage modules in the library.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.inner.read().modules.len()
    }

    // ─── Build path (runs under the write lock) ──────────────────────────────

    fn compile(&self, inner: &mut CacheInner, features: MaterialFeatures) -> Result<ShaderVariation> {
        let vertex_source = compose_source("VERTEX_STAGE", features.vertex_subset());
        let pixel_source = compose_source("PIXEL_STAGE", features);

        let vertex_module = self.module_for(&mut inner.modules, &vertex_source)?;
        let pixel_module = self.module_for(&mut inner.modules, &pixel_source)?;
        let material_buffer = ConstantBuffer::create(
            &self.device,
            format!("{} material", features.fingerprint()),
            size_of::<MaterialParams>(),
        )?;

        Ok(ShaderVariation::compiled(
            features,
            vertex_module,
            pixel_module,
            material_buffer,
        ))
    }

    fn module_for(
        &self,
        modules: &mut FxHashMap<u128, Arc<GpuHandle>>,
        source: &str,
    ) -> Result<Arc<GpuHandle>> {
        let hash = xxh3_128(source.as_bytes());
        if let Some(module) = modules.get(&hash) {
            return Ok(module.clone());
        }
        let raw = self.device.create_shader_module(source.as_bytes())?;
        let module = Arc::new(GpuHandle::new(
            self.device.clone(),
            raw,
            source.len(),
            ResourceTag::ShaderModule,
            false,
        ));
        modules.insert(hash, module.clone());
        Ok(module)
    }
}

fn lookup(inner: &CacheInner, fingerprint: &str) -> Option<Arc<ShaderVariation>> {
    inner
        .by_fingerprint
        .get(fingerprint)
        .and_then(|&key| inner.variations.get(key).cloned())
}

fn insert(inner: &mut CacheInner, fingerprint: &str, variation: Arc<ShaderVariation>) {
    let key = inner.variations.insert(variation);
    inner.by_fingerprint.insert(fingerprint.to_owned(), key);
}

fn compose_source(stage: &str, features: MaterialFeatures) -> String {
    format!(
        "#define {stage} 1\n{}{GBUFFER_TEMPLATE}",
        features.hlsl_defines()
    )
}
