//! Texture Cache
//!
//! Owns every [`Texture`] in flight and enforces the identity rules: at most
//! one live texture per source path, unique ids, warn-only duplicate names.
//! Loads go through the injected [`AssetIo`] and decode to RGBA8 via `image`
//! before upload, all under the write lock, so at most one load per path is
//! ever in flight and a second request for a cached path performs no IO.
//!
//! A failed load is terminal: the path is recorded with its reason and
//! every retry is served the same error without new IO, until
//! [`remove_by_path`](TextureCache::remove_by_path) or
//! [`clear`](TextureCache::clear) forgets the record.
//!
//! The cache serializes to a JSON index of [`TextureMeta`] entries, pixel
//! data excluded. Restored entries are hollow until
//! [`hydrate_by_path`](TextureCache::hydrate_by_path) decodes and uploads
//! them on first real use.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{SlotMap, new_key_type};
use uuid::Uuid;

use crate::assets::io::AssetIo;
use crate::errors::{Result, RheaError};
use crate::logging::Logger;
use crate::resources::texture::{Texture, TextureKind, TextureMeta};
use crate::rhi::{DeviceRef, GpuHandle, ResourceTag, TextureDesc, TextureFormat};

new_key_type! {
    struct TextureKey;
}

struct CacheInner {
    textures: SlotMap<TextureKey, Arc<Texture>>,
    by_path: FxHashMap<String, TextureKey>,
    by_id: FxHashMap<Uuid, TextureKey>,
    /// Paths whose last load failed, with the reason. Retries are served
    /// from here without IO.
    failed: FxHashMap<String, String>,
}

/// Cache of textures, shared by reference between subsystems.
pub struct TextureCache {
    device: DeviceRef,
    io: Arc<dyn AssetIo>,
    log: Logger,
    inner: RwLock<CacheInner>,
}

impl TextureCache {
    #[must_use]
    pub fn new(device: DeviceRef, io: Arc<dyn AssetIo>, log: Logger) -> Self {
        Self {
            device,
            io,
            log,
            inner: RwLock::new(CacheInner {
                textures: SlotMap::with_key(),
                by_path: FxHashMap::default(),
                by_id: FxHashMap::default(),
                failed: FxHashMap::default(),
            }),
        }
    }

    // ─── Creation and loading ────────────────────────────────────────────────

    /// Registers a fresh placeholder texture with no payload and no path.
    pub fn create_empty(&self, name: impl Into<String>, kind: TextureKind) -> Result<Arc<Texture>> {
        let texture = Arc::new(Texture::new_empty(name.into(), kind));
        let mut inner = self.inner.write();
        register(&mut inner, texture.clone(), &self.log)?;
        Ok(texture)
    }

    /// The texture for `path`, loading and uploading it on first request.
    ///
    /// A cached path is returned as-is without touching the [`AssetIo`].
    /// A failed read, decode or upload is reported as
    /// [`RheaError::TextureLoadFailed`], logged once and recorded as
    /// terminal: retries get the same error without new IO until the path
    /// is removed or the cache cleared.
    pub fn load_from_file(&self, path: &str, kind: TextureKind) -> Result<Arc<Texture>> {
        {
            let inner = self.inner.read();
            if let Some(texture) = lookup_path(&inner, path) {
                return Ok(texture);
            }
            if let Some(err) = recorded_failure(&inner, path) {
                return Err(err);
            }
        }

        let mut inner = self.inner.write();
        // Someone else may have loaded or failed it while we waited for
        // the lock.
        if let Some(texture) = lookup_path(&inner, path) {
            return Ok(texture);
        }
        if let Some(err) = recorded_failure(&inner, path) {
            return Err(err);
        }

        let (pixels, width, height) = match self.read_and_decode(path) {
            Ok(decoded) => decoded,
            Err(err) => return Err(self.record_failure(&mut inner, path, err)),
        };
        let gpu = match self.upload(path, width, height, kind, &pixels) {
            Ok(gpu) => gpu,
            Err(err) => return Err(self.record_failure(&mut inner, path, err)),
        };
        let texture = Arc::new(Texture::new_resident(
            name_from_path(path),
            Some(path.to_owned()),
            kind,
            width,
            height,
            gpu,
        ));
        register(&mut inner, texture.clone(), &self.log)?;
        self.log
            .info(&format!("loaded texture {path} ({width}x{height})"));
        Ok(texture)
    }

    /// Decodes and uploads a hollow texture restored from a serialized
    /// index. Already-resident textures are returned as-is.
    ///
    /// Unknown paths are [`RheaError::NotFound`]; a payload whose dimensions
    /// no longer match the serialized metadata is a load failure. Failures
    /// are terminal like [`load_from_file`](Self::load_from_file) ones and
    /// retries are served without new IO.
    pub fn hydrate_by_path(&self, path: &str) -> Result<Arc<Texture>> {
        let texture = self.get_by_path(path).ok_or_else(|| RheaError::NotFound {
            kind: "texture",
            key: path.to_owned(),
        })?;
        if texture.is_resident() {
            return Ok(texture);
        }

        // Re-check under the write lock so only one hydration runs per path.
        let mut inner = self.inner.write();
        if texture.is_resident() {
            return Ok(texture);
        }
        if let Some(err) = recorded_failure(&inner, path) {
            return Err(err);
        }

        let (pixels, width, height) = match self.read_and_decode(path) {
            Ok(decoded) => decoded,
            Err(err) => return Err(self.record_failure(&mut inner, path, err)),
        };
        if (width, height) != (texture.width(), texture.height()) {
            let err = RheaError::TextureLoadFailed {
                path: path.to_owned(),
                reason: format!(
                    "dimensions {width}x{height} do not match serialized metadata {}x{}",
                    texture.width(),
                    texture.height()
                ),
            };
            return Err(self.record_failure(&mut inner, path, err));
        }
        let gpu = match self.upload(path, width, height, texture.kind(), &pixels) {
            Ok(gpu) => gpu,
            Err(err) => return Err(self.record_failure(&mut inner, path, err)),
        };
        texture.attach_gpu(gpu);
        self.log.info(&format!("hydrated texture {path}"));
        Ok(texture)
    }

    // ─── Lookup ──────────────────────────────────────────────────────────────

    /// Path lookup. `None` when the path was never loaded.
    #[must_use]
    pub fn get_by_path(&self, path: &str) -> Option<Arc<Texture>> {
        lookup_path(&self.inner.read(), path)
    }

    /// Id lookup.
    #[must_use]
    pub fn get_by_id(&self, id: Uuid) -> Option<Arc<Texture>> {
        let inner = self.inner.read();
        inner
            .by_id
            .get(&id)
            .and_then(|&key| inner.textures.get(key).cloned())
    }

    /// Name lookup, first match. Names are display labels and may repeat;
    /// prefer path or id lookups where identity matters.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<Arc<Texture>> {
        self.inner
            .read()
            .textures
            .values()
            .find(|texture| texture.name() == name)
            .cloned()
    }

    // ─── Removal ─────────────────────────────────────────────────────────────

    /// Erases the entry for `path`, along with any recorded load failure,
    /// so the next request retries the IO. Returns whether anything was
    /// removed; a miss is warned, not an error. The device resource goes
    /// when the last outstanding `Arc` drops.
    pub fn remove_by_path(&self, path: &str) -> bool {
        let mut inner = self.inner.write();
        let forgot_failure = inner.failed.remove(path).is_some();
        let Some(key) = inner.by_path.remove(path) else {
            if forgot_failure {
                return true;
            }
            self.log
                .warn(&format!("remove of unknown texture path {path}"));
            return false;
        };
        if let Some(texture) = inner.textures.remove(key) {
            inner.by_id.remove(&texture.id());
        }
        true
    }

    /// Drops every entry and every recorded load failure. Arcs already
    /// handed out stay alive.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let dropped = inner.textures.len();
        inner.textures.clear();
        inner.by_path.clear();
        inner.by_id.clear();
        inner.failed.clear();
        self.log
            .info(&format!("texture cache cleared ({dropped} textures)"));
    }

    // ─── Serialization ───────────────────────────────────────────────────────

    /// JSON snapshot of every cached texture's metadata.
    pub fn serialize_index(&self) -> Result<String> {
        let inner = self.inner.read();
        let metas: Vec<TextureMeta> = inner.textures.values().map(|t| t.meta()).collect();
        Ok(serde_json::to_string_pretty(&metas)?)
    }

    /// Writes [`serialize_index`](Self::serialize_index) to a file.
    pub fn save_index(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.serialize_index()?)?;
        Ok(())
    }

    /// Restores entries from a serialized index as hollow textures.
    ///
    /// The whole batch is validated against the cache and itself first; on a
    /// key collision nothing is inserted. Returns the number of restored
    /// entries.
    pub fn deserialize_index(&self, json: &str) -> Result<usize> {
        let metas: Vec<TextureMeta> = serde_json::from_str(json)?;
        let mut inner = self.inner.write();

        let mut batch_paths = FxHashSet::default();
        let mut batch_ids = FxHashSet::default();
        for meta in &metas {
            if let Some(path) = &meta.path {
                if inner.by_path.contains_key(path) || !batch_paths.insert(path.clone()) {
                    return Err(RheaError::DuplicateKey {
                        kind: "texture path",
                        key: path.clone(),
                    });
                }
            }
            if inner.by_id.contains_key(&meta.id) || !batch_ids.insert(meta.id) {
                return Err(RheaError::DuplicateKey {
                    kind: "texture id",
                    key: meta.id.to_string(),
                });
            }
        }

        let restored = metas.len();
        for meta in metas {
            register(&mut inner, Arc::new(Texture::from_meta(meta)), &self.log)?;
        }
        self.log
            .info(&format!("restored {restored} textures from index"));
        Ok(restored)
    }

    /// Reads and restores an index file written by
    /// [`save_index`](Self::save_index).
    pub fn load_index(&self, path: impl AsRef<Path>) -> Result<usize> {
        let json = std::fs::read_to_string(path)?;
        self.deserialize_index(&json)
    }

    // ─── Statistics ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().textures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().textures.is_empty()
    }

    // ─── Load path ───────────────────────────────────────────────────────────

    fn read_and_decode(&self, path: &str) -> Result<(Vec<u8>, u32, u32)> {
        let bytes = self
            .io
            .read_bytes(path)
            .map_err(|err| RheaError::TextureLoadFailed {
                path: path.to_owned(),
                reason: err.to_string(),
            })?;
        let image =
            image::load_from_memory(&bytes).map_err(|err| RheaError::TextureLoadFailed {
                path: path.to_owned(),
                reason: err.to_string(),
            })?;
        let image = image.into_rgba8();
        let (width, height) = image.dimensions();
        Ok((image.into_raw(), width, height))
    }

    fn upload(
        &self,
        path: &str,
        width: u32,
        height: u32,
        kind: TextureKind,
        pixels: &[u8],
    ) -> Result<GpuHandle> {
        let format = format_for(kind);
        let desc = TextureDesc {
            width,
            height,
            format,
        };
        let raw = self
            .device
            .create_texture(&desc, pixels)
            .map_err(|err| RheaError::TextureLoadFailed {
                path: path.to_owned(),
                reason: err.to_string(),
            })?;
        Ok(GpuHandle::new(
            self.device.clone(),
            raw,
            pixels.len(),
            ResourceTag::Texture(format),
            false,
        ))
    }

    /// Logs a load failure and records it as terminal for its path.
    fn record_failure(&self, inner: &mut CacheInner, path: &str, err: RheaError) -> RheaError {
        self.log.error(&format!("{err}"));
        let reason = match &err {
            RheaError::TextureLoadFailed { reason, .. } => reason.clone(),
            other => other.to_string(),
        };
        inner.failed.insert(path.to_owned(), reason);
        err
    }
}

fn lookup_path(inner: &CacheInner, path: &str) -> Option<Arc<Texture>> {
    inner
        .by_path
        .get(path)
        .and_then(|&key| inner.textures.get(key).cloned())
}

fn recorded_failure(inner: &CacheInner, path: &str) -> Option<RheaError> {
    inner
        .failed
        .get(path)
        .map(|reason| RheaError::TextureLoadFailed {
            path: path.to_owned(),
            reason: reason.clone(),
        })
}

fn register(inner: &mut CacheInner, texture: Arc<Texture>, log: &Logger) -> Result<()> {
    if let Some(path) = texture.path() {
        if inner.by_path.contains_key(path) {
            return Err(RheaError::DuplicateKey {
                kind: "texture path",
                key: path.to_owned(),
            });
        }
    }
    if inner.by_id.contains_key(&texture.id()) {
        return Err(RheaError::DuplicateKey {
            kind: "texture id",
            key: texture.id().to_string(),
        });
    }
    if inner
        .textures
        .values()
        .any(|existing| existing.name() == texture.name())
    {
        log.warn(&format!("duplicate texture name {:?}", texture.name()));
    }

    let id = texture.id();
    let path = texture.path().map(ToOwned::to_owned);
    let key = inner.textures.insert(texture);
    if let Some(path) = path {
        // A fresh registration supersedes a recorded load failure.
        inner.failed.remove(&path);
        inner.by_path.insert(path, key);
    }
    inner.by_id.insert(id, key);
    Ok(())
}

/// Color data gets an sRGB view; everything else stays linear.
fn format_for(kind: TextureKind) -> TextureFormat {
    match kind {
        TextureKind::Albedo | TextureKind::Emission | TextureKind::CubeMap => {
            TextureFormat::Rgba8Srgb
        }
        _ => TextureFormat::Rgba8,
    }
}

fn name_from_path(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(path)
        .to_owned()
}
