//! Resource Caches
//!
//! Deduplicating owners of the heavyweight resources:
//! - `shader_cache`: compiled shader variations keyed by feature fingerprint
//! - `texture_cache`: textures keyed by path and id, with a serializable
//!   metadata index

pub mod shader_cache;
pub mod texture_cache;

pub use shader_cache::ShaderCache;
pub use texture_cache::TextureCache;
