//! Resource Data Types
//!
//! The value types the caches traffic in:
//! - `features`: the material capability bitset and its fingerprint
//! - `shader`: shader variations and per-material parameters
//! - `texture`: textures, their kinds and serializable metadata

pub mod features;
pub mod shader;
pub mod texture;

pub use features::MaterialFeatures;
pub use shader::{CompileStatus, MaterialParams, ShaderVariation};
pub use texture::{Texture, TextureKind, TextureMeta};
