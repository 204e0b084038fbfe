//! Frame-level render helpers built on the resource layer.

pub mod lighting;

pub use lighting::{LightingPass, LightingUniforms, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS};
