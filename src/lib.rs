#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod assets;
pub mod cache;
pub mod errors;
pub mod logging;
pub mod render;
pub mod resources;
pub mod rhi;
pub mod scene;

pub use assets::{AssetIo, FileSystemIo, MemoryIo};
pub use cache::{ShaderCache, TextureCache};
pub use errors::{Result, RheaError};
pub use logging::{FacadeSink, FileSink, LogSink, Logger, MemorySink, Severity};
pub use render::{LightingPass, LightingUniforms, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS};
pub use resources::{
    CompileStatus, MaterialFeatures, MaterialParams, ShaderVariation, Texture, TextureKind,
    TextureMeta,
};
pub use rhi::{
    ConstantBuffer, Device, DeviceError, DeviceRef, GpuHandle, IndexBuffer, IndexFormat,
    NullDevice, RawHandle, Semaphore, SemaphoreState, VertexBuffer,
};
pub use scene::{
    Camera, Light, LightHandle, LightKind, SceneRegistry, Transform, TransformHandle,
};
