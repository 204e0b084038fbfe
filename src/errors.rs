//! Error Types
//!
//! This module defines the error types used throughout the resource layer.
//!
//! # Overview
//!
//! The main error type [`RheaError`] covers all failure modes including:
//! - Device allocation and mapping failures
//! - Shader compilation errors
//! - Texture loading and decoding errors
//! - Cache lookup and key collisions
//! - Synchronization state violations
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, RheaError>`.
//!
//! ```rust,ignore
//! use rhea::errors::{RheaError, Result};
//!
//! fn upload_mesh() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::rhi::device::DeviceError;
use crate::rhi::semaphore::SemaphoreState;

/// The main error type for the resource layer.
///
/// This enum covers all possible error conditions that can occur
/// while creating, caching or synchronizing GPU resources. Each
/// variant provides specific context about what went wrong.
#[derive(Error, Debug)]
pub enum RheaError {
    // ========================================================================
    // Device Errors
    // ========================================================================
    /// The graphics backend rejected an operation.
    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),

    // ========================================================================
    // Synchronization Errors
    // ========================================================================
    /// A semaphore was driven along an edge outside its lifecycle.
    #[error("Invalid semaphore transition: {from:?} -> {to:?}")]
    InvalidSemaphoreTransition {
        /// State the semaphore was in
        from: SemaphoreState,
        /// State the caller asked for
        to: SemaphoreState,
    },

    /// A semaphore was waited on before any submission.
    #[error("Semaphore waited on while idle")]
    SemaphoreWaitWhileIdle,

    // ========================================================================
    // Buffer Errors
    // ========================================================================
    /// A static buffer was mapped for writing.
    #[error("Buffer is not dynamic: {label}")]
    BufferNotDynamic {
        /// Debug label of the offending buffer
        label: String,
    },

    /// Initial data does not divide evenly into elements.
    #[error("Buffer size {size} is not a multiple of stride {stride}")]
    BufferStrideMismatch {
        /// Byte length of the provided data
        size: usize,
        /// Element stride in bytes
        stride: u32,
    },

    // ========================================================================
    // Shader Errors
    // ========================================================================
    /// A shader variation failed to compile.
    #[error("Shader compile failed for {variation}: {reason}")]
    ShaderCompileFailed {
        /// Fingerprint of the failing variation
        variation: String,
        /// Compiler diagnostic
        reason: String,
    },

    /// An operation required a compiled shader variation.
    #[error("Shader variation not compiled: {variation}")]
    ShaderNotCompiled {
        /// Fingerprint of the variation
        variation: String,
    },

    // ========================================================================
    // Texture & Cache Errors
    // ========================================================================
    /// A keyed lookup that promises existence found nothing.
    #[error("Not found: {kind} '{key}'")]
    NotFound {
        /// Resource category, e.g. "texture"
        kind: &'static str,
        /// The key that missed
        key: String,
    },

    /// An insert would have silently overwritten an existing entry.
    #[error("Duplicate {kind} key: {key}")]
    DuplicateKey {
        /// Resource category, e.g. "texture path"
        kind: &'static str,
        /// The colliding key
        key: String,
    },

    /// A texture file could not be read or decoded.
    #[error("Failed to load texture {path}: {reason}")]
    TextureLoadFailed {
        /// Source path as given to the cache
        path: String,
        /// Decoder or IO diagnostic
        reason: String,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Alias for `Result<T, RheaError>`.
pub type Result<T> = std::result::Result<T, RheaError>;
