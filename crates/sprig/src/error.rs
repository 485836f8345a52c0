//! Error types for the recoverable failure paths.
//!
//! Contract violations (missing or duplicate components, drawing outside a
//! batch) panic instead; these enums cover what a caller can react to.

use std::path::PathBuf;

use thiserror::Error;

/// Renderer and backend failures. Any of these during
/// [`QuadBatchRenderer::initialize`](crate::render::QuadBatchRenderer::initialize)
/// leaves the renderer uninitialized.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to read shader '{path}': {source}")]
    ShaderLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader '{path}' failed to compile: {message}")]
    ShaderCompile { path: PathBuf, message: String },

    #[error("invalid texture {width}x{height}: {message}")]
    Texture {
        width: u32,
        height: u32,
        message: String,
    },

    #[error("render backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for '{field}': {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a scene file (magic {found:#010x})")]
    BadMagic { found: u32 },

    #[error("unsupported scene version {found:#010x} (expected {expected:#010x})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("entity id {0} referenced but not defined")]
    UnknownEntity(u64),
}

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("a profiling session ('{0}') is already running")]
    SessionActive(String),

    #[error("failed to start profiler worker: {0}")]
    Worker(String),
}
