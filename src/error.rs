//! Failure classes of the demo.
//!
//! None of these are recovered locally. Asset and pass errors abort startup
//! before the first frame, draw errors stop the frame loop.

use thiserror::Error;

use crate::render::SurfaceState;

/// Retrieval or decoding of a manifest entry failed.
#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("failed to retrieve asset `{name}` from `{source_path}`")]
    Retrieve {
        name: String,
        source_path: String,
        #[source]
        cause: anyhow::Error,
    },
    #[error("failed to decode asset `{name}`")]
    Decode {
        name: String,
        #[source]
        cause: anyhow::Error,
    },
    #[error("asset `{name}` is not part of the loaded set")]
    Missing { name: String },
    #[error("asset `{name}` is not a {expected}")]
    WrongKind { name: String, expected: &'static str },
}

/// A draw pass could not be configured.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("shader of pass `{label}` does not compile:\n{message}")]
    Shader { label: String, message: String },
    #[error("pass `{label}` has invalid geometry: {reason}")]
    Geometry { label: String, reason: String },
    #[error("pass `{label}` has invalid uniform bindings: {reason}")]
    Uniforms { label: String, reason: String },
}

/// Per-frame GPU failure.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("surface cannot be drawn to: {state:?}")]
    Surface { state: SurfaceState },
    #[error("pass `{label}` was invoked more than {capacity} times in one frame")]
    PropsExhausted { label: String, capacity: u32 },
    #[error("pass `{label}` needs per-invocation properties but none were supplied")]
    MissingProps { label: String },
    #[error("pass invoked before the frame was begun")]
    FrameNotBegun,
}
