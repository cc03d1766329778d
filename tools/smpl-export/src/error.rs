//! Error types shared by the rest-pose and animation pipelines.

use std::path::PathBuf;

/// Failures reported by the export pipelines.
///
/// Every variant is detected before any output is written, so a failed
/// export never leaves a partial file behind.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The scene host rejected or could not parse the source file
    #[error("failed to import {path:?}: {message}")]
    ImportFailure { path: PathBuf, message: String },

    /// The scene loaded but holds no skeletal rig
    #[error("no armature found in scene")]
    NoRigFound,

    /// The rig has no animation clip attached
    #[error("no animation data found on armature")]
    NoAnimationData,

    /// A bone the pipeline cannot do without is absent from the rig
    #[error("required bone '{0}' not found in armature")]
    MissingBone(&'static str),

    /// Frame stride must be at least 1
    #[error("frame step must be at least 1 (got {0})")]
    InvalidFrameStep(u32),

    /// Frame rate must be positive and finite
    #[error("invalid frame rate {0}")]
    InvalidFrameRate(f32),

    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("clip serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
