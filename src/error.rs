use std::path::PathBuf;
use thiserror::Error;

use crate::encoder::CategoryKind;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Artifact missing, unreadable, or not in a format we can load.
    #[error("artifact unavailable at {}: {reason}", .path.display())]
    ArtifactUnavailable { path: PathBuf, reason: String },

    #[error("unknown {kind} label {label:?}")]
    UnknownCategory { kind: CategoryKind, label: String },

    /// Artifact shape or column order disagrees with the feature schema.
    #[error("schema mismatch in {artifact}: expected {expected}, got {got}")]
    SchemaMismatch {
        artifact: &'static str,
        expected: String,
        got: String,
    },

    #[error("inference failed: {0}")]
    Inference(String),
}

impl PipelineError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ArtifactUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn width(artifact: &'static str, expected: usize, got: usize) -> Self {
        Self::SchemaMismatch {
            artifact,
            expected: format!("{expected} columns"),
            got: format!("{got} columns"),
        }
    }

    pub(crate) fn columns(artifact: &'static str, expected: &[&str], got: &[String]) -> Self {
        Self::SchemaMismatch {
            artifact,
            expected: format!("{expected:?}"),
            got: format!("{got:?}"),
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
