//! Failure taxonomy surfaced to the CLI.
//!
//! Operations return `anyhow::Result` and raise these variants at the point of
//! failure so callers can `downcast_ref::<HealthError>()` when the kind matters.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("sample file not found: {}", path.display())]
    MissingArtifact { path: PathBuf },
    #[error("sample file {} is not readable: {message}", path.display())]
    CorruptArtifact { path: PathBuf, message: String },
    #[error("{case}: {message}")]
    AssertionFailure { case: String, message: String },
    #[error("spec file not found: {}", path.display())]
    SpecNotFound { path: PathBuf },
    #[error("invalid environment spec {}: {message}", path.display())]
    Schema { path: PathBuf, message: String },
    #[error("command `{command}` failed ({status}):\n{output}")]
    CommandFailed {
        command: String,
        status: String,
        output: String,
    },
    #[error("cannot load case definitions from {}: {message}", path.display())]
    DynamicLoad { path: PathBuf, message: String },
}

impl HealthError {
    pub fn assertion(case: &str, message: impl Into<String>) -> Self {
        HealthError::AssertionFailure {
            case: case.to_string(),
            message: message.into(),
        }
    }
}
