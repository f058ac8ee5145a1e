//! Runner error types.

use scmi_bwprof::BwprofError;
use thiserror::Error;

/// Errors that can occur while loading or applying a profile.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] BwprofError),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
