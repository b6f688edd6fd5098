//! Error types for the core orchestration crate.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Boxed error produced by a host implementation.
pub type BoxedHostError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Trait for errors that carry a stable code for reporting.
pub trait CodedError: std::error::Error {
    /// Get the error code for reporting.
    ///
    /// Returns a static string like "CORE_001" or "BLENDER_004". Codes are
    /// stable and can be used for programmatic error handling.
    fn code(&self) -> &'static str;

    /// Get a human-readable message describing the error.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Get the error category for grouping related errors.
    fn category(&self) -> &'static str;
}

/// Errors that can occur while configuring or running a render job.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A configuration field is outside its allowed range.
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfig { field: &'static str, message: String },

    /// No object is selected.
    #[error("No object is selected.")]
    NoSelection,

    /// A selected object has no animation data to bind actions to.
    #[error("Object {object} has no animation data.")]
    MissingAnimationData { object: String },

    /// No known action is flagged for rendering.
    #[error("No action is selected.")]
    NoActionSelected,

    /// A render job is already running on this controller.
    #[error("A render job is already running")]
    JobAlreadyRunning,

    /// There is no job to poll or cancel.
    #[error("No render job is active")]
    NoActiveJob,

    /// The host (scene, renderer or compositor) reported an error.
    #[error("Host error: {0}")]
    Host(#[source] BoxedHostError),

    /// Failed to create an output directory.
    #[error("Failed to create directory {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to remove a stale output directory.
    #[error("Failed to remove directory {path}: {source}")]
    RemoveDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker thread exited without delivering a result.
    #[error("Render worker terminated unexpectedly")]
    WorkerPanicked,

    /// An action name cannot be used as an output folder name.
    #[error("Action name '{name}' is not a valid folder name")]
    InvalidActionName { name: String },

    /// The host was lost because the previous worker terminated abnormally.
    #[error("Host is unavailable after the render worker terminated")]
    HostUnavailable,

    /// A compositor graph references a node that does not exist.
    #[error("Invalid compositor graph: {message}")]
    InvalidGraph { message: String },
}

impl CoreError {
    /// Wraps a host error.
    pub fn host(err: impl Into<BoxedHostError>) -> Self {
        Self::Host(err.into())
    }

    /// Creates a new invalid config error.
    pub fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }

    /// Returns true if the error was detected before any work was started.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidConfig { .. }
                | CoreError::NoSelection
                | CoreError::MissingAnimationData { .. }
                | CoreError::NoActionSelected
                | CoreError::JobAlreadyRunning
                | CoreError::InvalidActionName { .. }
        )
    }
}

impl CodedError for CoreError {
    fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidConfig { .. } => "CORE_001",
            CoreError::NoSelection => "CORE_002",
            CoreError::MissingAnimationData { .. } => "CORE_003",
            CoreError::NoActionSelected => "CORE_004",
            CoreError::JobAlreadyRunning => "CORE_005",
            CoreError::NoActiveJob => "CORE_006",
            CoreError::Host(_) => "CORE_007",
            CoreError::CreateDirFailed { .. } => "CORE_008",
            CoreError::RemoveDirFailed { .. } => "CORE_009",
            CoreError::WorkerPanicked => "CORE_010",
            CoreError::InvalidGraph { .. } => "CORE_011",
            CoreError::InvalidActionName { .. } => "CORE_012",
            CoreError::HostUnavailable => "CORE_013",
        }
    }

    fn category(&self) -> &'static str {
        "core"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_messages() {
        assert_eq!(CoreError::NoSelection.to_string(), "No object is selected.");
        assert_eq!(
            CoreError::MissingAnimationData {
                object: "Cube".to_string()
            }
            .to_string(),
            "Object Cube has no animation data."
        );
        assert!(CoreError::NoActionSelected.is_precondition());
        assert!(!CoreError::WorkerPanicked.is_precondition());
    }

    #[test]
    fn test_host_error_wraps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "render crashed");
        let err = CoreError::host(io);
        assert!(err.to_string().contains("render crashed"));
        assert_eq!(err.code(), "CORE_007");
        assert_eq!(err.category(), "core");
    }
}
