//! Error types for the Blender backend.

use spriteframe_core::CodedError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for Blender backend operations.
pub type BlenderResult<T> = Result<T, BlenderError>;

/// Errors that can occur during Blender backend operations.
#[derive(Debug, Error)]
pub enum BlenderError {
    /// Blender executable not found.
    #[error("Blender executable not found. Ensure Blender is installed and in PATH, or set BLENDER_PATH environment variable")]
    BlenderNotFound,

    /// Failed to spawn Blender process.
    #[error("Failed to spawn Blender process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// Blender process timed out.
    #[error("Blender process timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Blender process exited with non-zero status.
    #[error("Blender process exited with status {exit_code}: {stderr}")]
    ProcessFailed { exit_code: i32, stderr: String },

    /// Failed to write the request file for Blender.
    #[error("Failed to write request file: {0}")]
    WriteRequestFailed(#[source] std::io::Error),

    /// Failed to read report from Blender.
    #[error("Failed to read Blender report from {path}: {source}")]
    ReadReportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse report JSON from Blender.
    #[error("Failed to parse Blender report: {0}")]
    ParseReportFailed(#[source] serde_json::Error),

    /// Blender reported an error.
    #[error("Blender reported an error: {message}")]
    BlenderFailed { message: String },

    /// Failed to serialize a request to JSON.
    #[error("Failed to serialize request: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    /// Python entrypoint script not found.
    #[error("Python entrypoint script not found at: {path}")]
    EntrypointNotFound { path: PathBuf },

    /// The .blend project does not exist.
    #[error("Blender project not found: {path}")]
    ProjectNotFound { path: PathBuf },

    /// The inspection report did not describe the scene.
    #[error("Blender report is missing scene information")]
    MissingScene,

    /// The scene has no active camera.
    #[error("Scene has no active camera")]
    NoActiveCamera,

    /// An object named for selection or binding does not exist.
    #[error("Object '{name}' not found in the project")]
    UnknownObject { name: String },

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BlenderError {
    /// Creates a new process failed error.
    pub fn process_failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::ProcessFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Creates a new Blender failure error.
    pub fn blender_failed(message: impl Into<String>) -> Self {
        Self::BlenderFailed {
            message: message.into(),
        }
    }
}

impl CodedError for BlenderError {
    fn code(&self) -> &'static str {
        match self {
            BlenderError::BlenderNotFound => "BLENDER_001",
            BlenderError::SpawnFailed(_) => "BLENDER_002",
            BlenderError::Timeout { .. } => "BLENDER_003",
            BlenderError::ProcessFailed { .. } => "BLENDER_004",
            BlenderError::WriteRequestFailed(_) => "BLENDER_005",
            BlenderError::ReadReportFailed { .. } => "BLENDER_006",
            BlenderError::ParseReportFailed(_) => "BLENDER_007",
            BlenderError::BlenderFailed { .. } => "BLENDER_008",
            BlenderError::SerializeFailed(_) => "BLENDER_009",
            BlenderError::EntrypointNotFound { .. } => "BLENDER_010",
            BlenderError::ProjectNotFound { .. } => "BLENDER_011",
            BlenderError::MissingScene => "BLENDER_012",
            BlenderError::NoActiveCamera => "BLENDER_013",
            BlenderError::UnknownObject { .. } => "BLENDER_014",
            BlenderError::Io(_) => "BLENDER_015",
        }
    }

    fn category(&self) -> &'static str {
        "blender"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BlenderError::BlenderNotFound;
        assert!(err.to_string().contains("Blender executable not found"));

        let err = BlenderError::Timeout { timeout_secs: 300 };
        assert!(err.to_string().contains("300 seconds"));

        let err = BlenderError::process_failed(1, "something went wrong");
        assert!(err.to_string().contains("something went wrong"));
    }

    #[test]
    fn test_codes() {
        assert_eq!(BlenderError::NoActiveCamera.code(), "BLENDER_013");
        assert_eq!(BlenderError::blender_failed("x").category(), "blender");
    }
}
