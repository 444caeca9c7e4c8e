//! Error types for checkfactor
//!
//! Centralized error handling using thiserror. Missing or half-written
//! artifacts are not errors here; they are reported through `ReadOutcome`.
//! Only faults in the pipeline's configuration reach the caller.

use std::path::PathBuf;

use thiserror::Error;

/// All error types that can escape the progress engine
#[derive(Debug, Error)]
pub enum CheckError {
    /// A step declaration exists but cannot be resolved into steps
    #[error("Step declaration error in {path}: {reason}")]
    StepDeclaration { path: PathBuf, reason: String },

    /// A direction name was requested that is not part of the run
    #[error("Unknown direction: {0}")]
    UnknownDirection(String),

    /// The working directory does not look like a Factor run
    #[error("Invalid working directory: {0}")]
    WorkingDir(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for checkfactor operations
pub type Result<T> = std::result::Result<T, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_declaration_error() {
        let err = CheckError::StepDeclaration {
            path: PathBuf::from("/run/results/facetselfcal/s1/pipeline.parset"),
            reason: "missing pipeline.steps".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Step declaration error in /run/results/facetselfcal/s1/pipeline.parset: missing pipeline.steps"
        );
    }

    #[test]
    fn test_unknown_direction_error() {
        let err = CheckError::UnknownDirection("facet_patch_42".to_string());
        assert_eq!(err.to_string(), "Unknown direction: facet_patch_42");
    }

    #[test]
    fn test_working_dir_error() {
        let err = CheckError::WorkingDir("/nope has no state directory".to_string());
        assert_eq!(err.to_string(), "Invalid working directory: /nope has no state directory");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CheckError = io_err.into();
        assert!(matches!(err, CheckError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: CheckError = json_err.into();
        assert!(matches!(err, CheckError::Json(_)));
    }
}
