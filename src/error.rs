//! Error types for the command line surface.
//!
//! Library failures arrive as [`crate::bundler::Error`]; this module wraps
//! them together with argument and manifest problems and attaches recovery
//! suggestions for the terminal.

use crate::bundler::FailureKind;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type of the binary
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Build manifest parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Pipeline errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument or manifest entry
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// Conflicting arguments
    #[error("Conflicting arguments: {arguments:?}")]
    ConflictingArguments {
        /// Arguments that conflict
        arguments: Vec<String>,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BundlerError::Cli(CliError::MissingArgument { .. }) => vec![
                "Pass --manifest or create bundle.toml in the project root".to_string(),
                "Run with --help to see every option".to_string(),
            ],
            BundlerError::Toml(_) => {
                vec!["Check bundle.toml against the [project] table layout".to_string()]
            }
            BundlerError::Bundler(e) => suggestions_for(e.kind()),
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}

/// Recovery suggestions for a pipeline failure kind.
pub fn suggestions_for(kind: Option<FailureKind>) -> Vec<String> {
    match kind {
        Some(FailureKind::Configuration) => vec![
            "Check the project paths and package name in bundle.toml".to_string(),
            "Set ANDROID_HOME or configure tool paths under [tools]".to_string(),
        ],
        Some(FailureKind::Extraction) => vec![
            "Check that every dependency archive is a valid .aar or .jar".to_string(),
            "Make sure the cache directory is writable (--cache-dir)".to_string(),
        ],
        Some(FailureKind::ToolInvocation) => vec![
            "Re-run with --verbose to see the full tool output".to_string(),
        ],
        Some(FailureKind::UnexpectedFault) => {
            vec!["This is a bug; re-run with RUST_LOG=debug and report it".to_string()]
        }
        None => vec!["Check the error message above for specific details".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_errors_point_at_archives() {
        let err = BundlerError::Bundler(crate::bundler::Error::Extraction {
            archive: "lib.aar".into(),
            reason: "corrupt".into(),
        });
        assert!(err.recovery_suggestions()[0].contains(".aar"));
    }
}
