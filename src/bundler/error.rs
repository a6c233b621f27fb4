//! Error types for build pipeline operations.
//!
//! Provides contextual error chaining, filesystem errors that carry the
//! offending path, and the [`FailureKind`] taxonomy every task failure is
//! reported under.
//!
//! # Features
//!
//! - **Context trait**: Add context to errors similar to anyhow
//! - **ErrorExt trait**: Filesystem operations with automatic path context
//! - **bail! macro**: Early return with formatted error messages
//! - **FailureKind**: Classification consumed by the pipeline runner

use serde::Serialize;
use std::{
    fmt::{self, Display},
    io,
    path::{self, PathBuf},
};
use thiserror::Error as DeriveError;

/// Classification of a task failure.
///
/// The runner never branches on the kind; every kind aborts the remaining
/// pipeline. The kind is preserved for the caller's diagnostics.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed project, options or tool setup detected before a tool ran.
    Configuration,
    /// Dependency archive unreadable or corrupt, or cache directory unusable.
    Extraction,
    /// External process could not start or returned a non-success status.
    ToolInvocation,
    /// A task panicked.
    UnexpectedFault,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Configuration => "ConfigurationError",
            FailureKind::Extraction => "ExtractionError",
            FailureKind::ToolInvocation => "ToolInvocationError",
            FailureKind::UnexpectedFault => "UnexpectedFault",
        };
        f.write_str(name)
    }
}

/// Errors returned by the build pipeline.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Context describing the operation (e.g., "creating classes directory")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// Malformed project description, options or tool configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A dependency archive could not be unpacked into the cache.
    #[error("failed to extract {archive}: {reason}")]
    Extraction {
        /// Archive being extracted
        archive: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Child process could not be spawned.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Command that failed to execute
        command: String,
        /// The underlying error
        error: io::Error,
    },

    /// Child process ran but reported failure.
    #[error("{tool} exited with {}: {detail}", describe_exit(.code))]
    ToolFailed {
        /// Tool that failed
        tool: String,
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Tail of the tool's diagnostic output
        detail: String,
    },

    /// Required tool is neither configured nor on `PATH`.
    #[error("{tool} not found. {hint}")]
    ToolNotFound {
        /// Tool name
        tool: String,
        /// Installation hint
        hint: String,
    },

    /// APK signing failed.
    #[error("failed to sign apk: {0}")]
    Sign(String),

    /// Generic I/O error.
    #[error("{0}")]
    IoError(#[from] io::Error),

    /// Error walking a directory tree.
    #[error("{0}")]
    WalkdirError(#[from] walkdir::Error),

    /// Path prefix stripping error.
    #[error("{0}")]
    StripError(#[from] path::StripPrefixError),

    /// ZIP archive read/write error.
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    /// Invalid glob pattern in packaging options.
    #[error("{0}")]
    GlobPattern(#[from] glob::PatternError),

    /// JSON serialization error (build reports).
    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    /// Build manifest parsing error.
    #[error("{0}")]
    TomlError(#[from] toml::de::Error),

    /// Generic error with custom message.
    #[error("{0}")]
    GenericError(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}

impl Error {
    /// Classifies this error for task failure reporting.
    ///
    /// Returns `None` for errors whose kind depends on which stage raised
    /// them (plain I/O, zip, tree walking); the stage supplies the default.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Error::Context(_, inner) => inner.kind(),
            Error::Configuration(_)
            | Error::ToolNotFound { .. }
            | Error::GlobPattern(_)
            | Error::TomlError(_) => Some(FailureKind::Configuration),
            Error::Extraction { .. } => Some(FailureKind::Extraction),
            Error::CommandFailed { .. } | Error::ToolFailed { .. } | Error::Sign(_) => {
                Some(FailureKind::ToolInvocation)
            }
            _ => None,
        }
    }
}

/// Convenient type alias for Result.
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for adding context to errors.
///
/// Similar to `anyhow::Context` but integrated with the pipeline's Error type.
/// Works with both `Result<T, E>` and `Option<T>`.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying resource".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Macro for early return with error.
///
/// Converts the message into a [`Error::GenericError`] and returns immediately.
///
/// ```ignore
/// bail!("operation failed");
/// bail!("invalid value: {}", value);
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::error::Error::GenericError($msg.into()))
    };
    ($err:expr $(,)?) => {
        return Err($crate::bundler::error::Error::GenericError($err.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::error::Error::GenericError(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_preserves_inner_kind() {
        let err: Result<()> = Err(Error::Extraction {
            archive: PathBuf::from("lib.aar"),
            reason: "corrupt".into(),
        });
        let err = err.context("extracting dependencies").unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::Extraction));
        assert!(err.to_string().starts_with("extracting dependencies: "));
    }

    #[test]
    fn plain_io_errors_are_unclassified() {
        let err = Error::IoError(io::Error::other("disk full"));
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn tool_failure_message_names_exit_status() {
        let err = Error::ToolFailed {
            tool: "aapt".into(),
            code: Some(1),
            detail: "ERROR: missing manifest".into(),
        };
        assert_eq!(
            err.to_string(),
            "aapt exited with status 1: ERROR: missing manifest"
        );
        assert_eq!(err.kind(), Some(FailureKind::ToolInvocation));
    }

    #[test]
    fn failure_kind_display_names() {
        assert_eq!(FailureKind::Configuration.to_string(), "ConfigurationError");
        assert_eq!(FailureKind::UnexpectedFault.to_string(), "UnexpectedFault");
    }
}
