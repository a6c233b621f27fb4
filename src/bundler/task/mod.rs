//! Pipeline task abstraction.
//!
//! A [`Task`] is one stage of a build: a name plus an async run operation that
//! either succeeds or returns a [`TaskFailure`] carrying a [`FailureKind`] and
//! a message. Tasks hold shared read-only references to the project and the
//! build context and recreate every output they own, so running a task again
//! from scratch is always safe.

mod stage;
pub mod stages;

pub use stage::StageKind;

use crate::bundler::error::{Error, FailureKind};
use serde::Serialize;
use std::{future::Future, pin::Pin};

/// Outcome of one task run.
pub type TaskResult = std::result::Result<(), TaskFailure>;

/// Future returned by [`Task::run`].
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = TaskResult> + Send + 'a>>;

/// One stage of the build pipeline.
pub trait Task: Send + Sync {
    /// Human readable task name used in reports.
    fn name(&self) -> &str;

    /// Runs the task to completion.
    fn run(&self) -> TaskFuture<'_>;
}

/// Controlled failure of a task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TaskFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classifies `error`, falling back to `default` for unclassified errors.
    pub fn from_error(error: Error, default: FailureKind) -> Self {
        Self::new(error.kind().unwrap_or(default), error.to_string())
    }

    /// A task panicked with `message`.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(FailureKind::UnexpectedFault, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn classified_errors_keep_their_kind() {
        let failure = TaskFailure::from_error(
            Error::Extraction {
                archive: PathBuf::from("a.aar"),
                reason: "corrupt".into(),
            },
            FailureKind::ToolInvocation,
        );
        assert_eq!(failure.kind, FailureKind::Extraction);
        assert_eq!(failure.message, "failed to extract a.aar: corrupt");
    }

    #[test]
    fn unclassified_errors_take_the_default() {
        let failure = TaskFailure::from_error(
            Error::IoError(std::io::Error::other("disk full")),
            FailureKind::ToolInvocation,
        );
        assert_eq!(failure.kind, FailureKind::ToolInvocation);
        assert_eq!(failure.to_string(), "ToolInvocationError: disk full");
    }
}
