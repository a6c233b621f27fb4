//! Structured build diagnostics.

use crate::bundler::{Result, error::FailureKind, task::TaskFailure};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Final status of one executed task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded,
    Failed { kind: FailureKind, message: String },
}

/// One executed task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    pub name: String,
    #[serde(flatten)]
    pub status: TaskStatus,
    pub elapsed_ms: u64,
}

/// Overall result of a pipeline run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    /// Every task succeeded (or there were none)
    Success,
    /// `task` failed and no later task ran
    Failed {
        task: String,
        kind: FailureKind,
        message: String,
    },
    /// Cancellation was requested; `pending_task` never started
    Cancelled { pending_task: String },
}

/// Outcome plus one record per executed task, in execution order.
#[derive(Clone, Debug, Serialize)]
pub struct BuildReport {
    #[serde(flatten)]
    pub outcome: BuildOutcome,
    pub tasks: Vec<TaskRecord>,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.outcome == BuildOutcome::Success
    }

    /// Name and failure of the task that stopped the pipeline.
    pub fn failure(&self) -> Option<(&str, TaskFailure)> {
        match &self.outcome {
            BuildOutcome::Failed {
                task,
                kind,
                message,
            } => Some((task.as_str(), TaskFailure::new(*kind, message.clone()))),
            _ => None,
        }
    }

    /// Names of the executed tasks, in order.
    pub fn executed(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_report_serializes_kind_and_records() {
        let report = BuildReport {
            outcome: BuildOutcome::Failed {
                task: "package-resources".into(),
                kind: FailureKind::ToolInvocation,
                message: "aapt exited with status 1: boom".into(),
            },
            tasks: vec![
                TaskRecord {
                    name: "compile".into(),
                    status: TaskStatus::Succeeded,
                    elapsed_ms: 12,
                },
                TaskRecord {
                    name: "package-resources".into(),
                    status: TaskStatus::Failed {
                        kind: FailureKind::ToolInvocation,
                        message: "aapt exited with status 1: boom".into(),
                    },
                    elapsed_ms: 3,
                },
            ],
            started_at: Utc::now(),
            elapsed_ms: 15,
        };

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["task"], "package-resources");
        assert_eq!(json["kind"], "tool_invocation");
        assert_eq!(json["tasks"][0]["status"], "succeeded");
        assert_eq!(json["tasks"][1]["kind"], "tool_invocation");
        assert!(!report.is_success());
        assert_eq!(report.executed(), ["compile", "package-resources"]);
    }
}
