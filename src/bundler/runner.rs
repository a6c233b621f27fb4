//! Sequential task runner.
//!
//! The runner is a plain ordered iteration: each task is awaited to
//! completion before the next one starts, and the first failure stops the
//! pipeline. [`Runner::spawn`] is the only place a worker is involved; it
//! moves the whole iteration onto a tokio task.

use crate::bundler::{
    report::{BuildOutcome, BuildReport, TaskRecord, TaskStatus},
    task::{Task, TaskFailure},
};
use futures_lite::FutureExt;
use std::{any::Any, panic::AssertUnwindSafe, time::Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Executes an ordered list of tasks, aborting on the first failure.
#[derive(Default)]
pub struct Runner {
    tasks: Vec<Box<dyn Task>>,
    cancel: CancellationToken,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runner that stops at the next task boundary once `cancel`
    /// is triggered.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            tasks: Vec::new(),
            cancel,
        }
    }

    /// Appends a task.
    pub fn add_task(&mut self, task: Box<dyn Task>) -> &mut Self {
        self.tasks.push(task);
        self
    }

    /// Token that requests cancellation at the next task boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs every task in insertion order.
    ///
    /// A panicking task is reported as an
    /// [`UnexpectedFault`](crate::bundler::FailureKind::UnexpectedFault)
    /// carrying the panic message.
    pub async fn run(self) -> BuildReport {
        let started_at = chrono::Utc::now();
        let start = Instant::now();
        let mut records = Vec::with_capacity(self.tasks.len());
        let mut outcome = BuildOutcome::Success;

        for task in &self.tasks {
            if self.cancel.is_cancelled() {
                log::warn!("Build cancelled before {}", task.name());
                outcome = BuildOutcome::Cancelled {
                    pending_task: task.name().to_string(),
                };
                break;
            }

            log::info!("▶ {}", task.name());
            let task_start = Instant::now();
            // run() is called inside the guarded future so a panic while
            // building the future is caught as well
            let result = AssertUnwindSafe(async { task.run().await })
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(TaskFailure::unexpected(panic_message(panic.as_ref())))
                });
            let elapsed_ms = millis(task_start);

            match result {
                Ok(()) => {
                    log::info!("✓ {} ({} ms)", task.name(), elapsed_ms);
                    records.push(TaskRecord {
                        name: task.name().to_string(),
                        status: TaskStatus::Succeeded,
                        elapsed_ms,
                    });
                }
                Err(failure) => {
                    log::error!("✗ {} failed: {}", task.name(), failure);
                    records.push(TaskRecord {
                        name: task.name().to_string(),
                        status: TaskStatus::Failed {
                            kind: failure.kind,
                            message: failure.message.clone(),
                        },
                        elapsed_ms,
                    });
                    outcome = BuildOutcome::Failed {
                        task: task.name().to_string(),
                        kind: failure.kind,
                        message: failure.message,
                    };
                    break;
                }
            }
        }

        BuildReport {
            outcome,
            tasks: records,
            started_at,
            elapsed_ms: millis(start),
        }
    }

    /// Launches [`Runner::run`] on a dedicated tokio task.
    pub fn spawn(self) -> JoinHandle<BuildReport> {
        tokio::spawn(self.run())
    }
}

fn millis(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("task panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("task panicked: {message}")
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{error::FailureKind, task::TaskFuture};
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    enum Behavior {
        Succeed,
        Fail(FailureKind),
        Panic,
        PanicInBlockingWork,
        Cancel(CancellationToken),
    }

    struct Scripted {
        name: String,
        behavior: Behavior,
        log: Log,
    }

    impl Task for Scripted {
        fn name(&self) -> &str {
            &self.name
        }

        fn run(&self) -> TaskFuture<'_> {
            Box::pin(async move {
                self.log.lock().unwrap().push(self.name.clone());
                match &self.behavior {
                    Behavior::Succeed => Ok(()),
                    Behavior::Fail(kind) => Err(TaskFailure::new(*kind, "scripted failure")),
                    Behavior::Panic => panic!("scripted panic in {}", self.name),
                    Behavior::PanicInBlockingWork => {
                        let dir = tempfile::tempdir().unwrap();
                        std::fs::write(dir.path().join("classes.dex"), b"dex").unwrap();
                        crate::bundler::utils::fs::collect_files(
                            vec![dir.path().to_path_buf()],
                            |_| panic!("defect in blocking work"),
                        )
                        .await
                        .map_err(|e| TaskFailure::from_error(e, FailureKind::ToolInvocation))?;
                        Ok(())
                    }
                    Behavior::Cancel(token) => {
                        token.cancel();
                        Ok(())
                    }
                }
            })
        }
    }

    fn task(name: &str, behavior: Behavior, log: &Log) -> Box<dyn Task> {
        Box::new(Scripted {
            name: name.to_string(),
            behavior,
            log: log.clone(),
        })
    }

    #[tokio::test]
    async fn empty_runner_succeeds() {
        let report = Runner::new().run().await;
        assert!(report.is_success());
        assert!(report.tasks.is_empty());
    }

    #[tokio::test]
    async fn all_tasks_run_once_in_order() {
        let log = Log::default();
        let mut runner = Runner::new();
        for name in ["a", "b", "c", "d"] {
            runner.add_task(task(name, Behavior::Succeed, &log));
        }

        let report = runner.run().await;

        assert!(report.is_success());
        assert_eq!(*log.lock().unwrap(), ["a", "b", "c", "d"]);
        assert_eq!(report.executed(), ["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn failure_at_each_position_stops_the_pipeline() {
        for k in 0..4 {
            let log = Log::default();
            let mut runner = Runner::new();
            for i in 0..4 {
                let behavior = if i == k {
                    Behavior::Fail(FailureKind::ToolInvocation)
                } else {
                    Behavior::Succeed
                };
                runner.add_task(task(&format!("t{i}"), behavior, &log));
            }

            let report = runner.run().await;

            let expected: Vec<String> = (0..=k).map(|i| format!("t{i}")).collect();
            assert_eq!(*log.lock().unwrap(), expected);
            assert_eq!(
                report.outcome,
                BuildOutcome::Failed {
                    task: format!("t{k}"),
                    kind: FailureKind::ToolInvocation,
                    message: "scripted failure".into(),
                }
            );
        }
    }

    #[tokio::test]
    async fn panics_become_unexpected_faults() {
        let log = Log::default();
        let mut runner = Runner::new();
        runner
            .add_task(task("first", Behavior::Succeed, &log))
            .add_task(task("boom", Behavior::Panic, &log))
            .add_task(task("never", Behavior::Succeed, &log));

        let report = runner.run().await;

        let (name, failure) = report.failure().unwrap();
        assert_eq!(name, "boom");
        assert_eq!(failure.kind, FailureKind::UnexpectedFault);
        assert!(failure.message.contains("scripted panic in boom"));
        assert_eq!(*log.lock().unwrap(), ["first", "boom"]);
    }

    #[tokio::test]
    async fn panics_on_the_blocking_pool_become_unexpected_faults() {
        let log = Log::default();
        let mut runner = Runner::new();
        runner
            .add_task(task("collect", Behavior::PanicInBlockingWork, &log))
            .add_task(task("never", Behavior::Succeed, &log));

        let report = runner.run().await;

        let (name, failure) = report.failure().unwrap();
        assert_eq!(name, "collect");
        assert_eq!(failure.kind, FailureKind::UnexpectedFault);
        assert_eq!(failure.message, "task panicked: defect in blocking work");
        assert_eq!(*log.lock().unwrap(), ["collect"]);
    }

    #[tokio::test]
    async fn cancellation_is_honored_at_task_boundaries() {
        let log = Log::default();
        let mut runner = Runner::new();
        let token = runner.cancellation_token();
        runner
            .add_task(task("a", Behavior::Cancel(token), &log))
            .add_task(task("b", Behavior::Succeed, &log));

        let report = runner.run().await;

        assert_eq!(*log.lock().unwrap(), ["a"]);
        assert_eq!(
            report.outcome,
            BuildOutcome::Cancelled {
                pending_task: "b".into()
            }
        );
    }

    #[tokio::test]
    async fn spawned_runner_reports_through_the_handle() {
        let log = Log::default();
        let mut runner = Runner::new();
        runner.add_task(task("only", Behavior::Succeed, &log));

        let report = runner.spawn().await.unwrap();
        assert!(report.is_success());
    }
}
