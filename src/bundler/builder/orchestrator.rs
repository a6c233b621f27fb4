//! Main bundler orchestration.
//!
//! This module provides the [`AndroidBundler`] that launches the pipeline on
//! a worker task and describes the artifact it produced.

use crate::bundler::{
    Error, Result,
    error::{Context, ErrorExt},
    pipeline::Pipeline,
    report::BuildReport,
    utils::fs,
};
use serde::Serialize;
use std::path::PathBuf;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use super::checksum::calculate_sha256;

/// The signed APK produced by a successful build.
#[derive(Clone, Debug, Serialize)]
pub struct BundledArtifact {
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Hex-encoded SHA-256
    pub checksum: String,
}

/// Report of one build plus the artifact when it succeeded.
#[derive(Clone, Debug, Serialize)]
pub struct BundleResult {
    pub report: BuildReport,
    pub artifact: Option<BundledArtifact>,
}

/// Runs the Android build pipeline for one project.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_android::bundler::{
///     AndroidBundler, BuildContextBuilder, Pipeline, ProjectBuilder, SigningIdentity,
/// };
///
/// # async fn example() -> kodegen_bundler_android::bundler::Result<()> {
/// let project = ProjectBuilder::new("hello").package("com.example.hello").build()?;
/// let context = BuildContextBuilder::new().build();
/// let identity = SigningIdentity::debug("/home/dev/.android/debug.keystore");
///
/// let bundler = AndroidBundler::new(Pipeline::new(project, context, identity));
/// let result = bundler.bundle().await?;
/// if let Some(artifact) = result.artifact {
///     println!("Created: {} ({} bytes)", artifact.path.display(), artifact.size);
///     println!("SHA256: {}", artifact.checksum);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AndroidBundler {
    pipeline: Pipeline,
    cancel: CancellationToken,
}

impl AndroidBundler {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            cancel: CancellationToken::new(),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Cancels the build at the next task boundary.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs every stage and describes the produced artifact.
    ///
    /// A failed or cancelled build is not an `Err`; it is reported through
    /// [`BundleResult::report`]. `Err` means the worker itself failed or the
    /// artifact could not be inspected.
    pub async fn bundle(&self) -> Result<BundleResult> {
        let joined = self.pipeline.runner(self.cancel.clone()).spawn().await;
        let report = self.settle(joined).await?;

        if !report.is_success() {
            return Ok(BundleResult {
                report,
                artifact: None,
            });
        }

        let path = self.pipeline.project().signed_apk();
        let size = tokio::fs::metadata(&path)
            .await
            .fs_context("reading artifact metadata", &path)?
            .len();
        let checksum = calculate_sha256(&path)
            .await
            .with_context(|| format!("checksumming {}", path.display()))?;

        Ok(BundleResult {
            report,
            artifact: Some(BundledArtifact {
                path,
                size,
                checksum,
            }),
        })
    }

    /// Removes a generated work directory, then surfaces a failed worker.
    async fn settle(
        &self,
        joined: std::result::Result<BuildReport, JoinError>,
    ) -> Result<BuildReport> {
        let context = self.pipeline.context();
        if context.owns_work_dir()
            && let Err(e) = fs::remove_dir_all(context.work_dir()).await
        {
            log::warn!(
                "Failed to remove work directory {}: {}",
                context.work_dir().display(),
                e
            );
        }
        joined.map_err(|e| Error::GenericError(format!("pipeline worker failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{BuildContextBuilder, ProjectBuilder, SigningIdentity};

    fn bundler(root: &std::path::Path, work_dir: Option<&std::path::Path>) -> AndroidBundler {
        let project = ProjectBuilder::new(root)
            .package("com.example.hello")
            .build()
            .unwrap();
        let mut context = BuildContextBuilder::new().cache_root(root.join("cache"));
        if let Some(dir) = work_dir {
            context = context.work_dir(dir);
        }
        AndroidBundler::new(Pipeline::new(
            project,
            context.build(),
            SigningIdentity::debug(root.join("debug.keystore")),
        ))
    }

    #[tokio::test]
    async fn failed_worker_still_removes_generated_work_dir() {
        let temp = tempfile::tempdir().unwrap();
        let bundler = bundler(temp.path(), None);
        let work_dir = bundler.pipeline().context().work_dir().to_path_buf();
        assert!(bundler.pipeline().context().owns_work_dir());
        std::fs::create_dir_all(&work_dir).unwrap();
        std::fs::write(work_dir.join("javac-sources.txt"), "Main.java").unwrap();

        let joined = tokio::spawn(async { panic!("worker died") }).await;
        let err = bundler.settle(joined).await.unwrap_err();

        assert!(err.to_string().contains("pipeline worker failed"));
        assert!(!work_dir.exists());
    }

    #[tokio::test]
    async fn explicit_work_dir_is_kept() {
        let temp = tempfile::tempdir().unwrap();
        let work_dir = temp.path().join("work");
        std::fs::create_dir_all(&work_dir).unwrap();
        let bundler = bundler(temp.path(), Some(&work_dir));

        let report = BuildReport {
            outcome: crate::bundler::BuildOutcome::Success,
            tasks: Vec::new(),
            started_at: chrono::Utc::now(),
            elapsed_ms: 0,
        };
        assert!(bundler.settle(Ok(report)).await.unwrap().is_success());
        assert!(work_dir.is_dir());
    }
}
