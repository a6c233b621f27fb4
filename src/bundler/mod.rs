//! Android build pipeline.
//!
//! Turns a [`Project`] into a signed APK by running a fixed sequence of
//! stages: dependency extraction, compilation, resource packaging, dex
//! conversion, archiving and signing. Each stage drives one external tool
//! through the [`ToolInvoker`] of the [`BuildContext`]; the [`Runner`] stops
//! at the first failure and returns a [`BuildReport`].
//!
//! # Example
//!
//! ```no_run
//! use kodegen_bundler_android::bundler::{
//!     BuildContextBuilder, Pipeline, ProjectBuilder, SigningIdentity,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> kodegen_bundler_android::bundler::Result<()> {
//! let project = ProjectBuilder::new("hello")
//!     .package("com.example.hello")
//!     .dependency("libs/appcompat.aar")
//!     .build()?;
//! let context = BuildContextBuilder::new().verbose(true).build();
//! let pipeline = Pipeline::new(project, context, SigningIdentity::debug("debug.keystore"));
//!
//! let report = pipeline.runner(CancellationToken::new()).run().await;
//! if let Some((task, failure)) = report.failure() {
//!     eprintln!("{task} failed: {failure}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod settings;
pub mod task;
pub mod utils;

pub use builder::{
    AndroidBundler, BundleResult, BundledArtifact, SigningIdentity, Tool, ToolPaths,
    calculate_sha256,
};
pub use error::{Error, FailureKind, Result};
pub use extract::{ExtractedLibrary, LibraryCache, LibraryExtractor};
pub use pipeline::Pipeline;
pub use report::{BuildOutcome, BuildReport, TaskRecord, TaskStatus};
pub use runner::Runner;
pub use settings::{
    BuildContext, BuildContextBuilder, DependencyReference, PackagingOptions, Project,
    ProjectBuilder,
};
pub use task::{StageKind, Task, TaskFailure, TaskFuture, TaskResult};
pub use utils::{
    ArgumentBuilder,
    process::{Invocation, InvokeFuture, SystemInvoker, ToolInvoker, ToolOutput},
};
