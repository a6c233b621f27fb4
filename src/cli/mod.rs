//! Command line interface for the Android bundler.
//!
//! Parses arguments, loads `bundle.toml`, runs the pipeline and renders the
//! build report.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::bundler::{
    AndroidBundler, BuildContextBuilder, BuildOutcome, BundleResult, Pipeline,
};
use crate::error::{BundlerError, Result, suggestions_for};
use crate::metadata::load_manifest;
use std::path::Path;

/// Exit code of a build interrupted by Ctrl+C
pub const EXIT_CANCELLED: i32 = 130;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate().map_err(BundlerError::Cli)?;
    let config = RuntimeConfig::from(&args);

    match execute(&args, &config).await {
        Ok(code) => Ok(code),
        Err(e) => {
            config.output().error(&e.to_string());
            for suggestion in e.recovery_suggestions() {
                let _ = config.output().indent(&format!("→ {suggestion}"));
            }
            Ok(1)
        }
    }
}

async fn execute(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let output = config.output();
    let manifest_path = args.manifest_path();
    output.verbose(&format!("Loading {}", manifest_path.display()))?;
    let manifest = load_manifest(&manifest_path)?;

    let project = manifest.project_builder(&args.project, args.release).build()?;
    let identity = manifest.signing_identity(project.root(), args.release)?;

    let mut context = BuildContextBuilder::new()
        .verbose(args.verbose)
        .tools(manifest.tools.clone());
    if let Some(dir) = &args.cache_dir {
        context = context.cache_root(dir);
    }
    if let Some(dir) = &args.work_dir {
        context = context.work_dir(dir);
    }
    let context = context.build();

    for tool in context.tools().missing() {
        output.warn(&format!("{tool} was not found; the stage that runs it will fail"))?;
    }

    output.section(&format!(
        "{} ({})",
        project.package(),
        if args.release { "release" } else { "debug" }
    ))?;
    output.verbose(&format!("Cache: {}", context.cache_root().display()))?;
    output.verbose(&format!("Signing with {identity}"))?;

    let bundler = AndroidBundler::new(Pipeline::new(project, context, identity));
    let cancel = bundler.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupt received, stopping after the current stage");
            cancel.cancel();
        }
    });

    output.progress("Building APK...")?;
    let result = bundler.bundle().await;
    interrupt.abort();
    let result = result?;

    output.report(&result.report)?;
    if let Some(artifact) = &result.artifact {
        output.success(&format!("Created {}", artifact.path.display()))?;
        output.indent(&format!("{} bytes", artifact.size))?;
        output.indent(&format!("SHA256: {}", artifact.checksum))?;
    }
    if let Some((_, failure)) = result.report.failure() {
        for suggestion in suggestions_for(Some(failure.kind)) {
            output.indent(&format!("→ {suggestion}"))?;
        }
    }

    if let Some(path) = &args.report {
        write_report(path, &result)?;
        output.info(&format!("Report written to {}", path.display()))?;
    }

    Ok(exit_code(&result))
}

fn write_report(path: &Path, result: &BundleResult) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(result)?)?;
    Ok(())
}

fn exit_code(result: &BundleResult) -> i32 {
    match result.report.outcome {
        BuildOutcome::Success => 0,
        BuildOutcome::Failed { .. } => 1,
        BuildOutcome::Cancelled { .. } => EXIT_CANCELLED,
    }
}
