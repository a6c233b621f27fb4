//! Command line argument parsing and validation.

use clap::Parser;
use std::path::PathBuf;

use crate::error::CliError;
use crate::metadata::MANIFEST_FILE;

/// Android APK bundler
#[derive(Parser, Debug)]
#[command(
    name = "kodegen_bundler_android",
    version,
    about = "Builds and signs an Android APK from sources, resources and library archives",
    long_about = "Builds and signs an Android APK from Java sources, resources and .aar/.jar dependencies.

Runs extract-dependencies, compile, package-resources, convert, archive and sign in order,
stopping at the first failing stage. The project is described by bundle.toml.

Usage:
  kodegen_bundler_android --project ./hello
  kodegen_bundler_android --project ./hello --release --report build-report.json

Exit code 0 = signed APK exists in the project's output directory.
Exit code 130 = build cancelled (Ctrl+C)."
)]
pub struct Args {
    /// Project root directory
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub project: PathBuf,

    /// Build manifest (defaults to <project>/bundle.toml)
    #[arg(short, long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Library extraction cache directory
    #[arg(long, value_name = "DIR", env = "KODEGEN_ANDROID_CACHE")]
    pub cache_dir: Option<PathBuf>,

    /// Scratch directory for intermediate files (kept after the build)
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Release build: not debuggable, signed with the [signing] keystore
    #[arg(short, long)]
    pub release: bool,

    /// Stream tool output and pass verbose flags to the tools
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Write the JSON build report to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), CliError> {
        if self.verbose && self.quiet {
            return Err(CliError::ConflictingArguments {
                arguments: vec!["--verbose".to_string(), "--quiet".to_string()],
            });
        }

        if self.project.as_os_str().is_empty() {
            return Err(CliError::InvalidArguments {
                reason: "Project directory cannot be empty".to_string(),
            });
        }

        if let Some(report) = &self.report
            && report.is_dir()
        {
            return Err(CliError::InvalidArguments {
                reason: format!("Report path {} is a directory", report.display()),
            });
        }

        Ok(())
    }

    /// Manifest path, falling back to `bundle.toml` in the project root.
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| self.project.join(MANIFEST_FILE))
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
        }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}
