//! Android APK bundler library
//!
//! Builds a signed APK from Java sources, Android resources and `.aar`/`.jar`
//! dependencies by driving the SDK tools (`aapt`, `javac`, `d8`, `zipalign`,
//! `apksigner`) through a fixed, fail-fast pipeline.
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
