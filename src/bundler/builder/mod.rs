//! Build orchestration and its supporting pieces.
//!
//! - [`checksum`] - SHA-256 of artifacts and cache entries
//! - [`orchestrator`] - [`AndroidBundler`], which runs a [`Pipeline`](crate::bundler::Pipeline)
//!   on a worker task and describes the produced APK
//! - [`signing`] - [`SigningIdentity`] with masked secrets
//! - [`tool_detection`] - [`ToolPaths`] resolution of the external tools

pub mod checksum;
mod orchestrator;
mod signing;
mod tool_detection;

pub use checksum::calculate_sha256;
pub use orchestrator::{AndroidBundler, BundleResult, BundledArtifact};
pub use signing::{
    DEFAULT_KEY_PASSWORD_VAR, DEFAULT_STORE_PASSWORD_VAR, Secret, SigningIdentity,
};
pub use tool_detection::{Tool, ToolPaths, find_android_jar, find_build_tool};
