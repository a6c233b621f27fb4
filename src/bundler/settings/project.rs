//! Project description consumed by every pipeline stage.

use super::PackagingOptions;
use std::path::{Path, PathBuf};

/// Reference to a packaged dependency library (`.aar` or `.jar`).
///
/// A dependency is identified only by its archive base name, which also
/// names its cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DependencyReference {
    path: PathBuf,
}

impl DependencyReference {
    /// Creates a reference to the archive at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive file name without its extension.
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Returns true for a plain Java archive.
    pub fn is_jar(&self) -> bool {
        crate::bundler::utils::fs::has_extension(&self.path, "jar")
    }
}

/// A compilable Android application unit.
///
/// Constructed through [`ProjectBuilder`](super::ProjectBuilder), which
/// validates the root directory. Every output path below is derived from
/// [`Project::output_dir`] and owned by exactly one stage.
#[derive(Clone, Debug)]
pub struct Project {
    pub(super) root: PathBuf,
    pub(super) package: String,
    pub(super) source_roots: Vec<PathBuf>,
    pub(super) dependencies: Vec<DependencyReference>,
    pub(super) output_dir: PathBuf,
    pub(super) manifest: PathBuf,
    pub(super) res_dir: PathBuf,
    pub(super) assets_dir: PathBuf,
    pub(super) artifact_name: String,
    pub(super) min_api: u32,
    pub(super) debuggable: bool,
    pub(super) packaging: PackagingOptions,
}

impl Project {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Application package identity, e.g. `com.example.app`.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Source roots in declared order.
    pub fn source_roots(&self) -> &[PathBuf] {
        &self.source_roots
    }

    /// Dependencies in declared order. Order is significant for the class
    /// path and the resource overlay.
    pub fn dependencies(&self) -> &[DependencyReference] {
        &self.dependencies
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    pub fn res_dir(&self) -> &Path {
        &self.res_dir
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn artifact_name(&self) -> &str {
        &self.artifact_name
    }

    pub fn min_api(&self) -> u32 {
        self.min_api
    }

    pub fn debuggable(&self) -> bool {
        self.debuggable
    }

    pub fn packaging(&self) -> &PackagingOptions {
        &self.packaging
    }

    /// Compiled class output, owned by the compile stage.
    pub fn classes_dir(&self) -> PathBuf {
        self.output_dir.join("classes")
    }

    /// Generated sources (`R.java`), owned by the resource stage.
    pub fn generated_source_dir(&self) -> PathBuf {
        self.output_dir.join("gen")
    }

    /// Dex output, owned by the convert stage.
    pub fn dex_dir(&self) -> PathBuf {
        self.output_dir.join("dex")
    }

    /// Packaged resource table, owned by the resource stage.
    pub fn resource_package(&self) -> PathBuf {
        self.output_dir.join("resources.ap_")
    }

    /// Unsigned APK, owned by the archive stage.
    pub fn unsigned_apk(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}-unsigned.apk", self.artifact_name))
    }

    /// Zip-aligned APK, owned by the archive stage when alignment is enabled.
    pub fn aligned_apk(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}-aligned.apk", self.artifact_name))
    }

    /// Final signed artifact, owned by the sign stage.
    pub fn signed_apk(&self) -> PathBuf {
        self.output_dir.join(format!("{}.apk", self.artifact_name))
    }
}
