//! Builder for constructing a validated [`Project`].

use super::{DependencyReference, PackagingOptions, Project};
use crate::bundler::{Error, Result};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

const DEFAULT_MIN_API: u32 = 21;

/// Builder for constructing [`Project`].
///
/// Relative paths are resolved against the project root.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_android::bundler::ProjectBuilder;
///
/// # fn example() -> kodegen_bundler_android::bundler::Result<()> {
/// let project = ProjectBuilder::new("/work/hello")
///     .package("com.example.hello")
///     .source_root("src")
///     .dependency("libs/appcompat.aar")
///     .build()?;
/// assert_eq!(project.output_dir(), std::path::Path::new("/work/hello/build"));
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// [`ProjectBuilder::build`] fails with a configuration error when the root
/// is missing, not a directory or not writable, or when the package identity
/// is malformed.
#[derive(Debug, Default)]
pub struct ProjectBuilder {
    root: PathBuf,
    package: Option<String>,
    source_roots: Vec<PathBuf>,
    dependencies: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    manifest: Option<PathBuf>,
    res_dir: Option<PathBuf>,
    assets_dir: Option<PathBuf>,
    artifact_name: Option<String>,
    min_api: Option<u32>,
    debuggable: bool,
    packaging: PackagingOptions,
}

impl ProjectBuilder {
    /// Starts a project rooted at `root`. Projects are debuggable by default.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            debuggable: true,
            ..Default::default()
        }
    }

    /// Sets the application package identity.
    ///
    /// # Required
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Appends a source root. Default: `<root>/src` when none is given.
    pub fn source_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_roots.push(path.as_ref().to_path_buf());
        self
    }

    /// Appends a dependency archive; order is preserved.
    pub fn dependency<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dependencies.push(path.as_ref().to_path_buf());
        self
    }

    /// Default: `<root>/build`
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: `<root>/AndroidManifest.xml`
    pub fn manifest<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.manifest = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: `<root>/res`
    pub fn res_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.res_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: `<root>/assets`
    pub fn assets_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.assets_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// File name of the signed artifact, without `.apk`.
    ///
    /// Default: last segment of the package identity
    pub fn artifact_name(mut self, name: impl Into<String>) -> Self {
        self.artifact_name = Some(name.into());
        self
    }

    /// Default: 21
    pub fn min_api(mut self, level: u32) -> Self {
        self.min_api = Some(level);
        self
    }

    pub fn debuggable(mut self, debuggable: bool) -> Self {
        self.debuggable = debuggable;
        self
    }

    pub fn packaging(mut self, options: PackagingOptions) -> Self {
        self.packaging = options;
        self
    }

    /// Validates the description and builds the project.
    pub fn build(self) -> Result<Project> {
        let root = self
            .root
            .absolutize()
            .map(|p| p.into_owned())
            .map_err(|e| {
                Error::Configuration(format!(
                    "invalid project root {}: {e}",
                    self.root.display()
                ))
            })?;
        check_root(&root)?;

        let package = self
            .package
            .ok_or_else(|| Error::Configuration("package is required".into()))?;
        check_package(&package)?;

        // Fails early rather than inside the resource stage
        self.packaging.asset_filter()?;

        let resolve = |path: PathBuf| -> PathBuf {
            let joined = if path.is_absolute() { path } else { root.join(path) };
            match joined.absolutize() {
                Ok(p) => p.into_owned(),
                Err(_) => joined,
            }
        };

        let source_roots = if self.source_roots.is_empty() {
            vec![root.join("src")]
        } else {
            self.source_roots.into_iter().map(resolve).collect()
        };
        let dependencies = self
            .dependencies
            .into_iter()
            .map(|p| DependencyReference::new(resolve(p)))
            .collect();
        let artifact_name = self.artifact_name.unwrap_or_else(|| {
            package
                .rsplit('.')
                .next()
                .unwrap_or(package.as_str())
                .to_string()
        });

        Ok(Project {
            source_roots,
            dependencies,
            output_dir: self
                .output_dir
                .map(resolve)
                .unwrap_or_else(|| root.join("build")),
            manifest: self
                .manifest
                .map(resolve)
                .unwrap_or_else(|| root.join("AndroidManifest.xml")),
            res_dir: self.res_dir.map(resolve).unwrap_or_else(|| root.join("res")),
            assets_dir: self
                .assets_dir
                .map(resolve)
                .unwrap_or_else(|| root.join("assets")),
            artifact_name,
            min_api: self.min_api.unwrap_or(DEFAULT_MIN_API),
            debuggable: self.debuggable,
            packaging: self.packaging,
            package,
            root,
        })
    }
}

/// The root must exist, be a directory and accept new files.
fn check_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(Error::Configuration(format!(
            "project root {} does not exist",
            root.display()
        )));
    }
    if !root.is_dir() {
        return Err(Error::Configuration(format!(
            "project root {} is not a directory",
            root.display()
        )));
    }

    let probe = root.join(format!(".kodegen-probe-{}", uuid::Uuid::new_v4()));
    std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)
        .map_err(|e| {
            Error::Configuration(format!(
                "project root {} is not writable: {e}",
                root.display()
            ))
        })?;
    if let Err(e) = std::fs::remove_file(&probe) {
        log::warn!("Failed to remove write probe {}: {}", probe.display(), e);
    }
    Ok(())
}

fn check_package(package: &str) -> Result<()> {
    let segments: Vec<&str> = package.split('.').collect();
    let valid_segment = |s: &&str| {
        let mut chars = s.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    if segments.len() < 2 || !segments.iter().all(valid_segment) {
        return Err(Error::Configuration(format!(
            "package '{package}' must be a dotted identifier such as com.example.app"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::error::FailureKind;

    #[test]
    fn defaults_are_derived_from_root_and_package() {
        let temp = tempfile::tempdir().unwrap();
        let project = ProjectBuilder::new(temp.path())
            .package("com.example.hello")
            .dependency("libs/b.aar")
            .dependency("libs/a.jar")
            .build()
            .unwrap();

        let root = temp.path();
        assert_eq!(project.source_roots(), [root.join("src")]);
        assert_eq!(project.output_dir(), root.join("build"));
        assert_eq!(project.manifest(), root.join("AndroidManifest.xml"));
        assert_eq!(project.artifact_name(), "hello");
        assert_eq!(project.min_api(), DEFAULT_MIN_API);
        assert!(project.debuggable());

        let names: Vec<_> = project
            .dependencies()
            .iter()
            .map(|d| d.base_name())
            .collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(project.dependencies()[0].path(), root.join("libs/b.aar"));
    }

    #[test]
    fn missing_root_is_a_configuration_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = ProjectBuilder::new(temp.path().join("absent"))
            .package("com.example.app")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::Configuration));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn file_root_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("file.txt");
        std::fs::write(&file, "").unwrap();
        let err = ProjectBuilder::new(&file)
            .package("com.example.app")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn write_probe_leaves_no_trace() {
        let temp = tempfile::tempdir().unwrap();
        ProjectBuilder::new(temp.path())
            .package("com.example.app")
            .build()
            .unwrap();
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn package_identity_is_validated() {
        let temp = tempfile::tempdir().unwrap();
        for bad in ["", "app", "com..example", "com.1example", "com.exa-mple"] {
            let err = ProjectBuilder::new(temp.path())
                .package(bad)
                .build()
                .unwrap_err();
            assert_eq!(err.kind(), Some(FailureKind::Configuration), "{bad}");
        }
        let err = ProjectBuilder::new(temp.path()).build().unwrap_err();
        assert!(err.to_string().contains("package is required"));
    }

    #[test]
    fn invalid_ignore_pattern_fails_at_build_time() {
        let temp = tempfile::tempdir().unwrap();
        let err = ProjectBuilder::new(temp.path())
            .package("com.example.app")
            .packaging(PackagingOptions {
                ignore_assets: Some("[".into()),
                ..Default::default()
            })
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::Configuration));
    }
}
