//! Build manifest (`bundle.toml`) loading.
//!
//! ```toml
//! [project]
//! package = "com.example.hello"
//! source_roots = ["src"]
//! dependencies = ["libs/appcompat.aar", "libs/gson.jar"]
//! min_api = 21
//!
//! [packaging]
//! no_compress = ["png"]
//!
//! [tools]
//! align = true
//!
//! [signing]
//! keystore = "release.jks"
//! alias = "upload"
//! ```

use crate::bundler::{
    PackagingOptions, ProjectBuilder, SigningIdentity, ToolPaths,
    builder::{DEFAULT_KEY_PASSWORD_VAR, DEFAULT_STORE_PASSWORD_VAR},
};
use crate::error::{BundlerError, CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Manifest file name looked up in the project root.
pub const MANIFEST_FILE: &str = "bundle.toml";

/// The `[project]` table.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectSection {
    pub package: String,
    pub source_roots: Vec<PathBuf>,
    pub dependencies: Vec<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub res_dir: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub artifact_name: Option<String>,
    pub min_api: Option<u32>,
}

/// The `[signing]` table, used for release builds.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SigningSection {
    pub keystore: PathBuf,
    pub alias: String,
    /// Environment variable holding the keystore secret
    #[serde(default = "default_store_password_env")]
    pub store_password_env: String,
    /// Environment variable holding the key secret
    #[serde(default = "default_key_password_env")]
    pub key_password_env: String,
    /// Keystore used for debug builds instead of `~/.android/debug.keystore`
    pub debug_keystore: Option<PathBuf>,
}

fn default_store_password_env() -> String {
    DEFAULT_STORE_PASSWORD_VAR.to_string()
}

fn default_key_password_env() -> String {
    DEFAULT_KEY_PASSWORD_VAR.to_string()
}

/// Parsed `bundle.toml`.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildManifest {
    pub project: ProjectSection,
    #[serde(default)]
    pub packaging: PackagingOptions,
    #[serde(default)]
    pub tools: ToolPaths,
    pub signing: Option<SigningSection>,
}

impl BuildManifest {
    /// Project builder rooted at `root`, configured from `[project]` and `[packaging]`.
    pub fn project_builder(&self, root: &Path, release: bool) -> ProjectBuilder {
        let section = &self.project;
        let mut builder = ProjectBuilder::new(root)
            .package(section.package.clone())
            .debuggable(!release)
            .packaging(self.packaging.clone());
        for source_root in &section.source_roots {
            builder = builder.source_root(source_root);
        }
        for dependency in &section.dependencies {
            builder = builder.dependency(dependency);
        }
        if let Some(dir) = &section.output_dir {
            builder = builder.output_dir(dir);
        }
        if let Some(manifest) = &section.manifest {
            builder = builder.manifest(manifest);
        }
        if let Some(dir) = &section.res_dir {
            builder = builder.res_dir(dir);
        }
        if let Some(dir) = &section.assets_dir {
            builder = builder.assets_dir(dir);
        }
        if let Some(name) = &section.artifact_name {
            builder = builder.artifact_name(name.clone());
        }
        if let Some(level) = section.min_api {
            builder = builder.min_api(level);
        }
        builder
    }

    /// Signing identity for this build.
    ///
    /// Release builds require `[signing]` and read the secrets from its
    /// environment variables. Debug builds use the Android debug keystore.
    pub fn signing_identity(&self, root: &Path, release: bool) -> Result<SigningIdentity> {
        let resolve = |path: &Path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                root.join(path)
            }
        };

        if release {
            let signing = self.signing.as_ref().ok_or_else(|| {
                BundlerError::Cli(CliError::MissingArgument {
                    argument: "[signing] section for --release".to_string(),
                })
            })?;
            return Ok(SigningIdentity::from_env(
                resolve(&signing.keystore),
                signing.alias.clone(),
                &signing.store_password_env,
                &signing.key_password_env,
            )?);
        }

        let keystore = self
            .signing
            .as_ref()
            .and_then(|s| s.debug_keystore.as_deref())
            .map(resolve)
            .or_else(SigningIdentity::default_debug_keystore)
            .ok_or_else(|| {
                BundlerError::Cli(CliError::MissingArgument {
                    argument: "signing.debug_keystore (no home directory)".to_string(),
                })
            })?;
        Ok(SigningIdentity::debug(keystore))
    }
}

/// Loads and parses a build manifest.
pub fn load_manifest(path: &Path) -> Result<BuildManifest> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        BundlerError::Cli(CliError::ExecutionFailed {
            command: "read_manifest".to_string(),
            reason: format!("Failed to read {}: {}", path.display(), e),
        })
    })?;

    let manifest: BuildManifest = toml::from_str(&content)?;
    if manifest.project.package.is_empty() {
        return Err(BundlerError::Cli(CliError::InvalidArguments {
            reason: format!("Missing 'package' in [project] of {}", path.display()),
        }));
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
[project]
package = "com.example.hello"
source_roots = ["src", "gen-src"]
dependencies = ["libs/b.aar", "libs/a.jar"]
min_api = 24

[packaging]
ignore_assets = "*.bak"
no_compress = [".png"]

[tools]
align = true

[signing]
keystore = "release.jks"
alias = "upload"
store_password_env = "HELLO_STORE_PW"
"#;

    fn write_manifest(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(MANIFEST_FILE);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn manifest_configures_project_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let manifest = load_manifest(&write_manifest(temp.path(), MANIFEST)).unwrap();

        assert!(manifest.tools.align);
        assert_eq!(manifest.packaging.no_compress, [".png"]);
        let signing = manifest.signing.as_ref().unwrap();
        assert_eq!(signing.store_password_env, "HELLO_STORE_PW");
        assert_eq!(signing.key_password_env, DEFAULT_KEY_PASSWORD_VAR);

        let project = manifest
            .project_builder(temp.path(), true)
            .build()
            .unwrap();
        assert_eq!(project.min_api(), 24);
        assert!(!project.debuggable());
        assert_eq!(
            project.source_roots(),
            [temp.path().join("src"), temp.path().join("gen-src")]
        );
        let names: Vec<_> = project
            .dependencies()
            .iter()
            .map(|d| d.base_name())
            .collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn release_without_signing_section_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_manifest(temp.path(), "[project]\npackage = \"com.example.app\"\n");
        let manifest = load_manifest(&path).unwrap();
        let err = manifest.signing_identity(temp.path(), true).unwrap_err();
        assert!(matches!(
            err,
            BundlerError::Cli(CliError::MissingArgument { .. })
        ));
    }

    #[test]
    fn debug_builds_honor_debug_keystore_override() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_manifest(
            temp.path(),
            "[project]\npackage = \"com.example.app\"\n\n[signing]\nkeystore = \"r.jks\"\nalias = \"up\"\ndebug_keystore = \"keys/debug.jks\"\n",
        );
        let manifest = load_manifest(&path).unwrap();
        let identity = manifest.signing_identity(temp.path(), false).unwrap();
        assert_eq!(identity.store(), temp.path().join("keys/debug.jks"));
        assert_eq!(identity.alias(), "androiddebugkey");
    }

    #[test]
    fn unknown_keys_and_missing_package_are_errors() {
        let temp = tempfile::tempdir().unwrap();
        let path = write_manifest(temp.path(), "[project]\npackage = \"com.a.b\"\ntypo = 1\n");
        assert!(matches!(load_manifest(&path), Err(BundlerError::Toml(_))));

        let path = write_manifest(temp.path(), "[project]\nmin_api = 21\n");
        assert!(matches!(
            load_manifest(&path),
            Err(BundlerError::Cli(CliError::InvalidArguments { .. }))
        ));
    }
}
