//! External tool detection and resolution.
//!
//! Tools are resolved in this order: an explicitly configured path, the
//! `PATH`, then the newest Android SDK `build-tools` directory found under
//! `ANDROID_HOME` or `ANDROID_SDK_ROOT` (`javac` falls back to `JAVA_HOME`).

use crate::bundler::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// External tools driven by the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
    Aapt,
    Javac,
    D8,
    Apksigner,
    Zipalign,
}

impl Tool {
    /// Every tool, in pipeline order.
    pub const ALL: [Tool; 5] = [
        Tool::Javac,
        Tool::Aapt,
        Tool::D8,
        Tool::Zipalign,
        Tool::Apksigner,
    ];

    /// Executable name looked up on `PATH`.
    pub fn program(&self) -> &'static str {
        match self {
            Tool::Aapt => "aapt",
            Tool::Javac => "javac",
            Tool::D8 => "d8",
            Tool::Apksigner => "apksigner",
            Tool::Zipalign => "zipalign",
        }
    }

    fn install_hint(&self) -> &'static str {
        match self {
            Tool::Javac => "Install a JDK and set JAVA_HOME, or set tools.javac in bundle.toml",
            _ => {
                "Install the Android SDK build-tools and set ANDROID_HOME, \
                 or configure the path under [tools] in bundle.toml"
            }
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Configured locations of the external tools and the platform library.
///
/// Unset entries are discovered on demand; an entry that is set must exist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub aapt: Option<PathBuf>,
    pub javac: Option<PathBuf>,
    pub d8: Option<PathBuf>,
    pub apksigner: Option<PathBuf>,
    pub zipalign: Option<PathBuf>,
    /// Platform `android.jar` compiled and linked against
    pub android_jar: Option<PathBuf>,
    /// Android SDK root, overriding `ANDROID_HOME`/`ANDROID_SDK_ROOT`
    pub sdk_root: Option<PathBuf>,
    /// Run `zipalign` on the assembled archive
    pub align: bool,
}

impl ToolPaths {
    fn configured(&self, tool: Tool) -> Option<&PathBuf> {
        match tool {
            Tool::Aapt => self.aapt.as_ref(),
            Tool::Javac => self.javac.as_ref(),
            Tool::D8 => self.d8.as_ref(),
            Tool::Apksigner => self.apksigner.as_ref(),
            Tool::Zipalign => self.zipalign.as_ref(),
        }
    }

    /// SDK root from configuration or the environment.
    pub fn sdk_root(&self) -> Option<PathBuf> {
        self.sdk_root.clone().or_else(|| {
            ["ANDROID_HOME", "ANDROID_SDK_ROOT"]
                .iter()
                .filter_map(|var| std::env::var_os(var))
                .map(PathBuf::from)
                .find(|p| p.is_dir())
        })
    }

    /// Resolves the executable for `tool`.
    ///
    /// # Errors
    ///
    /// [`Error::ToolNotFound`] when the configured path does not exist or the
    /// tool cannot be discovered.
    pub fn resolve(&self, tool: Tool) -> Result<PathBuf> {
        if let Some(path) = self.configured(tool) {
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(Error::ToolNotFound {
                tool: tool.to_string(),
                hint: format!("Configured path {} does not exist", path.display()),
            });
        }

        if let Ok(path) = which::which(tool.program()) {
            log::debug!("Found {} at: {}", tool, path.display());
            return Ok(path);
        }

        let fallback = match tool {
            Tool::Javac => std::env::var_os("JAVA_HOME")
                .map(|home| PathBuf::from(home).join("bin").join(executable_name(tool)))
                .filter(|p| p.is_file()),
            _ => self
                .sdk_root()
                .and_then(|root| find_build_tool(&root, tool)),
        };

        fallback.ok_or_else(|| Error::ToolNotFound {
            tool: tool.to_string(),
            hint: tool.install_hint().to_string(),
        })
    }

    /// Resolves the platform `android.jar`.
    pub fn resolve_android_jar(&self) -> Result<PathBuf> {
        if let Some(path) = &self.android_jar {
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(Error::ToolNotFound {
                tool: "android.jar".into(),
                hint: format!("Configured path {} does not exist", path.display()),
            });
        }

        self.sdk_root()
            .and_then(|root| find_android_jar(&root))
            .ok_or_else(|| Error::ToolNotFound {
                tool: "android.jar".into(),
                hint: "Install an SDK platform and set ANDROID_HOME, \
                       or set tools.android_jar in bundle.toml"
                    .into(),
            })
    }

    /// Tools that cannot currently be resolved.
    ///
    /// `zipalign` is only considered when alignment is enabled.
    pub fn missing(&self) -> Vec<Tool> {
        Tool::ALL
            .into_iter()
            .filter(|tool| *tool != Tool::Zipalign || self.align)
            .filter(|tool| self.resolve(*tool).is_err())
            .collect()
    }
}

fn executable_name(tool: Tool) -> String {
    if cfg!(windows) {
        match tool {
            Tool::D8 | Tool::Apksigner => format!("{}.bat", tool.program()),
            _ => format!("{}.exe", tool.program()),
        }
    } else {
        tool.program().to_string()
    }
}

/// Parses a dotted version directory name (`34.0.0`) for ordering.
fn version_key(name: &str) -> Option<Vec<u32>> {
    name.split(['.', '-'])
        .take_while(|part| part.chars().all(|c| c.is_ascii_digit()) && !part.is_empty())
        .map(|part| part.parse().ok())
        .collect::<Option<Vec<u32>>>()
        .filter(|v| !v.is_empty())
}

/// Finds `tool` in the newest `build-tools/<version>` directory of an SDK.
pub fn find_build_tool(sdk_root: &Path, tool: Tool) -> Option<PathBuf> {
    let entries = std::fs::read_dir(sdk_root.join("build-tools")).ok()?;
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            let candidate = e.path().join(executable_name(tool));
            version_key(&name)
                .filter(|_| candidate.is_file())
                .map(|key| (key, candidate))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, path)| path)
}

/// Finds the `android.jar` of the highest numbered `platforms/android-N`.
pub fn find_android_jar(sdk_root: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(sdk_root.join("platforms")).ok()?;
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            let level: u32 = name.strip_prefix("android-")?.parse().ok()?;
            let jar = e.path().join("android.jar");
            jar.is_file().then_some((level, jar))
        })
        .max_by_key(|(level, _)| *level)
        .map(|(_, jar)| jar)
}
