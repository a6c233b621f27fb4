//! Layout of an extracted library cache entry.

use crate::bundler::{Result, error::ErrorExt, utils::fs::has_extension};
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};

static PACKAGE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<manifest\b[^>]*?\bpackage\s*=\s*["']([^"']+)["']"#)
        .expect("package attribute regex is valid")
});

/// Packaging format of a dependency archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LibraryKind {
    /// Android library archive with resources and a nested `classes.jar`
    Aar,
    /// Plain Java archive
    Jar,
}

/// Describes the contents of one cache entry.
///
/// Accessors check the file system each time they are called, so a value
/// created with [`ExtractedLibrary::inspect`] reflects the entry as it is now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedLibrary {
    archive: PathBuf,
    dir: PathBuf,
    kind: LibraryKind,
}

impl ExtractedLibrary {
    /// Describes the cache entry `dir` populated from `archive`.
    pub fn inspect(archive: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
        let archive = archive.into();
        let kind = if has_extension(&archive, "jar") {
            LibraryKind::Jar
        } else {
            LibraryKind::Aar
        };
        Self {
            archive,
            dir: dir.into(),
            kind,
        }
    }

    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// Cache entry directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn kind(&self) -> LibraryKind {
        self.kind
    }

    /// The library's `AndroidManifest.xml`, if it ships one.
    pub fn manifest(&self) -> Option<PathBuf> {
        existing(self.dir.join("AndroidManifest.xml"), Path::is_file)
    }

    /// The library's `res/` directory, if it ships resources.
    pub fn res_dir(&self) -> Option<PathBuf> {
        existing(self.dir.join("res"), Path::is_dir)
    }

    /// The library's `assets/` directory, if it ships assets.
    pub fn assets_dir(&self) -> Option<PathBuf> {
        existing(self.dir.join("assets"), Path::is_dir)
    }

    /// Jars contributed to the class path, in a stable order.
    ///
    /// A plain `.jar` contributes the archive itself; an `.aar` contributes
    /// `classes.jar` followed by `libs/*.jar` sorted by name.
    pub fn class_path(&self) -> Vec<PathBuf> {
        match self.kind {
            LibraryKind::Jar => vec![self.archive.clone()],
            LibraryKind::Aar => {
                let mut jars: Vec<PathBuf> = existing(self.dir.join("classes.jar"), Path::is_file)
                    .into_iter()
                    .collect();
                if let Ok(entries) = std::fs::read_dir(self.dir.join("libs")) {
                    let mut nested: Vec<PathBuf> = entries
                        .filter_map(|e| e.ok())
                        .map(|e| e.path())
                        .filter(|p| p.is_file() && has_extension(p, "jar"))
                        .collect();
                    nested.sort();
                    jars.extend(nested);
                }
                jars
            }
        }
    }

    /// Package identity declared by the library manifest.
    pub fn package_name(&self) -> Result<Option<String>> {
        let Some(manifest) = self.manifest() else {
            return Ok(None);
        };
        let content =
            std::fs::read_to_string(&manifest).fs_context("reading library manifest", &manifest)?;
        Ok(parse_package(&content))
    }
}

fn existing(path: PathBuf, check: fn(&Path) -> bool) -> Option<PathBuf> {
    check(&path).then_some(path)
}

fn parse_package(manifest: &str) -> Option<String> {
    PACKAGE_ATTRIBUTE
        .captures(manifest)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_package_attribute() {
        let manifest = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="androidx.appcompat" >
    <uses-sdk android:minSdkVersion="14" />
</manifest>"#;
        assert_eq!(parse_package(manifest), Some("androidx.appcompat".into()));
        assert_eq!(parse_package("<manifest/>"), None);
    }

    #[test]
    fn aar_layout_is_discovered() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("cache/lib");
        std::fs::create_dir_all(dir.join("res/values")).unwrap();
        std::fs::create_dir_all(dir.join("libs")).unwrap();
        std::fs::write(dir.join("classes.jar"), b"").unwrap();
        std::fs::write(dir.join("libs/z.jar"), b"").unwrap();
        std::fs::write(dir.join("libs/a.jar"), b"").unwrap();
        std::fs::write(dir.join("libs/readme.txt"), b"").unwrap();
        std::fs::write(
            dir.join("AndroidManifest.xml"),
            br#"<manifest package='com.lib'/>"#,
        )
        .unwrap();

        let library = ExtractedLibrary::inspect(temp.path().join("lib.aar"), &dir);
        assert_eq!(library.kind(), LibraryKind::Aar);
        assert_eq!(library.res_dir(), Some(dir.join("res")));
        assert_eq!(library.assets_dir(), None);
        assert_eq!(
            library.class_path(),
            vec![
                dir.join("classes.jar"),
                dir.join("libs/a.jar"),
                dir.join("libs/z.jar"),
            ]
        );
        assert_eq!(library.package_name().unwrap(), Some("com.lib".into()));
    }

    #[test]
    fn plain_jar_contributes_itself() {
        let library = ExtractedLibrary::inspect("/libs/gson.jar", "/cache/gson");
        assert_eq!(library.kind(), LibraryKind::Jar);
        assert_eq!(library.class_path(), vec![PathBuf::from("/libs/gson.jar")]);
        assert_eq!(library.package_name().unwrap(), None);
    }
}
