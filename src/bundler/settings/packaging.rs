//! Resource packaging options.

use crate::bundler::{Result, utils::ArgumentBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options forwarded to the resource packager and honored by the archive stage.
///
/// Translated into `aapt` arguments by [`PackagingOptions::append_args`], in
/// field order. Unset or empty fields contribute nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingOptions {
    /// Colon-separated asset ignore patterns, in `aapt --ignore-assets` syntax
    pub ignore_assets: Option<String>,
    /// File suffixes stored without compression
    pub no_compress: Vec<String>,
    /// Fail when a configuration entry is missing
    pub fail_on_missing_config_entry: bool,
    /// Extra `aapt` arguments, appended verbatim and last
    pub additional_parameters: Vec<String>,
}

impl PackagingOptions {
    /// Appends the packager arguments for these options.
    ///
    /// ```
    /// use kodegen_bundler_android::bundler::{ArgumentBuilder, PackagingOptions};
    ///
    /// let options = PackagingOptions {
    ///     no_compress: vec!["png".into()],
    ///     fail_on_missing_config_entry: true,
    ///     ..Default::default()
    /// };
    /// let mut args = ArgumentBuilder::new();
    /// options.append_args(&mut args);
    /// assert_eq!(args.to_vec(), ["-0", "png", "--error-on-missing-config-entry"]);
    /// ```
    pub fn append_args(&self, args: &mut ArgumentBuilder) {
        args.flag_value("--ignore-assets", self.ignore_assets.as_ref());
        for suffix in &self.no_compress {
            args.flag_value("-0", suffix);
        }
        args.flag_if(
            self.fail_on_missing_config_entry,
            "--error-on-missing-config-entry",
        );
        args.add(&self.additional_parameters);
    }

    /// Returns true when an archive entry with this name is stored uncompressed.
    pub fn is_stored(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.no_compress
            .iter()
            .filter(|suffix| !suffix.is_empty())
            .any(|suffix| name.ends_with(&suffix.to_ascii_lowercase()))
    }

    /// Compiles the ignore patterns.
    ///
    /// An invalid pattern is reported as a configuration error.
    pub fn asset_filter(&self) -> Result<AssetFilter> {
        AssetFilter::parse(self.ignore_assets.as_deref().unwrap_or_default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    Any,
    Dir,
    File,
}

/// Compiled `--ignore-assets` patterns.
///
/// Patterns are matched against each path component. A leading `!` (quiet
/// marker) is ignored; `<dir>` and `<file>` prefixes restrict the pattern to
/// directories or files.
#[derive(Clone, Debug, Default)]
pub struct AssetFilter {
    patterns: Vec<(Scope, glob::Pattern)>,
}

impl AssetFilter {
    /// Parses a colon-separated pattern list.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut patterns = Vec::new();
        for raw in spec.split(':').map(str::trim).filter(|p| !p.is_empty()) {
            let raw = raw.strip_prefix('!').unwrap_or(raw);
            let (scope, pattern) = if let Some(rest) = raw.strip_prefix("<dir>") {
                (Scope::Dir, rest)
            } else if let Some(rest) = raw.strip_prefix("<file>") {
                (Scope::File, rest)
            } else {
                (Scope::Any, raw)
            };
            if pattern.is_empty() {
                continue;
            }
            patterns.push((scope, glob::Pattern::new(pattern)?));
        }
        Ok(Self { patterns })
    }

    /// Returns true when no patterns are configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns true when any component of the relative `path` is ignored.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let components: Vec<_> = path.components().collect();
        components.iter().enumerate().any(|(i, component)| {
            let name = component.as_os_str().to_string_lossy();
            let is_file = i + 1 == components.len();
            self.patterns.iter().any(|(scope, pattern)| {
                let in_scope = match scope {
                    Scope::Any => true,
                    Scope::Dir => !is_file,
                    Scope::File => is_file,
                };
                in_scope && pattern.matches(&name)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::error::FailureKind;

    #[test]
    fn options_translate_in_field_order() {
        let options = PackagingOptions {
            ignore_assets: Some("*.txt".into()),
            no_compress: vec!["png".into(), "ogg".into()],
            fail_on_missing_config_entry: true,
            additional_parameters: vec!["--foo".into(), "bar".into()],
        };
        let mut args = ArgumentBuilder::new();
        options.append_args(&mut args);
        assert_eq!(
            args.to_vec(),
            [
                "--ignore-assets",
                "*.txt",
                "-0",
                "png",
                "-0",
                "ogg",
                "--error-on-missing-config-entry",
                "--foo",
                "bar",
            ]
        );
    }

    #[test]
    fn default_options_contribute_nothing() {
        let mut args = ArgumentBuilder::new();
        PackagingOptions::default().append_args(&mut args);
        assert!(args.is_empty());

        let options = PackagingOptions {
            ignore_assets: Some(String::new()),
            ..Default::default()
        };
        let mut args = ArgumentBuilder::new();
        options.append_args(&mut args);
        assert!(args.is_empty());
    }

    #[test]
    fn stored_suffixes_match_case_insensitively() {
        let options = PackagingOptions {
            no_compress: vec![".png".into(), "arsc".into()],
            ..Default::default()
        };
        assert!(options.is_stored("res/drawable/icon.PNG"));
        assert!(options.is_stored("resources.arsc"));
        assert!(!options.is_stored("classes.dex"));
    }

    #[test]
    fn asset_filter_understands_aapt_syntax() {
        let filter = AssetFilter::parse("!.svn:!.git:<dir>_*:<file>*.bak:*~").unwrap();
        assert!(filter.is_ignored(Path::new(".git/config")));
        assert!(filter.is_ignored(Path::new("_private/data.bin")));
        assert!(!filter.is_ignored(Path::new("data/_notes")));
        assert!(filter.is_ignored(Path::new("com/example/Main.bak")));
        assert!(filter.is_ignored(Path::new("readme~")));
        assert!(!filter.is_ignored(Path::new("com/example/strings.properties")));
    }

    #[test]
    fn invalid_pattern_is_a_configuration_error() {
        let options = PackagingOptions {
            ignore_assets: Some("[".into()),
            ..Default::default()
        };
        let err = options.asset_filter().unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::Configuration));
    }
}
