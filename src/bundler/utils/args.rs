//! Ordered command-line assembly for external tool invocations.
//!
//! Many of the Android build tools are position-sensitive (flags must precede
//! inputs), so tokens are kept exactly in the order they were added. The
//! builder performs no quoting, escaping or validation; callers know the
//! grammar of the tool they are invoking.

use std::fmt;
use std::path::{Path, PathBuf};

/// Conversion into a single, possibly absent, argument token.
///
/// `None` and empty strings are accepted here and dropped when the argument
/// vector is finalized.
pub trait IntoToken {
    /// Converts `self` into a token.
    fn into_token(self) -> Option<String>;
}

impl IntoToken for &str {
    fn into_token(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl IntoToken for String {
    fn into_token(self) -> Option<String> {
        Some(self)
    }
}

impl IntoToken for &String {
    fn into_token(self) -> Option<String> {
        Some(self.clone())
    }
}

// Non-UTF-8 paths are converted lossily; the tools consume UTF-8 argv.
impl IntoToken for &Path {
    fn into_token(self) -> Option<String> {
        Some(self.to_string_lossy().into_owned())
    }
}

impl IntoToken for PathBuf {
    fn into_token(self) -> Option<String> {
        Some(self.to_string_lossy().into_owned())
    }
}

impl IntoToken for &PathBuf {
    fn into_token(self) -> Option<String> {
        self.as_path().into_token()
    }
}

impl<T: IntoToken> IntoToken for Option<T> {
    fn into_token(self) -> Option<String> {
        self.and_then(IntoToken::into_token)
    }
}

/// Accumulates the argument vector of one external tool invocation.
///
/// # Examples
///
/// ```
/// use kodegen_bundler_android::bundler::ArgumentBuilder;
///
/// let mut args = ArgumentBuilder::new();
/// args.add(["aapt", "package"]).add(["-M", "AndroidManifest.xml"]);
/// args.add([Some("-v"), None]);
/// assert_eq!(args.to_vec(), ["aapt", "package", "-M", "AndroidManifest.xml", "-v"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ArgumentBuilder {
    tokens: Vec<Option<String>>,
}

impl ArgumentBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder whose first token is the program to execute.
    pub fn program(program: impl IntoToken) -> Self {
        let mut builder = Self::new();
        builder.arg(program);
        builder
    }

    /// Appends a single token.
    pub fn arg(&mut self, token: impl IntoToken) -> &mut Self {
        self.tokens.push(token.into_token());
        self
    }

    /// Appends tokens in the order given.
    pub fn add<I>(&mut self, tokens: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: IntoToken,
    {
        self.tokens
            .extend(tokens.into_iter().map(IntoToken::into_token));
        self
    }

    /// Appends a token that may be absent.
    pub fn add_opt<T: IntoToken>(&mut self, token: Option<T>) -> &mut Self {
        self.arg(token)
    }

    /// Appends `flag value` only when `value` is present and non-empty.
    pub fn flag_value(&mut self, flag: &str, value: impl IntoToken) -> &mut Self {
        if let Some(value) = value.into_token().filter(|v| !v.is_empty()) {
            self.tokens.push(Some(flag.to_string()));
            self.tokens.push(Some(value));
        }
        self
    }

    /// Appends a bare flag when `enabled` is true.
    pub fn flag_if(&mut self, enabled: bool, flag: &str) -> &mut Self {
        if enabled {
            self.tokens.push(Some(flag.to_string()));
        }
        self
    }

    /// Number of tokens that will survive finalization.
    pub fn len(&self) -> usize {
        self.tokens.iter().filter(|t| is_present(t)).count()
    }

    /// Returns true when finalization would yield no tokens.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finalizes the argument vector, dropping absent and empty tokens.
    pub fn to_vec(&self) -> Vec<String> {
        self.tokens
            .iter()
            .filter(|t| is_present(t))
            .flatten()
            .cloned()
            .collect()
    }

    /// Consumes the builder, yielding the finalized argument vector.
    pub fn into_vec(self) -> Vec<String> {
        self.tokens
            .into_iter()
            .flatten()
            .filter(|t| !t.is_empty())
            .collect()
    }
}

fn is_present(token: &Option<String>) -> bool {
    token.as_deref().is_some_and(|t| !t.is_empty())
}

impl fmt::Display for ArgumentBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_vec().join(" "))
    }
}
