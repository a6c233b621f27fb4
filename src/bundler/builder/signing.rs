//! Signing credentials for the final APK.
//!
//! Secrets never appear in argv or logs. The sign stage hands them to
//! `apksigner` through the child environment (`--ks-pass env:NAME`), and every
//! `Debug`/`Display` rendering of a [`SigningIdentity`] masks them. The alias
//! and keystore path are masked too when either contains a secret, which is
//! always the case for the debug identity.

use crate::bundler::{Error, Result};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Environment variable read for the keystore secret when none is configured.
pub const DEFAULT_STORE_PASSWORD_VAR: &str = "KODEGEN_KEYSTORE_PASSWORD";
/// Environment variable read for the key secret when none is configured.
pub const DEFAULT_KEY_PASSWORD_VAR: &str = "KODEGEN_KEY_PASSWORD";

const DEBUG_KEY_ALIAS: &str = "androiddebugkey";
const DEBUG_SECRET: &str = "android";

/// A secret string that renders as `***`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The secret value. Only the sign stage should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Keystore location, key alias and the two secrets protecting them.
///
/// Constructed without validation; a wrong path or secret surfaces as a
/// tool invocation failure of the sign stage.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningIdentity {
    store: PathBuf,
    store_secret: Secret,
    alias: String,
    key_secret: Secret,
}

impl SigningIdentity {
    pub fn new(
        store: impl Into<PathBuf>,
        store_secret: impl Into<String>,
        alias: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        Self {
            store: store.into(),
            store_secret: Secret::new(store_secret),
            alias: alias.into(),
            key_secret: Secret::new(key_secret),
        }
    }

    /// The conventional Android debug identity stored in `store`.
    pub fn debug(store: impl Into<PathBuf>) -> Self {
        Self::new(store, DEBUG_SECRET, DEBUG_KEY_ALIAS, DEBUG_SECRET)
    }

    /// `~/.android/debug.keystore`, when a home directory is known.
    pub fn default_debug_keystore() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".android").join("debug.keystore"))
    }

    /// Reads both secrets from the named environment variables.
    ///
    /// # Errors
    ///
    /// A configuration error naming the variable when either is unset.
    pub fn from_env(
        store: impl Into<PathBuf>,
        alias: impl Into<String>,
        store_secret_var: &str,
        key_secret_var: &str,
    ) -> Result<Self> {
        let read = |var: &str| {
            std::env::var(var).map_err(|_| {
                Error::Configuration(format!(
                    "environment variable {var} must hold the signing secret"
                ))
            })
        };
        let store_secret = read(store_secret_var)?;
        let key_secret = read(key_secret_var)?;
        Ok(Self::new(store, store_secret, alias, key_secret))
    }

    pub fn store(&self) -> &Path {
        &self.store
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn store_secret(&self) -> &Secret {
        &self.store_secret
    }

    pub fn key_secret(&self) -> &Secret {
        &self.key_secret
    }

    /// `text`, or `***` when it contains either secret.
    fn masked<'a>(&self, text: &'a str) -> &'a str {
        let reveals = [&self.store_secret, &self.key_secret]
            .iter()
            .any(|s| !s.expose().is_empty() && text.contains(s.expose()));
        if reveals { "***" } else { text }
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store.to_string_lossy();
        f.debug_struct("SigningIdentity")
            .field("store", &self.masked(&store))
            .field("store_secret", &self.store_secret)
            .field("alias", &self.masked(&self.alias))
            .field("key_secret", &self.key_secret)
            .finish()
    }
}

impl fmt::Display for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store.to_string_lossy();
        write!(
            f,
            "{} in {} (store secret {}, key secret {})",
            self.masked(&self.alias),
            self.masked(&store),
            self.store_secret,
            self.key_secret
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_never_render() {
        let identity = SigningIdentity::new("release.jks", "store-pw-123", "upload", "key-pw-456");
        for rendered in [format!("{identity:?}"), identity.to_string()] {
            assert!(!rendered.contains("store-pw-123"), "{rendered}");
            assert!(!rendered.contains("key-pw-456"), "{rendered}");
            assert!(rendered.contains("***"));
            assert!(rendered.contains("upload"));
        }
    }

    #[test]
    fn debug_identity_uses_conventional_alias() {
        let identity = SigningIdentity::debug("/home/dev/.android/debug.keystore");
        assert_eq!(identity.alias(), "androiddebugkey");
        assert_eq!(identity.store_secret().expose(), "android");
        assert_eq!(identity.key_secret().expose(), "android");
    }

    #[test]
    fn names_containing_a_secret_are_masked() {
        let identity = SigningIdentity::debug("/home/dev/.android/debug.keystore");
        for rendered in [format!("{identity:?}"), identity.to_string()] {
            assert!(!rendered.contains("android"), "{rendered}");
        }
        assert_eq!(identity.to_string(), "*** in *** (store secret ***, key secret ***)");

        let release = SigningIdentity::new("/keys/upload.jks", "hunter2", "upload", "hunter2");
        assert_eq!(
            release.to_string(),
            "upload in /keys/upload.jks (store secret ***, key secret ***)"
        );
    }

    #[test]
    fn missing_secret_variable_is_a_configuration_error() {
        let err = SigningIdentity::from_env(
            "release.jks",
            "upload",
            "KODEGEN_TEST_SECRET_THAT_IS_NEVER_SET",
            DEFAULT_KEY_PASSWORD_VAR,
        )
        .unwrap_err();
        assert!(err.to_string().contains("KODEGEN_TEST_SECRET_THAT_IS_NEVER_SET"));
    }
}
