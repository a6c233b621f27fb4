//! Shared execution parameters for one build.

use crate::bundler::{
    builder::ToolPaths,
    utils::process::{SystemInvoker, ToolInvoker},
};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Execution parameters shared read-only by every task of one build.
#[derive(Clone)]
pub struct BuildContext {
    work_dir: PathBuf,
    owns_work_dir: bool,
    cache_root: PathBuf,
    verbose: bool,
    tools: ToolPaths,
    invoker: Arc<dyn ToolInvoker>,
}

impl BuildContext {
    /// Scratch directory for this build.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// True when the work directory was generated and may be removed after the build.
    pub fn owns_work_dir(&self) -> bool {
        self.owns_work_dir
    }

    /// Root of the extracted library cache.
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Process-invocation facility used by every tool-driving stage.
    pub fn invoker(&self) -> &dyn ToolInvoker {
        self.invoker.as_ref()
    }
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("work_dir", &self.work_dir)
            .field("cache_root", &self.cache_root)
            .field("verbose", &self.verbose)
            .field("tools", &self.tools)
            .field("invoker", &"<ToolInvoker>")
            .finish()
    }
}

/// Builder for [`BuildContext`].
///
/// Every field has a default:
/// - work directory: a fresh `kodegen-android-<uuid>` under the system temp dir
/// - cache root: `<user cache dir>/kodegen/android-libs`, or `<work dir>/libs`
/// - tools: discovered on demand
/// - invoker: [`SystemInvoker`]
#[derive(Default)]
pub struct BuildContextBuilder {
    work_dir: Option<PathBuf>,
    cache_root: Option<PathBuf>,
    verbose: bool,
    tools: ToolPaths,
    invoker: Option<Arc<dyn ToolInvoker>>,
}

impl BuildContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn work_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.work_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn cache_root<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_root = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    /// Replaces the process-invocation facility.
    pub fn invoker(mut self, invoker: Arc<dyn ToolInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    pub fn build(self) -> BuildContext {
        let owns_work_dir = self.work_dir.is_none();
        let work_dir = self.work_dir.unwrap_or_else(|| {
            std::env::temp_dir().join(format!("kodegen-android-{}", uuid::Uuid::new_v4()))
        });
        let cache_root = self
            .cache_root
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("kodegen").join("android-libs")))
            .unwrap_or_else(|| work_dir.join("libs"));
        let invoker: Arc<dyn ToolInvoker> = match self.invoker {
            Some(invoker) => invoker,
            None => Arc::new(SystemInvoker::new(self.verbose)),
        };

        BuildContext {
            work_dir,
            owns_work_dir,
            cache_root,
            verbose: self.verbose,
            tools: self.tools,
            invoker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_directories_are_kept() {
        let context = BuildContextBuilder::new()
            .work_dir("/tmp/work")
            .cache_root("/tmp/cache")
            .verbose(true)
            .build();
        assert_eq!(context.work_dir(), Path::new("/tmp/work"));
        assert_eq!(context.cache_root(), Path::new("/tmp/cache"));
        assert!(context.verbose());
        assert!(!context.owns_work_dir());
    }

    #[test]
    fn default_work_dirs_are_unique() {
        let a = BuildContextBuilder::new().build();
        let b = BuildContextBuilder::new().build();
        assert_ne!(a.work_dir(), b.work_dir());
        assert!(a.owns_work_dir());
        assert!(format!("{a:?}").contains("<ToolInvoker>"));
    }
}
