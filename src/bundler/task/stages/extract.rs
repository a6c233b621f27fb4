use super::stage_future;
use crate::bundler::{
    Error, Result,
    extract::{LibraryCache, LibraryExtractor},
    settings::{BuildContext, Project},
    task::{StageKind, Task, TaskFuture},
    utils::fs,
};
use std::{collections::HashMap, sync::Arc};

/// Unpacks every dependency archive into the library cache, in declared order.
pub struct ExtractDependencies {
    project: Arc<Project>,
    context: Arc<BuildContext>,
}

impl ExtractDependencies {
    pub fn new(project: Arc<Project>, context: Arc<BuildContext>) -> Self {
        Self { project, context }
    }

    async fn execute(&self) -> Result<()> {
        let cache_root = self.context.cache_root();
        fs::create_dir_all(cache_root, false)
            .await
            .map_err(|e| Error::Extraction {
                archive: cache_root.to_path_buf(),
                reason: format!("cannot create cache root: {e}"),
            })?;

        let mut seen = HashMap::new();
        for dependency in self.project.dependencies() {
            if let Some(previous) = seen.insert(dependency.base_name(), dependency.path()) {
                log::warn!(
                    "{} and {} share the cache entry '{}'; the later archive wins",
                    previous.display(),
                    dependency.path().display(),
                    dependency.base_name()
                );
            }
        }

        let extractor = LibraryExtractor::new(LibraryCache::new(cache_root));
        for dependency in self.project.dependencies() {
            let library = extractor.extract(dependency.path()).await?;
            log::info!(
                "Extracted {} into {}",
                dependency.path().display(),
                library.dir().display()
            );
        }
        Ok(())
    }
}

impl Task for ExtractDependencies {
    fn name(&self) -> &str {
        StageKind::ExtractDependencies.name()
    }

    fn run(&self) -> TaskFuture<'_> {
        stage_future(StageKind::ExtractDependencies, self.execute())
    }
}
