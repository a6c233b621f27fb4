//! The six pipeline stages.
//!
//! Stages never pass state to each other. Later stages find library cache
//! entries through [`LibraryCache`] and earlier outputs through the fixed
//! paths on [`Project`].

mod archive;
mod compile;
mod convert;
mod extract;
mod resources;
mod sign;

pub use archive::Archive;
pub use compile::Compile;
pub use convert::Convert;
pub use extract::ExtractDependencies;
pub use resources::PackageResources;
pub use sign::Sign;

use super::{StageKind, TaskFailure, TaskFuture};
use crate::bundler::{
    Result,
    extract::{ExtractedLibrary, LibraryCache},
    settings::{BuildContext, Project},
};
use std::future::Future;

/// Boxes a stage body, classifying its error under the stage's default kind.
fn stage_future<'a, F>(kind: StageKind, work: F) -> TaskFuture<'a>
where
    F: Future<Output = Result<()>> + Send + 'a,
{
    Box::pin(async move {
        work.await
            .map_err(|e| TaskFailure::from_error(e, kind.default_failure()))
    })
}

/// Extracted libraries in dependency order.
fn libraries(project: &Project, context: &BuildContext) -> Vec<ExtractedLibrary> {
    let cache = LibraryCache::new(context.cache_root());
    project
        .dependencies()
        .iter()
        .map(|dependency| cache.library(dependency))
        .collect()
}

/// Class path entries of every library, in dependency order.
fn library_class_path(project: &Project, context: &BuildContext) -> Vec<std::path::PathBuf> {
    libraries(project, context)
        .iter()
        .flat_map(ExtractedLibrary::class_path)
        .collect()
}

fn join_paths(paths: &[std::path::PathBuf]) -> Result<String> {
    let joined = std::env::join_paths(paths).map_err(|e| {
        crate::bundler::Error::Configuration(format!("invalid class path entry: {e}"))
    })?;
    Ok(joined.to_string_lossy().into_owned())
}
