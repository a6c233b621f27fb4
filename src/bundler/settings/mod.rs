//! Configuration structures for a build.
//!
//! A [`Project`] describes what is built and a [`BuildContext`] describes how:
//! scratch and cache directories, verbosity, tool locations and the process
//! invoker. Both are shared read-only by every task.

mod builder;
mod context;
mod packaging;
mod project;

pub use builder::ProjectBuilder;
pub use context::{BuildContext, BuildContextBuilder};
pub use packaging::{AssetFilter, PackagingOptions};
pub use project::{DependencyReference, Project};
