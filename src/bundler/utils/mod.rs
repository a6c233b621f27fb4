//! Utility functions shared by the pipeline stages.

pub mod args;
pub mod fs;
pub mod process;

pub use args::{ArgumentBuilder, IntoToken};
