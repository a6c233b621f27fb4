//! File system utilities for the build pipeline.
//!
//! Stages own their output paths and recreate them on every run, so the
//! helpers here are idempotent: removing a missing directory succeeds and
//! creating an existing one is not an error.

use crate::bundler::error::{Error, Result};
use std::{
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }

    // create_dir_all is already idempotent - succeeds even if dir exists
    Ok(fs::create_dir_all(path).await?)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()), // Idempotent
        Err(e) => Err(e.into()),
    }
}

/// Removes a file if it exists.
pub async fn remove_file(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Collects every regular file under `roots` accepted by `filter`.
///
/// Roots are walked in the order given and each root's files are sorted, so
/// the result is deterministic. Missing roots are skipped.
pub async fn collect_files<F>(roots: Vec<PathBuf>, filter: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool + Send + 'static,
{
    run_blocking(move || {
        let mut files = Vec::new();
        for root in roots.iter().filter(|r| r.is_dir()) {
            let mut found = Vec::new();
            for entry in walkdir::WalkDir::new(root).follow_links(true) {
                let entry = entry?;
                if entry.file_type().is_file() && filter(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            files.extend(found);
        }
        Ok(files)
    })
    .await
}

/// Runs `work` on the blocking thread pool.
///
/// A panic inside `work` is resumed on the calling task, so it reaches the
/// runner as a panic rather than as an ordinary error.
pub async fn run_blocking<F, T>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(Error::GenericError(format!("blocking task was cancelled: {e}"))),
    }
}

/// Returns true when the file name ends with `.{extension}`.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_dir_all_with_erase_clears_contents() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("out");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stale.txt"), b"old").unwrap();

        create_dir_all(&dir, true).await.unwrap();

        assert!(dir.is_dir());
        assert!(!dir.join("stale.txt").exists());
    }

    #[tokio::test]
    async fn removing_missing_paths_is_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        remove_dir_all(&temp.path().join("missing")).await.unwrap();
        remove_file(&temp.path().join("missing.txt")).await.unwrap();
    }

    #[tokio::test]
    async fn panics_in_blocking_work_are_resumed() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("A.java"), "").unwrap();
        let root = temp.path().to_path_buf();

        let joined = tokio::spawn(async move {
            collect_files(vec![root], |_| panic!("filter blew up")).await
        })
        .await
        .unwrap_err();

        assert!(joined.is_panic());
        let payload = joined.into_panic();
        assert_eq!(payload.downcast_ref::<&str>(), Some(&"filter blew up"));
    }

    #[tokio::test]
    async fn collect_files_is_sorted_per_root_and_skips_missing_roots() {
        let temp = tempfile::tempdir().unwrap();
        let first = temp.path().join("a");
        let second = temp.path().join("b");
        std::fs::create_dir_all(first.join("pkg")).unwrap();
        std::fs::create_dir_all(&second).unwrap();
        std::fs::write(first.join("pkg/Z.java"), "").unwrap();
        std::fs::write(first.join("pkg/A.java"), "").unwrap();
        std::fs::write(first.join("notes.txt"), "").unwrap();
        std::fs::write(second.join("B.java"), "").unwrap();

        let files = collect_files(
            vec![second.clone(), temp.path().join("missing"), first.clone()],
            |p| has_extension(p, "java"),
        )
        .await
        .unwrap();

        assert_eq!(
            files,
            vec![
                second.join("B.java"),
                first.join("pkg/A.java"),
                first.join("pkg/Z.java"),
            ]
        );
    }
}
