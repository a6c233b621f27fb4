//! Dependency library extraction.
//!
//! Each dependency archive is unpacked into `cache_root/<base name>`. The
//! entry is erased and repopulated on every extraction; there is no staleness
//! check. Two archives with the same base name share an entry, and the last
//! one extracted wins.

mod library;

pub use library::{ExtractedLibrary, LibraryKind};

use crate::bundler::{Error, Result, settings::DependencyReference, utils::fs};
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

/// Locates cache entries under a cache root.
#[derive(Clone, Debug)]
pub struct LibraryCache {
    root: PathBuf,
}

impl LibraryCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cache entry directory for `dependency`.
    pub fn entry(&self, dependency: &DependencyReference) -> PathBuf {
        self.root.join(dependency.base_name())
    }

    /// Describes the cache entry of an already extracted dependency.
    pub fn library(&self, dependency: &DependencyReference) -> ExtractedLibrary {
        ExtractedLibrary::inspect(dependency.path(), self.entry(dependency))
    }
}

/// Unpacks dependency archives into a [`LibraryCache`].
#[derive(Clone, Debug)]
pub struct LibraryExtractor {
    cache: LibraryCache,
}

impl LibraryExtractor {
    pub fn new(cache: LibraryCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &LibraryCache {
        &self.cache
    }

    /// Extracts `archive` into its cache entry, replacing any previous content.
    ///
    /// # Errors
    ///
    /// [`Error::Extraction`] when the archive is missing, unreadable or
    /// corrupt, when an entry would escape the cache directory, or when the
    /// cache entry cannot be cleared or created.
    pub async fn extract(&self, archive: &Path) -> Result<ExtractedLibrary> {
        let dependency = DependencyReference::new(archive);
        let entry = self.cache.entry(&dependency);
        let failed = |reason: String| Error::Extraction {
            archive: archive.to_path_buf(),
            reason,
        };

        if !archive.is_file() {
            return Err(failed("archive does not exist".into()));
        }

        fs::create_dir_all(&entry, true).await.map_err(|e| {
            failed(format!(
                "cannot prepare cache directory {}: {e}",
                entry.display()
            ))
        })?;

        log::debug!("Extracting {} into {}", archive.display(), entry.display());

        let source = archive.to_path_buf();
        let dest = entry.clone();
        fs::run_blocking(move || unpack_zip(&source, &dest))
            .await
            .map_err(|e| failed(e.to_string()))?;

        Ok(ExtractedLibrary::inspect(archive, entry))
    }
}

fn unpack_zip(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;

        let path = file.enclosed_name().ok_or_else(|| {
            Error::GenericError(format!("entry {} escapes the cache directory", file.name()))
        })?;
        let dest_path = dest.join(path);

        if file.is_dir() {
            std::fs::create_dir_all(&dest_path)?;
        } else {
            if let Some(parent) = dest_path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let mut outfile = File::create(&dest_path)?;
            std::io::copy(&mut file, &mut outfile)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::error::FailureKind;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[tokio::test]
    async fn extracts_into_base_name_entry() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("widgets-1.0.aar");
        write_archive(
            &archive,
            &[
                ("AndroidManifest.xml", b"<manifest package=\"com.widgets\"/>"),
                ("res/values/strings.xml", b"<resources/>"),
                ("classes.jar", b"jar"),
            ],
        );

        let extractor = LibraryExtractor::new(LibraryCache::new(temp.path().join("cache")));
        let library = extractor.extract(&archive).await.unwrap();

        let entry = temp.path().join("cache/widgets-1.0");
        assert_eq!(library.dir(), entry);
        assert!(entry.join("res/values/strings.xml").is_file());
        assert_eq!(library.class_path(), vec![entry.join("classes.jar")]);
    }

    #[tokio::test]
    async fn re_extraction_discards_stale_files() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("lib.aar");
        write_archive(&archive, &[("AndroidManifest.xml", b"<manifest/>")]);

        let extractor = LibraryExtractor::new(LibraryCache::new(temp.path().join("cache")));
        let library = extractor.extract(&archive).await.unwrap();
        std::fs::write(library.dir().join("stale.txt"), b"left over").unwrap();

        let library = extractor.extract(&archive).await.unwrap();
        assert!(!library.dir().join("stale.txt").exists());
        assert!(library.dir().join("AndroidManifest.xml").is_file());
    }

    #[tokio::test]
    async fn corrupt_archive_is_an_extraction_error() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("broken.aar");
        std::fs::write(&archive, b"definitely not a zip").unwrap();

        let extractor = LibraryExtractor::new(LibraryCache::new(temp.path().join("cache")));
        let err = extractor.extract(&archive).await.unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::Extraction));
    }

    #[tokio::test]
    async fn missing_archive_is_an_extraction_error() {
        let temp = tempfile::tempdir().unwrap();
        let extractor = LibraryExtractor::new(LibraryCache::new(temp.path().join("cache")));
        let err = extractor
            .extract(&temp.path().join("absent.aar"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::Extraction));
        assert!(!temp.path().join("cache/absent").exists());
    }

    #[tokio::test]
    async fn entries_escaping_the_cache_are_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("evil.jar");
        write_archive(&archive, &[("../../outside.txt", b"x")]);

        let extractor = LibraryExtractor::new(LibraryCache::new(temp.path().join("cache")));
        let err = extractor.extract(&archive).await.unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::Extraction));
        assert!(!temp.path().join("outside.txt").exists());
    }

    #[tokio::test]
    async fn unusable_cache_root_is_an_extraction_error() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("lib.jar");
        write_archive(&archive, &[("a/B.class", b"cafebabe")]);
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();

        let extractor = LibraryExtractor::new(LibraryCache::new(&blocker));
        let err = extractor.extract(&archive).await.unwrap_err();
        assert_eq!(err.kind(), Some(FailureKind::Extraction));
    }
}
