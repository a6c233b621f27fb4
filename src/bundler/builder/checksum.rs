//! SHA-256 checksums for artifacts and cache entries.
//!
//! Files hash their content. Directories hash every file's relative path and
//! content in sorted order, so two extractions of the same archive produce
//! the same digest. Each path is NUL-terminated and each content is prefixed
//! with its length, so moving bytes between a name and its content changes
//! the digest.

use crate::{
    bail,
    bundler::{Result, error::ErrorExt},
};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

const CHUNK_SIZE: usize = 8192;

/// Calculates the hex-encoded SHA-256 of a file or directory tree.
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading metadata for hashing", path)?;

    let mut hasher = Sha256::new();
    if metadata.is_file() {
        hash_file(path, &mut hasher).await?;
    } else if metadata.is_dir() {
        let mut files: Vec<_> = walkdir::WalkDir::new(path)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        files.sort();

        for file in files {
            let relative = file.strip_prefix(path)?;
            let len = tokio::fs::metadata(&file)
                .await
                .fs_context("reading metadata for hashing", &file)?
                .len();
            hasher.update(relative.to_string_lossy().as_bytes());
            hasher.update([0u8]);
            hasher.update(len.to_le_bytes());
            hash_file(&file, &mut hasher).await?;
        }
    } else {
        bail!("Path is neither file nor directory: {}", path.display())
    }

    Ok(format!("{:x}", hasher.finalize()))
}

async fn hash_file(path: &Path, hasher: &mut Sha256) -> Result<()> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hash calculation", path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(())
}
