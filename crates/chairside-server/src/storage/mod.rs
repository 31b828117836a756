//! Local filesystem storage for uploaded exports
//!
//! Uploads land under `<root>/<practice_id>/<YYYY-MM-DD>/` with a
//! millisecond prefix keeping same-named files apart. The stored path
//! is recorded on the job row; processing and download read it back
//! through this store.

use chairside_common::checksum::sha256_hex;
use chrono::Utc;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A persisted upload
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub path: PathBuf,
    pub size: u64,
    pub checksum: String,
}

/// Filesystem-backed store rooted at a configured directory
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persist upload bytes and return where they landed
    pub async fn save(
        &self,
        practice_id: Uuid,
        original_filename: &str,
        content: &[u8],
    ) -> Result<StoredUpload, StorageError> {
        let dir = self
            .root
            .join(practice_id.to_string())
            .join(Utc::now().format("%Y-%m-%d").to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!(
            "{}_{}",
            Utc::now().timestamp_millis(),
            sanitize_filename(original_filename)
        );
        let path = dir.join(name);
        tokio::fs::write(&path, content).await?;

        Ok(StoredUpload {
            checksum: sha256_hex(content),
            size: content.len() as u64,
            path,
        })
    }

    /// Read a stored upload back in full
    pub async fn read(&self, path: impl AsRef<Path>) -> Result<Vec<u8>, StorageError> {
        Ok(tokio::fs::read(path).await?)
    }

    /// Delete a stored upload
    pub async fn remove(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}

/// Strip path separators and shell-hostile characters from a client
/// filename
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let practice = Uuid::new_v4();

        let stored = store
            .save(practice, "patients.csv", b"a,b\n1,2\n")
            .await
            .unwrap();
        assert_eq!(stored.size, 8);
        assert!(stored.path.starts_with(dir.path().join(practice.to_string())));
        assert!(stored
            .path
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .ends_with("_patients.csv"));

        let bytes = store.read(&stored.path).await.unwrap();
        assert_eq!(bytes, b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());

        let stored = store
            .save(Uuid::new_v4(), "x.txt", b"bytes")
            .await
            .unwrap();
        store.remove(&stored.path).await.unwrap();
        assert!(store.read(&stored.path).await.is_err());
    }

    #[test]
    fn test_filename_sanitization() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("day sheet (1).pdf"), "day_sheet__1_.pdf");
        assert_eq!(sanitize_filename(""), "upload");
    }
}
