//! Images kept in a local directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use schooldir_common::paths::upload_stem;
use schooldir_common::{Error, Result};
use tokio::io::AsyncWriteExt;

use super::storage::{timestamp_millis, ImageStore};

/// How many names to try when an upload collides with an existing file.
const MAX_NAME_ATTEMPTS: i64 = 8;

/// Stores uploads as `{upload_dir}/{millis}_{name}{ext}`.
///
/// The returned reference is the bare filename; it is served back under the
/// configured public path.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    base_dir: PathBuf,
}

impl LocalImageStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Filesystem path for a stored reference.
    ///
    /// Rejects anything that is not a plain filename.
    pub fn path_for(&self, reference: &str) -> Result<PathBuf> {
        let plain = !reference.is_empty()
            && reference != "."
            && reference != ".."
            && !reference.contains(['/', '\\']);
        if !plain {
            return Err(Error::invalid_input(format!(
                "Not a local image reference: {reference:?}"
            )));
        }
        Ok(self.base_dir.join(reference))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn store(&self, data: Bytes, base_name: &str, extension: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.base_dir).await.map_err(|e| {
            Error::storage(format!(
                "Failed to create upload directory {}: {e}",
                self.base_dir.display()
            ))
        })?;

        let millis = timestamp_millis();
        for offset in 0..MAX_NAME_ATTEMPTS {
            let filename = format!("{}{}", upload_stem(millis + offset, base_name), extension);
            let path = self.base_dir.join(&filename);

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(Error::storage(format!(
                        "Failed to create {}: {e}",
                        path.display()
                    )))
                }
            };

            let written = async {
                file.write_all(&data).await?;
                file.flush().await
            }
            .await;

            if let Err(e) = written {
                drop(file);
                let _ = tokio::fs::remove_file(&path).await;
                return Err(Error::storage(format!(
                    "Failed to write {}: {e}",
                    path.display()
                )));
            }

            tracing::debug!(path = %path.display(), bytes = data.len(), "Stored image");
            return Ok(filename);
        }

        Err(Error::storage(format!(
            "No free upload name for {base_name:?} in {}",
            self.base_dir.display()
        )))
    }

    async fn discard(&self, reference: &str) -> Result<()> {
        let path = self.path_for(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed image");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(format!(
                "Failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_writes_named_file() {
        let dir = TempDir::new().unwrap();
        let store = LocalImageStore::new(dir.path().join("schoolImages"));

        let reference = store
            .store(Bytes::from_static(b"jpeg-bytes"), "Oak Hill", ".jpg")
            .await
            .unwrap();

        let (millis, rest) = reference.split_once('_').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest, "Oak_Hill.jpg");

        let on_disk = std::fs::read(store.base_dir().join(&reference)).unwrap();
        assert_eq!(on_disk, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_same_name_twice_gets_distinct_files() {
        let dir = TempDir::new().unwrap();
        let store = LocalImageStore::new(dir.path().to_path_buf());

        let a = store.store(Bytes::from_static(b"a"), "Summit", ".png").await.unwrap();
        let b = store.store(Bytes::from_static(b"b"), "Summit", ".png").await.unwrap();

        assert_ne!(a, b);
        assert_eq!(std::fs::read(dir.path().join(&a)).unwrap(), b"a");
        assert_eq!(std::fs::read(dir.path().join(&b)).unwrap(), b"b");
    }

    #[tokio::test]
    async fn test_discard_removes_and_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        let store = LocalImageStore::new(dir.path().to_path_buf());

        let reference = store
            .store(Bytes::from_static(b"x"), "Lakeview", ".jpg")
            .await
            .unwrap();
        store.discard(&reference).await.unwrap();
        assert!(!dir.path().join(&reference).exists());

        store.discard(&reference).await.unwrap();
    }

    #[tokio::test]
    async fn test_discard_rejects_paths() {
        let dir = TempDir::new().unwrap();
        let store = LocalImageStore::new(dir.path().to_path_buf());

        for bad in ["../etc/passwd", "a/b.jpg", "..", ""] {
            assert!(store.discard(bad).await.is_err(), "{bad}");
        }
    }

    #[tokio::test]
    async fn test_store_fails_when_dir_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("taken");
        std::fs::write(&blocker, b"").unwrap();
        let store = LocalImageStore::new(blocker);

        let err = store
            .store(Bytes::from_static(b"x"), "Oak Hill", ".jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }
}
