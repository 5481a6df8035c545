//! The storage seam shared by the local and remote backends.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use schooldir_common::Result;

use super::{LocalImageStore, RemoteImageStore};
use crate::config::StorageConfig;

/// Durable home for uploaded images.
///
/// A reference returned by [`store`](ImageStore::store) is what gets saved on
/// the record: a bare filename for local storage, or an absolute URL for
/// remote storage.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Short identifier for logs (e.g. `"local"`).
    fn name(&self) -> &'static str;

    /// Persist `data` under a name derived from `base_name`.
    ///
    /// `extension` includes its leading dot. Returns the stored reference.
    async fn store(&self, data: Bytes, base_name: &str, extension: &str) -> Result<String>;

    /// Remove an image previously returned by [`store`](ImageStore::store).
    ///
    /// Removing something already gone is not an error.
    async fn discard(&self, reference: &str) -> Result<()>;
}

/// Milliseconds since the Unix epoch, used to prefix upload names.
pub fn timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Build the store selected by configuration.
///
/// Remote storage wins when a `[storage.remote]` section is present.
pub fn build_store(config: &StorageConfig) -> Arc<dyn ImageStore> {
    match &config.remote {
        Some(remote) => {
            tracing::info!(cloud = %remote.cloud_name, folder = %remote.folder, "Using remote image storage");
            Arc::new(RemoteImageStore::new(remote.clone()))
        }
        None => {
            tracing::info!(dir = %config.upload_dir.display(), "Using local image storage");
            Arc::new(LocalImageStore::new(config.upload_dir.clone()))
        }
    }
}
