//! Images uploaded to a Cloudinary-compatible object store.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use schooldir_common::paths::upload_stem;
use schooldir_common::{Error, ImageFormat, Result};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::storage::{timestamp_millis, ImageStore};
use crate::config::RemoteStorageConfig;

/// Timeout for a single upload request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How many public ids to try when an upload collides with an existing asset.
const MAX_NAME_ATTEMPTS: i64 = 8;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    /// Set when the public id was already taken and nothing was written.
    #[serde(default)]
    existing: bool,
}

/// Signed direct uploads; the stored reference is the returned `secure_url`.
///
/// Uploads use the `{millis}_{name}` stem as public id inside the configured
/// folder and never overwrite: a taken id is retried with the next
/// millisecond. Deleting is not supported: [`discard`](ImageStore::discard)
/// only logs the orphaned URL.
pub struct RemoteImageStore {
    client: Client,
    config: RemoteStorageConfig,
}

impl RemoteImageStore {
    pub fn new(config: RemoteStorageConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    async fn upload(
        &self,
        data: &Bytes,
        public_id: &str,
        timestamp: &str,
        extension: &str,
    ) -> Result<UploadResponse> {
        let signature = sign(
            &[
                ("folder", self.config.folder.as_str()),
                ("overwrite", "false"),
                ("public_id", public_id),
                ("timestamp", timestamp),
            ],
            &self.config.api_secret,
        );

        let file = Part::bytes(data.to_vec())
            .file_name(format!("{public_id}{extension}"))
            .mime_str(mime_for(extension))
            .map_err(|e| Error::storage(format!("Invalid upload part: {e}")))?;

        let form = Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("public_id", public_id.to_string())
            .text("folder", self.config.folder.clone())
            .text("overwrite", "false")
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let url = self.upload_url();
        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::storage(format!("Upload request to {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "Image upload rejected");
            return Err(Error::storage(format!("Upload returned {status}")));
        }

        resp.json()
            .await
            .map_err(|e| Error::storage(format!("Unreadable upload response: {e}")))
    }
}

/// Request signature: hex SHA-256 of the sorted `key=value` pairs joined by
/// `&`, immediately followed by the API secret.
pub fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn mime_for(extension: &str) -> &'static str {
    match extension {
        ".png" => ImageFormat::Png.content_type(),
        _ => ImageFormat::Jpeg.content_type(),
    }
}

#[async_trait]
impl ImageStore for RemoteImageStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn store(&self, data: Bytes, base_name: &str, extension: &str) -> Result<String> {
        let millis = timestamp_millis();
        let timestamp = (millis / 1000).to_string();

        for offset in 0..MAX_NAME_ATTEMPTS {
            let public_id = upload_stem(millis + offset, base_name);
            let uploaded = self.upload(&data, &public_id, &timestamp, extension).await?;
            if uploaded.existing {
                tracing::debug!(public_id = %public_id, "Public id taken, trying next");
                continue;
            }

            tracing::debug!(public_id = %public_id, bytes = data.len(), url = %uploaded.secure_url, "Uploaded image");
            return Ok(uploaded.secure_url);
        }

        Err(Error::storage(format!(
            "No free public id for {base_name:?} after {MAX_NAME_ATTEMPTS} attempts"
        )))
    }

    async fn discard(&self, reference: &str) -> Result<()> {
        tracing::warn!(url = %reference, "Remote image left orphaned; delete it from the object store manually");
        Ok(())
    }
}
