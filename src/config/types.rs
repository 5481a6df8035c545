use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use schooldir_common::paths::DEFAULT_PUBLIC_PATH;
use schooldir_db::executor::RetryPolicy;
use schooldir_db::pool::DEFAULT_MAX_CONNECTIONS;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// `sqlite://path`, a bare path, or `:memory:` (overridden by `DATABASE_URL`)
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Total attempts for a query hitting transient connection errors
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay after the first failed attempt; grows linearly per attempt
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_database_url() -> String {
    "sqlite://schooldir.db".to_string()
}
fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}
fn default_retry_attempts() -> u32 {
    RetryPolicy::DEFAULT_MAX_ATTEMPTS
}
fn default_retry_base_delay_ms() -> u64 {
    RetryPolicy::DEFAULT_BASE_DELAY.as_millis() as u64
}

impl DatabaseConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_base_delay_ms),
        )
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            retry_attempts: default_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory local uploads are written to
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// URL path the upload directory is served under
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Object storage; when present, uploads go there instead of `upload_dir`
    #[serde(default)]
    pub remote: Option<RemoteStorageConfig>,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("public/schoolImages")
}
fn default_public_path() -> String {
    DEFAULT_PUBLIC_PATH.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            public_path: default_public_path(),
            remote: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RemoteStorageConfig {
    pub cloud_name: String,

    pub api_key: String,

    pub api_secret: String,

    /// Folder prefix for uploaded objects
    #[serde(default = "default_folder")]
    pub folder: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_folder() -> String {
    "schoolImages".to_string()
}
fn default_api_base() -> String {
    "https://api.cloudinary.com".to_string()
}

impl RemoteStorageConfig {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            folder: default_folder(),
            api_base: default_api_base(),
        }
    }
}
