mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Environment variable holding the database URL.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
/// Environment variables holding object-storage credentials.
pub const ENV_CLOUD_NAME: &str = "CLOUDINARY_CLOUD_NAME";
pub const ENV_API_KEY: &str = "CLOUDINARY_API_KEY";
pub const ENV_API_SECRET: &str = "CLOUDINARY_API_SECRET";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./schooldir.toml",
        "~/.config/schooldir/config.toml",
        "/etc/schooldir/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides_from(config, |key| std::env::var(key).ok())?;
    validate_config(config)
}

/// Apply overrides using `lookup` in place of the process environment.
///
/// `DATABASE_URL` replaces the database URL. The object-storage variables
/// override fields of an existing `[storage.remote]` section; without one,
/// remote storage is enabled only when all three are set.
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = get(ENV_DATABASE_URL) {
        config.database.url = url;
    }

    let cloud_name = get(ENV_CLOUD_NAME);
    let api_key = get(ENV_API_KEY);
    let api_secret = get(ENV_API_SECRET);

    match config.storage.remote.as_mut() {
        Some(remote) => {
            if let Some(v) = cloud_name {
                remote.cloud_name = v;
            }
            if let Some(v) = api_key {
                remote.api_key = v;
            }
            if let Some(v) = api_secret {
                remote.api_secret = v;
            }
        }
        None => match (cloud_name, api_key, api_secret) {
            (Some(name), Some(key), Some(secret)) => {
                config.storage.remote = Some(RemoteStorageConfig::new(name, key, secret));
            }
            (None, None, None) => {}
            _ => {
                tracing::warn!(
                    "Incomplete object storage credentials in environment; using local image storage"
                );
            }
        },
    }

    Ok(())
}

/// Upper bound for the retry base delay.
pub const MAX_RETRY_BASE_DELAY_MS: u64 = 60_000;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.database.url.trim().is_empty() {
        anyhow::bail!("Database URL cannot be empty");
    }

    if config.database.max_connections == 0 {
        anyhow::bail!("Database max_connections must be at least 1");
    }

    if config.database.retry_attempts == 0 {
        anyhow::bail!("Database retry_attempts must be at least 1");
    }

    if config.database.retry_base_delay_ms > MAX_RETRY_BASE_DELAY_MS {
        anyhow::bail!(
            "Database retry_base_delay_ms must be at most {MAX_RETRY_BASE_DELAY_MS}, got {}",
            config.database.retry_base_delay_ms
        );
    }

    let public_path = config.storage.public_path.trim_end_matches('/');
    if !public_path.starts_with('/') || public_path.len() < 2 {
        anyhow::bail!(
            "Storage public_path must be an absolute URL path like /schoolImages, got {:?}",
            config.storage.public_path
        );
    }

    if let Some(remote) = &config.storage.remote {
        for (field, value) in [
            ("cloud_name", &remote.cloud_name),
            ("api_key", &remote.api_key),
            ("api_secret", &remote.api_secret),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("Remote storage is configured but {} is empty", field);
            }
        }
    }

    Ok(())
}
