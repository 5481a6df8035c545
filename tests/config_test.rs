//! Integration tests for loading configuration files.

use std::io::Write;

use schooldir::config::{self, Config};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn full_config_file_loads() {
    let file = write_config(
        r#"
[server]
host = "127.0.0.1"
port = 3000

[database]
url = "sqlite:///var/lib/schooldir/schools.db"
max_connections = 8
retry_attempts = 5
retry_base_delay_ms = 250

[storage]
upload_dir = "/srv/schooldir/images"
public_path = "/images"

[storage.remote]
cloud_name = "demo"
api_key = "123"
api_secret = "abc"
folder = "schools"
"#,
    );

    let config = config::load_config(file.path()).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.database.max_connections, 8);

    let policy = config.database.retry_policy();
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.delay_for(2).as_millis(), 500);

    assert_eq!(config.storage.public_path, "/images");
    let remote = config.storage.remote.unwrap();
    assert_eq!(remote.folder, "schools");
    assert_eq!(remote.api_base, "https://api.cloudinary.com");
}

#[test]
fn partial_config_falls_back_to_defaults() {
    let file = write_config("[server]\nport = 9090\n");

    let config = config::load_config(file.path()).unwrap();
    let defaults = Config::default();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.host, defaults.server.host);
    assert_eq!(config.database.url, defaults.database.url);
    assert_eq!(config.storage.upload_dir, defaults.storage.upload_dir);
    assert!(config.storage.remote.is_none());
}

#[test]
fn invalid_values_are_rejected() {
    let file = write_config("[database]\nretry_attempts = 0\n");
    assert!(config::load_config(file.path()).is_err());

    let file = write_config("[database]\nretry_base_delay_ms = 3600000\n");
    assert!(config::load_config(file.path()).is_err());

    let file = write_config("[storage.remote]\ncloud_name = \"demo\"\napi_key = \"\"\napi_secret = \"x\"\n");
    assert!(config::load_config(file.path()).is_err());
}

#[test]
fn malformed_toml_is_an_error() {
    let file = write_config("[server\nport = ");
    let err = config::load_config(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));
}

#[test]
fn explicit_missing_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(config::load_config_or_default(Some(&missing)).is_err());
}

#[test]
fn config_round_trips_through_toml() {
    let mut config = Config::default();
    config.server.port = 4321;
    let text = toml::to_string(&config).unwrap();
    let file = write_config(&text);
    assert_eq!(config::load_config(file.path()).unwrap().server.port, 4321);
}
