mod cli;

use schooldir::{config, images, server, service::RecordService};
use schooldir_db::executor::QueryExecutor;
use schooldir_db::pool::{open_pool, parse_database_url};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    // Load config
    let mut config = config::load_config_or_default(config_path)?;
    config::apply_env_overrides(&mut config)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting schooldir server");

    // Initialize database
    let location = parse_database_url(&config.database.url)
        .with_context(|| format!("Invalid database URL: {}", config.database.url))?;
    tracing::info!("Opening database {:?}", location);
    let pool = open_pool(&location, config.database.max_connections)
        .context("Failed to open database")?;

    let executor = QueryExecutor::with_policy(pool, config.database.retry_policy());
    let store = images::build_store(&config.storage);
    let service = RecordService::new(executor, store);

    server::start_server(config, service).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "schooldir=trace,schooldir_db=debug,schooldir_common=debug,tower_http=debug".to_string()
        } else {
            "schooldir=debug,schooldir_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("schooldir {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    let mut config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };
    config::apply_env_overrides(&mut config)?;

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.database.url);
    println!(
        "  Retry: {} attempts, {}ms base delay",
        config.database.retry_attempts, config.database.retry_base_delay_ms
    );
    match &config.storage.remote {
        Some(remote) => println!(
            "  Images: remote ({}, folder {})",
            remote.cloud_name, remote.folder
        ),
        None => println!(
            "  Images: local ({:?}, served at {})",
            config.storage.upload_dir, config.storage.public_path
        ),
    }

    Ok(())
}
