//! Query Dashboard - run a fixed catalog of SQL queries from the browser.

use query_dashboard::catalog::Catalog;
use query_dashboard::cli::Cli;
use query_dashboard::config::{Config, ConnectionConfig};
use query_dashboard::db::ConfigConnector;
use query_dashboard::error::{DashboardError, Result};
use query_dashboard::gateway::Gateway;
use query_dashboard::logging;
use query_dashboard::web::{self, AppState};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    logging::init_stderr_logging();

    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    let catalog = Catalog::embedded()?;

    if cli.list {
        for label in catalog.labels() {
            println!("{label}");
        }
        return Ok(());
    }

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let connection = resolve_connection(&cli, &config)?.ok_or_else(|| {
        DashboardError::config(
            "No database connection configured. Use --help for usage information.",
        )
    })?;
    connection.validate()?;
    info!("Connection: {}", connection.display_string());
    info!("Loaded {} catalog queries", catalog.len());

    let gateway = Gateway::new(Arc::new(ConfigConnector::new(connection)));
    let state = Arc::new(AppState::new(Arc::new(catalog), gateway));
    let bind = cli.bind.clone().unwrap_or(config.server.bind);

    web::serve(&bind, state).await
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
///
/// Precedence: CLI connection string, then CLI fields layered over the named or
/// default connection from the config file, then `PG*` environment variables.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    let mut connection = layer_connection(cli, config)?;

    if let Some(ref mut conn) = connection {
        conn.apply_env_defaults();
    }

    Ok(connection)
}

/// Combines the CLI arguments with the config file, without consulting the environment.
fn layer_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    let cli_connection = cli.to_connection_config()?;
    if cli.connection_string.is_some() {
        return Ok(cli_connection);
    }

    let base = match cli.connection_name() {
        Some(name) => Some(config.get_connection(Some(name)).cloned().ok_or_else(|| {
            DashboardError::config(format!("Connection '{}' not found in config file", name))
        })?),
        None => config.get_connection(None).cloned(),
    };

    Ok(match (base, cli_connection) {
        (Some(mut base), Some(overrides)) => {
            base.merge(&overrides);
            Some(base)
        }
        (base, overrides) => base.or(overrides),
    })
}
