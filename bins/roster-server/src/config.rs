use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

pub use roster_storage_postgres::PostgresConfig;

use crate::error::ServerError;

#[derive(Parser)]
#[command(name = "roster-server", about = "Student record save service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args, Clone, Debug, Default)]
pub struct ServeArgs {
    /// Path to TOML config file. Without one, every setting takes its default.
    #[arg(long, env = "ROSTER_CONFIG")]
    pub config: Option<String>,

    /// Overrides `[postgres].url`.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Overrides `listen`.
    #[arg(long, env = "ROSTER_LISTEN")]
    pub listen: Option<String>,
}

// ---- TOML Config ----

/// Which `StudentStore` backs the save endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    Postgres,
    /// Process-local map; contents vanish on restart.
    Memory,
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Largest accepted request body, in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
    #[serde(default)]
    pub storage: StorageKind,
    #[serde(default)]
    pub postgres: PostgresConfig,
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}
fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            body_limit: default_body_limit(),
            storage: StorageKind::default(),
            postgres: PostgresConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &str) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        toml::from_str(&content)
            .map_err(|e| ServerError::Config { context: "parse", detail: format!("'{path}': {e}") })
    }

    /// File (or defaults) with command-line overrides applied on top.
    pub fn resolve(args: &ServeArgs) -> Result<Self, ServerError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(url) = &args.database_url {
            config.postgres.url = Some(url.clone());
        }
        if let Some(listen) = &args.listen {
            config.listen = listen.clone();
        }

        let has_url = config.postgres.url.as_deref().is_some_and(|u| !u.is_empty());
        if config.storage == StorageKind::Postgres && !has_url {
            return Err(ServerError::Config {
                context: "postgres",
                detail: "no url: set [postgres].url or DATABASE_URL".to_string(),
            });
        }

        Ok(config)
    }
}
