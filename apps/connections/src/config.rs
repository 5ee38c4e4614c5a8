use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgConnectOptions;

pub const DEFAULT_BASE_URL: &str = "https://www.nytimes.com/svc/connections/v2";

/// Database used to issue `CREATE DATABASE` when the target does not exist yet.
const MAINTENANCE_DATABASE: &str = "postgres";

/// Application configuration loaded from environment variables.
/// Every key is optional and falls back to a local-development default.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub solutions_file: PathBuf,
    pub base_url: String,
    /// Unset means the HTTP client's own default (no overall timeout).
    pub fetch_timeout: Option<Duration>,
    pub port: u16,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_user: "postgres".to_string(),
            db_password: "password".to_string(),
            db_name: "connections".to_string(),
            solutions_file: PathBuf::from("solutions.json"),
            base_url: DEFAULT_BASE_URL.to_string(),
            fetch_timeout: None,
            port: 8000,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Missing keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            db_host: lookup("DB_HOST").unwrap_or(defaults.db_host),
            db_port: parse_or("DB_PORT", &lookup, defaults.db_port)?,
            db_user: lookup("DB_USER").unwrap_or(defaults.db_user),
            db_password: lookup("DB_PASSWORD").unwrap_or(defaults.db_password),
            db_name: lookup("DB_NAME").unwrap_or(defaults.db_name),
            solutions_file: lookup("SOLUTIONS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.solutions_file),
            base_url: lookup("CONNECTIONS_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            fetch_timeout: parse_opt("FETCH_TIMEOUT_SECS", &lookup)?
                .map(Duration::from_secs)
                .or(defaults.fetch_timeout),
            port: parse_or("PORT", &lookup, defaults.port)?,
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
        })
    }

    /// Connection options for the solutions database.
    pub fn connect_options(&self) -> PgConnectOptions {
        self.server_options().database(&self.db_name)
    }

    /// Connection options for the maintenance database on the same server.
    pub fn maintenance_options(&self) -> PgConnectOptions {
        self.server_options().database(MAINTENANCE_DATABASE)
    }

    fn server_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(key, lookup)?.unwrap_or(default))
}

fn parse_opt<T, F>(key: &str, lookup: &F) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a valid number, got '{raw}'"))
        })
        .transpose()
}
