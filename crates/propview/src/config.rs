//! Configuration management for propview
//!
//! Connection parameters and table names come from the environment, optionally
//! seeded from a `.env` file. Every required variable is checked up front so a
//! misconfigured process stops before touching the database.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgSslMode;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ROW_LIMIT: u32 = 1000;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Variables that must be present and non-empty
const REQUIRED_VARS: [&str; 6] =
  ["DB_HOST", "DB_NAME", "DB_USER", "DB_PASSWORD", "DB_TABLE_PROPERTY", "DB_TABLE_AGENT"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
  #[error("Missing database configuration! Please check your .env file. Required variables not set: {}", .0.join(", "))]
  Missing(Vec<String>),

  #[error("Invalid value {value:?} for {name}: {reason}")]
  Invalid { name: String, value: String, reason: String },
}

/// TLS negotiation mode, mirroring libpq's `sslmode`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SslMode {
  Disable,
  Allow,
  Prefer,
  #[default]
  Require,
  VerifyCa,
  VerifyFull,
}

impl FromStr for SslMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "disable" => Ok(SslMode::Disable),
      "allow" => Ok(SslMode::Allow),
      "prefer" => Ok(SslMode::Prefer),
      "require" => Ok(SslMode::Require),
      "verify-ca" | "verify_ca" => Ok(SslMode::VerifyCa),
      "verify-full" | "verify_full" => Ok(SslMode::VerifyFull),
      other => Err(format!(
        "unknown TLS mode '{other}' (expected disable, allow, prefer, require, verify-ca or verify-full)"
      )),
    }
  }
}

impl fmt::Display for SslMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      SslMode::Disable => "disable",
      SslMode::Allow => "allow",
      SslMode::Prefer => "prefer",
      SslMode::Require => "require",
      SslMode::VerifyCa => "verify-ca",
      SslMode::VerifyFull => "verify-full",
    };
    f.write_str(name)
  }
}

impl From<SslMode> for PgSslMode {
  fn from(mode: SslMode) -> Self {
    match mode {
      SslMode::Disable => PgSslMode::Disable,
      SslMode::Allow => PgSslMode::Allow,
      SslMode::Prefer => PgSslMode::Prefer,
      SslMode::Require => PgSslMode::Require,
      SslMode::VerifyCa => PgSslMode::VerifyCa,
      SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
  }
}

/// A credential that never shows up in debug output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  pub fn expose(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for Secret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Secret(***)")
  }
}

/// Parameters for opening a database connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
  pub host: String,
  pub port: u16,
  pub database: String,
  pub user: String,
  pub password: Secret,
  pub ssl_mode: SslMode,
  pub connect_timeout: Duration,
}

/// Names of the two tables the dashboard reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
  pub property: String,
  pub agent: String,
}

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub db: DbConfig,
  pub tables: TableNames,
  /// Upper bound on rows read per table
  pub row_limit: u32,
  /// How long fetched tables stay cached
  pub cache_ttl: Duration,
}

/// Connection details safe to show to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConnectionInfo {
  pub host: String,
  pub port: u16,
  pub database: String,
  pub user: String,
  pub ssl_mode: SslMode,
  pub property_table: String,
  pub agent_table: String,
}

impl Config {
  /// Read configuration from the process environment
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|name| std::env::var(name).ok())
  }

  /// Read configuration through an arbitrary variable lookup
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    // Credentials and identifiers are kept verbatim; only parsed settings are trimmed
    let raw = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let get = |name: &str| raw(name).map(|v| v.trim().to_string());

    let missing: Vec<String> =
      REQUIRED_VARS.iter().copied().filter(|name| raw(*name).is_none()).map(String::from).collect();
    if !missing.is_empty() {
      return Err(ConfigError::Missing(missing));
    }

    let required = |name: &str| raw(name).unwrap_or_default();

    let port = parse_or(get("DB_PORT"), "DB_PORT", DEFAULT_PORT)?;
    let ssl_mode = match get("DB_SSL_MODE") {
      Some(raw) => raw.parse().map_err(|reason| invalid("DB_SSL_MODE", &raw, reason))?,
      None => SslMode::default(),
    };
    let connect_timeout = parse_or(
      get("DB_CONNECT_TIMEOUT_SECS"),
      "DB_CONNECT_TIMEOUT_SECS",
      DEFAULT_CONNECT_TIMEOUT.as_secs(),
    )?;
    let row_limit = parse_or(get("DASHBOARD_ROW_LIMIT"), "DASHBOARD_ROW_LIMIT", DEFAULT_ROW_LIMIT)?;
    if row_limit == 0 {
      return Err(invalid("DASHBOARD_ROW_LIMIT", "0", "must be greater than zero".to_string()));
    }
    let cache_ttl =
      parse_or(get("DASHBOARD_CACHE_TTL_SECS"), "DASHBOARD_CACHE_TTL_SECS", DEFAULT_CACHE_TTL.as_secs())?;

    Ok(Self {
      db: DbConfig {
        host: required("DB_HOST"),
        port,
        database: required("DB_NAME"),
        user: required("DB_USER"),
        password: Secret::new(required("DB_PASSWORD")),
        ssl_mode,
        connect_timeout: Duration::from_secs(connect_timeout),
      },
      tables: TableNames { property: required("DB_TABLE_PROPERTY"), agent: required("DB_TABLE_AGENT") },
      row_limit,
      cache_ttl: Duration::from_secs(cache_ttl),
    })
  }

  pub fn connection_info(&self) -> ConnectionInfo {
    ConnectionInfo {
      host: self.db.host.clone(),
      port: self.db.port,
      database: self.db.database.clone(),
      user: self.db.user.clone(),
      ssl_mode: self.db.ssl_mode,
      property_table: self.tables.property.clone(),
      agent_table: self.tables.agent.clone(),
    }
  }
}

fn invalid(name: &str, value: &str, reason: String) -> ConfigError {
  ConfigError::Invalid { name: name.to_string(), value: value.to_string(), reason }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> Result<T, ConfigError>
where
  T: FromStr,
  T::Err: fmt::Display,
{
  match raw {
    Some(raw) => raw.parse().map_err(|e: T::Err| invalid(name, &raw, e.to_string())),
    None => Ok(default),
  }
}

/// Candidate `.env` locations, most specific first
pub fn env_file_candidates() -> Vec<PathBuf> {
  let mut candidates = Vec::new();
  if let Some(home) = dirs::home_dir() {
    candidates.push(home.join(".env"));
  }
  candidates.push(PathBuf::from(".env"));
  candidates
}

/// Load the first `.env` file that exists. Variables already set in the
/// environment win over file contents. Returns the file that was loaded.
pub fn load_env_files() -> Option<PathBuf> {
  for path in env_file_candidates() {
    if path.exists() {
      match dotenv::from_path(&path) {
        Ok(()) => {
          tracing::debug!(path = %path.display(), "loaded environment file");
          return Some(path);
        }
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to load environment file"),
      }
    }
  }
  dotenv::dotenv().ok()
}
