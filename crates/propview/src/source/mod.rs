//! Table source abstraction
//!
//! A [`TableSource`] performs one bounded read of a named table. The dashboard
//! only talks to this trait, so the Postgres implementation can be swapped for
//! an in-memory one in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::table::Table;

pub mod decode;
pub mod postgres;

pub use postgres::PgTableSource;

/// Remediation shown next to TLS negotiation failures
pub const TLS_HINT: &str =
  "Try setting DB_SSL_MODE=disable in your .env file if the database doesn't support SSL";

/// Why a table could not be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  /// Database unreachable, credentials rejected or TLS negotiation failed
  #[error("Error connecting to the database for {table}: {message}")]
  Connection { table: String, message: String },

  /// The connection attempt outlived the configured connect timeout
  #[error("Error connecting to the database for {table}: timed out after {seconds}s")]
  Timeout { table: String, seconds: u64 },

  /// The query was rejected or its rows could not be decoded
  #[error("Error fetching {table}: {message}")]
  Query { table: String, message: String },
}

impl FetchError {
  /// Name of the table whose fetch failed
  pub fn table(&self) -> &str {
    match self {
      FetchError::Connection { table, .. }
      | FetchError::Timeout { table, .. }
      | FetchError::Query { table, .. } => table,
    }
  }

  pub fn is_tls_related(&self) -> bool {
    match self {
      FetchError::Connection { message, .. } | FetchError::Query { message, .. } => {
        let message = message.to_ascii_lowercase();
        message.contains("ssl") || message.contains("tls")
      }
      FetchError::Timeout { .. } => false,
    }
  }

  /// Suggested remediation, if one is known for this failure
  pub fn hint(&self) -> Option<&'static str> {
    self.is_tls_related().then_some(TLS_HINT)
  }
}

/// Source of raw tables
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableSource: Send + Sync {
  /// Read at most `limit` rows of `table`
  async fn fetch_table(&self, table: &str, limit: u32) -> Result<Table, FetchError>;
}

/// Quote a table name as a case-sensitive SQL identifier
pub fn quote_identifier(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

/// Statement used for every bounded table read
pub fn select_statement(table: &str, limit: u32) -> String {
  format!("SELECT * FROM {} LIMIT {limit}", quote_identifier(table))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mixed_case_name_is_quoted() {
    assert_eq!(select_statement("PropertyListing", 1000), r#"SELECT * FROM "PropertyListing" LIMIT 1000"#);
  }

  #[test]
  fn test_embedded_quotes_are_escaped() {
    assert_eq!(quote_identifier(r#"weird"; DROP TABLE x; --"#), r#""weird""; DROP TABLE x; --""#);
  }

  #[test]
  fn test_tls_failures_carry_hint() {
    let err = FetchError::Connection {
      table: "Agent".to_string(),
      message: "error with configuration: SSL connection is required".to_string(),
    };
    assert_eq!(err.hint(), Some(TLS_HINT));

    let err = FetchError::Query { table: "Agent".to_string(), message: "relation does not exist".to_string() };
    assert_eq!(err.hint(), None);
    assert_eq!(err.table(), "Agent");
  }

  #[test]
  fn test_timeout_message_names_table() {
    let err = FetchError::Timeout { table: "Property".to_string(), seconds: 10 };
    assert_eq!(err.to_string(), "Error connecting to the database for Property: timed out after 10s");
  }
}
