//! PostgreSQL-backed table source
//!
//! Each fetch opens its own connection, runs one bounded `SELECT *`, and closes
//! the connection again whether or not the query succeeded.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use std::time::Instant;

use crate::config::DbConfig;
use crate::source::{decode, select_statement, FetchError, TableSource};
use crate::table::Table;

/// Reads tables from PostgreSQL using short-lived connections
pub struct PgTableSource {
  config: DbConfig,
}

impl PgTableSource {
  pub fn new(config: DbConfig) -> Self {
    Self { config }
  }

  fn connect_options(&self) -> PgConnectOptions {
    PgConnectOptions::new()
      .host(&self.config.host)
      .port(self.config.port)
      .database(&self.config.database)
      .username(&self.config.user)
      .password(self.config.password.expose())
      .ssl_mode(self.config.ssl_mode.into())
      .application_name("propview")
  }

  async fn connect(&self, table: &str) -> Result<PgConnection, FetchError> {
    let timeout = self.config.connect_timeout;
    match tokio::time::timeout(timeout, PgConnection::connect_with(&self.connect_options())).await {
      Ok(Ok(conn)) => Ok(conn),
      Ok(Err(e)) => Err(FetchError::Connection { table: table.to_string(), message: e.to_string() }),
      Err(_) => Err(FetchError::Timeout { table: table.to_string(), seconds: timeout.as_secs() }),
    }
  }
}

#[async_trait]
impl TableSource for PgTableSource {
  async fn fetch_table(&self, table: &str, limit: u32) -> Result<Table, FetchError> {
    let started = Instant::now();
    let mut conn = self.connect(table).await?;

    let sql = select_statement(table, limit);
    let result = sqlx::query(&sql).fetch_all(&mut conn).await;

    // Closed on every path; a failed close only loses the goodbye message
    if let Err(e) = conn.close().await {
      tracing::debug!(table, error = %e, "error while closing database connection");
    }

    let rows =
      result.map_err(|e| FetchError::Query { table: table.to_string(), message: e.to_string() })?;
    let table_data = decode::rows_to_table(&rows)
      .map_err(|e| FetchError::Query { table: table.to_string(), message: e.to_string() })?;

    tracing::info!(
      table,
      rows = table_data.len(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "fetched table"
    );
    Ok(table_data)
  }
}
