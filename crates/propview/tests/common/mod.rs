//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use propview::config::TableNames;
use propview::source::{FetchError, TableSource};
use propview::table::Table;
use propview::value::Value;

pub const PROPERTY_TABLE: &str = "Property";
pub const AGENT_TABLE: &str = "Agent";

/// In-memory table source that counts the queries it serves
#[derive(Default)]
pub struct FakeSource {
  tables: HashMap<String, Result<Table, FetchError>>,
  calls: AtomicUsize,
  delay: Option<Duration>,
}

impl FakeSource {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_table(mut self, name: &str, table: Table) -> Self {
    self.tables.insert(name.to_string(), Ok(table));
    self
  }

  pub fn with_error(mut self, name: &str, error: FetchError) -> Self {
    self.tables.insert(name.to_string(), Err(error));
    self
  }

  /// Make every fetch take `delay` before answering
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl TableSource for FakeSource {
  async fn fetch_table(&self, table: &str, limit: u32) -> Result<Table, FetchError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(delay) = self.delay {
      tokio::time::sleep(delay).await;
    }
    match self.tables.get(table) {
      Some(Ok(data)) => Ok(data.head(limit as usize)),
      Some(Err(e)) => Err(e.clone()),
      None => Err(FetchError::Query {
        table: table.to_string(),
        message: format!("relation \"{table}\" does not exist"),
      }),
    }
  }
}

pub fn table_names() -> TableNames {
  TableNames { property: PROPERTY_TABLE.to_string(), agent: AGENT_TABLE.to_string() }
}

pub fn agents() -> Table {
  Table::from_rows(
    ["id", "companyName", "email", "phoneNumber"],
    vec![
      vec![Value::Int(10), "Acme Realty".into(), "a@x.com".into(), "555".into()],
      vec![Value::Int(11), "Bay Homes".into(), "b@x.com".into(), "556".into()],
    ],
  )
}

pub fn properties() -> Table {
  Table::from_rows(
    ["id", "agentId", "propertyType", "city", "price", "area", "title", "address", "x", "y"],
    vec![
      vec![
        Value::Int(1),
        Value::Int(10),
        "House".into(),
        "Metropolis".into(),
        Value::Int(250000),
        Value::Int(140),
        "Family home".into(),
        "1 Main St".into(),
        Value::Float(-74.0),
        Value::Float(40.7),
      ],
      vec![
        Value::Int(2),
        Value::Int(99),
        "Condo".into(),
        "Gotham".into(),
        Value::Int(180000),
        Value::Int(70),
        "City condo".into(),
        "2 Park Ave".into(),
        Value::Float(-73.9),
        Value::Float(40.8),
      ],
      vec![
        Value::Int(3),
        Value::Int(11),
        "Condo".into(),
        "Metropolis".into(),
        Value::Int(200000),
        Value::Int(80),
        "Loft condo".into(),
        "3 River Rd".into(),
        Value::Null,
        Value::Null,
      ],
    ],
  )
}
