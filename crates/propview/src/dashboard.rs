//! Dashboard pipeline: fetch, merge, filter, chart
//!
//! [`Dashboard::load`] fetches both tables through the cache and resolves the
//! empty and failure cases into notices. The resulting [`Snapshot`] is then
//! viewed under any number of filter selections without touching the database.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{FetchCache, FetchResult};
use crate::charts::{self, ChartPanel};
use crate::config::{Config, TableNames};
use crate::filter::{self, FilterOptions, FilterSelection};
use crate::merge::{self, MergeOutcome};
use crate::notice::{NoticeLevel, Notices};
use crate::source::{PgTableSource, TableSource};
use crate::table::Table;

/// Rows shown in the combined preview above the filters
pub const PREVIEW_ROWS: usize = 5;

/// How the loaded data could be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
  /// Both tables joined; filters and charts available
  Merged,
  /// Only agents had rows
  AgentsOnly,
  /// Only properties had rows
  PropertiesOnly,
  /// Both tables had rows but could not be joined
  Unmerged,
  /// Nothing to show
  Empty,
}

/// The loaded state of both tables and their join
#[derive(Debug, Clone)]
pub struct Snapshot {
  pub notices: Notices,
  pub agents: Arc<Table>,
  pub properties: Arc<Table>,
  pub merged: Option<Table>,
  pub mode: ViewMode,
}

/// Agent, property and merged tables for the raw data tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawTables {
  pub agents: Table,
  pub properties: Table,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub merged: Option<Table>,
}

/// Everything the presentation layer needs for one render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardView {
  pub mode: ViewMode,
  pub notices: Notices,
  pub selection: FilterSelection,

  /// First rows of the merged data, before filtering
  #[serde(skip_serializing_if = "Option::is_none")]
  pub combined_preview: Option<Table>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub filter_options: Option<FilterOptions>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub filtered: Option<Table>,
  pub filtered_count: usize,

  pub panels: Vec<ChartPanel>,
  pub raw: RawTables,
}

impl Snapshot {
  /// Apply `selection` and build the view
  pub fn view(&self, selection: &FilterSelection) -> DashboardView {
    let raw = self.raw_tables();

    let Some(merged) = &self.merged else {
      return DashboardView {
        mode: self.mode,
        notices: self.notices.clone(),
        selection: selection.clone(),
        combined_preview: None,
        filter_options: None,
        filtered: None,
        filtered_count: 0,
        panels: Vec::new(),
        raw,
      };
    };

    let filtered = filter::filter(merged, selection);
    let panels = charts::build_panels(&filtered);
    tracing::debug!(
      total = merged.len(),
      filtered = filtered.len(),
      constraints = selection.constraints().count(),
      "applied dashboard filters"
    );

    DashboardView {
      mode: self.mode,
      notices: self.notices.clone(),
      selection: selection.clone(),
      combined_preview: Some(merged.head(PREVIEW_ROWS)),
      filter_options: Some(filter::filter_options(merged)),
      filtered_count: filtered.len(),
      filtered: Some(filtered),
      panels,
      raw,
    }
  }

  pub fn raw_tables(&self) -> RawTables {
    RawTables {
      agents: self.agents.as_ref().clone(),
      properties: self.properties.as_ref().clone(),
      merged: self.merged.clone(),
    }
  }

  pub fn filter_options(&self) -> Option<FilterOptions> {
    self.merged.as_ref().map(filter::filter_options)
  }
}

/// Shared pipeline over one table source
pub struct Dashboard {
  source: Arc<dyn TableSource>,
  cache: FetchCache,
  tables: TableNames,
  row_limit: u32,
}

impl Dashboard {
  pub fn new(source: Arc<dyn TableSource>, tables: TableNames, row_limit: u32, cache_ttl: Duration) -> Self {
    Self { source, cache: FetchCache::new(cache_ttl), tables, row_limit }
  }

  /// Dashboard reading from PostgreSQL with the configured tables and limits
  pub fn from_config(config: &Config) -> Self {
    Self::new(
      Arc::new(PgTableSource::new(config.db.clone())),
      config.tables.clone(),
      config.row_limit,
      config.cache_ttl,
    )
  }

  /// Use a pre-built cache, e.g. one driven by a manual clock
  pub fn with_cache(mut self, cache: FetchCache) -> Self {
    self.cache = cache;
    self
  }

  pub fn cache(&self) -> &FetchCache {
    &self.cache
  }

  pub fn tables(&self) -> &TableNames {
    &self.tables
  }

  pub fn row_limit(&self) -> u32 {
    self.row_limit
  }

  /// Load and view in one step
  pub async fn view(&self, selection: &FilterSelection) -> DashboardView {
    self.load().await.view(selection)
  }

  /// Fetch both tables (cached) and join them
  pub async fn load(&self) -> Snapshot {
    let mut notices = Notices::new();

    let (agents, properties) = tokio::join!(
      self.cache.get_or_fetch(self.source.as_ref(), &self.tables.agent, self.row_limit),
      self.cache.get_or_fetch(self.source.as_ref(), &self.tables.property, self.row_limit),
    );
    let fetched_ok = agents.is_ok() && properties.is_ok();
    let agents = table_or_notice(agents, &mut notices);
    let properties = table_or_notice(properties, &mut notices);

    let (merged, mode) = match (agents.is_empty(), properties.is_empty()) {
      (true, true) => {
        notices.push(NoticeLevel::Warn, "dashboard", "No data returned from either Agent or Property tables.");
        (None, ViewMode::Empty)
      }
      (true, false) => {
        notices.push(NoticeLevel::Warn, "dashboard", "No data returned from Agent table.");
        success_notice(fetched_ok, &mut notices);
        notices.push(
          NoticeLevel::Info,
          "dashboard",
          "Agent data is empty, cannot perform merge or agent-related visualizations.",
        );
        (None, ViewMode::PropertiesOnly)
      }
      (false, true) => {
        notices.push(NoticeLevel::Warn, "dashboard", "No data returned from Property table.");
        success_notice(fetched_ok, &mut notices);
        notices.push(
          NoticeLevel::Info,
          "dashboard",
          "Property data is empty, cannot perform merge or property-related visualizations.",
        );
        (None, ViewMode::AgentsOnly)
      }
      (false, false) => {
        success_notice(fetched_ok, &mut notices);
        match merge::merge(&properties, &agents) {
          Ok(MergeOutcome::Merged(table)) => (Some(table), ViewMode::Merged),
          // Both sides were checked non-empty above
          Ok(_) => (None, ViewMode::Unmerged),
          Err(e) => {
            notices.push(NoticeLevel::Error, "merge", e.to_string());
            (None, ViewMode::Unmerged)
          }
        }
      }
    };

    tracing::info!(
      agents = agents.len(),
      properties = properties.len(),
      merged = merged.as_ref().map(Table::len),
      mode = ?mode,
      "dashboard loaded"
    );
    Snapshot { notices, agents, properties, merged, mode }
  }

  /// Drop cached fetches for `table`, or for every table when `None`
  pub fn invalidate(&self, table: Option<&str>) -> usize {
    let removed = match table {
      Some(table) => self.cache.invalidate(table),
      None => self.cache.invalidate_all(),
    };
    tracing::info!(table = table.unwrap_or("*"), removed, "invalidated fetch cache");
    removed
  }
}

fn success_notice(fetched_ok: bool, notices: &mut Notices) {
  if fetched_ok {
    notices.push(NoticeLevel::Success, "fetch", "Connected to database and fetched data.");
  }
}

/// A failed fetch becomes an error notice and an empty table
fn table_or_notice(result: FetchResult, notices: &mut Notices) -> Arc<Table> {
  match result {
    Ok(table) => table,
    Err(e) => {
      notices.push_with_hint(NoticeLevel::Error, "fetch", e.to_string(), e.hint());
      Arc::new(Table::default())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::notice::Notice;
  use crate::source::{FetchError, MockTableSource, TLS_HINT};
  use crate::value::Value;

  fn names() -> TableNames {
    TableNames { property: "Property".to_string(), agent: "Agent".to_string() }
  }

  fn agents() -> Table {
    Table::from_rows(
      ["id", "companyName", "email", "phoneNumber"],
      vec![vec![Value::Int(10), "Acme Realty".into(), "a@x.com".into(), "555".into()]],
    )
  }

  fn properties() -> Table {
    Table::from_rows(
      ["id", "agentId", "propertyType", "city", "price"],
      vec![
        vec![Value::Int(1), Value::Int(10), "House".into(), "Metropolis".into(), Value::Int(200)],
        vec![Value::Int(2), Value::Int(99), "Condo".into(), "Gotham".into(), Value::Int(100)],
      ],
    )
  }

  fn dashboard(source: MockTableSource) -> Dashboard {
    Dashboard::new(Arc::new(source), names(), 1000, Duration::from_secs(300))
  }

  fn messages(snapshot: &Snapshot) -> Vec<(NoticeLevel, String)> {
    snapshot.notices.iter().map(|Notice { level, message, .. }| (*level, message.clone())).collect()
  }

  #[tokio::test]
  async fn test_both_tables_present_merges() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().times(2).returning(|table, _| match table {
      "Agent" => Ok(agents()),
      _ => Ok(properties()),
    });

    let snapshot = dashboard(source).load().await;
    assert_eq!(snapshot.mode, ViewMode::Merged);
    assert_eq!(
      messages(&snapshot),
      vec![(NoticeLevel::Success, "Connected to database and fetched data.".to_string())]
    );

    let view = snapshot.view(&FilterSelection::all());
    assert_eq!(view.filtered_count, 2);
    assert_eq!(view.combined_preview.map(|t| t.len()), Some(2));
    assert!(!view.panels.is_empty());
    assert!(view.raw.merged.is_some());
  }

  #[tokio::test]
  async fn test_both_empty_warns_and_stops() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().returning(|_, _| Ok(Table::default()));

    let snapshot = dashboard(source).load().await;
    assert_eq!(snapshot.mode, ViewMode::Empty);
    assert_eq!(
      messages(&snapshot),
      vec![(NoticeLevel::Warn, "No data returned from either Agent or Property tables.".to_string())]
    );
    assert!(snapshot.view(&FilterSelection::all()).panels.is_empty());
  }

  #[tokio::test]
  async fn test_empty_properties_surfaces_agents_only() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().returning(|table, _| match table {
      "Agent" => Ok(agents()),
      _ => Ok(Table::default()),
    });

    let snapshot = dashboard(source).load().await;
    assert_eq!(snapshot.mode, ViewMode::AgentsOnly);
    let levels: Vec<_> = snapshot.notices.iter().map(|n| n.level).collect();
    assert_eq!(levels, vec![NoticeLevel::Warn, NoticeLevel::Success, NoticeLevel::Info]);

    let view = snapshot.view(&FilterSelection::all());
    assert_eq!(view.raw.agents, agents());
    assert!(view.filtered.is_none());
    assert!(view.filter_options.is_none());
  }

  #[tokio::test]
  async fn test_fetch_error_becomes_notice_with_tls_hint() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().returning(|table, _| match table {
      "Agent" => Err(FetchError::Connection {
        table: table.to_string(),
        message: "server does not support SSL".to_string(),
      }),
      _ => Ok(properties()),
    });

    let snapshot = dashboard(source).load().await;
    assert_eq!(snapshot.mode, ViewMode::PropertiesOnly);
    let first = snapshot.notices.iter().next().unwrap();
    assert_eq!(first.level, NoticeLevel::Error);
    assert_eq!(first.hint.as_deref(), Some(TLS_HINT));
    assert!(!snapshot.notices.has_level(NoticeLevel::Success));
  }

  #[tokio::test]
  async fn test_schema_mismatch_keeps_raw_tables() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().returning(|table, _| match table {
      "Agent" => Ok(agents()),
      _ => Ok(Table::from_rows(["id", "city"], vec![vec![Value::Int(1), "Gotham".into()]])),
    });

    let snapshot = dashboard(source).load().await;
    assert_eq!(snapshot.mode, ViewMode::Unmerged);
    assert!(snapshot.notices.has_level(NoticeLevel::Error));

    let view = snapshot.view(&FilterSelection::all());
    assert_eq!(view.raw.agents.len(), 1);
    assert_eq!(view.raw.properties.len(), 1);
    assert!(view.raw.merged.is_none());
  }

  #[tokio::test]
  async fn test_repeated_loads_hit_cache() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().times(2).returning(|table, _| match table {
      "Agent" => Ok(agents()),
      _ => Ok(properties()),
    });

    let dashboard = dashboard(source);
    dashboard.load().await;
    let view = dashboard.view(&FilterSelection::from_choices(Some("House"), None, None)).await;
    assert_eq!(view.filtered_count, 1);
  }

  #[tokio::test]
  async fn test_invalidate_forces_refetch() {
    let mut source = MockTableSource::new();
    source.expect_fetch_table().times(3).returning(|table, _| match table {
      "Agent" => Ok(agents()),
      _ => Ok(properties()),
    });

    let dashboard = dashboard(source);
    dashboard.load().await;
    assert_eq!(dashboard.invalidate(Some("Agent")), 1);
    dashboard.load().await;
    assert_eq!(dashboard.cache().len(), 2);
  }
}
