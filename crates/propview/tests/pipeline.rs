//! End-to-end pipeline scenarios against an in-memory table source

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{agents, properties, table_names, FakeSource, AGENT_TABLE, PROPERTY_TABLE};
use propview::charts::Tab;
use propview::dashboard::{Dashboard, ViewMode};
use propview::filter::FilterSelection;
use propview::merge::{AGENT_COMPANY_COLUMN, AGENT_EMAIL_COLUMN, AGENT_PHONE_COLUMN};
use propview::notice::NoticeLevel;
use propview::source::{FetchError, TLS_HINT};
use propview::table::Table;
use propview::value::Value;

fn dashboard(source: FakeSource) -> (Dashboard, Arc<FakeSource>) {
  let source = Arc::new(source);
  let dashboard = Dashboard::new(source.clone(), table_names(), 1000, Duration::from_secs(300));
  (dashboard, source)
}

fn full_source() -> FakeSource {
  FakeSource::new().with_table(AGENT_TABLE, agents()).with_table(PROPERTY_TABLE, properties())
}

#[tokio::test]
async fn test_matched_property_gets_agent_details() {
  let (dashboard, _) = dashboard(full_source());
  let view = dashboard.view(&FilterSelection::all()).await;

  assert_eq!(view.mode, ViewMode::Merged);
  let filtered = view.filtered.unwrap();
  assert_eq!(filtered.value(0, AGENT_COMPANY_COLUMN), Some(&Value::from("Acme Realty")));
  assert_eq!(filtered.value(0, AGENT_EMAIL_COLUMN), Some(&Value::from("a@x.com")));
  assert_eq!(filtered.value(0, AGENT_PHONE_COLUMN), Some(&Value::from("555")));
}

#[tokio::test]
async fn test_unmatched_property_gets_sentinels() {
  let (dashboard, _) = dashboard(full_source());
  let filtered = dashboard.view(&FilterSelection::all()).await.filtered.unwrap();

  assert_eq!(filtered.len(), properties().len());
  assert_eq!(filtered.value(1, "agentId"), Some(&Value::Int(99)));
  assert_eq!(filtered.value(1, AGENT_COMPANY_COLUMN), Some(&Value::from("No Agent Assigned")));
  assert_eq!(filtered.value(1, AGENT_EMAIL_COLUMN), Some(&Value::from("N/A")));
  assert_eq!(filtered.value(1, AGENT_PHONE_COLUMN), Some(&Value::from("N/A")));
}

#[tokio::test]
async fn test_empty_properties_show_agents_with_notice() {
  let source = FakeSource::new().with_table(AGENT_TABLE, agents()).with_table(PROPERTY_TABLE, Table::default());
  let (dashboard, _) = dashboard(source);
  let view = dashboard.view(&FilterSelection::all()).await;

  assert_eq!(view.mode, ViewMode::AgentsOnly);
  assert_eq!(view.raw.agents, agents());
  assert!(view.panels.is_empty());
  assert!(view.notices.iter().any(|notice| notice.level == NoticeLevel::Warn
    && notice.message == "No data returned from Property table."));
  assert!(view.notices.iter().any(|notice| notice.level == NoticeLevel::Info
    && notice.message.contains("cannot perform merge")));
}

#[tokio::test]
async fn test_property_type_filter_keeps_matching_rows_in_order() {
  let (dashboard, _) = dashboard(full_source());

  let view = dashboard.view(&FilterSelection::from_choices(Some("Condo"), None, None)).await;
  let ids: Vec<_> = view.filtered.unwrap().column_values("id").unwrap().cloned().collect();
  assert_eq!(ids, vec![Value::Int(2), Value::Int(3)]);

  let view = dashboard.view(&FilterSelection::from_choices(Some("House"), None, None)).await;
  assert_eq!(view.filtered_count, 1);
}

#[tokio::test]
async fn test_agent_company_filter_matches_sentinel() {
  let (dashboard, _) = dashboard(full_source());
  let view = dashboard.view(&FilterSelection::from_choices(None, None, Some("No Agent Assigned"))).await;
  assert_eq!(view.filtered_count, 1);

  let options = view.filter_options.unwrap();
  assert_eq!(options.agent_companies.unwrap(), vec!["All", "Acme Realty", "No Agent Assigned", "Bay Homes"]);
}

#[tokio::test]
async fn test_filter_with_no_match_shows_per_tab_message() {
  let (dashboard, _) = dashboard(full_source());
  let view = dashboard.view(&FilterSelection::from_choices(Some("Castle"), None, None)).await;

  assert_eq!(view.filtered_count, 0);
  assert_eq!(view.panels.len(), Tab::ALL.len());
  assert_eq!(view.panels[2].info(), Some("No data to display for Location Analysis after filters."));
  // Options still come from the unfiltered data
  assert_eq!(view.filter_options.unwrap().cities.unwrap(), vec!["All", "Metropolis", "Gotham"]);
}

#[tokio::test]
async fn test_combined_preview_is_unfiltered_head() {
  let (dashboard, _) = dashboard(full_source());
  let view = dashboard.view(&FilterSelection::from_choices(None, Some("Gotham"), None)).await;
  assert_eq!(view.combined_preview.unwrap().len(), 3);
  assert_eq!(view.filtered_count, 1);
}

#[tokio::test]
async fn test_repeat_loads_within_window_query_once_per_table() {
  let (dashboard, source) = dashboard(full_source());
  dashboard.load().await;
  dashboard.load().await;
  dashboard.view(&FilterSelection::from_choices(Some("House"), None, None)).await;
  assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_tls_failure_reports_hint_and_degrades() {
  let source = FakeSource::new().with_table(AGENT_TABLE, agents()).with_error(
    PROPERTY_TABLE,
    FetchError::Connection {
      table: PROPERTY_TABLE.to_string(),
      message: "error performing TLS handshake".to_string(),
    },
  );
  let (dashboard, _) = dashboard(source);
  let view = dashboard.view(&FilterSelection::all()).await;

  assert_eq!(view.mode, ViewMode::AgentsOnly);
  let error = view.notices.iter().find(|notice| notice.level == NoticeLevel::Error).unwrap();
  assert!(error.message.contains(PROPERTY_TABLE));
  assert_eq!(error.hint.as_deref(), Some(TLS_HINT));
  assert!(!view.notices.iter().any(|notice| notice.level == NoticeLevel::Success));
}

#[tokio::test]
async fn test_missing_tables_yield_single_warning() {
  let (dashboard, _) = dashboard(FakeSource::new());
  let view = dashboard.view(&FilterSelection::all()).await;

  assert_eq!(view.mode, ViewMode::Empty);
  let warnings: Vec<_> =
    view.notices.iter().filter(|notice| notice.level == NoticeLevel::Warn).map(|n| n.message.as_str()).collect();
  assert_eq!(warnings, vec!["No data returned from either Agent or Property tables."]);
}

#[tokio::test]
async fn test_row_limit_bounds_fetch() {
  let source = Arc::new(full_source());
  let dashboard = Dashboard::new(source, table_names(), 2, Duration::from_secs(300));
  let view = dashboard.view(&FilterSelection::all()).await;
  assert_eq!(view.raw.properties.len(), 2);
  assert_eq!(view.filtered_count, 2);
}
