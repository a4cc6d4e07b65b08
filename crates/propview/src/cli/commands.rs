//! Command implementations for the `propview` binary

use anyhow::Result;
use colored::*;
use std::sync::Arc;

use crate::charts::Tab;
use crate::cli::display;
use crate::config::Config;
use crate::dashboard::{Dashboard, DashboardView, ViewMode};
use crate::filter::{FilterOptions, FilterSelection};
use crate::notice::Notices;
use crate::source::{PgTableSource, TableSource};

/// Load the dashboard once and print it
pub async fn snapshot(config: &Config, selection: FilterSelection, rows: usize, json: bool) -> Result<()> {
  let view = Dashboard::from_config(config).view(&selection).await;

  if json {
    println!("{}", serde_json::to_string_pretty(&view)?);
    return Ok(());
  }

  print_view(&view, rows);
  Ok(())
}

/// Print the filter option lists
pub async fn options(config: &Config, json: bool) -> Result<()> {
  let snapshot = Dashboard::from_config(config).load().await;
  let options = snapshot.filter_options();

  if json {
    println!("{}", serde_json::to_string_pretty(&options)?);
    return Ok(());
  }

  print_notices(&snapshot.notices);
  match options {
    Some(options) => print_options(&options),
    None => println!("No filter options: property and agent data could not be joined."),
  }
  Ok(())
}

/// Validate configuration, optionally reading one row of each table
pub async fn check(config: &Config, connect: bool) -> Result<()> {
  let info = config.connection_info();
  println!("{} Configuration loaded", "✓".green());
  println!("  {:<15} {}:{}", "host", info.host.cyan(), info.port);
  println!("  {:<15} {}", "database", info.database.cyan());
  println!("  {:<15} {}", "user", info.user.cyan());
  println!("  {:<15} {}", "ssl mode", info.ssl_mode.to_string().cyan());
  println!("  {:<15} {}", "property table", info.property_table.cyan());
  println!("  {:<15} {}", "agent table", info.agent_table.cyan());
  println!("  {:<15} {}", "row limit", config.row_limit);
  println!("  {:<15} {}s", "cache ttl", config.cache_ttl.as_secs());

  if !connect {
    return Ok(());
  }

  let source: Arc<dyn TableSource> = Arc::new(PgTableSource::new(config.db.clone()));
  let mut failed = 0;
  for table in [&config.tables.property, &config.tables.agent] {
    match source.fetch_table(table, 1).await {
      Ok(data) => println!("{} {} readable ({} columns)", "✓".green(), table.cyan(), data.columns().len()),
      Err(e) => {
        failed += 1;
        println!("{} {}", "✗".red(), e);
        if let Some(hint) = e.hint() {
          println!("  {} {}", "💡".yellow(), hint.dimmed());
        }
      }
    }
  }

  if failed > 0 {
    anyhow::bail!("{failed} table(s) could not be read");
  }
  Ok(())
}

fn print_notices(notices: &Notices) {
  for notice in notices {
    for line in display::notice_lines(notice) {
      println!("{line}");
    }
  }
}

fn print_options(options: &FilterOptions) {
  let lists = [
    ("Property Type", &options.property_types),
    ("City", &options.cities),
    ("Agent Company", &options.agent_companies),
  ];
  for (label, values) in lists {
    if let Some(values) = values {
      println!("{} {}", format!("{label}:").bold(), values.join(", "));
    }
  }
}

fn print_view(view: &DashboardView, rows: usize) {
  print_notices(&view.notices);
  println!();

  match view.mode {
    ViewMode::Merged => {}
    ViewMode::AgentsOnly => {
      println!("{}", "Agent Data".bold());
      print_lines(display::table_lines(&view.raw.agents, rows));
      return;
    }
    ViewMode::PropertiesOnly => {
      println!("{}", "Property Data".bold());
      print_lines(display::table_lines(&view.raw.properties, rows));
      return;
    }
    ViewMode::Unmerged => {
      println!("{}", "Agent Data".bold());
      print_lines(display::table_lines(&view.raw.agents, rows));
      println!("{}", "Property Data".bold());
      print_lines(display::table_lines(&view.raw.properties, rows));
      return;
    }
    ViewMode::Empty => return,
  }

  if let Some(preview) = &view.combined_preview {
    println!("{}", "Combined Property and Agent Data".bold());
    print_lines(display::table_lines(preview, preview.len()));
    println!();
  }

  if let Some(options) = &view.filter_options {
    print_options(options);
    println!();
  }

  println!("{}", format!("Filtered Data ({} rows)", view.filtered_count).bold());
  if let Some(filtered) = &view.filtered {
    print_lines(display::table_lines(filtered, rows));
  }

  for tab in Tab::ALL {
    println!();
    println!("{}", tab.title().blue().bold());
    for panel in view.panels.iter().filter(|panel| panel.tab == tab) {
      print_lines(display::panel_lines(panel));
    }
  }
}

fn print_lines(lines: Vec<String>) {
  for line in lines {
    println!("{line}");
  }
}
