//! Display formatting utilities for CLI output

use colored::*;

use crate::aggregate::Bucket;
use crate::charts::{Chart, ChartPanel, PanelBody};
use crate::notice::{Notice, NoticeLevel};
use crate::table::Table;

/// Widest a table cell is printed before truncation
pub const MAX_CELL_WIDTH: usize = 24;

/// One colored line per notice, with its hint indented below
pub fn notice_lines(notice: &Notice) -> Vec<String> {
  let marker = match notice.level {
    NoticeLevel::Info => "ℹ".blue(),
    NoticeLevel::Success => "✓".green(),
    NoticeLevel::Warn => "⚠".yellow(),
    NoticeLevel::Error => "✗".red(),
  };
  let mut lines = vec![format!("{} {}", marker, notice.message)];
  if let Some(hint) = &notice.hint {
    lines.push(format!("  {} {}", "💡".yellow(), hint.dimmed()));
  }
  lines
}

/// Shorten `text` to `width` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, width: usize) -> String {
  if text.chars().count() <= width {
    return text.to_string();
  }
  let kept: String = text.chars().take(width.saturating_sub(1)).collect();
  format!("{kept}…")
}

/// Plain-text grid of the first `max_rows` rows
pub fn table_lines(table: &Table, max_rows: usize) -> Vec<String> {
  if table.columns().is_empty() {
    return vec!["(no columns)".dimmed().to_string()];
  }

  let shown = table.head(max_rows);
  let cells: Vec<Vec<String>> = shown
    .rows()
    .iter()
    .map(|row| row.iter().map(|value| truncate(&value.to_string(), MAX_CELL_WIDTH)).collect())
    .collect();

  let widths: Vec<usize> = table
    .columns()
    .iter()
    .enumerate()
    .map(|(index, name)| {
      let header = truncate(name, MAX_CELL_WIDTH).chars().count();
      cells.iter().map(|row| row[index].chars().count()).fold(header, usize::max)
    })
    .collect();

  let format_row = |values: Vec<String>| {
    values
      .iter()
      .zip(&widths)
      .map(|(value, &width)| format!("{value:<width$}"))
      .collect::<Vec<_>>()
      .join("  ")
      .trim_end()
      .to_string()
  };

  let header: Vec<String> = table.columns().iter().map(|name| truncate(name, MAX_CELL_WIDTH)).collect();
  let mut lines = vec![format_row(header).bold().to_string()];
  lines.extend(cells.into_iter().map(format_row));
  if table.len() > max_rows {
    lines.push(format!("… {} more rows", table.len() - max_rows).dimmed().to_string());
  }
  lines
}

/// `label  value` pairs, values right-aligned
pub fn bucket_lines(buckets: &[Bucket]) -> Vec<String> {
  let label_width = buckets.iter().map(|bucket| bucket.label.chars().count()).max().unwrap_or(0);
  buckets
    .iter()
    .map(|bucket| format!("    {:<label_width$}  {:>12}", bucket.label, format_number(bucket.value)))
    .collect()
}

/// Integers without a fraction, everything else with two decimals
pub fn format_number(value: f64) -> String {
  if value.fract() == 0.0 && value.abs() < 1e15 {
    format!("{}", value as i64)
  } else {
    format!("{value:.2}")
  }
}

/// Heading plus a compact textual summary of a chart panel
pub fn panel_lines(panel: &ChartPanel) -> Vec<String> {
  let mut lines = vec![format!("  {}", panel.heading.cyan().bold())];
  match &panel.body {
    PanelBody::Info(message) => lines.push(format!("    {}", message.dimmed())),
    PanelBody::Chart(Chart::Bar { buckets, .. } | Chart::Pie { buckets, .. }) => lines.extend(bucket_lines(buckets)),
    PanelBody::Chart(Chart::Histogram { histogram, .. }) => match &histogram.summary {
      Some(s) => lines.push(format!(
        "    min {}  q1 {}  median {}  q3 {}  max {}  ({} bins)",
        format_number(s.min),
        format_number(s.q1),
        format_number(s.median),
        format_number(s.q3),
        format_number(s.max),
        histogram.bins.len()
      )),
      None => lines.push(format!("    {}", "no numeric values".dimmed())),
    },
    PanelBody::Chart(Chart::Scatter { points, .. }) => lines.push(format!("    {} points", points.len())),
    PanelBody::Chart(Chart::Map { points, .. }) => lines.push(format!("    {} located properties", points.len())),
  }
  lines
}
