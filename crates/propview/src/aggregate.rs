//! Aggregations backing the dashboard charts
//!
//! Every function skips null cells and non-numeric values the way a dataframe
//! groupby would. Callers check column presence first; a missing column simply
//! yields an empty result here.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::table::Table;
use crate::value::Value;

pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// One labelled number: a count, a mean or a sum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Bucket {
  pub label: String,
  pub value: f64,
}

impl Bucket {
  fn new(label: impl Into<String>, value: f64) -> Self {
    Self { label: label.into(), value }
  }
}

/// Occurrences of each distinct non-null value, most frequent first.
/// Ties keep first-appearance order.
pub fn value_counts(table: &Table, column: &str) -> Vec<Bucket> {
  let Some(values) = table.column_values(column) else {
    return Vec::new();
  };

  let mut buckets: Vec<Bucket> = Vec::new();
  let mut positions: HashMap<String, usize> = HashMap::new();
  for label in values.filter_map(Value::label) {
    match positions.get(&label) {
      Some(&index) => buckets[index].value += 1.0,
      None => {
        positions.insert(label.clone(), buckets.len());
        buckets.push(Bucket::new(label, 1.0));
      }
    }
  }

  // Stable sort keeps first appearance among equal counts
  buckets.sort_by(|a, b| b.value.total_cmp(&a.value));
  buckets
}

/// Mean of `value` per distinct `key`, keys ascending
pub fn group_mean(table: &Table, key: &str, value: &str) -> Vec<Bucket> {
  grouped(table, key, value)
    .into_iter()
    .map(|(label, values)| Bucket::new(label, values.iter().sum::<f64>() / values.len() as f64))
    .collect()
}

/// Sum of `value` per distinct `key`, keys ascending
pub fn group_sum(table: &Table, key: &str, value: &str) -> Vec<Bucket> {
  grouped(table, key, value)
    .into_iter()
    .map(|(label, values)| Bucket::new(label, values.iter().sum()))
    .collect()
}

/// Numeric values per non-null key. Groups without any numeric value are absent.
fn grouped(table: &Table, key: &str, value: &str) -> BTreeMap<String, Vec<f64>> {
  let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
  let (Some(key_index), Some(value_index)) = (table.column_index(key), table.column_index(value)) else {
    return groups;
  };

  for row in table.rows() {
    if let (Some(label), Some(number)) = (row[key_index].label(), row[value_index].as_f64()) {
      groups.entry(label).or_default().push(number);
    }
  }
  groups
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HistogramBin {
  pub start: f64,
  pub end: f64,
  pub count: usize,
}

/// Minimum, quartiles and maximum for a box marginal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FiveNumberSummary {
  pub min: f64,
  pub q1: f64,
  pub median: f64,
  pub q3: f64,
  pub max: f64,
}

impl FiveNumberSummary {
  /// Summary of ascending `values`; `None` when there are none
  fn from_sorted(values: &[f64]) -> Option<Self> {
    let (&min, &max) = (values.first()?, values.last()?);
    Some(Self {
      min,
      q1: quantile(values, 0.25),
      median: quantile(values, 0.5),
      q3: quantile(values, 0.75),
      max,
    })
  }
}

/// Linear interpolation between closest ranks
fn quantile(sorted: &[f64], q: f64) -> f64 {
  let position = q * (sorted.len() - 1) as f64;
  let lower = position.floor() as usize;
  let upper = position.ceil() as usize;
  let fraction = position - lower as f64;
  sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Histogram {
  pub column: String,
  pub bins: Vec<HistogramBin>,
  /// `None` when the column has no numeric values
  pub summary: Option<FiveNumberSummary>,
}

/// Equal-width histogram of the numeric values of `column` over `[min, max]`.
///
/// The last bin includes its upper edge. A column holding a single distinct
/// value gets one bin of width one centred on it.
pub fn histogram(table: &Table, column: &str, bins: usize) -> Histogram {
  let mut values: Vec<f64> =
    table.column_values(column).map(|values| values.filter_map(Value::as_f64).collect()).unwrap_or_default();
  values.sort_by(f64::total_cmp);

  let summary = FiveNumberSummary::from_sorted(&values);
  let bins = match &summary {
    None => Vec::new(),
    Some(summary) if summary.min == summary.max => {
      vec![HistogramBin { start: summary.min - 0.5, end: summary.max + 0.5, count: values.len() }]
    }
    Some(summary) => {
      let count = bins.max(1);
      let width = (summary.max - summary.min) / count as f64;
      let mut out: Vec<HistogramBin> = (0..count)
        .map(|i| HistogramBin {
          start: summary.min + width * i as f64,
          end: if i + 1 == count { summary.max } else { summary.min + width * (i + 1) as f64 },
          count: 0,
        })
        .collect();
      for value in &values {
        let index = (((value - summary.min) / width) as usize).min(count - 1);
        out[index].count += 1;
      }
      out
    }
  };

  Histogram { column: column.to_string(), bins, summary }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScatterPoint {
  pub x: f64,
  pub y: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub color: Option<String>,
  #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
  pub hover: BTreeMap<String, Value>,
}

/// Rows where both `x` and `y` are numeric, as points. `color` and `hover`
/// columns are attached when present.
pub fn scatter(table: &Table, x: &str, y: &str, color: Option<&str>, hover: &[&str]) -> Vec<ScatterPoint> {
  plot_rows(table, x, y, color, hover, |point, _| point)
}

/// Walk the rows with numeric `x` and `y`, handing each point and its row to `build`
fn plot_rows<T>(
  table: &Table,
  x: &str,
  y: &str,
  color: Option<&str>,
  hover: &[&str],
  build: impl Fn(ScatterPoint, &[Value]) -> T,
) -> Vec<T> {
  let (Some(x_index), Some(y_index)) = (table.column_index(x), table.column_index(y)) else {
    return Vec::new();
  };
  let color_index = color.and_then(|column| table.column_index(column));
  let hover_indexes: Vec<(&str, usize)> =
    hover.iter().filter_map(|&column| table.column_index(column).map(|index| (column, index))).collect();

  table
    .rows()
    .iter()
    .filter_map(|row| {
      let (x, y) = (row[x_index].as_f64()?, row[y_index].as_f64()?);
      let point = ScatterPoint {
        x,
        y,
        color: color_index.and_then(|index| row[index].label()),
        hover: hover_indexes.iter().map(|&(column, index)| (column.to_string(), row[index].clone())).collect(),
      };
      Some(build(point, row.as_slice()))
    })
    .collect()
}

pub const LATITUDE_COLUMN: &str = "y";
pub const LONGITUDE_COLUMN: &str = "x";
const MAP_TITLE_COLUMN: &str = "title";
const MAP_COLOR_COLUMN: &str = "propertyType";
const MAP_HOVER_COLUMNS: [&str; 4] = ["address", "city", "price", "propertyType"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MapPoint {
  pub lat: f64,
  pub lon: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub color: Option<String>,
  #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
  pub hover: BTreeMap<String, Value>,
}

/// Property locations: `y` is latitude and `x` longitude. Rows with a null or
/// non-numeric coordinate are left off the map.
pub fn map_points(table: &Table) -> Vec<MapPoint> {
  let title_index = table.column_index(MAP_TITLE_COLUMN);
  plot_rows(table, LONGITUDE_COLUMN, LATITUDE_COLUMN, Some(MAP_COLOR_COLUMN), &MAP_HOVER_COLUMNS, |point, row| {
    MapPoint {
      lat: point.y,
      lon: point.x,
      label: title_index.and_then(|index| row[index].label()),
      color: point.color,
      hover: point.hover,
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn listings() -> Table {
    Table::from_rows(
      ["propertyType", "city", "price", "area", "title", "x", "y"],
      vec![
        vec!["Condo".into(), "Gotham".into(), Value::Int(100), Value::Int(50), "A".into(), Value::Float(-74.0), Value::Float(40.7)],
        vec!["House".into(), "Metropolis".into(), Value::Int(300), Value::Int(120), "B".into(), Value::Null, Value::Float(41.0)],
        vec!["Condo".into(), "Gotham".into(), Value::Int(200), Value::Null, "C".into(), Value::Float(-73.9), Value::Float(40.8)],
        vec!["House".into(), Value::Null, Value::Null, Value::Int(80), "D".into(), Value::Float(-74.1), Value::Float(40.6)],
        vec!["Loft".into(), "Gotham".into(), "n/a".into(), Value::Int(60), "E".into(), Value::Float(-74.2), Value::Float(40.5)],
      ],
    )
  }

  #[test]
  fn test_value_counts_desc_with_first_appearance_ties() {
    let counts = value_counts(&listings(), "propertyType");
    assert_eq!(counts, vec![Bucket::new("Condo", 2.0), Bucket::new("House", 2.0), Bucket::new("Loft", 1.0)]);
  }

  #[test]
  fn test_value_counts_skip_nulls() {
    let counts = value_counts(&listings(), "city");
    assert_eq!(counts, vec![Bucket::new("Gotham", 3.0), Bucket::new("Metropolis", 1.0)]);
    assert!(value_counts(&listings(), "missing").is_empty());
  }

  #[test]
  fn test_group_mean_and_sum() {
    let means = group_mean(&listings(), "propertyType", "price");
    assert_eq!(means, vec![Bucket::new("Condo", 150.0), Bucket::new("House", 300.0)]);

    let sums = group_sum(&listings(), "city", "price");
    assert_eq!(sums, vec![Bucket::new("Gotham", 300.0), Bucket::new("Metropolis", 300.0)]);
  }

  #[test]
  fn test_histogram_bins_cover_range() {
    let table = Table::from_rows(["price"], (0..=10).map(|i| vec![Value::Int(i * 10)]).collect());
    let hist = histogram(&table, "price", 5);
    assert_eq!(hist.bins.len(), 5);
    assert_eq!(hist.bins[0].start, 0.0);
    assert_eq!(hist.bins[4].end, 100.0);
    assert_eq!(hist.bins.iter().map(|bin| bin.count).sum::<usize>(), 11);
    // Upper edge lands in the last bin
    assert_eq!(hist.bins[4].count, 3);
  }

  #[test]
  fn test_five_number_summary_interpolates() {
    let table = Table::from_rows(["price"], [1, 2, 3, 4].into_iter().map(|i| vec![Value::Int(i)]).collect());
    let summary = histogram(&table, "price", DEFAULT_HISTOGRAM_BINS).summary.unwrap();
    assert_eq!(summary, FiveNumberSummary { min: 1.0, q1: 1.75, median: 2.5, q3: 3.25, max: 4.0 });
  }

  #[test]
  fn test_histogram_single_value_and_empty() {
    let table = Table::from_rows(["price"], vec![vec![Value::Int(5)], vec![Value::Int(5)], vec![Value::Null]]);
    let hist = histogram(&table, "price", DEFAULT_HISTOGRAM_BINS);
    assert_eq!(hist.bins, vec![HistogramBin { start: 4.5, end: 5.5, count: 2 }]);

    let empty = histogram(&Table::from_rows(["price"], vec![vec![Value::Null]]), "price", DEFAULT_HISTOGRAM_BINS);
    assert!(empty.bins.is_empty());
    assert!(empty.summary.is_none());
  }

  #[test]
  fn test_scatter_drops_non_numeric_rows() {
    let points = scatter(&listings(), "area", "price", Some("propertyType"), &["title", "city"]);
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].color.as_deref(), Some("Condo"));
    assert_eq!(points[1].hover.get("title"), Some(&Value::from("B")));
  }

  #[test]
  fn test_map_points_use_y_as_latitude() {
    let points = map_points(&listings());
    let labels: Vec<_> = points.iter().filter_map(|point| point.label.clone()).collect();
    assert_eq!(labels, vec!["A", "C", "D", "E"]);
    assert_eq!((points[0].lat, points[0].lon), (40.7, -74.0));
    assert_eq!(points[0].hover.get("city"), Some(&Value::from("Gotham")));
  }

  #[test]
  fn test_map_points_empty_when_coordinates_null() {
    let table = Table::from_rows(["x", "y"], vec![vec![Value::Null, Value::Null]]);
    assert!(map_points(&table).is_empty());
  }
}
