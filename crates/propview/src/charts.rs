//! Chart panels for the dashboard tabs
//!
//! Panels carry chart-ready data, never drawing instructions. Each panel checks
//! the columns it needs and falls back to an informational message when they
//! are missing, so a partial schema still renders every tab.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aggregate::{self, Bucket, Histogram, MapPoint, ScatterPoint, DEFAULT_HISTOGRAM_BINS};
use crate::aggregate::{LATITUDE_COLUMN, LONGITUDE_COLUMN};
use crate::filter::{CITY_COLUMN, PROPERTY_TYPE_COLUMN};
use crate::merge::AGENT_COMPANY_COLUMN;
use crate::table::Table;

const PRICE_COLUMN: &str = "price";
const AREA_COLUMN: &str = "area";
const MAP_ZOOM: u8 = 8;

/// Tabs that hold chart panels. Raw data is served separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
  PropertyOverview,
  AgentPerformance,
  LocationAnalysis,
}

impl Tab {
  pub const ALL: [Tab; 3] = [Tab::PropertyOverview, Tab::AgentPerformance, Tab::LocationAnalysis];

  pub fn title(&self) -> &'static str {
    match self {
      Tab::PropertyOverview => "Property Overview",
      Tab::AgentPerformance => "Agent Performance",
      Tab::LocationAnalysis => "Location Analysis",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Chart {
  Bar {
    title: String,
    x_label: String,
    y_label: String,
    buckets: Vec<Bucket>,
    /// Color each bar by its label
    colored: bool,
  },
  Pie {
    title: String,
    names_label: String,
    values_label: String,
    buckets: Vec<Bucket>,
  },
  Histogram {
    title: String,
    histogram: Histogram,
  },
  Scatter {
    title: String,
    x_label: String,
    y_label: String,
    color_label: String,
    points: Vec<ScatterPoint>,
  },
  Map {
    title: String,
    zoom: u8,
    points: Vec<MapPoint>,
  },
}

/// A chart, or the reason there is none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PanelBody {
  Chart(Chart),
  Info(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChartPanel {
  pub id: String,
  pub tab: Tab,
  pub heading: String,
  pub body: PanelBody,
}

impl ChartPanel {
  fn new(id: &str, tab: Tab, heading: &str, body: PanelBody) -> Self {
    Self { id: id.to_string(), tab, heading: heading.to_string(), body }
  }

  pub fn chart(&self) -> Option<&Chart> {
    match &self.body {
      PanelBody::Chart(chart) => Some(chart),
      PanelBody::Info(_) => None,
    }
  }

  pub fn info(&self) -> Option<&str> {
    match &self.body {
      PanelBody::Info(message) => Some(message),
      PanelBody::Chart(_) => None,
    }
  }
}

/// Panels for every tab, in display order
pub fn build_panels(filtered: &Table) -> Vec<ChartPanel> {
  Tab::ALL.iter().flat_map(|&tab| build_tab(filtered, tab)).collect()
}

/// Panels of a single tab
pub fn build_tab(filtered: &Table, tab: Tab) -> Vec<ChartPanel> {
  if filtered.is_empty() {
    let message = format!("No data to display for {} after filters.", tab.title());
    return vec![ChartPanel::new("no_data", tab, tab.title(), PanelBody::Info(message))];
  }

  match tab {
    Tab::PropertyOverview => vec![
      count_bar(filtered, tab, PROPERTY_TYPE_COLUMN, &TYPE_COUNT),
      mean_bar(filtered, tab, PROPERTY_TYPE_COLUMN, &TYPE_PRICE),
      price_distribution(filtered, tab),
      area_vs_price(filtered, tab),
    ],
    Tab::AgentPerformance => vec![
      count_bar(filtered, tab, AGENT_COMPANY_COLUMN, &AGENT_COUNT),
      agent_total_value(filtered, tab),
      mean_bar(filtered, tab, AGENT_COMPANY_COLUMN, &AGENT_PRICE),
    ],
    Tab::LocationAnalysis => vec![
      count_bar(filtered, tab, CITY_COLUMN, &CITY_COUNT),
      mean_bar(filtered, tab, CITY_COLUMN, &CITY_PRICE),
      property_map(filtered, tab),
    ],
  }
}

/// Identity and labels of a bar panel
struct BarText {
  id: &'static str,
  heading: &'static str,
  title: &'static str,
  x_label: &'static str,
  y_label: &'static str,
}

const TYPE_COUNT: BarText = BarText {
  id: "property_type_count",
  heading: "Property Count by Type",
  title: "Number of Properties by Type",
  x_label: "Property Type",
  y_label: "Count",
};
const TYPE_PRICE: BarText = BarText {
  id: "property_type_avg_price",
  heading: "Average Price by Property Type",
  title: "Average Property Price by Type",
  x_label: "Property Type",
  y_label: "Average Price",
};
const AGENT_COUNT: BarText = BarText {
  id: "agent_property_count",
  heading: "Number of Properties per Agent Company",
  title: "Properties Listed by Agent Company",
  x_label: "Agent Company",
  y_label: "Number of Properties",
};
const AGENT_PRICE: BarText = BarText {
  id: "agent_avg_price",
  heading: "Average Property Price per Agent Company",
  title: "Average Property Price by Agent Company",
  x_label: "Agent Company",
  y_label: "Average Property Price",
};
const CITY_COUNT: BarText = BarText {
  id: "city_count",
  heading: "Properties by City",
  title: "Number of Properties by City",
  x_label: "City",
  y_label: "Count",
};
const CITY_PRICE: BarText = BarText {
  id: "city_avg_price",
  heading: "Average Price by City",
  title: "Average Property Price by City",
  x_label: "City",
  y_label: "Average Price",
};

fn missing_one(column: &str) -> PanelBody {
  PanelBody::Info(format!("No '{column}' column found for this visualization."))
}

fn missing_either(first: &str, second: &str) -> PanelBody {
  PanelBody::Info(format!("Missing '{first}' or '{second}' column for this visualization."))
}

fn count_bar(table: &Table, tab: Tab, column: &str, text: &BarText) -> ChartPanel {
  let body = if table.has_column(column) {
    PanelBody::Chart(Chart::Bar {
      title: text.title.to_string(),
      x_label: text.x_label.to_string(),
      y_label: text.y_label.to_string(),
      buckets: aggregate::value_counts(table, column),
      colored: false,
    })
  } else {
    missing_one(column)
  };
  ChartPanel::new(text.id, tab, text.heading, body)
}

fn mean_bar(table: &Table, tab: Tab, key: &str, text: &BarText) -> ChartPanel {
  let body = if table.has_column(key) && table.has_column(PRICE_COLUMN) {
    PanelBody::Chart(Chart::Bar {
      title: text.title.to_string(),
      x_label: text.x_label.to_string(),
      y_label: text.y_label.to_string(),
      buckets: aggregate::group_mean(table, key, PRICE_COLUMN),
      colored: true,
    })
  } else {
    missing_either(key, PRICE_COLUMN)
  };
  ChartPanel::new(text.id, tab, text.heading, body)
}

fn price_distribution(table: &Table, tab: Tab) -> ChartPanel {
  let body = if table.has_column(PRICE_COLUMN) {
    PanelBody::Chart(Chart::Histogram {
      title: "Distribution of Property Prices".to_string(),
      histogram: aggregate::histogram(table, PRICE_COLUMN, DEFAULT_HISTOGRAM_BINS),
    })
  } else {
    missing_one(PRICE_COLUMN)
  };
  ChartPanel::new("price_distribution", tab, "Property Price Distribution", body)
}

fn area_vs_price(table: &Table, tab: Tab) -> ChartPanel {
  let body = if table.has_column(AREA_COLUMN) && table.has_column(PRICE_COLUMN) {
    PanelBody::Chart(Chart::Scatter {
      title: "Property Area vs. Price".to_string(),
      x_label: AREA_COLUMN.to_string(),
      y_label: PRICE_COLUMN.to_string(),
      color_label: PROPERTY_TYPE_COLUMN.to_string(),
      points: aggregate::scatter(
        table,
        AREA_COLUMN,
        PRICE_COLUMN,
        Some(PROPERTY_TYPE_COLUMN),
        &["title", CITY_COLUMN],
      ),
    })
  } else {
    missing_either(AREA_COLUMN, PRICE_COLUMN)
  };
  ChartPanel::new("area_vs_price", tab, "Property Area vs. Price", body)
}

fn agent_total_value(table: &Table, tab: Tab) -> ChartPanel {
  let body = if table.has_column(AGENT_COMPANY_COLUMN) && table.has_column(PRICE_COLUMN) {
    PanelBody::Chart(Chart::Pie {
      title: "Total Value of Properties by Agent Company".to_string(),
      names_label: "Agent Company".to_string(),
      values_label: "Total Property Value".to_string(),
      buckets: aggregate::group_sum(table, AGENT_COMPANY_COLUMN, PRICE_COLUMN),
    })
  } else {
    missing_either(AGENT_COMPANY_COLUMN, PRICE_COLUMN)
  };
  ChartPanel::new("agent_total_value", tab, "Total Value of Properties per Agent Company", body)
}

fn property_map(table: &Table, tab: Tab) -> ChartPanel {
  let points = aggregate::map_points(table);
  let body = if points.is_empty() {
    PanelBody::Info(format!(
      "Missing '{LONGITUDE_COLUMN}' or '{LATITUDE_COLUMN}' coordinates for map visualization or all coordinates are null."
    ))
  } else {
    PanelBody::Chart(Chart::Map { title: "Property Locations".to_string(), zoom: MAP_ZOOM, points })
  };
  ChartPanel::new("property_map", tab, "Property Locations on Map", body)
}
