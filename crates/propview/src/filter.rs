//! Filter engine for the enriched dataset
//!
//! A [`FilterSelection`] holds up to three exact-match constraints. Filtering
//! always produces a new table and keeps the original row order.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::merge::AGENT_COMPANY_COLUMN;
use crate::table::Table;

/// Option shown first in every list; selecting it removes the constraint
pub const WILDCARD: &str = "All";

pub const PROPERTY_TYPE_COLUMN: &str = "propertyType";
pub const CITY_COLUMN: &str = "city";

/// Selected filter values. `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FilterSelection {
  pub property_type: Option<String>,
  pub city: Option<String>,
  pub agent_company: Option<String>,
}

impl FilterSelection {
  /// Selection with every constraint set to the wildcard
  pub fn all() -> Self {
    Self::default()
  }

  /// Build a selection from raw UI choices; `All`, `*` and blank mean wildcard
  pub fn from_choices(property_type: Option<&str>, city: Option<&str>, agent_company: Option<&str>) -> Self {
    Self {
      property_type: normalize_choice(property_type),
      city: normalize_choice(city),
      agent_company: normalize_choice(agent_company),
    }
  }

  pub fn is_wildcard(&self) -> bool {
    self.constraints().next().is_none()
  }

  /// Active `(column, value)` constraints
  pub fn constraints(&self) -> impl Iterator<Item = (&'static str, &str)> {
    [
      (PROPERTY_TYPE_COLUMN, self.property_type.as_deref()),
      (CITY_COLUMN, self.city.as_deref()),
      (AGENT_COMPANY_COLUMN, self.agent_company.as_deref()),
    ]
    .into_iter()
    .filter_map(|(column, value)| value.map(|value| (column, value)))
  }
}

/// Map a raw UI choice onto an optional constraint. Anything other than a
/// wildcard or a blank choice is kept byte-for-byte.
pub fn normalize_choice(choice: Option<&str>) -> Option<String> {
  let choice = choice?;
  if choice.trim().is_empty() || choice == WILDCARD || choice == "*" {
    None
  } else {
    Some(choice.to_string())
  }
}

/// Rows of `data` matching every active constraint of `selection`.
///
/// A constraint on a column the data does not have matches nothing.
pub fn filter(data: &Table, selection: &FilterSelection) -> Table {
  let mut resolved = Vec::new();
  for (column, expected) in selection.constraints() {
    match data.column_index(column) {
      Some(index) => resolved.push((index, expected)),
      None => return data.empty_like(),
    }
  }

  if resolved.is_empty() {
    return data.clone();
  }

  data.retain_rows(|row| {
    resolved.iter().all(|(index, expected)| row[*index].label().as_deref() == Some(*expected))
  })
}

/// Values offered by each filter, wildcard first. A filter whose column is
/// missing from the data is `None` and should not be offered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FilterOptions {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub property_types: Option<Vec<String>>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub cities: Option<Vec<String>>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub agent_companies: Option<Vec<String>>,
}

pub fn filter_options(data: &Table) -> FilterOptions {
  FilterOptions {
    property_types: options_for(data, PROPERTY_TYPE_COLUMN),
    cities: options_for(data, CITY_COLUMN),
    agent_companies: options_for(data, AGENT_COMPANY_COLUMN),
  }
}

/// Wildcard followed by distinct non-null labels in first-appearance order
fn options_for(data: &Table, column: &str) -> Option<Vec<String>> {
  let values = data.column_values(column)?;
  let mut seen = HashSet::new();
  let mut options = vec![WILDCARD.to_string()];
  for label in values.filter_map(|value| value.label()) {
    if seen.insert(label.clone()) {
      options.push(label);
    }
  }
  Some(options)
}
