//! Tabular result sets
//!
//! A [`Table`] keeps its column names in query order and stores each row as a
//! vector aligned with those columns. Nothing about the schema is assumed:
//! callers check [`Table::has_column`] before relying on a column.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

use crate::value::Value;

/// Ordered columns plus rows of dynamic values
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "TableRepr")]
pub struct Table {
  columns: Vec<String>,
  rows: Vec<Vec<Value>>,
}

impl Table {
  /// Create an empty table with the given columns
  pub fn new<I, S>(columns: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self { columns: columns.into_iter().map(Into::into).collect(), rows: Vec::new() }
  }

  /// Build a table from columns and rows in one go
  pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut table = Self::new(columns);
    for row in rows {
      table.push_row(row);
    }
    table
  }

  /// Append a row. Rows are padded with nulls or truncated to the column count.
  pub fn push_row(&mut self, mut row: Vec<Value>) {
    row.resize(self.columns.len(), Value::Null);
    self.rows.push(row);
  }

  pub fn columns(&self) -> &[String] {
    &self.columns
  }

  pub fn rows(&self) -> &[Vec<Value>] {
    &self.rows
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn has_column(&self, name: &str) -> bool {
    self.column_index(name).is_some()
  }

  /// Position of a column, matched case-sensitively
  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|column| column == name)
  }

  /// Value at a row for a named column
  pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
    let index = self.column_index(column)?;
    self.rows.get(row).and_then(|values| values.get(index))
  }

  /// All values of a column in row order, or `None` when the column is absent
  pub fn column_values<'a>(&'a self, column: &str) -> Option<impl Iterator<Item = &'a Value> + 'a> {
    let index = self.column_index(column)?;
    Some(self.rows.iter().map(move |row| &row[index]))
  }

  /// First `n` rows
  pub fn head(&self, n: usize) -> Table {
    Table { columns: self.columns.clone(), rows: self.rows.iter().take(n).cloned().collect() }
  }

  /// New table holding the rows accepted by `keep`, in their original order
  pub fn retain_rows<F>(&self, mut keep: F) -> Table
  where
    F: FnMut(&[Value]) -> bool,
  {
    Table {
      columns: self.columns.clone(),
      rows: self.rows.iter().filter(|row| keep(row.as_slice())).cloned().collect(),
    }
  }

  /// Same columns, no rows
  pub fn empty_like(&self) -> Table {
    Table::new(self.columns.clone())
  }
}

/// One row rendered as a column-name to value mapping
struct RowView<'a> {
  columns: &'a [String],
  values: &'a [Value],
}

impl Serialize for RowView<'_> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.columns.len()))?;
    for (column, value) in self.columns.iter().zip(self.values) {
      map.serialize_entry(column, value)?;
    }
    map.end()
  }
}

struct RowsView<'a>(&'a Table);

impl Serialize for RowsView<'_> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(
      self.0.rows.iter().map(|values| RowView { columns: &self.0.columns, values }),
    )
  }
}

impl Serialize for Table {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("Table", 2)?;
    state.serialize_field("columns", &self.columns)?;
    state.serialize_field("rows", &RowsView(self))?;
    state.end()
  }
}

/// Wire shape of a table: column order plus rows as open mappings
#[derive(Deserialize)]
struct TableRepr {
  /// Column names in query order
  columns: Vec<String>,

  /// Rows keyed by column name
  #[serde(default)]
  rows: Vec<HashMap<String, Value>>,
}

impl From<TableRepr> for Table {
  fn from(repr: TableRepr) -> Self {
    let mut table = Table::new(repr.columns);
    for mut row in repr.rows {
      let values = table.columns.iter().map(|column| row.remove(column).unwrap_or_default()).collect();
      table.rows.push(values);
    }
    table
  }
}

impl JsonSchema for Table {
  fn schema_name() -> String {
    "Table".to_string()
  }

  fn json_schema(gen: &mut SchemaGenerator) -> Schema {
    // Rows are documented as ordered maps even though the repr uses a HashMap
    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct Table {
      columns: Vec<String>,
      rows: Vec<BTreeMap<String, Value>>,
    }
    <Table as JsonSchema>::json_schema(gen)
  }
}
