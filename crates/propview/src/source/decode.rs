//! Conversion of Postgres rows into dynamic tables

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::table::Table;
use crate::value::Value;

/// Turn fetched rows into a [`Table`]. Column names come from the first row;
/// an empty result yields a table with no columns.
pub fn rows_to_table(rows: &[PgRow]) -> Result<Table, sqlx::Error> {
  let Some(first) = rows.first() else {
    return Ok(Table::default());
  };

  let mut table = Table::new(first.columns().iter().map(|column| column.name().to_string()));
  for row in rows {
    let values = (0..row.len()).map(|index| decode_value(row, index)).collect::<Result<Vec<_>, _>>()?;
    table.push_row(values);
  }
  Ok(table)
}

fn decode_value(row: &PgRow, index: usize) -> Result<Value, sqlx::Error> {
  let raw = row.try_get_raw(index)?;
  if raw.is_null() {
    return Ok(Value::Null);
  }
  let type_name = raw.type_info().name().to_string();

  let value = match type_name.as_str() {
    "BOOL" => Value::Bool(row.try_get(index)?),
    "INT2" => Value::Int(row.try_get::<i16, _>(index)?.into()),
    "INT4" => Value::Int(row.try_get::<i32, _>(index)?.into()),
    "INT8" => Value::Int(row.try_get::<i64, _>(index)?),
    "FLOAT4" => Value::Float(widen_f32(row.try_get(index)?)),
    "FLOAT8" => Value::Float(row.try_get::<f64, _>(index)?),
    "NUMERIC" => numeric_or_null(row.try_get(index), index),
    "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => Value::Text(row.try_get(index)?),
    "UUID" => Value::Text(row.try_get::<Uuid, _>(index)?.to_string()),
    "DATE" => Value::Text(row.try_get::<NaiveDate, _>(index)?.to_string()),
    "TIME" => Value::Text(row.try_get::<NaiveTime, _>(index)?.to_string()),
    "TIMESTAMP" => Value::Text(row.try_get::<NaiveDateTime, _>(index)?.to_string()),
    "TIMESTAMPTZ" => Value::Text(row.try_get::<DateTime<Utc>, _>(index)?.to_rfc3339()),
    "JSON" | "JSONB" => Value::Text(row.try_get::<serde_json::Value, _>(index)?.to_string()),
    // Enums and other text-encoded types
    other => match row.try_get_unchecked::<String, _>(index) {
      Ok(text) => Value::Text(text),
      Err(e) => {
        tracing::debug!(column = index, pg_type = other, error = %e, "unsupported column type, reading as null");
        Value::Null
      }
    },
  };
  Ok(value)
}

/// `NaN`, infinities and values past 28 significant digits have no `Decimal`
/// form; those cells read as null instead of failing the whole fetch.
fn numeric_or_null(decoded: Result<Decimal, sqlx::Error>, index: usize) -> Value {
  match decoded {
    Ok(decimal) => decimal.to_f64().map_or_else(|| Value::Text(decimal.to_string()), Value::Float),
    Err(e) => {
      tracing::debug!(column = index, error = %e, "numeric value not representable, reading as null");
      Value::Null
    }
  }
}

/// Widen through the shortest decimal form so `0.1f32` stays `0.1`
fn widen_f32(value: f32) -> f64 {
  value.to_string().parse().unwrap_or_else(|_| f64::from(value))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;

  #[test]
  fn test_unrepresentable_numeric_reads_as_null() {
    let decoded = Err(sqlx::Error::Decode("numeric NaN is not a Decimal".into()));
    assert_eq!(numeric_or_null(decoded, 3), Value::Null);
  }

  #[test]
  fn test_numeric_reads_as_float() {
    let decoded = Ok(Decimal::from_str("250000.50").unwrap());
    assert_eq!(numeric_or_null(decoded, 0), Value::Float(250000.5));
  }

  #[test]
  fn test_float4_keeps_short_form() {
    assert_eq!(widen_f32(0.1), 0.1);
    assert_eq!(Value::Float(widen_f32(0.1)).to_string(), "0.1");
    assert_eq!(widen_f32(1.5), 1.5);
  }
}
