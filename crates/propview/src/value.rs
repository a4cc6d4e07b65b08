//! Dynamic scalar values carried by fetched tables
//!
//! Database rows arrive without a fixed schema, so every cell is one of a small
//! set of scalar kinds. Values serialize to bare JSON scalars.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell of a fetched table
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
}

/// Hashable identity of a value used when joining tables
///
/// Integers and integral floats share a key so that `10` and `10.0` match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinKey {
  Bool(bool),
  Int(i64),
  Float(u64),
  Text(String),
}

impl Value {
  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  /// Numeric view of the value; text is never parsed
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Int(i) => Some(*i as f64),
      Value::Float(f) if !f.is_nan() => Some(*f),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Text(s) => Some(s),
      _ => None,
    }
  }

  /// Text rendering used for labels and exact-match filtering. `None` for nulls.
  pub fn label(&self) -> Option<String> {
    match self {
      Value::Null => None,
      other => Some(other.to_string()),
    }
  }

  /// Key used to match rows across tables. Nulls and NaN never match anything.
  pub fn join_key(&self) -> Option<JoinKey> {
    match self {
      Value::Null => None,
      Value::Bool(b) => Some(JoinKey::Bool(*b)),
      Value::Int(i) => Some(JoinKey::Int(*i)),
      Value::Float(f) if f.is_nan() => None,
      Value::Float(f) => {
        if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
          Some(JoinKey::Int(*f as i64))
        } else {
          Some(JoinKey::Float(f.to_bits()))
        }
      }
      Value::Text(s) => Some(JoinKey::Text(s.clone())),
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => Ok(()),
      Value::Bool(b) => write!(f, "{b}"),
      Value::Int(i) => write!(f, "{i}"),
      Value::Float(x) => write!(f, "{x}"),
      Value::Text(s) => f.write_str(s),
    }
  }
}

impl From<bool> for Value {
  fn from(value: bool) -> Self {
    Value::Bool(value)
  }
}

impl From<i32> for Value {
  fn from(value: i32) -> Self {
    Value::Int(value.into())
  }
}

impl From<i64> for Value {
  fn from(value: i64) -> Self {
    Value::Int(value)
  }
}

impl From<f64> for Value {
  fn from(value: f64) -> Self {
    Value::Float(value)
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Value::Text(value.to_string())
  }
}

impl From<String> for Value {
  fn from(value: String) -> Self {
    Value::Text(value)
  }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(value: Option<T>) -> Self {
    value.map_or(Value::Null, Into::into)
  }
}
