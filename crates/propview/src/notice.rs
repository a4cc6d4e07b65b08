//! User-facing notices
//!
//! Fetch failures, empty tables and join problems never abort a dashboard load.
//! They become notices shown above the dashboard, and each one is mirrored to
//! `tracing` at the matching level.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
  Info,
  Success,
  Warn,
  Error,
}

impl fmt::Display for NoticeLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      NoticeLevel::Info => "info",
      NoticeLevel::Success => "success",
      NoticeLevel::Warn => "warn",
      NoticeLevel::Error => "error",
    };
    f.write_str(label)
  }
}

/// A message for the dashboard user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Notice {
  pub timestamp: DateTime<Utc>,
  pub level: NoticeLevel,
  pub message: String,
  /// Part of the pipeline that raised it: `fetch`, `merge` or `dashboard`
  pub component: String,

  /// Suggested remediation
  #[serde(skip_serializing_if = "Option::is_none")]
  pub hint: Option<String>,
}

/// Ordered collection of notices for one load
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Notices(Vec<Notice>);

impl Notices {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, level: NoticeLevel, component: &str, message: impl Into<String>) {
    self.push_with_hint(level, component, message, None::<String>);
  }

  pub fn push_with_hint(
    &mut self,
    level: NoticeLevel,
    component: &str,
    message: impl Into<String>,
    hint: Option<impl Into<String>>,
  ) {
    let notice = Notice {
      timestamp: Utc::now(),
      level,
      message: message.into(),
      component: component.to_string(),
      hint: hint.map(Into::into),
    };

    match notice.level {
      NoticeLevel::Error => tracing::error!(component, hint = ?notice.hint, "{}", notice.message),
      NoticeLevel::Warn => tracing::warn!(component, "{}", notice.message),
      NoticeLevel::Info | NoticeLevel::Success => tracing::info!(component, "{}", notice.message),
    }
    self.0.push(notice);
  }

  pub fn iter(&self) -> impl Iterator<Item = &Notice> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn has_level(&self, level: NoticeLevel) -> bool {
    self.0.iter().any(|notice| notice.level == level)
  }

  /// Most severe level present, if any
  pub fn worst(&self) -> Option<NoticeLevel> {
    self.0.iter().map(|notice| notice.level).max()
  }
}

impl<'a> IntoIterator for &'a Notices {
  type Item = &'a Notice;
  type IntoIter = std::slice::Iter<'a, Notice>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}
