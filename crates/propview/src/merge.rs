//! Join-and-enrich of property rows with their agents
//!
//! Properties are left-joined with agents on `agentId = id`. Every property
//! row survives exactly once; agents contribute `agent_companyName`,
//! `agent_email` and `agent_phoneNumber`, with sentinel text wherever no agent
//! (or no value) is available.

use std::collections::HashMap;
use thiserror::Error;

use crate::table::Table;
use crate::value::{JoinKey, Value};

/// Foreign key on property rows
pub const AGENT_FOREIGN_KEY: &str = "agentId";
/// Identifier on agent rows
pub const AGENT_ID: &str = "id";

pub const AGENT_COMPANY_COLUMN: &str = "agent_companyName";
pub const AGENT_EMAIL_COLUMN: &str = "agent_email";
pub const AGENT_PHONE_COLUMN: &str = "agent_phoneNumber";

pub const NO_AGENT_ASSIGNED: &str = "No Agent Assigned";
pub const NOT_AVAILABLE: &str = "N/A";

/// (agent column, enriched column, fill value)
const AGENT_ATTRIBUTES: [(&str, &str, &str); 3] = [
  ("companyName", AGENT_COMPANY_COLUMN, NO_AGENT_ASSIGNED),
  ("email", AGENT_EMAIL_COLUMN, NOT_AVAILABLE),
  ("phoneNumber", AGENT_PHONE_COLUMN, NOT_AVAILABLE),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
  #[error("Cannot join {table} data: missing column(s) {}", .missing.join(", "))]
  SchemaMismatch { table: String, missing: Vec<String> },
}

/// What the merge step produced
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
  /// Both inputs had rows and were joined
  Merged(Table),
  /// Agents were empty; properties pass through unenriched
  PropertiesOnly(Table),
  /// Properties were empty; agents pass through for display
  AgentsOnly(Table),
  /// Neither input had rows
  Empty,
}

impl MergeOutcome {
  pub fn merged(&self) -> Option<&Table> {
    match self {
      MergeOutcome::Merged(table) => Some(table),
      _ => None,
    }
  }
}

/// Left-join `properties` with `agents`.
///
/// When an agent id appears more than once, the first agent row in input order
/// is used. Property columns already named like an enrichment column are
/// replaced by it.
pub fn merge(properties: &Table, agents: &Table) -> Result<MergeOutcome, MergeError> {
  match (properties.is_empty(), agents.is_empty()) {
    (true, true) => return Ok(MergeOutcome::Empty),
    (true, false) => return Ok(MergeOutcome::AgentsOnly(agents.clone())),
    (false, true) => return Ok(MergeOutcome::PropertiesOnly(properties.clone())),
    (false, false) => {}
  }

  let foreign_key = properties.column_index(AGENT_FOREIGN_KEY).ok_or_else(|| MergeError::SchemaMismatch {
    table: "property".to_string(),
    missing: vec![AGENT_FOREIGN_KEY.to_string()],
  })?;

  let agent_id = agents.column_index(AGENT_ID);
  let attribute_indexes: Vec<Option<usize>> =
    AGENT_ATTRIBUTES.iter().map(|(source, _, _)| agents.column_index(source)).collect();
  let missing: Vec<String> = std::iter::once((AGENT_ID, agent_id))
    .chain(AGENT_ATTRIBUTES.iter().map(|(source, _, _)| *source).zip(attribute_indexes.iter().copied()))
    .filter(|(_, index)| index.is_none())
    .map(|(name, _)| name.to_string())
    .collect();
  let (Some(agent_id), [Some(company), Some(email), Some(phone)]) = (agent_id, attribute_indexes.as_slice())
  else {
    return Err(MergeError::SchemaMismatch { table: "agent".to_string(), missing });
  };
  let attributes = [*company, *email, *phone];

  // First agent per id wins
  let mut agents_by_id: HashMap<JoinKey, &[Value]> = HashMap::new();
  for row in agents.rows() {
    if let Some(key) = row[agent_id].join_key() {
      agents_by_id.entry(key).or_insert(row.as_slice());
    }
  }

  let kept: Vec<usize> = properties
    .columns()
    .iter()
    .enumerate()
    .filter(|(_, name)| !AGENT_ATTRIBUTES.iter().any(|(_, enriched, _)| enriched == name))
    .map(|(index, _)| index)
    .collect();

  let columns = kept
    .iter()
    .map(|&index| properties.columns()[index].clone())
    .chain(AGENT_ATTRIBUTES.iter().map(|(_, enriched, _)| enriched.to_string()));
  let mut merged = Table::new(columns);

  let mut matched = 0usize;
  for row in properties.rows() {
    let agent = row[foreign_key].join_key().and_then(|key| agents_by_id.get(&key).copied());
    if agent.is_some() {
      matched += 1;
    }

    let mut values: Vec<Value> = kept.iter().map(|&index| row[index].clone()).collect();
    for (&column, (_, _, fill)) in attributes.iter().zip(AGENT_ATTRIBUTES.iter()) {
      let value = agent.map(|agent| &agent[column]).filter(|value| !value.is_null()).cloned();
      values.push(value.unwrap_or_else(|| Value::from(*fill)));
    }
    merged.push_row(values);
  }

  tracing::debug!(
    properties = properties.len(),
    agents = agents.len(),
    matched,
    "merged property and agent data"
  );
  Ok(MergeOutcome::Merged(merged))
}
