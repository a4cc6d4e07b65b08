//! REST API types with schemars annotations for schema generation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConnectionInfo;
use crate::dashboard::ViewMode;
use crate::filter::{FilterOptions, FilterSelection};
use crate::notice::Notices;

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation; matches the request id
  pub transaction_id: Uuid,

  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  /// The latest version of the API
  pub latest: String,

  /// The version of the API requested by the client
  pub requested: String,

  /// The version of the API that was used in producing the response
  pub resolved: String,
}

impl VersionInfo {
  fn current() -> Self {
    let version = env!("CARGO_PKG_VERSION");
    Self { latest: version.to_string(), requested: version.to_string(), resolved: version.to_string() }
  }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,

  /// Additional error context
  #[serde(default)]
  pub context: serde_json::Value,
}

impl<T> BaseResponse<T> {
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: VersionInfo::current(), transaction_id, errors: Vec::new(), data }
  }

  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: VersionInfo::current(), transaction_id, errors, data: () }
  }
}

impl ApiError {
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string(), context: serde_json::Value::Null }
  }

  pub fn with_context(mut self, context: serde_json::Value) -> Self {
    self.context = context;
    self
  }
}

// Status/Version Endpoints
// =======================

/// Response for /status
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
  pub status: String,
  pub version: String,
  /// Where the dashboard reads from; never includes the password
  pub connection: ConnectionInfo,
  pub row_limit: u32,
  pub cache_ttl_secs: u64,
  pub cache_entries: usize,
}

/// Response for /version
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionResponse {
  pub version: String,
}

/// Response for /api
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiInfoResponse {
  pub latest: String,
  pub versions: ApiVersions,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiVersions {
  pub latest: String,
  /// Currently active versions
  pub active: Vec<String>,
}

// Dashboard Endpoints
// ===================

/// Query string of /dashboard; `All`, `*` and blank are wildcards
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct DashboardQuery {
  pub property_type: Option<String>,
  pub city: Option<String>,
  pub agent_company: Option<String>,
}

impl DashboardQuery {
  pub fn selection(&self) -> FilterSelection {
    FilterSelection::from_choices(self.property_type.as_deref(), self.city.as_deref(), self.agent_company.as_deref())
  }
}

/// Response for /dashboard/options
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct OptionsResponse {
  pub mode: ViewMode,
  pub notices: Notices,

  /// Absent unless both tables were joined
  #[serde(skip_serializing_if = "Option::is_none")]
  pub filter_options: Option<FilterOptions>,
}

// Cache Endpoint
// ==============

/// Body of /cache/invalidate; an empty body clears every table
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct InvalidateRequest {
  pub table: Option<String>,
}

/// Response for /cache/invalidate
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct InvalidateResponse {
  /// Table that was invalidated; absent when the whole cache was cleared
  #[serde(skip_serializing_if = "Option::is_none")]
  pub table: Option<String>,
  pub removed: usize,
}
