//! Status and version endpoint handlers

use axum::{
  extract::{Extension, State},
  response::Json,
};

use crate::server::middleware::RequestContext;
use crate::server::types::{ApiInfoResponse, ApiVersions, BaseResponse, StatusResponse, VersionResponse};
use crate::server::AppState;

/// GET /status - Health check with connection details
pub async fn status(
  State(state): State<AppState>,
  Extension(ctx): Extension<RequestContext>,
) -> Json<BaseResponse<StatusResponse>> {
  let cache = state.dashboard.cache();
  let response = StatusResponse {
    status: "healthy".to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
    connection: state.connection.as_ref().clone(),
    row_limit: state.dashboard.row_limit(),
    cache_ttl_secs: cache.ttl().as_secs(),
    cache_entries: cache.len(),
  };

  Json(BaseResponse::success(response, ctx.request_id))
}

/// GET /version - Returns current API version
pub async fn version(Extension(ctx): Extension<RequestContext>) -> Json<BaseResponse<VersionResponse>> {
  let response = VersionResponse { version: env!("CARGO_PKG_VERSION").to_string() };
  Json(BaseResponse::success(response, ctx.request_id))
}

/// GET /api - Returns API information and supported versions
pub async fn api_info(Extension(ctx): Extension<RequestContext>) -> Json<BaseResponse<ApiInfoResponse>> {
  let version = env!("CARGO_PKG_VERSION");
  let response = ApiInfoResponse {
    latest: version.to_string(),
    versions: ApiVersions { latest: version.to_string(), active: vec![version.to_string()] },
  };

  Json(BaseResponse::success(response, ctx.request_id))
}
