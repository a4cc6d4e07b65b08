//! Dashboard data handlers

use axum::{
  extract::{Extension, Query, State},
  response::Json,
};
use schemars::schema::RootSchema;

use crate::dashboard::{DashboardView, RawTables};
use crate::server::middleware::RequestContext;
use crate::server::types::{BaseResponse, DashboardQuery, OptionsResponse};
use crate::server::AppState;

/// GET /dashboard - Full dashboard view under the requested filters
pub async fn dashboard(
  State(state): State<AppState>,
  Extension(ctx): Extension<RequestContext>,
  Query(query): Query<DashboardQuery>,
) -> Json<BaseResponse<DashboardView>> {
  let view = state.dashboard.view(&query.selection()).await;
  Json(BaseResponse::success(view, ctx.request_id))
}

/// GET /dashboard/options - Filter option lists only
pub async fn options(
  State(state): State<AppState>,
  Extension(ctx): Extension<RequestContext>,
) -> Json<BaseResponse<OptionsResponse>> {
  let snapshot = state.dashboard.load().await;
  let response = OptionsResponse {
    mode: snapshot.mode,
    filter_options: snapshot.filter_options(),
    notices: snapshot.notices,
  };
  Json(BaseResponse::success(response, ctx.request_id))
}

/// GET /tables/raw - Agent, property and merged tables
pub async fn raw_tables(
  State(state): State<AppState>,
  Extension(ctx): Extension<RequestContext>,
) -> Json<BaseResponse<RawTables>> {
  let snapshot = state.dashboard.load().await;
  Json(BaseResponse::success(snapshot.raw_tables(), ctx.request_id))
}

/// GET /schema - JSON schema of the /dashboard response
pub async fn schema() -> Json<RootSchema> {
  Json(schemars::schema_for!(BaseResponse<DashboardView>))
}
