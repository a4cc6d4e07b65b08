//! Fetch cache management handlers

use axum::{
  body::Bytes,
  extract::{Extension, State},
  http::StatusCode,
  response::Json,
};
use serde_json::json;

use crate::server::middleware::RequestContext;
use crate::server::types::{ApiError, BaseResponse, InvalidateRequest, InvalidateResponse};
use crate::server::AppState;

type ErrorResponse = (StatusCode, Json<BaseResponse<()>>);

/// POST /cache/invalidate - Drop cached fetches for one table, or all of them
pub async fn invalidate(
  State(state): State<AppState>,
  Extension(ctx): Extension<RequestContext>,
  body: Bytes,
) -> Result<Json<BaseResponse<InvalidateResponse>>, ErrorResponse> {
  let request = if body.iter().all(u8::is_ascii_whitespace) {
    InvalidateRequest::default()
  } else {
    serde_json::from_slice::<InvalidateRequest>(&body).map_err(|e| {
      tracing::warn!(error = %e, "rejected invalidate request body");
      bad_request(&ctx, ApiError::new("invalid_request", &format!("Invalid request body: {e}")))
    })?
  };

  if let Some(table) = &request.table {
    let tables = state.dashboard.tables();
    if table != &tables.agent && table != &tables.property {
      let error = ApiError::new("unknown_table", &format!("'{table}' is not a dashboard table"))
        .with_context(json!({ "tables": [tables.agent, tables.property] }));
      return Err(bad_request(&ctx, error));
    }
  }

  let removed = state.dashboard.invalidate(request.table.as_deref());
  let response = InvalidateResponse { table: request.table, removed };
  Ok(Json(BaseResponse::success(response, ctx.request_id)))
}

fn bad_request(ctx: &RequestContext, error: ApiError) -> ErrorResponse {
  (StatusCode::BAD_REQUEST, Json(BaseResponse::<()>::error(vec![error], ctx.request_id)))
}
