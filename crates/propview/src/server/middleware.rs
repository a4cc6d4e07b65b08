//! Request context middleware
//!
//! Every request gets a [`RequestContext`] in its extensions. Handlers use its
//! id as the response transaction id, and the middleware logs start and
//! completion with the same id.

use axum::{
  extract::Request,
  http::{HeaderValue, Method, Uri},
  middleware::Next,
  response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request metadata injected by [`request_context_middleware`]
#[derive(Debug, Clone)]
pub struct RequestContext {
  pub request_id: Uuid,
  pub method: Method,
  pub uri: Uri,
}

impl RequestContext {
  pub fn new(method: Method, uri: Uri) -> Self {
    Self { request_id: Uuid::new_v4(), method, uri }
  }
}

/// Middleware to inject RequestContext into all requests
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
  let context = RequestContext::new(request.method().clone(), request.uri().clone());
  let span = tracing::info_span!(
    "http_request",
    request_id = %context.request_id,
    method = %context.method,
    path = %context.uri.path(),
  );

  async move {
    let started = Instant::now();
    tracing::debug!("request started");

    request.extensions_mut().insert(context.clone());
    let mut response = next.run(request).await;

    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
    let status = response.status().as_u16();
    if response.status().is_server_error() {
      tracing::error!(status, duration_ms, "request failed");
    } else {
      tracing::info!(status, duration_ms, "request completed");
    }

    if let Ok(value) = HeaderValue::from_str(&context.request_id.to_string()) {
      response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
  }
  .instrument(span)
  .await
}
