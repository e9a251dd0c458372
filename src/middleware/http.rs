//! HTTP-level middleware shared by every route.
//!
//! - `x-request-id`: generated when the client sent none, echoed on the response,
//!   and recorded on the request span so API and ingest logs can be correlated
//! - access log span per request (method, path, request id)
//! - body size limit and global timeout from `Config`
//!   (`HTTP_BODY_LIMIT_BYTES`, `HTTP_TIMEOUT_SECONDS`)
//!
//! Layer errors are rendered with the same JSON error body as handlers.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::error_handling::HandleErrorLayer;
use axum::http::{Request, header::HeaderName};
use tower::timeout::{TimeoutLayer, error::Elapsed};
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::config::Config;
use crate::error::AppError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn request_id_header() -> HeaderName {
    HeaderName::from_static(REQUEST_ID_HEADER)
}

async fn handle_layer_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        tracing::warn!("request timed out");
        AppError::Timeout
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        AppError::Internal
    }
}

fn request_span(req: &Request<Body>) -> Span {
    // SetRequestIdLayer が先に走るので、ここでは必ず入っている
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "http",
        method = %req.method(),
        path = %req.uri().path(),
        request_id,
    )
}

pub fn apply(router: Router, config: &Config) -> Router {
    let layers = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_layer_error))
        .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id_header()))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(RequestBodyLimitLayer::new(config.http_body_limit_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.http_timeout_seconds,
        )));

    router.layer(layers)
}
