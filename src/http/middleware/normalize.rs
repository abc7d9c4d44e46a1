//! Request normalization middleware.
//!
//! Buffers the body, builds the [`RequestModel`] once, notifies the observer
//! and hands the model to handlers through request extensions. The body is
//! re-attached so extractors further down still see it.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::Instrument;
use uuid::Uuid;

use crate::capture::view;
use crate::http::request::model_from_parts;
use crate::http::server::AppState;
use crate::observability::metrics;

pub const X_REQUEST_ID: &str = "x-request-id";

pub async fn normalize_request(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4();
    let (parts, body) = request.into_parts();

    let method = parts.method.to_string();
    let route = parts
        .extensions
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %parts.uri.path(),
    );

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            span.in_scope(|| tracing::warn!(error = %e, "Failed to buffer request body"));
            metrics::record_request(&method, &route, 413, start);
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({
                    "error": "request body too large or unreadable",
                    "limit_bytes": state.max_body_bytes,
                })),
            )
                .into_response();
        }
    };

    let remote = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let model = Arc::new(model_from_parts(&parts, &bytes, remote));
    metrics::record_body(model.body().kind(), bytes.len());

    if let Some(observer) = &state.observer {
        let view = view::build(&model);
        span.in_scope(|| observer.observe(&model, &view));
    }

    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(model);

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}
