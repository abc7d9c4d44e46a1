//! Route handlers.
//!
//! Every handler receives the request already normalized by
//! [`crate::http::middleware::normalize_request`].

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::capture::{view, InspectionView, RequestModel};
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Service banner with the endpoint table.
pub async fn home() -> Json<Value> {
    Json(json!({
        "message": "Request inspector is running",
        "timestamp": view::now_timestamp(),
        "endpoints": {
            "GET /": "This page",
            "GET /api/status": "Server status",
            "POST /api/data": "Send JSON data",
            "GET /api/echo": "Echo query parameters",
            "ANY /api/inspect": "Full structured view of the request",
            "ANY /api/capture": "Persist raw and structured renderings",
            "Any method /*": "Accepts any other request",
        }
    }))
}

pub async fn status() -> Json<Value> {
    Json(json!({
        "status": "online",
        "timestamp": view::now_timestamp(),
    }))
}

/// Acknowledge a data submission, echoing the decoded JSON body.
pub async fn receive_data(
    Extension(model): Extension<Arc<RequestModel>>,
) -> (StatusCode, Json<Value>) {
    let received = model.body().json.clone().unwrap_or(Value::Null);
    (
        StatusCode::CREATED,
        Json(json!({
            "message": "Data received successfully",
            "received": received,
            "timestamp": view::now_timestamp(),
        })),
    )
}

pub async fn echo(Extension(model): Extension<Arc<RequestModel>>) -> Json<Value> {
    Json(json!({
        "query_params": model.query_params(),
        "timestamp": view::now_timestamp(),
    }))
}

pub async fn inspect(Extension(model): Extension<Arc<RequestModel>>) -> Json<InspectionView> {
    Json(view::build(&model))
}

/// Persist the request; 201 with artifact locations on success.
pub async fn capture(
    State(state): State<AppState>,
    Extension(model): Extension<Arc<RequestModel>>,
) -> Response {
    let Some(sink) = state.sink.clone() else {
        return response::error(StatusCode::SERVICE_UNAVAILABLE, "capture is disabled");
    };

    match tokio::task::spawn_blocking(move || sink.capture(&model)).await {
        Ok(Ok(artifact)) => {
            metrics::record_capture("success");
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Request captured",
                    "artifact": artifact,
                    "timestamp": view::now_timestamp(),
                })),
            )
                .into_response()
        }
        Ok(Err(e)) => {
            metrics::record_capture("failed");
            tracing::error!(error = %e, "Capture failed");
            response::capture_error(&e)
        }
        Err(e) => {
            metrics::record_capture("failed");
            tracing::error!(error = %e, "Capture task panicked");
            response::error(StatusCode::INTERNAL_SERVER_ERROR, "capture task failed")
        }
    }
}

/// Fallback for any other path.
pub async fn catch_all(
    Path(path): Path<String>,
    Extension(model): Extension<Arc<RequestModel>>,
) -> Json<Value> {
    Json(json!({
        "message": format!("You reached: /{}", path),
        "method": model.method(),
        "timestamp": view::now_timestamp(),
    }))
}
