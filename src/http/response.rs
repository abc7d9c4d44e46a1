//! JSON response helpers.
//!
//! # Design Decisions
//! - Every response body is JSON, errors included
//! - Capture failures list each artifact with its outcome so a client can
//!   tell a partial write from a total one

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::capture::CaptureError;

/// JSON error body with a single message.
pub fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Map a capture error to a 500 response describing every artifact.
pub fn capture_error(err: &CaptureError) -> Response {
    let CaptureError::CaptureFailed {
        timestamp_id,
        failures,
        written,
    } = err;
    let failed: Vec<Value> = failures
        .iter()
        .map(|f| {
            json!({
                "artifact": f.kind,
                "path": f.path,
                "cause": f.error.to_string(),
            })
        })
        .collect();
    let body = json!({
        "error": err.to_string(),
        "timestamp_id": timestamp_id,
        "failed": failed,
        "written": written,
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{ArtifactFailure, ArtifactKind};
    use std::io;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_partial_capture_failure_body() {
        let err = CaptureError::CaptureFailed {
            timestamp_id: "20240101_000000_000000_0000".into(),
            failures: vec![ArtifactFailure {
                kind: ArtifactKind::Structured,
                path: PathBuf::from("captures/request_x.json"),
                error: io::Error::new(io::ErrorKind::AlreadyExists, "exists"),
            }],
            written: vec![PathBuf::from("captures/request_x.raw")],
        };

        let response = capture_error(&err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["failed"][0]["artifact"], "structured");
        assert_eq!(body["written"][0], "captures/request_x.raw");
    }
}
