//! Per-request observation hook.
//!
//! The HTTP layer calls the configured observer exactly once per request,
//! after the request has been normalized and before it is dispatched.

use crate::capture::{InspectionView, RequestModel};

/// Receives every normalized request.
pub trait RequestObserver: Send + Sync {
    fn observe(&self, model: &RequestModel, view: &InspectionView);
}

/// Emits a structured summary of each request through `tracing`.
///
/// The summary goes out at `info`; headers, query parameters and the body
/// follow at `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn observe(&self, model: &RequestModel, view: &InspectionView) {
        tracing::info!(
            timestamp = %view.timestamp,
            method = %model.method(),
            url = %view.url.full,
            client = model.client_address().unwrap_or("-"),
            "Request received"
        );

        for header in model.headers().iter() {
            tracing::debug!(name = %header.name, value = %header.value, "Header");
        }
        for (key, value) in model.query_params().iter() {
            tracing::debug!(key, value, "Query parameter");
        }

        let body = &view.body;
        if let Some(json) = &body.json {
            let pretty = serde_json::to_string_pretty(json).unwrap_or_default();
            tracing::debug!(body = %pretty, "JSON body");
        } else if let Some(raw) = &body.raw {
            tracing::debug!(body = %raw, lossy = body.raw_lossy, "Body");
        }
        if let Some(form) = &body.form {
            tracing::debug!(fields = form.len(), "Form body");
        }
        if let Some(files) = model.uploaded_files() {
            for (field, filename) in files.iter() {
                tracing::debug!(field, filename, "Uploaded file");
            }
        }
    }
}
