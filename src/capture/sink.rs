//! Capture persistence.
//!
//! Each capture writes two sibling artifacts sharing one base name:
//! `request_<YYYYmmdd_HHMMSS_ffffff>_<seq>.raw` and `.json`. The sequence
//! number is per sink and strictly increasing, so two captures in the same
//! microsecond still get distinct names. If the store reports an existing
//! artifact anyway, the capture fails; nothing is overwritten.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;
use serde::Serialize;
use thiserror::Error;

use crate::capture::model::RequestModel;
use crate::capture::raw;
use crate::capture::store::ArtifactStore;
use crate::capture::view;

/// Which rendering an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Raw,
    Structured,
}

impl ArtifactKind {
    fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Raw => "raw",
            ArtifactKind::Structured => "json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Raw => f.write_str("raw"),
            ArtifactKind::Structured => f.write_str("structured"),
        }
    }
}

/// Record of one successful capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedArtifact {
    pub raw_path: PathBuf,
    pub structured_path: PathBuf,
    pub timestamp_id: String,
}

/// One artifact that could not be written.
#[derive(Debug)]
pub struct ArtifactFailure {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub error: io::Error,
}

/// Errors surfaced by [`CaptureSink::capture`].
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture {timestamp_id} failed: {}", describe(failures))]
    CaptureFailed {
        timestamp_id: String,
        failures: Vec<ArtifactFailure>,
        /// Artifacts that were written before or despite the failure.
        written: Vec<PathBuf>,
    },
}

fn describe(failures: &[ArtifactFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} artifact {}: {}", f.kind, f.path.display(), f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Persists raw and structured renderings of requests.
pub struct CaptureSink<S> {
    store: S,
    directory: PathBuf,
    sequence: AtomicU64,
}

impl<S: ArtifactStore> CaptureSink<S> {
    pub fn new(store: S, directory: impl Into<PathBuf>) -> Self {
        Self {
            store,
            directory: directory.into(),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Capture `model` under a freshly generated identifier.
    pub fn capture(&self, model: &RequestModel) -> Result<CapturedArtifact, CaptureError> {
        let id = self.next_id();
        self.capture_with_id(model, &id)
    }

    /// Capture `model` under `timestamp_id`.
    ///
    /// Both artifacts are attempted even if the first write fails, so the
    /// error reports the outcome of each. If the directory cannot be
    /// prepared, both artifacts are reported as failed.
    pub fn capture_with_id(
        &self,
        model: &RequestModel,
        timestamp_id: &str,
    ) -> Result<CapturedArtifact, CaptureError> {
        if let Err(source) = self.store.ensure_directory(&self.directory) {
            tracing::error!(
                directory = %self.directory.display(),
                error = %source,
                "Failed to prepare capture directory"
            );
            let failures = [ArtifactKind::Raw, ArtifactKind::Structured]
                .into_iter()
                .map(|kind| ArtifactFailure {
                    kind,
                    path: self.artifact_path(timestamp_id, kind),
                    error: io::Error::new(
                        source.kind(),
                        format!("capture directory {}: {}", self.directory.display(), source),
                    ),
                })
                .collect();
            return Err(CaptureError::CaptureFailed {
                timestamp_id: timestamp_id.to_string(),
                failures,
                written: Vec::new(),
            });
        }

        let raw_path = self.artifact_path(timestamp_id, ArtifactKind::Raw);
        let structured_path = self.artifact_path(timestamp_id, ArtifactKind::Structured);

        let raw_bytes = raw::render(model);
        let structured_bytes = serde_json::to_vec_pretty(&view::build(model))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e));

        let mut failures = Vec::new();
        let mut written = Vec::new();

        match self.store.write_new(&raw_path, &raw_bytes) {
            Ok(()) => written.push(raw_path.clone()),
            Err(error) => failures.push(ArtifactFailure {
                kind: ArtifactKind::Raw,
                path: raw_path.clone(),
                error,
            }),
        }

        match structured_bytes.and_then(|bytes| self.store.write_new(&structured_path, &bytes)) {
            Ok(()) => written.push(structured_path.clone()),
            Err(error) => failures.push(ArtifactFailure {
                kind: ArtifactKind::Structured,
                path: structured_path.clone(),
                error,
            }),
        }

        if !failures.is_empty() {
            tracing::error!(
                timestamp_id = %timestamp_id,
                failed = failures.len(),
                written = written.len(),
                "Capture failed"
            );
            return Err(CaptureError::CaptureFailed {
                timestamp_id: timestamp_id.to_string(),
                failures,
                written,
            });
        }

        tracing::info!(
            raw = %raw_path.display(),
            structured = %structured_path.display(),
            "Request captured"
        );

        Ok(CapturedArtifact {
            raw_path,
            structured_path,
            timestamp_id: timestamp_id.to_string(),
        })
    }

    fn next_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}_{:04}", Local::now().format("%Y%m%d_%H%M%S_%6f"), seq)
    }

    fn artifact_path(&self, timestamp_id: &str, kind: ArtifactKind) -> PathBuf {
        self.directory
            .join(format!("request_{}.{}", timestamp_id, kind.extension()))
    }
}
