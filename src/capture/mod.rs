//! Request capture and normalization engine.
//!
//! # Data Flow
//! ```text
//! boundary layer (http::request)
//!     → model.rs (RequestModel, built once per request)
//!         → classifier.rs (BodyView, computed during build)
//!     → raw.rs   (HTTP/1.1 text rendering)
//!     → view.rs  (structured InspectionView)
//!     → sink.rs  (persist both renderings through store.rs)
//! ```
//!
//! # Design Decisions
//! - Classification and rendering are total: malformed input degrades,
//!   never errors
//! - Only persistence can fail, and failures name the artifacts involved
//! - No shared mutable state except the sink's sequence counter

pub mod classifier;
pub mod fields;
pub mod model;
pub mod raw;
pub mod sink;
pub mod store;
pub mod view;

pub use classifier::{classify, BodyKind, BodyView};
pub use fields::FieldMap;
pub use model::{Header, Headers, HttpMethod, RequestModel, RequestModelBuilder, RequestUrl};
pub use sink::{ArtifactFailure, ArtifactKind, CaptureError, CaptureSink, CapturedArtifact};
pub use store::{ArtifactStore, FsStore, MemoryStore};
pub use view::InspectionView;
