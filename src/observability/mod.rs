//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request:
//!     → observer.rs (RequestObserver hook, default logs via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Process start:
//!     → logging.rs (subscriber: env filter + pretty/JSON formatter)
//!     → metrics.rs (Prometheus exporter, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the request span and the response header
//! - Metrics are cheap (atomic increments) and no-ops when disabled

pub mod logging;
pub mod metrics;
pub mod observer;

pub use observer::{RequestObserver, TracingObserver};
