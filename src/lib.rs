//! HTTP request inspector library.
//!
//! Accepts arbitrary requests, normalizes them into a [`capture::RequestModel`]
//! and renders, inspects or persists them.

pub mod capture;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::InspectorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
