//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, body limit, timeout, trace layers)
//!     → middleware/normalize.rs (request ID, buffer body, build RequestModel)
//!         → request.rs (framework request → RequestModel)
//!     → handlers.rs (banner, status, echo, inspect, capture, catch-all)
//!     → response.rs (JSON bodies, capture error mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer};
