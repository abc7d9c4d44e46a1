pub mod normalize;

pub use normalize::{normalize_request, X_REQUEST_ID};
