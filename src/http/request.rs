//! Conversion of inbound axum requests into [`RequestModel`]s.
//!
//! # Responsibilities
//! - Derive scheme, host, path and query from the request line and headers
//! - Restore canonical header name casing (hyper lowercases names)
//! - Carry the peer address when the server exposes connect info
//!
//! # Design Decisions
//! - Header order follows `HeaderMap` iteration: names in first-arrival
//!   order, repeated values grouped under their name
//! - Non-UTF-8 header values are decoded lossily rather than dropped
//! - `X-Forwarded-Proto: https` marks the request as secure

use std::net::SocketAddr;

use axum::http::{header, request::Parts};

use crate::capture::{HttpMethod, RequestModel, RequestUrl};

/// Build a model from request parts and the fully buffered body.
pub fn model_from_parts(parts: &Parts, body: &[u8], remote: Option<SocketAddr>) -> RequestModel {
    let forwarded_https = parts
        .headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"));

    let scheme = match parts.uri.scheme_str() {
        Some(scheme) => scheme.to_ascii_lowercase(),
        None if forwarded_https => "https".to_string(),
        None => "http".to_string(),
    };

    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string());

    let url = RequestUrl::new(
        scheme.as_str(),
        host,
        parts.uri.path(),
        parts.uri.query().unwrap_or(""),
    );

    let mut builder = RequestModel::builder(HttpMethod::parse(parts.method.as_str()), url)
        .secure(scheme == "https")
        .body(body);
    for (name, value) in parts.headers.iter() {
        builder = builder.header(
            canonical_header_name(name.as_str()),
            String::from_utf8_lossy(value.as_bytes()),
        );
    }
    if let Some(addr) = remote {
        builder = builder.client_address(addr.ip().to_string());
    }

    builder.build()
}

/// `content-type` → `Content-Type`, `x-request-id` → `X-Request-Id`.
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
