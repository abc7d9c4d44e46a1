//! Structured, JSON-serializable view of a request.
//!
//! The view mirrors every field of [`RequestModel`]. Absent values are kept
//! as explicit `null`s so consumers can tell "not provided" from "empty".
//!
//! Headers are flattened into a name → value map: duplicate names collapse
//! to the last value and arrival order is lost. The raw rendering in
//! [`crate::capture::raw`] is the place to look for exact header fidelity.

use std::collections::BTreeMap;

use chrono::Local;
use serde::Serialize;

use crate::capture::classifier::{self, BodyView};
use crate::capture::fields::FieldMap;
use crate::capture::model::{HttpMethod, RequestModel};

/// Full introspection of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionView {
    pub timestamp: String,
    pub method: HttpMethod,
    pub url: UrlView,
    pub client: ClientView,
    pub headers: BTreeMap<String, String>,
    pub query_params: FieldMap,
    pub body: BodyView,
    pub cookies: FieldMap,
    pub environment: EnvironmentView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlView {
    pub full: String,
    /// URL without its query string.
    pub base: String,
    pub path: String,
    pub scheme: String,
    pub host: String,
    pub root_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientView {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentView {
    pub is_secure: bool,
    pub is_json: bool,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub mimetype: Option<String>,
    pub mimetype_params: Option<BTreeMap<String, String>>,
    pub charset: Option<String>,
}

/// Current local time in ISO-8601 with microseconds.
pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Build the view with the current time as its timestamp.
pub fn build(model: &RequestModel) -> InspectionView {
    build_with_timestamp(model, now_timestamp())
}

/// Build the view with a caller-supplied timestamp.
pub fn build_with_timestamp(model: &RequestModel, timestamp: String) -> InspectionView {
    let url = model.url();
    let mime = model
        .content_type()
        .and_then(|ct| ct.trim().parse::<mime::Mime>().ok());

    // Names compare case-insensitively; the first spelling seen is kept.
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for h in model.headers().iter() {
        let key = headers
            .keys()
            .find(|k| k.eq_ignore_ascii_case(&h.name))
            .cloned()
            .unwrap_or_else(|| h.name.clone());
        headers.insert(key, h.value.clone());
    }

    InspectionView {
        timestamp,
        method: model.method().clone(),
        url: UrlView {
            full: url.full(),
            base: format!("{}{}", url.base(), url.path),
            path: url.path.clone(),
            scheme: url.scheme.clone(),
            host: url.host.clone(),
            root_url: url.root(),
        },
        client: ClientView {
            ip: model.client_address().map(str::to_string),
            user_agent: model.user_agent().map(str::to_string),
            referrer: model.referrer().map(str::to_string),
        },
        headers,
        query_params: model.query_params().clone(),
        body: model.body().clone(),
        cookies: model.cookies().clone(),
        environment: EnvironmentView {
            is_secure: model.is_secure(),
            is_json: mime.as_ref().is_some_and(classifier::is_json),
            content_type: model.content_type().map(str::to_string),
            content_length: model.content_length(),
            mimetype: mime.as_ref().map(|m| m.essence_str().to_string()),
            mimetype_params: mime.as_ref().map(|m| {
                m.params()
                    .map(|(k, v)| (k.as_str().to_string(), v.as_str().to_string()))
                    .collect()
            }),
            charset: model.charset().map(str::to_string),
        },
    }
}
