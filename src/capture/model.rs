//! Normalized snapshot of one inbound request.
//!
//! A `RequestModel` is built once by the boundary layer through
//! [`RequestModelBuilder`] and is read-only afterwards. Every derived field
//! (content type, cookies, query parameters, body classification) is computed
//! at build time so all consumers observe the same interpretation.

use std::fmt;

use serde::{Serialize, Serializer};
use url::form_urlencoded;

use crate::capture::classifier::{self, BodyView};
use crate::capture::fields::FieldMap;

/// HTTP request method.
///
/// Unknown tokens pass through untouched; the core never rejects a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Other(String),
}

impl HttpMethod {
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "OPTIONS" => HttpMethod::Options,
            "HEAD" => HttpMethod::Head,
            other => HttpMethod::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Other(token) => token.as_str(),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// URL components of a request.
///
/// `full` and `base` are computed, so `full == base + path + "?" + query`
/// holds by construction (the `?` only when the query is non-empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUrl {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub query_string: String,
}

impl RequestUrl {
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        path: impl Into<String>,
        query_string: impl Into<String>,
    ) -> Self {
        let path = path.into();
        Self {
            scheme: scheme.into(),
            host: host.into(),
            path: if path.is_empty() { "/".to_string() } else { path },
            query_string: query_string.into(),
        }
    }

    /// `scheme://host`
    pub fn base(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// `scheme://host/`
    pub fn root(&self) -> String {
        format!("{}/", self.base())
    }

    /// Path plus `?query` when the query string is non-empty.
    pub fn path_with_query(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }

    pub fn full(&self) -> String {
        format!("{}{}", self.base(), self.path_with_query())
    }
}

/// A single header line as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Header lines in arrival order, duplicates included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<Header>);

impl Headers {
    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Every value for `name`, in arrival order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Immutable snapshot of one inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestModel {
    method: HttpMethod,
    url: RequestUrl,
    headers: Headers,
    query_params: FieldMap,
    cookies: FieldMap,
    raw_body: Vec<u8>,
    content_type: Option<String>,
    content_length: Option<u64>,
    charset: Option<String>,
    is_secure: bool,
    client_address: Option<String>,
    user_agent: Option<String>,
    referrer: Option<String>,
    body: BodyView,
}

impl RequestModel {
    pub fn builder(method: HttpMethod, url: RequestUrl) -> RequestModelBuilder {
        RequestModelBuilder {
            method,
            url,
            headers: Vec::new(),
            raw_body: Vec::new(),
            is_secure: None,
            client_address: None,
        }
    }

    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    pub fn url(&self) -> &RequestUrl {
        &self.url
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn query_params(&self) -> &FieldMap {
        &self.query_params
    }

    pub fn cookies(&self) -> &FieldMap {
        &self.cookies
    }

    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    /// Full `Content-Type` header value, parameters included.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn is_secure(&self) -> bool {
        self.is_secure
    }

    pub fn client_address(&self) -> Option<&str> {
        self.client_address.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref()
    }

    /// Classification of the body, computed once at build time.
    pub fn body(&self) -> &BodyView {
        &self.body
    }

    /// Form fields; present only for urlencoded or multipart bodies.
    pub fn form_fields(&self) -> Option<&FieldMap> {
        self.body.form.as_ref()
    }

    /// Uploaded file names keyed by field; present only for multipart bodies
    /// carrying file parts.
    pub fn uploaded_files(&self) -> Option<&FieldMap> {
        self.body.files.as_ref().filter(|files| !files.is_empty())
    }
}

/// Collects the raw pieces of a request and derives the rest.
#[derive(Debug, Clone)]
pub struct RequestModelBuilder {
    method: HttpMethod,
    url: RequestUrl,
    headers: Vec<Header>,
    raw_body: Vec<u8>,
    is_secure: Option<bool>,
    client_address: Option<String>,
}

impl RequestModelBuilder {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.raw_body = body.into();
        self
    }

    pub fn client_address(mut self, address: impl Into<String>) -> Self {
        self.client_address = Some(address.into());
        self
    }

    /// Override TLS detection; by default it follows the URL scheme.
    pub fn secure(mut self, is_secure: bool) -> Self {
        self.is_secure = Some(is_secure);
        self
    }

    pub fn build(self) -> RequestModel {
        let headers = Headers(self.headers);

        let content_type = headers.get("content-type").map(str::to_string);
        let content_length = headers
            .get("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok());
        let charset = content_type
            .as_deref()
            .and_then(|ct| ct.parse::<mime::Mime>().ok())
            .and_then(|m| m.get_param(mime::CHARSET).map(|c| c.as_str().to_string()));

        let query_params = form_urlencoded::parse(self.url.query_string.as_bytes())
            .into_owned()
            .collect();
        let cookies = parse_cookies(headers.get_all("cookie"));
        let body = classifier::classify(&self.raw_body, content_type.as_deref());

        RequestModel {
            is_secure: self
                .is_secure
                .unwrap_or_else(|| self.url.scheme.eq_ignore_ascii_case("https")),
            method: self.method,
            url: self.url,
            user_agent: headers.get("user-agent").map(str::to_string),
            referrer: headers.get("referer").map(str::to_string),
            query_params,
            cookies,
            raw_body: self.raw_body,
            content_type,
            content_length,
            charset,
            client_address: self.client_address,
            headers,
            body,
        }
    }
}

/// Parse `Cookie` header values into a name/value map.
///
/// Pairs are separated by `;`. A segment without `=` is a cookie with an
/// empty value; surrounding double quotes are stripped from values.
fn parse_cookies<'a>(values: impl Iterator<Item = &'a str>) -> FieldMap {
    let mut cookies = FieldMap::new();
    for value in values {
        for pair in value.split(';') {
            let (name, val) = pair.split_once('=').unwrap_or((pair, ""));
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let val = val.trim();
            let val = val
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(val);
            cookies.insert(name, val);
        }
    }
    cookies
}
