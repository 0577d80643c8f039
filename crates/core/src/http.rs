//! Request and response model shared by the partition store, the network
//! and the worker.
//!
//! Responses are full snapshots (status, headers, body) so a stored entry can
//! be served back byte-for-byte.

use std::fmt;

use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;

/// Header list in wire order. Names compare case-insensitively.
pub type Headers = Vec<(String, String)>;

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// HTTP request method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
            Method::Other(m) => m,
        }
    }

    /// Only GET participates in caching.
    pub fn is_get(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl From<&str> for Method {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "PATCH" => Method::Patch,
            "DELETE" => Method::Delete,
            "OPTIONS" => Method::Options,
            other => Method::Other(other.to_string()),
        }
    }
}

impl From<String> for Method {
    fn from(s: String) -> Self {
        Method::from(s.as_str())
    }
}

impl From<Method> for String {
    fn from(m: Method) -> Self {
        m.as_str().to_string()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the requester intends to do with the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// A full page navigation.
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    #[default]
    Empty,
}

impl Destination {
    /// Parse a `Sec-Fetch-Dest` style token. Unknown tokens map to `Empty`.
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "document" | "iframe" | "frame" => Destination::Document,
            "script" | "worker" | "sharedworker" => Destination::Script,
            "style" => Destination::Style,
            "image" => Destination::Image,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            _ => Destination::Empty,
        }
    }

    /// Infer the destination from request headers.
    ///
    /// `Sec-Fetch-Dest` wins; otherwise an `Accept` that asks for HTML is
    /// treated as a navigation.
    pub fn from_headers(headers: &[(String, String)]) -> Self {
        if let Some(dest) = find_header(headers, "sec-fetch-dest") {
            return Destination::parse(dest);
        }
        match find_header(headers, "accept") {
            Some(accept) if accept.contains("text/html") => Destination::Document,
            _ => Destination::Empty,
        }
    }
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    /// Absolute URL, fragment stripped.
    pub url: Url,
    pub destination: Destination,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, mut url: Url) -> Self {
        url.set_fragment(None);
        Self { method, url, destination: Destination::Empty, headers: Vec::new(), body: None }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Response classification, mirroring what a requester may inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same-origin response.
    Basic,
    /// Cross-origin response with readable status and body.
    Cors,
    /// Cross-origin response whose status and body cannot be inspected.
    Opaque,
    /// Network error placeholder.
    Error,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Basic => "basic",
            ResponseKind::Cors => "cors",
            ResponseKind::Opaque => "opaque",
            ResponseKind::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(ResponseKind::Basic),
            "cors" => Some(ResponseKind::Cors),
            "opaque" => Some(ResponseKind::Opaque),
            "error" => Some(ResponseKind::Error),
            _ => None,
        }
    }
}

/// A full HTTP response snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Final URL after redirects, when known.
    pub url: Option<Url>,
    pub status: u16,
    pub status_text: String,
    pub kind: ResponseKind,
    pub headers: Headers,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            url: None,
            status,
            status_text: String::new(),
            kind: ResponseKind::Basic,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// The literal 503 handed back when neither network nor cache can answer.
    pub fn service_unavailable() -> Self {
        Self {
            status_text: "Service Unavailable".to_string(),
            headers: vec![("content-type".to_string(), "text/plain; charset=utf-8".to_string())],
            ..Self::new(503, Bytes::from_static(b"Service Unavailable"))
        }
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// 2xx-class status.
    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// A complete same-origin 200: the only shape stored opportunistically
    /// by the cache-first path. Redirects, partial content and opaque
    /// responses fail this check.
    pub fn is_complete_basic(&self) -> bool {
        self.status == 200 && self.kind == ResponseKind::Basic
    }
}
