//! sw_fetch tool implementation.
//!
//! Sends a request through the worker's router, exactly as an intercepted
//! page request would be handled.

use std::collections::BTreeMap;

use mealsw_client::{RouteOutcome, Worker};
use mealsw_core::{Destination, Error, Method, Request};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchParams {
    /// Origin-relative path (`/api/v1/meals`) or absolute URL.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// What the response will be used for. Inferred from headers when omitted.
    #[serde(default)]
    pub destination: Option<Destination>,

    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body (UTF-8).
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// What the router returned.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchOutput {
    pub url: String,
    /// One of `network`, `cache-hit`, `fallback`, `synthetic`.
    pub outcome: String,
    /// False when a fallback found nothing to serve.
    pub has_response: bool,
    pub status: Option<u16>,
    pub status_text: Option<String>,
    /// Response kind: `basic`, `cors`, `opaque` or `error`.
    pub kind: Option<String>,
    /// Response headers in received order. Repeated names (`set-cookie`,
    /// `vary`) appear once per value.
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: Option<String>,
    /// Whether a cache write was started for this response.
    pub caching: bool,
}

impl FetchOutput {
    pub fn from_outcome(url: &str, outcome: RouteOutcome) -> Self {
        let kind = outcome.kind();
        let caching = matches!(&outcome, RouteOutcome::Network { write: Some(_), .. });

        match outcome.into_response() {
            Some(response) => Self {
                url: url.to_string(),
                outcome: kind.as_str().to_string(),
                has_response: true,
                status: Some(response.status),
                status_text: Some(response.status_text),
                kind: Some(response.kind.as_str().to_string()),
                headers: response.headers,
                body: Some(String::from_utf8_lossy(&response.body).into_owned()),
                caching,
            },
            None => Self {
                url: url.to_string(),
                outcome: kind.as_str().to_string(),
                has_response: false,
                status: None,
                status_text: None,
                kind: None,
                headers: Vec::new(),
                body: None,
                caching,
            },
        }
    }
}

/// Build the request described by `params`.
pub fn build_request(worker: &Worker, params: FetchParams) -> Result<Request, Error> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }
    if params.method.trim().is_empty() {
        return Err(Error::InvalidInput("method cannot be empty".into()));
    }

    let url = worker.resolve(&params.url)?;
    let mut request = Request::new(Method::from(params.method.as_str()), url);
    for (name, value) in params.headers {
        request = request.with_header(name, value);
    }

    let destination = params
        .destination
        .unwrap_or_else(|| Destination::from_headers(&request.headers));
    request = request.with_destination(destination);

    if let Some(body) = params.body {
        request = request.with_body(body);
    }
    Ok(request)
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &Worker, params: FetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, params)?;
    let url = request.url.to_string();

    let outcome = worker.on_fetch(request).await?;
    let output = FetchOutput::from_outcome(&url, outcome);

    super::json_result(&output)
}
