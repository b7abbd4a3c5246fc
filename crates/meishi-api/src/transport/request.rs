//! Request shaping shared by every transport primitive.

use crate::config::ApiConfig;
use std::time::Duration;
use url::Url;

/// HTTP method of an operation. The card service only ever needs these
/// two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One logical request to the card service, independent of the mechanism
/// that ends up carrying it.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    /// Operation selector: `add`, `update`, `search` or `get`.
    pub path: String,
    pub method: Method,
    /// Query pairs beyond `path` and `api_token`.
    pub query: Vec<(String, String)>,
    /// JSON body for write operations. The token is injected at build
    /// time, not stored here.
    pub body: Option<serde_json::Value>,
    /// Window the carrying primitive has to produce an outcome.
    pub timeout: Duration,
}

impl ApiRequest {
    /// A read request for the given operation.
    #[must_use]
    pub fn get(path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            method: Method::Get,
            query: Vec::new(),
            body: None,
            timeout,
        }
    }

    /// A write request carrying a JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: serde_json::Value, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            method: Method::Post,
            query: Vec::new(),
            body: Some(body),
            timeout,
        }
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Builds the full request URL: `path` first, then the shared token,
/// then the operation query. Empty values are dropped so the backend
/// never sees empty filters.
pub fn build_url(config: &ApiConfig, request: &ApiRequest) -> Url {
    let mut url = config.base_url.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("path", &request.path);
        pairs.append_pair("api_token", &config.api_token);
        for (key, value) in &request.query {
            if !value.is_empty() {
                pairs.append_pair(key, value);
            }
        }
    }
    url
}

/// The POST body with the shared token injected alongside the operation
/// members, the shape the backend authenticates.
pub fn body_with_token(config: &ApiConfig, request: &ApiRequest) -> serde_json::Value {
    let mut body = request
        .body
        .clone()
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
    if let serde_json::Value::Object(ref mut map) = body {
        map.insert(
            "api_token".to_string(),
            serde_json::Value::String(config.api_token.clone()),
        );
    }
    body
}
