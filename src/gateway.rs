//! Remote data gateway: one network call per invocation, no retry, no cache.
//!
//! GraphQL calls go to the indexer (or an override endpoint such as the
//! aggregator), REST calls go to the analytics base URL, and `fetch_json`
//! pulls arbitrary metadata documents for the image resolver.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::debug::{self, cat};
use crate::util_text::truncate;

/// Header carrying the optional API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Distinguishable gateway failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never produced a response (DNS, connection, CORS, timeout)
    #[error("network error: {0}")]
    Transport(String),
    /// Upstream answered with a non-success status
    #[error("http {status}: {body}")]
    Status { status: u16, body: String },
    /// GraphQL payload carried an `errors` list
    #[error("graphql error: {0}")]
    GraphQl(String),
    /// Body was not JSON or lacked the expected envelope
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Seam between the service and the network. Tests substitute a fake.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait DataGateway: Send + Sync {
    /// POST `{query, variables?}` and return the `data` object.
    /// `endpoint` overrides the default indexer URL.
    async fn graphql(
        &self,
        query: &str,
        variables: Option<Value>,
        endpoint: Option<&str>,
    ) -> Result<Value, GatewayError>;

    /// GET `<analytics>/<path>?<params>` and return the decoded body.
    async fn rest_get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, GatewayError>;

    /// GET an arbitrary JSON document (token metadata).
    async fn fetch_json(&self, url: &str) -> Result<Value, GatewayError>;
}

static HTTP: OnceLock<reqwest::Client> = OnceLock::new();

fn http_client() -> &'static reqwest::Client {
    HTTP.get_or_init(|| {
        #[cfg(not(target_arch = "wasm32"))]
        {
            reqwest::Client::builder()
                .pool_max_idle_per_host(8)
                .tcp_nodelay(true)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new())
        }

        #[cfg(target_arch = "wasm32")]
        {
            reqwest::Client::new()
        }
    })
}

/// reqwest-backed gateway
#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    graphql_url: String,
    analytics_url: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl HttpGateway {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: http_client().clone(),
            graphql_url: cfg.indexer_graphql_url.clone(),
            analytics_url: cfg.analytics_url.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.request_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn graphql_url(&self) -> &str {
        &self.graphql_url
    }

    pub fn has_api_key(&self) -> bool {
        matches!(self.api_key.as_deref(), Some(k) if !k.is_empty())
    }

    fn prepare(&self, mut req: reqwest::RequestBuilder, with_key: bool) -> reqwest::RequestBuilder {
        req = req.header(reqwest::header::CONTENT_TYPE, "application/json");
        if with_key {
            if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
                req = req.header(API_KEY_HEADER, key);
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        let req = match self.timeout {
            Some(t) => req.timeout(t),
            None => req,
        };
        req
    }

    async fn send(&self, req: reqwest::RequestBuilder, label: &str) -> Result<Value, GatewayError> {
        let res = req.send().await.map_err(|e| {
            log::warn!("[gateway] {label} transport failure: {e}");
            GatewayError::Transport(e.to_string())
        })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            log::warn!("[gateway] {label} http {status}");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        res.json::<Value>()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl DataGateway for HttpGateway {
    async fn graphql(
        &self,
        query: &str,
        variables: Option<Value>,
        endpoint: Option<&str>,
    ) -> Result<Value, GatewayError> {
        let url = endpoint.unwrap_or(&self.graphql_url);
        let body = graphql_body(query, variables);
        debug::log(cat::GATEWAY, format!("POST {url}"));

        let req = self.prepare(self.client.post(url).json(&body), true);
        let payload = self.send(req, "graphql").await?;
        extract_graphql_data(payload)
    }

    async fn rest_get(&self, path: &str, params: &[(&str, String)]) -> Result<Value, GatewayError> {
        let url = join_url(&self.analytics_url, path);
        debug::log(cat::GATEWAY, format!("GET {url} {params:?}"));

        let req = self.prepare(self.client.get(&url).query(params), true);
        self.send(req, "rest").await
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, GatewayError> {
        debug::log(cat::GATEWAY, format!("GET {url} (metadata)"));
        let req = self.prepare(self.client.get(url), false);
        self.send(req, "metadata").await
    }
}

/// Build the GraphQL request body, omitting `variables` when absent
pub fn graphql_body(query: &str, variables: Option<Value>) -> Value {
    match variables {
        Some(v) => json!({ "query": query, "variables": v }),
        None => json!({ "query": query }),
    }
}

/// Unwrap a GraphQL envelope: `{data}` → data, `{errors: [...]}` → GraphQl
pub fn extract_graphql_data(mut payload: Value) -> Result<Value, GatewayError> {
    if let Some(errors) = payload.get("errors").and_then(|e| e.as_array()) {
        if !errors.is_empty() {
            let msg = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(|m| m.as_str())
                        .unwrap_or("unknown error")
                        .to_string()
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(GatewayError::GraphQl(msg));
        }
    }

    match payload.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(GatewayError::Malformed("missing data".to_string())),
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
