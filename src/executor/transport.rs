//! Transport
//!
//! The network seam under the request executor, plus its reqwest
//! implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::request::RequestSpec;

// == Transport Response ==
/// Raw status and body of one completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// == Transport Trait ==
/// Performs a single HTTP exchange.
///
/// Implementations report connection-level failures as
/// `FetchError::Transport`; any HTTP status, including errors, is a
/// completed exchange. Deadlines are enforced by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestSpec) -> Result<TransportResponse>;
}

// == HTTP Transport ==
/// reqwest-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Option<String>,
    default_headers: BTreeMap<String, String>,
}

impl HttpTransport {
    /// Creates a transport without base URL; requests must use absolute URLs.
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(Client::builder().build()?, None))
    }

    /// Creates a transport from the base URL and default headers in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut transport = Self::with_client(Client::builder().build()?, config.base_url.clone());
        transport.default_headers = config
            .default_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(transport)
    }

    /// Wraps an existing client, sharing its connection pool.
    pub fn with_client(client: Client, base_url: Option<String>) -> Self {
        Self {
            client,
            base_url,
            default_headers: BTreeMap::new(),
        }
    }

    // == Resolve URL ==
    /// Joins relative paths onto the base URL and appends query parameters.
    pub fn resolve_url(&self, request: &RequestSpec) -> Result<Url> {
        let is_absolute = request.url.starts_with("http://") || request.url.starts_with("https://");

        let raw = match (&self.base_url, is_absolute) {
            (_, true) => request.url.clone(),
            (Some(base), false) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                request.url.trim_start_matches('/')
            ),
            (None, false) => {
                return Err(FetchError::InvalidRequest(format!(
                    "Relative URL '{}' requires a base URL",
                    request.url
                )))
            }
        };

        let mut url = Url::parse(&raw)
            .map_err(|e| FetchError::InvalidRequest(format!("Invalid URL '{}': {}", raw, e)))?;

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestSpec) -> Result<TransportResponse> {
        let url = self.resolve_url(request)?;
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self.client.request(request.method.into(), url);
        for (name, value) in self.default_headers.iter().chain(request.headers.iter()) {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(TransportResponse { status, body })
    }
}
