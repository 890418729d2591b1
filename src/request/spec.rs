//! Request Spec
//!
//! Describes one logical request and derives its cache key.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::form_urlencoded;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

// == Request Spec ==
/// Target, method, headers and body of a logical request.
///
/// `url` is either absolute or a path that the transport joins onto its
/// base URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    /// Query parameters; `BTreeMap` keeps them in a canonical order
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON request body
    #[serde(default)]
    pub body: Option<Value>,
    /// Per-request override of the executor deadline
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Per-request override of the executor retry budget
    #[serde(default)]
    pub max_retries: Option<u32>,
}

impl RequestSpec {
    /// A GET request for `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(name.into(), value.to_string());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    // == Cache Key ==
    /// Deterministic key for this request.
    ///
    /// The URL's own query string and `query` are decoded, merged and
    /// sorted, so parameter order and encoding never matter. Non-GET
    /// methods are prefixed with the method name and suffixed with the
    /// compact JSON body, whose object keys serialize in sorted order.
    pub fn cache_key(&self) -> String {
        let (path, inline_query) = match self.url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (self.url.as_str(), ""),
        };

        let mut pairs: Vec<(String, String)> = form_urlencoded::parse(inline_query.as_bytes())
            .map(|(name, value)| (encode_component(&name), encode_component(&value)))
            .collect();
        pairs.extend(
            self.query
                .iter()
                .map(|(name, value)| (encode_component(name), encode_component(value))),
        );
        pairs.sort();

        let mut key = match self.method {
            Method::Get => String::new(),
            other => format!("{} ", other),
        };
        key.push_str(path);

        if !pairs.is_empty() {
            key.push('?');
            let rendered: Vec<String> = pairs
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            key.push_str(&rendered.join("&"));
        }

        match (&self.body, self.method) {
            (Some(body), method) if method != Method::Get => {
                key.push(' ');
                key.push_str(&body.to_string());
            }
            _ => {}
        }
        key
    }
}

/// Percent-encodes the characters that would make a rendered key ambiguous.
fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
