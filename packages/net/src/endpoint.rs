//! Declarative endpoint descriptions and their resolution into requests.
//!
//! An [`Endpoint`] names a resource relative to a base address. Resolving it
//! ([`Endpoint::url`]) appends the path segments to the base, percent-encodes
//! them, and attaches the query parameters sorted by key, so the same
//! endpoint always resolves to the same address regardless of map order.
//!
//! ```text
//! https://api.example.com  +  v1/items  +  {page: 2, q: "a b"}
//!   ──► https://api.example.com/v1/items?page=2&q=a%20b
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use url::Url;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
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
            Method::Delete => reqwest::Method::DELETE,
            Method::Patch => reqwest::Method::PATCH,
        }
    }
}

// ---------------------------------------------------------------------------
// EndpointError
// ---------------------------------------------------------------------------

/// Why an endpoint could not be resolved to an address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("invalid base address '{base}': {reason}")]
    InvalidBase { base: String, reason: String },

    #[error("base address '{0}' cannot carry a path")]
    CannotBeABase(String),

    #[error("unsupported scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// An immutable description of one network resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Base address, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Path relative to the base, e.g. `v1/items`.
    pub path: String,
    pub method: Method,
    /// Header names are case-sensitive and unique.
    pub headers: Option<HashMap<String, String>>,
    /// Query parameters. Their resolved order is by key, not insertion.
    pub query: Option<HashMap<String, String>>,
    pub body: Option<Vec<u8>>,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, path: impl Into<String>, method: Method) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
            method,
            headers: None,
            query: None,
            body: None,
        }
    }

    pub fn get(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(base_url, path, Method::Get)
    }

    pub fn post(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(base_url, path, Method::Post)
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialise `value` as the JSON body and set `Content-Type`.
    pub fn with_json<T: Serialize>(self, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .with_header("Content-Type", "application/json")
            .with_body(body))
    }

    /// Resolve the final address.
    pub fn url(&self) -> Result<Url, EndpointError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| EndpointError::InvalidBase {
            base: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(EndpointError::UnsupportedScheme(url.scheme().to_string()));
        }

        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| EndpointError::CannotBeABase(self.base_url.clone()))?;
            segments.pop_if_empty();
            segments.extend(self.path.split('/').filter(|s| !s.is_empty()));
        }

        match self.query.as_ref().filter(|q| !q.is_empty()) {
            Some(query) => url.set_query(Some(&encode_query(query))),
            None => url.set_query(None),
        }

        Ok(url)
    }

    /// Resolve into a request ready for a transport.
    pub fn descriptor(&self) -> Result<RequestDescriptor, EndpointError> {
        let url = self.url()?;
        let mut headers: Vec<(String, String)> = self
            .headers
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        headers.sort();

        Ok(RequestDescriptor {
            url,
            method: self.method,
            headers,
            body: self.body.clone(),
        })
    }
}

/// `k1=v1&k2=v2`, keys sorted, both sides percent-encoded.
fn encode_query(query: &HashMap<String, String>) -> String {
    let mut pairs: Vec<(&String, &String)> = query.iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

// ---------------------------------------------------------------------------
// RequestDescriptor
// ---------------------------------------------------------------------------

/// A fully resolved request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub url: Url,
    pub method: Method,
    /// Sorted by name.
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl RequestDescriptor {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
