//! The seam between the request pipeline and the wire.
//!
//! A [`Transport`] performs one exchange and reports what came back without
//! judging it; classification happens in the pipeline. [`HttpTransport`] is
//! the production implementation over `reqwest`. Tests and offline mode
//! plug in their own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::endpoint::RequestDescriptor;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// What a transport observed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawResponse {
    /// `None` when the exchange produced no status line.
    pub status: Option<u16>,
    /// Final address after redirects, if known.
    pub url: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(status),
            url: None,
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one exchange. `Err` is reserved for transport-level failures
    /// (connection refused, timeout, ...); any HTTP status is an `Ok`.
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse, BoxError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// A client with a whole-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("armature/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse, BoxError> {
        let mut builder = self.client.request(request.method.into(), request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status: Some(status),
            url: Some(url),
            body,
        })
    }
}
