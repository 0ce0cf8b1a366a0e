//! Transport-tier errors.

use std::error::Error as StdError;
use std::sync::Arc;

use armature::PresentationError;
use thiserror::Error;

/// The closed set of ways a request can fail.
///
/// Cloneable so a failure can be handed to several sinks; causes are shared.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    #[error("Invalid URL")]
    InvalidAddress,

    /// The transport produced no status line.
    #[error("Invalid response from the server")]
    InvalidResponse,

    /// A payload rejected before decoding. `classify` never produces it;
    /// an empty 2xx body is a decoding error.
    #[error("Invalid data received from the server")]
    InvalidPayload,

    /// Non-2xx status. `body` is the raw response body, byte for byte.
    #[error("HTTP error with status code: {status}")]
    Http { status: u16, body: Vec<u8> },

    #[error("Failed to decode response: {0}")]
    Decoding(#[source] Arc<serde_json::Error>),

    #[error("Underlying error: {0}")]
    Underlying(#[source] Arc<dyn StdError + Send + Sync>),

    /// The exchange never produced an outcome (it panicked or was aborted).
    #[error("An unknown error occurred")]
    Unknown,
}

impl NetworkError {
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The raw body of an HTTP failure, lossily decoded.
    pub fn body_text(&self) -> Option<String> {
        match self {
            NetworkError::Http { body, .. } => Some(String::from_utf8_lossy(body).into_owned()),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(e: serde_json::Error) -> Self {
        NetworkError::Decoding(Arc::new(e))
    }
}

impl From<NetworkError> for PresentationError {
    fn from(e: NetworkError) -> Self {
        match e {
            NetworkError::Http { .. } => PresentationError::network(e.to_string()),
            NetworkError::Decoding(_) => PresentationError::parsing(e.to_string()),
            other => PresentationError::wrap(other),
        }
    }
}
