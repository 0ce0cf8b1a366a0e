//! Presentation-tier errors.
//!
//! Anything that reaches a container's `last_error` slot is a
//! [`PresentationError`]. Surfaces render it as a dismissible notice; it is
//! never re-thrown.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// An error ready to be shown to the user.
///
/// Cloneable so it can sit in a value slot; wrapped causes are shared.
#[derive(Debug, Clone, Error)]
pub enum PresentationError {
    #[error("{0}")]
    General(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parsing error: {0}")]
    Parsing(String),

    #[error("{0}")]
    Wrapped(#[source] Arc<dyn StdError + Send + Sync>),
}

impl PresentationError {
    pub fn general(message: impl Into<String>) -> Self {
        Self::General(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parsing(message: impl Into<String>) -> Self {
        Self::Parsing(message.into())
    }

    pub fn wrap<E>(cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Wrapped(Arc::new(cause))
    }
}
