//! Typed request/decode pipeline.
//!
//! Turns a declarative [`Endpoint`] into a typed result or a classified
//! [`NetworkError`], delivered as a single-item stream that plugs straight
//! into armature's busy tracking and error routing.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`endpoint`] | [`Endpoint`], [`Method`], [`RequestDescriptor`] and address resolution |
//! | [`transport`] | The [`Transport`] seam and the `reqwest`-backed [`HttpTransport`] |
//! | [`service`] | [`NetworkService`]: build, execute, classify, decode |
//! | [`error`] | [`NetworkError`] and its mapping into presentation errors |

pub mod endpoint;
pub mod error;
pub mod service;
pub mod transport;

pub use endpoint::{Endpoint, EndpointError, Method, RequestDescriptor};
pub use error::NetworkError;
pub use service::{body_preview, classify, NetworkService, RequestStream, PREVIEW_LIMIT};
pub use transport::{BoxError, HttpTransport, RawResponse, Transport};
