//! The request pipeline.
//!
//! ```text
//! Endpoint ──build_request──► RequestDescriptor ──execute::<T>──► stream of one Result<T, NetworkError>
//!              (None + log                          │
//!               on failure)                         ├─ exchange on the background runtime
//!                                                   └─ classify + decode back on the caller's task
//! ```
//!
//! Classification of a [`RawResponse`]:
//!
//! | Observed | Outcome |
//! |----------|---------|
//! | no status line | [`NetworkError::InvalidResponse`] |
//! | status outside 200..=299 | [`NetworkError::Http`] with the raw body |
//! | 2xx, body not a `T` (empty included) | [`NetworkError::Decoding`] |
//! | transport error | [`NetworkError::Underlying`] |
//! | exchange panicked or aborted | [`NetworkError::Unknown`] |
//! | otherwise | `Ok(T)` |
//!
//! Every execution yields exactly one item. Dropping the stream before it
//! resolves aborts the exchange.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::endpoint::{Endpoint, RequestDescriptor};
use crate::error::NetworkError;
use crate::transport::{HttpTransport, RawResponse, Transport};

/// Characters of response body written to the debug log.
pub const PREVIEW_LIMIT: usize = 500;

/// A stream that yields exactly one outcome.
pub type RequestStream<T> = BoxStream<'static, Result<T, NetworkError>>;

// ---------------------------------------------------------------------------
// NetworkService
// ---------------------------------------------------------------------------

/// Builds, performs and classifies requests.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct NetworkService {
    transport: Arc<dyn Transport>,
    background: Option<Handle>,
}

impl NetworkService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            background: None,
        }
    }

    /// A service over [`HttpTransport`] with the given timeout.
    pub fn http(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(Arc::new(HttpTransport::with_timeout(timeout)?)))
    }

    /// Run exchanges on `handle` instead of the caller's runtime.
    pub fn with_background(mut self, handle: Handle) -> Self {
        self.background = Some(handle);
        self
    }

    /// Resolve `endpoint`, or log and return `None` when it cannot be.
    pub fn build_request(&self, endpoint: &Endpoint) -> Option<RequestDescriptor> {
        match endpoint.descriptor() {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                error!("network: failed to create request for '{}': {e}", endpoint.path);
                None
            }
        }
    }

    /// Perform `request` and decode the body as `T`.
    ///
    /// Nothing happens until the returned future is first polled.
    pub fn fetch<T>(
        &self,
        request: RequestDescriptor,
    ) -> impl Future<Output = Result<T, NetworkError>> + Send + 'static
    where
        T: DeserializeOwned + Send + 'static,
    {
        let transport = Arc::clone(&self.transport);
        let background = self.background.clone();

        async move {
            info!("network: performing request {} {}", request.method, request.url);
            let exchange = async move { transport.send(request).await };

            let sent = match background {
                Some(handle) => match AbortOnDrop(handle.spawn(exchange)).await {
                    Ok(sent) => sent,
                    Err(e) => {
                        warn!("network: exchange did not complete: {e}");
                        return Err(NetworkError::Unknown);
                    }
                },
                None => exchange.await,
            };

            match sent {
                Ok(raw) => classify(raw),
                Err(e) => {
                    debug!("network: transport failure: {e}");
                    Err(NetworkError::Underlying(Arc::from(e)))
                }
            }
        }
    }

    /// [`fetch`](Self::fetch) as a single-item stream.
    pub fn execute<T>(&self, request: RequestDescriptor) -> RequestStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.fetch(request).into_stream().boxed()
    }

    /// Build and execute in one step. `None` when the endpoint does not resolve.
    pub fn request<T>(&self, endpoint: &Endpoint) -> Option<RequestStream<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.build_request(endpoint).map(|request| self.execute(request))
    }

    /// Like [`request`](Self::request), but an unresolvable endpoint is
    /// reported as [`NetworkError::InvalidAddress`] through the stream.
    pub fn load<T>(&self, endpoint: &Endpoint) -> RequestStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        match self.request(endpoint) {
            Some(stream) => stream,
            None => stream::once(async { Err(NetworkError::InvalidAddress) }).boxed(),
        }
    }
}

impl std::fmt::Debug for NetworkService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkService")
            .field("background", &self.background.is_some())
            .finish_non_exhaustive()
    }
}

/// Aborts the spawned exchange if the awaiting side goes away first.
struct AbortOnDrop<R>(JoinHandle<R>);

impl<R> Future for AbortOnDrop<R> {
    type Output = Result<R, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx)
    }
}

impl<R> Drop for AbortOnDrop<R> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Turn what the transport saw into an outcome.
pub fn classify<T: DeserializeOwned>(raw: RawResponse) -> Result<T, NetworkError> {
    log_response(&raw);

    let Some(status) = raw.status else {
        return Err(NetworkError::InvalidResponse);
    };
    if !(200..=299).contains(&status) {
        return Err(NetworkError::Http {
            status,
            body: raw.body,
        });
    }
    Ok(serde_json::from_slice(&raw.body)?)
}

fn log_response(raw: &RawResponse) {
    let Some(status) = raw.status else {
        return;
    };
    debug!("network: response status code {status}");
    if let Some(url) = &raw.url {
        debug!("network: response url {url}");
    }
    let (preview, truncated) = body_preview(&raw.body, PREVIEW_LIMIT);
    if truncated {
        debug!("network: response data (truncated): {preview}");
    } else {
        debug!("network: response data: {preview}");
    }
}

/// At most `limit` characters of `body`, with `...` appended when cut.
/// The flag reports whether anything was cut.
pub fn body_preview(body: &[u8], limit: usize) -> (String, bool) {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(limit) {
        Some((cut, _)) => (format!("{}...", &text[..cut]), true),
        None => (text.into_owned(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde::Deserialize;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use crate::transport::BoxError;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
        title: String,
    }

    /// Replies with a canned outcome.
    struct Canned(Result<RawResponse, String>);

    #[async_trait]
    impl Transport for Canned {
        async fn send(&self, _request: RequestDescriptor) -> Result<RawResponse, BoxError> {
            self.0.clone().map_err(BoxError::from)
        }
    }

    fn service(outcome: Result<RawResponse, String>) -> NetworkService {
        NetworkService::new(Arc::new(Canned(outcome)))
    }

    fn descriptor() -> RequestDescriptor {
        Endpoint::get("https://api.example.com", "v1/items")
            .descriptor()
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn success_decodes() {
        let svc = service(Ok(RawResponse::new(200, r#"{"id":1,"title":"a"}"#)));
        let item: Item = svc.fetch(descriptor()).await.unwrap();
        assert_eq!(item, Item { id: 1, title: "a".into() });
    }

    #[tokio::test]
    async fn non_2xx_keeps_status_and_raw_body() {
        let body = b"\xffserver error\x00".to_vec();
        let svc = service(Ok(RawResponse::new(503, body.clone())));
        match svc.fetch::<Item>(descriptor()).await {
            Err(NetworkError::Http { status, body: got }) => {
                assert_eq!(status, 503);
                assert_eq!(got, body);
            }
            other => panic!("expected Http, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn redirect_status_is_an_http_error() {
        let svc = service(Ok(RawResponse::new(304, "")));
        assert_eq!(svc.fetch::<Item>(descriptor()).await.unwrap_err().status(), Some(304));
    }

    #[tokio::test]
    async fn schema_mismatch_is_decoding_error() {
        let svc = service(Ok(RawResponse::new(200, r#"{"id":"x"}"#)));
        assert!(matches!(
            svc.fetch::<Item>(descriptor()).await,
            Err(NetworkError::Decoding(_))
        ));
    }

    #[tokio::test]
    async fn missing_status_line_is_invalid_response() {
        let raw = RawResponse {
            status: None,
            url: None,
            body: b"{}".to_vec(),
        };
        assert!(matches!(
            service(Ok(raw)).fetch::<Item>(descriptor()).await,
            Err(NetworkError::InvalidResponse)
        ));
    }

    #[tokio::test]
    async fn empty_success_body_is_a_decoding_error() {
        assert!(matches!(
            service(Ok(RawResponse::new(204, ""))).fetch::<Item>(descriptor()).await,
            Err(NetworkError::Decoding(_))
        ));
    }

    #[tokio::test]
    async fn transport_failure_is_underlying() {
        let err = service(Err("connection refused".into()))
            .fetch::<Item>(descriptor())
            .await
            .unwrap_err();
        assert!(matches!(err, NetworkError::Underlying(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn execute_yields_exactly_one_item() {
        let svc = service(Ok(RawResponse::new(500, "nope")));
        let items: Vec<_> = svc.execute::<Item>(descriptor()).collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unresolvable_endpoint_is_none_or_invalid_address() {
        let svc = service(Ok(RawResponse::new(200, "[]")));
        let bad = Endpoint::get("::not a base::", "items");
        assert!(svc.build_request(&bad).is_none());
        assert!(svc.request::<Vec<Item>>(&bad).is_none());

        let outcome: Vec<_> = svc.load::<Vec<Item>>(&bad).collect().await;
        assert!(matches!(outcome.as_slice(), [Err(NetworkError::InvalidAddress)]));
    }

    // -----------------------------------------------------------------------
    // Background execution
    // -----------------------------------------------------------------------

    #[test]
    fn exchange_runs_on_background_runtime() {
        let background = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("net-io")
            .enable_all()
            .build()
            .unwrap();

        struct ThreadName;

        #[async_trait]
        impl Transport for ThreadName {
            async fn send(&self, _request: RequestDescriptor) -> Result<RawResponse, BoxError> {
                let name = std::thread::current().name().unwrap_or_default().to_string();
                Ok(RawResponse::json(200, &serde_json::json!(name)))
            }
        }

        let svc = NetworkService::new(Arc::new(ThreadName)).with_background(background.handle().clone());
        let main = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let name: String = main.block_on(svc.fetch(descriptor())).unwrap();

        assert_eq!(name, "net-io");
        drop(main);
        background.shutdown_background();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dropping_the_stream_aborts_the_exchange() {
        struct Hanging {
            started: parking::Slot,
            alive: parking::Slot,
        }

        #[async_trait]
        impl Transport for Hanging {
            async fn send(&self, _request: RequestDescriptor) -> Result<RawResponse, BoxError> {
                if let Some(started) = self.started.take() {
                    let _ = started.send(());
                }
                let _alive = self.alive.take();
                std::future::pending().await
            }
        }

        let (started_tx, started_rx) = oneshot::channel();
        let (alive_tx, alive_rx) = oneshot::channel();
        let svc = NetworkService::new(Arc::new(Hanging {
            started: parking::Slot::new(started_tx),
            alive: parking::Slot::new(alive_tx),
        }))
        .with_background(Handle::current());

        let mut stream = svc.execute::<Item>(descriptor());
        let polled = tokio::time::timeout(Duration::from_millis(50), stream.next()).await;
        assert!(polled.is_err());
        started_rx.await.unwrap();

        drop(stream);
        // The aborted exchange drops its sender without sending.
        assert!(alive_rx.await.is_err());
    }

    mod parking {
        use parking_lot::Mutex;
        use tokio::sync::oneshot;

        pub struct Slot(Mutex<Option<oneshot::Sender<()>>>);

        impl Slot {
            pub fn new(tx: oneshot::Sender<()>) -> Self {
                Self(Mutex::new(Some(tx)))
            }

            pub fn take(&self) -> Option<oneshot::Sender<()>> {
                self.0.lock().take()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Preview
    // -----------------------------------------------------------------------

    #[test]
    fn preview_is_capped_with_marker() {
        let long = "x".repeat(PREVIEW_LIMIT + 10);
        let (preview, truncated) = body_preview(long.as_bytes(), PREVIEW_LIMIT);
        assert!(truncated);
        assert_eq!(preview.len(), PREVIEW_LIMIT + 3);
        assert!(preview.ends_with("..."));

        let (preview, truncated) = body_preview(b"short", PREVIEW_LIMIT);
        assert!(!truncated);
        assert_eq!(preview, "short");
    }

    #[test]
    fn preview_counts_characters_not_bytes() {
        let text = "é".repeat(PREVIEW_LIMIT);
        let (preview, truncated) = body_preview(text.as_bytes(), PREVIEW_LIMIT);
        assert!(!truncated);
        assert_eq!(preview.chars().count(), PREVIEW_LIMIT);
    }

    // -----------------------------------------------------------------------
    // Against a loopback server
    // -----------------------------------------------------------------------

    /// Spawn a loopback axum server and return its base URL (e.g. `http://127.0.0.1:PORT`).
    async fn spawn_mock_server(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn http_transport_round_trip() {
        let app = Router::new()
            .route(
                "/v1/items",
                get(|| async { Json(serde_json::json!([{"id": 7, "title": "seven"}])) }),
            )
            .route(
                "/v1/broken",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "server error") }),
            );
        let base = spawn_mock_server(app).await;
        let svc = NetworkService::http(Duration::from_secs(5)).unwrap();

        let items: Vec<Item> = svc
            .fetch(svc.build_request(&Endpoint::get(&base, "v1/items")).unwrap())
            .await
            .unwrap();
        assert_eq!(items, vec![Item { id: 7, title: "seven".into() }]);

        let err = svc
            .fetch::<Vec<Item>>(svc.build_request(&Endpoint::get(&base, "v1/broken")).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.body_text().as_deref(), Some("server error"));
    }

    #[tokio::test]
    async fn connection_refused_is_underlying() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let svc = NetworkService::http(Duration::from_secs(2)).unwrap();
        let request = svc
            .build_request(&Endpoint::get(format!("http://{addr}"), "v1/items"))
            .unwrap();
        assert!(matches!(
            svc.fetch::<Vec<Item>>(request).await,
            Err(NetworkError::Underlying(_))
        ));
    }
}
