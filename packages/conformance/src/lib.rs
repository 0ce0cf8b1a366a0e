//! Shared helpers for the armature scenario suite.
//!
//! Provides [`spawn_api`], an in-process JSON API on an ephemeral port, and a
//! few small helpers for wiring containers to it.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /v1/items` | 200, the sample catalogue |
//! | `GET /v1/broken` | 500, body `server error` |
//! | `GET /v1/malformed` | 200, a body that is not the expected shape |
//! | `GET /v1/empty` | 200, no body |
//! | `POST /v1/echo` | 200, the request body, query and content type as JSON |
//! | `GET /v1/slow` | 200, the sample catalogue after [`SLOW_DELAY`] |

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use armature::Registry;
use armature_app::scenes::HomeItem;
use armature_app::{AppConfig, Services};
use armature_net::NetworkService;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// How long `GET /v1/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_millis(300);

fn router() -> Router {
    Router::new()
        .route("/v1/items", get(|| async { Json(HomeItem::samples()) }))
        .route(
            "/v1/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "server error") }),
        )
        .route(
            "/v1/malformed",
            get(|| async { Json(json!({ "items": "not a list" })) }),
        )
        .route("/v1/empty", get(|| async { StatusCode::OK }))
        .route("/v1/echo", post(echo))
        .route(
            "/v1/slow",
            get(|| async {
                tokio::time::sleep(SLOW_DELAY).await;
                Json(HomeItem::samples())
            }),
        )
}

async fn echo(
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({
        "query": query,
        "content_type": content_type,
        "body": body,
    }))
}

/// Start the API on `127.0.0.1` and return its base URL, e.g.
/// `http://127.0.0.1:51234`.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn spawn_api() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");

    tokio::spawn(async move {
        axum::serve(listener, router()).await.expect("api server");
    });

    format!("http://{addr}")
}

/// A config pointed at `base`, with short simulated delays.
pub fn config_for(base: &str) -> AppConfig {
    AppConfig {
        api_base: base.to_string(),
        timeout: Duration::from_secs(5),
        simulated_delay: Duration::from_millis(20),
        ..AppConfig::default()
    }
}

/// A registry holding HTTP-backed services for `base`.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
pub fn registry_for(base: &str) -> Arc<Registry> {
    let config = config_for(base);
    let network = NetworkService::http(config.timeout).expect("build http client");
    let registry = Arc::new(Registry::new());
    Services::new(network, config).register(&registry);
    registry
}
