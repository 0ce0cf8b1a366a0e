//! Request pipeline over real HTTP: request building, outcome classification
//! and error conversion into presentation errors.

use std::time::Duration;

use armature::PresentationError;
use armature_app::scenes::HomeItem;
use armature_conformance::{config_for, spawn_api};
use armature_net::{Endpoint, NetworkError, NetworkService};
use futures::StreamExt;
use serde_json::Value;

fn service() -> NetworkService {
    NetworkService::http(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn success_decodes_catalogue() {
    let base = spawn_api().await;
    let mut results = service().load::<Vec<HomeItem>>(&config_for(&base).endpoint("items"));
    let items = results.next().await.expect("one value").unwrap();
    assert_eq!(items.len(), 5);
    assert_eq!(items[0].title, "Getting Started");
    assert!(results.next().await.is_none());
}

#[tokio::test]
async fn status_500_keeps_body_text() {
    let base = spawn_api().await;
    let err = service()
        .fetch::<Value>(
            service()
                .build_request(&Endpoint::get(&base, "v1/broken"))
                .unwrap(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.body_text().as_deref(), Some("server error"));
    assert_eq!(err.to_string(), "HTTP error with status code: 500");

    let presented = PresentationError::from(err);
    assert_eq!(presented.to_string(), "Network error: HTTP error with status code: 500");
}

#[tokio::test]
async fn empty_success_body_is_decoding_error() {
    let base = spawn_api().await;
    let svc = service();
    let err = svc
        .fetch::<Value>(svc.build_request(&Endpoint::get(&base, "v1/empty")).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, NetworkError::Decoding(_)));
    assert!(matches!(PresentationError::from(err), PresentationError::Parsing(_)));
}

#[tokio::test]
async fn shape_mismatch_is_decoding_error() {
    let base = spawn_api().await;
    let svc = service();
    let err = svc
        .fetch::<Vec<HomeItem>>(svc.build_request(&Endpoint::get(&base, "v1/malformed")).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, NetworkError::Decoding(_)));
    assert!(matches!(PresentationError::from(err), PresentationError::Parsing(_)));
}

#[tokio::test]
async fn post_carries_query_and_json_body() {
    let base = spawn_api().await;
    let endpoint = Endpoint::post(&base, "v1/echo")
        .with_query("b", "two words")
        .with_query("a", "1&2")
        .with_json(&serde_json::json!({ "name": "Jane" }))
        .unwrap();

    let svc = service();
    let echoed: Value = svc
        .fetch(svc.build_request(&endpoint).unwrap())
        .await
        .unwrap();

    assert_eq!(echoed["query"]["a"], "1&2");
    assert_eq!(echoed["query"]["b"], "two words");
    assert_eq!(echoed["content_type"], "application/json");
    let body: Value = serde_json::from_str(echoed["body"].as_str().unwrap()).unwrap();
    assert_eq!(body["name"], "Jane");
}

#[tokio::test]
async fn unreachable_host_is_underlying_error() {
    let svc = service();
    let err = svc
        .fetch::<Value>(
            svc.build_request(&Endpoint::get("http://127.0.0.1:1", "v1/items"))
                .unwrap(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, NetworkError::Underlying(_)));
}

#[test]
fn unbuildable_endpoint_yields_no_request() {
    let svc = service();
    assert!(svc.build_request(&Endpoint::get("not a url", "v1/items")).is_none());
    assert!(svc.request::<Value>(&Endpoint::get("ftp://example.com", "x")).is_none());
}
