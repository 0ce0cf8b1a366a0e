//! Canned API responses for offline mode.

use std::time::Duration;

use armature_net::{BoxError, Method, RawResponse, RequestDescriptor, Transport};
use async_trait::async_trait;
use tracing::debug;

use crate::scenes::home::HomeItem;

/// Serves `GET .../items` from a fixed catalogue after a simulated delay;
/// everything else is a 404.
#[derive(Debug, Clone)]
pub struct FixtureTransport {
    delay: Duration,
    items: Vec<HomeItem>,
}

impl FixtureTransport {
    pub fn new(delay: Duration) -> Self {
        Self::with_items(delay, HomeItem::samples())
    }

    pub fn with_items(delay: Duration, items: Vec<HomeItem>) -> Self {
        Self { delay, items }
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn send(&self, request: RequestDescriptor) -> Result<RawResponse, BoxError> {
        tokio::time::sleep(self.delay).await;
        debug!("fixtures: {} {}", request.method, request.url);

        let mut response = if request.method == Method::Get && request.url.path().ends_with("/items") {
            RawResponse::new(200, serde_json::to_vec(&self.items)?)
        } else {
            RawResponse::new(404, "not found")
        };
        response.url = Some(request.url.to_string());
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use armature_net::{Endpoint, NetworkError, NetworkService};
    use std::sync::Arc;

    #[tokio::test]
    async fn serves_items_and_404s() {
        let network = NetworkService::new(Arc::new(FixtureTransport::new(Duration::ZERO)));

        let items: Vec<HomeItem> = network
            .fetch(Endpoint::get("https://offline.invalid", "v1/items").descriptor().unwrap())
            .await
            .unwrap();
        assert_eq!(items.len(), 5);

        let missing = network
            .fetch::<Vec<HomeItem>>(Endpoint::get("https://offline.invalid", "v1/other").descriptor().unwrap())
            .await;
        assert!(matches!(missing, Err(NetworkError::Http { status: 404, .. })));
    }
}
