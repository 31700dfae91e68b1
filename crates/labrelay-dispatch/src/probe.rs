//! Controller reachability probe

use tracing::{debug, warn};

use crate::client::DispatchClient;

/// Result of a reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Reachable,
    Unreachable,
}

impl DispatchClient {
    /// Single bounded request to the controller's status endpoint.
    ///
    /// No retry; this is a pre-flight diagnostic, not part of the
    /// command path.
    pub async fn check(&self) -> Probe {
        let url = self.status_url();
        match self.client_ref().get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                let body = response.text().await.unwrap_or_default();
                debug!(status = %body.trim(), "Controller reachable");
                Probe::Reachable
            }
            Ok(response) => {
                warn!(status = %response.status(), "Controller returned unexpected status");
                Probe::Unreachable
            }
            Err(e) => {
                warn!(error = %e, "Controller unreachable");
                Probe::Unreachable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DispatchConfig;
    use crate::retry::RetryPolicy;
    use axum::routing::get;
    use axum::Router;
    use labrelay_core::DeviceRegistry;
    use std::time::Duration;

    async fn client_for(addr: String) -> DispatchClient {
        DispatchClient::new(
            DeviceRegistry::reference(),
            DispatchConfig {
                controller: addr,
                timeout: Duration::from_secs(2),
                retry: RetryPolicy::default(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_reachable() {
        let router = Router::new().route("/status", get(|| async { "OK\nIP: 127.0.0.1" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = client_for(addr).await;
        assert_eq!(client.check().await, Probe::Reachable);
    }

    #[tokio::test]
    async fn test_unreachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let client = client_for(addr).await;
        assert_eq!(client.check().await, Probe::Unreachable);
    }
}
