//! Dispatch client turning intents into controller requests

use anyhow::{Context, Result};
use labrelay_core::{Action, DeviceEntry, DeviceRegistry, DispatchErrorKind, DispatchOutcome, Intent, Target};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::retry::RetryPolicy;

/// Default controller address (reference lab wiring).
pub const DEFAULT_CONTROLLER: &str = "192.168.0.172";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Dispatch configuration.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Controller address (`host` or `host:port`)
    pub controller: String,
    /// Bound on each individual request
    pub timeout: Duration,
    /// Retry schedule for transient failures
    pub retry: RetryPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            controller: DEFAULT_CONTROLLER.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// HTTP client for the controller, shared across all requests.
#[derive(Clone)]
pub struct DispatchClient {
    client: reqwest::Client,
    registry: DeviceRegistry,
    config: DispatchConfig,
}

impl DispatchClient {
    /// Create a client with a session-wide timeout.
    pub fn new(registry: DeviceRegistry, config: DispatchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            registry,
            config,
        })
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    fn device_url(&self, segment: &str, action: Action) -> String {
        format!("http://{}/{}/{}", self.config.controller, segment, action)
    }

    pub(crate) fn status_url(&self) -> String {
        format!("http://{}/status", self.config.controller)
    }

    pub(crate) fn client_ref(&self) -> &reqwest::Client {
        &self.client
    }

    /// Deliver an intent, returning one outcome per affected device.
    ///
    /// A single-device intent yields one outcome. An `All` intent fans
    /// out to every registry entry independently; one device failing
    /// does not block or cancel the others, and the outcome list always
    /// covers the whole registry, in declaration order.
    pub async fn dispatch(&self, intent: &Intent) -> Vec<DispatchOutcome> {
        match &intent.target {
            Target::Device(name) => {
                let outcome = match self.registry.get(name) {
                    Some(entry) => self.send_action(entry, intent.action).await,
                    None => DispatchOutcome::failure(
                        name,
                        0,
                        DispatchErrorKind::UnknownDevice(name.clone()),
                    ),
                };
                vec![outcome]
            }
            Target::All => self.fan_out(intent.action).await,
        }
    }

    /// Issue one request per registry entry with bounded concurrency.
    async fn fan_out(&self, action: Action) -> Vec<DispatchOutcome> {
        info!(action = %action, devices = self.registry.len(), "Bulk dispatch");

        let mut tasks = JoinSet::new();
        for (idx, entry) in self.registry.entries().iter().enumerate() {
            let client = self.clone();
            let entry = entry.clone();
            tasks.spawn(async move { (idx, client.send_action(&entry, action).await) });
        }

        let mut indexed = Vec::with_capacity(self.registry.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(pair) => indexed.push(pair),
                Err(e) => warn!(error = %e, "Dispatch worker did not complete"),
            }
        }

        complete_outcomes(&self.registry, indexed)
    }

    /// Send one device action under the retry policy.
    async fn send_action(&self, entry: &DeviceEntry, action: Action) -> DispatchOutcome {
        let url = self.device_url(entry.segment(), action);
        debug!(device = %entry.name, url = %url, "Dispatching");

        let (attempts, result) = self.config.retry.run(|| self.try_get(&url)).await;

        match result {
            Ok(()) => {
                info!(device = %entry.name, action = %action, attempts, "Command acknowledged");
                DispatchOutcome::success(&entry.name, attempts)
            }
            Err(kind) => {
                warn!(device = %entry.name, action = %action, attempts, error = %kind, "Command failed");
                DispatchOutcome::failure(&entry.name, attempts, kind)
            }
        }
    }

    /// One GET attempt, classified into the dispatch error taxonomy.
    async fn try_get(&self, url: &str) -> Result<(), DispatchErrorKind> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if status.is_success() {
            let ack = response
                .text()
                .await
                .map_err(|_| DispatchErrorKind::MalformedResponse)?;
            debug!(url = %url, ack = %ack.trim(), "Controller acknowledgement");
            Ok(())
        } else if status.is_server_error() {
            Err(DispatchErrorKind::ServerError(status.as_u16()))
        } else if status.is_client_error() {
            Err(DispatchErrorKind::Rejected(status.as_u16()))
        } else {
            Err(DispatchErrorKind::MalformedResponse)
        }
    }
}

/// Order collected fan-out outcomes by registry declaration and fill
/// in a failure for any entry whose worker produced none, keeping the
/// one-outcome-per-entry invariant even if a worker dies.
fn complete_outcomes(
    registry: &DeviceRegistry,
    mut indexed: Vec<(usize, DispatchOutcome)>,
) -> Vec<DispatchOutcome> {
    if indexed.len() < registry.len() {
        for (idx, entry) in registry.entries().iter().enumerate() {
            if !indexed.iter().any(|(i, _)| *i == idx) {
                warn!(device = %entry.name, "No outcome from dispatch worker, reporting failure");
                indexed.push((
                    idx,
                    DispatchOutcome::failure(&entry.name, 0, DispatchErrorKind::WorkerFailed),
                ));
            }
        }
    }
    indexed.sort_by_key(|(idx, _)| *idx);
    indexed.into_iter().map(|(_, outcome)| outcome).collect()
}

fn classify_request_error(e: reqwest::Error) -> DispatchErrorKind {
    if e.is_timeout() {
        DispatchErrorKind::Timeout
    } else {
        DispatchErrorKind::Connect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Serve a router on an ephemeral local port, returning its address.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr.to_string()
    }

    fn test_client(registry: DeviceRegistry, controller: String) -> DispatchClient {
        DispatchClient::new(
            registry,
            DispatchConfig {
                controller,
                timeout: Duration::from_secs(2),
                retry: RetryPolicy {
                    budget: 3,
                    base_backoff: Duration::from_millis(1),
                },
            },
        )
        .unwrap()
    }

    fn single_intent(name: &str, action: Action) -> Intent {
        Intent {
            target: Target::Device(name.to_string()),
            action,
        }
    }

    #[tokio::test]
    async fn test_single_dispatch_success() {
        let router = Router::new().route("/light/on", get(|| async { "Light ON" }));
        let addr = serve(router).await;
        let client = test_client(DeviceRegistry::reference(), addr);

        let outcomes = client.dispatch(&single_intent("light", Action::On)).await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].succeeded);
        assert_eq!(outcomes[0].device, "light");
        assert_eq!(outcomes[0].attempts, 1);
    }

    #[tokio::test]
    async fn test_transient_then_success() {
        // Fails with 503 twice, then acknowledges
        let hits = Arc::new(AtomicU32::new(0));
        let router = Router::new()
            .route(
                "/light/on",
                get(|State(hits): State<Arc<AtomicU32>>| async move {
                    if hits.fetch_add(1, Ordering::SeqCst) < 2 {
                        (StatusCode::SERVICE_UNAVAILABLE, "busy")
                    } else {
                        (StatusCode::OK, "Light ON")
                    }
                }),
            )
            .with_state(hits.clone());
        let addr = serve(router).await;
        let client = test_client(DeviceRegistry::reference(), addr);

        let outcomes = client.dispatch(&single_intent("light", Action::On)).await;
        assert!(outcomes[0].succeeded);
        assert_eq!(outcomes[0].attempts, 3);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejected_not_retried() {
        // No routes: every path 404s
        let addr = serve(Router::new()).await;
        let client = test_client(DeviceRegistry::reference(), addr);

        let outcomes = client.dispatch(&single_intent("fan", Action::Off)).await;
        assert!(!outcomes[0].succeeded);
        assert_eq!(outcomes[0].attempts, 1);
        assert_eq!(outcomes[0].error, Some(DispatchErrorKind::Rejected(404)));
    }

    #[tokio::test]
    async fn test_connect_failure_exhausts_budget() {
        // Nothing listening on this port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let client = test_client(DeviceRegistry::reference(), addr);
        let outcomes = client.dispatch(&single_intent("led", Action::On)).await;
        assert!(!outcomes[0].succeeded);
        assert_eq!(outcomes[0].attempts, 3);
        assert_eq!(outcomes[0].error, Some(DispatchErrorKind::Connect));
    }

    #[tokio::test]
    async fn test_unknown_device() {
        let addr = serve(Router::new()).await;
        let client = test_client(DeviceRegistry::reference(), addr);

        let outcomes = client.dispatch(&single_intent("oven", Action::On)).await;
        assert_eq!(outcomes.len(), 1);
        assert!(!outcomes[0].succeeded);
        assert_eq!(outcomes[0].attempts, 0);
        assert_eq!(
            outcomes[0].error,
            Some(DispatchErrorKind::UnknownDevice("oven".to_string()))
        );
    }

    #[test]
    fn test_missing_worker_outcome_backfilled() {
        let registry = DeviceRegistry::reference();
        // Worker for index 2 (fan) died without producing an outcome
        let indexed = vec![
            (3, DispatchOutcome::success("projector", 1)),
            (0, DispatchOutcome::success("led", 1)),
            (1, DispatchOutcome::success("light", 2)),
        ];

        let outcomes = complete_outcomes(&registry, indexed);

        assert_eq!(outcomes.len(), registry.len());
        let names: Vec<&str> = outcomes.iter().map(|o| o.device.as_str()).collect();
        assert_eq!(names, vec!["led", "light", "fan", "projector"]);
        assert!(!outcomes[2].succeeded);
        assert_eq!(outcomes[2].error, Some(DispatchErrorKind::WorkerFailed));
    }

    #[tokio::test]
    async fn test_bulk_partial_failure() {
        // Every off path answers except the fan's
        let router = Router::new()
            .route("/led/off", get(|| async { "LED OFF" }))
            .route("/light/off", get(|| async { "Light OFF" }))
            .route(
                "/fan/off",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "relay fault") }),
            )
            .route("/projector/off", get(|| async { "Projector OFF" }));
        let addr = serve(router).await;
        let client = test_client(DeviceRegistry::reference(), addr);

        let intent = Intent {
            target: Target::All,
            action: Action::Off,
        };
        let outcomes = client.dispatch(&intent).await;

        // One outcome per registry entry, in declaration order
        assert_eq!(outcomes.len(), 4);
        let names: Vec<&str> = outcomes.iter().map(|o| o.device.as_str()).collect();
        assert_eq!(names, vec!["led", "light", "fan", "projector"]);

        assert!(outcomes[0].succeeded);
        assert!(outcomes[1].succeeded);
        assert!(!outcomes[2].succeeded);
        assert_eq!(outcomes[2].error, Some(DispatchErrorKind::ServerError(500)));
        assert_eq!(outcomes[2].attempts, 3);
        assert!(outcomes[3].succeeded);
    }
}
