//! Request routing built from the device registry
//!
//! One route per (path segment, action) pair plus `/status` and a 404
//! fallback. The routing table is constructed once at startup; handlers
//! close over their registry entry.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use labrelay_core::{Action, DeviceEntry, DeviceRegistry};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::bank::GpioBank;
use crate::link::Link;

/// Shared router state.
///
/// The bank sits behind a mutex so exactly one request mutates the
/// lines at a time; the link is immutable after bring-up.
#[derive(Clone)]
pub struct RouterState {
    pub bank: Arc<Mutex<GpioBank>>,
    pub link: Arc<Link>,
}

/// Build the routing table from the registry.
pub fn build_router(registry: &DeviceRegistry, state: RouterState) -> Router {
    let mut router = Router::new();

    for entry in registry.entries() {
        for action in [Action::On, Action::Off] {
            let path = format!("/{}/{}", entry.segment(), action);
            let entry = entry.clone();
            router = router.route(
                &path,
                get(move |State(state): State<RouterState>| {
                    let entry = entry.clone();
                    async move { device_handler(state, entry, action).await }
                }),
            );
        }
    }

    router
        .route("/status", get(status_handler))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Drive one device's line and acknowledge with its label.
async fn device_handler(
    state: RouterState,
    entry: DeviceEntry,
    action: Action,
) -> impl IntoResponse {
    let level = {
        let mut bank = state.bank.lock().await;
        bank.apply(&entry, action)
    };
    debug!(device = %entry.name, level = ?level, "Request handled");
    (
        StatusCode::OK,
        format!("{} {}", entry.label(), action.as_str().to_uppercase()),
    )
}

/// Report serving status and the controller's address.
async fn status_handler(State(state): State<RouterState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        format!("OK\nIP: {}", state.link.address),
    )
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
