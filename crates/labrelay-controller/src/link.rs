//! Network link bring-up
//!
//! The reference controller joins its network once at startup with a
//! bounded wait. Here that is a bounded poll for a routable local
//! address; on timeout the service keeps serving on the bind address
//! rather than blocking forever.

use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Link state entered once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    TimedOut,
}

/// Outcome of link bring-up, reported on `/status`.
#[derive(Debug, Clone)]
pub struct Link {
    pub state: ConnectionState,
    /// Best-known local address (falls back to the bind address)
    pub address: String,
}

/// Wait up to `wait` for a routable local IPv4 address.
///
/// Timing out is not fatal: the service serves on whatever
/// connectivity exists, so the link state degrades to `TimedOut` and
/// the bind address stands in for the real one.
pub async fn bring_up(wait: Duration, poll: Duration, fallback: &str) -> Link {
    let mut state = ConnectionState::Disconnected;
    info!(state = ?state, wait_secs = wait.as_secs(), "Bringing up network link");
    state = ConnectionState::Connecting;
    info!(state = ?state, "Waiting for a routable address");
    let deadline = Instant::now() + wait;

    loop {
        if let Some(ip) = routable_ipv4() {
            info!(ip = %ip, "Network link up");
            return Link {
                state: ConnectionState::Connected,
                address: ip.to_string(),
            };
        }
        if Instant::now() >= deadline {
            warn!(
                wait_secs = wait.as_secs(),
                "No routable address within the wait bound, serving offline"
            );
            return Link {
                state: ConnectionState::TimedOut,
                address: fallback.to_string(),
            };
        }
        tokio::time::sleep(poll).await;
    }
}

/// First non-loopback IPv4 address on any interface.
fn routable_ipv4() -> Option<Ipv4Addr> {
    use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};

    NetworkInterface::show()
        .unwrap_or_default()
        .into_iter()
        .find_map(|iface| {
            iface.addr.iter().find_map(|addr| match addr {
                Addr::V4(v4) if !v4.ip.is_loopback() => Some(v4.ip),
                _ => None,
            })
        })
}
