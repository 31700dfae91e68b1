//! Per-device dispatch outcome reporting

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a request to one device failed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchErrorKind {
    #[error("Connection failed")]
    Connect,
    #[error("Request timed out")]
    Timeout,
    #[error("Server error ({0})")]
    ServerError(u16),
    #[error("Rejected by controller ({0})")]
    Rejected(u16),
    #[error("Malformed response")]
    MalformedResponse,
    #[error("Unknown device: {0}")]
    UnknownDevice(String),
    #[error("Dispatch worker failed")]
    WorkerFailed,
}

impl DispatchErrorKind {
    /// Transient failures are retried; the rest are reported after one
    /// attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DispatchErrorKind::Connect
                | DispatchErrorKind::Timeout
                | DispatchErrorKind::ServerError(_)
        )
    }
}

/// Result of dispatching one action to one device.
///
/// A bulk intent yields one outcome per registry entry; partial success
/// across a bulk dispatch is a normal, reportable result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// Logical device name
    pub device: String,
    /// Whether the controller acknowledged the action
    pub succeeded: bool,
    /// Network attempts made, including the successful one
    pub attempts: u32,
    /// Failure classification when `succeeded` is false
    pub error: Option<DispatchErrorKind>,
}

impl DispatchOutcome {
    pub fn success(device: &str, attempts: u32) -> Self {
        Self {
            device: device.to_string(),
            succeeded: true,
            attempts,
            error: None,
        }
    }

    pub fn failure(device: &str, attempts: u32, error: DispatchErrorKind) -> Self {
        Self {
            device: device.to_string(),
            succeeded: false,
            attempts,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(DispatchErrorKind::Connect.is_transient());
        assert!(DispatchErrorKind::Timeout.is_transient());
        assert!(DispatchErrorKind::ServerError(503).is_transient());
        assert!(!DispatchErrorKind::Rejected(404).is_transient());
        assert!(!DispatchErrorKind::MalformedResponse.is_transient());
        assert!(!DispatchErrorKind::UnknownDevice("oven".into()).is_transient());
        assert!(!DispatchErrorKind::WorkerFailed.is_transient());
    }

    #[test]
    fn test_outcome_constructors() {
        let ok = DispatchOutcome::success("light", 3);
        assert!(ok.succeeded);
        assert_eq!(ok.attempts, 3);
        assert!(ok.error.is_none());

        let failed = DispatchOutcome::failure("fan", 1, DispatchErrorKind::Rejected(404));
        assert!(!failed.succeeded);
        assert_eq!(failed.error, Some(DispatchErrorKind::Rejected(404)));
    }
}
