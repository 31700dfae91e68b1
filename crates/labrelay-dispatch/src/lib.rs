//! Labrelay Dispatch - HTTP delivery of device intents
//!
//! This crate turns a parsed [`Intent`](labrelay_core::Intent) into one
//! or more GET requests against the controller, with bounded
//! retry/backoff for transient failures and best-effort fan-out for
//! bulk commands.

pub mod client;
pub mod probe;
pub mod retry;

pub use client::{DispatchClient, DispatchConfig, DEFAULT_CONTROLLER, DEFAULT_TIMEOUT};
pub use probe::Probe;
pub use retry::RetryPolicy;
