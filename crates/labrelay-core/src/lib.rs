//! Labrelay Core - Shared types for voice-driven relay control
//!
//! This crate provides the foundational types for the Labrelay system:
//! - Device registry mapping logical names to endpoints and GPIO pins
//! - Command parsing from recognized speech into structured intents
//! - Dispatch outcome reporting for single and bulk commands
//! - GPIO polarity model for active-low relay wiring

pub mod gpio;
pub mod intent;
pub mod outcome;
pub mod registry;

pub use gpio::{level_for, Level, LineDriver, RecordingDriver};
pub use intent::{parse, Action, Intent, Target};
pub use outcome::{DispatchErrorKind, DispatchOutcome};
pub use registry::{DeviceEntry, DeviceRegistry, RegistryError};
