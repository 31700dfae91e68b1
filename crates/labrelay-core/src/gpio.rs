//! GPIO polarity model and line driver seam
//!
//! Relay modules in the reference wiring are active-low: the coil
//! energizes when the input is pulled LOW. Logical "on" therefore maps
//! to the electrical level that energizes the coil, which depends on
//! the per-device `active_low` flag.

use std::collections::HashMap;

/// Electrical level of a GPIO line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

/// Map a logical on/off to the electrical level for a line.
///
/// Active-low wiring inverts the mapping: ON -> Low, OFF -> High.
/// Active-high wiring is the identity: ON -> High, OFF -> Low.
pub fn level_for(active_low: bool, on: bool) -> Level {
    match (active_low, on) {
        (true, true) | (false, false) => Level::Low,
        (true, false) | (false, true) => Level::High,
    }
}

/// Seam between the router and whatever drives the electrical lines.
///
/// The shipped driver records levels and logs writes; physical wiring
/// sits behind the same trait on real hardware.
pub trait LineDriver: Send {
    /// Configure a pin as an output. Called once per pin at startup,
    /// before any level write.
    fn configure_output(&mut self, pin: u8);

    /// Drive a pin to the given level. Absolute set; writing the level
    /// a line already holds is a no-op electrically.
    fn write(&mut self, pin: u8, level: Level);
}

/// In-memory driver recording the last level driven on each pin.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    configured: Vec<u8>,
    levels: HashMap<u8, Level>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last level driven on a pin, if any.
    pub fn level(&self, pin: u8) -> Option<Level> {
        self.levels.get(&pin).copied()
    }

    /// Whether a pin was configured as an output.
    pub fn is_configured(&self, pin: u8) -> bool {
        self.configured.contains(&pin)
    }
}

impl LineDriver for RecordingDriver {
    fn configure_output(&mut self, pin: u8) {
        tracing::debug!(pin, "Configured pin as output");
        self.configured.push(pin);
    }

    fn write(&mut self, pin: u8, level: Level) {
        tracing::debug!(pin, level = ?level, "GPIO write");
        self.levels.insert(pin, level);
    }
}
