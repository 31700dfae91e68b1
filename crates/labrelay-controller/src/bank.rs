//! GPIO bank: one line per registered device

use labrelay_core::{level_for, Action, DeviceEntry, DeviceRegistry, Level, LineDriver};
use tracing::info;

/// Owns every GPIO line and the driver behind them.
///
/// The bank is the only writer of the lines; the router serializes
/// access so no two requests touch a line concurrently. No logical
/// device state is kept between requests: every apply is an absolute
/// set derived from the request alone.
pub struct GpioBank {
    registry: DeviceRegistry,
    driver: Box<dyn LineDriver>,
}

impl GpioBank {
    pub fn new(registry: DeviceRegistry, driver: Box<dyn LineDriver>) -> Self {
        Self { registry, driver }
    }

    /// Configure every pin as an output and drive it logically OFF.
    ///
    /// Runs before the listener starts so devices never come up "on"
    /// after a cold boot or a brief power loss.
    pub fn init(&mut self) {
        for entry in self.registry.entries() {
            self.driver.configure_output(entry.pin);
            let off = level_for(entry.active_low, false);
            self.driver.write(entry.pin, off);
        }
        info!(lines = self.registry.len(), "GPIO bank initialized, all devices off");
    }

    /// Drive one device's line for the requested action.
    ///
    /// Returns the electrical level written. Idempotent: repeating the
    /// same action re-drives the same level.
    pub fn apply(&mut self, entry: &DeviceEntry, action: Action) -> Level {
        let on = matches!(action, Action::On);
        let level = level_for(entry.active_low, on);
        self.driver.write(entry.pin, level);
        info!(
            device = %entry.name,
            pin = entry.pin,
            action = %action,
            level = ?level,
            "Relay line driven"
        );
        level
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }
}
