//! Device registry mapping logical names to endpoints and pins

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate device name: {0}")]
    DuplicateName(String),
    #[error("Duplicate path segment: {0}")]
    DuplicateSegment(String),
    #[error("Registry is empty")]
    Empty,
}

/// One controllable device: logical name, URL path segment, and wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    /// Logical name matched against recognized speech
    pub name: String,
    /// URL path segment on the controller (`/{segment}/on`)
    #[serde(default)]
    pub path_segment: Option<String>,
    /// GPIO pin number driving the relay channel
    pub pin: u8,
    /// Relay energized by a LOW level (relay module convention)
    #[serde(default)]
    pub active_low: bool,
    /// Human-readable name used in acknowledgement text
    #[serde(default)]
    pub label: Option<String>,
}

impl DeviceEntry {
    pub fn new(name: &str, pin: u8, active_low: bool) -> Self {
        Self {
            name: name.to_string(),
            path_segment: None,
            pin,
            active_low,
            label: None,
        }
    }

    /// Path segment, defaulting to the device name.
    pub fn segment(&self) -> &str {
        self.path_segment.as_deref().unwrap_or(&self.name)
    }

    /// Acknowledgement label, derived from the name when not configured.
    ///
    /// Short names ("led") read as initialisms and are upper-cased;
    /// longer names get a leading capital ("light" -> "Light").
    pub fn label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        if self.name.len() <= 3 {
            self.name.to_uppercase()
        } else {
            let mut chars = self.name.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        }
    }
}

/// Ordered, immutable set of controllable devices.
///
/// Declaration order is significant: it is the parser's tie-break order
/// and the order bulk dispatch outcomes are reported in. Built through
/// [`DeviceRegistry::new`] so uniqueness is always validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRegistry {
    devices: Vec<DeviceEntry>,
}

impl DeviceRegistry {
    /// Build a registry, validating name and segment uniqueness.
    pub fn new(devices: Vec<DeviceEntry>) -> Result<Self, RegistryError> {
        if devices.is_empty() {
            return Err(RegistryError::Empty);
        }
        for (i, d) in devices.iter().enumerate() {
            for other in &devices[..i] {
                if other.name == d.name {
                    return Err(RegistryError::DuplicateName(d.name.clone()));
                }
                if other.segment() == d.segment() {
                    return Err(RegistryError::DuplicateSegment(d.segment().to_string()));
                }
            }
        }
        Ok(Self { devices })
    }

    /// Reference lab wiring: onboard LED plus three relay channels.
    pub fn reference() -> Self {
        Self {
            devices: vec![
                DeviceEntry::new("led", 2, false),
                DeviceEntry::new("light", 32, true),
                DeviceEntry::new("fan", 33, true),
                DeviceEntry::new("projector", 25, true),
            ],
        }
    }

    pub fn entries(&self) -> &[DeviceEntry] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Look up a device by logical name.
    pub fn get(&self, name: &str) -> Option<&DeviceEntry> {
        self.devices.iter().find(|d| d.name == name)
    }

    /// Look up a device by URL path segment.
    pub fn by_segment(&self, segment: &str) -> Option<&DeviceEntry> {
        self.devices.iter().find(|d| d.segment() == segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_registry() {
        let reg = DeviceRegistry::reference();
        assert_eq!(reg.len(), 4);
        assert_eq!(reg.get("light").unwrap().pin, 32);
        assert!(reg.get("light").unwrap().active_low);
        assert!(!reg.get("led").unwrap().active_low);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let devices = vec![
            DeviceEntry::new("fan", 33, true),
            DeviceEntry::new("fan", 25, true),
        ];
        assert_eq!(
            DeviceRegistry::new(devices),
            Err(RegistryError::DuplicateName("fan".to_string()))
        );
    }

    #[test]
    fn test_duplicate_segment_rejected() {
        let mut a = DeviceEntry::new("light", 32, true);
        a.path_segment = Some("lamp".to_string());
        let mut b = DeviceEntry::new("desk lamp", 25, true);
        b.path_segment = Some("lamp".to_string());
        assert_eq!(
            DeviceRegistry::new(vec![a, b]),
            Err(RegistryError::DuplicateSegment("lamp".to_string()))
        );
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(DeviceRegistry::new(vec![]), Err(RegistryError::Empty));
    }

    #[test]
    fn test_labels() {
        let reg = DeviceRegistry::reference();
        assert_eq!(reg.get("led").unwrap().label(), "LED");
        assert_eq!(reg.get("light").unwrap().label(), "Light");
        assert_eq!(reg.get("projector").unwrap().label(), "Projector");
    }

    #[test]
    fn test_segment_defaults_to_name() {
        let entry = DeviceEntry::new("fan", 33, true);
        assert_eq!(entry.segment(), "fan");
    }
}
