//! Command parsing from recognized speech into structured intents

use serde::{Deserialize, Serialize};

use crate::registry::DeviceRegistry;

/// Requested device action. Always an absolute set, never a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    On,
    Off,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::On => "on",
            Action::Off => "off",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a command: one registered device, or every device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Device(String),
    All,
}

/// Structured representation of one decoded utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub target: Target,
    pub action: Action,
}

/// Words that widen a command to every registered device.
const BULK_MARKERS: &[&str] = &["everything", "all"];

/// Parse recognized text into an intent.
///
/// Returns `None` when the text contains no unambiguous action marker
/// (both "on" and "off", or neither) or no recognizable target. A miss
/// is expected for casual speech and is never an error.
///
/// Matching rules:
/// - text is lower-cased and punctuation-stripped before matching
/// - action and bulk markers match whole words only
/// - device names match as substrings, first registry entry wins
/// - a bulk marker beats any device name also present
pub fn parse(registry: &DeviceRegistry, text: &str) -> Option<Intent> {
    let normalized = normalize(text);
    let tokens: Vec<&str> = normalized.split_whitespace().collect();

    let has_on = tokens.iter().any(|t| *t == "on");
    let has_off = tokens.iter().any(|t| *t == "off");
    let action = match (has_on, has_off) {
        (true, false) => Action::On,
        (false, true) => Action::Off,
        _ => return None,
    };

    if tokens
        .iter()
        .any(|t| BULK_MARKERS.contains(t))
    {
        return Some(Intent {
            target: Target::All,
            action,
        });
    }

    let device = registry
        .entries()
        .iter()
        .find(|d| normalized.contains(d.name.as_str()))?;

    Some(Intent {
        target: Target::Device(device.name.clone()),
        action,
    })
}

/// Lower-case and replace punctuation with spaces.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}
