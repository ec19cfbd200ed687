use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

/// Payload format version carried inside every scheduled wake-up.
pub const STATE_VERSION: u32 = 1;

/// The four real engine states. The pseudo-state before the first sample is
/// `EngineState { state: None, .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierState {
    NoReviews,
    TooFewReviews,
    ReviewsAvailable,
    Error,
}

/// Why the engine is being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    /// First run after boot or reset.
    Initial,
    /// A previously scheduled wake-up fired.
    Solicited,
    /// Opportunistic, e.g. connectivity changed. A failed unsolicited poll
    /// must not count against the backoff sequence.
    Unsolicited,
    /// The user interacted with the shown notification.
    Tap,
}

/// Engine state handed off by value between invocations, serialized into
/// the wake-up payload so the next trigger can reconstruct the engine with
/// no other storage.
///
/// Every field defaults: a payload written by an older build, or a missing
/// or corrupt one, deserializes to something usable. `state == None` means
/// first boot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub state: Option<NotifierState>,
    /// The previous sample, used only to detect activity (count decreasing)
    /// while `ReviewsAvailable`.
    #[serde(default)]
    pub last_snapshot: Option<Snapshot>,
    /// The delay just issued, in whole minutes. `0` means no backoff
    /// accumulated: the next schedule call starts from the base interval.
    #[serde(default)]
    pub backoff_min: u64,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            state: None,
            last_snapshot: None,
            backoff_min: 0,
        }
    }
}

impl EngineState {
    /// Serialize for the wake-up payload.
    pub fn to_payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Reconstruct from a wake-up payload. Total: a malformed or missing
    /// payload is treated as first boot, never as an error.
    pub fn from_payload(payload: &str) -> Self {
        serde_json::from_str(payload).unwrap_or_default()
    }

    pub fn is_first_boot(&self) -> bool {
        self.state.is_none()
    }
}
