use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod check;
pub mod config;
pub mod run;
pub mod status;

/// File the daemon mirrors the latest wake-up request into, so `status`
/// works from a separate process.
pub const STATE_FILE: &str = "state.json";

/// On-disk mirror of the daemon's latest wake-up request: the deadline plus
/// the engine-state payload exactly as handed to the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    pub wake_at: DateTime<Utc>,
    pub payload: String,
}
