//! Notification decision engine.
//!
//! Consumes a [`crate::snapshot::Snapshot`] plus a trigger event, computes
//! the next state, decides whether to show or hide the notification, and
//! computes the next poll instant using per-state exponential backoff.

mod engine;
mod state;

pub use engine::{Decision, NotificationAction, NotifierEngine, Tuning};
pub use state::{EngineState, NotifierState, TriggerEvent, STATE_VERSION};
