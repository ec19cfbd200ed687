//! # Reviewbell Core Library
//!
//! Core logic for Reviewbell, a headless notifier for a spaced-repetition
//! service. It decides, without a live connection, when to poll the remote
//! endpoint for pending-review counts and whether to show or hide a status
//! notification, and it keeps working across process death, host deep-sleep
//! and network flakiness.
//!
//! ## Architecture
//!
//! - **Notifier Engine**: a pure state machine -- one `next()` call per
//!   external trigger, no internal threads, wall-clock time injected
//! - **Alarm**: a single-slot wake-up scheduler holding an absolute
//!   wall-clock deadline; the relative timer underneath is best-effort only
//! - **Host Adapter**: the callbacks the engine drives (show/hide
//!   notification, arm the platform wake-up)
//! - **Summary Client**: reqwest-based fetch of the review summary; failures
//!   come back as data, never as errors
//!
//! ## Key Components
//!
//! - [`NotifierEngine`]: the decision engine
//! - [`Alarm`]: deep-sleep-aware wake-up scheduler
//! - [`NotifierService`]: trigger entry points (boot, wake-up, tap, ...)
//! - [`Config`]: TOML-based configuration

pub mod alarm;
pub mod client;
pub mod error;
pub mod host;
pub mod notifier;
pub mod service;
pub mod snapshot;
pub mod storage;

pub use alarm::{Alarm, Clock, SystemClock};
pub use client::{ReviewSource, SummaryClient};
pub use error::CoreError;
pub use host::HostAdapter;
pub use notifier::{
    Decision, EngineState, NotificationAction, NotifierEngine, NotifierState, TriggerEvent, Tuning,
};
pub use service::NotifierService;
pub use snapshot::{ErrorKind, Snapshot};
pub use storage::Config;
