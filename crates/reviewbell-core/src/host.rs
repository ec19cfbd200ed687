use chrono::{DateTime, Utc};

/// The platform callbacks the decision engine drives. Implemented by the
/// surrounding layer (terminal renderer, OS notification area, test
/// recorders).
pub trait HostAdapter: Send + Sync {
    /// Show or update the pending-reviews notification. Idempotent: may be
    /// called repeatedly with an updated count.
    fn show_notification(&self, review_count: u32) -> Result<(), Box<dyn std::error::Error>>;

    /// Idempotent.
    fn hide_notification(&self) -> Result<(), Box<dyn std::error::Error>>;

    /// Arm the platform wake-up for `at`, carrying the serialized engine
    /// state. The platform must deliver the payload back to the engine's
    /// entry point at-or-after that time, surviving process termination.
    fn schedule_wakeup(
        &self,
        at: DateTime<Utc>,
        payload: &str,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
