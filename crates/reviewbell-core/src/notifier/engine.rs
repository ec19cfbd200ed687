//! Decision engine implementation.
//!
//! The engine is a pure function over wall-clock time: `next()` takes the
//! trigger event, the fresh snapshot, the prior persisted state and `now`,
//! and returns the new state plus side effects. No internal threads, no
//! interior mutability -- the caller persists the returned state and arms
//! the single wake-up.
//!
//! ## State Transitions
//!
//! Every call re-evaluates `classify()` independently; any state can go to
//! any other state on the next sample. There is no terminal state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::state::{EngineState, NotifierState, TriggerEvent, STATE_VERSION};
use crate::snapshot::{ErrorKind, Snapshot};

/// Poll interval tuning. Whole minutes throughout; part of the TOML config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuning {
    /// Wait when there are no reviews and `next_review_at` is unknown.
    #[serde(default = "default_idle_min")]
    pub idle_min: u64,
    /// Added to a future `next_review_at` to absorb clock skew with the
    /// server.
    #[serde(default = "default_skew_tolerance_min")]
    pub skew_tolerance_min: u64,
    /// Retry when the server claims reviews are already due but the count
    /// is still zero (client/server clock disagreement).
    #[serde(default = "default_clock_retry_min")]
    pub clock_retry_min: u64,
    #[serde(default = "default_too_few_base_min")]
    pub too_few_base_min: u64,
    #[serde(default = "default_too_few_cap_min")]
    pub too_few_cap_min: u64,
    #[serde(default = "default_reviews_base_min")]
    pub reviews_base_min: u64,
    #[serde(default = "default_reviews_cap_min")]
    pub reviews_cap_min: u64,
    /// Short poll while the user is actively clearing the queue.
    #[serde(default = "default_reviewing_min")]
    pub reviewing_min: u64,
    #[serde(default = "default_error_base_min")]
    pub error_base_min: u64,
    /// Also the fixed retry interval for auth failures.
    #[serde(default = "default_error_cap_min")]
    pub error_cap_min: u64,
}

fn default_idle_min() -> u64 {
    60
}
fn default_skew_tolerance_min() -> u64 {
    5
}
fn default_clock_retry_min() -> u64 {
    5
}
fn default_too_few_base_min() -> u64 {
    10
}
fn default_too_few_cap_min() -> u64 {
    60
}
fn default_reviews_base_min() -> u64 {
    30
}
fn default_reviews_cap_min() -> u64 {
    240
}
fn default_reviewing_min() -> u64 {
    5
}
fn default_error_base_min() -> u64 {
    5
}
fn default_error_cap_min() -> u64 {
    360
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            idle_min: default_idle_min(),
            skew_tolerance_min: default_skew_tolerance_min(),
            clock_retry_min: default_clock_retry_min(),
            too_few_base_min: default_too_few_base_min(),
            too_few_cap_min: default_too_few_cap_min(),
            reviews_base_min: default_reviews_base_min(),
            reviews_cap_min: default_reviews_cap_min(),
            reviewing_min: default_reviewing_min(),
            error_base_min: default_error_base_min(),
            error_cap_min: default_error_cap_min(),
        }
    }
}

/// Zero or one visibility change per transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    /// Show or update the notification with the current count. Idempotent.
    Show(u32),
    /// Hide the notification. Idempotent.
    Hide,
    /// Leave whatever is currently shown untouched (error states make no
    /// visibility change).
    Keep,
}

/// Result of one transition: the state to persist, the visibility change,
/// and the single next wake-up instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub state: EngineState,
    pub action: NotificationAction,
    pub wake_at: DateTime<Utc>,
}

/// The notifier decision engine. Stateless apart from its tuning; all
/// mutable state travels through [`EngineState`].
#[derive(Debug, Clone, Default)]
pub struct NotifierEngine {
    tuning: Tuning,
}

impl NotifierEngine {
    pub fn new(tuning: Tuning) -> Self {
        Self { tuning }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Classify a snapshot against the notification threshold.
    pub fn classify(snapshot: &Snapshot, threshold: u32) -> NotifierState {
        if snapshot.error.is_some() {
            NotifierState::Error
        } else if snapshot.reviews_available >= threshold {
            NotifierState::ReviewsAvailable
        } else if snapshot.reviews_available > 0 {
            NotifierState::TooFewReviews
        } else {
            NotifierState::NoReviews
        }
    }

    /// Run one transition. Never fails: fetch failures arrive as data in
    /// the snapshot and are handled by the `Error` state's own backoff.
    pub fn next(
        &self,
        event: TriggerEvent,
        threshold: u32,
        snapshot: &Snapshot,
        prior: &EngineState,
        now: DateTime<Utc>,
    ) -> Decision {
        let state = Self::classify(snapshot, threshold);
        // Fresh entry: the new state differs from the state entered by the
        // last transition that actually ran.
        let fresh = prior.state != Some(state);
        let t = &self.tuning;

        let (action, wake_at, backoff_min) = match state {
            NotifierState::NoReviews => {
                let wake_at = match snapshot.next_review_at {
                    Some(at) if at > now => at + minutes(t.skew_tolerance_min),
                    // Server says reviews are due yet the count is zero:
                    // clocks disagree, retry shortly.
                    Some(_) => now + minutes(t.clock_retry_min),
                    None => now + minutes(t.idle_min),
                };
                // Absolute deadlines and fixed waits are not part of the
                // backoff sequence.
                (NotificationAction::Hide, wake_at, 0)
            }
            NotifierState::TooFewReviews => {
                let delay = backoff(t.too_few_base_min, t.too_few_cap_min, fresh, prior.backoff_min);
                (NotificationAction::Hide, now + minutes(delay), delay)
            }
            NotifierState::ReviewsAvailable => {
                if self.activity_detected(fresh, prior, snapshot) || event == TriggerEvent::Tap {
                    // The user is working through the queue: stay quiet,
                    // poll fast, and restart the backoff sequence so the
                    // next show begins at the base interval.
                    (NotificationAction::Hide, now + minutes(t.reviewing_min), 0)
                } else {
                    let delay =
                        backoff(t.reviews_base_min, t.reviews_cap_min, fresh, prior.backoff_min);
                    (
                        NotificationAction::Show(snapshot.reviews_available),
                        now + minutes(delay),
                        delay,
                    )
                }
            }
            NotifierState::Error => {
                let delay = self.error_delay(event, fresh, prior, snapshot);
                (NotificationAction::Keep, now + minutes(delay), delay)
            }
        };

        Decision {
            state: EngineState {
                version: STATE_VERSION,
                state: Some(state),
                last_snapshot: Some(snapshot.clone()),
                backoff_min,
            },
            action,
            wake_at,
        }
    }

    /// True iff the queue shrank between two consecutive valid samples
    /// while remaining in `ReviewsAvailable`.
    fn activity_detected(&self, fresh: bool, prior: &EngineState, snapshot: &Snapshot) -> bool {
        !fresh
            && prior.last_snapshot.as_ref().is_some_and(|last| {
                last.error.is_none() && snapshot.reviews_available < last.reviews_available
            })
    }

    fn error_delay(
        &self,
        event: TriggerEvent,
        fresh: bool,
        prior: &EngineState,
        snapshot: &Snapshot,
    ) -> u64 {
        let t = &self.tuning;
        if snapshot.error == Some(ErrorKind::Auth) {
            // Retrying faster won't help until credentials change: pinned
            // at the cap from the first occurrence on.
            return t.error_cap_min;
        }
        let kind_changed = prior.last_snapshot.as_ref().and_then(|s| s.error) != snapshot.error;
        if event == TriggerEvent::Unsolicited && !fresh && !kind_changed && prior.backoff_min > 0 {
            // Opportunistic poll: a failure must not escalate the backoff.
            return prior.backoff_min.min(t.error_cap_min);
        }
        backoff(t.error_base_min, t.error_cap_min, fresh || kind_changed, prior.backoff_min)
    }
}

/// Shared backoff primitive: base interval on fresh entry or after an
/// explicit reset, otherwise double-and-cap.
fn backoff(base: u64, cap: u64, fresh: bool, prior: u64) -> u64 {
    if fresh || prior == 0 {
        base
    } else {
        prior.saturating_mul(2).min(cap)
    }
}

/// Longest delay a tuning value can produce. Keeps absurd config values
/// from turning into negative durations or overflowing date arithmetic.
const MAX_DELAY_MIN: i64 = 366 * 24 * 60;

fn minutes(m: u64) -> Duration {
    Duration::minutes(i64::try_from(m).unwrap_or(MAX_DELAY_MIN).min(MAX_DELAY_MIN))
}
