//! Trigger entry points and dispatch.
//!
//! Every external trigger (boot, connectivity change, scheduled wake-up,
//! user tap) runs the same sequence: fetch a snapshot, feed it through the
//! engine with the matching event, apply the notification action, arm
//! exactly one new wake-up carrying the serialized state. Evaluations are
//! serialized behind an async mutex; two interleaved runs would corrupt
//! the backoff sequence.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::client::ReviewSource;
use crate::error::CoreError;
use crate::host::HostAdapter;
use crate::notifier::{Decision, EngineState, NotificationAction, NotifierEngine, TriggerEvent, Tuning};

pub struct NotifierService<S: ReviewSource> {
    engine: NotifierEngine,
    source: S,
    host: Arc<dyn HostAdapter>,
    /// Reviews-available count at/above which a notification is warranted.
    /// User configuration; supplied on construction, not owned by the
    /// engine.
    threshold: u32,
    state: Mutex<EngineState>,
}

impl<S: ReviewSource> NotifierService<S> {
    pub fn new(tuning: Tuning, threshold: u32, source: S, host: Arc<dyn HostAdapter>) -> Self {
        Self {
            engine: NotifierEngine::new(tuning),
            source,
            host,
            threshold,
            state: Mutex::new(EngineState::default()),
        }
    }

    /// First run after process start.
    pub async fn on_boot(&self) -> Result<Decision, CoreError> {
        self.evaluate(TriggerEvent::Initial, None).await
    }

    /// Opportunistic re-evaluation, e.g. connectivity came back.
    pub async fn on_connectivity_change(&self) -> Result<Decision, CoreError> {
        self.evaluate(TriggerEvent::Unsolicited, None).await
    }

    /// A previously scheduled wake-up fired. `payload` is whatever the
    /// platform carried back; a malformed payload reconstructs as first
    /// boot rather than failing.
    pub async fn on_scheduled_wakeup(&self, payload: &str) -> Result<Decision, CoreError> {
        self.evaluate(TriggerEvent::Solicited, Some(EngineState::from_payload(payload)))
            .await
    }

    /// The user interacted with the shown notification.
    pub async fn on_user_tap(&self) -> Result<Decision, CoreError> {
        self.evaluate(TriggerEvent::Tap, None).await
    }

    /// Hide the notification and forget all accumulated state. Used when
    /// notifications are disabled or credentials change.
    pub async fn reset(&self) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        *state = EngineState::default();
        self.host
            .hide_notification()
            .map_err(|e| CoreError::Host(e.to_string()))
    }

    pub async fn current_state(&self) -> EngineState {
        self.state.lock().await.clone()
    }

    async fn evaluate(
        &self,
        event: TriggerEvent,
        restored: Option<EngineState>,
    ) -> Result<Decision, CoreError> {
        // Hold the lock across the fetch: the snapshot must drive exactly
        // one transition against the state it was sampled under.
        let mut state = self.state.lock().await;
        if let Some(restored) = restored {
            *state = restored;
        }

        let snapshot = self.source.fetch_summary().await;
        let decision = self
            .engine
            .next(event, self.threshold, &snapshot, &state, Utc::now());

        // Visibility changes are idempotent; a failure here is absorbed
        // and retried on the next cycle.
        match decision.action {
            NotificationAction::Show(count) => {
                let _ = self.host.show_notification(count);
            }
            NotificationAction::Hide => {
                let _ = self.host.hide_notification();
            }
            NotificationAction::Keep => {}
        }

        // Losing the wake-up chain is fatal to the subsystem, so this is
        // the one host failure that propagates.
        self.host
            .schedule_wakeup(decision.wake_at, &decision.state.to_payload())
            .map_err(|e| CoreError::Host(e.to_string()))?;

        *state = decision.state.clone();
        Ok(decision)
    }
}
