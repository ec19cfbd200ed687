//! Single-slot wake-up scheduler.
//!
//! Ordinary relative timers stop counting down while the host is suspended;
//! only a wall-clock deadline survives suspension. The alarm therefore
//! always stores an absolute deadline and treats the tokio sleep underneath
//! purely as a best-effort "wake me earlier if still running" mechanism.
//! [`Alarm::on_wake`] re-synchronizes against the wall clock and should be
//! called on every plausible wake event; spurious calls are no-ops.
//!
//! A monotonically increasing request token replaces callback-identity
//! checks: `schedule()` and `cancel()` bump it, and a fired timer task
//! validates its captured token before invoking, so a stale timer can never
//! fire a replaced request.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;

/// Wall-clock source, injected so deep-sleep compensation is testable.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

type Callback = Arc<dyn Fn() + Send + Sync>;

struct Pending {
    deadline: DateTime<Utc>,
    token: u64,
    callback: Callback,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    token: u64,
    pending: Option<Pending>,
}

/// At most one outstanding wake-up request; each new request cancels and
/// replaces the previous one. Clones share the same slot.
///
/// `schedule` must run inside a tokio runtime (it spawns the relative
/// timer task).
#[derive(Clone)]
pub struct Alarm {
    clock: Arc<dyn Clock>,
    inner: Arc<Mutex<Inner>>,
}

impl Default for Alarm {
    fn default() -> Self {
        Self::new()
    }
}

impl Alarm {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: Arc::new(Mutex::new(Inner {
                token: 0,
                pending: None,
            })),
        }
    }

    /// Cancel-then-arm: replaces any pending request with a new one due at
    /// `now + delay`.
    pub fn schedule<F>(&self, delay: Duration, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let deadline = self.clock.now() + delay;
        let mut inner = lock(&self.inner);
        inner.token += 1;
        let token = inner.token;
        if let Some(prev) = inner.pending.take() {
            abort_timer(prev);
        }
        let timer = spawn_timer(&self.inner, token, delay);
        inner.pending = Some(Pending {
            deadline,
            token,
            callback: Arc::new(callback),
            timer: Some(timer),
        });
    }

    /// Re-synchronize after a suspected frozen countdown (deep sleep).
    ///
    /// If the deadline is still in the future, re-arms the relative timer
    /// for the remaining delay; if it has passed, fires the callback
    /// immediately. Idempotent and safe to call spuriously.
    pub fn on_wake(&self) {
        let now = self.clock.now();
        let overdue = {
            let mut inner = lock(&self.inner);
            let remaining = match inner.pending.as_ref() {
                Some(pending) => pending.deadline - now,
                None => return,
            };
            if remaining > Duration::zero() {
                if let Some(pending) = inner.pending.as_mut() {
                    if let Some(timer) = pending.timer.take() {
                        timer.abort();
                    }
                    let token = pending.token;
                    pending.timer = Some(spawn_timer(&self.inner, token, remaining));
                }
                None
            } else {
                inner.pending.take()
            }
        };
        // The slot is already cleared, so a callback that re-enters
        // schedule() cannot be cancelled by its own stale request.
        if let Some(pending) = overdue {
            let callback = Arc::clone(&pending.callback);
            abort_timer(pending);
            callback();
        }
    }

    /// Clears the pending request if any; safe to call when idle.
    pub fn cancel(&self) {
        let mut inner = lock(&self.inner);
        inner.token += 1;
        if let Some(prev) = inner.pending.take() {
            abort_timer(prev);
        }
    }

    /// `None` when idle, else seconds until the deadline (negative when
    /// overdue).
    pub fn remaining_seconds(&self) -> Option<i64> {
        let inner = lock(&self.inner);
        let pending = inner.pending.as_ref()?;
        Some((pending.deadline - self.clock.now()).num_seconds())
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.inner).pending.is_some()
    }
}

/// A poisoned lock only means a callback panicked; the slot data itself
/// stays consistent.
fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

fn abort_timer(pending: Pending) {
    if let Some(timer) = pending.timer {
        timer.abort();
    }
}

fn spawn_timer(inner: &Arc<Mutex<Inner>>, token: u64, delay: Duration) -> JoinHandle<()> {
    let inner = Arc::clone(inner);
    let sleep = delay.to_std().unwrap_or_default();
    tokio::spawn(async move {
        tokio::time::sleep(sleep).await;
        fire_if_current(&inner, token);
    })
}

fn fire_if_current(inner: &Mutex<Inner>, token: u64) {
    let pending = {
        let mut guard = lock(inner);
        let current = guard.pending.as_ref().is_some_and(|p| p.token == token);
        if current {
            guard.pending.take()
        } else {
            None
        }
    };
    if let Some(pending) = pending {
        (pending.callback)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Clock that only moves when the test advances it, simulating a host
    /// whose relative timers are frozen.
    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn starting_at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self { now: Mutex::new(now) })
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn counter_callback() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let fired = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&fired);
        (fired, move || {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn deep_sleep_compensation_rearms_for_remainder() {
        let clock = ManualClock::starting_at(Utc::now());
        let alarm = Alarm::with_clock(clock.clone());
        let (fired, callback) = counter_callback();

        alarm.schedule(Duration::minutes(10), callback);
        // Two minutes of wall clock pass while the countdown was frozen.
        clock.advance(Duration::minutes(2));
        alarm.on_wake();

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(alarm.remaining_seconds(), Some(8 * 60));
    }

    #[tokio::test]
    async fn overdue_wake_fires_immediately() {
        let clock = ManualClock::starting_at(Utc::now());
        let alarm = Alarm::with_clock(clock.clone());
        let (fired, callback) = counter_callback();

        alarm.schedule(Duration::minutes(1), callback);
        clock.advance(Duration::minutes(3));
        alarm.on_wake();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(alarm.remaining_seconds().is_none());
        // Spurious wake after the slot was cleared: no-op.
        alarm.on_wake();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn schedule_replaces_pending_request() {
        let clock = ManualClock::starting_at(Utc::now());
        let alarm = Alarm::with_clock(clock.clone());
        let (first_fired, first) = counter_callback();
        let (second_fired, second) = counter_callback();

        alarm.schedule(Duration::minutes(5), first);
        alarm.schedule(Duration::minutes(1), second);
        clock.advance(Duration::minutes(2));
        alarm.on_wake();

        assert_eq!(first_fired.load(Ordering::SeqCst), 0);
        assert_eq!(second_fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let clock = ManualClock::starting_at(Utc::now());
        let alarm = Alarm::with_clock(clock.clone());
        let (fired, callback) = counter_callback();

        alarm.cancel(); // idle: no-op
        alarm.schedule(Duration::minutes(1), callback);
        alarm.cancel();
        alarm.cancel();
        clock.advance(Duration::minutes(5));
        alarm.on_wake();

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!alarm.is_pending());
    }

    #[tokio::test]
    async fn remaining_goes_negative_when_overdue() {
        let clock = ManualClock::starting_at(Utc::now());
        let alarm = Alarm::with_clock(clock.clone());
        alarm.schedule(Duration::minutes(1), || {});
        clock.advance(Duration::minutes(2));
        assert_eq!(alarm.remaining_seconds(), Some(-60));
    }

    #[tokio::test]
    async fn callback_may_reschedule() {
        let clock = ManualClock::starting_at(Utc::now());
        let alarm = Alarm::with_clock(clock.clone());
        let rearmed = alarm.clone();

        alarm.schedule(Duration::minutes(1), move || {
            rearmed.schedule(Duration::minutes(7), || {});
        });
        clock.advance(Duration::minutes(2));
        alarm.on_wake();

        // The re-entered request survived its own firing.
        assert_eq!(alarm.remaining_seconds(), Some(7 * 60));
    }

    #[tokio::test]
    async fn relative_timer_fires_without_wake_call() {
        let alarm = Alarm::new();
        let (fired, callback) = counter_callback();
        alarm.schedule(Duration::milliseconds(20), callback);
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!alarm.is_pending());
    }
}
