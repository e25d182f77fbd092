//! Timing properties of the session lifecycle
//!
//! All tests run on a paused clock, so sliding-window and hard-ceiling
//! behavior is verified deterministically down to the millisecond.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use stockdeck::auth::{AuthError, SessionTerminator};
use stockdeck::session::{
    ExpiryReason, LifecycleState, SessionEvent, SessionLifecycle, TimeoutPolicy,
};
use stockdeck::utils::StockdeckError;

struct MockTerminator {
    sign_outs: AtomicUsize,
    fail: bool,
}

impl MockTerminator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sign_outs: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            sign_outs: AtomicUsize::new(0),
            fail: true,
        })
    }

    fn count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionTerminator for MockTerminator {
    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(AuthError::Storage(StockdeckError::channel(
                "refresh token revocation unreachable",
            )))
        } else {
            Ok(())
        }
    }
}

fn policy(idle_ms: u64, absolute_ms: u64) -> TimeoutPolicy {
    TimeoutPolicy {
        idle: Duration::from_millis(idle_ms),
        absolute: Duration::from_millis(absolute_ms),
        extend_absolute_on_refresh: false,
    }
}

async fn activity(lifecycle: &SessionLifecycle) {
    lifecycle.record_activity().await;
    // Let the monitor task consume the signal before the clock moves on
    tokio::task::yield_now().await;
}

#[tokio::test(start_paused = true)]
async fn idle_expiry_fires_just_past_the_window() {
    let terminator = MockTerminator::new();
    let lifecycle = SessionLifecycle::new(policy(5000, 300_000), terminator.clone());
    let mut events = lifecycle.subscribe();

    lifecycle.init().await;

    sleep(Duration::from_millis(4999)).await;
    assert_eq!(lifecycle.state().await, LifecycleState::Active);
    assert_eq!(terminator.count(), 0);

    sleep(Duration::from_millis(2)).await;
    assert_eq!(lifecycle.state().await, LifecycleState::Expired);
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Expired(ExpiryReason::Inactivity)
    );
    assert_eq!(terminator.count(), 1);
    // Exactly once: no second event is pending
    assert!(events.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn activity_slides_the_idle_window() {
    let terminator = MockTerminator::new();
    let lifecycle = SessionLifecycle::new(policy(5000, 300_000), terminator.clone());

    lifecycle.init().await;

    // Activity spaced well under the idle timeout keeps the session alive
    for _ in 0..20 {
        sleep(Duration::from_millis(4000)).await;
        activity(&lifecycle).await;
        assert_eq!(lifecycle.state().await, LifecycleState::Active);
    }
    assert_eq!(terminator.count(), 0);

    // Stopping the activity lets the idle timer run out
    sleep(Duration::from_millis(5001)).await;
    assert_eq!(lifecycle.state().await, LifecycleState::Expired);
    assert_eq!(terminator.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn absolute_ceiling_holds_under_continuous_activity() {
    let terminator = MockTerminator::new();
    let lifecycle = SessionLifecycle::new(policy(5000, 30_000), terminator.clone());
    let mut events = lifecycle.subscribe();

    lifecycle.init().await;

    // Activity every second never resets the absolute timer
    for _ in 0..30 {
        sleep(Duration::from_millis(1000)).await;
        activity(&lifecycle).await;
    }
    sleep(Duration::from_millis(500)).await;

    assert_eq!(lifecycle.state().await, LifecycleState::Expired);
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Expired(ExpiryReason::MaxDuration)
    );
    assert_eq!(terminator.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn repeated_init_leaves_one_timer_pair() {
    let terminator = MockTerminator::new();
    let lifecycle = SessionLifecycle::new(policy(5000, 300_000), terminator.clone());
    let mut events = lifecycle.subscribe();

    for _ in 0..5 {
        lifecycle.init().await;
    }

    sleep(Duration::from_millis(5001)).await;
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Expired(ExpiryReason::Inactivity)
    );
    assert!(events.try_recv().is_err());
    assert_eq!(terminator.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn activity_after_expiry_does_not_resurrect_timers() {
    let terminator = MockTerminator::new();
    let lifecycle = SessionLifecycle::new(policy(1000, 300_000), terminator.clone());

    lifecycle.init().await;
    sleep(Duration::from_millis(1001)).await;
    assert_eq!(lifecycle.state().await, LifecycleState::Expired);

    activity(&lifecycle).await;
    sleep(Duration::from_millis(10_000)).await;
    assert_eq!(lifecycle.state().await, LifecycleState::Expired);
    assert_eq!(terminator.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn cleanup_after_expiry_is_harmless() {
    let terminator = MockTerminator::new();
    let lifecycle = SessionLifecycle::new(policy(1000, 300_000), terminator.clone());

    lifecycle.init().await;
    sleep(Duration::from_millis(1500)).await;

    lifecycle.cleanup().await;
    lifecycle.cleanup().await;
    assert_eq!(lifecycle.state().await, LifecycleState::Expired);

    // Nothing restarts
    sleep(Duration::from_millis(10_000)).await;
    assert_eq!(terminator.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn termination_is_unconditional_when_sign_out_fails() {
    let terminator = MockTerminator::failing();
    let lifecycle = SessionLifecycle::new(policy(1000, 300_000), terminator.clone());
    let mut events = lifecycle.subscribe();

    lifecycle.init().await;
    sleep(Duration::from_millis(1001)).await;

    // The expiry event still arrives even though sign-out errored
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Expired(ExpiryReason::Inactivity)
    );
    assert_eq!(lifecycle.state().await, LifecycleState::Expired);
    assert_eq!(terminator.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn fresh_cycle_after_relogin() {
    let terminator = MockTerminator::new();
    let lifecycle = SessionLifecycle::new(policy(1000, 300_000), terminator.clone());

    lifecycle.init().await;
    sleep(Duration::from_millis(1001)).await;
    assert_eq!(lifecycle.state().await, LifecycleState::Expired);
    lifecycle.cleanup().await;

    // A new init after re-login starts a fresh cycle
    lifecycle.init().await;
    assert_eq!(lifecycle.state().await, LifecycleState::Active);

    sleep(Duration::from_millis(1001)).await;
    assert_eq!(lifecycle.state().await, LifecycleState::Expired);
    assert_eq!(terminator.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn refresh_extends_ceiling_only_when_configured() {
    let terminator = MockTerminator::new();
    let mut extending = policy(60_000, 10_000);
    extending.extend_absolute_on_refresh = true;
    let lifecycle = SessionLifecycle::new(extending, terminator.clone());

    lifecycle.init().await;

    // Refresh at 8s pushes the ceiling out to 18s
    sleep(Duration::from_millis(8000)).await;
    lifecycle.notify_refreshed().await;
    tokio::task::yield_now().await;

    sleep(Duration::from_millis(8000)).await;
    assert_eq!(lifecycle.state().await, LifecycleState::Active);

    sleep(Duration::from_millis(2001)).await;
    assert_eq!(lifecycle.state().await, LifecycleState::Expired);
}

#[tokio::test(start_paused = true)]
async fn refresh_does_not_extend_ceiling_by_default() {
    let terminator = MockTerminator::new();
    let lifecycle = SessionLifecycle::new(policy(60_000, 10_000), terminator.clone());

    lifecycle.init().await;

    sleep(Duration::from_millis(8000)).await;
    lifecycle.notify_refreshed().await;
    tokio::task::yield_now().await;

    sleep(Duration::from_millis(2001)).await;
    assert_eq!(lifecycle.state().await, LifecycleState::Expired);
}
