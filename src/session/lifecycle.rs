//! Session lifecycle enforcement
//!
//! Two independent timeout policies run against the authenticated session:
//! an idle timeout (sliding window, reset by user activity) and an absolute
//! timeout (hard ceiling from session start, never reset by activity). When
//! either fires the session is terminated unconditionally: sign-out is
//! attempted, and the expiry event is emitted whether or not sign-out
//! succeeded, so consumers always navigate back to login.
//!
//! A single monitor task owns both timers and all signals, so there is no
//! destructive race between them: whichever branch of the select loop wins,
//! the other timer is cancelled with the loop.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::auth::service::SessionTerminator;
use crate::config::Config;

/// Lifecycle states: `Inactive -> Active` on `init`, `Active -> Expired` on
/// a timeout, `Active -> Inactive` on `cleanup`. `Expired` ends the cycle;
/// a later `init` after re-login starts a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Inactive,
    Active,
    Expired,
}

/// Why the session was terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// Idle timeout elapsed with no activity
    Inactivity,
    /// Absolute session ceiling reached
    MaxDuration,
    /// An API call failed authentication; treated like a timeout
    AuthFailure,
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryReason::Inactivity => write!(f, "inactivity"),
            ExpiryReason::MaxDuration => write!(f, "max session duration"),
            ExpiryReason::AuthFailure => write!(f, "authentication failure"),
        }
    }
}

/// Events emitted by the lifecycle; `Expired` is terminal for the cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Expired(ExpiryReason),
}

/// Timeout policy, injected so tests can use short durations
#[derive(Debug, Clone, Copy)]
pub struct TimeoutPolicy {
    pub idle: Duration,
    pub absolute: Duration,
    /// Whether a successful token refresh extends the absolute ceiling.
    /// Off by default; see `extend_absolute_on_refresh` in the config.
    pub extend_absolute_on_refresh: bool,
}

impl TimeoutPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            idle: config.idle_timeout(),
            absolute: config.absolute_timeout(),
            extend_absolute_on_refresh: config.extend_absolute_on_refresh,
        }
    }
}

/// Signals consumed by the monitor task
enum Signal {
    Activity,
    TokenRefreshed,
    Expire(ExpiryReason),
}

const SIGNAL_BUFFER: usize = 16;
const EVENT_BUFFER: usize = 16;

/// Enforces idle and absolute timeouts on the authenticated session.
///
/// Constructed once at application start and shared by reference; there is
/// no hidden global instance.
pub struct SessionLifecycle {
    policy: TimeoutPolicy,
    terminator: Arc<dyn SessionTerminator>,
    state: Arc<RwLock<LifecycleState>>,
    events: broadcast::Sender<SessionEvent>,
    signal_tx: RwLock<Option<mpsc::Sender<Signal>>>,
    shutdown_tx: RwLock<Option<mpsc::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionLifecycle {
    pub fn new(policy: TimeoutPolicy, terminator: Arc<dyn SessionTerminator>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            policy,
            terminator,
            state: Arc::new(RwLock::new(LifecycleState::Inactive)),
            events,
            signal_tx: RwLock::new(None),
            shutdown_tx: RwLock::new(None),
            task: Mutex::new(None),
        }
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Subscribes to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Starts the monitor task. Idempotent: a second call while running is a
    /// no-op, so there is never more than one idle timer and one absolute
    /// timer per lifecycle.
    pub async fn init(&self) {
        {
            let mut state = self.state.write().await;
            if *state == LifecycleState::Active {
                debug!("Session lifecycle already running");
                return;
            }
            *state = LifecycleState::Active;
        }

        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_BUFFER);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        *self.signal_tx.write().await = Some(signal_tx);
        *self.shutdown_tx.write().await = Some(shutdown_tx);

        let handle = tokio::spawn(monitor(
            self.policy,
            Arc::clone(&self.state),
            Arc::clone(&self.terminator),
            self.events.clone(),
            signal_rx,
            shutdown_rx,
        ));
        *self.task.lock().await = Some(handle);

        info!(
            idle_secs = self.policy.idle.as_secs(),
            absolute_secs = self.policy.absolute.as_secs(),
            "Session lifecycle started"
        );
    }

    /// Records user activity, restarting only the idle timer.
    ///
    /// Ignored unless the lifecycle is `Active`, so activity arriving after
    /// expiry cannot resurrect the timers. Signals are coalesced: a full
    /// buffer means a reset is already pending.
    pub async fn record_activity(&self) {
        if *self.state.read().await != LifecycleState::Active {
            return;
        }
        if let Some(tx) = self.signal_tx.read().await.as_ref() {
            let _ = tx.try_send(Signal::Activity);
        }
    }

    /// Notifies the lifecycle of a successful token refresh. Extends the
    /// absolute ceiling only when the policy says so.
    pub async fn notify_refreshed(&self) {
        if *self.state.read().await != LifecycleState::Active {
            return;
        }
        if let Some(tx) = self.signal_tx.read().await.as_ref() {
            let _ = tx.try_send(Signal::TokenRefreshed);
        }
    }

    /// Forces expiry, e.g. when an API call reports an authentication
    /// failure. Takes the same termination path as a timeout.
    pub async fn expire_now(&self, reason: ExpiryReason) {
        if *self.state.read().await != LifecycleState::Active {
            return;
        }
        if let Some(tx) = self.signal_tx.read().await.as_ref() {
            let _ = tx.send(Signal::Expire(reason)).await;
        }
    }

    /// Stops the monitor task and cancels both timers. Idempotent and safe
    /// to call in any state, including after expiry.
    pub async fn cleanup(&self) {
        if let Some(tx) = self.shutdown_tx.write().await.take() {
            let _ = tx.send(()).await;
        }
        *self.signal_tx.write().await = None;

        if let Some(handle) = self.task.lock().await.take() {
            let _ = handle.await;
        }

        let mut state = self.state.write().await;
        if *state == LifecycleState::Active {
            *state = LifecycleState::Inactive;
            debug!("Session lifecycle stopped");
        }
    }
}

/// Monitor task: owns both timers and all signal handling for one cycle.
async fn monitor(
    policy: TimeoutPolicy,
    state: Arc<RwLock<LifecycleState>>,
    terminator: Arc<dyn SessionTerminator>,
    events: broadcast::Sender<SessionEvent>,
    mut signal_rx: mpsc::Receiver<Signal>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let idle = sleep(policy.idle);
    tokio::pin!(idle);
    let absolute = sleep(policy.absolute);
    tokio::pin!(absolute);

    let reason = loop {
        tokio::select! {
            _ = &mut idle => break Some(ExpiryReason::Inactivity),
            _ = &mut absolute => break Some(ExpiryReason::MaxDuration),
            signal = signal_rx.recv() => match signal {
                Some(Signal::Activity) => {
                    idle.as_mut().reset(Instant::now() + policy.idle);
                }
                Some(Signal::TokenRefreshed) => {
                    if policy.extend_absolute_on_refresh {
                        debug!("Token refresh extended absolute session ceiling");
                        absolute.as_mut().reset(Instant::now() + policy.absolute);
                    }
                }
                Some(Signal::Expire(reason)) => break Some(reason),
                None => break None,
            },
            _ = shutdown_rx.recv() => break None,
        }
    };

    // Both timers are cancelled with the loop; nothing can double-fire.
    if let Some(reason) = reason {
        expire(state, terminator, events, reason).await;
    }
}

/// Terminates the session. Sign-out failures are logged, not honored:
/// once a timeout fires the session ends no matter what the server says.
async fn expire(
    state: Arc<RwLock<LifecycleState>>,
    terminator: Arc<dyn SessionTerminator>,
    events: broadcast::Sender<SessionEvent>,
    reason: ExpiryReason,
) {
    {
        let mut state = state.write().await;
        if *state != LifecycleState::Active {
            return;
        }
        *state = LifecycleState::Expired;
    }

    warn!(reason = %reason, "Session expired, signing out");

    if let Err(e) = terminator.sign_out().await {
        warn!(error = %e, "Sign-out during expiry failed; terminating anyway");
    }

    let _ = events.send(SessionEvent::Expired(reason));
}
