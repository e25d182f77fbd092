//! Alert stream client
//!
//! Maintains the persistent push channel that delivers alert events. One
//! task owns the socket, the retry timer, and the command channel, so a
//! manual reconnect can never race an automatic retry into two live
//! connections: whichever arrives first, the single select loop tears down
//! the old state before opening anything new.
//!
//! Reconnection uses capped exponential backoff with jitter instead of a
//! fixed-delay forever loop; the schedule resets on every successful
//! connection and an optional attempt cap turns exhaustion into "wait for a
//! manual reconnect".

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::alerts::feed::AlertFeed;
use crate::alerts::types::{AuthenticateMessage, ConnectionStatus};
use crate::auth::store::AuthStore;
use crate::config::Config;
use crate::utils::backoff::ReconnectBackoff;

/// Commands accepted by the stream task
#[derive(Debug)]
enum StreamCommand {
    Reconnect,
    Shutdown,
}

/// Reconnect policy, injected so tests can use short delays
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: Option<u32>,
}

impl ReconnectPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            initial_delay: config.reconnect_initial_delay(),
            max_delay: config.reconnect_max_delay(),
            max_attempts: config.reconnect_max_attempts,
        }
    }
}

/// Client side of the alert push channel
pub struct AlertStreamClient {
    ws_url: String,
    policy: ReconnectPolicy,
    auth: Arc<AuthStore>,
    feed: Arc<AlertFeed>,
    command_tx: RwLock<Option<mpsc::Sender<StreamCommand>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AlertStreamClient {
    pub fn new(config: &Config, auth: Arc<AuthStore>, feed: Arc<AlertFeed>) -> Self {
        Self {
            ws_url: config.ws_url.clone(),
            policy: ReconnectPolicy::from_config(config),
            auth,
            feed,
            command_tx: RwLock::new(None),
            task: Mutex::new(None),
        }
    }

    pub fn feed(&self) -> &Arc<AlertFeed> {
        &self.feed
    }

    /// Starts the stream task. A second call while the task is running is a
    /// no-op.
    pub async fn connect(&self) {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.as_ref() {
            if !handle.is_finished() {
                debug!("Alert stream already running");
                return;
            }
        }

        let (command_tx, command_rx) = mpsc::channel(4);
        *self.command_tx.write().await = Some(command_tx);
        self.feed.set_status(ConnectionStatus::Connecting).await;

        *task = Some(tokio::spawn(run_stream(
            self.ws_url.clone(),
            self.policy,
            Arc::clone(&self.auth),
            Arc::clone(&self.feed),
            command_rx,
        )));
        info!(ws_url = %self.ws_url, "Alert stream task started");
    }

    /// User-triggered reconnect: tears down any open socket and any pending
    /// retry delay, then connects immediately.
    pub async fn reconnect(&self) {
        let running = {
            let task = self.task.lock().await;
            task.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
        };

        if running {
            if let Some(tx) = self.command_tx.read().await.as_ref() {
                let _ = tx.send(StreamCommand::Reconnect).await;
            }
        } else {
            self.connect().await;
        }
    }

    /// Deterministic teardown: closes the channel and cancels any scheduled
    /// reconnect. Safe to call more than once.
    pub async fn shutdown(&self) {
        if let Some(tx) = self.command_tx.write().await.take() {
            let _ = tx.send(StreamCommand::Shutdown).await;
        }
        if let Some(handle) = self.task.lock().await.take() {
            let _ = handle.await;
        }
    }
}

/// Appends the access token as a query parameter
fn connect_url(ws_url: &str, token: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(ws_url)?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

/// The single owner of the socket and the retry schedule.
async fn run_stream(
    ws_url: String,
    policy: ReconnectPolicy,
    auth: Arc<AuthStore>,
    feed: Arc<AlertFeed>,
    mut command_rx: mpsc::Receiver<StreamCommand>,
) {
    let mut backoff = ReconnectBackoff::new(
        policy.initial_delay,
        policy.max_delay,
        policy.max_attempts,
    );

    'connect: loop {
        // The original front-end bails out entirely without a token; here we
        // park until a manual reconnect arrives after login.
        let Some(token) = auth.access_token().await else {
            error!("No access token; alert stream parked");
            feed.set_status(ConnectionStatus::Disconnected).await;
            match command_rx.recv().await {
                Some(StreamCommand::Reconnect) => {
                    backoff.reset();
                    feed.set_status(ConnectionStatus::Connecting).await;
                    continue 'connect;
                }
                Some(StreamCommand::Shutdown) | None => break 'connect,
            }
        };

        let url = match connect_url(&ws_url, &token) {
            Ok(url) => url,
            Err(e) => {
                // A bad URL never fixes itself; park until reconfigured
                error!(ws_url = %ws_url, error = %e, "Invalid alert stream URL");
                feed.set_status(ConnectionStatus::Disconnected).await;
                break 'connect;
            }
        };

        match connect_async(url.as_str()).await {
            Ok((ws, _)) => {
                let (mut write, mut read) = ws.split();

                // Defense in depth: authenticate in-band as well
                let handshake = AuthenticateMessage::new(&token);
                let authenticated = match serde_json::to_string(&handshake) {
                    Ok(payload) => match write.send(Message::Text(payload)).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(error = %e, "Failed to send authenticate message");
                            false
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize authenticate message");
                        false
                    }
                };

                if authenticated {
                    feed.set_status(ConnectionStatus::Connected).await;
                    backoff.reset();
                    info!("Alert stream connected");

                    loop {
                        tokio::select! {
                            message = read.next() => match message {
                                Some(Ok(Message::Text(text))) => {
                                    feed.ingest(&text).await;
                                }
                                Some(Ok(Message::Close(_))) | None => {
                                    info!("Alert stream closed by server");
                                    break;
                                }
                                Some(Ok(_)) => {
                                    // Ping/pong/binary frames carry no alerts
                                }
                                Some(Err(e)) => {
                                    warn!(error = %e, "Alert stream transport error");
                                    break;
                                }
                            },
                            command = command_rx.recv() => match command {
                                Some(StreamCommand::Reconnect) => {
                                    info!("Manual reconnect requested");
                                    backoff.reset();
                                    feed.set_status(ConnectionStatus::Reconnecting).await;
                                    continue 'connect;
                                }
                                Some(StreamCommand::Shutdown) | None => break 'connect,
                            }
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect alert stream");
            }
        }

        // Schedule the automatic retry; a manual reconnect or a shutdown
        // pre-empts the delay.
        feed.set_status(ConnectionStatus::Reconnecting).await;
        let Some(delay) = backoff.next_delay() else {
            error!(
                attempts = backoff.attempts(),
                "Alert stream reconnect attempts exhausted"
            );
            feed.set_status(ConnectionStatus::Disconnected).await;
            match command_rx.recv().await {
                Some(StreamCommand::Reconnect) => {
                    backoff.reset();
                    feed.set_status(ConnectionStatus::Connecting).await;
                    continue 'connect;
                }
                Some(StreamCommand::Shutdown) | None => break 'connect,
            }
        };

        debug!(delay_ms = delay.as_millis() as u64, "Alert stream reconnect scheduled");
        tokio::select! {
            _ = sleep(delay) => {}
            command = command_rx.recv() => match command {
                Some(StreamCommand::Reconnect) => {
                    // Bypass the remaining delay
                    backoff.reset();
                }
                Some(StreamCommand::Shutdown) | None => break 'connect,
            }
        }
    }

    feed.set_status(ConnectionStatus::Disconnected).await;
    debug!("Alert stream task stopped");
}
