//! Single WebSocket connection with auto-reconnect and keep-alive.
//!
//! Each `WsConnection` runs as a tokio task that:
//! 1. Resolves the endpoint (fixed URL, or an async resolver such as a SignalR
//!    negotiate call).
//! 2. Connects and sends the subscription/handshake message.
//! 3. Reads frames and forwards them to a callback, in arrival order.
//! 4. Sends periodic keep-alive messages (exchange-specific format).
//! 5. On close or error waits out one fixed backoff, then reconnects.
//!
//! Lifecycle decisions are delegated to [`Link`]; the task only performs the
//! actions it returns and publishes the resulting [`LinkState`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::link::{Link, LinkAction, LinkEvent, LinkState};
use crate::error::CetError;
use crate::shutdown::{self, ShutdownSignal, ShutdownTrigger};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// One inbound data frame.
#[derive(Debug, Clone, Copy)]
pub enum Frame<'a> {
    Text(&'a str),
    Binary(&'a [u8]),
}

/// What the frame callback wants the connection to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Keep reading.
    Continue,
    /// Tear the connection down and reconnect after backoff.
    Close(String),
}

/// Callback invoked for each received text or binary frame.
pub type OnFrameCallback = Arc<dyn Fn(Frame<'_>) -> Dispatch + Send + Sync>;

/// Async endpoint resolver, called before every connect attempt.
pub type ResolveUrl = Arc<dyn Fn() -> BoxFuture<'static, Result<String>> + Send + Sync>;

/// Builds a fresh keep-alive message for every tick.
pub type KeepAliveBuilder = Arc<dyn Fn() -> String + Send + Sync>;

/// Where to connect.
#[derive(Clone)]
pub enum WsEndpoint {
    Fixed(String),
    Resolved(ResolveUrl),
}

impl fmt::Debug for WsEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(url) => f.debug_tuple("Fixed").field(url).finish(),
            Self::Resolved(_) => f.write_str("Resolved(..)"),
        }
    }
}

/// Keep-alive schedule while connected.
///
/// `message` is called on every tick, so each invocation can carry a fresh id.
#[derive(Clone)]
pub struct KeepAlive {
    pub interval: Duration,
    pub message: KeepAliveBuilder,
}

impl fmt::Debug for KeepAlive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeepAlive").field("interval", &self.interval).finish_non_exhaustive()
    }
}

/// Configuration for a single WebSocket connection.
#[derive(Debug, Clone)]
pub struct WsConnConfig {
    /// Log prefix, usually the exchange name.
    pub label: String,
    pub endpoint: WsEndpoint,
    /// Message to send immediately after connection (subscription request).
    pub subscribe_msg: Option<String>,
    pub keepalive: Option<KeepAlive>,
    /// Fixed wait between a disconnect and the next attempt.
    pub reconnect_interval: Duration,
}

impl WsConnConfig {
    /// Plain config: fixed URL, no handshake, no keep-alive.
    pub fn new(
        label: impl Into<String>,
        url: impl Into<String>,
        reconnect_interval: Duration,
    ) -> Self {
        Self {
            label: label.into(),
            endpoint: WsEndpoint::Fixed(url.into()),
            subscribe_msg: None,
            keepalive: None,
            reconnect_interval,
        }
    }
}

/// A single WebSocket connection managed by a background tokio task.
pub struct WsConnection {
    /// Connection configuration.
    pub config: WsConnConfig,
    state_tx: Option<watch::Sender<LinkState>>,
    state_rx: watch::Receiver<LinkState>,
    shutdown: Option<ShutdownTrigger>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl WsConnection {
    /// Create a new (not yet started) connection.
    pub fn new(config: WsConnConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(LinkState::Disconnected);
        Self { config, state_tx: Some(state_tx), state_rx, shutdown: None, task: None }
    }

    /// Observe lifecycle transitions.
    pub fn state(&self) -> watch::Receiver<LinkState> {
        self.state_rx.clone()
    }

    /// Start the connection task. Frames are forwarded to `on_frame`.
    ///
    /// Calling `start` twice is a no-op.
    pub fn start(&mut self, on_frame: OnFrameCallback) {
        let Some(state_tx) = self.state_tx.take() else {
            warn!("[{}] connection already started", self.config.label);
            return;
        };
        let (trigger, signal) = shutdown::channel();
        let config = self.config.clone();

        let task = tokio::spawn(async move {
            connection_loop(config, on_frame, state_tx, signal).await;
        });

        self.shutdown = Some(trigger);
        self.task = Some(task);
    }

    /// Stop the connection (closing the socket or cancelling the pending
    /// backoff) and wait for the task to finish.
    pub async fn stop(&mut self) {
        if let Some(trigger) = self.shutdown.take() {
            trigger.trigger();
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Main connection loop — connect, subscribe, read, keep alive, back off.
///
/// Returns only after `shutdown` fires.
pub async fn connection_loop(
    config: WsConnConfig,
    on_frame: OnFrameCallback,
    state_tx: watch::Sender<LinkState>,
    mut shutdown: ShutdownSignal,
) {
    let label = config.label.as_str();
    let mut link = Link::new(config.reconnect_interval);
    let mut pending_timer: Option<Duration> = None;

    perform(&mut link, LinkEvent::Start, &mut pending_timer);

    while !link.is_stopped() {
        publish(&state_tx, label, link.state());

        match link.state() {
            LinkState::Connecting => {
                info!("[{label}] connecting to {:?}", config.endpoint);
                let connected = tokio::select! {
                    r = connect_ws(&config) => r,
                    _ = shutdown.wait() => {
                        perform(&mut link, LinkEvent::Shutdown, &mut pending_timer);
                        break;
                    }
                };

                match connected {
                    Ok(stream) => {
                        info!("[{label}] connected");
                        perform(&mut link, LinkEvent::Opened, &mut pending_timer);
                        publish(&state_tx, label, link.state());
                        run_session(
                            &config,
                            stream,
                            &on_frame,
                            &mut link,
                            &mut pending_timer,
                            &mut shutdown,
                        )
                        .await;
                    }
                    Err(e) => {
                        error!("[{label}] connection failed: {e:#}");
                        perform(&mut link, LinkEvent::Errored, &mut pending_timer);
                    }
                }
            }

            LinkState::Backoff => {
                let Some(delay) = pending_timer else {
                    // No timer armed means nothing will ever move us on.
                    perform(&mut link, LinkEvent::Errored, &mut pending_timer);
                    continue;
                };
                warn!("[{label}] disconnected, reconnecting in {delay:?}");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        perform(&mut link, LinkEvent::TimerFired, &mut pending_timer);
                    }
                    _ = shutdown.wait() => {
                        perform(&mut link, LinkEvent::Shutdown, &mut pending_timer);
                    }
                }
            }

            LinkState::Disconnected | LinkState::Connected => {
                // Connected is handled inside `run_session`; landing here means
                // the session returned without a transition.
                perform(&mut link, LinkEvent::Errored, &mut pending_timer);
            }
        }
    }

    publish(&state_tx, label, LinkState::Disconnected);
    info!("[{label}] connection stopped");
}

/// Feed `event` to the link and apply timer bookkeeping.
///
/// Transport-related actions are performed by the caller that owns the socket.
fn perform(
    link: &mut Link,
    event: LinkEvent,
    pending_timer: &mut Option<Duration>,
) -> Vec<LinkAction> {
    let actions = link.handle(event);
    for action in &actions {
        match action {
            LinkAction::ScheduleReconnect(delay) => *pending_timer = Some(*delay),
            LinkAction::CancelTimer => *pending_timer = None,
            LinkAction::Connect => *pending_timer = None,
            LinkAction::SendHandshake | LinkAction::CloseTransport => {}
        }
    }
    actions
}

fn publish(state_tx: &watch::Sender<LinkState>, label: &str, state: LinkState) {
    let prev = state_tx.send_replace(state);
    if prev != state {
        debug!("[{label}] {prev} -> {state}");
    }
}

/// Drive one open connection until it closes, errors, or shutdown fires.
async fn run_session(
    config: &WsConnConfig,
    stream: WsStream,
    on_frame: &OnFrameCallback,
    link: &mut Link,
    pending_timer: &mut Option<Duration>,
    shutdown: &mut ShutdownSignal,
) {
    let label = config.label.as_str();
    let (mut ws_write, mut ws_read) = stream.split();

    // Handshake. A failed send is only logged; the silence that follows is
    // caught by the normal close/error path.
    if let Some(ref sub_msg) = config.subscribe_msg {
        debug!("[{label}] subscribing: {sub_msg}");
        if let Err(e) = ws_write.send(Message::Text(sub_msg.clone().into())).await {
            warn!("[{label}] subscribe send failed: {e}");
        }
    }

    let keepalive = config.keepalive.as_ref().filter(|k| {
        if k.interval.is_zero() {
            warn!("[{label}] keep-alive interval is zero, keep-alive disabled");
        }
        !k.interval.is_zero()
    });
    let mut keepalive_timer = keepalive.map(|k| tokio::time::interval(k.interval));

    let ended = loop {
        tokio::select! {
            _ = shutdown.wait() => {
                info!("[{label}] shutdown signal received");
                for action in perform(link, LinkEvent::Shutdown, pending_timer) {
                    if action == LinkAction::CloseTransport {
                        let _ = ws_write.close().await;
                    }
                }
                return;
            }

            msg = ws_read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Dispatch::Close(reason) = on_frame(Frame::Text(text.as_str())) {
                            warn!("[{label}] closing connection: {reason}");
                            break LinkEvent::Errored;
                        }
                    }
                    Some(Ok(Message::Binary(data))) => {
                        if let Dispatch::Close(reason) = on_frame(Frame::Binary(&data)) {
                            warn!("[{label}] closing connection: {reason}");
                            break LinkEvent::Errored;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws_write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        warn!("[{label}] received close frame: {frame:?}");
                        break LinkEvent::Closed;
                    }
                    Some(Err(e)) => {
                        error!("[{label}] read error: {e}");
                        break LinkEvent::Errored;
                    }
                    None => {
                        warn!("[{label}] stream ended");
                        break LinkEvent::Closed;
                    }
                    _ => {} // Pong, raw Frame — ignore
                }
            }

            _ = async {
                match keepalive_timer.as_mut() {
                    Some(timer) => { timer.tick().await; }
                    None => std::future::pending::<()>().await,
                }
            } => {
                if let Some(keepalive) = keepalive {
                    let msg = Message::Text((keepalive.message)().into());
                    if let Err(e) = ws_write.send(msg).await {
                        error!("[{label}] keep-alive send failed: {e}");
                        break LinkEvent::Errored;
                    }
                }
            }
        }
    };

    for action in perform(link, ended, pending_timer) {
        if action == LinkAction::CloseTransport {
            if let Err(e) = ws_write.close().await {
                // Closing an already-broken socket errors too; the link
                // absorbs it because a reconnect is already scheduled.
                debug!("[{label}] close after disconnect failed: {e}");
                perform(link, LinkEvent::Errored, pending_timer);
            }
        }
    }
}

/// Resolve the endpoint and establish a (TLS) WebSocket connection.
async fn connect_ws(config: &WsConnConfig) -> Result<WsStream> {
    let url = match &config.endpoint {
        WsEndpoint::Fixed(url) => url.clone(),
        WsEndpoint::Resolved(resolve) => resolve().await.context("endpoint resolution failed")?,
    };

    let request = url
        .as_str()
        .into_client_request()
        .map_err(|e| CetError::WebSocket(format!("invalid url {url}: {e}")))?;

    let (stream, _response) =
        tokio::time::timeout(CONNECT_TIMEOUT, tokio_tungstenite::connect_async(request))
            .await
            .map_err(|_| CetError::WebSocket(format!("connect to {url} timed out")))?
            .map_err(|e| CetError::WebSocket(format!("connect to {url}: {e}")))?;
    Ok(stream)
}
