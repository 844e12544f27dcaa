//! Connection lifecycle state machine for a reconnecting stream.
//!
//! Pure and I/O-free: the connection task feeds it [`LinkEvent`]s and performs
//! the returned [`LinkAction`]s.
//!
//! ```text
//! Disconnected ──Start──► Connecting ──Opened──► Connected
//!                             ▲                     │
//!                  TimerFired │     Closed / Errored │
//!                             │                     ▼
//!                             └────────────────  Backoff
//! ```
//!
//! At most one reconnect timer is pending at any time: a close or error that
//! arrives while a timer is already armed is absorbed.

use std::fmt;
use std::time::Duration;

/// Observable state of a stream connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Backoff,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Backoff => "backoff",
        };
        f.write_str(s)
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Begin connecting (initial start).
    Start,
    /// Transport handshake finished.
    Opened,
    /// Peer or transport closed the connection.
    Closed,
    /// Transport, connect, or keep-alive failure.
    Errored,
    /// The backoff timer expired.
    TimerFired,
    /// Process shutdown.
    Shutdown,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Open a new transport connection.
    Connect,
    /// Send the configured subscription/handshake payload.
    SendHandshake,
    /// Close the current transport connection, if any.
    CloseTransport,
    /// Arm the single reconnect timer.
    ScheduleReconnect(Duration),
    /// Disarm the pending reconnect timer.
    CancelTimer,
}

/// Reconnect state machine with single-timer guarding.
#[derive(Debug, Clone)]
pub struct Link {
    state: LinkState,
    timer_pending: bool,
    reconnect_interval: Duration,
    stopped: bool,
}

impl Link {
    pub fn new(reconnect_interval: Duration) -> Self {
        Self {
            state: LinkState::Disconnected,
            timer_pending: false,
            reconnect_interval,
            stopped: false,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Whether a reconnect timer is armed.
    pub fn timer_pending(&self) -> bool {
        self.timer_pending
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn reconnect_interval(&self) -> Duration {
        self.reconnect_interval
    }

    /// Apply `event` and return the actions the caller must perform.
    pub fn handle(&mut self, event: LinkEvent) -> Vec<LinkAction> {
        if self.stopped {
            return vec![];
        }

        match (self.state, event) {
            (_, LinkEvent::Shutdown) => {
                self.stopped = true;
                self.state = LinkState::Disconnected;
                let mut actions = vec![LinkAction::CloseTransport];
                if std::mem::take(&mut self.timer_pending) {
                    actions.push(LinkAction::CancelTimer);
                }
                actions
            }

            (LinkState::Disconnected, LinkEvent::Start) => {
                self.state = LinkState::Connecting;
                vec![LinkAction::Connect]
            }

            (LinkState::Connecting, LinkEvent::Opened) => {
                self.state = LinkState::Connected;
                vec![LinkAction::SendHandshake]
            }

            (
                LinkState::Connecting | LinkState::Connected,
                LinkEvent::Closed | LinkEvent::Errored,
            ) => {
                self.state = LinkState::Backoff;
                self.arm_timer()
            }

            // A second close/error while the timer is armed must not arm another.
            (LinkState::Backoff, LinkEvent::Closed | LinkEvent::Errored) => {
                if self.timer_pending { vec![] } else { self.arm_timer() }
            }

            (LinkState::Backoff, LinkEvent::TimerFired) if self.timer_pending => {
                self.timer_pending = false;
                self.state = LinkState::Connecting;
                vec![LinkAction::Connect]
            }

            _ => vec![],
        }
    }

    fn arm_timer(&mut self) -> Vec<LinkAction> {
        self.timer_pending = true;
        vec![LinkAction::CloseTransport, LinkAction::ScheduleReconnect(self.reconnect_interval)]
    }
}
