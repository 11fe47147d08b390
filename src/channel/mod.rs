pub mod websocket;

use std::time::Duration;

use futures_util::{Stream, StreamExt};
use log::{debug, info, warn};
use tokio::sync::mpsc::{self, Sender};
use tokio::time::Instant;

use crate::errors::DashboardError;

pub use websocket::{WsConnector, websocket_url};

/// Capacity of the inbox between the channel and the dashboard. One slot keeps the producer in
/// lock step with the consumer.
pub const INBOX_CAPACITY: usize = 1;

/// What the push channel hands to the dashboard, in receipt order.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
    Opened,
    Frame(String),
    Closed { reason: String, retry_in: Duration },
}

pub fn inbox() -> (Sender<ChannelEvent>, mpsc::Receiver<ChannelEvent>) {
    mpsc::channel(INBOX_CAPACITY)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed { reconnect_at: Instant },
}

/// Connection lifecycle without any IO: Connecting -> Open -> Closed -> Connecting, forever.
///
/// A closed connection owns at most one pending reconnect deadline, so repeated close
/// notifications for the same connection never stack up timers.
#[derive(Debug)]
pub struct ChannelManager {
    state: ChannelState,
    reconnect_delay: Duration,
    attempts: u64,
}

impl ChannelManager {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ChannelState::Connecting,
            reconnect_delay,
            attempts: 1,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    /// Number of connection attempts started so far, the initial one included.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn opened(&mut self) {
        self.state = ChannelState::Open;
    }

    /// Records a closure and returns the reconnect deadline. A closure reported while a reconnect
    /// is already pending returns that deadline unchanged.
    pub fn closed(&mut self, now: Instant) -> Instant {
        match self.state {
            ChannelState::Closed { reconnect_at } => reconnect_at,
            ChannelState::Connecting | ChannelState::Open => {
                let reconnect_at = now + self.reconnect_delay;
                self.state = ChannelState::Closed { reconnect_at };
                reconnect_at
            }
        }
    }

    /// Moves to Connecting once the pending deadline has passed.
    pub fn reconnect_due(&mut self, now: Instant) -> bool {
        match self.state {
            ChannelState::Closed { reconnect_at } if now >= reconnect_at => {
                self.state = ChannelState::Connecting;
                self.attempts += 1;
                true
            }
            _ => false,
        }
    }
}

/// Opens one push-channel connection. Each call replaces the previous connection.
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Frames: Stream<Item = Result<String, DashboardError>> + Unpin;

    async fn connect(&mut self) -> Result<Self::Frames, DashboardError>;
}

/// Keeps the push channel alive until the inbox receiver is dropped.
///
/// Frames are forwarded one by one; a send only completes once the single inbox slot is free, so
/// the consumer sees them in receipt order and never batched.
pub async fn run_channel<C: Connector>(
    mut connector: C,
    inbox: Sender<ChannelEvent>,
    reconnect_delay: Duration,
) {
    let mut manager = ChannelManager::new(reconnect_delay);
    loop {
        debug!("Connecting push channel, attempt {}", manager.attempts());
        let error = match connector.connect().await {
            Ok(mut frames) => {
                manager.opened();
                info!("Push channel open");
                if inbox.send(ChannelEvent::Opened).await.is_err() {
                    return;
                }
                loop {
                    match frames.next().await {
                        Some(Ok(frame)) => {
                            if inbox.send(ChannelEvent::Frame(frame)).await.is_err() {
                                return;
                            }
                        }
                        Some(Err(e)) => break e,
                        None => {
                            break DashboardError::ChannelClosed {
                                reason: "connection closed by server".to_string(),
                            };
                        }
                    }
                }
            }
            Err(e) => e,
        };
        let reason = error.to_string();

        let reconnect_at = manager.closed(Instant::now());
        warn!(
            "Push channel closed ({}), reconnecting in {:?}",
            reason, reconnect_delay
        );
        let closed = ChannelEvent::Closed {
            reason,
            retry_in: reconnect_delay,
        };
        if inbox.send(closed).await.is_err() {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep_until(reconnect_at) => {}
            _ = inbox.closed() => return,
        }
        manager.reconnect_due(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let now = Instant::now();
        let mut manager = ChannelManager::new(Duration::from_secs(5));
        assert_eq!(manager.state(), ChannelState::Connecting);

        manager.opened();
        assert_eq!(manager.state(), ChannelState::Open);

        let reconnect_at = manager.closed(now);
        assert_eq!(reconnect_at, now + Duration::from_secs(5));
        assert!(!manager.reconnect_due(now + Duration::from_secs(4)));
        assert!(manager.reconnect_due(reconnect_at));
        assert_eq!(manager.state(), ChannelState::Connecting);
        assert_eq!(manager.attempts(), 2);
    }

    #[test]
    fn test_repeated_closures_keep_one_timer() {
        let now = Instant::now();
        let mut manager = ChannelManager::new(Duration::from_secs(5));
        manager.opened();

        let first = manager.closed(now);
        assert_eq!(manager.closed(now + Duration::from_secs(1)), first);
        assert_eq!(manager.closed(now + Duration::from_secs(2)), first);
        assert_eq!(manager.state(), ChannelState::Closed { reconnect_at: first });
    }

    #[test]
    fn test_failed_connect_schedules_reconnect() {
        let now = Instant::now();
        let mut manager = ChannelManager::new(Duration::from_secs(5));
        assert_eq!(manager.closed(now), now + Duration::from_secs(5));
        assert!(manager.reconnect_due(now + Duration::from_secs(5)));
        // the reconnect is consumed once
        assert!(!manager.reconnect_due(now + Duration::from_secs(6)));
    }
}
