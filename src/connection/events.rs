//! Lifecycle state, connection snapshots, and the event fan-out.
//!
//! Every lifecycle signal goes through one `tokio::sync::broadcast`
//! channel, so any number of subscribers observe the same stream of events
//! and registering a listener never displaces another.

use std::net::SocketAddr;
use std::time::SystemTime;

use tokio::sync::broadcast;

use crate::peer::Peer;

/// Externally observable connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial state; a connect attempt is in flight.
    Connecting,
    /// Transport is up and authenticated traffic may flow.
    Live,
    /// Transport is down. May be followed by a new connect attempt.
    Dead,
}

/// Read-only snapshot of an established connection.
///
/// Created on successful connect, replaced on every successful reconnect.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Remote endpoint address.
    pub remote_addr: SocketAddr,
    /// When the connection was established.
    pub established_at: SystemTime,
}

impl ConnectionInfo {
    pub(crate) fn new(remote_addr: SocketAddr) -> Self {
        Self {
            remote_addr,
            established_at: SystemTime::now(),
        }
    }
}

/// Lifecycle and roster notifications delivered to subscribers.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Transport established; authentication has been queued.
    Established(ConnectionInfo),
    /// Transport closed (failure, idle timeout, or explicit close).
    Closed,
    /// Lifecycle state transition.
    StateChanged(ConnectionState),
    /// Server pushed a new roster. Carries the raw peer list.
    RosterChanged(Vec<Peer>),
}

/// Multi-subscriber event fan-out.
///
/// Cheap to clone; emission never blocks. A subscriber that falls behind
/// the channel capacity loses the oldest events (`RecvError::Lagged`),
/// which is acceptable for lifecycle notifications.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    /// Create a bus with the given per-subscriber capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all current subscribers.
    ///
    /// Having no subscribers is not an error.
    pub(crate) fn emit(&self, event: ClientEvent) {
        tracing::trace!(?event, "event");
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_multiple_subscribers_see_same_event() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.emit(ClientEvent::StateChanged(ConnectionState::Live));

        assert!(matches!(
            a.recv().await.unwrap(),
            ClientEvent::StateChanged(ConnectionState::Live)
        ));
        assert!(matches!(
            b.recv().await.unwrap(),
            ClientEvent::StateChanged(ConnectionState::Live)
        ));
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_fine() {
        let bus = EventBus::new(8);
        bus.emit(ClientEvent::Closed);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(8);
        bus.emit(ClientEvent::Closed);

        let mut rx = bus.subscribe();
        bus.emit(ClientEvent::StateChanged(ConnectionState::Dead));

        assert!(matches!(
            rx.recv().await.unwrap(),
            ClientEvent::StateChanged(ConnectionState::Dead)
        ));
    }
}
