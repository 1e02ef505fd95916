//! Connection core: lifecycle state machine, framing pipe, and the
//! single-writer outbound path.
//!
//! A [`Connection`] owns exactly one live transport socket at a time; a
//! reconnect fully replaces it. Inbound bytes flow read loop -> splitter ->
//! codec -> dispatch chain, in stream order. Outbound messages from any
//! task funnel through one mpsc channel into a dedicated writer task, so
//! only one task ever writes encoded bytes to the socket.
//!
//! Lifecycle: `CONNECTING -> LIVE` on connect success (fresh
//! [`ConnectionInfo`], establish event, Auth queued first), `-> DEAD` on
//! transport failure, protocol violation, or idle timeout. DEAD is fanned
//! out to subscribers before the reconnect delay is scheduled. `close()`
//! is terminal.

mod events;
pub(crate) mod liveness;
pub(crate) mod reconnect;

pub use events::{ClientEvent, ConnectionInfo, ConnectionState, EventBus};

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};

use crate::codec::{FrameSplitter, MessageCodec};
use crate::config::ClientConfig;
use crate::dispatch::DispatchRegistry;
use crate::error::{Result, TermlinkError};
use crate::message::Message;
use crate::terminal::SecretProvider;
use liveness::ActivityTracker;

/// Handle for sending messages over the current transport.
///
/// Cheaply cloneable; held by the heartbeat loop, the command handler, and
/// every session proxy. The underlying channel is replaced on each
/// reconnect; between transports every send fails with
/// [`TermlinkError::NotConnected`]. The core never queues or retransmits
/// application messages across reconnects - retrying is the caller's call.
#[derive(Clone)]
pub struct MessageSender {
    slot: Arc<Mutex<Option<mpsc::Sender<Vec<u8>>>>>,
}

impl MessageSender {
    /// Create a sender with no transport attached.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Encode and queue a message for the writer task.
    ///
    /// # Errors
    ///
    /// [`TermlinkError::NotConnected`] when no live transport exists, or
    /// when the writer went away while the message was queued.
    pub async fn send(&self, message: &Message) -> Result<()> {
        let bytes = MessageCodec::encode(message)?;
        let tx = self
            .slot
            .lock()
            .unwrap()
            .clone()
            .ok_or(TermlinkError::NotConnected)?;
        tx.send(bytes)
            .await
            .map_err(|_| TermlinkError::NotConnected)
    }

    /// Whether a live transport is currently attached.
    pub fn is_connected(&self) -> bool {
        self.slot.lock().unwrap().is_some()
    }

    pub(crate) fn install(&self, tx: mpsc::Sender<Vec<u8>>) {
        *self.slot.lock().unwrap() = Some(tx);
    }

    pub(crate) fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }
}

impl Default for MessageSender {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared between the supervisor, the heartbeat loop, and the
/// embedder-facing handle.
pub(crate) struct ConnectionShared {
    pub(crate) config: ClientConfig,
    pub(crate) sender: MessageSender,
    pub(crate) events: EventBus,
    pub(crate) secret: Arc<dyn SecretProvider>,
    pub(crate) activity: ActivityTracker,
    pub(crate) shutdown: watch::Sender<bool>,
    state: Mutex<ConnectionState>,
    info: Mutex<Option<ConnectionInfo>>,
}

impl ConnectionShared {
    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    pub(crate) fn info(&self) -> Option<ConnectionInfo> {
        self.info.lock().unwrap().clone()
    }

    fn set_info(&self, info: ConnectionInfo) {
        *self.info.lock().unwrap() = Some(info);
    }

    /// Move to `next`, fanning out a state-change event on an actual
    /// transition.
    pub(crate) fn transition(&self, next: ConnectionState) {
        let mut state = self.state.lock().unwrap();
        if *state == next {
            return;
        }
        tracing::info!(from = ?*state, to = ?next, "connection state change");
        *state = next;
        drop(state);
        self.events.emit(ClientEvent::StateChanged(next));
    }
}

/// Handle to a running connection.
///
/// Construction spawns the reconnect supervisor and the heartbeat loop;
/// dropping the handle does not stop them, [`Connection::close`] does.
pub struct Connection {
    shared: Arc<ConnectionShared>,
}

impl Connection {
    /// Spawn the connection machinery. The first connect attempt starts
    /// immediately.
    pub(crate) fn spawn(
        config: ClientConfig,
        sender: MessageSender,
        events: EventBus,
        secret: Arc<dyn SecretProvider>,
        dispatch: Arc<DispatchRegistry>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        let shared = Arc::new(ConnectionShared {
            config,
            sender,
            events,
            secret,
            activity: ActivityTracker::new(),
            shutdown,
            state: Mutex::new(ConnectionState::Connecting),
            info: Mutex::new(None),
        });

        tokio::spawn(reconnect::supervise(shared.clone(), dispatch));
        tokio::spawn(liveness::heartbeat_loop(shared.clone()));

        Self { shared }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Snapshot of the current established connection, if any.
    pub fn info(&self) -> Option<ConnectionInfo> {
        self.shared.info()
    }

    /// Terminal shutdown: cancels heartbeat, idle, and reconnect work and
    /// closes the transport. The connection cannot be reused; construct a
    /// new client for a fresh session.
    pub fn close(&self) {
        let _ = self.shared.shutdown.send(true);
    }
}

/// Why a transport epoch ended.
enum EpochEnd {
    /// Server closed the stream or the transport errored.
    Transport(Option<TermlinkError>),
    /// An idle threshold fired.
    Idle(liveness::IdleKind),
    /// Explicit close.
    Shutdown,
}

/// Drive one established transport until it dies.
///
/// Owns the epoch's writer task and reader half; tears both down before
/// returning, then fans out Closed and the DEAD transition.
pub(crate) async fn run_epoch(
    shared: &Arc<ConnectionShared>,
    dispatch: &Arc<DispatchRegistry>,
    stream: TcpStream,
    shutdown: &mut watch::Receiver<bool>,
) {
    let remote_addr = match stream.peer_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::warn!(error = %e, "connected socket has no peer address");
            shared.transition(ConnectionState::Dead);
            return;
        }
    };

    let (read_half, write_half) = stream.into_split();
    let (tx, rx) = mpsc::channel(shared.config.outbound_capacity);

    shared.activity.reset();
    shared.sender.install(tx);
    let writer = tokio::spawn(write_loop(write_half, rx, shared.activity.clone()));

    // Authentication goes out before any other application message: it is
    // queued while the connection is still CONNECTING, so not even the
    // heartbeat loop can get ahead of it.
    let auth = Message::auth(&shared.secret.get());
    if let Err(e) = shared.sender.send(&auth).await {
        tracing::warn!(error = %e, "failed to queue auth message");
    }

    let info = ConnectionInfo::new(remote_addr);
    shared.set_info(info.clone());
    shared.transition(ConnectionState::Live);
    shared.events.emit(ClientEvent::Established(info));
    tracing::info!(%remote_addr, "connection established");

    let end = tokio::select! {
        result = read_loop(read_half, shared, dispatch) => EpochEnd::Transport(result.err()),
        kind = liveness::idle_watch(&shared.activity, &shared.config) => EpochEnd::Idle(kind),
        _ = shutdown.changed() => EpochEnd::Shutdown,
    };

    match &end {
        EpochEnd::Transport(None) => tracing::info!("connection closed by server"),
        EpochEnd::Transport(Some(e)) => tracing::warn!(error = %e, "connection failed"),
        EpochEnd::Idle(kind) => tracing::warn!(?kind, "idle timeout, closing connection"),
        EpochEnd::Shutdown => tracing::info!("connection closed locally"),
    }

    // Detach the transport: the channel closes, the writer task drains and
    // exits, and dropping both halves closes the socket.
    shared.sender.clear();
    let _ = writer.await;

    shared.events.emit(ClientEvent::Closed);
    shared.transition(ConnectionState::Dead);
}

/// Read loop: transport bytes -> splitter -> codec -> dispatch chain.
///
/// Frames are delivered to the chain in stream order. Returns `Ok(())` on
/// orderly EOF; a protocol violation or read error is fatal to the epoch.
async fn read_loop(
    mut read_half: OwnedReadHalf,
    shared: &Arc<ConnectionShared>,
    dispatch: &Arc<DispatchRegistry>,
) -> Result<()> {
    let mut splitter = FrameSplitter::with_max_frame(shared.config.max_frame_size);
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = read_half.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        shared.activity.record_read();

        for frame in splitter.push(&buf[..n])? {
            let message = MessageCodec::decode(&frame)?;
            tracing::trace!(kind = ?message.kind, "frame received");
            dispatch.dispatch(&message);
        }
    }
}

/// Writer task: the only writer on this transport. Receives pre-encoded
/// byte runs and writes them out in order; exits when the channel closes
/// or the transport rejects a write.
async fn write_loop(
    mut write_half: OwnedWriteHalf,
    mut rx: mpsc::Receiver<Vec<u8>>,
    activity: ActivityTracker,
) {
    while let Some(bytes) = rx.recv().await {
        if let Err(e) = write_half.write_all(&bytes).await {
            tracing::warn!(error = %e, "transport write failed");
            return;
        }
        if let Err(e) = write_half.flush().await {
            tracing::warn!(error = %e, "transport flush failed");
            return;
        }
        activity.record_write();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sender_fails_without_transport() {
        let sender = MessageSender::new();
        assert!(!sender.is_connected());

        let err = sender.send(&Message::heartbeat()).await.unwrap_err();
        assert!(matches!(err, TermlinkError::NotConnected));
    }

    #[tokio::test]
    async fn test_sender_delivers_encoded_bytes() {
        let sender = MessageSender::new();
        let (tx, mut rx) = mpsc::channel(4);
        sender.install(tx);
        assert!(sender.is_connected());

        sender.send(&Message::heartbeat()).await.unwrap();

        let bytes = rx.recv().await.unwrap();
        assert!(bytes.ends_with(crate::codec::DELIMITER));
        let frame = &bytes[..bytes.len() - crate::codec::DELIMITER.len()];
        let decoded = MessageCodec::decode(frame).unwrap();
        assert_eq!(decoded, Message::heartbeat());
    }

    #[tokio::test]
    async fn test_sender_clear_detaches_transport() {
        let sender = MessageSender::new();
        let (tx, _rx) = mpsc::channel(4);
        sender.install(tx);
        sender.clear();

        assert!(!sender.is_connected());
        let err = sender.send(&Message::heartbeat()).await.unwrap_err();
        assert!(matches!(err, TermlinkError::NotConnected));
    }
}
