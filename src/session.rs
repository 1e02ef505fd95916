//! Per-peer session proxy.
//!
//! A [`SessionProxy`] is the client-local handle for one non-self peer's
//! remote terminal. Proxies are owned by the peer registry cache and keyed
//! by peer id; as long as a peer stays listed, every roster refresh hands
//! out the same `Arc` - embedders can hold a proxy across refreshes and
//! rely on its identity.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::timeout;

use crate::connection::MessageSender;
use crate::error::{Result, TermlinkError};
use crate::handlers::PendingRequests;
use crate::message::Message;
use crate::peer::Peer;

/// The local client's own roster id, learned from the first roster that
/// contains a self entry and shared with every proxy.
#[derive(Clone, Default)]
pub struct SelfId {
    inner: Arc<Mutex<Option<String>>>,
}

impl SelfId {
    /// Get the current self id, if a roster has revealed it yet.
    pub fn get(&self) -> Option<String> {
        self.inner.lock().unwrap().clone()
    }

    pub(crate) fn set(&self, id: &str) {
        let mut slot = self.inner.lock().unwrap();
        if let Some(previous) = slot.as_deref() {
            if previous != id {
                tracing::warn!(previous, new = id, "self id changed mid-session");
            }
        }
        *slot = Some(id.to_string());
    }
}

/// Local handle for controlling one remote peer's terminal.
pub struct SessionProxy {
    peer: Peer,
    self_id: SelfId,
    sender: MessageSender,
    pending: PendingRequests,
    request_timeout: Duration,
}

impl SessionProxy {
    pub(crate) fn new(
        peer: Peer,
        self_id: SelfId,
        sender: MessageSender,
        pending: PendingRequests,
        request_timeout: Duration,
    ) -> Self {
        Self {
            peer,
            self_id,
            sender,
            pending,
            request_timeout,
        }
    }

    /// The peer this proxy is bound to.
    pub fn peer(&self) -> &Peer {
        &self.peer
    }

    /// Stable server-assigned id of the bound peer.
    pub fn peer_id(&self) -> &str {
        &self.peer.id
    }

    /// Run a command line on the remote terminal and wait for its output.
    ///
    /// Sends a Command addressed to the peer, correlated by a fresh request
    /// id, and awaits the matching Promise.
    ///
    /// # Errors
    ///
    /// - [`TermlinkError::NotConnected`] when no live transport exists; the
    ///   command is not queued for later.
    /// - [`TermlinkError::RequestTimeout`] when no response arrives within
    ///   the configured window.
    /// - [`TermlinkError::Remote`] when the peer reports execution failure.
    pub async fn execute(&self, command_line: &str) -> Result<String> {
        let (request_id, rx) = self.pending.register();
        let origin = self.self_id.get();
        let command = Message::command(request_id, &self.peer.id, origin.as_deref(), command_line);

        if let Err(e) = self.sender.send(&command).await {
            self.pending.abandon(request_id);
            return Err(e);
        }

        match timeout(self.request_timeout, rx).await {
            Ok(Ok(Ok(output))) => Ok(output),
            Ok(Ok(Err(remote))) => Err(TermlinkError::Remote(remote)),
            // Resolution slot dropped: the registry was torn down.
            Ok(Err(_)) => Err(TermlinkError::Closed),
            Err(_) => {
                self.pending.abandon(request_id);
                Err(TermlinkError::RequestTimeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{MessageCodec, DELIMITER};
    use crate::message::{keys, MessageKind};
    use tokio::sync::mpsc;

    fn proxy_with_channel(timeout: Duration) -> (SessionProxy, PendingRequests, mpsc::Receiver<Vec<u8>>) {
        let sender = MessageSender::new();
        let (tx, rx) = mpsc::channel(4);
        sender.install(tx);
        let pending = PendingRequests::new();
        let self_id = SelfId::default();
        self_id.set("me");
        let proxy = SessionProxy::new(
            Peer::new("peer-b", false),
            self_id,
            sender,
            pending.clone(),
            timeout,
        );
        (proxy, pending, rx)
    }

    #[tokio::test]
    async fn test_execute_sends_command_and_resolves() {
        let (proxy, pending, mut rx) = proxy_with_channel(Duration::from_secs(5));

        let task = tokio::spawn(async move { proxy.execute("uptime").await });

        // Inspect the outbound command.
        let bytes = rx.recv().await.unwrap();
        let frame = &bytes[..bytes.len() - DELIMITER.len()];
        let command = MessageCodec::decode(frame).unwrap();
        assert_eq!(command.kind, MessageKind::Command);
        assert_eq!(command.attachment(keys::TARGET), Some("peer-b"));
        assert_eq!(command.attachment(keys::ORIGIN), Some("me"));
        assert_eq!(command.attachment(keys::COMMAND), Some("uptime"));

        // Resolve it the way the promise handler would.
        let id = command.request_id().unwrap();
        assert!(pending.resolve(id, Ok("up 3 days".to_string())));

        assert_eq!(task.await.unwrap().unwrap(), "up 3 days");
    }

    #[tokio::test]
    async fn test_execute_surfaces_remote_error() {
        let (proxy, pending, mut rx) = proxy_with_channel(Duration::from_secs(5));

        let task = tokio::spawn(async move { proxy.execute("nope").await });

        let bytes = rx.recv().await.unwrap();
        let frame = &bytes[..bytes.len() - DELIMITER.len()];
        let id = MessageCodec::decode(frame).unwrap().request_id().unwrap();
        pending.resolve(id, Err("not found".to_string()));

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, TermlinkError::Remote(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_times_out_and_abandons() {
        let (proxy, pending, _rx) = proxy_with_channel(Duration::from_secs(1));

        let err = proxy.execute("slow").await.unwrap_err();
        assert!(matches!(err, TermlinkError::RequestTimeout));
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_execute_fails_fast_when_disconnected() {
        let pending = PendingRequests::new();
        let proxy = SessionProxy::new(
            Peer::new("peer-b", false),
            SelfId::default(),
            MessageSender::new(),
            pending.clone(),
            Duration::from_secs(1),
        );

        let err = proxy.execute("uptime").await.unwrap_err();
        assert!(matches!(err, TermlinkError::NotConnected));
        assert!(pending.is_empty());
    }
}
