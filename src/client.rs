//! Client builder and embedder-facing handle.
//!
//! [`ClientBuilder`] wires the whole pipeline at startup: sender facade,
//! pending-request registry, peer registry, dispatch chain (print, promise,
//! roster, command - in that order), and the connection supervisor. No
//! global registries: every component gets its collaborators handed in.
//!
//! # Example
//!
//! ```no_run
//! use termlink::{Client, ClientEvent};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Client::builder()
//!         .server_addr("control.example.net:1999")
//!         .secret("shared-secret")
//!         .connect();
//!
//!     let mut events = client.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         if let ClientEvent::RosterChanged(peers) = event {
//!             println!("{} peers online", peers.len());
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::ClientConfig;
use crate::connection::{
    ClientEvent, Connection, ConnectionInfo, ConnectionState, EventBus, MessageSender,
};
use crate::dispatch::DispatchRegistry;
use crate::error::Result;
use crate::handlers::{CommandHandler, PendingRequests, PrintHandler, PromiseHandler, RosterHandler};
use crate::message::Message;
use crate::peer::Peer;
use crate::registry::PeerRegistry;
use crate::session::SessionProxy;
use crate::terminal::{EchoTerminal, SecretProvider, StaticSecret, Terminal};

/// Builder for configuring and starting a [`Client`].
pub struct ClientBuilder {
    config: ClientConfig,
    terminal: Arc<dyn Terminal>,
    secret: Arc<dyn SecretProvider>,
    print: Option<PrintHandler>,
}

impl ClientBuilder {
    /// Create a builder with default timings, an echo terminal, and an
    /// empty secret.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            terminal: Arc::new(EchoTerminal),
            secret: Arc::new(StaticSecret(String::new())),
            print: None,
        }
    }

    /// Set the control server address (`host:port`).
    pub fn server_addr(mut self, addr: &str) -> Self {
        self.config.server_addr = addr.to_string();
        self
    }

    /// Set the shared authentication secret.
    pub fn secret(mut self, secret: &str) -> Self {
        self.secret = Arc::new(StaticSecret(secret.to_string()));
        self
    }

    /// Set a custom secret provider.
    pub fn secret_provider(mut self, provider: Arc<dyn SecretProvider>) -> Self {
        self.secret = provider;
        self
    }

    /// Set the local terminal backend executing inbound commands.
    pub fn terminal(mut self, terminal: Arc<dyn Terminal>) -> Self {
        self.terminal = terminal;
        self
    }

    /// Set the presentation sink for diagnostic Print messages.
    pub fn print_sink(mut self, sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.print = Some(PrintHandler::new(sink));
        self
    }

    /// Set the heartbeat emission interval.
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// Set the read/write/all idle thresholds.
    pub fn idle_thresholds(mut self, read: Duration, write: Duration, all: Duration) -> Self {
        self.config.read_idle = read;
        self.config.write_idle = write;
        self.config.all_idle = all;
        self
    }

    /// Set the fixed delay between reconnect attempts.
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    /// Set how long a session proxy waits for a command response.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Drop cached session proxies for peers that leave the roster.
    pub fn prune_stale_proxies(mut self, prune: bool) -> Self {
        self.config.prune_stale_proxies = prune;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Wire the pipeline and start connecting.
    ///
    /// Must be called inside a tokio runtime. The returned client is usable
    /// immediately; sends fail with `NotConnected` until the transport is
    /// live.
    pub fn connect(self) -> Client {
        let sender = MessageSender::new();
        let events = EventBus::new(self.config.event_capacity);
        let pending = PendingRequests::new();

        let registry = Arc::new(PeerRegistry::new(
            sender.clone(),
            pending.clone(),
            self.config.request_timeout,
            self.config.prune_stale_proxies,
        ));

        // Chain order matters: diagnostics first, promise resolution second,
        // command execution last.
        let mut dispatch = DispatchRegistry::new();
        dispatch.register(self.print.unwrap_or_else(PrintHandler::logging));
        dispatch.register(PromiseHandler::new(pending));
        dispatch.register(RosterHandler::new(registry.clone(), events.clone()));
        dispatch.register(CommandHandler::new(self.terminal.clone(), sender.clone()));

        let connection = Connection::spawn(
            self.config,
            sender.clone(),
            events.clone(),
            self.secret,
            Arc::new(dispatch),
        );

        Client {
            connection,
            sender,
            events,
            registry,
            terminal: self.terminal,
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running remote-session client.
pub struct Client {
    connection: Connection,
    sender: MessageSender,
    events: EventBus,
    registry: Arc<PeerRegistry>,
    terminal: Arc<dyn Terminal>,
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Subscribe to lifecycle and roster events. Any number of subscribers
    /// may exist; each sees every event from the moment it subscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Current connection lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Snapshot of the current established connection, if any.
    pub fn info(&self) -> Option<ConnectionInfo> {
        self.connection.info()
    }

    /// Latest server-pushed roster.
    pub fn roster(&self) -> Vec<Peer> {
        self.registry.roster()
    }

    /// Session proxies for the latest roster's non-self peers.
    pub fn sessions(&self) -> Vec<Arc<SessionProxy>> {
        self.registry.proxies()
    }

    /// Look up a session proxy by peer id.
    pub fn session(&self, peer_id: &str) -> Option<Arc<SessionProxy>> {
        self.registry.proxy(peer_id)
    }

    /// This client's own roster id, once a roster has revealed it.
    pub fn self_id(&self) -> Option<String> {
        self.registry.self_id()
    }

    /// Send a message over the current transport.
    ///
    /// Fails with `NotConnected` when the transport is down; the core does
    /// not queue or retransmit across reconnects.
    pub async fn send_message(&self, message: &Message) -> Result<()> {
        self.sender.send(message).await
    }

    /// Terminal shutdown: stops all scheduled work, closes the transport,
    /// and releases the terminal backend. The client cannot be reused.
    pub fn close(self) {
        self.connection.close();
        self.terminal.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_builder_wires_a_client() {
        let client = Client::builder()
            .server_addr("127.0.0.1:1") // nothing listens here
            .secret("x")
            .reconnect_delay(Duration::from_secs(3600))
            .connect();

        assert!(client.roster().is_empty());
        assert!(client.sessions().is_empty());
        assert_eq!(client.self_id(), None);
        assert!(client.info().is_none());

        let err = client.send_message(&Message::heartbeat()).await.unwrap_err();
        assert!(matches!(err, crate::error::TermlinkError::NotConnected));

        client.close();
    }

    #[tokio::test]
    async fn test_builder_setters() {
        let builder = Client::builder()
            .server_addr("example:2000")
            .heartbeat_interval(Duration::from_secs(1))
            .idle_thresholds(
                Duration::from_secs(2),
                Duration::from_secs(3),
                Duration::from_secs(4),
            )
            .reconnect_delay(Duration::from_millis(100))
            .request_timeout(Duration::from_secs(9))
            .prune_stale_proxies(true);

        assert_eq!(builder.config.server_addr, "example:2000");
        assert_eq!(builder.config.heartbeat_interval, Duration::from_secs(1));
        assert_eq!(builder.config.read_idle, Duration::from_secs(2));
        assert_eq!(builder.config.write_idle, Duration::from_secs(3));
        assert_eq!(builder.config.all_idle, Duration::from_secs(4));
        assert_eq!(builder.config.reconnect_delay, Duration::from_millis(100));
        assert_eq!(builder.config.request_timeout, Duration::from_secs(9));
        assert!(builder.config.prune_stale_proxies);
    }
}
