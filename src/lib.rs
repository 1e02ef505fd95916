//! # termlink
//!
//! Remote-session client core: a persistent connection to a control server,
//! authentication on establish, a dynamic roster of peer sessions, and a
//! controllable remote-terminal proxy per peer.
//!
//! ## Architecture
//!
//! - **Codec** (`codec`): delimiter-framed MessagePack messages
//! - **Dispatch** (`dispatch`, `handlers`): ordered chain-of-responsibility
//!   routing for inbound messages
//! - **Connection** (`connection`): lifecycle state machine, single-writer
//!   outbound path, heartbeat/idle liveness, unbounded fixed-delay reconnect
//! - **Peers** (`peer`, `registry`, `session`): roster reconciliation with
//!   an identity-preserving session-proxy cache
//!
//! ## Example
//!
//! ```ignore
//! use termlink::Client;
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
//!         println!("{event:?}");
//!     }
//! }
//! ```

pub mod codec;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod message;
pub mod peer;
pub mod registry;
pub mod session;
pub mod terminal;

mod client;

pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use connection::{ClientEvent, ConnectionInfo, ConnectionState, MessageSender};
pub use error::{Result, TermlinkError};
pub use message::{Message, MessageKind};
pub use peer::Peer;
pub use session::SessionProxy;
pub use terminal::{SecretProvider, Terminal};
