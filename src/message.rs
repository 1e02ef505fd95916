//! Protocol messages.
//!
//! A [`Message`] is a kind discriminator plus a string key/value attachment
//! map. Messages are immutable once constructed: the sender builds one via
//! the typed constructors below, the dispatch chain consumes it.
//!
//! # Example
//!
//! ```
//! use termlink::message::{keys, Message, MessageKind};
//!
//! let msg = Message::command(7, "peer-b", Some("peer-a"), "uptime");
//! assert_eq!(msg.kind, MessageKind::Command);
//! assert_eq!(msg.attachment(keys::COMMAND), Some("uptime"));
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Well-known attachment keys.
pub mod keys {
    /// Shared secret carried by an Auth message.
    pub const PASSWORD: &str = "password";
    /// Correlation id carried by Command and Promise messages.
    pub const REQUEST_ID: &str = "request_id";
    /// Peer id a Command is addressed to.
    pub const TARGET: &str = "target";
    /// Peer id that originated a Command (reply routing).
    pub const ORIGIN: &str = "origin";
    /// Command line to execute.
    pub const COMMAND: &str = "command";
    /// Successful execution output carried by a Promise message.
    pub const RESULT: &str = "result";
    /// Failure text carried by a Promise message.
    pub const ERROR: &str = "error";
    /// Free text carried by a Print message.
    pub const TEXT: &str = "text";
}

/// Message kind discriminator.
///
/// Serialized as a lowercase string tag; decoding an unrecognized tag fails
/// the whole frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Shared-secret authentication, sent immediately after establish.
    Auth,
    /// Periodic liveness probe, empty payload.
    Heartbeat,
    /// Server-pushed roster broadcast.
    PeerList,
    /// Terminal command addressed to a peer.
    Command,
    /// Response correlated to an earlier Command by request id.
    Promise,
    /// Free text for local display.
    Print,
}

/// A discrete protocol message: kind plus attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Kind discriminator.
    pub kind: MessageKind,
    /// String key/value payload. Insertion order is irrelevant.
    #[serde(default)]
    pub attachments: HashMap<String, String>,
}

impl Message {
    /// Create a message with an empty attachment map.
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            attachments: HashMap::new(),
        }
    }

    /// Auth message carrying the shared secret.
    pub fn auth(password: &str) -> Self {
        Self::new(MessageKind::Auth).with(keys::PASSWORD, password)
    }

    /// Heartbeat message, empty payload.
    pub fn heartbeat() -> Self {
        Self::new(MessageKind::Heartbeat)
    }

    /// Command addressed to `target`, correlated by `request_id`.
    ///
    /// `origin` is the sender's own peer id when known; the executing side
    /// copies it into the reply's target so the server can route it back.
    pub fn command(request_id: u64, target: &str, origin: Option<&str>, command_line: &str) -> Self {
        let mut msg = Self::new(MessageKind::Command)
            .with(keys::REQUEST_ID, &request_id.to_string())
            .with(keys::TARGET, target)
            .with(keys::COMMAND, command_line);
        if let Some(origin) = origin {
            msg = msg.with(keys::ORIGIN, origin);
        }
        msg
    }

    /// Successful Promise reply for `request_id`.
    pub fn promise_ok(request_id: u64, target: Option<&str>, result: &str) -> Self {
        let mut msg = Self::new(MessageKind::Promise)
            .with(keys::REQUEST_ID, &request_id.to_string())
            .with(keys::RESULT, result);
        if let Some(target) = target {
            msg = msg.with(keys::TARGET, target);
        }
        msg
    }

    /// Failed Promise reply for `request_id`.
    pub fn promise_err(request_id: u64, target: Option<&str>, error: &str) -> Self {
        let mut msg = Self::new(MessageKind::Promise)
            .with(keys::REQUEST_ID, &request_id.to_string())
            .with(keys::ERROR, error);
        if let Some(target) = target {
            msg = msg.with(keys::TARGET, target);
        }
        msg
    }

    /// Print message carrying free diagnostic text.
    pub fn print(text: &str) -> Self {
        Self::new(MessageKind::Print).with(keys::TEXT, text)
    }

    /// Builder-style attachment insertion.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.attachments.insert(key.to_string(), value.to_string());
        self
    }

    /// Look up an attachment by key.
    #[inline]
    pub fn attachment(&self, key: &str) -> Option<&str> {
        self.attachments.get(key).map(|s| s.as_str())
    }

    /// Parse the request id attachment, if present and numeric.
    pub fn request_id(&self) -> Option<u64> {
        self.attachment(keys::REQUEST_ID)?.parse().ok()
    }
}
