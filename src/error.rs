//! Error types for termlink.

use thiserror::Error;

/// Main error type for all termlink operations.
#[derive(Debug, Error)]
pub enum TermlinkError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// MsgPack serialization error.
    #[error("encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Protocol error (malformed frame, unknown message kind, oversized frame).
    ///
    /// Fatal to the current connection: the transport is torn down and a
    /// reconnect is scheduled.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No live transport to write to.
    #[error("not connected")]
    NotConnected,

    /// The connection was closed while a request was in flight.
    #[error("connection closed")]
    Closed,

    /// A correlated request did not receive its response in time.
    #[error("request timed out")]
    RequestTimeout,

    /// The remote peer answered a request with an error.
    #[error("remote error: {0}")]
    Remote(String),
}

/// Result type alias using TermlinkError.
pub type Result<T> = std::result::Result<T, TermlinkError>;
