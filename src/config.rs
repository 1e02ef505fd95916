//! Client configuration.

use std::time::Duration;

/// Default heartbeat emission interval.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Default read-idle threshold.
pub const DEFAULT_READ_IDLE: Duration = Duration::from_secs(5);

/// Default write-idle threshold.
pub const DEFAULT_WRITE_IDLE: Duration = Duration::from_secs(5);

/// Default all-idle threshold (no activity in either direction).
pub const DEFAULT_ALL_IDLE: Duration = Duration::from_secs(15);

/// Default delay between reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);

/// Default timeout for a correlated request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a [`crate::Client`].
///
/// The defaults match what the control server expects; embedders normally
/// set only `server_addr` through the builder.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Control server address, `host:port`.
    pub server_addr: String,
    /// Heartbeat emission interval, counted from client construction.
    pub heartbeat_interval: Duration,
    /// Liveness failure after this long without an inbound read.
    pub read_idle: Duration,
    /// Liveness failure after this long without an outbound write.
    pub write_idle: Duration,
    /// Liveness failure after this long without activity in either direction.
    pub all_idle: Duration,
    /// How often the idle monitor samples the activity tracker.
    pub idle_check_interval: Duration,
    /// Fixed delay before each reconnect attempt. Retries are unbounded.
    pub reconnect_delay: Duration,
    /// Maximum size of one frame on the wire.
    pub max_frame_size: usize,
    /// How long a session proxy waits for a command's correlated response.
    pub request_timeout: Duration,
    /// Drop cached session proxies for peers absent from the latest roster.
    /// Off by default: a returning peer keeps its proxy identity.
    pub prune_stale_proxies: bool,
    /// Event fan-out channel capacity per subscriber.
    pub event_capacity: usize,
    /// Outbound write queue depth.
    pub outbound_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:1999".to_string(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            read_idle: DEFAULT_READ_IDLE,
            write_idle: DEFAULT_WRITE_IDLE,
            all_idle: DEFAULT_ALL_IDLE,
            idle_check_interval: Duration::from_millis(500),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_frame_size: crate::codec::MAX_FRAME_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            prune_stale_proxies: false,
            event_capacity: 64,
            outbound_capacity: 64,
        }
    }
}
