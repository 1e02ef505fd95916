//! Heartbeat emission and idle detection.
//!
//! Two independent timers:
//!
//! - The heartbeat loop sends a Heartbeat message at a fixed interval,
//!   counted from client construction, whenever the connection is live.
//!   Its cadence is unaffected by inbound traffic; send failures are
//!   logged, not escalated.
//! - The idle watch samples the [`ActivityTracker`] and resolves once any
//!   of the read/write/all thresholds is exceeded. The connection treats
//!   that as a liveness failure: half-open sockets the transport layer
//!   never surfaces get detected here.

use std::sync::{Arc, Mutex};

use tokio::time::{interval_at, sleep, Duration, Instant};

use super::ConnectionShared;
use crate::config::ClientConfig;
use crate::connection::events::ConnectionState;
use crate::message::Message;

/// Which idle threshold fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdleKind {
    Read,
    Write,
    All,
}

#[derive(Debug, Clone, Copy)]
struct Stamps {
    last_read: Instant,
    last_write: Instant,
}

/// Tracks time since last inbound read and last outbound write.
///
/// Shared between the read loop, the writer task, and the idle watch.
#[derive(Clone)]
pub(crate) struct ActivityTracker {
    inner: Arc<Mutex<Stamps>>,
}

impl ActivityTracker {
    pub(crate) fn new() -> Self {
        let now = Instant::now();
        Self {
            inner: Arc::new(Mutex::new(Stamps {
                last_read: now,
                last_write: now,
            })),
        }
    }

    /// Reset both stamps, called when a fresh transport comes up.
    pub(crate) fn reset(&self) {
        let now = Instant::now();
        let mut stamps = self.inner.lock().unwrap();
        stamps.last_read = now;
        stamps.last_write = now;
    }

    pub(crate) fn record_read(&self) {
        self.inner.lock().unwrap().last_read = Instant::now();
    }

    pub(crate) fn record_write(&self) {
        self.inner.lock().unwrap().last_write = Instant::now();
    }

    pub(crate) fn read_idle_for(&self) -> Duration {
        self.inner.lock().unwrap().last_read.elapsed()
    }

    pub(crate) fn write_idle_for(&self) -> Duration {
        self.inner.lock().unwrap().last_write.elapsed()
    }

    /// Time since the last activity in either direction.
    pub(crate) fn all_idle_for(&self) -> Duration {
        let stamps = *self.inner.lock().unwrap();
        stamps.last_read.elapsed().min(stamps.last_write.elapsed())
    }
}

/// Resolve once any idle threshold is exceeded. One shot per transport
/// epoch: the caller tears the connection down when this returns, so
/// repeated ticks cannot double-fire.
pub(crate) async fn idle_watch(activity: &ActivityTracker, config: &ClientConfig) -> IdleKind {
    loop {
        sleep(config.idle_check_interval).await;

        if activity.read_idle_for() >= config.read_idle {
            return IdleKind::Read;
        }
        if activity.write_idle_for() >= config.write_idle {
            return IdleKind::Write;
        }
        if activity.all_idle_for() >= config.all_idle {
            return IdleKind::All;
        }
    }
}

/// Heartbeat emission loop, one per connection, running from construction
/// until explicit close.
pub(crate) async fn heartbeat_loop(shared: Arc<ConnectionShared>) {
    let period = shared.config.heartbeat_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    let mut shutdown = shared.shutdown.subscribe();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if shared.state() != ConnectionState::Live {
                    continue;
                }
                tracing::debug!("sending heartbeat");
                if let Err(e) = shared.sender.send(&Message::heartbeat()).await {
                    tracing::warn!(error = %e, "heartbeat send failed");
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}
