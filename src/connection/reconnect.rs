//! Reconnect supervisor.
//!
//! One long-lived task per connection. Each iteration runs the full connect
//! sequence - new transport, new framing pipeline, fresh snapshot on
//! success - and on any failed attempt or dropped connection waits the
//! fixed delay and tries again, indefinitely. Long-lived unattended clients
//! are expected to ride out arbitrary server downtime.
//!
//! Subscribers see the DEAD transition before the retry delay starts, so
//! they can react independently of reconnection outcome.

use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::time::sleep;

use super::{run_epoch, ConnectionShared, ConnectionState};
use crate::dispatch::DispatchRegistry;

pub(crate) async fn supervise(shared: Arc<ConnectionShared>, dispatch: Arc<DispatchRegistry>) {
    let mut shutdown = shared.shutdown.subscribe();

    loop {
        if *shutdown.borrow() {
            return;
        }

        match TcpStream::connect(&shared.config.server_addr).await {
            Ok(stream) => {
                run_epoch(&shared, &dispatch, stream, &mut shutdown).await;
            }
            Err(e) => {
                tracing::warn!(
                    addr = %shared.config.server_addr,
                    error = %e,
                    "connect attempt failed"
                );
                shared.transition(ConnectionState::Dead);
            }
        }

        if *shutdown.borrow() {
            return;
        }

        tracing::info!(
            delay_ms = shared.config.reconnect_delay.as_millis() as u64,
            "scheduling reconnect"
        );
        tokio::select! {
            _ = sleep(shared.config.reconnect_delay) => {}
            _ = shutdown.changed() => return,
        }
    }
}
