//! Roster broadcast handler.

use std::sync::Arc;

use crate::connection::{ClientEvent, EventBus};
use crate::dispatch::{MessageHandler, Outcome};
use crate::message::{Message, MessageKind};
use crate::peer::roster_from_attachments;
use crate::registry::PeerRegistry;

/// Claims PeerList messages: reconciles the registry, then notifies
/// subscribers with the raw peer list.
pub struct RosterHandler {
    registry: Arc<PeerRegistry>,
    events: EventBus,
}

impl RosterHandler {
    /// Create a handler feeding `registry` and `events`.
    pub fn new(registry: Arc<PeerRegistry>, events: EventBus) -> Self {
        Self { registry, events }
    }
}

impl MessageHandler for RosterHandler {
    fn name(&self) -> &'static str {
        "roster"
    }

    fn handle(&self, message: &Message) -> Outcome {
        if message.kind != MessageKind::PeerList {
            return Outcome::Continue;
        }

        match roster_from_attachments(&message.attachments) {
            Ok(peers) => {
                tracing::debug!(count = peers.len(), "roster update");
                self.registry.reconcile(&peers);
                self.events.emit(ClientEvent::RosterChanged(peers));
            }
            Err(e) => tracing::warn!(error = %e, "unusable roster broadcast"),
        }
        Outcome::Consumed
    }
}
