//! Chain-of-responsibility message dispatch.
//!
//! Handlers are registered once at startup, in order. Each inbound message
//! is offered to handlers in registration order; the first one that returns
//! [`Outcome::Consumed`] stops the chain. A message no handler claims is
//! dropped with a log line only - best-effort semantics, not an error.
//!
//! Handlers run synchronously on the task delivering the message and must
//! not block; long work is handed off to a background task (see the command
//! handler).
//!
//! # Example
//!
//! ```
//! use termlink::dispatch::{DispatchRegistry, MessageHandler, Outcome};
//! use termlink::message::{Message, MessageKind};
//!
//! struct HeartbeatSink;
//!
//! impl MessageHandler for HeartbeatSink {
//!     fn name(&self) -> &'static str {
//!         "heartbeat-sink"
//!     }
//!
//!     fn handle(&self, message: &Message) -> Outcome {
//!         if message.kind == MessageKind::Heartbeat {
//!             Outcome::Consumed
//!         } else {
//!             Outcome::Continue
//!         }
//!     }
//! }
//!
//! let mut registry = DispatchRegistry::new();
//! registry.register(HeartbeatSink);
//! registry.dispatch(&Message::heartbeat());
//! ```

use crate::message::Message;

/// What a handler did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Message claimed; the chain stops here.
    Consumed,
    /// Not this handler's message; try the next one.
    Continue,
}

/// A link in the dispatch chain.
///
/// Implementations contain their own failures: an error while handling a
/// claimed message is logged inside the handler and never breaks the chain
/// for subsequent messages.
pub trait MessageHandler: Send + Sync {
    /// Short name used in dispatch logs.
    fn name(&self) -> &'static str;

    /// Offer a message to this handler.
    fn handle(&self, message: &Message) -> Outcome;
}

/// Ordered chain of message handlers.
pub struct DispatchRegistry {
    handlers: Vec<Box<dyn MessageHandler>>,
}

impl DispatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Append a handler to the end of the chain. Order matters.
    pub fn register<H: MessageHandler + 'static>(&mut self, handler: H) {
        self.handlers.push(Box::new(handler));
    }

    /// Route a message to the first handler that claims it.
    ///
    /// Unclaimed messages are dropped silently apart from a debug log.
    pub fn dispatch(&self, message: &Message) {
        for handler in &self.handlers {
            match handler.handle(message) {
                Outcome::Consumed => {
                    tracing::trace!(handler = handler.name(), kind = ?message.kind, "message consumed");
                    return;
                }
                Outcome::Continue => {}
            }
        }
        tracing::debug!(kind = ?message.kind, "no handler claimed message, dropping");
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for DispatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Recorder {
        name: &'static str,
        accepts: Option<MessageKind>,
        calls: Arc<AtomicUsize>,
    }

    impl MessageHandler for Recorder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle(&self, message: &Message) -> Outcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.accepts {
                Some(kind) if kind == message.kind => Outcome::Consumed,
                _ => Outcome::Continue,
            }
        }
    }

    #[test]
    fn test_first_match_wins_after_decline() {
        let a_calls = Arc::new(AtomicUsize::new(0));
        let b_calls = Arc::new(AtomicUsize::new(0));

        let mut registry = DispatchRegistry::new();
        // A declines Command, B accepts it.
        registry.register(Recorder {
            name: "a",
            accepts: None,
            calls: a_calls.clone(),
        });
        registry.register(Recorder {
            name: "b",
            accepts: Some(MessageKind::Command),
            calls: b_calls.clone(),
        });

        registry.dispatch(&Message::command(1, "p", None, "ls"));

        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_consumed_stops_chain() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut registry = DispatchRegistry::new();
        registry.register(Recorder {
            name: "first",
            accepts: Some(MessageKind::Heartbeat),
            calls: first.clone(),
        });
        registry.register(Recorder {
            name: "second",
            accepts: Some(MessageKind::Heartbeat),
            calls: second.clone(),
        });

        registry.dispatch(&Message::heartbeat());

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unclaimed_message_dropped_without_panic() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = DispatchRegistry::new();
        registry.register(Recorder {
            name: "only",
            accepts: Some(MessageKind::Print),
            calls: calls.clone(),
        });

        // Nothing accepts Heartbeat; dispatch just drops it.
        registry.dispatch(&Message::heartbeat());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_registry_drops_everything() {
        let registry = DispatchRegistry::new();
        assert!(registry.is_empty());
        registry.dispatch(&Message::print("nobody home"));
    }
}
