//! Diagnostic print handler.

use crate::dispatch::{MessageHandler, Outcome};
use crate::message::{keys, Message, MessageKind};

/// Presentation sink callback for diagnostic text.
pub type PrintSink = Box<dyn Fn(&str) + Send + Sync>;

/// Routes Print messages to the embedder's presentation sink.
pub struct PrintHandler {
    sink: PrintSink,
}

impl PrintHandler {
    /// Create a handler forwarding text to `sink`.
    pub fn new(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            sink: Box::new(sink),
        }
    }

    /// Default sink: log the text locally.
    pub fn logging() -> Self {
        Self::new(|text| tracing::info!(target: "termlink::print", "{text}"))
    }
}

impl MessageHandler for PrintHandler {
    fn name(&self) -> &'static str {
        "print"
    }

    fn handle(&self, message: &Message) -> Outcome {
        if message.kind != MessageKind::Print {
            return Outcome::Continue;
        }

        match message.attachment(keys::TEXT) {
            Some(text) => (self.sink)(text),
            None => tracing::warn!("print message without text attachment"),
        }
        Outcome::Consumed
    }
}
