//! Inbound command execution.
//!
//! Claims Command messages addressed to this client, runs them against the
//! local [`Terminal`] on a blocking task, and sends the correlated Promise
//! reply back through the connection. Execution failures are contained
//! here: they become an error reply, never a broken dispatch chain.

use std::sync::Arc;

use crate::connection::MessageSender;
use crate::dispatch::{MessageHandler, Outcome};
use crate::message::{keys, Message, MessageKind};
use crate::terminal::Terminal;

/// Chain link executing remote-issued terminal commands.
pub struct CommandHandler {
    terminal: Arc<dyn Terminal>,
    sender: MessageSender,
}

impl CommandHandler {
    /// Create a handler running commands on `terminal` and replying via
    /// `sender`.
    pub fn new(terminal: Arc<dyn Terminal>, sender: MessageSender) -> Self {
        Self { terminal, sender }
    }
}

impl MessageHandler for CommandHandler {
    fn name(&self) -> &'static str {
        "command"
    }

    fn handle(&self, message: &Message) -> Outcome {
        if message.kind != MessageKind::Command {
            return Outcome::Continue;
        }

        let Some(request_id) = message.request_id() else {
            tracing::warn!("command message without a usable request id");
            return Outcome::Consumed;
        };
        let Some(command_line) = message.attachment(keys::COMMAND) else {
            tracing::warn!(request_id, "command message without command line");
            return Outcome::Consumed;
        };

        let command_line = command_line.to_string();
        // Reply is routed back to whoever issued the command.
        let reply_target = message.attachment(keys::ORIGIN).map(str::to_string);
        let terminal = self.terminal.clone();
        let sender = self.sender.clone();

        // The terminal may block; get off the dispatch task before running it.
        tokio::spawn(async move {
            let executed =
                tokio::task::spawn_blocking(move || terminal.execute(&command_line)).await;

            let reply = match executed {
                Ok(Ok(output)) => Message::promise_ok(request_id, reply_target.as_deref(), &output),
                Ok(Err(e)) => {
                    tracing::warn!(request_id, error = %e, "command execution failed");
                    Message::promise_err(request_id, reply_target.as_deref(), &e.to_string())
                }
                Err(e) => {
                    tracing::warn!(request_id, error = %e, "command task failed");
                    Message::promise_err(request_id, reply_target.as_deref(), "execution aborted")
                }
            };

            if let Err(e) = sender.send(&reply).await {
                tracing::warn!(request_id, error = %e, "failed to send command reply");
            }
        });

        Outcome::Consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{MessageCodec, DELIMITER};
    use crate::terminal::EchoTerminal;
    use std::io;
    use tokio::sync::mpsc;

    struct FailingTerminal;

    impl Terminal for FailingTerminal {
        fn execute(&self, _command_line: &str) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::NotFound, "command not found"))
        }
    }

    async fn next_message(rx: &mut mpsc::Receiver<Vec<u8>>) -> Message {
        let bytes = rx.recv().await.unwrap();
        let frame = &bytes[..bytes.len() - DELIMITER.len()];
        MessageCodec::decode(frame).unwrap()
    }

    #[tokio::test]
    async fn test_executes_and_replies_ok() {
        let sender = MessageSender::new();
        let (tx, mut rx) = mpsc::channel(4);
        sender.install(tx);

        let handler = CommandHandler::new(Arc::new(EchoTerminal), sender);
        let outcome = handler.handle(&Message::command(5, "me", Some("peer-a"), "uptime"));
        assert_eq!(outcome, Outcome::Consumed);

        let reply = next_message(&mut rx).await;
        assert_eq!(reply.kind, MessageKind::Promise);
        assert_eq!(reply.request_id(), Some(5));
        assert_eq!(reply.attachment(keys::RESULT), Some("uptime\n"));
        assert_eq!(reply.attachment(keys::TARGET), Some("peer-a"));
    }

    #[tokio::test]
    async fn test_execution_failure_becomes_error_reply() {
        let sender = MessageSender::new();
        let (tx, mut rx) = mpsc::channel(4);
        sender.install(tx);

        let handler = CommandHandler::new(Arc::new(FailingTerminal), sender);
        handler.handle(&Message::command(6, "me", None, "nope"));

        let reply = next_message(&mut rx).await;
        assert_eq!(reply.request_id(), Some(6));
        assert_eq!(reply.attachment(keys::ERROR), Some("command not found"));
        assert_eq!(reply.attachment(keys::TARGET), None);
    }

    #[tokio::test]
    async fn test_declines_other_kinds() {
        let handler = CommandHandler::new(Arc::new(EchoTerminal), MessageSender::new());
        assert_eq!(handler.handle(&Message::print("x")), Outcome::Continue);
    }

    #[tokio::test]
    async fn test_malformed_command_consumed_without_reply() {
        let sender = MessageSender::new();
        let (tx, mut rx) = mpsc::channel(4);
        sender.install(tx);

        let handler = CommandHandler::new(Arc::new(EchoTerminal), sender);
        // No request id at all.
        let outcome = handler.handle(&Message::new(MessageKind::Command));
        assert_eq!(outcome, Outcome::Consumed);

        // Nothing was sent back.
        assert!(rx.try_recv().is_err());
    }
}
