//! Collaborator interfaces: the local terminal backend and the auth secret
//! provider.
//!
//! Both are external to the connection core and consumed through narrow
//! traits. Real implementations (a shell-backed terminal, a derived secret)
//! live with the embedder; the test doubles here are enough for the core's
//! own tests and for headless clients.

use std::io;

/// Local terminal capability exposed to the command handler.
///
/// `execute` runs one command line to completion and returns its output.
/// It may block; the command handler always calls it from a blocking task.
pub trait Terminal: Send + Sync {
    /// Execute a command line and return its output.
    fn execute(&self, command_line: &str) -> io::Result<String>;

    /// Release any resources held by the terminal. Best-effort.
    fn close(&self) {}
}

/// Terminal double that echoes the command line back as its output.
pub struct EchoTerminal;

impl Terminal for EchoTerminal {
    fn execute(&self, command_line: &str) -> io::Result<String> {
        Ok(format!("{command_line}\n"))
    }
}

/// Source of the shared authentication secret.
///
/// Storage and derivation are out of scope; the connection only asks for
/// the current value when it is about to authenticate.
pub trait SecretProvider: Send + Sync {
    /// Get the current shared secret.
    fn get(&self) -> String;
}

/// Fixed secret, handed in at construction.
pub struct StaticSecret(pub String);

impl SecretProvider for StaticSecret {
    fn get(&self) -> String {
        self.0.clone()
    }
}
