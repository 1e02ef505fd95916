//! Concrete dispatch chain links.
//!
//! Registered in this order at startup (order matters):
//!
//! 1. [`PrintHandler`] - diagnostic text to the presentation sink
//! 2. [`PromiseHandler`] - resolves correlated responses
//! 3. [`RosterHandler`] - reconciles server-pushed rosters
//! 4. [`CommandHandler`] - executes inbound terminal commands
//!
//! Everything else falls off the end of the chain and is dropped.

mod command;
mod print;
mod promise;
mod roster;

pub use command::CommandHandler;
pub use print::PrintHandler;
pub use promise::{PendingRequests, PromiseHandler};
pub use roster::RosterHandler;
