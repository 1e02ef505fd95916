//! Codec module - wire encoding and stream framing.
//!
//! Two stages, each independently testable with in-memory buffers:
//!
//! - [`MessageCodec`] - serializes a [`crate::message::Message`] to bytes and
//!   appends the frame delimiter; parses one delimited byte run back.
//! - [`FrameSplitter`] - accumulates raw socket reads and yields
//!   delimiter-bounded frames.

mod splitter;
mod wire;

pub use splitter::FrameSplitter;
pub use wire::{MessageCodec, DELIMITER, MAX_FRAME_SIZE};
