//! Message wire codec.
//!
//! Each message is a self-describing MessagePack map (`to_vec_named`, so the
//! body decodes without an external schema) followed by the frame delimiter.
//! Both ends agree on the delimiter out of band; payloads must not contain
//! it, which holds for this protocol's attachment values.
//!
//! # Example
//!
//! ```
//! use termlink::codec::MessageCodec;
//! use termlink::message::Message;
//!
//! let msg = Message::print("hello");
//! let bytes = MessageCodec::encode(&msg).unwrap();
//! let frame = &bytes[..bytes.len() - termlink::codec::DELIMITER.len()];
//! assert_eq!(MessageCodec::decode(frame).unwrap(), msg);
//! ```

use crate::error::{Result, TermlinkError};
use crate::message::Message;

/// Frame delimiter literal, agreed with the server out of band.
pub const DELIMITER: &[u8] = b"$_0xca";

/// Maximum size of a single frame (1 MiB). Exceeding it is a fatal
/// protocol error for the connection.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Codec for one message per frame.
///
/// Marker struct with static methods, selected at compile time.
pub struct MessageCodec;

impl MessageCodec {
    /// Encode a message to bytes with the frame delimiter appended.
    ///
    /// Never fails for well-formed messages; the `Result` only surfaces
    /// serializer-internal errors.
    pub fn encode(message: &Message) -> Result<Vec<u8>> {
        let mut buf = rmp_serde::to_vec_named(message)?;
        buf.extend_from_slice(DELIMITER);
        Ok(buf)
    }

    /// Decode one delimiter-bounded byte run back into a message.
    ///
    /// # Errors
    ///
    /// Returns [`TermlinkError::Protocol`] when the run exceeds
    /// [`MAX_FRAME_SIZE`] or cannot be parsed into a recognized
    /// kind/attachment structure.
    pub fn decode(frame: &[u8]) -> Result<Message> {
        if frame.len() > MAX_FRAME_SIZE {
            return Err(TermlinkError::Protocol(format!(
                "frame size {} exceeds maximum {}",
                frame.len(),
                MAX_FRAME_SIZE
            )));
        }

        rmp_serde::from_slice(frame)
            .map_err(|e| TermlinkError::Protocol(format!("unreadable frame: {e}")))
    }
}
