//! Frame splitter for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management. Socket reads are
//! pushed in as they arrive; complete delimiter-bounded frames come out.
//! Fragmented frames stay buffered until the delimiter shows up.
//!
//! # Example
//!
//! ```
//! use termlink::codec::{FrameSplitter, DELIMITER};
//!
//! let mut splitter = FrameSplitter::new();
//! let mut data = b"hello".to_vec();
//! data.extend_from_slice(DELIMITER);
//!
//! let frames = splitter.push(&data).unwrap();
//! assert_eq!(&frames[0][..], b"hello");
//! ```

use bytes::{Bytes, BytesMut};

use super::wire::{DELIMITER, MAX_FRAME_SIZE};
use crate::error::{Result, TermlinkError};

/// Buffer that accumulates incoming bytes and yields complete frames.
pub struct FrameSplitter {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Maximum allowed frame size.
    max_frame_size: usize,
}

impl FrameSplitter {
    /// Create a splitter with the default 1 MiB frame cap.
    pub fn new() -> Self {
        Self::with_max_frame(MAX_FRAME_SIZE)
    }

    /// Create a splitter with a custom frame cap.
    pub fn with_max_frame(max_frame_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(64 * 1024),
            max_frame_size,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Returns the byte runs found between delimiters, delimiter excluded.
    /// Partial data is buffered for the next push.
    ///
    /// # Errors
    ///
    /// Returns [`TermlinkError::Protocol`] when a frame (complete or still
    /// accumulating) exceeds the size cap. The connection owning this
    /// splitter must be torn down; the buffer contents are unusable.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Bytes>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(pos) = find_delimiter(&self.buffer) {
            if pos > self.max_frame_size {
                return Err(self.oversized(pos));
            }
            let frame = self.buffer.split_to(pos).freeze();
            let _ = self.buffer.split_to(DELIMITER.len());
            frames.push(frame);
        }

        // A run that never finds its delimiter must not grow unbounded.
        if self.buffer.len() > self.max_frame_size + DELIMITER.len() {
            return Err(self.oversized(self.buffer.len()));
        }

        Ok(frames)
    }

    fn oversized(&self, size: usize) -> TermlinkError {
        TermlinkError::Protocol(format!(
            "frame size {} exceeds maximum {}",
            size, self.max_frame_size
        ))
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop buffered bytes, e.g. when the transport is replaced.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for FrameSplitter {
    fn default() -> Self {
        Self::new()
    }
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    if buf.len() < DELIMITER.len() {
        return None;
    }
    buf.windows(DELIMITER.len()).position(|w| w == DELIMITER)
}
