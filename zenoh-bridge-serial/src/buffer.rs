//! Byte accumulation and `{...}` frame extraction.
//!
//! The device writes JSON objects to the serial line with no length prefix.
//! Reads return arbitrary slices of that stream, so bytes are accumulated in
//! a fixed-capacity buffer until a start marker followed by an end marker is
//! present. One frame is taken per buffer fill: extraction empties the whole
//! buffer, dropping any stray bytes around the frame.

use thiserror::Error;

/// Byte opening a frame.
pub const START_MARKER: u8 = b'{';

/// Byte closing a frame.
pub const END_MARKER: u8 = b'}';

/// Default buffer capacity in bytes.
pub const DEFAULT_CAPACITY: usize = 256;

/// Smallest usable capacity (one byte of window plus the reserved slot).
pub const MIN_CAPACITY: usize = 2;

/// Buffer errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("appending {incoming} bytes to {filled} buffered would exceed capacity {capacity}")]
    Capacity {
        incoming: usize,
        filled: usize,
        capacity: usize,
    },
}

/// A complete `{...}` record borrowed from the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    bytes: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Wrap a byte slice that starts with `{` and ends with `}`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// Frame bytes including both markers.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Frame length including both markers.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length slice. Frames extracted from a buffer never are.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Result of an extraction attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum Extraction<'a> {
    /// A complete frame; the buffer is now empty.
    Frame(Frame<'a>),
    /// No complete frame yet; buffered bytes are kept for the next read.
    Incomplete,
    /// The buffer filled up without a complete frame and was emptied.
    Overflow { dropped: usize },
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    SeekStart,
    SeekEnd { start: usize },
}

/// Fixed-capacity accumulation buffer.
///
/// The storage is allocated once and reused for the lifetime of the buffer.
/// At most `capacity - 1` bytes are requested from the transport per fill;
/// reaching that mark without a frame counts as overflow.
pub struct FrameBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("capacity", &self.data.len())
            .field("len", &self.len)
            .finish()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl FrameBuffer {
    /// Create an empty buffer. Capacities below [`MIN_CAPACITY`] are raised to it.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity.max(MIN_CAPACITY)].into_boxed_slice(),
            len: 0,
        }
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Buffered bytes.
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// How many bytes the next read may request.
    pub fn remaining(&self) -> usize {
        self.window().saturating_sub(self.len)
    }

    /// True once the read window is used up.
    pub fn is_saturated(&self) -> bool {
        self.len >= self.window()
    }

    fn window(&self) -> usize {
        self.data.len() - 1
    }

    /// Drop all buffered bytes.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append bytes after the buffered ones.
    ///
    /// Fails without modifying the buffer if the bytes don't fit.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        let end = self.len + bytes.len();
        if end > self.data.len() {
            return Err(BufferError::Capacity {
                incoming: bytes.len(),
                filled: self.len,
                capacity: self.data.len(),
            });
        }

        self.data[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    /// Take the first complete frame, or evict everything on overflow.
    pub fn try_extract_frame(&mut self) -> Extraction<'_> {
        match self.scan() {
            Some((start, end)) => {
                self.len = 0;
                Extraction::Frame(Frame::new(&self.data[start..=end]))
            }
            None if self.is_saturated() => {
                let dropped = self.len;
                self.len = 0;
                Extraction::Overflow { dropped }
            }
            None => Extraction::Incomplete,
        }
    }

    /// Locate the first start marker and the first end marker after it.
    fn scan(&self) -> Option<(usize, usize)> {
        let mut state = ScanState::SeekStart;

        for (i, &byte) in self.filled().iter().enumerate() {
            state = match (state, byte) {
                (ScanState::SeekStart, START_MARKER) => ScanState::SeekEnd { start: i },
                (ScanState::SeekEnd { start }, END_MARKER) => return Some((start, i)),
                (state, _) => state,
            };
        }

        None
    }
}
