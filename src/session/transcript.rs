//! Capacity-bounded text buffers.
//!
//! [`TranscriptBuffer`] accumulates result fragments in arrival order and
//! refuses any append that would reach its capacity, leaving the existing
//! text untouched.  [`CloseReason`] is the short diagnostic passed to the
//! engine on session close; it truncates instead of failing.

use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// CapacityExceeded
// ---------------------------------------------------------------------------

/// An append would have reached the transcript capacity.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("not enough buffer for transcript: {current} + {fragment} bytes, capacity {capacity}")]
pub struct CapacityExceeded {
    pub current: usize,
    pub fragment: usize,
    pub capacity: usize,
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Final text of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    /// Concatenation of all non-empty fragments, in arrival order.
    pub text: String,
    /// Number of fragments that made up `text`.
    pub fragments: usize,
}

impl std::fmt::Display for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

// ---------------------------------------------------------------------------
// TranscriptBuffer
// ---------------------------------------------------------------------------

/// Ordered, capacity-bounded accumulation of result fragments.
///
/// ```
/// use speech_session::session::TranscriptBuffer;
///
/// let mut buf = TranscriptBuffer::new(8);
/// buf.append("abc").unwrap();
/// buf.append("").unwrap();          // ignored
/// assert!(buf.append("defgh").is_err()); // 3 + 5 reaches capacity
/// assert_eq!(buf.finalize().text, "abc");
/// ```
#[derive(Debug)]
pub struct TranscriptBuffer {
    text: String,
    fragments: usize,
    capacity: usize,
}

impl TranscriptBuffer {
    /// Empty buffer holding strictly fewer than `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            text: String::new(),
            fragments: 0,
            capacity,
        }
    }

    /// Append `fragment` when `len() + fragment.len() < capacity`.
    ///
    /// Empty fragments are ignored.  On failure nothing is appended.
    pub fn append(&mut self, fragment: &str) -> Result<(), CapacityExceeded> {
        if fragment.is_empty() {
            return Ok(());
        }
        if self.text.len() + fragment.len() >= self.capacity {
            return Err(CapacityExceeded {
                current: self.text.len(),
                fragment: fragment.len(),
                capacity: self.capacity,
            });
        }
        self.text.push_str(fragment);
        self.fragments += 1;
        Ok(())
    }

    /// Accumulated byte length.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Text accumulated so far.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume the buffer and return the transcript.
    pub fn finalize(self) -> Transcript {
        Transcript {
            text: self.text,
            fragments: self.fragments,
        }
    }
}

// ---------------------------------------------------------------------------
// CloseReason
// ---------------------------------------------------------------------------

/// Short free-form reason handed to the engine when a session closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason(String);

impl CloseReason {
    /// `message` truncated to at most `capacity` bytes on a char boundary.
    pub fn bounded(message: &str, capacity: usize) -> Self {
        let mut end = message.len().min(capacity);
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        Self(message[..end].to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
