//! Progress notifications emitted by the session driver.
//!
//! Events are delivered over a bounded `tokio::sync::mpsc` channel with
//! `try_send`: a slow or absent consumer never stalls the audio pacing, it
//! only loses events.

use crate::engine::{AudioState, EndpointState, RecognitionState, SessionId};

use super::SessionPhase;

/// One step of a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The engine accepted the session.
    Opened { session: SessionId, mode: &'static str },
    /// An audio chunk was written.
    ChunkWritten {
        index: usize,
        bytes: usize,
        audio: AudioState,
        endpoint: EndpointState,
        recognition: RecognitionState,
    },
    /// The engine detected the end of speech; no further chunks are sent.
    EndOfSpeech { chunks: usize },
    /// A non-empty result fragment was appended to the transcript.
    Fragment { text: String },
    /// The zero-length last write was accepted.
    InputFinished { chunks: usize, bytes: usize },
    /// The session was closed.
    Closed { phase: SessionPhase, reason: String },
}
