//! Audio payload handling: whole-file PCM loading, chunking and endpoint
//! detection.
//!
//! # Pipeline
//!
//! ```text
//! file → AudioBuffer::load → next_chunk(6 400 B) → engine write
//!                                               └─▶ EndpointDetector (local engine)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use speech_session::audio::{AudioBuffer, AudioFormat};
//!
//! let mut buf = AudioBuffer::load("wav/iflytek01.wav").unwrap();
//! let fmt = AudioFormat::default();
//! while let Some(chunk) = buf.next_chunk(fmt.chunk_bytes()) {
//!     println!("{} bytes, first = {}", chunk.bytes.len(), chunk.is_first);
//! }
//! ```

pub mod format;
pub mod source;
pub mod vad;

pub use format::{AudioFormat, CHUNK_BYTES, FRAME_BYTES, FRAME_MS, SAMPLE_RATE};
pub use source::{AudioBuffer, AudioChunk, FileError};
pub use vad::{EndpointDetector, SpeechSegment, VadPhase};
