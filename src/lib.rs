//! Streaming speech-recognition sessions over pre-recorded PCM audio.
//!
//! ```text
//! audio::AudioBuffer ──chunks──▶ session::SessionDriver ──▶ engine::RecognitionEngine
//!                                       │                          ▲
//!                                       ▼                          │
//!                              session::Transcript      engine::EngineContext (login)
//! ```
//!
//! * [`audio`]   whole-file loading, chunking, endpoint detection
//! * [`engine`]  the engine seam, login context and the offline engine
//! * [`session`] the session driver and its result accumulator
//! * [`config`]  TOML settings

pub mod audio;
pub mod config;
pub mod engine;
pub mod session;

pub use audio::{AudioBuffer, FileError};
pub use engine::{EngineContext, LocalEngine, LoginParams, RecognitionEngine};
pub use session::{
    recognize_file, RecognitionMode, RecognizeError, SessionDriver, SessionError, SessionFailure,
    Transcript,
};
