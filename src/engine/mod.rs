//! Recognition engine seam.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │              RecognitionEngine (async trait)              │
//! │                                                          │
//! │   login ─▶ EngineContext ──┐                             │
//! │                            ▼                             │
//! │   open_session ─▶ write_audio* ─▶ get_result* ─▶ close   │
//! │                                                          │
//! │   SessionParams    "key = value, ..." option strings     │
//! │   LocalEngine      offline energy-endpoint engine        │
//! │   ScriptedEngine   test double (cfg(test))               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine itself is opaque: it accepts PCM chunks and reports status
//! codes plus partial text.  Everything the driver needs to know about a
//! write is carried by [`WriteStatus`]; every fetch returns a
//! [`FetchResult`].

pub mod context;
pub mod local;
#[cfg(test)]
pub mod mock;
pub mod params;

use std::fmt;

use async_trait::async_trait;

pub use context::{EngineContext, LoginError, LoginParams};
pub use local::LocalEngine;
#[cfg(test)]
pub use mock::{EngineCall, ScriptedEngine};
pub use params::{ParamsError, SessionParams};

// ---------------------------------------------------------------------------
// EngineCode
// ---------------------------------------------------------------------------

/// Non-success status code reported by an engine call.
///
/// `0` is success on the engine side and is never wrapped in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineCode(pub i32);

impl EngineCode {
    /// A parameter string or argument was rejected.
    pub const INVALID_PARAMS: EngineCode = EngineCode(10106);
    /// The session handle is unknown or already closed.
    pub const INVALID_HANDLE: EngineCode = EngineCode(10108);
    /// No successful login precedes the call.
    pub const NOT_LOGGED_IN: EngineCode = EngineCode(10111);
    /// Audio was written after the end of input.
    pub const INPUT_FINISHED: EngineCode = EngineCode(10114);

    /// Raw integer value.
    pub fn value(self) -> i32 {
        self.0
    }
}

impl fmt::Display for EngineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Semantic position of a written chunk within the session input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    /// The very first chunk of the session.
    First,
    /// Any later non-empty chunk.
    Continue,
    /// The terminating zero-length write.
    Last,
}

/// Where the engine believes the stream is in the speech/silence timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    LookingForSpeech,
    InSpeech,
    /// End of utterance detected; the driver stops sending audio.
    AfterSpeech,
}

/// Result availability reported after a write or a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionState {
    /// Nothing new yet.
    Pending,
    /// A partial result is waiting to be fetched.
    PartialReady,
    /// Recognition is finished; no further results will arrive.
    Complete,
}

impl RecognitionState {
    /// Returns `true` for [`RecognitionState::Complete`].
    pub fn is_complete(self) -> bool {
        self == RecognitionState::Complete
    }
}

// ---------------------------------------------------------------------------
// Call results
// ---------------------------------------------------------------------------

/// Opaque session handle issued by [`RecognitionEngine::open_session`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Statuses reported by a successful [`RecognitionEngine::write_audio`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteStatus {
    pub endpoint: EndpointState,
    pub recognition: RecognitionState,
}

/// Output of a successful [`RecognitionEngine::get_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Text fragment, if the engine had one.
    pub text: Option<String>,
    /// Recognition state after this fetch.
    pub recognition: RecognitionState,
}

// ---------------------------------------------------------------------------
// RecognitionEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface to a streaming recognition engine.
///
/// Implementations must be `Send + Sync` so one engine can serve several
/// independent sessions from different tasks.  Calls for the same
/// [`SessionId`] are always issued sequentially by the driver.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Process-wide login.  Called once, through [`EngineContext::login`].
    async fn login(&self, params: &LoginParams) -> Result<(), EngineCode>;

    /// Open a session.  `grammar_id` is `None` for dictation.
    async fn open_session(
        &self,
        grammar_id: Option<&str>,
        params: &str,
    ) -> Result<SessionId, EngineCode>;

    /// Push one chunk (empty for [`AudioState::Last`]).
    async fn write_audio(
        &self,
        session: &SessionId,
        audio: &[u8],
        state: AudioState,
    ) -> Result<WriteStatus, EngineCode>;

    /// Fetch whatever result text is available.
    async fn get_result(&self, session: &SessionId) -> Result<FetchResult, EngineCode>;

    /// Close a session.  `None` (open never succeeded) must be a no-op.
    async fn close_session(&self, session: Option<&SessionId>, reason: &str);
}

// Compile-time assertion: Box<dyn RecognitionEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn RecognitionEngine>) {}
};

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_code_display_is_numeric() {
        assert_eq!(EngineCode(10108).to_string(), "10108");
        assert_eq!(EngineCode::INVALID_HANDLE.value(), 10108);
    }

    #[test]
    fn only_complete_is_complete() {
        assert!(RecognitionState::Complete.is_complete());
        assert!(!RecognitionState::PartialReady.is_complete());
        assert!(!RecognitionState::Pending.is_complete());
    }

    #[test]
    fn session_id_display() {
        let id = SessionId("local-7".into());
        assert_eq!(id.to_string(), "local-7");
        assert_eq!(id.as_str(), "local-7");
    }
}
