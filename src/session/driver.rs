//! Session driver: one recognition session from open to close.
//!
//! # Session flow
//!
//! ```text
//! open_session(grammar_id?, params)          [Opening]
//!   └─▶ for each chunk:                      [Streaming]
//!         write_audio(First | Continue)
//!         PartialReady  → get_result, append
//!         AfterSpeech   → stop streaming
//!         sleep(real-time length of chunk)
//!   └─▶ write_audio(&[], Last)               [Finalizing]
//!   └─▶ until Complete:                      [Draining]
//!         get_result, append, sleep(poll interval)
//!   └─▶ close_session(reason)                exactly once, on every path
//! ```
//!
//! Every wait is a tokio timer raced against the session's [`CancelToken`],
//! so many sessions can share one runtime and a cancel takes effect at the
//! next write, poll or pause.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::audio::{AudioBuffer, AudioFormat};
use crate::config::SessionConfig;
use crate::engine::{
    AudioState, EndpointState, EngineCode, EngineContext, RecognitionEngine, RecognitionState,
    SessionId,
};

use super::{
    CancelToken, CapacityExceeded, CloseReason, RecognitionMode, SessionEvent, SessionPhase,
    Transcript, TranscriptBuffer,
};

/// Close reason used when a session ends normally.
const NORMAL_END: &str = "normal end";

/// Close reason used when the driving future is dropped mid-session.
const DROPPED: &str = "session dropped";

// ---------------------------------------------------------------------------
// SessionError / SessionFailure
// ---------------------------------------------------------------------------

/// Errors that end a single session.  Other sessions are unaffected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session open failed, error code: {0}")]
    OpenFailed(EngineCode),
    #[error("audio write failed, error code: {0}")]
    WriteFailed(EngineCode),
    #[error("final audio write failed, error code: {0}")]
    FinalizeWriteFailed(EngineCode),
    #[error("result fetch failed, error code: {0}")]
    FetchFailed(EngineCode),
    #[error("no complete result after {polls} polls")]
    DrainTimeout { polls: u32 },
    #[error(transparent)]
    CapacityExceeded(#[from] CapacityExceeded),
    #[error("session cancelled")]
    Cancelled,
}

/// A failed session: the error, where it happened, and the text gathered
/// before it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{error} (while {phase})")]
pub struct SessionFailure {
    #[source]
    pub error: SessionError,
    pub phase: SessionPhase,
    /// Fragments appended before the failure.
    pub partial: String,
}

// ---------------------------------------------------------------------------
// SessionGuard
// ---------------------------------------------------------------------------

/// Owns an open engine session and closes it exactly once.
///
/// [`close`](Self::close) is the normal path.  If the guard is dropped
/// without it (the driving future was cancelled or aborted) the close is
/// spawned onto the current runtime instead.
struct SessionGuard {
    engine: Arc<dyn RecognitionEngine>,
    id: SessionId,
    /// Reason used when the close happens on drop.
    dropped: CloseReason,
    closed: bool,
}

impl SessionGuard {
    fn new(engine: Arc<dyn RecognitionEngine>, id: SessionId, dropped: CloseReason) -> Self {
        Self {
            engine,
            id,
            dropped,
            closed: false,
        }
    }

    async fn close(mut self, reason: &str) {
        self.closed = true;
        self.engine.close_session(Some(&self.id), reason).await;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let engine = Arc::clone(&self.engine);
        let id = self.id.clone();
        let reason = self.dropped.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                log::warn!("session {id}: dropped while open, closing in background");
                handle.spawn(async move {
                    engine.close_session(Some(&id), reason.as_str()).await;
                });
            }
            Err(_) => log::error!("session {id}: dropped outside a runtime, left open"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionDriver
// ---------------------------------------------------------------------------

/// Runs recognition sessions against a logged-in engine.
///
/// A driver is cheap to build and `Sync`; one driver may run several
/// sessions at once (each call to [`run_session`](Self::run_session) owns
/// its own audio and transcript).
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use speech_session::audio::AudioBuffer;
/// use speech_session::config::AppConfig;
/// use speech_session::engine::{EngineContext, LocalEngine, LoginParams};
/// use speech_session::session::{RecognitionMode, SessionDriver};
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let engine = Arc::new(LocalEngine::from_config(&config.local_engine));
/// let ctx = EngineContext::login(engine, LoginParams::new(config.login.params.clone()))
///     .await
///     .unwrap();
///
/// let driver = SessionDriver::new(ctx, config.session.clone());
/// let audio = AudioBuffer::load("iflytek01.wav").unwrap();
/// let transcript = driver
///     .run_session(&RecognitionMode::dictation(), audio)
///     .await
///     .unwrap();
/// println!("{transcript}");
/// # }
/// ```
pub struct SessionDriver {
    ctx: Arc<EngineContext>,
    config: SessionConfig,
    format: AudioFormat,
    cancel: CancelToken,
    events: Option<mpsc::Sender<SessionEvent>>,
}

impl SessionDriver {
    pub fn new(ctx: Arc<EngineContext>, config: SessionConfig) -> Self {
        let format = AudioFormat::new(config.frames_per_write);
        Self {
            ctx,
            config,
            format,
            cancel: CancelToken::new(),
            events: None,
        }
    }

    /// Use `cancel` to stop sessions run by this driver.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Send progress events to `tx`.
    pub fn with_events(mut self, tx: mpsc::Sender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Run one session over `audio` and return the final transcript.
    ///
    /// The engine session is closed exactly once whatever the outcome; when
    /// the open itself fails the close is issued with no handle.
    ///
    /// # Errors
    ///
    /// [`SessionFailure`] with the first [`SessionError`] hit, the phase it
    /// was hit in, and any text appended before it.
    pub async fn run_session(
        &self,
        mode: &RecognitionMode,
        mut audio: AudioBuffer,
    ) -> Result<Transcript, SessionFailure> {
        let engine = Arc::clone(self.ctx.engine());
        let mut transcript = TranscriptBuffer::new(self.config.transcript_capacity);

        log::info!(
            "session: opening {} session ({} bytes of audio)",
            mode.label(),
            audio.len()
        );

        let opened = if self.cancel.is_cancelled() {
            Err(SessionError::Cancelled)
        } else {
            let params = mode.params().to_string();
            engine
                .open_session(mode.grammar_id(), &params)
                .await
                .map_err(SessionError::OpenFailed)
        };

        let id = match opened {
            Ok(id) => id,
            Err(error) => {
                let reason = self.close_reason(&error.to_string());
                engine.close_session(None, reason.as_str()).await;
                log::error!("session: {error}");
                self.emit(SessionEvent::Closed {
                    phase: SessionPhase::Failed,
                    reason: reason.as_str().to_owned(),
                });
                return Err(SessionFailure {
                    error,
                    phase: SessionPhase::Opening,
                    partial: String::new(),
                });
            }
        };

        log::info!("session {id}: opened");
        self.emit(SessionEvent::Opened {
            session: id.clone(),
            mode: mode.label(),
        });

        let guard = SessionGuard::new(engine, id.clone(), self.close_reason(DROPPED));
        let mut phase = SessionPhase::Streaming;
        let outcome = self
            .stream(&guard, &mut audio, &mut transcript, &mut phase)
            .await;

        let reason = match &outcome {
            Ok(()) => self.close_reason(NORMAL_END),
            Err(error) => self.close_reason(&error.to_string()),
        };
        guard.close(reason.as_str()).await;

        match outcome {
            Ok(()) => {
                let transcript = transcript.finalize();
                log::info!(
                    "session {id}: closed, {} fragments / {} bytes",
                    transcript.fragments,
                    transcript.text.len()
                );
                self.emit(SessionEvent::Closed {
                    phase: SessionPhase::Closed,
                    reason: reason.as_str().to_owned(),
                });
                Ok(transcript)
            }
            Err(error) => {
                log::error!("session {id}: {error} while {phase}");
                self.emit(SessionEvent::Closed {
                    phase: SessionPhase::Failed,
                    reason: reason.as_str().to_owned(),
                });
                Err(SessionFailure {
                    error,
                    phase,
                    partial: transcript.finalize().text,
                })
            }
        }
    }

    /// Streaming, finalizing and draining.  `phase` tracks progress so the
    /// caller can report where a failure happened.
    async fn stream(
        &self,
        session: &SessionGuard,
        audio: &mut AudioBuffer,
        transcript: &mut TranscriptBuffer,
        phase: &mut SessionPhase,
    ) -> Result<(), SessionError> {
        let engine = &session.engine;
        let id = &session.id;
        let chunk_bytes = self.format.chunk_bytes();
        let mut chunks = 0usize;
        let mut bytes = 0usize;

        // ── 1. Paced chunk writes ────────────────────────────────────────
        enter(id, phase, SessionPhase::Streaming);
        loop {
            self.check_cancelled()?;
            let Some(chunk) = audio.next_chunk(chunk_bytes) else {
                break;
            };
            let audio_state = if chunk.is_first {
                AudioState::First
            } else {
                AudioState::Continue
            };
            let len = chunk.bytes.len();

            let status = engine
                .write_audio(id, chunk.bytes, audio_state)
                .await
                .map_err(SessionError::WriteFailed)?;
            chunks += 1;
            bytes += len;

            log::debug!(
                "session {id}: chunk {chunks} ({len} bytes, {audio_state:?}) → {:?}/{:?}",
                status.endpoint,
                status.recognition
            );
            self.emit(SessionEvent::ChunkWritten {
                index: chunks,
                bytes: len,
                audio: audio_state,
                endpoint: status.endpoint,
                recognition: status.recognition,
            });

            if status.recognition == RecognitionState::PartialReady {
                self.fetch_into(session, transcript).await?;
            }

            if status.endpoint == EndpointState::AfterSpeech {
                log::debug!("session {id}: end of speech after {chunks} chunks");
                self.emit(SessionEvent::EndOfSpeech { chunks });
                break;
            }

            self.pace(len).await?;
        }

        // ── 2. Zero-length last write ────────────────────────────────────
        enter(id, phase, SessionPhase::Finalizing);
        self.check_cancelled()?;
        let status = engine
            .write_audio(id, &[], AudioState::Last)
            .await
            .map_err(SessionError::FinalizeWriteFailed)?;
        log::debug!("session {id}: input finished, {chunks} chunks / {bytes} bytes");
        self.emit(SessionEvent::InputFinished { chunks, bytes });

        // ── 3. Drain remaining results ───────────────────────────────────
        enter(id, phase, SessionPhase::Draining);
        let mut recognition = status.recognition;
        let mut polls = 0u32;
        while !recognition.is_complete() {
            if polls >= self.config.max_drain_polls {
                return Err(SessionError::DrainTimeout { polls });
            }
            self.check_cancelled()?;
            recognition = self.fetch_into(session, transcript).await?;
            polls += 1;
            if !recognition.is_complete() {
                self.sleep(self.config.drain_poll_interval()).await?;
            }
        }
        log::debug!("session {id}: complete after {polls} polls");

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Fetch one result, append its text, and return the reported state.
    async fn fetch_into(
        &self,
        session: &SessionGuard,
        transcript: &mut TranscriptBuffer,
    ) -> Result<RecognitionState, SessionError> {
        let result = session
            .engine
            .get_result(&session.id)
            .await
            .map_err(SessionError::FetchFailed)?;

        if let Some(text) = result.text.filter(|t| !t.is_empty()) {
            transcript.append(&text)?;
            log::debug!("session {}: fragment {text:?}", session.id);
            self.emit(SessionEvent::Fragment { text });
        }
        Ok(result.recognition)
    }

    /// Wait out the real-time length of a `len`-byte chunk, or just yield
    /// when pacing is off.
    async fn pace(&self, len: usize) -> Result<(), SessionError> {
        if self.config.pace_realtime {
            self.sleep(self.format.duration_of(len)).await
        } else {
            tokio::task::yield_now().await;
            Ok(())
        }
    }

    /// Sleep for `duration` unless cancelled first.
    async fn sleep(&self, duration: Duration) -> Result<(), SessionError> {
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.cancel.cancelled() => Err(SessionError::Cancelled),
        }
    }

    fn check_cancelled(&self) -> Result<(), SessionError> {
        if self.cancel.is_cancelled() {
            Err(SessionError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn close_reason(&self, message: &str) -> CloseReason {
        CloseReason::bounded(message, self.config.close_reason_capacity)
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.events {
            if let Err(e) = tx.try_send(event) {
                log::trace!("session: event dropped: {e}");
            }
        }
    }
}

fn enter(id: &SessionId, phase: &mut SessionPhase, next: SessionPhase) {
    if *phase != next {
        log::debug!("session {id}: {phase} → {next}");
    }
    *phase = next;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
