//! Offline reference engine.
//!
//! [`LocalEngine`] implements [`RecognitionEngine`] without any vendor SDK:
//! it runs an [`EndpointDetector`] over the incoming PCM, reports endpoint
//! states from it, and produces one text fragment per detected utterance
//! (`"[speech 0.40s-1.20s]"`, or the grammar id in place of `speech` for
//! grammar sessions).  It exists so the driver and the CLI can be exercised
//! end to end on a machine with no recognition service.
//!
//! Session parameters understood: `sample_rate` (must be `16000` when
//! present) and `vad_eos` (end-of-speech silence in ms, overrides config).

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::audio::{EndpointDetector, SpeechSegment, VadPhase, SAMPLE_RATE};
use crate::config::LocalEngineConfig;

use super::{
    AudioState, EndpointState, EngineCode, FetchResult, LoginParams, RecognitionEngine,
    RecognitionState, SessionId, SessionParams, WriteStatus,
};

// ---------------------------------------------------------------------------
// LocalSession
// ---------------------------------------------------------------------------

struct LocalSession {
    /// Label used in emitted fragments.
    label: String,
    detector: EndpointDetector,
    fragments: VecDeque<String>,
    input_finished: bool,
}

impl LocalSession {
    fn push_segment(&mut self, seg: SpeechSegment) {
        self.fragments.push_back(format!(
            "[{} {:.2}s-{:.2}s]",
            self.label,
            seg.start_ms as f64 / 1_000.0,
            seg.end_ms as f64 / 1_000.0
        ));
    }

    fn endpoint(&self) -> EndpointState {
        match self.detector.phase() {
            VadPhase::Waiting => EndpointState::LookingForSpeech,
            VadPhase::Speaking => EndpointState::InSpeech,
            VadPhase::Ended => EndpointState::AfterSpeech,
        }
    }

    fn recognition(&self) -> RecognitionState {
        if !self.fragments.is_empty() {
            RecognitionState::PartialReady
        } else if self.input_finished {
            RecognitionState::Complete
        } else {
            RecognitionState::Pending
        }
    }
}

// ---------------------------------------------------------------------------
// LocalEngine
// ---------------------------------------------------------------------------

/// Energy-endpoint engine usable without a recognition service.
///
/// Safe to share across tasks; each session has its own detector state.
pub struct LocalEngine {
    config: LocalEngineConfig,
    logged_in: AtomicBool,
    next_id: AtomicU64,
    sessions: Mutex<HashMap<SessionId, LocalSession>>,
}

impl LocalEngine {
    /// Build an engine from its config section.
    pub fn from_config(config: &LocalEngineConfig) -> Self {
        Self {
            config: config.clone(),
            logged_in: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Number of sessions currently open.
    pub fn open_sessions(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::from_config(&LocalEngineConfig::default())
    }
}

#[async_trait]
impl RecognitionEngine for LocalEngine {
    async fn login(&self, params: &LoginParams) -> Result<(), EngineCode> {
        SessionParams::parse(&params.params).map_err(|e| {
            log::warn!("local-engine: {e}");
            EngineCode::INVALID_PARAMS
        })?;
        self.logged_in.store(true, Ordering::Release);
        Ok(())
    }

    async fn open_session(
        &self,
        grammar_id: Option<&str>,
        params: &str,
    ) -> Result<SessionId, EngineCode> {
        if !self.logged_in.load(Ordering::Acquire) {
            return Err(EngineCode::NOT_LOGGED_IN);
        }

        let params = SessionParams::parse(params).map_err(|e| {
            log::warn!("local-engine: {e}");
            EngineCode::INVALID_PARAMS
        })?;

        if let Some(rate) = params.get("sample_rate") {
            if rate.parse::<u32>().ok() != Some(SAMPLE_RATE) {
                log::warn!("local-engine: unsupported sample_rate {rate}");
                return Err(EngineCode::INVALID_PARAMS);
            }
        }

        let eos_ms = match params.get("vad_eos") {
            Some(v) => v.parse::<u64>().map_err(|_| EngineCode::INVALID_PARAMS)?,
            None => self.config.vad_eos_ms,
        };

        let label = match grammar_id {
            Some(id) if id.trim().is_empty() => return Err(EngineCode::INVALID_PARAMS),
            Some(id) => id.trim().to_owned(),
            None => "speech".to_owned(),
        };

        let id = SessionId(format!(
            "local-{}",
            self.next_id.fetch_add(1, Ordering::Relaxed)
        ));
        let session = LocalSession {
            label,
            detector: EndpointDetector::new(self.config.rms_threshold, eos_ms),
            fragments: VecDeque::new(),
            input_finished: false,
        };

        self.sessions
            .lock()
            .map_err(|_| EngineCode::INVALID_HANDLE)?
            .insert(id.clone(), session);

        log::debug!("local-engine: opened {id}");
        Ok(id)
    }

    async fn write_audio(
        &self,
        session: &SessionId,
        audio: &[u8],
        state: AudioState,
    ) -> Result<WriteStatus, EngineCode> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| EngineCode::INVALID_HANDLE)?;
        let s = sessions
            .get_mut(session)
            .ok_or(EngineCode::INVALID_HANDLE)?;

        if s.input_finished {
            return Err(EngineCode::INPUT_FINISHED);
        }

        for seg in s.detector.feed(audio) {
            s.push_segment(seg);
        }

        if state == AudioState::Last {
            s.input_finished = true;
            if let Some(seg) = s.detector.finish() {
                s.push_segment(seg);
            }
        }

        Ok(WriteStatus {
            endpoint: s.endpoint(),
            recognition: s.recognition(),
        })
    }

    async fn get_result(&self, session: &SessionId) -> Result<FetchResult, EngineCode> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| EngineCode::INVALID_HANDLE)?;
        let s = sessions
            .get_mut(session)
            .ok_or(EngineCode::INVALID_HANDLE)?;

        let text = s.fragments.pop_front();
        Ok(FetchResult {
            text,
            recognition: s.recognition(),
        })
    }

    async fn close_session(&self, session: Option<&SessionId>, reason: &str) {
        let Some(id) = session else {
            return;
        };
        let removed = self
            .sessions
            .lock()
            .map(|mut s| s.remove(id).is_some())
            .unwrap_or(false);

        if removed {
            log::debug!("local-engine: closed {id} ({reason})");
        } else {
            log::warn!("local-engine: close for unknown session {id}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
