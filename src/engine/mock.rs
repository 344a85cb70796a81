//! Scripted engine test double.
//!
//! [`ScriptedEngine`] records every call it receives and answers according to
//! a small script built with chained methods, so driver tests can inject a
//! failure at any step and then assert on the exact call sequence.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    AudioState, EndpointState, EngineCode, FetchResult, LoginParams, RecognitionEngine,
    RecognitionState, SessionId, WriteStatus,
};

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Login(String),
    Open {
        grammar_id: Option<String>,
        params: String,
    },
    Write {
        len: usize,
        state: AudioState,
    },
    Fetch,
    Close {
        session: Option<SessionId>,
        reason: String,
    },
}

struct Script {
    login: Result<(), EngineCode>,
    open: Result<(), EngineCode>,
    /// 1-based index of a non-final write → failure code.
    write_failures: HashMap<usize, EngineCode>,
    finalize_failure: Option<EngineCode>,
    after_speech_on: Option<usize>,
    partial_on: HashSet<usize>,
    last_write_reports: RecognitionState,
    fetches: VecDeque<Result<FetchResult, EngineCode>>,
    /// Answer once `fetches` is exhausted.
    exhausted: FetchResult,
    writes: usize,
    calls: Vec<EngineCall>,
}

/// Engine double driven by a pre-built script.
///
/// Defaults: login and open succeed, every write reports
/// `InSpeech` / `Pending`, the final write reports `Pending`, and a fetch
/// with an empty queue returns no text and `Complete`.
pub struct ScriptedEngine {
    script: Mutex<Script>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                login: Ok(()),
                open: Ok(()),
                write_failures: HashMap::new(),
                finalize_failure: None,
                after_speech_on: None,
                partial_on: HashSet::new(),
                last_write_reports: RecognitionState::Pending,
                fetches: VecDeque::new(),
                exhausted: FetchResult {
                    text: None,
                    recognition: RecognitionState::Complete,
                },
                writes: 0,
                calls: Vec::new(),
            }),
        }
    }

    fn edit(mut self, f: impl FnOnce(&mut Script)) -> Self {
        f(self.script.get_mut().unwrap());
        self
    }

    pub fn fail_login(self, code: EngineCode) -> Self {
        self.edit(|s| s.login = Err(code))
    }

    pub fn fail_open(self, code: EngineCode) -> Self {
        self.edit(|s| s.open = Err(code))
    }

    /// Fail the `n`-th (1-based) non-final write.
    pub fn fail_write(self, n: usize, code: EngineCode) -> Self {
        self.edit(|s| {
            s.write_failures.insert(n, code);
        })
    }

    /// Fail the zero-length final write.
    pub fn fail_finalize(self, code: EngineCode) -> Self {
        self.edit(|s| s.finalize_failure = Some(code))
    }

    /// Report `AfterSpeech` from the `n`-th non-final write onwards.
    pub fn after_speech_on(self, n: usize) -> Self {
        self.edit(|s| s.after_speech_on = Some(n))
    }

    /// Report `PartialReady` after the `n`-th non-final write.
    pub fn partial_on(self, n: usize) -> Self {
        self.edit(|s| {
            s.partial_on.insert(n);
        })
    }

    /// Recognition state reported by the final write.
    pub fn last_write_reports(self, state: RecognitionState) -> Self {
        self.edit(|s| s.last_write_reports = state)
    }

    /// Queue a successful fetch answer.
    pub fn fetch(self, text: Option<&str>, recognition: RecognitionState) -> Self {
        let text = text.map(str::to_owned);
        self.edit(|s| s.fetches.push_back(Ok(FetchResult { text, recognition })))
    }

    /// Queue a failing fetch.
    pub fn fetch_fail(self, code: EngineCode) -> Self {
        self.edit(|s| s.fetches.push_back(Err(code)))
    }

    /// Once the queue is empty, keep answering `Pending` forever.
    pub fn never_complete(self) -> Self {
        self.edit(|s| {
            s.exhausted = FetchResult {
                text: None,
                recognition: RecognitionState::Pending,
            }
        })
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.script.lock().unwrap().calls.clone()
    }

    /// `(len, state)` of every write, in order.
    pub fn writes(&self) -> Vec<(usize, AudioState)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Write { len, state } => Some((len, state)),
                _ => None,
            })
            .collect()
    }

    /// Every close call, in order.
    pub fn closes(&self) -> Vec<(Option<SessionId>, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                EngineCall::Close { session, reason } => Some((session, reason)),
                _ => None,
            })
            .collect()
    }

    /// Number of fetch calls.
    pub fn fetch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, EngineCall::Fetch))
            .count()
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecognitionEngine for ScriptedEngine {
    async fn login(&self, params: &LoginParams) -> Result<(), EngineCode> {
        let mut s = self.script.lock().unwrap();
        s.calls.push(EngineCall::Login(params.params.clone()));
        s.login
    }

    async fn open_session(
        &self,
        grammar_id: Option<&str>,
        params: &str,
    ) -> Result<SessionId, EngineCode> {
        let mut s = self.script.lock().unwrap();
        s.calls.push(EngineCall::Open {
            grammar_id: grammar_id.map(str::to_owned),
            params: params.to_owned(),
        });
        s.open.map(|()| SessionId("scripted-1".into()))
    }

    async fn write_audio(
        &self,
        _session: &SessionId,
        audio: &[u8],
        state: AudioState,
    ) -> Result<WriteStatus, EngineCode> {
        let mut s = self.script.lock().unwrap();
        s.calls.push(EngineCall::Write {
            len: audio.len(),
            state,
        });

        if state == AudioState::Last {
            if let Some(code) = s.finalize_failure {
                return Err(code);
            }
            return Ok(WriteStatus {
                endpoint: EndpointState::AfterSpeech,
                recognition: s.last_write_reports,
            });
        }

        s.writes += 1;
        let n = s.writes;
        if let Some(code) = s.write_failures.get(&n) {
            return Err(*code);
        }

        let endpoint = match s.after_speech_on {
            Some(at) if n >= at => EndpointState::AfterSpeech,
            _ => EndpointState::InSpeech,
        };
        let recognition = if s.partial_on.contains(&n) {
            RecognitionState::PartialReady
        } else {
            RecognitionState::Pending
        };
        Ok(WriteStatus {
            endpoint,
            recognition,
        })
    }

    async fn get_result(&self, _session: &SessionId) -> Result<FetchResult, EngineCode> {
        let mut s = self.script.lock().unwrap();
        s.calls.push(EngineCall::Fetch);
        match s.fetches.pop_front() {
            Some(answer) => answer,
            None => Ok(s.exhausted.clone()),
        }
    }

    async fn close_session(&self, session: Option<&SessionId>, reason: &str) {
        let mut s = self.script.lock().unwrap();
        s.calls.push(EngineCall::Close {
            session: session.cloned(),
            reason: reason.to_owned(),
        });
    }
}
