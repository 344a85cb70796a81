//! Recognition modes.
//!
//! Dictation and grammar recognition share the whole session protocol and
//! differ only in what is passed to `open_session`, so a single driver runs
//! both, parameterised by [`RecognitionMode`].

use thiserror::Error;

use crate::config::{DictationConfig, GrammarConfig};
use crate::engine::{ParamsError, SessionParams};

/// A mode could not be built from configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModeError {
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error("grammar mode requires a grammar id")]
    MissingGrammarId,
}

/// What a session recognises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionMode {
    /// Free-form speech-to-text.
    Dictation { params: SessionParams },
    /// Recognition constrained to a grammar already registered with the
    /// engine.
    Grammar {
        grammar_id: String,
        params: SessionParams,
    },
}

impl RecognitionMode {
    /// Dictation with the built-in default parameters.
    pub fn dictation() -> Self {
        RecognitionMode::Dictation {
            params: SessionParams::dictation_defaults(),
        }
    }

    /// Grammar recognition against `grammar_id` with default parameters.
    pub fn grammar(grammar_id: impl Into<String>) -> Self {
        RecognitionMode::Grammar {
            grammar_id: grammar_id.into(),
            params: SessionParams::grammar_defaults(),
        }
    }

    /// Dictation defaults overlaid with `config.params`.
    pub fn dictation_from(config: &DictationConfig) -> Result<Self, ModeError> {
        let overlay = SessionParams::parse(&config.params)?;
        Ok(RecognitionMode::Dictation {
            params: SessionParams::dictation_defaults().merge(&overlay),
        })
    }

    /// Grammar defaults overlaid with `config.params`.
    ///
    /// `grammar_id` wins over the configured id when given.
    pub fn grammar_from(
        config: &GrammarConfig,
        grammar_id: Option<String>,
    ) -> Result<Self, ModeError> {
        let grammar_id = grammar_id
            .or_else(|| config.grammar_id.clone())
            .filter(|id| !id.trim().is_empty())
            .ok_or(ModeError::MissingGrammarId)?;
        let overlay = SessionParams::parse(&config.params)?;
        Ok(RecognitionMode::Grammar {
            grammar_id,
            params: SessionParams::grammar_defaults().merge(&overlay),
        })
    }

    /// Overlay extra session parameters on this mode.
    pub fn with_params(mut self, extra: &SessionParams) -> Self {
        match &mut self {
            RecognitionMode::Dictation { params } | RecognitionMode::Grammar { params, .. } => {
                *params = std::mem::take(params).merge(extra);
            }
        }
        self
    }

    /// Grammar id passed to `open_session`; `None` for dictation.
    pub fn grammar_id(&self) -> Option<&str> {
        match self {
            RecognitionMode::Dictation { .. } => None,
            RecognitionMode::Grammar { grammar_id, .. } => Some(grammar_id),
        }
    }

    pub fn params(&self) -> &SessionParams {
        match self {
            RecognitionMode::Dictation { params } | RecognitionMode::Grammar { params, .. } => {
                params
            }
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            RecognitionMode::Dictation { .. } => "dictation",
            RecognitionMode::Grammar { .. } => "grammar",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
