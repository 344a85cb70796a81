//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across tasks.
//! Every section is `#[serde(default)]`, so a partial `settings.toml` only
//! overrides the keys it names.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// LoginConfig
// ---------------------------------------------------------------------------

/// Process-wide engine login settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Account name; most engines accept `None`.
    pub username: Option<String>,
    /// Account password; most engines accept `None`.
    pub password: Option<String>,
    /// Login parameter string, e.g. `"appid = 5864ae2d, work_dir = ."`.
    pub params: String,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            params: "appid = local, work_dir = .".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Streaming, pacing and buffer limits for every session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 20 ms frames pushed per write (10 → 6 400 bytes, 200 ms).
    pub frames_per_write: usize,
    /// Sleep for the real-time length of each chunk between writes.
    pub pace_realtime: bool,
    /// Pause between result polls once input has ended.
    pub drain_poll_interval_ms: u64,
    /// Result polls allowed after input ends before giving up.
    pub max_drain_polls: u32,
    /// Transcript capacity in bytes.
    pub transcript_capacity: usize,
    /// Close-reason capacity in bytes.
    pub close_reason_capacity: usize,
}

impl SessionConfig {
    pub fn drain_poll_interval(&self) -> Duration {
        Duration::from_millis(self.drain_poll_interval_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frames_per_write: 10,
            pace_realtime: true,
            drain_poll_interval_ms: 150,
            max_drain_polls: 200,
            transcript_capacity: 4_096,
            close_reason_capacity: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// DictationConfig / GrammarConfig
// ---------------------------------------------------------------------------

/// Free-form dictation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DictationConfig {
    /// Session parameters overlaid on the built-in dictation defaults.
    pub params: String,
}

/// Grammar-constrained recognition settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// Identifier of a grammar already registered with the engine.
    pub grammar_id: Option<String>,
    /// Session parameters overlaid on the built-in grammar defaults.
    pub params: String,
}

// ---------------------------------------------------------------------------
// LocalEngineConfig
// ---------------------------------------------------------------------------

/// Settings for the offline [`crate::engine::LocalEngine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalEngineConfig {
    /// RMS amplitude (0.0 – 1.0) above which a 20 ms frame counts as voice.
    pub rms_threshold: f32,
    /// Trailing silence in ms that ends an utterance.
    pub vad_eos_ms: u64,
}

impl Default for LocalEngineConfig {
    fn default() -> Self {
        Self {
            rms_threshold: 0.01,
            vad_eos_ms: 1_800,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use speech_session::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine login.
    pub login: LoginConfig,
    /// Streaming and limits.
    pub session: SessionConfig,
    /// Dictation mode parameters.
    pub dictation: DictationConfig,
    /// Grammar mode parameters.
    pub grammar: GrammarConfig,
    /// Offline engine settings.
    pub local_engine: LocalEngineConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
