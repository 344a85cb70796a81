//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for login, session
//! limits, the two recognition modes and the local engine, `AppPaths` for the
//! platform config directory, and TOML persistence via `AppConfig::load` /
//! `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, DictationConfig, GrammarConfig, LocalEngineConfig, LoginConfig, SessionConfig,
};
