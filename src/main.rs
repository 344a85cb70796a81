//! Command-line entry point.
//!
//! # Startup sequence
//!
//! 1. Parse arguments and initialise logging.
//! 2. Load [`AppConfig`] (platform default path, or `--config`) and apply
//!    command-line overrides.
//! 3. Log into the [`LocalEngine`] once and share the [`EngineContext`].
//! 4. Spawn one session task per input file on a [`JoinSet`].
//! 5. Print one line per file as each session completes.
//!
//! Ctrl-C cancels every running session; each still closes its engine
//! session before reporting.

mod cli;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::task::JoinSet;

use speech_session::{
    config::AppConfig,
    engine::{EngineContext, LocalEngine, LoginParams, SessionParams},
    session::{recognize_file, CancelToken, RecognitionMode, RecognizeError, SessionDriver},
    Transcript,
};

use cli::{CliArgs, ModeArg};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("Failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };

    if let Some(params) = &args.login_params {
        config.login.params = params.clone();
    }
    if args.no_pacing {
        config.session.pace_realtime = false;
    }
    Ok(config)
}

fn build_mode(args: &CliArgs, config: &AppConfig) -> Result<RecognitionMode> {
    let mode = match args.mode {
        ModeArg::Dictation => RecognitionMode::dictation_from(&config.dictation)?,
        ModeArg::Grammar => {
            RecognitionMode::grammar_from(&config.grammar, args.grammar_id.clone())?
        }
    };
    Ok(match &args.session_params {
        Some(extra) => mode.with_params(&extra.parse::<SessionParams>()?),
        None => mode,
    })
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// Completion record for one file.
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    transcript: Option<Transcript>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phase: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    partial: Option<String>,
}

impl FileReport {
    fn new(path: &Path, result: &Result<Transcript, RecognizeError>) -> Self {
        let mut report = Self {
            file: path.display().to_string(),
            transcript: None,
            error: None,
            phase: None,
            partial: None,
        };
        match result {
            Ok(transcript) => report.transcript = Some(transcript.clone()),
            Err(RecognizeError::Session(failure)) => {
                report.error = Some(failure.error.to_string());
                report.phase = Some(failure.phase.label());
                report.partial = Some(failure.partial.clone()).filter(|p| !p.is_empty());
            }
            Err(e) => report.error = Some(e.to_string()),
        }
        report
    }

    fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    fn render(&self, json: bool) -> Result<String> {
        if json {
            return Ok(serde_json::to_string(self)?);
        }
        Ok(match (&self.transcript, &self.error) {
            (Some(t), _) => format!("{}: {}", self.file, t.text),
            (None, Some(e)) => match &self.partial {
                Some(p) => format!("{}: error: {e} (partial: {p})", self.file),
                None => format!("{}: error: {e}", self.file),
            },
            (None, None) => format!("{}:", self.file),
        })
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run every file; `Ok(true)` when all sessions succeeded.
async fn run(args: CliArgs) -> Result<bool> {
    let config = load_config(&args)?;
    let mode = Arc::new(build_mode(&args, &config)?);
    log::info!("mode: {} ({})", mode.label(), mode.params());

    let engine = Arc::new(LocalEngine::from_config(&config.local_engine));
    let login = LoginParams {
        username: config.login.username.clone(),
        password: config.login.password.clone(),
        params: config.login.params.clone(),
    };
    let ctx = EngineContext::login(engine, login).await?;

    let cancel = CancelToken::new();
    let driver = Arc::new(SessionDriver::new(ctx, config.session.clone()).with_cancel(cancel.clone()));

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, cancelling sessions");
            cancel.cancel();
        }
    });

    let mut tasks = JoinSet::new();
    for path in args.files.iter().cloned() {
        let driver = Arc::clone(&driver);
        let mode = Arc::clone(&mode);
        tasks.spawn(async move {
            let result = recognize_file(&driver, &mode, &path).await;
            FileReport::new(&path, &result)
        });
    }

    let mut all_ok = true;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => {
                all_ok &= report.is_ok();
                let line = report.render(args.json)?;
                if report.is_ok() {
                    println!("{line}");
                } else {
                    eprintln!("{line}");
                }
            }
            Err(e) => {
                all_ok = false;
                log::error!("session task failed: {e}");
            }
        }
    }
    Ok(all_ok)
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // 1. Logging
    let filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();
    log::info!("speech-session starting up");

    // 2. Tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    // 3. Sessions
    match rt.block_on(run(args)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
