//! Explicit process-wide login state.
//!
//! An [`EngineContext`] is the only way to reach an engine from the session
//! driver: it is constructed once by a successful login and then shared
//! (`Arc<EngineContext>`) by every session, so a session can never be opened
//! against an engine nobody logged into.

use std::sync::Arc;

use thiserror::Error;

use super::{EngineCode, RecognitionEngine};

// ---------------------------------------------------------------------------
// LoginParams
// ---------------------------------------------------------------------------

/// Credentials and login parameter string.
///
/// Username and password are optional; most deployments pass only the
/// parameter string (e.g. `"appid = 5864ae2d, work_dir = ."`).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginParams {
    pub username: Option<String>,
    pub password: Option<String>,
    pub params: String,
}

impl LoginParams {
    /// Login with a parameter string only.
    pub fn new(params: impl Into<String>) -> Self {
        Self {
            params: params.into(),
            ..Self::default()
        }
    }
}

impl std::fmt::Debug for LoginParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginParams")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("params", &self.params)
            .finish()
    }
}

/// The engine refused the login.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("login failed, error code: {0}")]
pub struct LoginError(pub EngineCode);

// ---------------------------------------------------------------------------
// EngineContext
// ---------------------------------------------------------------------------

/// A logged-in engine, shared by all sessions of the process.
pub struct EngineContext {
    engine: Arc<dyn RecognitionEngine>,
    login: LoginParams,
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("login", &self.login)
            .finish_non_exhaustive()
    }
}

impl EngineContext {
    /// Log into `engine` and wrap it for sharing.
    ///
    /// # Errors
    ///
    /// [`LoginError`] carrying the engine's status code.
    pub async fn login(
        engine: Arc<dyn RecognitionEngine>,
        login: LoginParams,
    ) -> Result<Arc<Self>, LoginError> {
        engine.login(&login).await.map_err(LoginError)?;
        log::info!("engine: logged in ({})", login.params);
        Ok(Arc::new(Self { engine, login }))
    }

    /// The logged-in engine.
    pub fn engine(&self) -> &Arc<dyn RecognitionEngine> {
        &self.engine
    }

    /// Parameters used for the login.
    pub fn login_params(&self) -> &LoginParams {
        &self.login
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
