//! Recognition sessions.
//!
//! A session streams one audio buffer to a logged-in engine and gathers the
//! text it produces:
//!
//! ```text
//! AudioBuffer ──▶ SessionDriver::run_session(mode) ──▶ TranscriptBuffer ──▶ Transcript
//!                    │  open / write* / last / fetch* / close
//!                    ▼
//!               EngineContext (Arc<dyn RecognitionEngine>)
//! ```
//!
//! [`recognize_file`] is the one-call form: load a file, run a session.

pub mod cancel;
pub mod driver;
pub mod events;
pub mod mode;
pub mod state;
pub mod transcript;

pub use cancel::CancelToken;
pub use driver::{SessionDriver, SessionError, SessionFailure};
pub use events::SessionEvent;
pub use mode::{ModeError, RecognitionMode};
pub use state::SessionPhase;
pub use transcript::{CapacityExceeded, CloseReason, Transcript, TranscriptBuffer};

use std::io;
use std::path::Path;

use thiserror::Error;

use crate::audio::{AudioBuffer, FileError};

/// Failure of [`recognize_file`].
#[derive(Debug, Error)]
pub enum RecognizeError {
    /// The audio file could not be loaded; the engine was not contacted.
    #[error(transparent)]
    File(#[from] FileError),
    #[error(transparent)]
    Session(#[from] SessionFailure),
}

/// Load `path` and run one session over it.
///
/// The file read runs on the blocking thread pool.
pub async fn recognize_file(
    driver: &SessionDriver,
    mode: &RecognitionMode,
    path: impl AsRef<Path>,
) -> Result<Transcript, RecognizeError> {
    let path = path.as_ref().to_path_buf();
    log::debug!("session: loading {}", path.display());

    let audio = {
        let path = path.clone();
        tokio::task::spawn_blocking(move || AudioBuffer::load(&path)).await
    }
    .map_err(|e| FileError::Io {
        path,
        source: io::Error::new(io::ErrorKind::Other, e),
    })??;

    Ok(driver.run_session(mode, audio).await?)
}

/// [`recognize_file`], then hand the outcome to `on_complete` before
/// returning it.
pub async fn recognize_file_with<F>(
    driver: &SessionDriver,
    mode: &RecognitionMode,
    path: impl AsRef<Path>,
    on_complete: F,
) -> Result<Transcript, RecognizeError>
where
    F: FnOnce(&Result<Transcript, RecognizeError>),
{
    let result = recognize_file(driver, mode, path).await;
    on_complete(&result);
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
