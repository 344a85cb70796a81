//! Session lifecycle phases.
//!
//! ```text
//! Opening ──open ok──▶ Streaming ──input exhausted / AFTER_SPEECH──▶ Finalizing
//!                                                     ──LAST write ok──▶ Draining
//!                                                     ──COMPLETE──▶ Closed
//! any phase ──error / cancel──▶ close ──▶ Failed
//! ```
//!
//! The driver records the phase it is in so a failure can say where it
//! happened.

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Waiting for the engine to open the session.
    #[default]
    Opening,
    /// Writing paced audio chunks.
    Streaming,
    /// Sending the zero-length last write.
    Finalizing,
    /// Polling for the remaining results.
    Draining,
    /// Closed after a complete result.
    Closed,
    /// Closed after an error or cancellation.
    Failed,
}

impl SessionPhase {
    /// Short lower-case label for logs and reports.
    ///
    /// ```
    /// use speech_session::session::SessionPhase;
    ///
    /// assert_eq!(SessionPhase::Draining.label(), "draining");
    /// assert_eq!(SessionPhase::Failed.to_string(), "failed");
    /// ```
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Opening => "opening",
            SessionPhase::Streaming => "streaming",
            SessionPhase::Finalizing => "finalizing",
            SessionPhase::Draining => "draining",
            SessionPhase::Closed => "closed",
            SessionPhase::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_opening() {
        assert_eq!(SessionPhase::default(), SessionPhase::Opening);
    }

    #[test]
    fn labels_are_distinct() {
        let all = [
            SessionPhase::Opening,
            SessionPhase::Streaming,
            SessionPhase::Finalizing,
            SessionPhase::Draining,
            SessionPhase::Closed,
            SessionPhase::Failed,
        ];
        let labels: std::collections::HashSet<_> = all.iter().map(|p| p.label()).collect();
        assert_eq!(labels.len(), all.len());
        assert_eq!(SessionPhase::Draining.to_string(), "draining");
    }
}
