//! Command-line arguments for the `speech-session` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Which recognition mode to open sessions in.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModeArg {
    /// Free-form speech-to-text
    #[default]
    Dictation,
    /// Recognition constrained to a registered grammar
    Grammar,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "speech-session",
    about = "Stream 16 kHz PCM files to a speech recognition engine",
    version
)]
pub struct CliArgs {
    /// Raw 16 kHz 16-bit mono PCM files, one session each
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Recognition mode
    #[arg(long, value_enum, default_value_t = ModeArg::Dictation)]
    pub mode: ModeArg,

    /// Grammar id for grammar mode (overrides the config file)
    #[arg(long)]
    pub grammar_id: Option<String>,

    /// Engine login parameters, e.g. "appid = 5864ae2d, work_dir = ."
    #[arg(long)]
    pub login_params: Option<String>,

    /// Extra session parameters overlaid on the mode defaults
    #[arg(long)]
    pub session_params: Option<String>,

    /// Settings file to use instead of the platform default
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Send audio as fast as the engine accepts it
    #[arg(long)]
    pub no_pacing: bool,

    /// Print one JSON object per file
    #[arg(long)]
    pub json: bool,

    /// Enable debug mode with verbose logging
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_dictation() {
        let args = CliArgs::try_parse_from(["speech-session", "a.pcm"]).unwrap();
        assert_eq!(args.mode, ModeArg::Dictation);
        assert_eq!(args.files, vec![PathBuf::from("a.pcm")]);
        assert!(!args.no_pacing);
        assert!(!args.json);
    }

    #[test]
    fn grammar_flags() {
        let args = CliArgs::try_parse_from([
            "speech-session",
            "--mode",
            "grammar",
            "--grammar-id",
            "digits",
            "--no-pacing",
            "a.pcm",
            "b.pcm",
        ])
        .unwrap();
        assert_eq!(args.mode, ModeArg::Grammar);
        assert_eq!(args.grammar_id.as_deref(), Some("digits"));
        assert!(args.no_pacing);
        assert_eq!(args.files.len(), 2);
    }

    #[test]
    fn at_least_one_file_is_required() {
        assert!(CliArgs::try_parse_from(["speech-session"]).is_err());
    }
}
