//! Engine parameter strings.
//!
//! Engines take their session and login options as a single
//! `"key = value, key = value"` string.  [`SessionParams`] keeps the pairs in
//! order, renders them back to that form, and parses user-supplied strings.
//!
//! ```
//! use speech_session::engine::SessionParams;
//!
//! let params = SessionParams::dictation_defaults().with("language", "en_us");
//! assert_eq!(params.get("language"), Some("en_us"));
//! assert!(params.to_string().starts_with("sub = iat, domain = iat, language = en_us"));
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A parameter segment without a `key = value` shape.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed parameter segment: {0:?}")]
pub struct ParamsError(pub String);

/// Ordered `key = value` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionParams {
    pairs: Vec<(String, String)>,
}

impl SessionParams {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-form dictation over 16 kHz Mandarin audio, plain UTF-8 results.
    pub fn dictation_defaults() -> Self {
        Self::new()
            .with("sub", "iat")
            .with("domain", "iat")
            .with("language", "zh_cn")
            .with("accent", "mandarin")
            .with("sample_rate", "16000")
            .with("result_type", "plain")
            .with("result_encoding", "utf8")
    }

    /// Grammar-constrained recognition, plain UTF-8 results.
    pub fn grammar_defaults() -> Self {
        Self::new()
            .with("sub", "asr")
            .with("result_type", "plain")
            .with("result_encoding", "utf8")
    }

    /// Parse `"key = value, key = value"`.
    ///
    /// Whitespace around keys and values is ignored and empty segments are
    /// skipped; a segment with no `=` or an empty key is an error.
    pub fn parse(s: &str) -> Result<Self, ParamsError> {
        let mut params = Self::new();
        for segment in s.split(',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ParamsError(segment.to_owned()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ParamsError(segment.to_owned()));
            }
            params.set(key, value.trim());
        }
        Ok(params)
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set(&mut self, key: &str, value: &str) {
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_owned(),
            None => self.pairs.push((key.to_owned(), value.to_owned())),
        }
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    /// Value of `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Overlay every pair of `other` onto `self`.
    pub fn merge(mut self, other: &SessionParams) -> Self {
        for (k, v) in &other.pairs {
            self.set(k, v);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for SessionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k} = {v}")?;
        }
        Ok(())
    }
}

impl FromStr for SessionParams {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictation_defaults_render() {
        assert_eq!(
            SessionParams::dictation_defaults().to_string(),
            "sub = iat, domain = iat, language = zh_cn, accent = mandarin, \
             sample_rate = 16000, result_type = plain, result_encoding = utf8"
        );
    }

    #[test]
    fn grammar_defaults_render() {
        assert_eq!(
            SessionParams::grammar_defaults().to_string(),
            "sub = asr, result_type = plain, result_encoding = utf8"
        );
    }

    #[test]
    fn parse_tolerates_whitespace_and_empty_segments() {
        let p = SessionParams::parse(" appid=5864ae2d ,, work_dir =  . ,").unwrap();
        assert_eq!(p.get("appid"), Some("5864ae2d"));
        assert_eq!(p.get("work_dir"), Some("."));
        assert_eq!(p.to_string(), "appid = 5864ae2d, work_dir = .");
    }

    #[test]
    fn parse_rejects_segment_without_equals() {
        let err = SessionParams::parse("sub = iat, garbage").unwrap_err();
        assert_eq!(err, ParamsError("garbage".into()));
    }

    #[test]
    fn parse_rejects_empty_key() {
        assert!(SessionParams::parse("= value").is_err());
    }

    #[test]
    fn set_replaces_in_place() {
        let p = SessionParams::grammar_defaults().with("sub", "iat");
        assert_eq!(p.to_string(), "sub = iat, result_type = plain, result_encoding = utf8");
    }

    #[test]
    fn merge_overrides_and_appends() {
        let overlay = SessionParams::parse("language = en_us, vad_eos = 900").unwrap();
        let p = SessionParams::dictation_defaults().merge(&overlay);
        assert_eq!(p.get("language"), Some("en_us"));
        assert_eq!(p.get("vad_eos"), Some("900"));
        assert_eq!(p.get("sub"), Some("iat"));
    }

    #[test]
    fn empty_string_is_empty_params() {
        assert!(SessionParams::parse("").unwrap().is_empty());
    }
}
