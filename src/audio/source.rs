//! In-memory audio payload with a monotonically advancing read cursor.
//!
//! The whole file is loaded before a session opens because the engine takes
//! `(pointer, length)` chunks synchronously; nothing is streamed from disk.
//!
//! # Chunking
//!
//! [`AudioBuffer::next_chunk`] hands out at most `max_len` bytes, except that
//! once fewer than `2 * max_len` bytes remain the rest is returned in one
//! slice so the session never ends with a tiny dangling write.
//!
//! ```
//! use speech_session::audio::AudioBuffer;
//!
//! let mut buf = AudioBuffer::from_bytes(vec![0u8; 25]);
//! let sizes: Vec<usize> = std::iter::from_fn(|| buf.next_chunk(10).map(|c| c.bytes.len())).collect();
//! assert_eq!(sizes, vec![10, 15]);
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

// ---------------------------------------------------------------------------
// FileError
// ---------------------------------------------------------------------------

/// Failures while loading the audio payload.  None of them touch the engine.
#[derive(Debug, Error)]
pub enum FileError {
    /// The file could not be opened.
    #[error("open [{path}] failed: {source}")]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fewer bytes were read than the file reported.
    #[error("read [{path}] error: expected {expected} bytes, got {actual}")]
    ReadShort {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Any other I/O failure while reading.
    #[error("read [{path}] failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// A borrowed slice of the payload handed to one engine write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioChunk<'a> {
    /// Payload bytes for this write.
    pub bytes: &'a [u8],
    /// `true` only for the first chunk taken from the buffer.
    pub is_first: bool,
}

// ---------------------------------------------------------------------------
// AudioBuffer
// ---------------------------------------------------------------------------

/// Owned PCM payload plus read cursor.
///
/// The bytes are immutable once loaded; only the cursor moves, and it never
/// passes `len()`.
pub struct AudioBuffer {
    data: Vec<u8>,
    cursor: usize,
}

impl std::fmt::Debug for AudioBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioBuffer")
            .field("len", &self.data.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl AudioBuffer {
    /// Read the whole file at `path` into memory.
    ///
    /// # Errors
    ///
    /// - [`FileError::NotFound`] if the file cannot be opened.
    /// - [`FileError::ReadShort`] if fewer bytes were read than its metadata
    ///   reports.
    /// - [`FileError::Io`] on a metadata or read failure.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|source| FileError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;

        let expected = file
            .metadata()
            .map_err(|source| FileError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let data = read_all(&mut file, expected, path)?;

        log::debug!("audio: loaded {} bytes from {}", data.len(), path.display());
        Ok(Self::from_bytes(data))
    }

    /// Wrap an already-resident payload.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, cursor: 0 }
    }

    /// Total payload length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` when the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes already handed out.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes not yet handed out.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    /// Take the next chunk of at most `max_len` bytes.
    ///
    /// When fewer than `2 * max_len` bytes remain, all of them are returned.
    /// Returns `None` once the buffer is exhausted.
    pub fn next_chunk(&mut self, max_len: usize) -> Option<AudioChunk<'_>> {
        let remaining = self.remaining();
        if remaining == 0 {
            return None;
        }

        let len = if remaining < max_len.saturating_mul(2) {
            remaining
        } else {
            max_len.max(1)
        };

        let start = self.cursor;
        self.cursor += len;

        Some(AudioChunk {
            bytes: &self.data[start..self.cursor],
            is_first: start == 0,
        })
    }
}

/// Read exactly `expected` bytes from `reader`.
///
/// Stops at `expected` even if more is available; fewer is
/// [`FileError::ReadShort`].
fn read_all(reader: impl Read, expected: u64, path: &Path) -> Result<Vec<u8>, FileError> {
    let mut data = Vec::with_capacity(expected as usize);
    let actual = reader
        .take(expected)
        .read_to_end(&mut data)
        .map_err(|source| FileError::Io {
            path: path.to_path_buf(),
            source,
        })? as u64;

    if actual != expected {
        return Err(FileError::ReadShort {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    Ok(data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn chunk_sizes(len: usize, max_len: usize) -> Vec<usize> {
        let mut buf = AudioBuffer::from_bytes(vec![0u8; len]);
        let mut sizes = Vec::new();
        while let Some(chunk) = buf.next_chunk(max_len) {
            sizes.push(chunk.bytes.len());
        }
        sizes
    }

    // ---- Chunking ----------------------------------------------------------

    #[test]
    fn short_payload_is_single_chunk() {
        assert_eq!(chunk_sizes(3_200, 6_400), vec![3_200]);
    }

    #[test]
    fn exact_multiple_keeps_nominal_size() {
        assert_eq!(chunk_sizes(5 * 6_400, 6_400), vec![6_400; 5]);
    }

    #[test]
    fn small_remainder_collapses_into_last_chunk() {
        // 2.5 chunks → one full chunk, then the 1.5-chunk tail in one go
        assert_eq!(chunk_sizes(16_000, 6_400), vec![6_400, 9_600]);
    }

    #[test]
    fn chunks_sum_to_length_without_overlap() {
        for len in [0usize, 1, 639, 640, 6_399, 6_400, 12_799, 12_800, 12_801, 100_003] {
            let mut buf = AudioBuffer::from_bytes((0..len).map(|i| (i % 251) as u8).collect());
            let mut rebuilt = Vec::with_capacity(len);
            while let Some(chunk) = buf.next_chunk(6_400) {
                rebuilt.extend_from_slice(chunk.bytes);
            }
            let expected: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            assert_eq!(rebuilt, expected, "len = {len}");
            assert_eq!(buf.remaining(), 0);
        }
    }

    #[test]
    fn chunk_count_never_exceeds_ceil() {
        for len in [1usize, 6_400, 6_401, 19_200, 25_000, 64_000] {
            let n = chunk_sizes(len, 6_400).len();
            assert!(n <= (len + 6_399) / 6_400, "len = {len}, chunks = {n}");
        }
    }

    #[test]
    fn is_first_only_once() {
        let mut buf = AudioBuffer::from_bytes(vec![0u8; 30_000]);
        let mut flags = Vec::new();
        while let Some(chunk) = buf.next_chunk(6_400) {
            flags.push(chunk.is_first);
        }
        assert_eq!(flags.first(), Some(&true));
        assert!(flags[1..].iter().all(|f| !f));
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        let mut buf = AudioBuffer::from_bytes(Vec::new());
        assert!(buf.is_empty());
        assert!(buf.next_chunk(6_400).is_none());
    }

    #[test]
    fn cursor_is_monotonic_and_bounded() {
        let mut buf = AudioBuffer::from_bytes(vec![0u8; 20_000]);
        let mut last = 0;
        while buf.next_chunk(6_400).is_some() {
            assert!(buf.cursor() > last);
            assert!(buf.cursor() <= buf.len());
            last = buf.cursor();
        }
        assert_eq!(buf.cursor(), buf.len());
        assert!(buf.next_chunk(6_400).is_none());
    }

    // ---- Loading -----------------------------------------------------------

    #[test]
    fn load_reads_whole_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(&[7u8; 1_234]).expect("write");

        let buf = AudioBuffer::load(file.path()).expect("load");
        assert_eq!(buf.len(), 1_234);
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let err = AudioBuffer::load("/nonexistent/audio.pcm").unwrap_err();
        assert!(matches!(err, FileError::NotFound { .. }));
        assert!(err.to_string().contains("/nonexistent/audio.pcm"));
    }

    #[test]
    fn truncated_reader_is_read_short() {
        let bytes = [1u8; 600];
        let err = read_all(&bytes[..], 640, Path::new("a.pcm")).unwrap_err();
        match err {
            FileError::ReadShort {
                expected, actual, ..
            } => {
                assert_eq!(expected, 640);
                assert_eq!(actual, 600);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn read_all_stops_at_expected_length() {
        let bytes = [2u8; 700];
        let data = read_all(&bytes[..], 640, Path::new("a.pcm")).unwrap();
        assert_eq!(data.len(), 640);
    }

    #[test]
    fn read_short_display_mentions_sizes() {
        let err = FileError::ReadShort {
            path: PathBuf::from("a.pcm"),
            expected: 10,
            actual: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("10") && msg.contains('4'));
    }
}
