//! PCM payload format shared by the audio source, the pacing logic and the
//! local engine.
//!
//! Every session streams raw 16 kHz, 16-bit, mono little-endian PCM.  The
//! engine consumes it in 20 ms frames of 640 bytes, and the driver writes
//! 10 frames (200 ms) per call.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Sample rate of the payload in Hz.
pub const SAMPLE_RATE: u32 = 16_000;

/// Bytes per sample (16-bit PCM).
pub const BYTES_PER_SAMPLE: usize = 2;

/// Duration of one engine frame in milliseconds.
pub const FRAME_MS: u64 = 20;

/// Size of one 20 ms frame: 16 000 Hz × 2 bytes × 0.02 s = 640 bytes.
pub const FRAME_BYTES: usize = 640;

/// Frames pushed per write (10 × 20 ms = 200 ms).
pub const FRAMES_PER_WRITE: usize = 10;

/// Default chunk size in bytes (6 400 bytes = 200 ms).
pub const CHUNK_BYTES: usize = FRAME_BYTES * FRAMES_PER_WRITE;

// ---------------------------------------------------------------------------
// AudioFormat
// ---------------------------------------------------------------------------

/// Chunking and timing arithmetic for the fixed PCM format.
///
/// ```
/// use speech_session::audio::AudioFormat;
/// use std::time::Duration;
///
/// let fmt = AudioFormat::default();
/// assert_eq!(fmt.chunk_bytes(), 6_400);
/// assert_eq!(fmt.duration_of(6_400), Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    frames_per_write: usize,
}

impl AudioFormat {
    /// Build a format that writes `frames_per_write` 20 ms frames per call.
    ///
    /// A value of `0` is clamped to `1` so the streaming loop always
    /// advances.
    pub fn new(frames_per_write: usize) -> Self {
        Self {
            frames_per_write: frames_per_write.max(1),
        }
    }

    /// Number of 20 ms frames per write.
    pub fn frames_per_write(&self) -> usize {
        self.frames_per_write
    }

    /// Nominal number of bytes per write.
    pub fn chunk_bytes(&self) -> usize {
        self.frames_per_write * FRAME_BYTES
    }

    /// Real-time duration of `bytes` of payload.
    pub fn duration_of(&self, bytes: usize) -> Duration {
        let bytes_per_ms = (SAMPLE_RATE as usize * BYTES_PER_SAMPLE) / 1_000;
        Duration::from_micros((bytes as u64 * 1_000) / bytes_per_ms as u64)
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::new(FRAMES_PER_WRITE)
    }
}

/// Decode little-endian 16-bit PCM into `f32` samples in `[-1.0, 1.0)`.
///
/// A trailing odd byte is ignored.
pub fn pcm16_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32_768.0)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_640_bytes() {
        assert_eq!(FRAME_BYTES, SAMPLE_RATE as usize * BYTES_PER_SAMPLE * FRAME_MS as usize / 1_000);
    }

    #[test]
    fn default_chunk_is_200ms() {
        let fmt = AudioFormat::default();
        assert_eq!(fmt.chunk_bytes(), CHUNK_BYTES);
        assert_eq!(fmt.duration_of(fmt.chunk_bytes()), Duration::from_millis(200));
    }

    #[test]
    fn zero_frames_is_clamped() {
        let fmt = AudioFormat::new(0);
        assert_eq!(fmt.frames_per_write(), 1);
        assert_eq!(fmt.chunk_bytes(), FRAME_BYTES);
    }

    #[test]
    fn collapsed_tail_duration() {
        // 1.5 chunks sent in one go = 300 ms
        let fmt = AudioFormat::default();
        assert_eq!(fmt.duration_of(9_600), Duration::from_millis(300));
    }

    #[test]
    fn pcm_decode_extremes() {
        let bytes = [0x00, 0x80, 0xff, 0x7f, 0x00, 0x00, 0x01];
        let samples = pcm16_to_f32(&bytes);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], -1.0);
        assert!(samples[1] > 0.999);
        assert_eq!(samples[2], 0.0);
    }
}
