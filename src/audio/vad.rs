//! Simple energy-based endpoint detection over 20 ms PCM frames.
//!
//! [`EndpointDetector`] is fed the payload incrementally, exactly as the
//! driver pushes it, and reports where in the speech/silence timeline the
//! stream currently is.  The [`crate::engine::LocalEngine`] uses it to emit
//! endpoint states and one segment per utterance.
//!
//! ## Algorithm
//!
//! Audio is split into 20 ms frames (320 samples @ 16 kHz).  A frame is
//! classified as *voice* when its RMS amplitude exceeds the configured
//! threshold.  Speech starts on the first voice frame; it ends once
//! `eos_ms` of consecutive silence follows the last voice frame.

use crate::audio::format::{pcm16_to_f32, FRAME_BYTES, FRAME_MS};

// ---------------------------------------------------------------------------
// SpeechSegment
// ---------------------------------------------------------------------------

/// A detected utterance, in milliseconds from the start of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechSegment {
    pub start_ms: u64,
    pub end_ms: u64,
}

/// Detector position in the speech/silence timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadPhase {
    /// No voice frame seen yet.
    Waiting,
    /// Inside an utterance (possibly in a short pause).
    Speaking,
    /// An utterance ended with at least `eos_ms` of trailing silence.
    Ended,
}

// ---------------------------------------------------------------------------
// EndpointDetector
// ---------------------------------------------------------------------------

/// Incremental energy-based endpoint detector.
///
/// # Example
///
/// ```rust
/// use speech_session::audio::{EndpointDetector, VadPhase};
///
/// // 0.01 RMS threshold, 40 ms end-of-speech silence
/// let mut vad = EndpointDetector::new(0.01, 40);
///
/// let loud: Vec<u8> = std::iter::repeat([0x00, 0x40]).take(320).flatten().collect();
/// let quiet = vec![0u8; 640 * 2];
///
/// vad.feed(&loud);
/// assert_eq!(vad.phase(), VadPhase::Speaking);
/// let segments = vad.feed(&quiet);
/// assert_eq!(vad.phase(), VadPhase::Ended);
/// assert_eq!(segments.len(), 1);
/// ```
pub struct EndpointDetector {
    /// RMS amplitude threshold; frames at or below this are silence.
    rms_threshold: f32,
    /// Consecutive silence that closes an utterance.
    eos_ms: u64,
    phase: VadPhase,
    /// Bytes of an incomplete frame carried over to the next feed.
    pending: Vec<u8>,
    /// Stream position in milliseconds (complete frames only).
    position_ms: u64,
    speech_start_ms: u64,
    last_voice_end_ms: u64,
}

impl EndpointDetector {
    /// Create a detector with the given RMS threshold and end-of-speech
    /// silence length.
    pub fn new(rms_threshold: f32, eos_ms: u64) -> Self {
        Self {
            rms_threshold,
            eos_ms,
            phase: VadPhase::Waiting,
            pending: Vec::with_capacity(FRAME_BYTES),
            position_ms: 0,
            speech_start_ms: 0,
            last_voice_end_ms: 0,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> VadPhase {
        self.phase
    }

    /// Milliseconds of audio consumed so far.
    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    /// Returns `true` when the frame contains voice activity.
    fn is_voice_frame(&self, frame: &[u8]) -> bool {
        let samples = pcm16_to_f32(frame);
        if samples.is_empty() {
            return false;
        }
        let mean_sq: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
        mean_sq.sqrt() > self.rms_threshold
    }

    /// Feed raw PCM bytes and return every utterance closed by them.
    ///
    /// Once the detector has reached [`VadPhase::Ended`] a new voice frame
    /// starts the next utterance.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SpeechSegment> {
        let mut closed = Vec::new();
        self.pending.extend_from_slice(bytes);

        let whole = self.pending.len() - self.pending.len() % FRAME_BYTES;
        let frames: Vec<u8> = self.pending.drain(..whole).collect();

        for frame in frames.chunks_exact(FRAME_BYTES) {
            let voice = self.is_voice_frame(frame);
            let frame_start = self.position_ms;
            self.position_ms += FRAME_MS;

            match (self.phase, voice) {
                (VadPhase::Waiting | VadPhase::Ended, true) => {
                    self.phase = VadPhase::Speaking;
                    self.speech_start_ms = frame_start;
                    self.last_voice_end_ms = self.position_ms;
                }
                (VadPhase::Speaking, true) => {
                    self.last_voice_end_ms = self.position_ms;
                }
                (VadPhase::Speaking, false) => {
                    if self.position_ms - self.last_voice_end_ms >= self.eos_ms {
                        self.phase = VadPhase::Ended;
                        closed.push(SpeechSegment {
                            start_ms: self.speech_start_ms,
                            end_ms: self.last_voice_end_ms,
                        });
                    }
                }
                (VadPhase::Waiting | VadPhase::Ended, false) => {}
            }
        }

        closed
    }

    /// Close any utterance still open at end of input.
    pub fn finish(&mut self) -> Option<SpeechSegment> {
        // A trailing partial frame is too short to classify.
        self.pending.clear();

        if self.phase == VadPhase::Speaking {
            self.phase = VadPhase::Ended;
            Some(SpeechSegment {
                start_ms: self.speech_start_ms,
                end_ms: self.last_voice_end_ms,
            })
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::format::BYTES_PER_SAMPLE;

    /// `frames` × 20 ms of constant-amplitude PCM.
    fn pcm(frames: usize, amplitude: i16) -> Vec<u8> {
        std::iter::repeat(amplitude.to_le_bytes())
            .take(frames * FRAME_BYTES / BYTES_PER_SAMPLE)
            .flatten()
            .collect()
    }

    #[test]
    fn silence_stays_waiting() {
        let mut vad = EndpointDetector::new(0.01, 100);
        assert!(vad.feed(&pcm(20, 0)).is_empty());
        assert_eq!(vad.phase(), VadPhase::Waiting);
        assert_eq!(vad.position_ms(), 400);
    }

    #[test]
    fn voice_then_long_silence_closes_segment() {
        let mut vad = EndpointDetector::new(0.01, 100);
        vad.feed(&pcm(5, 0)); // 0-100 ms silence
        vad.feed(&pcm(10, 8_000)); // 100-300 ms voice
        assert_eq!(vad.phase(), VadPhase::Speaking);

        let closed = vad.feed(&pcm(5, 0)); // 100 ms silence → end
        assert_eq!(
            closed,
            vec![SpeechSegment {
                start_ms: 100,
                end_ms: 300
            }]
        );
        assert_eq!(vad.phase(), VadPhase::Ended);
    }

    #[test]
    fn short_pause_does_not_end_speech() {
        let mut vad = EndpointDetector::new(0.01, 100);
        vad.feed(&pcm(5, 8_000));
        assert!(vad.feed(&pcm(4, 0)).is_empty()); // 80 ms < 100 ms
        vad.feed(&pcm(5, 8_000));
        assert_eq!(vad.phase(), VadPhase::Speaking);
    }

    #[test]
    fn partial_frames_are_carried_over() {
        let mut vad = EndpointDetector::new(0.01, 100);
        let voice = pcm(1, 8_000);
        vad.feed(&voice[..300]);
        assert_eq!(vad.position_ms(), 0);
        vad.feed(&voice[300..]);
        assert_eq!(vad.position_ms(), 20);
        assert_eq!(vad.phase(), VadPhase::Speaking);
    }

    #[test]
    fn finish_closes_open_segment() {
        let mut vad = EndpointDetector::new(0.01, 1_000);
        vad.feed(&pcm(3, 8_000));
        let seg = vad.finish().expect("open segment");
        assert_eq!(seg, SpeechSegment { start_ms: 0, end_ms: 60 });
        assert!(vad.finish().is_none());
    }

}
