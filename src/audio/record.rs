//! Bounded prompt recording with silence-triggered early stop

use std::io::Cursor;

use super::decode::AudioFrame;
use super::silence::is_silent;
use crate::config::SessionConfig;
use crate::{Error, Result};

/// Capability of a live microphone-style frame stream
///
/// `read` blocks until one fixed-length frame is available. Implemented
/// by [`Microphone`](super::mic::Microphone) against real hardware and
/// by scripted sources in tests.
pub trait FrameSource {
    /// Begin capturing; idempotent
    ///
    /// # Errors
    ///
    /// Returns error if the stream cannot be opened.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing and release the stream; idempotent
    fn stop(&mut self);

    /// Pull the next fixed-length frame
    ///
    /// # Errors
    ///
    /// Returns error if the stream has failed.
    fn read(&mut self) -> Result<AudioFrame>;

    /// Samples per second of the captured signal
    fn sample_rate(&self) -> u32;

    /// Samples per frame returned by `read`
    fn frame_length(&self) -> usize;
}

/// Drives one bounded capture into a finalized in-memory WAV
#[derive(Debug, Clone)]
pub struct RecordingSession {
    max_record_secs: f32,
    silence_threshold: f32,
    max_silence_secs: f32,
}

impl RecordingSession {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            max_record_secs: config.max_record_secs,
            silence_threshold: config.silence_threshold,
            max_silence_secs: config.max_silence_secs,
        }
    }

    /// Record until the duration bound or a trailing-silence run, then
    /// finalize and return the WAV bytes
    ///
    /// Stopping on silence is a successful finalize, not an error. The
    /// source is started here and stopped exactly once on every exit
    /// path, including read failures.
    ///
    /// # Errors
    ///
    /// Returns error if the source fails or WAV encoding fails.
    pub fn record<S: FrameSource>(&self, source: &mut S) -> Result<Vec<u8>> {
        source.start()?;
        let result = self.capture(source);
        source.stop();
        result
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn capture<S: FrameSource>(&self, source: &mut S) -> Result<Vec<u8>> {
        let sample_rate = source.sample_rate();
        let frame_length = source.frame_length();

        let frames_per_sec = sample_rate as f32 / frame_length as f32;
        let iterations = (frames_per_sec * self.max_record_secs) as usize;
        if iterations == 0 {
            return Err(Error::Config(
                "max_record_secs shorter than one capture frame".to_string(),
            ));
        }
        let seconds_per_frame = self.max_record_secs / iterations as f32;
        let silence_limit = self.max_silence_secs / seconds_per_frame;

        tracing::debug!(
            sample_rate,
            frame_length,
            iterations,
            seconds_per_frame,
            "recording prompt"
        );

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        let mut silent_count: u32 = 0;
        for _ in 0..iterations {
            let frame = source.read()?;

            if is_silent(&frame, self.silence_threshold) {
                silent_count += 1;
            } else {
                silent_count = 0;
            }

            // Strictly exceeds: a recording silent from frame 0 still
            // accumulates max_silence_secs worth of frames first.
            if silent_count as f32 > silence_limit {
                tracing::debug!(
                    silence_secs = self.max_silence_secs,
                    "trailing silence, stopping early"
                );
                break;
            }

            for &sample in &frame {
                writer
                    .write_sample(sample)
                    .map_err(|e| Error::Audio(e.to_string()))?;
            }
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
        tracing::debug!("finished recording");
        Ok(cursor.into_inner())
    }
}
