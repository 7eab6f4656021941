//! Top-level assistant state machine
//!
//! `Listening → Triggered → Recording → Responding → Listening`, with a
//! terminal `Exit` on the stop keyword. One turn at a time: the wake
//! stream and the prompt-recording stream are never open together, and
//! any failure after the trigger aborts only that turn.

use std::fs;
use std::path::PathBuf;

use rand::seq::SliceRandom;

use crate::audio::{AudioFormat, FrameSource, Playback, RecordingSession};
use crate::client::{ChatBackend, ConversationClient};
use crate::config::{LoopConfig, SessionConfig};
use crate::wake::{WakeWordEngine, NO_MATCH};
use crate::{Error, Result};

/// The assistant loop over its collaborator capabilities
///
/// `wake_source` feeds the keyword engine; `prompt_source` is the
/// recording stream opened only while the wake stream is stopped.
pub struct WakeLoop<E, S, R, P, B>
where
    E: WakeWordEngine,
    S: FrameSource,
    R: FrameSource,
    P: Playback,
    B: ChatBackend,
{
    engine: E,
    wake_source: S,
    prompt_source: R,
    playback: P,
    client: ConversationClient<B>,
    session: RecordingSession,
    config: LoopConfig,
}

impl<E, S, R, P, B> WakeLoop<E, S, R, P, B>
where
    E: WakeWordEngine,
    S: FrameSource,
    R: FrameSource,
    P: Playback,
    B: ChatBackend,
{
    pub fn new(
        engine: E,
        wake_source: S,
        prompt_source: R,
        playback: P,
        client: ConversationClient<B>,
        session_config: &SessionConfig,
        config: LoopConfig,
    ) -> Self {
        Self {
            engine,
            wake_source,
            prompt_source,
            playback,
            client,
            session: RecordingSession::new(session_config),
            config,
        }
    }

    /// Run until the stop keyword is detected
    ///
    /// A failed turn is logged and tolerated; the loop returns to
    /// listening. Only listening-stream failures are fatal.
    ///
    /// # Errors
    ///
    /// Returns error if the wake stream cannot be (re)opened or read.
    pub async fn run(&mut self) -> Result<()> {
        self.wake_source.start()?;
        tracing::info!("listening for wake word");

        loop {
            let frame = self.wake_source.read()?;
            let index = self.engine.process(&frame)?;
            if index == NO_MATCH {
                continue;
            }

            if index == self.config.stop_index {
                tracing::info!("stop keyword detected, exiting");
                break;
            }

            if index == self.config.trigger_index {
                if let Err(e) = self.run_turn().await {
                    tracing::error!(error = %e, "turn failed");
                }
                // Back to Listening; the wake stream is reopened here
                // and nowhere else (start is idempotent for turns that
                // failed before recording began).
                self.wake_source.start()?;
                tracing::info!("listening for wake word");
            }
        }

        self.wake_source.stop();
        Ok(())
    }

    /// One conversational turn: acknowledge, record, transcribe,
    /// generate, speak
    async fn run_turn(&mut self) -> Result<()> {
        // Triggered
        self.play_acknowledgment().await?;
        self.wake_source.stop();

        // Recording (prompt stream lifetime is scoped inside record)
        tracing::info!("recording prompt");
        let wav = self.session.record(&mut self.prompt_source)?;

        // Responding
        let transcript = self.client.speech_to_text(wav, None).await?;
        tracing::info!(prompt = %transcript, "prompt transcribed");
        if transcript.is_empty() {
            return Ok(());
        }

        let Some(result) = self.client.text_prompt(&transcript).await else {
            // Missed turn, not an error: skip playback, keep listening
            return Ok(());
        };
        tracing::info!(state = ?result.state, response = %result.message, "assistant response");

        let audio = self.client.text_to_speech(&result.message).await?;
        let format = AudioFormat::from_tag(self.client.tts_format())?;
        self.playback.play(format, audio).await
    }

    /// Play one randomly chosen `listen_*.mp3` acknowledgment sound
    async fn play_acknowledgment(&mut self) -> Result<()> {
        let path = pick_acknowledgment(&self.config.data_dir)?;
        tracing::debug!(sound = %path.display(), "playing acknowledgment");
        let data = fs::read(&path)?;
        self.playback.play(AudioFormat::Mp3, data).await
    }
}

/// Pick a random acknowledgment sound from the data directory
///
/// Sounds follow the `listen_<n>.mp3` naming convention.
///
/// # Errors
///
/// Returns error if the directory is unreadable or holds no sounds.
pub fn pick_acknowledgment(data_dir: &std::path::Path) -> Result<PathBuf> {
    let mut sounds: Vec<PathBuf> = fs::read_dir(data_dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("listen_") && n.ends_with(".mp3"))
        })
        .collect();
    sounds.sort();

    sounds
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| {
            Error::Config(format!(
                "no listen_*.mp3 acknowledgment sounds in {}",
                data_dir.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pick_acknowledgment_matches_naming_convention() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("listen_1.mp3"), b"a").unwrap();
        fs::write(dir.path().join("listen_2.mp3"), b"b").unwrap();
        fs::write(dir.path().join("notes.txt"), b"c").unwrap();
        fs::write(dir.path().join("chime.mp3"), b"d").unwrap();

        for _ in 0..16 {
            let pick = pick_acknowledgment(dir.path()).unwrap();
            let name = pick.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with("listen_") && name.ends_with(".mp3"));
        }
    }

    #[test]
    fn test_empty_sound_inventory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = pick_acknowledgment(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
