//! Configuration for the assistant loop
//!
//! All tunables are loaded once at startup and immutable afterwards.

use std::path::PathBuf;

/// Tunables for one assistant session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum prompt recording duration in seconds
    pub max_record_secs: f32,

    /// RMS amplitude below which a frame counts as silent
    pub silence_threshold: f32,

    /// Trailing silence (seconds) that ends a recording early
    pub max_silence_secs: f32,

    /// Total chat completion attempts (immediate retries, no backoff)
    pub chat_attempts: u32,

    /// Chat model temperature
    pub temperature: f32,

    /// Chat completion token limit
    pub max_tokens: u32,

    /// Chat model identifier
    pub chat_model: String,

    /// Transcription model identifier
    pub stt_model: String,

    /// Synthesis model identifier
    pub tts_model: String,

    /// Synthesis voice
    pub tts_voice: String,

    /// Synthesis speed multiplier
    pub tts_speed: f32,

    /// Encoded format requested from synthesis ("mp3", "opus", ...)
    pub tts_format: String,

    /// Initial System-role prompt; also the default transcription hint
    pub initial_prompt: Option<String>,

    /// User identifier attached to chat requests
    pub user: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_record_secs: 20.0,
            silence_threshold: 100.0,
            max_silence_secs: 2.0,
            chat_attempts: 3,
            temperature: 0.3,
            max_tokens: 1500,
            chat_model: "gpt-4".to_string(),
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            tts_format: "mp3".to_string(),
            initial_prompt: Some(
                "You are home assistant that helps with everyday duties".to_string(),
            ),
            user: "User".to_string(),
        }
    }
}

/// Assistant loop wiring that isn't a per-turn tunable
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Keyword index that triggers a recording turn
    pub trigger_index: i32,

    /// Keyword index that exits the loop
    pub stop_index: i32,

    /// Directory holding `listen_<n>.mp3` acknowledgment sounds
    pub data_dir: PathBuf,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            trigger_index: 0,
            stop_index: 1,
            data_dir: PathBuf::from("data"),
        }
    }
}
