//! Error types for the hearth assistant

use thiserror::Error;

/// Result type alias for hearth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the assistant loop
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown or unsupported audio format tag
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Failed to open an audio device or stream
    #[error("device open failed: {0}")]
    DeviceOpen(String),

    /// Failed writing to an open audio stream
    #[error("device write failed: {0}")]
    DeviceWrite(String),

    /// Audio capture/decode mechanics (bad WAV data, MP3 frame errors, ...)
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text call failed
    #[error("transcription failed: {0}")]
    Transcription(String),

    /// Text-to-speech call failed
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    /// One chat completion attempt failed (consumed by the retry loop;
    /// an exhausted budget surfaces as "no result", not as this error)
    #[error("chat completion error: {0}")]
    Completion(String),

    /// Wake word engine error
    #[error("wake word error: {0}")]
    WakeWord(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
