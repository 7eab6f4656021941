//! Hearth - wake-word voice assistant loop
//!
//! Listens continuously for a wake word, records the spoken prompt
//! until trailing silence, transcribes it, asks a conversational AI
//! backend, and speaks the synthesized response.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    WakeLoop                          │
//! │  Listening → Triggered → Recording → Responding ─┐  │
//! │      ▲                                           │  │
//! │      └───────────────────────────────────────────┘  │
//! └──────┬──────────────┬──────────────┬────────────────┘
//!        │              │              │
//!   WakeWordEngine  Microphone /   ConversationClient
//!   (keyword index) RecordingSession   (STT / chat / TTS)
//!        │              │              │
//!      frames      WAV buffer     FrameDecoder → AudioSink
//! ```

pub mod assistant;
pub mod audio;
pub mod client;
pub mod config;
pub mod error;
pub mod wake;

pub use assistant::WakeLoop;
pub use audio::{
    is_silent, rms, AudioFormat, AudioFrame, AudioSink, FrameDecoder, FrameSource, Microphone,
    Playback, RecordingSession, SampleSpec, Speaker,
};
pub use client::{
    AssistantResult, ChatBackend, ConversationClient, FinishState, HistoryMessage, OpenAiBackend,
    Role,
};
pub use config::{LoopConfig, SessionConfig};
pub use error::{Error, Result};
pub use wake::WakeWordEngine;
