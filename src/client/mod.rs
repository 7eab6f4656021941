//! Conversational AI session client
//!
//! Owns the ordered message history for one assistant session and runs
//! the three remote operations (transcription, chat completion, speech
//! synthesis) against a [`ChatBackend`] capability. The backend trait
//! keeps the session logic testable without a network.

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::Result;

pub use openai::OpenAiBackend;

/// Synthetic tool call id attached to fallback-mapped history entries
const FALLBACK_TOOL_CALL_ID: &str = "ai_client";

/// Message author role; closed set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry of the session history
#[derive(Debug, Clone)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

/// Why generation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishState {
    /// Normal completion
    Stop,
    /// Truncated at the token limit
    Length,
    /// No content produced
    Null,
}

/// A produced assistant response; absent entirely on total failure
#[derive(Debug, Clone)]
pub struct AssistantResult {
    pub message: String,
    pub state: FinishState,
}

/// Role-tagged wire form of a history message
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WireMessage {
    pub role: &'static str,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<&'static str>,
}

/// Chat completion request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub messages: Vec<WireMessage>,
}

/// Chat completion response body (the parts the loop consumes)
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionMessage {
    pub content: Option<String>,
}

/// Speech synthesis request body
#[derive(Debug, Clone, Serialize)]
pub struct SpeechRequest {
    pub model: String,
    pub input: String,
    pub voice: String,
    pub speed: f32,
    pub response_format: String,
}

/// Remote AI capability consumed by the session client
#[async_trait]
pub trait ChatBackend {
    /// One chat completion attempt; the caller owns retries
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion>;

    /// Transcribe WAV audio, optionally with a hint prompt
    async fn transcribe(&self, audio: Vec<u8>, model: &str, prompt: Option<&str>)
        -> Result<String>;

    /// Synthesize speech, returning the encoded audio bytes
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>>;
}

/// Stateful session client: history plus the three remote operations
pub struct ConversationClient<B: ChatBackend> {
    backend: B,
    config: SessionConfig,
    history: Vec<HistoryMessage>,
}

impl<B: ChatBackend> ConversationClient<B> {
    /// Create a session; the initial prompt, when configured, becomes
    /// the first (and permanent) System-role history entry
    pub fn new(backend: B, config: SessionConfig) -> Self {
        let mut history = Vec::new();
        if let Some(prompt) = &config.initial_prompt {
            history.push(HistoryMessage {
                role: Role::System,
                content: prompt.clone(),
            });
        }

        Self {
            backend,
            config,
            history,
        }
    }

    /// Append a message to the session history
    pub fn add_message(&mut self, message: HistoryMessage) {
        self.history.push(message);
    }

    /// The ordered session history
    #[must_use]
    pub fn history(&self) -> &[HistoryMessage] {
        &self.history
    }

    /// Transcribe a finalized WAV recording
    ///
    /// The hint prompt defaults to the stored initial prompt. Attempted
    /// once; a transport failure propagates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transcription`](crate::Error::Transcription) on
    /// remote failure.
    pub async fn speech_to_text(&self, audio: Vec<u8>, prompt: Option<&str>) -> Result<String> {
        let hint = prompt.or(self.config.initial_prompt.as_deref());
        self.backend
            .transcribe(audio, &self.config.stt_model, hint)
            .await
    }

    /// Ask the assistant, carrying the whole session history
    ///
    /// The User-role entry is appended before any attempt is made, so a
    /// failed call still leaves the utterance in history for the next
    /// turn. Up to `chat_attempts` immediate attempts; an exhausted
    /// budget yields `None` rather than an error, as does a response
    /// with no choices. Emits exactly one observability record per
    /// call.
    pub async fn text_prompt(&mut self, prompt: &str) -> Option<AssistantResult> {
        self.history.push(HistoryMessage {
            role: Role::User,
            content: prompt.to_string(),
        });

        let request = ChatRequest {
            model: self.config.chat_model.clone(),
            user: self.config.user.clone(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            messages: wire_messages(&self.history),
        };

        let mut attempts_left = self.config.chat_attempts;
        let mut response = None;
        while attempts_left > 0 {
            match self.backend.complete(&request).await {
                Ok(completion) => {
                    response = Some(completion);
                    break;
                }
                Err(e) => {
                    attempts_left -= 1;
                    tracing::warn!(
                        error = %e,
                        prompt,
                        attempts_left,
                        "chat completion attempt failed"
                    );
                }
            }
        }

        let result = response
            .and_then(|c| c.choices.into_iter().next())
            .map(|choice| {
                let message = choice.message.content.unwrap_or_default();
                let state = if choice.finish_reason.as_deref() == Some("length") {
                    FinishState::Length
                } else if message.is_empty() {
                    FinishState::Null
                } else {
                    FinishState::Stop
                };
                AssistantResult { message, state }
            });

        tracing::info!(
            retries_left = attempts_left,
            has_response = result.is_some(),
            state = ?result.as_ref().map(|r| r.state),
            "assistant_ask"
        );

        result
    }

    /// Synthesize spoken audio for a response message
    ///
    /// Attempted once; a transport failure propagates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`](crate::Error::Synthesis) on remote
    /// failure.
    pub async fn text_to_speech(&self, text: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            model: self.config.tts_model.clone(),
            input: text.to_string(),
            voice: self.config.tts_voice.clone(),
            speed: self.config.tts_speed,
            response_format: self.config.tts_format.clone(),
        };
        self.backend.synthesize(&request).await
    }

    /// Encoded format the synthesis endpoint was asked for
    #[must_use]
    pub fn tts_format(&self) -> &str {
        &self.config.tts_format
    }
}

/// Convert the stored history to role-tagged wire entries
///
/// Total over [`Role`]: the fallback arm maps anything outside the
/// three conversational roles to a tool entry with a fixed synthetic
/// call id. Not expected to fire in normal operation.
#[must_use]
pub fn wire_messages(history: &[HistoryMessage]) -> Vec<WireMessage> {
    history
        .iter()
        .map(|m| match m.role {
            Role::System => WireMessage {
                role: "system",
                content: m.content.clone(),
                tool_call_id: None,
            },
            Role::User => WireMessage {
                role: "user",
                content: m.content.clone(),
                tool_call_id: None,
            },
            Role::Assistant => WireMessage {
                role: "assistant",
                content: m.content.clone(),
                tool_call_id: None,
            },
            _ => WireMessage {
                role: "tool",
                content: m.content.clone(),
                tool_call_id: Some(FALLBACK_TOOL_CALL_ID),
            },
        })
        .collect()
}
