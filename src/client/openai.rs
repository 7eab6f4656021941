//! OpenAI REST implementation of the [`ChatBackend`] capability

use async_trait::async_trait;

use super::{ChatBackend, ChatCompletion, ChatRequest, SpeechRequest};
use crate::{Error, Result};

const API_BASE: &str = "https://api.openai.com/v1";

/// Response from the transcription endpoint
#[derive(serde::Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// OpenAI-backed remote AI capability
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
}

impl OpenAiBackend {
    /// Create a backend with the given API key
    ///
    /// # Errors
    ///
    /// Returns error if the key is empty.
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion> {
        let response = self
            .client
            .post(format!("{API_BASE}/chat/completions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Completion(format!(
                "chat API error {status}: {body}"
            )));
        }

        Ok(response.json().await?)
    }

    async fn transcribe(
        &self,
        audio: Vec<u8>,
        model: &str,
        prompt: Option<&str>,
    ) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), model, "starting transcription");

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio)
                    .file_name("request.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Transcription(e.to_string()))?,
            )
            .text("model", model.to_string());
        if let Some(prompt) = prompt {
            form = form.text("prompt", prompt.to_string());
        }

        let response = self
            .client
            .post(format!("{API_BASE}/audio/transcriptions"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Transcription(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "transcription API error");
            return Err(Error::Transcription(format!(
                "transcription API error {status}: {body}"
            )));
        }

        let result: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| Error::Transcription(e.to_string()))?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text)
    }

    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        let mut response = self
            .client
            .post(format!("{API_BASE}/audio/speech"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Synthesis(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "speech API error {status}: {body}"
            )));
        }

        // Stream the body chunk-wise into an in-memory buffer
        let mut audio = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Synthesis(e.to_string()))?
        {
            audio.extend_from_slice(&chunk);
        }

        tracing::debug!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio)
    }
}
