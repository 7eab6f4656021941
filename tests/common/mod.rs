//! Shared scripted collaborators for loop tests
//!
//! None of these touch audio hardware or the network; they let the
//! assistant loop run end-to-end against scripted behavior.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hearth::client::{ChatBackend, ChatCompletion, ChatRequest, SpeechRequest};
use hearth::{AudioFormat, AudioFrame, Error, FrameSource, Playback, Result, WakeWordEngine};

pub const FRAME_LENGTH: usize = 512;
pub const SAMPLE_RATE: u32 = 16_000;

/// Wake engine that replays a scripted sequence of keyword indices
pub struct ScriptedEngine {
    script: Vec<i32>,
    position: usize,
    pub processed: Arc<AtomicU32>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<i32>) -> Self {
        Self {
            script,
            position: 0,
            processed: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl WakeWordEngine for ScriptedEngine {
    fn frame_length(&self) -> usize {
        FRAME_LENGTH
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn process(&mut self, _frame: &[i16]) -> Result<i32> {
        self.processed.fetch_add(1, Ordering::SeqCst);
        let index = self.script.get(self.position).copied().ok_or_else(|| {
            Error::WakeWord("scripted engine ran out of frames".to_string())
        })?;
        self.position += 1;
        Ok(index)
    }
}

/// Frame source yielding endless quiet frames; counts lifecycle calls
pub struct IdleSource {
    pub started: Arc<AtomicU32>,
    pub stopped: Arc<AtomicU32>,
}

impl IdleSource {
    pub fn new() -> Self {
        Self {
            started: Arc::new(AtomicU32::new(0)),
            stopped: Arc::new(AtomicU32::new(0)),
        }
    }
}

impl FrameSource for IdleSource {
    fn start(&mut self) -> Result<()> {
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }

    fn read(&mut self) -> Result<AudioFrame> {
        Ok(vec![0i16; FRAME_LENGTH])
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn frame_length(&self) -> usize {
        FRAME_LENGTH
    }
}

/// Frame source scripting spoken audio: N loud frames, then silence
pub struct SpeechSource {
    loud_frames: usize,
    reads: usize,
}

impl SpeechSource {
    pub fn new(loud_frames: usize) -> Self {
        Self {
            loud_frames,
            reads: 0,
        }
    }
}

impl FrameSource for SpeechSource {
    fn start(&mut self) -> Result<()> {
        self.reads = 0;
        Ok(())
    }

    fn stop(&mut self) {}

    fn read(&mut self) -> Result<AudioFrame> {
        let frame = if self.reads < self.loud_frames {
            vec![2000i16; FRAME_LENGTH]
        } else {
            vec![0i16; FRAME_LENGTH]
        };
        self.reads += 1;
        Ok(frame)
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn frame_length(&self) -> usize {
        FRAME_LENGTH
    }
}

/// Records playback calls instead of touching an output device
#[derive(Clone)]
pub struct RecordingPlayback {
    pub calls: Arc<Mutex<Vec<(AudioFormat, usize)>>>,
}

impl RecordingPlayback {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Playback for RecordingPlayback {
    async fn play(&mut self, format: AudioFormat, data: Vec<u8>) -> Result<()> {
        self.calls.lock().unwrap().push((format, data.len()));
        Ok(())
    }
}

/// Shared observable state of a [`ScriptedBackend`]
#[derive(Default)]
pub struct BackendState {
    /// Transcripts returned by `transcribe`, consumed front-first
    pub transcripts: Mutex<Vec<String>>,
    /// Completion outcomes, consumed front-first; empty = failure
    pub chat_outcomes: Mutex<Vec<Result<ChatCompletion>>>,
    pub transcribe_calls: AtomicU32,
    pub complete_calls: AtomicU32,
    pub synthesize_calls: AtomicU32,
    /// Last WAV payload handed to transcription
    pub received_wav: Mutex<Option<Vec<u8>>>,
}

/// Scripted remote AI capability
pub struct ScriptedBackend {
    pub state: Arc<BackendState>,
}

impl ScriptedBackend {
    pub fn new() -> (Self, Arc<BackendState>) {
        let state = Arc::new(BackendState::default());
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, _request: &ChatRequest) -> Result<ChatCompletion> {
        self.state.complete_calls.fetch_add(1, Ordering::SeqCst);
        let mut outcomes = self.state.chat_outcomes.lock().unwrap();
        if outcomes.is_empty() {
            Err(Error::Completion("scripted failure".to_string()))
        } else {
            outcomes.remove(0)
        }
    }

    async fn transcribe(
        &self,
        audio: Vec<u8>,
        _model: &str,
        _prompt: Option<&str>,
    ) -> Result<String> {
        self.state.transcribe_calls.fetch_add(1, Ordering::SeqCst);
        *self.state.received_wav.lock().unwrap() = Some(audio);
        let mut transcripts = self.state.transcripts.lock().unwrap();
        if transcripts.is_empty() {
            Ok(String::new())
        } else {
            Ok(transcripts.remove(0))
        }
    }

    async fn synthesize(&self, _request: &SpeechRequest) -> Result<Vec<u8>> {
        self.state.synthesize_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0u8; 64])
    }
}

/// A single-choice completion with the given content and finish reason
pub fn completion(content: &str, finish_reason: &str) -> ChatCompletion {
    use hearth::client::{CompletionChoice, CompletionMessage};

    ChatCompletion {
        choices: vec![CompletionChoice {
            message: CompletionMessage {
                content: Some(content.to_string()),
            },
            finish_reason: Some(finish_reason.to_string()),
        }],
    }
}
