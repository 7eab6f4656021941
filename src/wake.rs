//! Wake word detection capability
//!
//! The engine is an external collaborator: it turns one fixed-length
//! PCM frame into a keyword index. The loop only depends on this trait;
//! the Porcupine-backed implementation is feature-gated.

use crate::Result;

/// No keyword matched in the processed frame
pub const NO_MATCH: i32 = -1;

/// Keyword spotter over fixed-length PCM frames
pub trait WakeWordEngine {
    /// Samples per frame expected by [`WakeWordEngine::process`]
    fn frame_length(&self) -> usize;

    /// Sample rate the engine expects
    fn sample_rate(&self) -> u32;

    /// Process one frame; returns [`NO_MATCH`] or the index of the
    /// configured keyword that matched
    ///
    /// # Errors
    ///
    /// Returns error if the engine rejects the frame.
    fn process(&mut self, frame: &[i16]) -> Result<i32>;
}

#[cfg(feature = "porcupine")]
pub use pv::PorcupineEngine;

#[cfg(feature = "porcupine")]
mod pv {
    use std::str::FromStr;

    use porcupine::{BuiltinKeywords, Porcupine, PorcupineBuilder};

    use super::WakeWordEngine;
    use crate::{Error, Result};

    /// Picovoice Porcupine keyword spotter
    pub struct PorcupineEngine {
        porcupine: Porcupine,
    }

    impl PorcupineEngine {
        /// Build an engine for the given built-in keyword names
        ///
        /// Keyword order defines the indices returned by `process`.
        ///
        /// # Errors
        ///
        /// Returns error for unknown keyword names or engine init
        /// failure.
        pub fn new(access_key: &str, keywords: &[String]) -> Result<Self> {
            let keywords = keywords
                .iter()
                .map(|k| {
                    BuiltinKeywords::from_str(k)
                        .map_err(|()| Error::WakeWord(format!("unknown builtin keyword: {k}")))
                })
                .collect::<Result<Vec<_>>>()?;

            let porcupine = PorcupineBuilder::new_with_keywords(access_key, &keywords)
                .init()
                .map_err(|e| Error::WakeWord(e.to_string()))?;

            tracing::debug!(
                frame_length = porcupine.frame_length(),
                sample_rate = porcupine.sample_rate(),
                "wake word engine initialized"
            );

            Ok(Self { porcupine })
        }
    }

    impl WakeWordEngine for PorcupineEngine {
        fn frame_length(&self) -> usize {
            self.porcupine.frame_length() as usize
        }

        fn sample_rate(&self) -> u32 {
            self.porcupine.sample_rate()
        }

        fn process(&mut self, frame: &[i16]) -> Result<i32> {
            self.porcupine
                .process(frame)
                .map_err(|e| Error::WakeWord(e.to_string()))
        }
    }
}
