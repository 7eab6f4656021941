//! Multi-format audio decoding
//!
//! Turns an encoded byte payload (WAV, MP3, or raw Opus packet) into a
//! lazy sequence of fixed-size PCM frames plus the sample spec a sink
//! needs to open a device. Format differences live entirely behind
//! [`FrameDecoder`]; playback never inspects the container.

use std::io::Cursor;

use crate::{Error, Result};

/// Per-channel samples in one WAV playback frame
pub const FRAME_SAMPLES: usize = 512;

/// Opus payloads do not self-describe; these are fixed at the call site
const OPUS_SAMPLE_RATE: u32 = 48_000;
const OPUS_CHANNELS: u16 = 1;
/// Samples per channel emitted by one Opus packet decode
const OPUS_FRAME_SAMPLES: usize = 960;

/// One fixed-size block of interleaved i16 PCM samples
pub type AudioFrame = Vec<i16>;

/// Supported encoded audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Opus,
}

impl AudioFormat {
    /// Parse an extension-like format tag
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for any unknown tag.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "wav" => Ok(Self::Wav),
            "mp3" => Ok(Self::Mp3),
            "opus" => Ok(Self::Opus),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Sample parameters needed to open an output stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Lazy, finite, non-restartable frame sequence over a decoded payload
pub struct FrameDecoder {
    spec: SampleSpec,
    frames: Frames,
}

enum Frames {
    /// Fixed-size reads of WAV sample data
    Wav {
        reader: hound::WavReader<Cursor<Vec<u8>>>,
        samples_per_frame: usize,
    },
    /// One encoded Opus packet, decoded on first pull
    Opus {
        decoder: Box<audiopus::coder::Decoder>,
        packet: Option<Vec<u8>>,
    },
    /// Eagerly decoded blocks (MP3)
    Eager(std::vec::IntoIter<AudioFrame>),
}

impl FrameDecoder {
    /// Decode an encoded payload into a frame sequence
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for unknown tags and
    /// [`Error::Audio`] for malformed payloads. No frames are produced
    /// and no device is touched on failure.
    pub fn new(format: AudioFormat, data: Vec<u8>) -> Result<Self> {
        match format {
            AudioFormat::Wav => Self::from_wav(data),
            AudioFormat::Mp3 => Self::from_mp3(&data),
            AudioFormat::Opus => Self::from_opus(data),
        }
    }

    /// Sample parameters of the decoded stream
    #[must_use]
    pub const fn spec(&self) -> SampleSpec {
        self.spec
    }

    fn from_wav(data: Vec<u8>) -> Result<Self> {
        let reader =
            hound::WavReader::new(Cursor::new(data)).map_err(|e| Error::Audio(e.to_string()))?;
        let spec = reader.spec();

        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            return Err(Error::Audio(format!(
                "only 16-bit integer PCM WAV is playable, got {}-bit {:?}",
                spec.bits_per_sample, spec.sample_format
            )));
        }

        Ok(Self {
            spec: SampleSpec {
                sample_rate: spec.sample_rate,
                channels: spec.channels,
            },
            frames: Frames::Wav {
                reader,
                samples_per_frame: FRAME_SAMPLES * spec.channels as usize,
            },
        })
    }

    fn from_mp3(data: &[u8]) -> Result<Self> {
        let mut decoder = minimp3::Decoder::new(Cursor::new(data));
        let mut samples: Vec<i16> = Vec::new();
        let mut spec: Option<SampleSpec> = None;

        loop {
            match decoder.next_frame() {
                Ok(frame) => {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let frame_spec = SampleSpec {
                        sample_rate: frame.sample_rate as u32,
                        channels: frame.channels as u16,
                    };
                    if *spec.get_or_insert(frame_spec) != frame_spec {
                        return Err(Error::Audio(
                            "MP3 stream changes sample spec mid-stream".to_string(),
                        ));
                    }
                    samples.extend_from_slice(&frame.data);
                }
                Err(minimp3::Error::Eof) => break,
                Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
            }
        }

        let spec = spec.ok_or_else(|| Error::Audio("MP3 payload has no frames".to_string()))?;

        tracing::debug!(
            samples = samples.len(),
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            "MP3 decoded"
        );

        // The whole payload is decoded up front, yielded as one frame
        let blocks = if samples.is_empty() {
            Vec::new()
        } else {
            vec![samples]
        };

        Ok(Self {
            spec,
            frames: Frames::Eager(blocks.into_iter()),
        })
    }

    fn from_opus(data: Vec<u8>) -> Result<Self> {
        let decoder =
            audiopus::coder::Decoder::new(audiopus::SampleRate::Hz48000, audiopus::Channels::Mono)
                .map_err(|e| Error::Audio(format!("Opus decoder init: {e}")))?;

        Ok(Self {
            spec: SampleSpec {
                sample_rate: OPUS_SAMPLE_RATE,
                channels: OPUS_CHANNELS,
            },
            frames: Frames::Opus {
                decoder: Box::new(decoder),
                packet: Some(data),
            },
        })
    }
}

impl Iterator for FrameDecoder {
    type Item = Result<AudioFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.frames {
            Frames::Wav {
                reader,
                samples_per_frame,
            } => {
                let mut frame = Vec::with_capacity(*samples_per_frame);
                for sample in reader.samples::<i16>() {
                    match sample {
                        Ok(s) => frame.push(s),
                        Err(e) => return Some(Err(Error::Audio(e.to_string()))),
                    }
                    if frame.len() == *samples_per_frame {
                        break;
                    }
                }
                if frame.is_empty() {
                    None
                } else {
                    Some(Ok(frame))
                }
            }
            Frames::Opus { decoder, packet } => {
                let packet = packet.take()?;
                let mut out = vec![0i16; OPUS_FRAME_SAMPLES * OPUS_CHANNELS as usize];
                match decoder.decode(Some(packet.as_slice()), &mut out, false) {
                    Ok(decoded) => {
                        out.truncate(decoded * OPUS_CHANNELS as usize);
                        Some(Ok(out))
                    }
                    Err(e) => Some(Err(Error::Audio(format!("Opus decode error: {e}")))),
                }
            }
            Frames::Eager(blocks) => blocks.next().map(Ok),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_format_tag_parsing() {
        assert_eq!(AudioFormat::from_tag("wav").unwrap(), AudioFormat::Wav);
        assert_eq!(AudioFormat::from_tag("MP3").unwrap(), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_tag("opus").unwrap(), AudioFormat::Opus);
    }

    #[test]
    fn test_unknown_tag_is_unsupported() {
        let err = AudioFormat::from_tag("flac").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(tag) if tag == "flac"));
    }

    #[test]
    fn test_wav_decode_spec_and_frames() {
        let samples: Vec<i16> = (0..1200).map(|i| i as i16).collect();
        let data = wav_bytes(&samples, 16_000, 1);

        let decoder = FrameDecoder::new(AudioFormat::Wav, data).unwrap();
        assert_eq!(
            decoder.spec(),
            SampleSpec {
                sample_rate: 16_000,
                channels: 1
            }
        );

        let frames: Vec<AudioFrame> = decoder.map(Result::unwrap).collect();
        assert_eq!(frames.len(), 3); // 512 + 512 + 176
        assert_eq!(frames[0].len(), FRAME_SAMPLES);
        assert_eq!(frames[2].len(), 176);

        let decoded: Vec<i16> = frames.into_iter().flatten().collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_wav_frames_preserve_order() {
        let samples: Vec<i16> = (0..2048).map(|i| (i % 1000) as i16).collect();
        let data = wav_bytes(&samples, 16_000, 1);

        let decoded: Vec<i16> = FrameDecoder::new(AudioFormat::Wav, data)
            .unwrap()
            .map(Result::unwrap)
            .flatten()
            .collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_stereo_wav_frame_sizing() {
        let samples: Vec<i16> = vec![7; 2048];
        let data = wav_bytes(&samples, 24_000, 2);

        let decoder = FrameDecoder::new(AudioFormat::Wav, data).unwrap();
        assert_eq!(decoder.spec().channels, 2);

        let first = decoder.map(Result::unwrap).next().unwrap();
        // 512 samples per channel, interleaved
        assert_eq!(first.len(), FRAME_SAMPLES * 2);
    }

    #[test]
    fn test_garbage_wav_is_audio_error() {
        let Err(err) = FrameDecoder::new(AudioFormat::Wav, vec![1, 2, 3, 4]) else {
            panic!("garbage WAV should not decode");
        };
        assert!(matches!(err, Error::Audio(_)));
    }

    #[test]
    fn test_empty_mp3_is_audio_error() {
        let Err(err) = FrameDecoder::new(AudioFormat::Mp3, Vec::new()) else {
            panic!("empty MP3 payload should not decode");
        };
        assert!(matches!(err, Error::Audio(_)));
    }
}
