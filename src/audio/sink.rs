//! Audio playback to the output device

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use super::decode::{AudioFormat, FrameDecoder, SampleSpec};
use crate::{Error, Result};

/// Capability the assistant loop uses to produce audible output
#[async_trait]
pub trait Playback: Send {
    /// Decode an encoded payload and play it to completion
    async fn play(&mut self, format: AudioFormat, data: Vec<u8>) -> Result<()>;
}

/// One scoped playback session against the default output device
///
/// The device stream exists only inside [`AudioSink::play`]; it is
/// released on every exit path, success or failure.
pub struct AudioSink {
    #[allow(dead_code)]
    device: Device,
    config: StreamConfig,
    spec: SampleSpec,
}

impl AudioSink {
    /// Open the default output device for the given sample spec
    ///
    /// Falls back to a stereo device config when the source is mono and
    /// no mono config exists, duplicating samples across channels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceOpen`] if no device or matching config is
    /// available. Open failure is fatal to the call, never retried.
    pub fn open(spec: SampleSpec) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::DeviceOpen("no output device available".to_string()))?;

        let rate = SampleRate(spec.sample_rate);
        let matching = |channels: u16| {
            device.supported_output_configs().ok()?.find(|c| {
                c.channels() == channels && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
            })
        };

        let supported = matching(spec.channels)
            .or_else(|| if spec.channels == 1 { matching(2) } else { None })
            .ok_or_else(|| Error::DeviceOpen("no suitable output config found".to_string()))?;

        let config = supported.with_sample_rate(rate).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = spec.sample_rate,
            source_channels = spec.channels,
            device_channels = config.channels,
            "audio sink opened"
        );

        Ok(Self {
            device,
            config,
            spec,
        })
    }

    /// Write every frame in sequence order and block until audible
    /// output has drained
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceWrite`] if the stream cannot start and
    /// the first decode error from the frame sequence otherwise. The
    /// stream is dropped on every path.
    pub fn play<I>(&self, frames: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<super::decode::AudioFrame>>,
    {
        // Frames are drained in order before the stream starts; audio is
        // position-sensitive and the callback must never wait on decode.
        let mut samples: Vec<f32> = Vec::new();
        for frame in frames {
            let frame = frame?;
            samples.extend(frame.iter().map(|&s| f32::from(s) / 32768.0));
        }

        if samples.is_empty() {
            return Ok(());
        }

        self.play_samples_blocking(&samples)
    }

    fn play_samples_blocking(&self, samples: &[f32]) -> Result<()> {
        let device_channels = self.config.channels as usize;
        let src_channels = self.spec.channels as usize;
        let total_frames = samples.len() / src_channels;

        let samples = Arc::new(samples.to_vec());
        let position = Arc::new(Mutex::new(0usize));
        let finished = Arc::new(Mutex::new(false));

        let samples_cb = Arc::clone(&samples);
        let position_cb = Arc::clone(&position);
        let finished_cb = Arc::clone(&finished);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut pos = position_cb.lock().unwrap();

                    for frame in data.chunks_mut(device_channels) {
                        if *pos < total_frames {
                            for (i, out) in frame.iter_mut().enumerate() {
                                let ch = i.min(src_channels - 1);
                                *out = samples_cb[*pos * src_channels + ch];
                            }
                            *pos += 1;
                        } else {
                            *finished_cb.lock().unwrap() = true;
                            frame.fill(0.0);
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::DeviceOpen(e.to_string()))?;

        stream
            .play()
            .map_err(|e| Error::DeviceWrite(e.to_string()))?;

        // Poll for drain with a timeout derived from the payload length
        let duration_ms = (total_frames as u64 * 1000) / u64::from(self.spec.sample_rate);
        let start = Instant::now();
        let timeout = Duration::from_millis(duration_ms + 500);

        while !*finished.lock().unwrap() {
            if start.elapsed() > timeout {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        // Let the device ring out before teardown
        std::thread::sleep(Duration::from_millis(100));

        drop(stream);
        tracing::debug!(frames = total_frames, "playback complete");

        Ok(())
    }
}

/// Live speaker output: decode then play through a scoped [`AudioSink`]
pub struct Speaker;

#[async_trait]
impl Playback for Speaker {
    async fn play(&mut self, format: AudioFormat, data: Vec<u8>) -> Result<()> {
        let decoder = FrameDecoder::new(format, data)?;
        let sink = AudioSink::open(decoder.spec())?;
        sink.play(decoder)
    }
}
