//! Microphone capture as a fixed-length frame stream

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, Stream, StreamConfig};

use super::decode::AudioFrame;
use super::record::FrameSource;
use crate::{Error, Result};

/// Capture sample rate (16 kHz mono, the speech-model standard)
pub const SAMPLE_RATE: u32 = 16_000;

/// Captures 16-bit mono frames from an input device
///
/// The cpal callback feeds a shared queue; [`FrameSource::read`] drains
/// one fixed-length frame at a time. The device stream exists only
/// between `start` and `stop`.
pub struct Microphone {
    device: Device,
    config: StreamConfig,
    frame_length: usize,
    buffer: Arc<Mutex<VecDeque<i16>>>,
    failed: Arc<AtomicBool>,
    stream: Option<Stream>,
}

/// Drain one frame from the capture queue, surfacing a dead stream
///
/// `None` means not enough samples yet; the caller should wait and retry.
fn drain_frame(
    buffer: &Mutex<VecDeque<i16>>,
    failed: &AtomicBool,
    frame_length: usize,
) -> Option<Result<AudioFrame>> {
    if failed.load(Ordering::SeqCst) {
        return Some(Err(Error::Audio("capture stream failed".to_string())));
    }

    let Ok(mut buf) = buffer.lock() else {
        return Some(Err(Error::Audio("capture buffer poisoned".to_string())));
    };

    if buf.len() >= frame_length {
        Some(Ok(buf.drain(..frame_length).collect()))
    } else {
        None
    }
}

impl Microphone {
    /// Open an input device by index (`None` = default device)
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceOpen`] if the device is missing or has no
    /// mono 16 kHz config.
    pub fn open(device_index: Option<usize>, frame_length: usize) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_index {
            Some(index) => host
                .input_devices()
                .map_err(|e| Error::DeviceOpen(e.to_string()))?
                .nth(index)
                .ok_or_else(|| Error::DeviceOpen(format!("no input device at index {index}")))?,
            None => host
                .default_input_device()
                .ok_or_else(|| Error::DeviceOpen("no input device available".to_string()))?,
        };

        let supported = device
            .supported_input_configs()
            .map_err(|e| Error::DeviceOpen(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::DeviceOpen("no mono 16kHz input config found".to_string()))?;

        let config = supported.with_sample_rate(SampleRate(SAMPLE_RATE)).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            frame_length,
            "microphone opened"
        );

        Ok(Self {
            device,
            config,
            frame_length,
            buffer: Arc::new(Mutex::new(VecDeque::new())),
            failed: Arc::new(AtomicBool::new(false)),
            stream: None,
        })
    }

    /// Names of the available input devices, in index order
    ///
    /// # Errors
    ///
    /// Returns error if the host cannot enumerate devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| Error::DeviceOpen(e.to_string()))?;

        Ok(devices
            .map(|d| d.name().unwrap_or_else(|_| "<unknown>".to_string()))
            .collect())
    }
}

impl FrameSource for Microphone {
    fn start(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        self.failed.store(false, Ordering::SeqCst);
        let buffer = Arc::clone(&self.buffer);
        let failed = Arc::clone(&self.failed);
        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = buffer.lock() {
                        #[allow(clippy::cast_possible_truncation)]
                        buf.extend(
                            data.iter()
                                .map(|&s| (s * 32767.0).clamp(-32768.0, 32767.0) as i16),
                        );
                    }
                },
                move |err| {
                    tracing::error!(error = %err, "audio capture error");
                    failed.store(true, Ordering::SeqCst);
                },
                None,
            )
            .map_err(|e| Error::DeviceOpen(e.to_string()))?;

        stream.play().map_err(|e| Error::DeviceOpen(e.to_string()))?;
        self.stream = Some(stream);
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }

        tracing::debug!("microphone capture started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            tracing::debug!("microphone capture stopped");
        }
    }

    fn read(&mut self) -> Result<AudioFrame> {
        if self.stream.is_none() {
            return Err(Error::Audio("microphone not started".to_string()));
        }

        loop {
            if let Some(frame) = drain_frame(&self.buffer, &self.failed, self.frame_length) {
                return frame;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn frame_length(&self) -> usize {
        self.frame_length
    }
}
