use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::AudioError;
use crate::frame::{AnalysisWindow, AudioFrame};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct StreamConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Samples per analysis frame.
    pub frame_size: usize,
    /// Capacity of the queue between the device callback and the tick loop.
    pub queue_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 1,
            frame_size: 2048,
            queue_capacity: 44_100,
        }
    }
}

/// An open input stream. Samples arrive on the device thread and are pulled
/// into a sliding analysis window by [`StreamHandle::next_frame`].
pub struct StreamHandle {
    config: StreamConfig,
    samples: HeapConsumer<f32>,
    window: AnalysisWindow,
    scratch: Vec<f32>,
    _stream: Option<cpal::Stream>,
}

impl StreamHandle {
    fn new(config: StreamConfig, samples: HeapConsumer<f32>, stream: Option<cpal::Stream>) -> Self {
        let window = AnalysisWindow::new(config.frame_size);
        Self {
            config,
            samples,
            scratch: Vec::with_capacity(window.size()),
            window,
            _stream: stream,
        }
    }

    pub fn config(&self) -> StreamConfig {
        self.config
    }

    /// Drains everything queued since the last call and returns the latest
    /// `frame_size` samples.
    pub fn next_frame(&mut self) -> AudioFrame<'_> {
        self.window.extend(self.samples.pop_iter());
        self.window.copy_into(&mut self.scratch);
        AudioFrame::new(&self.scratch, self.config.sample_rate)
    }
}

pub trait AudioBackend {
    fn open_stream(&self, config: &StreamConfig) -> Result<StreamHandle, AudioError>;
}

/// Backend that never delivers samples; every frame is silent.
pub struct NullBackend;

impl AudioBackend for NullBackend {
    fn open_stream(&self, config: &StreamConfig) -> Result<StreamHandle, AudioError> {
        debug!(?config, "opening null audio stream");
        let (_producer, consumer) = HeapRb::new(config.queue_capacity.max(1)).split();
        Ok(StreamHandle::new(*config, consumer, None))
    }
}

/// Default input device of the default host.
///
/// The device's own sample rate and channel count win over the requested
/// ones; channels are averaged down to mono before queueing.
pub struct CpalBackend;

impl AudioBackend for CpalBackend {
    fn open_stream(&self, config: &StreamConfig) -> Result<StreamHandle, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| AudioError::DeviceUnavailable("no default input device".into()))?;
        let supported = device
            .default_input_config()
            .map_err(|err| AudioError::DeviceUnavailable(err.to_string()))?;
        let channels = supported.channels() as usize;
        let actual = StreamConfig {
            sample_rate: supported.sample_rate().0,
            channels: 1,
            ..*config
        };
        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate = actual.sample_rate,
            channels,
            "opening input stream"
        );

        let (mut producer, consumer) = HeapRb::new(config.queue_capacity.max(1)).split();
        let stream_config: cpal::StreamConfig = supported.config();
        let on_error = |err: cpal::StreamError| warn!(%err, "input stream error");
        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    push_mono(&mut producer, data, channels, |s| s)
                },
                on_error,
                None,
            ),
            cpal::SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    push_mono(&mut producer, data, channels, |s| s as f32 / i16::MAX as f32)
                },
                on_error,
                None,
            ),
            cpal::SampleFormat::U16 => device.build_input_stream(
                &stream_config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    push_mono(&mut producer, data, channels, |s| {
                        (s as f32 - 32_768.0) / 32_768.0
                    })
                },
                on_error,
                None,
            ),
            other => return Err(AudioError::UnsupportedFormat(format!("{other:?}"))),
        }
        .map_err(|err| AudioError::Stream(err.to_string()))?;
        stream
            .play()
            .map_err(|err| AudioError::Stream(err.to_string()))?;

        Ok(StreamHandle::new(actual, consumer, Some(stream)))
    }
}

fn push_mono<T: Copy>(
    producer: &mut HeapProducer<f32>,
    data: &[T],
    channels: usize,
    to_f32: impl Fn(T) -> f32,
) {
    for frame in data.chunks(channels.max(1)) {
        let sum: f32 = frame.iter().map(|&s| to_f32(s)).sum();
        // A full queue means the tick loop is behind; newest samples are dropped.
        let _ = producer.push(sum / frame.len() as f32);
    }
}
