use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::dsp::downmix;

/// A fully decoded file, samples interleaved by channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioReader {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioReader {
    pub fn mono(&self) -> Vec<f32> {
        downmix(&self.samples, self.channels as usize)
    }

    pub fn duration_seconds(&self) -> f64 {
        let frames = self.samples.len() / self.channels.max(1) as usize;
        frames as f64 / self.sample_rate.max(1) as f64
    }
}

pub struct AudioDecoder;

impl AudioDecoder {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<AudioReader> {
        let path_ref = path.as_ref();
        let file =
            File::open(path_ref).with_context(|| format!("open audio file {:?}", path_ref))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let mut hint = Hint::new();
        if let Some(ext) = path_ref.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .with_context(|| format!("probe audio format of {:?}", path_ref))?;
        let mut format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| anyhow::anyhow!("no default track found"))?;
        let track_id = track.id;
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
        let mut channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(1);
        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphError::ResetRequired) => break,
                Err(err) => return Err(err.into()),
            };
            if packet.track_id() != track_id {
                continue;
            }
            match decoder.decode(&packet) {
                Ok(buffer) => {
                    let spec = *buffer.spec();
                    sample_rate = spec.rate;
                    channels = spec.channels.count() as u16;
                    let mut out = SampleBuffer::<f32>::new(buffer.capacity() as u64, spec);
                    out.copy_interleaved_ref(buffer);
                    samples.extend_from_slice(out.samples());
                }
                Err(SymphError::DecodeError(reason)) => {
                    debug!(reason, "skipping undecodable packet");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(AudioReader {
            sample_rate,
            channels,
            samples,
        })
    }
}
