use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use cantor_audio::{AnalysisWindow, AudioDecoder, AudioFrame};
use cantor_domain::Session;

use crate::config::EngineConfig;
use crate::tracker::Tracker;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionJob {
    pub audio_path: String,
}

/// Runs recorded audio through the same tick loop as live input.
///
/// The file is fed one tick period at a time into an analysis window of
/// `frame_size` samples, so results match what a live capture of the same
/// signal would have produced.
pub struct TranscriptionPipeline {
    config: EngineConfig,
}

impl TranscriptionPipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[instrument(skip(self))]
    pub fn transcribe(&self, job: &TranscriptionJob) -> Result<Session> {
        info!("loading audio path={}", job.audio_path);
        let audio = AudioDecoder::open(&job.audio_path)?;
        info!(
            seconds = audio.duration_seconds(),
            sample_rate = audio.sample_rate,
            channels = audio.channels,
            "audio decoded"
        );
        self.transcribe_samples(&audio.mono(), audio.sample_rate)
    }

    pub fn transcribe_samples(&self, samples: &[f32], sample_rate: u32) -> Result<Session> {
        self.config.validate()?;
        anyhow::ensure!(sample_rate > 0, "sample rate must be positive");

        let hop = ((sample_rate as f64 * self.config.tick_seconds()).round() as usize).max(1);
        let mut window = AnalysisWindow::new(self.config.frame_size);
        let mut frame = Vec::with_capacity(window.size());
        let mut tracker = Tracker::new();
        let mut consumed = 0usize;

        tracker.start_capture(0.0);
        for chunk in samples.chunks(hop) {
            window.extend(chunk.iter().copied());
            window.copy_into(&mut frame);
            consumed += chunk.len();
            let now = consumed as f64 / sample_rate as f64;
            tracker.tick(&AudioFrame::new(&frame, sample_rate), &self.config, now);
        }
        let end = consumed as f64 / sample_rate as f64;
        let notes = tracker.stop_capture(end);
        info!(
            notes = notes.len(),
            seconds = end,
            scale = %self.config.scale,
            "transcription finished"
        );

        Ok(Session::new(notes, self.config.scale, self.config.bpm)?)
    }
}

impl Default for TranscriptionPipeline {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
