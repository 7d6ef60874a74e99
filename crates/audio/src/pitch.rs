use serde::{Deserialize, Serialize};

use crate::dsp::{rms, trim_edges};
use crate::frame::AudioFrame;

/// Estimates the fundamental frequency of a single frame, in Hz.
pub trait PitchEstimator {
    fn estimate(&self, frame: &AudioFrame<'_>) -> Option<f64>;
}

/// Time-domain autocorrelation tuned for a single singing voice.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AutocorrelationEstimator {
    /// Frames quieter than this RMS are treated as silence.
    pub silence_floor: f32,
    /// Edge samples louder than this are trimmed before correlating.
    pub edge_threshold: f32,
    pub min_frequency: f64,
    pub max_frequency: f64,
}

impl Default for AutocorrelationEstimator {
    fn default() -> Self {
        Self {
            silence_floor: 0.01,
            edge_threshold: 0.2,
            min_frequency: 50.0,
            max_frequency: 2000.0,
        }
    }
}

impl PitchEstimator for AutocorrelationEstimator {
    fn estimate(&self, frame: &AudioFrame<'_>) -> Option<f64> {
        if frame.is_empty() || frame.sample_rate() == 0 {
            return None;
        }
        if rms(frame.samples()) < self.silence_floor {
            return None;
        }

        let slice = trim_edges(frame.samples(), self.edge_threshold);
        if slice.len() <= 1 {
            return None;
        }
        let correlation = autocorrelate(slice);
        let lag = dominant_lag(&correlation)?;

        let frequency = frame.sample_rate() as f64 / lag as f64;
        if frequency < self.min_frequency || frequency > self.max_frequency {
            return None;
        }
        Some(frequency)
    }
}

fn autocorrelate(slice: &[f32]) -> Vec<f32> {
    let len = slice.len();
    (0..len)
        .map(|lag| {
            slice[..len - lag]
                .iter()
                .zip(&slice[lag..])
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Lag of the strongest peak after the zero-lag lobe has decayed.
fn dominant_lag(correlation: &[f32]) -> Option<usize> {
    let mut start = 0;
    while start + 1 < correlation.len() && correlation[start] > correlation[start + 1] {
        start += 1;
    }

    let mut best = -1.0;
    let mut lag = None;
    for (index, &value) in correlation.iter().enumerate().skip(start) {
        if value > best {
            best = value;
            lag = Some(index);
        }
    }
    lag.filter(|&lag| lag > 0)
}
