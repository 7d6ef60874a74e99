use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use cantor_domain::{DomainError, ScaleType};
use serde::{Deserialize, Serialize};

/// Settings read by the tick loop and the exporters. Missing keys in a
/// config file fall back to the defaults.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub scale: ScaleType,
    /// Boosted RMS level a frame must exceed before pitch detection runs.
    pub sensitivity: f32,
    pub mic_boost: f32,
    /// Forward the sub-semitone bend to the voices as detune.
    pub bend_mode: bool,
    pub harmonizer: bool,
    pub skip_silences: bool,
    pub bpm: f32,
    pub frame_size: usize,
    pub tick_millis: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scale: ScaleType::Major,
            sensitivity: 0.015,
            mic_boost: 3.0,
            bend_mode: true,
            harmonizer: true,
            skip_silences: false,
            bpm: 120.0,
            frame_size: 2048,
            tick_millis: 30,
        }
    }
}

impl EngineConfig {
    /// Reads a `.json` file with serde_json, anything else as YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("read config file {:?}", path))?;
        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&text)
                .with_context(|| format!("parse json config {:?}", path))?,
            _ => Self::from_yaml_str(&text)
                .with_context(|| format!("parse yaml config {:?}", path))?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !(self.sensitivity >= 0.0) {
            return Err(DomainError::validation("sensitivity must be non-negative"));
        }
        if !(self.mic_boost > 0.0) {
            return Err(DomainError::validation("mic boost must be positive"));
        }
        if self.frame_size < 2 {
            return Err(DomainError::validation("frame size must be at least 2"));
        }
        if self.tick_millis == 0 {
            return Err(DomainError::validation("tick period must be positive"));
        }
        if !(10.0..=400.0).contains(&self.bpm) {
            return Err(DomainError::validation("bpm must be between 10 and 400"));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    pub fn tick_seconds(&self) -> f64 {
        self.tick_millis as f64 / 1000.0
    }
}
