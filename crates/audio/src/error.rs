use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio input device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    #[error("audio stream error: {0}")]
    Stream(String),
}
