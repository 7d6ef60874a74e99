pub mod backend;
pub mod dsp;
pub mod error;
pub mod frame;
pub mod io;
pub mod pitch;

pub use backend::{AudioBackend, CpalBackend, NullBackend, StreamConfig, StreamHandle};
pub use dsp::{downmix, rms, trim_edges};
pub use error::AudioError;
pub use frame::{AnalysisWindow, AudioFrame};
pub use io::{AudioDecoder, AudioReader};
pub use pitch::{AutocorrelationEstimator, PitchEstimator};
