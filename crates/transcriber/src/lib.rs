pub mod compact;
pub mod config;
pub mod harmony;
pub mod midi;
pub mod notation;
pub mod pipeline;
pub mod recorder;
pub mod replay;
pub mod tracker;

pub use compact::{prepare_notes, TimeCompactor};
pub use config::EngineConfig;
pub use harmony::Harmonizer;
pub use midi::MidiExporter;
pub use notation::{bend_cents, to_fractional, ScaleQuantizer};
pub use pipeline::{TranscriptionJob, TranscriptionPipeline};
pub use recorder::NoteEventRecorder;
pub use replay::{ReplayOptions, ReplaySchedule, ScheduledNote, VoiceRole};
pub use tracker::{TickOutput, Tracker, TracingVoice, VoiceCommand, VoiceTrigger};
