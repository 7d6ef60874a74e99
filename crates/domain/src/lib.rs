pub mod error;
pub mod io;
pub mod notes;
pub mod scale;
pub mod session;

pub use crate::error::DomainError;
pub use crate::io::{ExportFormat, JsonExporter, SessionExporter};
pub use crate::notes::{
    midi_to_note_name, note_name_to_midi, pitch_class_name, ChordResult, QuantizedNote, RecordedNote,
    MIN_NOTE_DURATION, PITCH_CLASSES,
};
pub use crate::scale::ScaleType;
pub use crate::session::Session;
