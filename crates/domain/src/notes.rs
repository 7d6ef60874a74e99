use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Notes held for less than this many seconds are dropped from a capture.
pub const MIN_NOTE_DURATION: f64 = 0.05;

pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Pitch-class name of a MIDI note, without octave.
pub fn pitch_class_name(midi: i32) -> &'static str {
    PITCH_CLASSES[midi.rem_euclid(12) as usize]
}

/// Scientific pitch notation for a MIDI note number, `60 -> "C4"`.
pub fn midi_to_note_name(midi: i32) -> String {
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", pitch_class_name(midi), octave)
}

/// Parses names such as `C4`, `F#3`, `Bb2` or `C-1` back into a MIDI number.
pub fn note_name_to_midi(name: &str) -> Result<i32, DomainError> {
    let invalid = || DomainError::NoteName(name.to_string());
    let mut chars = name.trim().chars().peekable();
    let letter = chars.next().ok_or_else(invalid)?;
    let mut pitch = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(invalid()),
    };
    while let Some(&accidental) = chars.peek() {
        match accidental {
            '#' => pitch += 1,
            'b' => pitch -= 1,
            _ => break,
        }
        chars.next();
    }
    let octave: i32 = chars.collect::<String>().parse().map_err(|_| invalid())?;
    Ok((octave + 1) * 12 + pitch)
}

/// A detected pitch snapped to a scale note, with the residual bend.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuantizedNote {
    pub midi: i32,
    /// Distance of the raw pitch from the nearest semitone, in cents.
    pub bend_cents: f64,
}

impl QuantizedNote {
    pub fn name(&self) -> String {
        midi_to_note_name(self.midi)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChordResult {
    pub notes: Vec<i32>,
    pub name: String,
}

impl ChordResult {
    pub fn note_names(&self) -> Vec<String> {
        self.notes.iter().copied().map(midi_to_note_name).collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RecordedNote {
    pub note: String,
    /// Seconds from the start of the capture.
    pub time: f64,
    /// Seconds.
    pub duration: f64,
}

impl RecordedNote {
    pub fn new(note: impl Into<String>, time: f64, duration: f64) -> Self {
        Self {
            note: note.into(),
            time,
            duration,
        }
    }

    pub fn midi(&self) -> Result<i32, DomainError> {
        note_name_to_midi(&self.note)
    }

    pub fn end(&self) -> f64 {
        self.time + self.duration
    }
}
