use cantor_domain::{midi_to_note_name, Session};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::compact::prepare_notes;
use crate::harmony::Harmonizer;

/// Extra time after the last note so release tails can ring out.
pub const RELEASE_TAIL: f64 = 1.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum VoiceRole {
    Lead,
    Chord,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScheduledNote {
    pub role: VoiceRole,
    pub note: String,
    pub start: f64,
    pub duration: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayOptions {
    pub skip_silences: bool,
    pub harmonize: bool,
}

/// Everything an offline renderer needs to play a session back.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ReplaySchedule {
    pub notes: Vec<ScheduledNote>,
    pub end_time: f64,
}

impl ReplaySchedule {
    pub fn build(session: &Session, options: ReplayOptions) -> Self {
        let harmonizer = Harmonizer;
        let mut notes = Vec::new();
        let mut last_end: f64 = 0.0;

        for recorded in prepare_notes(session.notes(), options.skip_silences) {
            last_end = last_end.max(recorded.end());
            if options.harmonize {
                match recorded.midi() {
                    Ok(midi) => {
                        let chord = harmonizer.chord_for(midi, session.scale());
                        notes.extend(chord.notes.into_iter().map(|midi| ScheduledNote {
                            role: VoiceRole::Chord,
                            note: midi_to_note_name(midi),
                            start: recorded.time,
                            duration: recorded.duration,
                        }));
                    }
                    Err(err) => warn!(%err, "no chord for unreadable note"),
                }
            }
            notes.push(ScheduledNote {
                role: VoiceRole::Lead,
                note: recorded.note,
                start: recorded.time,
                duration: recorded.duration,
            });
        }

        Self {
            notes,
            end_time: last_end + RELEASE_TAIL,
        }
    }

    pub fn lead(&self) -> impl Iterator<Item = &ScheduledNote> {
        self.notes.iter().filter(|note| note.role == VoiceRole::Lead)
    }

    pub fn chords(&self) -> impl Iterator<Item = &ScheduledNote> {
        self.notes.iter().filter(|note| note.role == VoiceRole::Chord)
    }
}
