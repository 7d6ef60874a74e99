use cantor_domain::{midi_to_note_name, RecordedNote, MIN_NOTE_DURATION};
use tracing::{debug, trace};

#[derive(Clone, Debug, PartialEq)]
struct ActiveNote {
    midi: i32,
    name: String,
    onset: f64,
}

/// Turns per-tick note observations into finished notes.
///
/// Idle until a note is observed; a different note or silence closes the
/// active one. Notes shorter than the gate are dropped without a trace in
/// the output.
#[derive(Clone, Debug)]
pub struct NoteEventRecorder {
    start: f64,
    min_duration: f64,
    active: Option<ActiveNote>,
    notes: Vec<RecordedNote>,
}

impl NoteEventRecorder {
    pub fn new(start_time: f64) -> Self {
        Self::with_min_duration(start_time, MIN_NOTE_DURATION)
    }

    pub fn with_min_duration(start_time: f64, min_duration: f64) -> Self {
        Self {
            start: start_time,
            min_duration,
            active: None,
            notes: Vec::new(),
        }
    }

    /// MIDI number of the note currently sounding, if any.
    pub fn active_note(&self) -> Option<i32> {
        self.active.as_ref().map(|note| note.midi)
    }

    /// Notes closed so far, in onset order.
    pub fn notes(&self) -> &[RecordedNote] {
        &self.notes
    }

    /// Feeds one tick. `None` means silence.
    pub fn observe(&mut self, now: f64, note: Option<i32>) {
        match note {
            Some(midi) if self.active_note() == Some(midi) => {}
            Some(midi) => {
                self.close(now);
                self.open(midi, now);
            }
            None => self.close(now),
        }
    }

    /// Closes any sounding note and hands back everything recorded.
    pub fn finish(mut self, now: f64) -> Vec<RecordedNote> {
        self.close(now);
        debug!(count = self.notes.len(), "capture finished");
        self.notes
    }

    fn open(&mut self, midi: i32, now: f64) {
        let onset = now - self.start;
        trace!(midi, onset, "note opened");
        self.active = Some(ActiveNote {
            midi,
            name: midi_to_note_name(midi),
            onset,
        });
    }

    fn close(&mut self, now: f64) {
        let Some(active) = self.active.take() else {
            return;
        };
        let duration = now - self.start - active.onset;
        if duration >= self.min_duration {
            debug!(note = %active.name, onset = active.onset, duration, "note recorded");
            self.notes
                .push(RecordedNote::new(active.name, active.onset, duration));
        } else {
            trace!(note = %active.name, duration, "note below minimum duration dropped");
        }
    }
}
