use cantor_domain::RecordedNote;

/// Gaps longer than this are shortened to exactly this length.
pub const DEFAULT_MAX_GAP: f64 = 0.3;

/// Shrinks long silences between notes while keeping everything else in
/// place. The first note always starts at zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeCompactor {
    pub max_gap: f64,
}

impl Default for TimeCompactor {
    fn default() -> Self {
        Self {
            max_gap: DEFAULT_MAX_GAP,
        }
    }
}

impl TimeCompactor {
    pub fn compact(&self, notes: &[RecordedNote]) -> Vec<RecordedNote> {
        let mut sorted = notes.to_vec();
        sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

        let mut iter = sorted.into_iter();
        let Some(first) = iter.next() else {
            return Vec::new();
        };
        let mut time_offset = first.time;
        let mut last_end = first.duration;
        let mut compacted = Vec::with_capacity(notes.len());
        compacted.push(RecordedNote { time: 0.0, ..first });

        for note in iter {
            let gap = (note.time - time_offset) - last_end;
            if gap > self.max_gap {
                time_offset += gap - self.max_gap;
            }
            let time = note.time - time_offset;
            last_end = time + note.duration;
            compacted.push(RecordedNote { time, ..note });
        }
        compacted
    }
}

/// Compacts when `skip_silences` is set, otherwise returns the notes as-is.
pub fn prepare_notes(notes: &[RecordedNote], skip_silences: bool) -> Vec<RecordedNote> {
    if skip_silences {
        TimeCompactor::default().compact(notes)
    } else {
        notes.to_vec()
    }
}
