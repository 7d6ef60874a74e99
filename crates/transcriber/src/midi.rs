//! Standard MIDI File writer for recorded note sequences.
//!
//! Output is one format-1 file with a single track at 480 ticks per quarter
//! note. Seconds map straight onto beats (no tempo event), so one second of
//! capture is one quarter note.

use cantor_domain::{DomainError, ExportFormat, RecordedNote, Session, SessionExporter};
use tracing::{info, warn};

use crate::compact::prepare_notes;

pub const TICKS_PER_QUARTER: u16 = 480;

const HEADER: [u8; 14] = [
    b'M', b'T', b'h', b'd', 0x00, 0x00, 0x00, 0x06, 0x00, 0x01, 0x00, 0x01, 0x01, 0xE0,
];
const TRACK_MAGIC: [u8; 4] = *b"MTrk";
const END_OF_TRACK: [u8; 4] = [0x00, 0xFF, 0x2F, 0x00];

const NOTE_ON: u8 = 0x90;
const NOTE_OFF: u8 = 0x80;
const VELOCITY: u8 = 0x60;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ChannelEvent {
    tick: u32,
    status: u8,
    key: u8,
    velocity: u8,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MidiExporter {
    /// Compact long silences before writing.
    pub skip_silences: bool,
}

impl MidiExporter {
    pub fn new(skip_silences: bool) -> Self {
        Self { skip_silences }
    }

    /// Writes the notes exactly as given.
    pub fn serialize(&self, notes: &[RecordedNote]) -> Vec<u8> {
        let mut events = Vec::with_capacity(notes.len() * 2);
        for note in notes {
            let Some(key) = midi_key(note) else {
                continue;
            };
            events.push(ChannelEvent {
                tick: seconds_to_ticks(note.time),
                status: NOTE_ON,
                key,
                velocity: VELOCITY,
            });
            events.push(ChannelEvent {
                tick: seconds_to_ticks(note.time + note.duration),
                status: NOTE_OFF,
                key,
                velocity: 0,
            });
        }
        // Stable: a note-off keeps its place ahead of a note-on at the same tick.
        events.sort_by_key(|event| event.tick);

        let mut track = Vec::with_capacity(events.len() * 5 + END_OF_TRACK.len());
        let mut last_tick = 0;
        for event in &events {
            write_vlq(event.tick - last_tick, &mut track);
            track.extend_from_slice(&[event.status, event.key, event.velocity]);
            last_tick = event.tick;
        }
        track.extend_from_slice(&END_OF_TRACK);

        let mut bytes = Vec::with_capacity(HEADER.len() + 8 + track.len());
        bytes.extend_from_slice(&HEADER);
        bytes.extend_from_slice(&TRACK_MAGIC);
        bytes.extend_from_slice(&(track.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&track);
        bytes
    }

    pub fn export_session(&self, session: &Session) -> Vec<u8> {
        let notes = prepare_notes(session.notes(), self.skip_silences);
        let bytes = self.serialize(&notes);
        info!(
            session = session.id(),
            notes = notes.len(),
            bytes = bytes.len(),
            "exported midi"
        );
        bytes
    }
}

impl SessionExporter for MidiExporter {
    fn export(&self, session: &Session, format: ExportFormat) -> Result<Vec<u8>, DomainError> {
        match format {
            ExportFormat::Midi => Ok(self.export_session(session)),
            other => Err(DomainError::validation(format!(
                "MidiExporter cannot handle {:?}",
                other
            ))),
        }
    }
}

fn midi_key(note: &RecordedNote) -> Option<u8> {
    match note.midi() {
        Ok(midi) => match u8::try_from(midi) {
            Ok(key) if key <= 127 => Some(key),
            _ => {
                warn!(note = %note.note, midi, "pitch outside the midi range skipped");
                None
            }
        },
        Err(err) => {
            warn!(%err, "unreadable note skipped");
            None
        }
    }
}

fn seconds_to_ticks(seconds: f64) -> u32 {
    (seconds * TICKS_PER_QUARTER as f64).round().max(0.0) as u32
}

/// Variable-length quantity: 7 bits per byte, most significant group first,
/// high bit set on every byte but the last.
pub fn write_vlq(value: u32, out: &mut Vec<u8>) {
    let mut groups = [0u8; 5];
    let mut count = 0;
    let mut rest = value;
    loop {
        groups[count] = (rest & 0x7F) as u8;
        count += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for index in (0..count).rev() {
        let continuation = if index == 0 { 0 } else { 0x80 };
        out.push(groups[index] | continuation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantor_domain::ScaleType;
    use midly::num::u15;
    use midly::{Format, MidiMessage, Smf, Timing, TrackEventKind};

    fn vlq(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        write_vlq(value, &mut out);
        out
    }

    /// (absolute tick, is note-on, key) for every channel event in the file.
    fn decode(bytes: &[u8]) -> Vec<(u32, bool, u8)> {
        let smf = Smf::parse(bytes).expect("valid smf");
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(480)));
        assert_eq!(smf.tracks.len(), 1);
        let mut tick = 0;
        let mut events = Vec::new();
        for event in &smf.tracks[0] {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi { message, .. } = event.kind {
                match message {
                    MidiMessage::NoteOn { key, .. } => events.push((tick, true, key.as_int())),
                    MidiMessage::NoteOff { key, .. } => events.push((tick, false, key.as_int())),
                    _ => {}
                }
            }
        }
        events
    }

    #[test]
    fn vlq_encoding() {
        assert_eq!(vlq(0), vec![0x00]);
        assert_eq!(vlq(0x7F), vec![0x7F]);
        assert_eq!(vlq(0x80), vec![0x81, 0x00]);
        assert_eq!(vlq(480), vec![0x83, 0x60]);
        assert_eq!(vlq(0x3FFF), vec![0xFF, 0x7F]);
        assert_eq!(vlq(0x20_0000), vec![0x81, 0x80, 0x80, 0x00]);
        assert_eq!(vlq(0x0FFF_FFFF), vec![0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn single_beat_bytes() {
        let bytes = MidiExporter::default().serialize(&[RecordedNote::new("C4", 0.0, 1.0)]);
        let mut expected = HEADER.to_vec();
        expected.extend_from_slice(b"MTrk");
        expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x0D]);
        expected.extend_from_slice(&[0x00, 0x90, 0x3C, 0x60]);
        expected.extend_from_slice(&[0x83, 0x60, 0x80, 0x3C, 0x00]);
        expected.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn single_beat_decodes_with_standard_reader() {
        let bytes = MidiExporter::default().serialize(&[RecordedNote::new("C4", 0.0, 1.0)]);
        assert_eq!(decode(&bytes), vec![(0, true, 60), (480, false, 60)]);
    }

    #[test]
    fn off_precedes_on_at_shared_tick() {
        let notes = [
            RecordedNote::new("C4", 0.0, 1.0),
            RecordedNote::new("D4", 1.0, 0.5),
        ];
        let bytes = MidiExporter::default().serialize(&notes);
        assert_eq!(
            decode(&bytes),
            vec![(0, true, 60), (480, false, 60), (480, true, 62), (720, false, 62)]
        );
    }

    #[test]
    fn events_are_sorted_across_notes() {
        let notes = [
            RecordedNote::new("E4", 2.0, 0.5),
            RecordedNote::new("C4", 0.0, 3.0),
        ];
        let bytes = MidiExporter::default().serialize(&notes);
        assert_eq!(
            decode(&bytes),
            vec![(0, true, 60), (960, true, 64), (1200, false, 64), (1440, false, 60)]
        );
    }

    #[test]
    fn empty_sequence_is_a_valid_file() {
        let bytes = MidiExporter::default().serialize(&[]);
        assert_eq!(&bytes[14..22], b"MTrk\x00\x00\x00\x04");
        assert_eq!(&bytes[22..], &END_OF_TRACK);
        assert!(decode(&bytes).is_empty());
    }

    #[test]
    fn degenerate_notes_do_not_break_the_file() {
        let notes = [
            RecordedNote::new("A4", 0.5, 0.0),
            RecordedNote::new("not-a-note", 0.0, 1.0),
            RecordedNote::new("C10", 0.0, 1.0),
        ];
        let bytes = MidiExporter::default().serialize(&notes);
        assert_eq!(decode(&bytes), vec![(240, true, 69), (240, false, 69)]);
    }

    #[test]
    fn session_export_compacts_when_asked() {
        let session = Session::new(
            vec![
                RecordedNote::new("C4", 1.0, 0.5),
                RecordedNote::new("E4", 4.0, 0.5),
            ],
            ScaleType::Major,
            120.0,
        )
        .unwrap();

        let raw = MidiExporter::new(false)
            .export(&session, ExportFormat::Midi)
            .unwrap();
        assert_eq!(
            decode(&raw),
            vec![(480, true, 60), (720, false, 60), (1920, true, 64), (2160, false, 64)]
        );

        let compacted = MidiExporter::new(true).export_session(&session);
        assert_eq!(
            decode(&compacted),
            vec![(0, true, 60), (240, false, 60), (384, true, 64), (624, false, 64)]
        );

        assert!(MidiExporter::default()
            .export(&session, ExportFormat::Json)
            .is_err());
    }
}
