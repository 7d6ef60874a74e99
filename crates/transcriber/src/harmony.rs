use cantor_domain::{notes::pitch_class_name, ChordResult, ScaleType};

/// Builds stacked-third triads from the degrees of a scale.
#[derive(Clone, Copy, Debug, Default)]
pub struct Harmonizer;

impl Harmonizer {
    pub fn chord_for(&self, root: i32, scale: ScaleType) -> ChordResult {
        let root_name = pitch_class_name(root);
        if scale == ScaleType::Chromatic {
            return ChordResult {
                notes: vec![root, root.saturating_add(4), root.saturating_add(7)],
                name: format!("{root_name} Maj"),
            };
        }

        let offsets = scale.offsets();
        let pitch_class = root.rem_euclid(12);
        let Some(degree) = scale.degree_of(pitch_class) else {
            return ChordResult {
                notes: vec![root],
                name: root_name.to_string(),
            };
        };

        // Notes past the ends of the i32 range clamp to the boundary.
        let note_at = |steps: usize| {
            let index = degree + steps;
            let octave_shift = (index / offsets.len()) as i32;
            root.saturating_add(octave_shift * 12 + offsets[index % offsets.len()] - pitch_class)
        };

        // Any third other than three semitones is labelled major.
        let third_interval = (offsets[(degree + 2) % offsets.len()] - pitch_class + 12) % 12;
        let quality = if third_interval == 3 { "min" } else { "Maj" };
        ChordResult {
            notes: vec![root, note_at(2), note_at(4)],
            name: format!("{root_name} {quality}"),
        }
    }
}
