use cantor_domain::{QuantizedNote, ScaleType};

/// Fractional MIDI pitch of a frequency, A4 = 440 Hz = 69.
pub fn to_fractional(frequency: f64) -> f64 {
    12.0 * (frequency / 440.0).log2() + 69.0
}

/// Cents between a fractional pitch and its nearest semitone.
pub fn bend_cents(midi_float: f64) -> f64 {
    (midi_float - midi_float.round()) * 100.0
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScaleQuantizer;

impl ScaleQuantizer {
    /// Rounds to the nearest semitone, then moves to the closest scale
    /// offset within the same octave. Distance is not circular, and on a tie
    /// the lower offset wins. Results beyond the i32 range clamp to it.
    pub fn snap(&self, midi_float: f64, scale: ScaleType) -> i32 {
        let midi = midi_float.round() as i32;
        if scale == ScaleType::Chromatic {
            return midi;
        }
        let note = midi.rem_euclid(12);
        let offsets = scale.offsets();
        let closest = offsets[1..].iter().fold(offsets[0], |best, &offset| {
            if (offset - note).abs() < (best - note).abs() {
                offset
            } else {
                best
            }
        });
        midi.saturating_add(closest - note)
    }

    pub fn quantize(&self, frequency: f64, scale: ScaleType) -> QuantizedNote {
        let midi_float = to_fractional(frequency);
        QuantizedNote {
            midi: self.snap(midi_float, scale),
            bend_cents: bend_cents(midi_float),
        }
    }
}
