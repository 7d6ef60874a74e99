use cantor_audio::{AudioFrame, AutocorrelationEstimator, PitchEstimator};
use cantor_domain::{ChordResult, QuantizedNote, RecordedNote};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::harmony::Harmonizer;
use crate::notation::ScaleQuantizer;
use crate::recorder::NoteEventRecorder;

/// Something that can sound notes by name: a sampler, a synth, a logger.
pub trait VoiceTrigger {
    fn trigger_attack(&mut self, note: &str);
    fn release_all(&mut self);
    fn set_detune(&mut self, _cents: f64) {}
}

#[derive(Clone, Debug, PartialEq)]
pub enum VoiceCommand {
    Detune(f64),
    /// Replace whatever is sounding with a new lead note and its chord.
    Attack { lead: String, chord: Vec<String> },
    Release,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickOutput {
    /// Boosted RMS of the frame, for level meters.
    pub level: f32,
    pub frequency: Option<f64>,
    pub note: Option<QuantizedNote>,
    pub chord: Option<ChordResult>,
    pub commands: Vec<VoiceCommand>,
}

impl TickOutput {
    pub fn apply(&self, lead: &mut dyn VoiceTrigger, chord: &mut dyn VoiceTrigger) {
        for command in &self.commands {
            match command {
                VoiceCommand::Detune(cents) => {
                    lead.set_detune(*cents);
                    chord.set_detune(*cents);
                }
                VoiceCommand::Attack {
                    lead: lead_note,
                    chord: chord_notes,
                } => {
                    lead.release_all();
                    lead.trigger_attack(lead_note);
                    chord.release_all();
                    for note in chord_notes {
                        chord.trigger_attack(note);
                    }
                }
                VoiceCommand::Release => {
                    lead.release_all();
                    chord.release_all();
                }
            }
        }
    }
}

/// Per-tick detection state: the held note, its chord, and the capture in
/// progress. Drive it from a single loop; `tick` takes `&mut self`.
pub struct Tracker<E = AutocorrelationEstimator> {
    estimator: E,
    quantizer: ScaleQuantizer,
    harmonizer: Harmonizer,
    held: Option<QuantizedNote>,
    chord: Option<ChordResult>,
    recorder: Option<NoteEventRecorder>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::with_estimator(AutocorrelationEstimator::default())
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: PitchEstimator> Tracker<E> {
    pub fn with_estimator(estimator: E) -> Self {
        Self {
            estimator,
            quantizer: ScaleQuantizer,
            harmonizer: Harmonizer,
            held: None,
            chord: None,
            recorder: None,
        }
    }

    pub fn held_note(&self) -> Option<QuantizedNote> {
        self.held
    }

    pub fn is_capturing(&self) -> bool {
        self.recorder.is_some()
    }

    /// Forgets the held note so the next pitched frame triggers afresh.
    pub fn reset(&mut self) {
        self.held = None;
        self.chord = None;
    }

    pub fn start_capture(&mut self, start_time: f64) {
        self.reset();
        self.recorder = Some(NoteEventRecorder::new(start_time));
        info!(start_time, "capture started");
    }

    /// Ends the capture and returns its notes; empty if none was running.
    pub fn stop_capture(&mut self, now: f64) -> Vec<RecordedNote> {
        match self.recorder.take() {
            Some(recorder) => {
                let notes = recorder.finish(now);
                info!(count = notes.len(), "capture stopped");
                notes
            }
            None => Vec::new(),
        }
    }

    pub fn tick(&mut self, frame: &AudioFrame<'_>, config: &EngineConfig, now: f64) -> TickOutput {
        let level = frame.rms() * config.mic_boost;
        let mut output = TickOutput {
            level,
            ..Default::default()
        };

        if level > config.sensitivity {
            // Loud but unpitched frames keep whatever is held.
            if let Some(frequency) = self.estimator.estimate(frame) {
                output.frequency = Some(frequency);
                self.observe_pitch(frequency, config, now, &mut output.commands);
            }
        } else if self.held.is_some() {
            debug!(now, "released");
            output.commands.push(VoiceCommand::Release);
            if let Some(recorder) = self.recorder.as_mut() {
                recorder.observe(now, None);
            }
            self.reset();
        }

        output.note = self.held;
        output.chord = self.chord.clone();
        output
    }

    fn observe_pitch(
        &mut self,
        frequency: f64,
        config: &EngineConfig,
        now: f64,
        commands: &mut Vec<VoiceCommand>,
    ) {
        let note = self.quantizer.quantize(frequency, config.scale);
        if config.bend_mode {
            commands.push(VoiceCommand::Detune(note.bend_cents));
        }

        let changed = self.held.map(|held| held.midi) != Some(note.midi);
        self.held = Some(note);
        if !changed {
            return;
        }

        if let Some(recorder) = self.recorder.as_mut() {
            recorder.observe(now, Some(note.midi));
        }
        self.chord = config
            .harmonizer
            .then(|| self.harmonizer.chord_for(note.midi, config.scale));
        let lead = note.name();
        debug!(
            note = %lead,
            frequency,
            chord = self.chord.as_ref().map(|chord| chord.name.as_str()),
            "note changed"
        );
        commands.push(VoiceCommand::Attack {
            lead,
            chord: self
                .chord
                .as_ref()
                .map(ChordResult::note_names)
                .unwrap_or_default(),
        });
    }
}

/// Voice that only logs what it would play.
#[derive(Clone, Debug)]
pub struct TracingVoice {
    pub label: &'static str,
}

impl VoiceTrigger for TracingVoice {
    fn trigger_attack(&mut self, note: &str) {
        info!(voice = self.label, note, "attack");
    }

    fn release_all(&mut self) {
        debug!(voice = self.label, "release");
    }

    fn set_detune(&mut self, cents: f64) {
        debug!(voice = self.label, cents, "detune");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantor_domain::ScaleType;
    use std::f32::consts::PI;

    const SAMPLE_RATE: u32 = 44_100;

    fn sine(frequency: f32) -> Vec<f32> {
        (0..1024)
            .map(|i| 0.8 * (2.0 * PI * frequency * i as f32 / SAMPLE_RATE as f32).sin())
            .collect()
    }

    #[derive(Default)]
    struct RecordingVoice {
        events: Vec<String>,
        detune: f64,
    }

    impl VoiceTrigger for RecordingVoice {
        fn trigger_attack(&mut self, note: &str) {
            self.events.push(format!("on {note}"));
        }

        fn release_all(&mut self) {
            self.events.push("release".into());
        }

        fn set_detune(&mut self, cents: f64) {
            self.detune = cents;
        }
    }

    fn chromatic() -> EngineConfig {
        EngineConfig {
            scale: ScaleType::Chromatic,
            ..Default::default()
        }
    }

    #[test]
    fn silent_frames_do_nothing() {
        let mut tracker = Tracker::new();
        let silence = vec![0.0; 1024];
        let output = tracker.tick(&AudioFrame::new(&silence, SAMPLE_RATE), &chromatic(), 0.0);
        assert_eq!(output.level, 0.0);
        assert!(output.commands.is_empty());
        assert_eq!(output.note, None);
    }

    #[test]
    fn new_pitch_attacks_lead_and_chord() {
        let mut tracker = Tracker::new();
        let a4 = sine(440.0);
        let output = tracker.tick(&AudioFrame::new(&a4, SAMPLE_RATE), &chromatic(), 0.0);

        assert_eq!(output.note.map(|n| n.midi), Some(69));
        let chord = output.chord.clone().unwrap();
        assert_eq!(chord.name, "A Maj");
        assert!(matches!(output.commands[0], VoiceCommand::Detune(_)));
        assert_eq!(
            output.commands[1],
            VoiceCommand::Attack {
                lead: "A4".into(),
                chord: vec!["A4".into(), "C#5".into(), "E5".into()],
            }
        );

        let mut lead = RecordingVoice::default();
        let mut pad = RecordingVoice::default();
        output.apply(&mut lead, &mut pad);
        assert_eq!(lead.events, vec!["release", "on A4"]);
        assert_eq!(pad.events, vec!["release", "on A4", "on C#5", "on E5"]);
    }

    #[test]
    fn held_pitch_only_updates_bend() {
        let mut tracker = Tracker::new();
        let a4 = sine(440.0);
        let frame = AudioFrame::new(&a4, SAMPLE_RATE);
        tracker.tick(&frame, &chromatic(), 0.0);
        let output = tracker.tick(&frame, &chromatic(), 0.03);
        assert_eq!(output.commands.len(), 1);
        assert!(matches!(output.commands[0], VoiceCommand::Detune(_)));
    }

    #[test]
    fn bend_and_harmony_can_be_disabled() {
        let config = EngineConfig {
            bend_mode: false,
            harmonizer: false,
            ..chromatic()
        };
        let mut tracker = Tracker::new();
        let a4 = sine(440.0);
        let output = tracker.tick(&AudioFrame::new(&a4, SAMPLE_RATE), &config, 0.0);
        assert_eq!(output.chord, None);
        assert_eq!(
            output.commands,
            vec![VoiceCommand::Attack {
                lead: "A4".into(),
                chord: Vec::new(),
            }]
        );
    }

    #[test]
    fn quiet_frame_releases_held_note() {
        let mut tracker = Tracker::new();
        let a4 = sine(440.0);
        let silence = vec![0.0; 1024];
        tracker.tick(&AudioFrame::new(&a4, SAMPLE_RATE), &chromatic(), 0.0);
        let output = tracker.tick(&AudioFrame::new(&silence, SAMPLE_RATE), &chromatic(), 0.03);
        assert_eq!(output.commands, vec![VoiceCommand::Release]);
        assert_eq!(output.note, None);
        assert_eq!(output.chord, None);

        let output = tracker.tick(&AudioFrame::new(&silence, SAMPLE_RATE), &chromatic(), 0.06);
        assert!(output.commands.is_empty());
    }

    #[test]
    fn loud_unpitched_frame_holds_the_note() {
        let mut tracker = Tracker::new();
        let a4 = sine(440.0);
        let hiss = sine(8000.0);
        tracker.tick(&AudioFrame::new(&a4, SAMPLE_RATE), &chromatic(), 0.0);
        let output = tracker.tick(&AudioFrame::new(&hiss, SAMPLE_RATE), &chromatic(), 0.03);
        assert!(output.commands.is_empty());
        assert_eq!(output.frequency, None);
        assert_eq!(output.note.map(|n| n.midi), Some(69));
    }

    #[test]
    fn capture_records_notes_between_start_and_stop() {
        let config = EngineConfig::default();
        let mut tracker = Tracker::new();
        let c5 = sine(523.25);
        let e5 = sine(659.25);
        let silence = vec![0.0; 1024];

        // A note held before the capture starts is re-triggered inside it.
        tracker.tick(&AudioFrame::new(&c5, SAMPLE_RATE), &config, 0.0);
        tracker.start_capture(1.0);
        assert!(tracker.is_capturing());
        assert_eq!(tracker.held_note(), None);

        let mut now = 1.0;
        for _ in 0..10 {
            tracker.tick(&AudioFrame::new(&c5, SAMPLE_RATE), &config, now);
            now += 0.03;
        }
        tracker.tick(&AudioFrame::new(&silence, SAMPLE_RATE), &config, now);
        now += 0.03;
        for _ in 0..10 {
            tracker.tick(&AudioFrame::new(&e5, SAMPLE_RATE), &config, now);
            now += 0.03;
        }
        let notes = tracker.stop_capture(now);
        assert!(!tracker.is_capturing());

        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].note, "C5");
        assert!(notes[0].time.abs() < 1e-9);
        assert!((notes[0].duration - 0.3).abs() < 1e-6);
        assert_eq!(notes[1].note, "E5");
        assert!((notes[1].time - 0.33).abs() < 1e-6);
        assert!((notes[1].duration - 0.3).abs() < 1e-6);

        assert!(tracker.stop_capture(now).is_empty());
    }
}
