use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use cantor_audio::{AudioBackend, CpalBackend, StreamConfig};
use cantor_domain::{note_name_to_midi, ExportFormat, JsonExporter, ScaleType, Session, SessionExporter};
use cantor_transcriber::{
    EngineConfig, Harmonizer, MidiExporter, Tracker, TracingVoice, TranscriptionJob,
    TranscriptionPipeline, VoiceCommand,
};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn a sung melody into MIDI notes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transcribe an audio file
    Transcribe {
        /// Path to the audio file to transcribe
        input: PathBuf,
        #[command(flatten)]
        settings: Settings,
    },
    /// Capture from the default input device
    Listen {
        /// How long to capture for
        #[arg(long, default_value_t = 10.0)]
        seconds: f64,
        #[command(flatten)]
        settings: Settings,
    },
    /// Print the triad the harmonizer builds on a note
    Chord {
        /// Note name such as C4 or F#3
        note: String,
        #[arg(short, long, default_value = "major")]
        scale: ScaleType,
    },
}

#[derive(Args, Debug)]
struct Settings {
    /// YAML or JSON engine configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Scale detected notes snap to: chromatic, major, minor, pentatonic or blues
    #[arg(short, long)]
    scale: Option<ScaleType>,
    /// Tempo stored with the session
    #[arg(long)]
    bpm: Option<f32>,
    /// Shorten silences longer than 0.3s in the exported MIDI
    #[arg(long)]
    skip_silences: bool,
    /// Write a standard MIDI file here
    #[arg(long)]
    midi: Option<PathBuf>,
    /// Write the session as JSON here
    #[arg(long)]
    json: Option<PathBuf>,
}

impl Settings {
    fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        if let Some(bpm) = self.bpm {
            config.bpm = bpm;
        }
        config.skip_silences |= self.skip_silences;
        config.validate()?;
        Ok(config)
    }

    fn write_outputs(&self, session: &Session, config: &EngineConfig) -> Result<()> {
        if let Some(path) = &self.midi {
            let bytes = MidiExporter::new(config.skip_silences).export(session, ExportFormat::Midi)?;
            fs::write(path, bytes).with_context(|| format!("write midi file {:?}", path))?;
            info!(path = %path.display(), "wrote midi");
        }
        if let Some(path) = &self.json {
            let bytes = JsonExporter.export(session, ExportFormat::Json)?;
            fs::write(path, bytes).with_context(|| format!("write session file {:?}", path))?;
            info!(path = %path.display(), "wrote session json");
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Transcribe { input, settings } => {
            let config = settings.engine_config()?;
            let pipeline = TranscriptionPipeline::new(config.clone());
            let job = TranscriptionJob {
                audio_path: input.display().to_string(),
            };
            let session = pipeline.transcribe(&job)?;
            print_session(&session);
            settings.write_outputs(&session, &config)?;
        }
        Command::Listen { seconds, settings } => {
            let config = settings.engine_config()?;
            let session = listen(seconds, &config)?;
            print_session(&session);
            settings.write_outputs(&session, &config)?;
        }
        Command::Chord { note, scale } => {
            let midi = note_name_to_midi(&note)?;
            let chord = Harmonizer.chord_for(midi, scale);
            println!("{}: {}", chord.name, chord.note_names().join(" "));
            if !scale.contains(midi) {
                println!("{note} is outside {scale}, so only the root sounds");
            }
        }
    }
    Ok(())
}

fn listen(seconds: f64, config: &EngineConfig) -> Result<Session> {
    let stream_config = StreamConfig {
        frame_size: config.frame_size,
        ..Default::default()
    };
    let mut stream = CpalBackend.open_stream(&stream_config)?;
    let mut tracker = Tracker::new();
    let mut lead = TracingVoice { label: "lead" };
    let mut pad = TracingVoice { label: "chord" };

    println!("Listening for {seconds:.1}s, sing!");
    let clock = Instant::now();
    tracker.start_capture(0.0);
    while clock.elapsed().as_secs_f64() < seconds {
        let now = clock.elapsed().as_secs_f64();
        let frame = stream.next_frame();
        let output = tracker.tick(&frame, config, now);
        output.apply(&mut lead, &mut pad);
        for command in &output.commands {
            if let VoiceCommand::Attack { lead, .. } = command {
                let chord = output.chord.as_ref().map(|c| c.name.as_str()).unwrap_or("-");
                println!("{now:>7.2}s  {lead:<4} {chord}");
            }
        }
        thread::sleep(config.tick_period());
    }
    let notes = tracker.stop_capture(clock.elapsed().as_secs_f64());
    Ok(Session::new(notes, config.scale, config.bpm)?)
}

fn print_session(session: &Session) {
    println!(
        "{} notes in {} at {} bpm ({:.3}s per beat)",
        session.notes().len(),
        session.scale(),
        session.bpm(),
        session.seconds_per_beat()
    );
    for note in session.notes() {
        println!("{:>7.2}s  {:<4} {:.2}s", note.time, note.note, note.duration);
    }
}
