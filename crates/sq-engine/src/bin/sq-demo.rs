//! Sequencer demo
//!
//! Usage:
//!   sq-demo run                 - Replay a scripted session against a recording graph
//!   sq-demo run --calls         - Also print every recorded graph call
//!   sq-demo show-preset         - Print the stored preset

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use sq_core::{AudioGraph, RecordingGraph, SendKind, StereoMode};
use sq_engine::{AudioHandle, ClipSource, DecodedAudio, Event, Sequencer, SideEffect};
use sq_state::{FileStore, KeyValueStore, PresetStore, SequencerPreferences};

#[derive(Parser)]
#[command(name = "sq-demo", about = "Sequencer session demo")]
struct Cli {
    /// Preferences file (defaults to the platform config dir)
    #[arg(long, global = true)]
    prefs: Option<PathBuf>,

    /// Preset directory (overrides preferences)
    #[arg(long, global = true)]
    preset_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted editing session
    Run {
        /// Print every recorded graph call
        #[arg(long)]
        calls: bool,
    },
    /// Print the stored preset
    ShowPreset,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let prefs = match &cli.prefs {
        Some(path) => SequencerPreferences::load_from(path),
        None => SequencerPreferences::load(),
    };
    let dir = cli.preset_dir.clone().unwrap_or_else(|| prefs.preset_dir());
    let store = FileStore::new(dir);

    match cli.command {
        Commands::Run { calls } => run_script(prefs, store, calls),
        Commands::ShowPreset => show_preset(&prefs, store),
    }
}

fn run_script(prefs: SequencerPreferences, store: FileStore, print_calls: bool) -> Result<()> {
    log::info!("Preset directory: {}", store.dir().display());
    let mut seq = Sequencer::new(RecordingGraph::new(), store, prefs)?;

    let script = vec![
        Event::DeviceAcquired(Ok(())),
        Event::SetInputGain(0.8),
        Event::SetStereoMode(StereoMode::Mono),
        Event::AddInsert("EQ".into()),
        Event::AddInsert("Compressor".into()),
        Event::AddInsert("Delay".into()),
        Event::MoveInsert { from: 2, to: 0 },
        Event::AddSend(SendKind::Reverb),
        Event::SetSendLevel { index: 0, level: 0.35 },
        Event::SetPan(-0.2),
        Event::FaderDrag { y: 40.0 },
        Event::FaderRelease,
        Event::AutomationClick { x: 0.0, y: 100.0 },
        Event::AutomationClick { x: 400.0, y: 20.0 },
        Event::AutomationClick { x: 800.0, y: 60.0 },
        Event::FileDecoded {
            source: ClipSource::Picker,
            outcome: Ok(DecodedAudio {
                handle: AudioHandle(1),
                duration_secs: 4.0,
            }),
        },
        Event::FileDecoded {
            source: ClipSource::Drop { x: 250.0, y: 230.0 },
            outcome: Ok(DecodedAudio {
                handle: AudioHandle(2),
                duration_secs: 2.5,
            }),
        },
        Event::ClipMoved { clip: 1, x: 300.0, y: 5000.0 },
        Event::Undo,
        Event::Undo,
        Event::Redo,
        Event::TogglePlayback,
        Event::SavePreset,
        Event::RemoveInsert(0),
        Event::LoadPreset,
    ];

    for event in script {
        let label = format!("{event:?}");
        let effects = seq.handle(event)?;
        println!("{label}");
        for effect in effects {
            print_effect(&effect);
        }
    }

    seq.graph_mut().advance(1.5);
    if let Some(x) = seq.poll_playhead() {
        println!("Playhead at x={x:.1} after 1.5s");
    }
    seq.handle(Event::TogglePlayback)?;

    let summary = seq.history().summary();
    println!(
        "History: {} entries, {} redo",
        summary.past_entries, summary.future_entries
    );

    if print_calls {
        println!("Graph calls (t={:.3}):", seq.graph().current_time());
        for call in seq.graph().calls() {
            println!("  {call:?}");
        }
    }
    Ok(())
}

fn print_effect(effect: &SideEffect) {
    match effect {
        SideEffect::Notify(notice) => println!("  ! {notice}"),
        SideEffect::RebuildInsertChain(chain) => {
            let names: Vec<&str> = chain.iter().map(|fx| fx.name()).collect();
            println!("  inserts: [{}]", names.join(", "));
        }
        SideEffect::RenderFader { db, .. } => println!("  fader: {db:.1} dB"),
        SideEffect::RenderAutomation(points) => println!("  automation: {} points", points.len()),
        SideEffect::RenderTimeline(clips) => println!("  timeline: {} clips", clips.len()),
        SideEffect::StartClip {
            clip,
            track_index,
            at_time,
            ..
        } => println!("  start clip {clip} on track {track_index} at t={at_time:.2}"),
        other => println!("  {other:?}"),
    }
}

fn show_preset(prefs: &SequencerPreferences, store: FileStore) -> Result<()> {
    let raw = store
        .get(&prefs.preset.key)?
        .with_context(|| format!("No preset in {}", store.dir().display()))?;
    // Validate before printing
    PresetStore::with_key(store, prefs.preset.key.clone()).load()?;

    let value: serde_json::Value = serde_json::from_str(&raw)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
