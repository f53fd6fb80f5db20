//! Dispatcher input and output types

use std::fmt;

use sq_core::{ClipPlacement, EffectDescriptor, OutputRoute, SendKind, SqResult, StereoMode};
use sq_state::AutomationPoint;

/// Opaque host handle of a decoded audio buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioHandle(pub u64);

/// Decoded buffer as delivered by the host decoder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedAudio {
    pub handle: AudioHandle,
    pub duration_secs: f64,
}

/// Where a decoded file should land on the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClipSource {
    /// Picked through the file input: track 0 at the left offset
    Picker,
    /// Dropped on the timeline at (x, y)
    Drop { x: f64, y: f64 },
}

/// Host/UI event
#[derive(Debug)]
pub enum Event {
    // Mixer
    SetInputGain(f64),
    SetStereoMode(StereoMode),
    SetPan(f64),
    SetOutput(OutputRoute),
    FaderDrag { y: f64 },
    FaderRelease,

    // Effect chain
    AddInsert(String),
    RemoveInsert(usize),
    MoveInsert { from: usize, to: usize },
    AddSend(SendKind),
    SetSendLevel { index: usize, level: f64 },

    // Automation lane (lane coordinates)
    AutomationClick { x: f64, y: f64 },
    AutomationDoubleClick { x: f64, y: f64 },

    // Timeline
    FileDecoded {
        source: ClipSource,
        outcome: SqResult<DecodedAudio>,
    },
    ClipMoved { clip: usize, x: f64, y: f64 },
    TogglePlayback,

    // History and presets
    Undo,
    Redo,
    SavePreset,
    LoadPreset,

    /// Outcome of input device acquisition
    DeviceAcquired(SqResult<()>),
}

/// User-facing notice
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    UndoPerformed,
    RedoPerformed,
    NothingToUndo,
    NothingToRedo,
    PresetSaved,
    PresetLoaded,
    NoPresetFound,
    PersistenceFailed(String),
    DecodeFailed(String),
    InputMuted(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndoPerformed => write!(f, "Undo performed."),
            Self::RedoPerformed => write!(f, "Redo performed."),
            Self::NothingToUndo => write!(f, "Nothing to undo."),
            Self::NothingToRedo => write!(f, "Nothing to redo."),
            Self::PresetSaved => write!(f, "Preset saved!"),
            Self::PresetLoaded => write!(f, "Preset loaded!"),
            Self::NoPresetFound => write!(f, "No preset found."),
            Self::PersistenceFailed(reason) => write!(f, "Could not save preset: {reason}"),
            Self::DecodeFailed(reason) => write!(f, "Could not decode audio file: {reason}"),
            Self::InputMuted(reason) => {
                write!(f, "Input unavailable, using silent input: {reason}")
            }
        }
    }
}

/// Work the host must do after an event
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    /// Reconnect the insert chain in this order
    RebuildInsertChain(Vec<EffectDescriptor>),
    /// Redraw channel strip controls (gain, mode, sends, pan, output)
    RenderChannelStrip,
    /// Move the fader knob
    RenderFader { db: f64, knob_y: f64 },
    /// Redraw the automation lane
    RenderAutomation(Vec<AutomationPoint>),
    /// Redraw the timeline
    RenderTimeline(Vec<ClipPlacement>),
    /// Start a clip buffer at host time `at_time`
    StartClip {
        clip: usize,
        audio: AudioHandle,
        track_index: usize,
        at_time: f64,
    },
    /// Stop every playing clip
    StopClips,
    Notify(Notice),
}
