//! Session snapshots
//!
//! A [`Snapshot`] is an immutable capture of every serializable session
//! parameter. Decoded audio is never part of a snapshot; clips are recorded
//! by placement only.
//!
//! Persisted form is JSON with fields in declaration order, wrapped in a
//! versioned envelope:
//!
//! ```json
//! {"version":1,"snapshot":{"input_gain":1.0, ...}}
//! ```

use serde::{Deserialize, Serialize};
use sq_core::{
    ClipPlacement, EffectDescriptor, OutputRoute, SendDescriptor, SqError, SqResult, StereoMode,
    ensure_finite, ensure_range,
};

use crate::{AutomationPoint, SessionState};

/// Current persisted snapshot schema version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Immutable capture of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub input_gain: f64,
    pub stereo_mode: StereoMode,
    pub inserts: Vec<EffectDescriptor>,
    pub sends: Vec<SendDescriptor>,
    /// Fader level (dB)
    pub fader_db: f64,
    pub pan: f64,
    pub output: OutputRoute,
    pub automation: Vec<AutomationPoint>,
    pub clips: Vec<ClipPlacement>,
}

#[derive(Serialize)]
struct PersistedRef<'a> {
    version: u32,
    snapshot: &'a Snapshot,
}

#[derive(Deserialize)]
struct Persisted {
    version: u32,
    snapshot: Snapshot,
}

impl Snapshot {
    /// Capture the current session. Sends the user never leveled capture as 0.
    pub fn capture(session: &SessionState) -> Self {
        Self {
            input_gain: session.input_gain(),
            stereo_mode: session.stereo_mode(),
            inserts: session.inserts().to_vec(),
            sends: session
                .sends()
                .iter()
                .map(|s| SendDescriptor::new(s.kind, s.level.unwrap_or(0.0)))
                .collect(),
            fader_db: session.fader_db(),
            pan: session.pan(),
            output: session.output().clone(),
            automation: session.automation().points().to_vec(),
            clips: session.clips().to_vec(),
        }
    }

    /// Deterministic persisted form
    pub fn to_persistable(&self) -> SqResult<String> {
        serde_json::to_string(&PersistedRef {
            version: SNAPSHOT_VERSION,
            snapshot: self,
        })
        .map_err(|e| SqError::Serialization(e.to_string()))
    }

    /// Parse and validate a persisted snapshot.
    ///
    /// Missing or mistyped keys, an unknown version, or out-of-range values
    /// all yield [`SqError::MalformedSnapshot`].
    pub fn from_persistable(data: &str) -> SqResult<Self> {
        let persisted: Persisted =
            serde_json::from_str(data).map_err(|e| SqError::MalformedSnapshot(e.to_string()))?;

        if persisted.version != SNAPSHOT_VERSION {
            return Err(SqError::MalformedSnapshot(format!(
                "Unsupported snapshot version {} (expected {})",
                persisted.version, SNAPSHOT_VERSION
            )));
        }

        persisted
            .snapshot
            .validate()
            .map_err(|e| SqError::MalformedSnapshot(e.to_string()))?;
        Ok(persisted.snapshot)
    }

    /// Check every field against the ranges the session accepts
    pub fn validate(&self) -> SqResult<()> {
        ensure_finite("input gain", self.input_gain)?;
        if self.input_gain < 0.0 {
            return Err(SqError::validation("input gain must be non-negative"));
        }
        ensure_finite("fader", self.fader_db)?;
        ensure_range("pan", self.pan, -1.0, 1.0)?;

        for effect in &self.inserts {
            effect.validate()?;
        }
        for send in &self.sends {
            send.validate()?;
        }
        for point in &self.automation {
            ensure_finite("automation position", point.position)?;
            if point.position < 0.0 {
                return Err(SqError::validation("automation position must be non-negative"));
            }
            ensure_range("automation value", point.value, 0.0, 1.0)?;
        }
        for clip in &self.clips {
            ensure_finite("clip offset", clip.offset_seconds)?;
            ensure_finite("clip position", clip.position_pixels)?;
            ensure_finite("clip width", clip.width_pixels)?;
            ensure_finite("clip duration", clip.duration_seconds)?;
        }
        Ok(())
    }
}
