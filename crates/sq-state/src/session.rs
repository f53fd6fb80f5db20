//! Live session state
//!
//! One `SessionState` holds everything the user can edit: the channel strip
//! (input gain, mode, inserts, sends, fader, pan, output), the volume
//! automation curve, and clip placements. Every mutation validates its input
//! and leaves the state untouched on error.

use sq_core::{
    ClipPlacement, EffectDescriptor, OutputRoute, SendKind, SqError, SqResult, StereoMode,
    ensure_finite, ensure_range,
};

use crate::{ParameterCurve, Snapshot};

/// Send slot as edited live; `level` stays `None` until the user touches it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SendSlot {
    pub kind: SendKind,
    pub level: Option<f64>,
}

impl SendSlot {
    pub fn new(kind: SendKind) -> Self {
        Self { kind, level: None }
    }
}

/// Mutable session state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    input_gain: f64,
    stereo_mode: StereoMode,
    inserts: Vec<EffectDescriptor>,
    sends: Vec<SendSlot>,
    fader_db: f64,
    pan: f64,
    output: OutputRoute,
    automation: ParameterCurve,
    clips: Vec<ClipPlacement>,
}

impl SessionState {
    pub const DEFAULT_FADER_DB: f64 = -10.0;

    pub fn new(automation: ParameterCurve) -> Self {
        Self {
            input_gain: 1.0,
            stereo_mode: StereoMode::default(),
            inserts: Vec::new(),
            sends: Vec::new(),
            fader_db: Self::DEFAULT_FADER_DB,
            pan: 0.0,
            output: OutputRoute::default(),
            automation,
            clips: Vec::new(),
        }
    }

    pub fn with_fader_db(mut self, fader_db: f64) -> Self {
        self.fader_db = fader_db;
        self
    }

    // ---- Channel strip ----

    pub fn input_gain(&self) -> f64 {
        self.input_gain
    }

    pub fn set_input_gain(&mut self, gain: f64) -> SqResult<()> {
        ensure_finite("input gain", gain)?;
        if gain < 0.0 {
            return Err(SqError::Validation(format!(
                "input gain must be non-negative, got {gain}"
            )));
        }
        self.input_gain = gain;
        Ok(())
    }

    pub fn stereo_mode(&self) -> StereoMode {
        self.stereo_mode
    }

    pub fn set_stereo_mode(&mut self, mode: StereoMode) {
        self.stereo_mode = mode;
    }

    pub fn pan(&self) -> f64 {
        self.pan
    }

    pub fn set_pan(&mut self, pan: f64) -> SqResult<()> {
        self.pan = ensure_range("pan", pan, -1.0, 1.0)?;
        Ok(())
    }

    /// Fader level (dB); not clamped at this layer
    pub fn fader_db(&self) -> f64 {
        self.fader_db
    }

    pub fn set_fader_db(&mut self, db: f64) -> SqResult<()> {
        self.fader_db = ensure_finite("fader", db)?;
        Ok(())
    }

    pub fn output(&self) -> &OutputRoute {
        &self.output
    }

    pub fn set_output(&mut self, output: OutputRoute) -> SqResult<()> {
        if output.as_str().trim().is_empty() {
            return Err(SqError::validation("output route must not be empty"));
        }
        self.output = output;
        Ok(())
    }

    // ---- Insert chain ----

    pub fn inserts(&self) -> &[EffectDescriptor] {
        &self.inserts
    }

    /// Append an insert; returns its slot index
    pub fn add_insert(&mut self, effect: EffectDescriptor) -> SqResult<usize> {
        effect.validate()?;
        self.inserts.push(effect);
        Ok(self.inserts.len() - 1)
    }

    pub fn remove_insert(&mut self, index: usize) -> SqResult<EffectDescriptor> {
        self.check_insert_index(index)?;
        Ok(self.inserts.remove(index))
    }

    /// Move the insert at `from` to `to`. Returns `false` when nothing moved.
    pub fn move_insert(&mut self, from: usize, to: usize) -> SqResult<bool> {
        self.check_insert_index(from)?;
        self.check_insert_index(to)?;
        if from == to {
            return Ok(false);
        }
        let effect = self.inserts.remove(from);
        self.inserts.insert(to, effect);
        Ok(true)
    }

    fn check_insert_index(&self, index: usize) -> SqResult<()> {
        if index >= self.inserts.len() {
            return Err(SqError::Validation(format!(
                "Insert slot {} out of range (0..{})",
                index,
                self.inserts.len()
            )));
        }
        Ok(())
    }

    // ---- Sends ----

    pub fn sends(&self) -> &[SendSlot] {
        &self.sends
    }

    pub fn add_send(&mut self, kind: SendKind) -> usize {
        self.sends.push(SendSlot::new(kind));
        self.sends.len() - 1
    }

    pub fn set_send_level(&mut self, index: usize, level: f64) -> SqResult<()> {
        ensure_range("send level", level, 0.0, 1.0)?;
        let count = self.sends.len();
        let slot = self.sends.get_mut(index).ok_or_else(|| {
            SqError::Validation(format!("Send slot {} out of range (0..{})", index, count))
        })?;
        slot.level = Some(level);
        Ok(())
    }

    // ---- Automation ----

    pub fn automation(&self) -> &ParameterCurve {
        &self.automation
    }

    pub fn automation_mut(&mut self) -> &mut ParameterCurve {
        &mut self.automation
    }

    // ---- Clips ----

    pub fn clips(&self) -> &[ClipPlacement] {
        &self.clips
    }

    pub fn add_clip(&mut self, placement: ClipPlacement) -> usize {
        self.clips.push(placement);
        self.clips.len() - 1
    }

    pub fn clip(&self, index: usize) -> Option<&ClipPlacement> {
        self.clips.get(index)
    }

    pub fn set_clip(&mut self, index: usize, placement: ClipPlacement) -> SqResult<()> {
        let count = self.clips.len();
        let clip = self.clips.get_mut(index).ok_or_else(|| {
            SqError::Validation(format!("Clip {} out of range (0..{})", index, count))
        })?;
        *clip = placement;
        Ok(())
    }

    // ---- Snapshots ----

    /// Overwrite every snapshot-covered field with the snapshot's values.
    ///
    /// Applying the same snapshot twice leaves the state unchanged the second time.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        self.input_gain = snapshot.input_gain;
        self.stereo_mode = snapshot.stereo_mode;
        self.inserts = snapshot.inserts.clone();
        self.sends = snapshot
            .sends
            .iter()
            .map(|s| SendSlot {
                kind: s.kind,
                level: Some(s.level),
            })
            .collect();
        self.fader_db = snapshot.fader_db;
        self.pan = snapshot.pan;
        self.output = snapshot.output.clone();
        self.automation.set_points(&snapshot.automation);
        self.clips = snapshot.clips.clone();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(ParameterCurve::default())
    }
}
