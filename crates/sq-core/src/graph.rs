//! Audio graph facade
//!
//! The host owns the actual audio graph. The sequencer only needs to set
//! parameter values, schedule linear ramps, cancel scheduled values, and read
//! the host clock. Calls are fire-and-forget; invalid values are rejected by
//! [`validate_call`] before they reach the host.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{SqError, SqResult, ensure_finite, ensure_range};

/// Parameters of the host graph the sequencer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    /// Input gain node (linear)
    InputGain,
    /// Gain of the input source itself; 0 mutes it
    InputMute,
    /// Stereo panner (-1.0 - 1.0)
    Pan,
    /// Master output gain (linear); fader and volume automation target
    MasterGain,
    /// Level of the send at the given index (0.0 - 1.0)
    SendLevel(usize),
}

impl ParamId {
    /// Inclusive value range accepted for this parameter
    pub fn value_range(self) -> (f64, f64) {
        match self {
            Self::Pan => (-1.0, 1.0),
            Self::SendLevel(_) | Self::InputMute => (0.0, 1.0),
            Self::InputGain | Self::MasterGain => (0.0, f64::MAX),
        }
    }
}

/// Check a value/time pair against the parameter contract.
pub fn validate_call(param: ParamId, value: f64, at_time: f64) -> SqResult<()> {
    let (min, max) = param.value_range();
    ensure_range(&format!("{param:?} value"), value, min, max)?;
    validate_time(at_time)
}

pub fn validate_time(at_time: f64) -> SqResult<()> {
    ensure_finite("schedule time", at_time)?;
    if at_time < 0.0 {
        return Err(SqError::Validation(format!(
            "schedule time must be non-negative, got {at_time}"
        )));
    }
    Ok(())
}

/// Capability set the sequencer needs from the host audio graph
pub trait AudioGraph {
    /// Set a parameter to `value` at `at_time` (host clock, seconds)
    fn set_value_immediate(&mut self, param: ParamId, value: f64, at_time: f64) -> SqResult<()>;

    /// Linearly ramp a parameter from its previous scheduled value to `value`,
    /// arriving at `at_time`
    fn schedule_linear_ramp_to(&mut self, param: ParamId, value: f64, at_time: f64)
    -> SqResult<()>;

    /// Drop every scheduled value at or after `from_time`
    fn cancel_scheduled(&mut self, param: ParamId, from_time: f64) -> SqResult<()>;

    /// Host clock (seconds), monotonically increasing
    fn current_time(&self) -> f64;
}

/// A call received by [`RecordingGraph`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphCall {
    SetValue { param: ParamId, value: f64, at_time: f64 },
    LinearRamp { param: ParamId, value: f64, at_time: f64 },
    Cancel { param: ParamId, from_time: f64 },
}

/// In-memory graph that records every call.
///
/// Tracks the last immediate value and the pending ramps per parameter, so
/// stale schedules are observable.
#[derive(Debug, Default)]
pub struct RecordingGraph {
    now: f64,
    calls: Vec<GraphCall>,
    values: HashMap<ParamId, f64>,
    pending: HashMap<ParamId, Vec<(f64, f64)>>,
}

impl RecordingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the host clock
    pub fn advance(&mut self, secs: f64) {
        if secs > 0.0 {
            self.now += secs;
        }
    }

    pub fn calls(&self) -> &[GraphCall] {
        &self.calls
    }

    /// Last immediate value set on a parameter
    pub fn value(&self, param: ParamId) -> Option<f64> {
        self.values.get(&param).copied()
    }

    /// Pending ramp targets `(time, value)` on a parameter, in schedule order
    pub fn pending(&self, param: ParamId) -> &[(f64, f64)] {
        self.pending.get(&param).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl AudioGraph for RecordingGraph {
    fn set_value_immediate(&mut self, param: ParamId, value: f64, at_time: f64) -> SqResult<()> {
        validate_call(param, value, at_time)?;
        self.values.insert(param, value);
        self.calls.push(GraphCall::SetValue { param, value, at_time });
        Ok(())
    }

    fn schedule_linear_ramp_to(
        &mut self,
        param: ParamId,
        value: f64,
        at_time: f64,
    ) -> SqResult<()> {
        validate_call(param, value, at_time)?;
        self.pending.entry(param).or_default().push((at_time, value));
        self.calls.push(GraphCall::LinearRamp { param, value, at_time });
        Ok(())
    }

    fn cancel_scheduled(&mut self, param: ParamId, from_time: f64) -> SqResult<()> {
        validate_time(from_time)?;
        if let Some(ramps) = self.pending.get_mut(&param) {
            ramps.retain(|&(t, _)| t < from_time);
        }
        self.calls.push(GraphCall::Cancel { param, from_time });
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.now
    }
}
