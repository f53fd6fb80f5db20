//! Volume automation
//!
//! A [`ParameterCurve`] holds breakpoints in the lane's own coordinate space
//! (x = position along the lane, y = (1 - value) * lane height). Compiling a
//! curve yields a [`Schedule`] of ramp instructions relative to playback start.

use serde::{Deserialize, Serialize};
use sq_core::{
    AudioGraph, DbRange, ParamId, SqError, SqResult, db_to_gain, ensure_finite, validate_call,
};

/// Default squared-distance threshold for nearest-point removal
pub const DEFAULT_REMOVE_THRESHOLD_SQ: f64 = 1000.0;

/// Automation point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutomationPoint {
    /// Position along the lane (lane coordinate units)
    pub position: f64,
    /// Normalized value (0.0 - 1.0)
    pub value: f64,
}

impl AutomationPoint {
    /// Point with the value clamped to 0-1 and position clamped to >= 0
    pub fn new(position: f64, value: f64) -> Self {
        Self {
            position: position.max(0.0),
            value: value.clamp(0.0, 1.0),
        }
    }

    /// Like [`AutomationPoint::new`], rejecting NaN and infinities
    pub fn try_new(position: f64, value: f64) -> SqResult<Self> {
        ensure_finite("automation position", position)?;
        ensure_finite("automation value", value)?;
        Ok(Self::new(position, value))
    }

    /// Vertical coordinate of the point in a lane of `height`
    #[inline]
    fn y(&self, height: f64) -> f64 {
        (1.0 - self.value) * height
    }
}

/// Size of the automation lane in its coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveExtent {
    /// Position that maps to the end of the automation duration
    pub width: f64,
    /// Vertical extent used when measuring distances
    pub height: f64,
}

impl CurveExtent {
    pub fn new(width: f64, height: f64) -> SqResult<Self> {
        ensure_finite("lane width", width)?;
        ensure_finite("lane height", height)?;
        if width <= 0.0 || height <= 0.0 {
            return Err(SqError::Validation(format!(
                "Lane extent must be positive, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }
}

impl Default for CurveExtent {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 100.0,
        }
    }
}

/// Single compiled scheduling instruction; times are relative to playback start
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScheduleInstruction {
    /// Jump to `gain` at `time_offset`
    SetValue { time_offset: f64, gain: f64 },
    /// Linear ramp reaching `gain` at `time_offset`
    LinearRamp { time_offset: f64, gain: f64 },
}

impl ScheduleInstruction {
    pub fn time_offset(&self) -> f64 {
        match *self {
            Self::SetValue { time_offset, .. } | Self::LinearRamp { time_offset, .. } => {
                time_offset
            }
        }
    }

    pub fn gain(&self) -> f64 {
        match *self {
            Self::SetValue { gain, .. } | Self::LinearRamp { gain, .. } => gain,
        }
    }
}

/// Ordered list of instructions compiled from a curve
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    instructions: Vec<ScheduleInstruction>,
}

impl Schedule {
    pub fn instructions(&self) -> &[ScheduleInstruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Total time covered by the schedule
    pub fn end_time(&self) -> f64 {
        self.instructions
            .iter()
            .map(ScheduleInstruction::time_offset)
            .fold(0.0, f64::max)
    }

    /// Check every instruction against `param` as if applied at `now`
    pub fn validate(&self, param: ParamId, now: f64) -> SqResult<()> {
        for instruction in &self.instructions {
            validate_call(param, instruction.gain(), now + instruction.time_offset())?;
        }
        Ok(())
    }

    /// Send the schedule to `param`, starting at the graph's current time.
    ///
    /// Scheduled values on the parameter are cancelled first. Every
    /// instruction is validated before anything is sent. An empty schedule
    /// sends nothing.
    pub fn apply<G: AudioGraph + ?Sized>(&self, graph: &mut G, param: ParamId) -> SqResult<()> {
        if self.is_empty() {
            return Ok(());
        }

        let now = graph.current_time();
        self.validate(param, now)?;

        graph.cancel_scheduled(param, 0.0)?;
        for instruction in &self.instructions {
            match *instruction {
                ScheduleInstruction::SetValue { time_offset, gain } => {
                    graph.set_value_immediate(param, gain, now + time_offset)?
                }
                ScheduleInstruction::LinearRamp { time_offset, gain } => {
                    graph.schedule_linear_ramp_to(param, gain, now + time_offset)?
                }
            }
        }

        log::debug!(
            "Applied {} automation instructions to {:?} at t={:.3}",
            self.len(),
            param,
            now
        );
        Ok(())
    }
}

/// Point-based automation envelope
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterCurve {
    points: Vec<AutomationPoint>,
    extent: CurveExtent,
    /// Gain (dB) every compiled schedule starts from
    baseline_db: f64,
}

impl ParameterCurve {
    pub const DEFAULT_BASELINE_DB: f64 = -10.0;

    pub fn new(extent: CurveExtent) -> Self {
        Self {
            points: Vec::new(),
            extent,
            baseline_db: Self::DEFAULT_BASELINE_DB,
        }
    }

    pub fn with_baseline_db(mut self, baseline_db: f64) -> Self {
        self.baseline_db = baseline_db;
        self
    }

    pub fn extent(&self) -> CurveExtent {
        self.extent
    }

    pub fn baseline_db(&self) -> f64 {
        self.baseline_db
    }

    /// Insert a point, after any existing points at the same position
    pub fn insert(&mut self, point: AutomationPoint) {
        let idx = self
            .points
            .partition_point(|p| p.position <= point.position);
        self.points.insert(idx, point);
    }

    /// Remove the point nearest to (`x`, `y`) in lane coordinates if its
    /// squared distance is within `threshold_sq`.
    pub fn remove_nearest_at(
        &mut self,
        x: f64,
        y: f64,
        threshold_sq: f64,
    ) -> Option<AutomationPoint> {
        let height = self.extent.height;
        let (index, distance) = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let dx = p.position - x;
                let dy = p.y(height) - y;
                (i, dx * dx + dy * dy)
            })
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((i, d)),
            })?;

        if distance <= threshold_sq {
            Some(self.points.remove(index))
        } else {
            None
        }
    }

    /// Remove the point nearest to (`position`, `value`); see [`ParameterCurve::remove_nearest_at`]
    pub fn remove_nearest(
        &mut self,
        position: f64,
        value: f64,
        threshold_sq: f64,
    ) -> Option<AutomationPoint> {
        let y = (1.0 - value) * self.extent.height;
        self.remove_nearest_at(position, y, threshold_sq)
    }

    /// Normalized value for a lane y-coordinate
    pub fn value_at_y(&self, y: f64) -> f64 {
        1.0 - y / self.extent.height
    }

    /// Replace all points, keeping ascending order (ties in given order)
    pub fn set_points(&mut self, points: &[AutomationPoint]) {
        self.points = points.to_vec();
        self.points.sort_by(|a, b| a.position.total_cmp(&b.position));
    }

    pub fn points(&self) -> &[AutomationPoint] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &AutomationPoint> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Linearly interpolated value at a lane position.
    ///
    /// Holds the first/last value outside the point range.
    pub fn value_at(&self, position: f64) -> Option<f64> {
        let first = self.points.first()?;
        let idx = self.points.partition_point(|p| p.position <= position);

        if idx == 0 {
            return Some(first.value);
        }
        if idx >= self.points.len() {
            return self.points.last().map(|p| p.value);
        }

        let p1 = &self.points[idx - 1];
        let p2 = &self.points[idx];
        let t = (position - p1.position) / (p2.position - p1.position);
        Some(p1.value + (p2.value - p1.value) * t)
    }

    /// Compile the curve into gain ramps over `duration_secs`.
    ///
    /// Fewer than two points compile to an empty schedule. Otherwise the
    /// schedule starts with the baseline gain at t=0 followed by one ramp per
    /// point; a point at position `p` lands at `p / width * duration_secs`.
    /// The duration must be finite and positive.
    pub fn compile_schedule(&self, duration_secs: f64, range: DbRange) -> SqResult<Schedule> {
        ensure_finite("automation duration", duration_secs)?;
        if duration_secs <= 0.0 {
            return Err(SqError::Validation(format!(
                "automation duration must be positive, got {duration_secs}"
            )));
        }
        if self.points.len() < 2 {
            return Ok(Schedule::default());
        }

        let mut instructions = Vec::with_capacity(self.points.len() + 1);
        instructions.push(ScheduleInstruction::SetValue {
            time_offset: 0.0,
            gain: db_to_gain(self.baseline_db),
        });

        for point in &self.points {
            let ratio = point.position / self.extent.width;
            instructions.push(ScheduleInstruction::LinearRamp {
                time_offset: ratio * duration_secs,
                gain: range.gain_at(point.value),
            });
        }

        Ok(Schedule { instructions })
    }
}

impl Default for ParameterCurve {
    fn default() -> Self {
        Self::new(CurveExtent::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sq_core::{GraphCall, RecordingGraph};

    fn lane(width: f64) -> ParameterCurve {
        ParameterCurve::new(CurveExtent::new(width, 100.0).unwrap())
    }

    #[test]
    fn test_point_clamping() {
        let p = AutomationPoint::new(-5.0, 1.4);
        assert_eq!(p.position, 0.0);
        assert_eq!(p.value, 1.0);
        assert!(AutomationPoint::try_new(f64::NAN, 0.5).is_err());
        assert!(AutomationPoint::try_new(10.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_insert_keeps_ascending_order() {
        let mut curve = lane(800.0);
        for &(x, v) in &[(300.0, 0.1), (10.0, 0.2), (700.0, 0.3), (10.0, 0.9), (150.0, 0.4)] {
            curve.insert(AutomationPoint::new(x, v));
        }

        let positions: Vec<f64> = curve.iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![10.0, 10.0, 150.0, 300.0, 700.0]);
        // Ties keep insertion order
        assert_eq!(curve.points()[0].value, 0.2);
        assert_eq!(curve.points()[1].value, 0.9);
    }

    #[test]
    fn test_remove_nearest_threshold() {
        let mut curve = lane(800.0);
        curve.insert(AutomationPoint::new(100.0, 0.5));

        assert!(curve.remove_nearest(500.0, 0.5, DEFAULT_REMOVE_THRESHOLD_SQ).is_none());
        assert_eq!(curve.len(), 1);

        let removed = curve.remove_nearest(100.0, 0.5, DEFAULT_REMOVE_THRESHOLD_SQ);
        assert_eq!(removed, Some(AutomationPoint::new(100.0, 0.5)));
        assert!(curve.is_empty());

        // Empty curve is a no-op
        assert!(curve.remove_nearest(100.0, 0.5, DEFAULT_REMOVE_THRESHOLD_SQ).is_none());
    }

    #[test]
    fn test_remove_nearest_picks_closest() {
        let mut curve = lane(800.0);
        curve.insert(AutomationPoint::new(100.0, 0.5));
        curve.insert(AutomationPoint::new(120.0, 0.5));

        // y = (1 - 0.5) * 100 = 50; query 20 px right of the first point
        let removed = curve.remove_nearest_at(115.0, 50.0, DEFAULT_REMOVE_THRESHOLD_SQ);
        assert_eq!(removed.map(|p| p.position), Some(120.0));
        assert_eq!(curve.len(), 1);

        // Distance counts the vertical axis too: 10^2 + 30^2 = 1000
        let removed = curve.remove_nearest_at(110.0, 80.0, DEFAULT_REMOVE_THRESHOLD_SQ);
        assert!(removed.is_some());
    }

    #[test]
    fn test_value_at_interpolates() {
        let mut curve = lane(800.0);
        assert_eq!(curve.value_at(10.0), None);

        curve.insert(AutomationPoint::new(0.0, 0.0));
        curve.insert(AutomationPoint::new(100.0, 1.0));

        assert_eq!(curve.value_at(0.0), Some(0.0));
        assert_eq!(curve.value_at(100.0), Some(1.0));
        assert_relative_eq!(curve.value_at(25.0).unwrap(), 0.25);
        assert_eq!(curve.value_at(500.0), Some(1.0));
    }

    #[test]
    fn test_single_point_compiles_empty() {
        let mut curve = lane(100.0);
        curve.insert(AutomationPoint::new(50.0, 0.5));
        assert!(curve.compile_schedule(10.0, DbRange::new(-60.0, 0.0)).unwrap().is_empty());
    }

    #[test]
    fn test_two_point_schedule() {
        let mut curve = lane(100.0);
        curve.insert(AutomationPoint::new(0.0, 0.0));
        curve.insert(AutomationPoint::new(100.0, 1.0));

        let schedule = curve.compile_schedule(10.0, DbRange::new(-60.0, 0.0)).unwrap();
        let instructions = schedule.instructions();

        match instructions[0] {
            ScheduleInstruction::SetValue { time_offset, gain } => {
                assert_eq!(time_offset, 0.0);
                assert_relative_eq!(gain, db_to_gain(-10.0));
            }
            other => panic!("expected baseline set, got {other:?}"),
        }
        match instructions[instructions.len() - 1] {
            ScheduleInstruction::LinearRamp { time_offset, gain } => {
                assert_relative_eq!(time_offset, 10.0);
                assert_relative_eq!(gain, 1.0);
            }
            other => panic!("expected ramp, got {other:?}"),
        }
        assert_eq!(instructions.len(), 3);
        assert_relative_eq!(instructions[1].gain(), 0.001, epsilon = 1e-12);
        assert_relative_eq!(schedule.end_time(), 10.0);
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let mut curve = lane(100.0);
        curve.insert(AutomationPoint::new(0.0, 0.0));
        curve.insert(AutomationPoint::new(100.0, 1.0));
        let range = DbRange::default();

        for duration in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                curve.compile_schedule(duration, range),
                Err(SqError::Validation(_))
            ));
        }
        assert!(lane(100.0).compile_schedule(-1.0, range).is_err());
    }

    #[test]
    fn test_baseline_independent_of_points() {
        let mut a = lane(100.0);
        a.insert(AutomationPoint::new(10.0, 0.9));
        a.insert(AutomationPoint::new(20.0, 0.1));
        let mut b = lane(100.0);
        b.insert(AutomationPoint::new(50.0, 0.0));
        b.insert(AutomationPoint::new(60.0, 0.3));

        let range = DbRange::default();
        assert_eq!(
            a.compile_schedule(10.0, range).unwrap().instructions()[0],
            b.compile_schedule(10.0, range).unwrap().instructions()[0]
        );
    }

    #[test]
    fn test_apply_cancels_then_schedules() {
        let mut curve = lane(100.0);
        curve.insert(AutomationPoint::new(0.0, 0.0));
        curve.insert(AutomationPoint::new(50.0, 1.0));
        let schedule = curve.compile_schedule(10.0, DbRange::default()).unwrap();

        let mut graph = RecordingGraph::new();
        graph.advance(3.0);
        schedule.apply(&mut graph, ParamId::MasterGain).unwrap();
        schedule.apply(&mut graph, ParamId::MasterGain).unwrap();

        let calls = graph.calls();
        assert_eq!(
            calls[0],
            GraphCall::Cancel {
                param: ParamId::MasterGain,
                from_time: 0.0
            }
        );
        assert!(matches!(calls[1], GraphCall::SetValue { at_time, .. } if at_time == 3.0));
        // Re-applying does not stack ramps
        assert_eq!(graph.pending(ParamId::MasterGain).len(), 2);
        assert_eq!(graph.pending(ParamId::MasterGain)[1], (8.0, 1.0));
    }

    #[test]
    fn test_apply_empty_schedule_sends_nothing() {
        let mut graph = RecordingGraph::new();
        Schedule::default().apply(&mut graph, ParamId::MasterGain).unwrap();
        assert!(graph.calls().is_empty());
    }
}
