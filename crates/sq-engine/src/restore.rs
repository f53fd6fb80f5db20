//! Pushing session values into the audio graph

use sq_core::{AudioGraph, ParamId, SqResult, db_to_gain, validate_call};
use sq_state::{AutomationPreferences, RestoreTarget, Schedule, SessionState, Snapshot};

fn automation_schedule(
    session: &SessionState,
    prefs: &AutomationPreferences,
) -> SqResult<Schedule> {
    session
        .automation()
        .compile_schedule(prefs.duration_secs, prefs.range())
}

/// Check every value [`sync_graph`] would send for `session` at `now`,
/// without touching the graph.
pub fn check_graph_values(
    session: &SessionState,
    prefs: &AutomationPreferences,
    now: f64,
) -> SqResult<()> {
    validate_call(ParamId::InputGain, session.input_gain(), now)?;
    validate_call(ParamId::Pan, session.pan(), now)?;
    for (index, send) in session.sends().iter().enumerate() {
        validate_call(ParamId::SendLevel(index), send.level.unwrap_or(0.0), now)?;
    }
    validate_call(ParamId::MasterGain, db_to_gain(session.fader_db()), now)?;
    automation_schedule(session, prefs)?.validate(ParamId::MasterGain, now)
}

/// Re-send the volume automation of `session` to the master gain.
///
/// With fewer than two points nothing is scheduled, so pending ramps are
/// cancelled and the gain returns to the fader level.
pub fn apply_automation<G: AudioGraph + ?Sized>(
    session: &SessionState,
    graph: &mut G,
    prefs: &AutomationPreferences,
) -> SqResult<()> {
    let schedule = automation_schedule(session, prefs)?;

    if schedule.is_empty() {
        let now = graph.current_time();
        graph.cancel_scheduled(ParamId::MasterGain, 0.0)?;
        graph.set_value_immediate(ParamId::MasterGain, db_to_gain(session.fader_db()), now)?;
        return Ok(());
    }
    schedule.apply(graph, ParamId::MasterGain)
}

/// Set every graph parameter the session controls.
///
/// All values are checked first; a rejected value leaves the graph untouched.
pub fn sync_graph<G: AudioGraph + ?Sized>(
    session: &SessionState,
    graph: &mut G,
    prefs: &AutomationPreferences,
) -> SqResult<()> {
    let now = graph.current_time();
    check_graph_values(session, prefs, now)?;
    graph.set_value_immediate(ParamId::InputGain, session.input_gain(), now)?;
    graph.set_value_immediate(ParamId::Pan, session.pan(), now)?;
    for (index, send) in session.sends().iter().enumerate() {
        graph.set_value_immediate(ParamId::SendLevel(index), send.level.unwrap_or(0.0), now)?;
    }
    graph.set_value_immediate(ParamId::MasterGain, db_to_gain(session.fader_db()), now)?;
    apply_automation(session, graph, prefs)
}

/// Restores snapshots into the live session and the audio graph.
///
/// The snapshot is applied to a copy of the session and swapped in only once
/// the graph accepted it.
pub struct SessionRestore<'a, G: AudioGraph + ?Sized> {
    pub session: &'a mut SessionState,
    pub graph: &'a mut G,
    pub automation: &'a AutomationPreferences,
}

impl<G: AudioGraph + ?Sized> RestoreTarget for SessionRestore<'_, G> {
    fn restore(&mut self, snapshot: &Snapshot) -> SqResult<()> {
        snapshot.validate()?;
        let mut staged = self.session.clone();
        staged.apply_snapshot(snapshot);
        sync_graph(&staged, self.graph, self.automation)?;
        *self.session = staged;
        log::debug!(
            "Restored snapshot: {} inserts, {} automation points, {} clips",
            snapshot.inserts.len(),
            snapshot.automation.len(),
            snapshot.clips.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sq_core::{RecordingGraph, SendKind, SqError};
    use sq_state::AutomationPoint;

    fn restore(
        session: &mut SessionState,
        graph: &mut RecordingGraph,
        snapshot: &Snapshot,
    ) -> SqResult<()> {
        let prefs = AutomationPreferences::default();
        SessionRestore {
            session,
            graph,
            automation: &prefs,
        }
        .restore(snapshot)
    }

    fn automated_snapshot() -> Snapshot {
        let mut session = SessionState::default();
        session.set_pan(0.4).unwrap();
        session.set_fader_db(-20.0).unwrap();
        let send = session.add_send(SendKind::Reverb);
        session.set_send_level(send, 0.3).unwrap();
        session.automation_mut().insert(AutomationPoint::new(0.0, 0.0));
        session.automation_mut().insert(AutomationPoint::new(800.0, 1.0));
        Snapshot::capture(&session)
    }

    #[test]
    fn test_restore_is_idempotent() {
        let snapshot = automated_snapshot();
        let mut session = SessionState::default();
        let mut graph = RecordingGraph::new();

        restore(&mut session, &mut graph, &snapshot).unwrap();
        let session_once = session.clone();
        let pending_once = graph.pending(ParamId::MasterGain).to_vec();

        restore(&mut session, &mut graph, &snapshot).unwrap();
        assert_eq!(session, session_once);
        assert_eq!(graph.pending(ParamId::MasterGain), pending_once.as_slice());
        assert_eq!(graph.value(ParamId::Pan), Some(0.4));
        assert_eq!(graph.value(ParamId::SendLevel(0)), Some(0.3));
        assert_eq!(Snapshot::capture(&session), snapshot);
    }

    #[test]
    fn test_restore_without_automation_clears_ramps() {
        let mut session = SessionState::default();
        let mut graph = RecordingGraph::new();
        restore(&mut session, &mut graph, &automated_snapshot()).unwrap();
        assert_eq!(graph.pending(ParamId::MasterGain).len(), 2);

        let plain = Snapshot::capture(&SessionState::default());
        restore(&mut session, &mut graph, &plain).unwrap();
        assert!(graph.pending(ParamId::MasterGain).is_empty());
        assert_eq!(graph.value(ParamId::MasterGain), Some(db_to_gain(-10.0)));
    }

    #[test]
    fn test_invalid_snapshot_leaves_session_untouched() {
        let mut bad = automated_snapshot();
        bad.pan = -3.0;
        let mut session = SessionState::default();
        let mut graph = RecordingGraph::new();

        assert!(restore(&mut session, &mut graph, &bad).is_err());
        assert_eq!(session, SessionState::default());
        assert!(graph.calls().is_empty());
    }

    #[test]
    fn test_unreachable_graph_value_leaves_session_untouched() {
        let mut loud = automated_snapshot();
        loud.fader_db = 7000.0;
        assert!(loud.validate().is_ok());

        let mut session = SessionState::default();
        let mut graph = RecordingGraph::new();
        assert!(matches!(
            restore(&mut session, &mut graph, &loud),
            Err(SqError::Validation(_))
        ));
        assert_eq!(session, SessionState::default());
        assert!(graph.calls().is_empty());
    }

    #[test]
    fn test_sync_rejects_bad_duration_before_sending() {
        let mut staged = SessionState::default();
        staged.apply_snapshot(&automated_snapshot());
        let prefs = AutomationPreferences {
            duration_secs: -1.0,
            ..AutomationPreferences::default()
        };
        let mut graph = RecordingGraph::new();

        assert!(sync_graph(&staged, &mut graph, &prefs).is_err());
        assert!(graph.calls().is_empty());
    }
}
