//! Event dispatcher
//!
//! [`Sequencer`] owns the session, its history and preset slot, and the host
//! audio graph. Every UI event goes through [`Sequencer::handle`]; committed
//! edits push a snapshot, undo/redo and preset loads restore one.

use sq_core::{
    AudioGraph, ClipPlacement, EffectDescriptor, FaderScale, ParamId, SqError, SqResult,
    db_to_gain,
};
use sq_state::{
    AutomationPoint, HistoryManager, KeyValueStore, PresetStore, RestoreTarget,
    SequencerPreferences, SessionState, Snapshot,
};

use crate::restore::{SessionRestore, apply_automation, sync_graph};
use crate::{
    AudioPool, ClipSource, DecodedAudio, Event, MeterBank, MeterPoll, Notice, SideEffect,
    Transport,
};

/// Sequencer session context
pub struct Sequencer<G: AudioGraph, S: KeyValueStore> {
    prefs: SequencerPreferences,
    fader: FaderScale,
    session: SessionState,
    history: HistoryManager,
    presets: PresetStore<S>,
    graph: G,
    audio: AudioPool,
    transport: Transport,
    meters: MeterBank,
    input_muted: bool,
}

impl<G: AudioGraph, S: KeyValueStore> Sequencer<G, S> {
    /// Build a session from preferences, push it to the graph and record it
    /// as the initial history entry.
    pub fn new(mut graph: G, store: S, prefs: SequencerPreferences) -> SqResult<Self> {
        let session = SessionState::new(prefs.automation.curve())
            .with_fader_db(prefs.mixer.fader_default_db);
        sync_graph(&session, &mut graph, &prefs.automation)?;

        let mut history = prefs.editor.history();
        history.push(Snapshot::capture(&session));

        log::info!(
            "Sequencer ready: {} tracks, undo limit {:?}, preset slot '{}'",
            prefs.timeline.track_count,
            history.max_depth(),
            prefs.preset.key
        );

        Ok(Self {
            fader: prefs.mixer.fader_scale(),
            presets: PresetStore::with_key(store, prefs.preset.key.clone()),
            meters: MeterBank::new(prefs.meter),
            prefs,
            session,
            history,
            graph,
            audio: AudioPool::new(),
            transport: Transport::new(),
            input_muted: false,
        })
    }

    /// Process one event.
    ///
    /// Rejected input returns an error and leaves the session unchanged.
    /// Benign outcomes (nothing to undo, no preset) come back as notices.
    pub fn handle(&mut self, event: Event) -> SqResult<Vec<SideEffect>> {
        log::trace!("Event: {:?}", event);
        let result = self.dispatch(event);
        match &result {
            Err(e) if e.is_benign() => log::debug!("Event had no effect: {}", e),
            Err(e) => log::warn!("Event rejected: {}", e),
            Ok(_) => {}
        }
        result
    }

    fn dispatch(&mut self, event: Event) -> SqResult<Vec<SideEffect>> {
        match event {
            Event::SetInputGain(gain) => {
                self.session.set_input_gain(gain)?;
                let now = self.graph.current_time();
                self.graph.set_value_immediate(ParamId::InputGain, gain, now)?;
                self.commit();
                Ok(vec![SideEffect::RenderChannelStrip])
            }
            Event::SetStereoMode(mode) => {
                self.session.set_stereo_mode(mode);
                self.commit();
                Ok(vec![SideEffect::RenderChannelStrip])
            }
            Event::SetPan(pan) => {
                self.session.set_pan(pan)?;
                let now = self.graph.current_time();
                self.graph.set_value_immediate(ParamId::Pan, pan, now)?;
                self.commit();
                Ok(vec![SideEffect::RenderChannelStrip])
            }
            Event::SetOutput(output) => {
                self.session.set_output(output)?;
                self.commit();
                Ok(vec![SideEffect::RenderChannelStrip])
            }
            Event::FaderDrag { y } => self.drag_fader(y),
            Event::FaderRelease => {
                self.commit();
                Ok(Vec::new())
            }

            Event::AddInsert(name) => {
                let effect = EffectDescriptor::from_name(&name)?;
                self.session.add_insert(effect)?;
                self.commit();
                Ok(vec![self.insert_chain()])
            }
            Event::RemoveInsert(index) => {
                self.session.remove_insert(index)?;
                self.commit();
                Ok(vec![self.insert_chain()])
            }
            Event::MoveInsert { from, to } => {
                if !self.session.move_insert(from, to)? {
                    return Ok(Vec::new());
                }
                self.commit();
                Ok(vec![self.insert_chain()])
            }
            Event::AddSend(kind) => {
                self.session.add_send(kind);
                self.commit();
                Ok(vec![SideEffect::RenderChannelStrip])
            }
            Event::SetSendLevel { index, level } => {
                self.session.set_send_level(index, level)?;
                let now = self.graph.current_time();
                self.graph
                    .set_value_immediate(ParamId::SendLevel(index), level, now)?;
                self.commit();
                Ok(vec![SideEffect::RenderChannelStrip])
            }

            Event::AutomationClick { x, y } => {
                let value = self.session.automation().value_at_y(y);
                let point = AutomationPoint::try_new(x, value)?;
                self.session.automation_mut().insert(point);
                self.automation_changed()
            }
            Event::AutomationDoubleClick { x, y } => {
                let threshold = self.prefs.automation.remove_threshold_sq;
                match self
                    .session
                    .automation_mut()
                    .remove_nearest_at(x, y, threshold)
                {
                    Some(_) => self.automation_changed(),
                    None => Ok(Vec::new()),
                }
            }

            Event::FileDecoded { source, outcome } => match outcome {
                Ok(audio) => self.add_clip(source, audio),
                Err(e) => {
                    log::warn!("Audio decode failed: {}", e);
                    Ok(vec![SideEffect::Notify(Notice::DecodeFailed(e.to_string()))])
                }
            },
            Event::ClipMoved { clip, x, y } => {
                let current = self.session.clip(clip).copied().ok_or_else(|| {
                    SqError::Validation(format!(
                        "Clip {} out of range (0..{})",
                        clip,
                        self.session.clips().len()
                    ))
                })?;
                let moved = current.moved_to(&self.prefs.timeline, x, y)?;
                self.session.set_clip(clip, moved)?;
                self.commit();
                Ok(vec![self.timeline()])
            }
            Event::TogglePlayback => Ok(self.toggle_playback()),

            Event::Undo => self.step_history(true),
            Event::Redo => self.step_history(false),
            Event::SavePreset => self.save_preset(),
            Event::LoadPreset => self.load_preset(),

            Event::DeviceAcquired(outcome) => self.device_acquired(outcome),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // HANDLERS
    // ═══════════════════════════════════════════════════════════════════════

    fn drag_fader(&mut self, y: f64) -> SqResult<Vec<SideEffect>> {
        let db = self.fader.db_at(y);
        self.session.set_fader_db(db)?;
        let now = self.graph.current_time();
        self.graph
            .set_value_immediate(ParamId::MasterGain, db_to_gain(db), now)?;
        Ok(vec![self.fader_position()])
    }

    fn automation_changed(&mut self) -> SqResult<Vec<SideEffect>> {
        apply_automation(&self.session, &mut self.graph, &self.prefs.automation)?;
        self.commit();
        Ok(vec![SideEffect::RenderAutomation(
            self.session.automation().points().to_vec(),
        )])
    }

    fn add_clip(&mut self, source: ClipSource, audio: DecodedAudio) -> SqResult<Vec<SideEffect>> {
        let layout = self.prefs.timeline;
        let (track, x) = match source {
            ClipSource::Picker => (0, layout.left_offset),
            ClipSource::Drop { x, y } => match layout.track_at(y) {
                Some(track) => (track, x),
                None => {
                    log::debug!("Dropped file outside the track area (y={})", y);
                    return Ok(Vec::new());
                }
            },
        };

        let placement = ClipPlacement::place(&layout, track, x, audio.duration_secs)?;
        let index = self.session.add_clip(placement);
        self.audio.bind(index, audio);
        log::info!(
            "Clip {} added on track {} at {:.2}s ({:.2}s long)",
            index,
            track,
            placement.offset_seconds,
            placement.duration_seconds
        );
        self.commit();
        Ok(vec![self.timeline()])
    }

    fn toggle_playback(&mut self) -> Vec<SideEffect> {
        if self.transport.is_playing() {
            self.transport.stop();
            return vec![SideEffect::StopClips];
        }

        let now = self.graph.current_time();
        self.transport.start(now);
        self.session
            .clips()
            .iter()
            .enumerate()
            .filter_map(|(index, clip)| {
                let audio = self.audio.handle(index)?;
                Some(SideEffect::StartClip {
                    clip: index,
                    audio,
                    track_index: clip.track_index,
                    at_time: now + clip.offset_seconds.max(0.0),
                })
            })
            .collect()
    }

    fn step_history(&mut self, undo: bool) -> SqResult<Vec<SideEffect>> {
        let mut target = SessionRestore {
            session: &mut self.session,
            graph: &mut self.graph,
            automation: &self.prefs.automation,
        };
        let result = if undo {
            self.history.undo_into(&mut target)
        } else {
            self.history.redo_into(&mut target)
        };

        let notice = match result {
            Ok(()) if undo => Notice::UndoPerformed,
            Ok(()) => Notice::RedoPerformed,
            Err(SqError::NothingToUndo) => {
                return Ok(vec![SideEffect::Notify(Notice::NothingToUndo)]);
            }
            Err(SqError::NothingToRedo) => {
                return Ok(vec![SideEffect::Notify(Notice::NothingToRedo)]);
            }
            Err(e) => return Err(e),
        };

        let mut effects = self.restored_view();
        effects.push(SideEffect::Notify(notice));
        Ok(effects)
    }

    fn save_preset(&mut self) -> SqResult<Vec<SideEffect>> {
        let snapshot = match self.history.current() {
            Some(snapshot) => snapshot.clone(),
            None => Snapshot::capture(&self.session),
        };
        match self.presets.save(&snapshot) {
            Ok(()) => Ok(vec![SideEffect::Notify(Notice::PresetSaved)]),
            Err(SqError::PersistenceFailure(reason)) => {
                log::error!("Preset save failed: {}", reason);
                Ok(vec![SideEffect::Notify(Notice::PersistenceFailed(reason))])
            }
            Err(e) => Err(e),
        }
    }

    fn load_preset(&mut self) -> SqResult<Vec<SideEffect>> {
        let snapshot = match self.presets.load() {
            Ok(snapshot) => snapshot,
            Err(SqError::NoPresetFound) => {
                return Ok(vec![SideEffect::Notify(Notice::NoPresetFound)]);
            }
            Err(SqError::PersistenceFailure(reason)) => {
                log::error!("Preset load failed: {}", reason);
                return Ok(vec![SideEffect::Notify(Notice::PersistenceFailed(reason))]);
            }
            Err(e) => return Err(e),
        };
        // Presets may come from a layout with more tracks
        for clip in &snapshot.clips {
            clip.validate(&self.prefs.timeline)
                .map_err(|e| SqError::MalformedSnapshot(e.to_string()))?;
        }

        SessionRestore {
            session: &mut self.session,
            graph: &mut self.graph,
            automation: &self.prefs.automation,
        }
        .restore(&snapshot)?;
        // Preset clips carry no audio
        self.audio.clear();
        self.commit();

        let mut effects = self.restored_view();
        effects.push(SideEffect::Notify(Notice::PresetLoaded));
        Ok(effects)
    }

    fn device_acquired(&mut self, outcome: SqResult<()>) -> SqResult<Vec<SideEffect>> {
        let effects = match outcome {
            Ok(()) => {
                self.input_muted = false;
                Vec::new()
            }
            Err(e) => {
                log::warn!("Input device unavailable ({}). Using silent input.", e);
                let now = self.graph.current_time();
                self.graph.set_value_immediate(ParamId::InputMute, 0.0, now)?;
                self.input_muted = true;
                vec![SideEffect::Notify(Notice::InputMuted(e.to_string()))]
            }
        };
        self.meters.start();
        Ok(effects)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // HELPERS
    // ═══════════════════════════════════════════════════════════════════════

    fn commit(&mut self) {
        self.history.push(Snapshot::capture(&self.session));
    }

    fn insert_chain(&self) -> SideEffect {
        SideEffect::RebuildInsertChain(self.session.inserts().to_vec())
    }

    fn timeline(&self) -> SideEffect {
        SideEffect::RenderTimeline(self.session.clips().to_vec())
    }

    fn fader_position(&self) -> SideEffect {
        let db = self.session.fader_db();
        SideEffect::RenderFader {
            db,
            knob_y: self.fader.knob_y(db),
        }
    }

    /// Everything the UI redraws after a restore
    fn restored_view(&self) -> Vec<SideEffect> {
        vec![
            self.insert_chain(),
            SideEffect::RenderChannelStrip,
            self.fader_position(),
            SideEffect::RenderAutomation(self.session.automation().points().to_vec()),
            self.timeline(),
        ]
    }

    // ═══════════════════════════════════════════════════════════════════════
    // POLLING
    // ═══════════════════════════════════════════════════════════════════════

    /// Playhead x-coordinate at the graph's current time, `None` once stopped
    pub fn poll_playhead(&self) -> Option<f64> {
        self.transport
            .playhead_x(&self.prefs.timeline, self.graph.current_time())
    }

    /// Feed analyser frames to the level meters
    pub fn poll_meters(&mut self, timestamp_ms: f64, input: &[u8], output: &[u8]) -> MeterPoll {
        self.meters.poll(timestamp_ms, input, output)
    }

    pub fn stop_meters(&self) {
        self.meters.stop();
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn presets(&self) -> &PresetStore<S> {
        &self.presets
    }

    pub fn presets_mut(&mut self) -> &mut PresetStore<S> {
        &mut self.presets
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn audio(&self) -> &AudioPool {
        &self.audio
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn preferences(&self) -> &SequencerPreferences {
        &self.prefs
    }

    pub fn is_input_muted(&self) -> bool {
        self.input_muted
    }
}
