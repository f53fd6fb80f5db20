//! Sequencer Preferences
//!
//! Persistent user preferences for the sequencer:
//! - Automation lane geometry and schedule defaults
//! - Mixer fader range
//! - Timeline layout
//! - Meter refresh
//! - Undo depth and preset slot

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use sq_core::{DbRange, FaderScale, MeterSettings, SqError, SqResult, TimelineLayout};

use crate::{
    CurveExtent, DEFAULT_PRESET_KEY, DEFAULT_REMOVE_THRESHOLD_SQ, HistoryManager, ParameterCurve,
};

/// Sequencer preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerPreferences {
    /// Volume automation
    pub automation: AutomationPreferences,
    /// Channel strip fader
    pub mixer: MixerPreferences,
    /// Timeline geometry
    pub timeline: TimelineLayout,
    /// Level meters
    pub meter: MeterSettings,
    /// Editor preferences
    pub editor: EditorPreferences,
    /// Preset slot
    pub preset: PresetPreferences,
}

/// Automation preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationPreferences {
    /// Playback time covered by the full lane width (seconds)
    pub duration_secs: f64,
    /// Gain every schedule starts from (dB)
    pub baseline_db: f64,
    /// Lane value 0 maps to `min_db`, value 1 to `max_db`
    pub min_db: f64,
    pub max_db: f64,
    /// Lane size (pixels)
    pub lane_width: f64,
    pub lane_height: f64,
    /// Squared pixel distance for double-click removal
    pub remove_threshold_sq: f64,
}

impl Default for AutomationPreferences {
    fn default() -> Self {
        Self {
            duration_secs: 10.0,
            baseline_db: ParameterCurve::DEFAULT_BASELINE_DB,
            min_db: -60.0,
            max_db: 0.0,
            lane_width: 800.0,
            lane_height: 100.0,
            remove_threshold_sq: DEFAULT_REMOVE_THRESHOLD_SQ,
        }
    }
}

impl AutomationPreferences {
    pub fn range(&self) -> DbRange {
        DbRange::new(self.min_db, self.max_db)
    }

    /// Empty curve with the configured extent and baseline.
    ///
    /// An invalid lane size falls back to the default extent.
    pub fn curve(&self) -> ParameterCurve {
        let extent = CurveExtent::new(self.lane_width, self.lane_height).unwrap_or_else(|e| {
            log::warn!("Invalid automation lane size ({}), using default", e);
            CurveExtent::default()
        });
        ParameterCurve::new(extent).with_baseline_db(self.baseline_db)
    }
}

/// Mixer preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerPreferences {
    pub fader_min_db: f64,
    pub fader_max_db: f64,
    /// Fader level of a fresh session (dB)
    pub fader_default_db: f64,
    /// Fader track height (pixels)
    pub fader_height: f64,
}

impl Default for MixerPreferences {
    fn default() -> Self {
        Self {
            fader_min_db: -60.0,
            fader_max_db: 0.0,
            fader_default_db: -10.0,
            fader_height: 150.0,
        }
    }
}

impl MixerPreferences {
    pub fn fader_scale(&self) -> FaderScale {
        FaderScale::new(
            DbRange::new(self.fader_min_db, self.fader_max_db),
            self.fader_height,
        )
    }
}

/// Editor preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorPreferences {
    /// Undo history limit; unbounded when unset
    pub max_undo_history: Option<usize>,
}

impl EditorPreferences {
    pub fn history(&self) -> HistoryManager {
        match self.max_undo_history {
            Some(depth) => HistoryManager::with_max_depth(depth),
            None => HistoryManager::new(),
        }
    }
}

/// Preset preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetPreferences {
    /// Storage key of the preset slot
    pub key: String,
    /// Directory of the file-backed store (`None` = platform data dir)
    pub directory: Option<PathBuf>,
}

impl Default for PresetPreferences {
    fn default() -> Self {
        Self {
            key: DEFAULT_PRESET_KEY.to_string(),
            directory: None,
        }
    }
}

impl SequencerPreferences {
    /// Load preferences from standard location
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    /// Load preferences from specified path; falls back to defaults
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid preferences at {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save preferences to standard location
    pub fn save(&self) -> SqResult<()> {
        self.save_to(Self::default_path())
    }

    /// Save preferences to specified path
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> SqResult<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SqError::Serialization(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Get default preferences file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("sequencer"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("preferences.json")
    }

    /// Directory of the file-backed preset store
    pub fn preset_dir(&self) -> PathBuf {
        self.preset
            .directory
            .clone()
            .unwrap_or_else(crate::FileStore::default_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences() {
        let prefs = SequencerPreferences::default();
        assert_eq!(prefs.automation.duration_secs, 10.0);
        assert_eq!(prefs.automation.range(), DbRange::new(-60.0, 0.0));
        assert_eq!(prefs.mixer.fader_scale(), FaderScale::default());
        assert_eq!(prefs.timeline.track_count, 16);
        assert_eq!(prefs.editor.max_undo_history, None);
        assert_eq!(prefs.editor.history().max_depth(), None);
        assert_eq!(prefs.preset.key, "channelStripPreset");
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let prefs: SequencerPreferences =
            serde_json::from_str(r#"{"automation":{"duration_secs":4.0},"timeline":{"track_count":8}}"#)
                .unwrap();
        assert_eq!(prefs.automation.duration_secs, 4.0);
        assert_eq!(prefs.automation.lane_width, 800.0);
        assert_eq!(prefs.timeline.track_count, 8);
        assert_eq!(prefs.timeline.pixels_per_second, 100.0);
        assert_eq!(prefs.meter.update_interval_ms, 50.0);
    }

    #[test]
    fn test_curve_from_preferences() {
        let mut prefs = SequencerPreferences::default();
        prefs.automation.baseline_db = -6.0;
        let curve = prefs.automation.curve();
        assert_eq!(curve.baseline_db(), -6.0);
        assert_eq!(curve.extent(), CurveExtent::default());

        prefs.automation.lane_width = 0.0;
        assert_eq!(prefs.automation.curve().extent(), CurveExtent::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut prefs = SequencerPreferences::default();
        prefs.editor.max_undo_history = Some(42);
        prefs.preset.directory = Some(dir.path().join("presets"));
        prefs.save_to(&path).unwrap();

        let loaded = SequencerPreferences::load_from(&path);
        assert_eq!(loaded, prefs);
        assert_eq!(loaded.preset_dir(), dir.path().join("presets"));
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert_eq!(SequencerPreferences::load_from(&path), SequencerPreferences::default());
        assert_eq!(
            SequencerPreferences::load_from(dir.path().join("missing.json")),
            SequencerPreferences::default()
        );
    }

    #[test]
    fn test_save_into_file_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();

        let result = SequencerPreferences::default().save_to(blocker.join("preferences.json"));
        assert!(matches!(result, Err(SqError::Io(_))));
    }
}
