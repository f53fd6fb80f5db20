//! Level metering over 8-bit time-domain frames

use serde::{Deserialize, Serialize};

/// RMS level of an unsigned 8-bit time-domain frame (128 = silence)
pub fn rms_u8(frame: &[u8]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let sum: f64 = frame
        .iter()
        .map(|&b| {
            let v = (b as f64 - 128.0) / 128.0;
            v * v
        })
        .sum();
    (sum / frame.len() as f64).sqrt()
}

/// Meter display settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterSettings {
    /// Minimum time between meter updates (ms)
    pub update_interval_ms: f64,
    /// Display gain applied to the RMS level before clamping
    pub display_scale: f64,
}

impl Default for MeterSettings {
    fn default() -> Self {
        Self {
            update_interval_ms: 50.0,
            display_scale: 3.0,
        }
    }
}

/// Throttled level meter producing a 0-1 fill fraction
#[derive(Debug, Clone)]
pub struct LevelMeter {
    settings: MeterSettings,
    last_update_ms: Option<f64>,
    fill: f64,
}

impl LevelMeter {
    pub fn new(settings: MeterSettings) -> Self {
        Self {
            settings,
            last_update_ms: None,
            fill: 0.0,
        }
    }

    /// Fill fraction for a level
    #[inline]
    pub fn fill_for(&self, level: f64) -> f64 {
        (level * self.settings.display_scale).min(1.0)
    }

    /// Feed a frame at `timestamp_ms`; returns the new fill when the meter updated.
    pub fn update(&mut self, timestamp_ms: f64, frame: &[u8]) -> Option<f64> {
        if let Some(last) = self.last_update_ms {
            if timestamp_ms - last <= self.settings.update_interval_ms {
                return None;
            }
        }
        self.fill = self.fill_for(rms_u8(frame));
        self.last_update_ms = Some(timestamp_ms);
        Some(self.fill)
    }

    /// Last displayed fill fraction
    pub fn fill(&self) -> f64 {
        self.fill
    }

    pub fn reset(&mut self) {
        self.last_update_ms = None;
        self.fill = 0.0;
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new(MeterSettings::default())
    }
}
