//! Timeline geometry and clip placement

use serde::{Deserialize, Serialize};

use crate::{SqError, SqResult, ensure_finite};

/// Horizontal/vertical layout of the multi-track timeline (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineLayout {
    pub track_count: usize,
    pub track_height: f64,
    pub clip_height: f64,
    /// x-coordinate of timeline time zero
    pub left_offset: f64,
    pub pixels_per_second: f64,
}

impl Default for TimelineLayout {
    fn default() -> Self {
        Self {
            track_count: 16,
            track_height: 100.0,
            clip_height: 60.0,
            left_offset: 50.0,
            pixels_per_second: 100.0,
        }
    }
}

impl TimelineLayout {
    /// Track under a y-coordinate, `None` outside the track area
    pub fn track_at(&self, y: f64) -> Option<usize> {
        if !y.is_finite() || y < 0.0 {
            return None;
        }
        let index = (y / self.track_height).floor() as usize;
        (index < self.track_count).then_some(index)
    }

    /// Timeline offset (seconds) for an x-coordinate
    #[inline]
    pub fn offset_at(&self, x: f64) -> f64 {
        (x - self.left_offset) / self.pixels_per_second
    }

    #[inline]
    pub fn width_for(&self, duration_secs: f64) -> f64 {
        duration_secs * self.pixels_per_second
    }

    /// Playhead x-coordinate after `elapsed_secs` of playback
    #[inline]
    pub fn playhead_x(&self, elapsed_secs: f64) -> f64 {
        self.left_offset + elapsed_secs * self.pixels_per_second
    }
}

/// Placement metadata of one clip on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipPlacement {
    pub track_index: usize,
    /// Start offset relative to playback start (seconds)
    pub offset_seconds: f64,
    pub position_pixels: f64,
    pub width_pixels: f64,
    pub duration_seconds: f64,
}

impl ClipPlacement {
    /// Place a clip of `duration_secs` at x on a track
    pub fn place(
        layout: &TimelineLayout,
        track_index: usize,
        x: f64,
        duration_secs: f64,
    ) -> SqResult<Self> {
        if track_index >= layout.track_count {
            return Err(SqError::Validation(format!(
                "Track index {} out of range (0..{})",
                track_index, layout.track_count
            )));
        }
        ensure_finite("clip position", x)?;
        ensure_finite("clip duration", duration_secs)?;
        if duration_secs < 0.0 {
            return Err(SqError::validation("Clip duration must be non-negative"));
        }

        Ok(Self {
            track_index,
            offset_seconds: layout.offset_at(x),
            position_pixels: x,
            width_pixels: layout.width_for(duration_secs),
            duration_seconds: duration_secs,
        })
    }

    /// Placement after dropping the clip at (x, y).
    ///
    /// A drop outside the track area keeps the clip on its current track.
    pub fn moved_to(&self, layout: &TimelineLayout, x: f64, y: f64) -> SqResult<Self> {
        ensure_finite("clip position", x)?;
        let track_index = layout.track_at(y).unwrap_or(self.track_index);
        Ok(Self {
            track_index,
            offset_seconds: layout.offset_at(x),
            position_pixels: x,
            ..*self
        })
    }

    pub fn validate(&self, layout: &TimelineLayout) -> SqResult<()> {
        if self.track_index >= layout.track_count {
            return Err(SqError::Validation(format!(
                "Track index {} out of range (0..{})",
                self.track_index, layout.track_count
            )));
        }
        ensure_finite("clip offset", self.offset_seconds)?;
        ensure_finite("clip position", self.position_pixels)?;
        ensure_finite("clip width", self.width_pixels)?;
        ensure_finite("clip duration", self.duration_seconds)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_track_at() {
        let layout = TimelineLayout::default();
        assert_eq!(layout.track_at(0.0), Some(0));
        assert_eq!(layout.track_at(250.0), Some(2));
        assert_eq!(layout.track_at(1599.0), Some(15));
        assert_eq!(layout.track_at(1600.0), None);
        assert_eq!(layout.track_at(-1.0), None);
    }

    #[test]
    fn test_place_clip() {
        let layout = TimelineLayout::default();
        let clip = ClipPlacement::place(&layout, 3, 250.0, 2.5).unwrap();
        assert_eq!(clip.track_index, 3);
        assert_relative_eq!(clip.offset_seconds, 2.0);
        assert_relative_eq!(clip.width_pixels, 250.0);
        assert!(ClipPlacement::place(&layout, 16, 50.0, 1.0).is_err());
    }

    #[test]
    fn test_move_clip_reverts_track_outside_area() {
        let layout = TimelineLayout::default();
        let clip = ClipPlacement::place(&layout, 1, 50.0, 1.0).unwrap();

        let moved = clip.moved_to(&layout, 150.0, 520.0).unwrap();
        assert_eq!(moved.track_index, 5);
        assert_relative_eq!(moved.offset_seconds, 1.0);
        assert_relative_eq!(moved.width_pixels, 100.0);

        let reverted = clip.moved_to(&layout, 150.0, 5000.0).unwrap();
        assert_eq!(reverted.track_index, 1);
    }

    #[test]
    fn test_playhead() {
        let layout = TimelineLayout::default();
        assert_relative_eq!(layout.playhead_x(0.0), 50.0);
        assert_relative_eq!(layout.playhead_x(1.5), 200.0);
    }
}
