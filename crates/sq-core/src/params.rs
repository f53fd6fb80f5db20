//! Parameter types: decibels, dB ranges, and the fader scale

use serde::{Deserialize, Serialize};

/// Convert decibels to linear gain (`10^(db/20)`).
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert linear gain to decibels. Non-positive gain maps to `-inf`.
#[inline]
pub fn gain_to_db(gain: f64) -> f64 {
    if gain <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * gain.log10()
    }
}

/// Decibel value wrapper
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Decibels(pub f64);

impl Decibels {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub fn from_gain(gain: f64) -> Self {
        Self(gain_to_db(gain))
    }

    #[inline]
    pub fn to_gain(self) -> f64 {
        db_to_gain(self.0)
    }
}

impl Default for Decibels {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Decibel range a normalized value is mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbRange {
    pub min: f64,
    pub max: f64,
}

impl DbRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Linear map of a 0-1 value onto the range, in dB
    #[inline]
    pub fn denormalize(&self, normalized: f64) -> Decibels {
        Decibels(self.min + normalized.clamp(0.0, 1.0) * (self.max - self.min))
    }

    /// Inverse of [`DbRange::denormalize`], clamped to 0-1
    #[inline]
    pub fn normalize(&self, db: f64) -> f64 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.0;
        }
        ((db - self.min) / span).clamp(0.0, 1.0)
    }

    /// Normalized value straight to linear gain
    #[inline]
    pub fn gain_at(&self, normalized: f64) -> f64 {
        self.denormalize(normalized).to_gain()
    }
}

impl Default for DbRange {
    fn default() -> Self {
        Self::new(-60.0, 0.0)
    }
}

/// Vertical fader geometry: maps a pointer y-coordinate to dB and back.
///
/// y = 0 is the top of the fader (maximum level), y = `height` the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaderScale {
    pub range: DbRange,
    pub height: f64,
}

impl FaderScale {
    pub fn new(range: DbRange, height: f64) -> Self {
        Self { range, height }
    }

    /// dB value for a pointer position, y clamped to the fader
    pub fn db_at(&self, y: f64) -> f64 {
        let y = y.clamp(0.0, self.height);
        let ratio = 1.0 - y / self.height;
        self.range.min + (self.range.max - self.range.min) * ratio
    }

    /// Knob centre y-coordinate for a dB value
    pub fn knob_y(&self, db: f64) -> f64 {
        self.height - self.range.normalize(db) * self.height
    }
}

impl Default for FaderScale {
    fn default() -> Self {
        Self::new(DbRange::default(), 150.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_db_gain_conversion() {
        assert_relative_eq!(db_to_gain(0.0), 1.0);
        assert_relative_eq!(db_to_gain(-60.0), 0.001, epsilon = 1e-12);
        assert_relative_eq!(db_to_gain(-20.0), 0.1, epsilon = 1e-12);
        assert_relative_eq!(gain_to_db(0.1), -20.0, epsilon = 1e-9);
        assert_eq!(gain_to_db(0.0), f64::NEG_INFINITY);
        assert_relative_eq!(Decibels(-10.0).to_gain(), 0.316_227_766, epsilon = 1e-8);
    }

    #[test]
    fn test_db_range_mapping() {
        let range = DbRange::default();
        assert_eq!(range.denormalize(1.0), Decibels(0.0));
        assert_eq!(range.denormalize(0.0), Decibels(-60.0));
        assert_relative_eq!(range.gain_at(1.0), 1.0);
        assert_relative_eq!(range.normalize(-30.0), 0.5);
        assert_eq!(range.normalize(10.0), 1.0);
    }

    #[test]
    fn test_fader_scale() {
        let fader = FaderScale::default();
        assert_relative_eq!(fader.db_at(0.0), 0.0);
        assert_relative_eq!(fader.db_at(150.0), -60.0);
        assert_relative_eq!(fader.db_at(75.0), -30.0);
        // Pointer outside the fader is clamped
        assert_relative_eq!(fader.db_at(-40.0), 0.0);
        assert_relative_eq!(fader.db_at(400.0), -60.0);

        let y = fader.knob_y(-10.0);
        assert_relative_eq!(fader.db_at(y), -10.0, epsilon = 1e-9);
    }
}
