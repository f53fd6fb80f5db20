//! Insert effect descriptors
//!
//! Each effect kind carries its own parameter schema. Descriptors serialize
//! as `{"type": "...", "parameters": {...}}`.

use serde::{Deserialize, Serialize};

use crate::{SqError, SqResult, ensure_finite, ensure_range};

/// EQ band parameters (single peaking band)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqParams {
    /// Center frequency (Hz)
    pub frequency_hz: f64,
    /// Band gain (dB)
    pub gain_db: f64,
    /// Quality factor
    pub q: f64,
}

impl Default for EqParams {
    fn default() -> Self {
        Self {
            frequency_hz: 1000.0,
            gain_db: 0.0,
            q: 1.0,
        }
    }
}

/// Compressor parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorParams {
    /// Threshold (dB)
    pub threshold_db: f64,
    /// Ratio (e.g., 3.0 = 3:1)
    pub ratio: f64,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: -30.0,
            ratio: 3.0,
        }
    }
}

/// Delay parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayParams {
    pub time_secs: f64,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self { time_secs: 0.5 }
    }
}

/// Waveshaper distortion parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistortionParams {
    pub amount: f64,
}

impl Default for DistortionParams {
    fn default() -> Self {
        Self { amount: 50.0 }
    }
}

/// Insert effect descriptor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "parameters")]
pub enum EffectDescriptor {
    #[serde(rename = "EQ")]
    Eq(EqParams),
    Compressor(CompressorParams),
    Delay(DelayParams),
    Distortion(DistortionParams),
}

impl EffectDescriptor {
    /// All effect names accepted by [`EffectDescriptor::from_name`]
    pub const NAMES: [&'static str; 4] = ["EQ", "Compressor", "Delay", "Distortion"];

    /// Default-parameter descriptor for an effect name (case-insensitive)
    pub fn from_name(name: &str) -> SqResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "eq" => Ok(Self::Eq(EqParams::default())),
            "compressor" => Ok(Self::Compressor(CompressorParams::default())),
            "delay" => Ok(Self::Delay(DelayParams::default())),
            "distortion" => Ok(Self::Distortion(DistortionParams::default())),
            other => Err(SqError::Validation(format!(
                "Unknown effect type '{}' (expected one of {})",
                other,
                Self::NAMES.join(", ")
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Eq(_) => "EQ",
            Self::Compressor(_) => "Compressor",
            Self::Delay(_) => "Delay",
            Self::Distortion(_) => "Distortion",
        }
    }

    /// Check every parameter against the range the host graph accepts
    pub fn validate(&self) -> SqResult<()> {
        match self {
            Self::Eq(p) => {
                ensure_range("EQ frequency", p.frequency_hz, 20.0, 20_000.0)?;
                ensure_range("EQ gain", p.gain_db, -40.0, 40.0)?;
                ensure_range("EQ Q", p.q, 0.0001, 1000.0)?;
            }
            Self::Compressor(p) => {
                ensure_range("Compressor threshold", p.threshold_db, -100.0, 0.0)?;
                ensure_range("Compressor ratio", p.ratio, 1.0, 20.0)?;
            }
            Self::Delay(p) => {
                ensure_range("Delay time", p.time_secs, 0.0, 1.0)?;
            }
            Self::Distortion(p) => {
                ensure_finite("Distortion amount", p.amount)?;
                if p.amount < 0.0 {
                    return Err(SqError::validation("Distortion amount must be non-negative"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_defaults() {
        assert_eq!(
            EffectDescriptor::from_name("EQ").unwrap(),
            EffectDescriptor::Eq(EqParams {
                frequency_hz: 1000.0,
                gain_db: 0.0,
                q: 1.0
            })
        );
        assert_eq!(
            EffectDescriptor::from_name("compressor").unwrap(),
            EffectDescriptor::Compressor(CompressorParams {
                threshold_db: -30.0,
                ratio: 3.0
            })
        );
        assert_eq!(
            EffectDescriptor::from_name(" Delay ").unwrap().name(),
            "Delay"
        );
        assert!(EffectDescriptor::from_name("Flanger").is_err());
    }

    #[test]
    fn test_defaults_validate() {
        for name in EffectDescriptor::NAMES {
            assert!(EffectDescriptor::from_name(name).unwrap().validate().is_ok());
        }

        let bad = EffectDescriptor::Compressor(CompressorParams {
            threshold_db: -30.0,
            ratio: 0.5,
        });
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_tagged_serialization() {
        let fx = EffectDescriptor::Delay(DelayParams { time_secs: 0.25 });
        let json = serde_json::to_string(&fx).unwrap();
        assert_eq!(json, r#"{"type":"Delay","parameters":{"time_secs":0.25}}"#);

        let eq: EffectDescriptor =
            serde_json::from_str(r#"{"type":"EQ","parameters":{"frequency_hz":440.0,"gain_db":3.0,"q":0.7}}"#)
                .unwrap();
        assert_eq!(eq.name(), "EQ");
    }
}
