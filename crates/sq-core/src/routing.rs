//! Channel routing: stereo mode, sends, and output destination

use serde::{Deserialize, Serialize};

use crate::{SqResult, ensure_range};

/// Input channel mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StereoMode {
    Mono,
    #[default]
    Stereo,
}

/// Output routing destination identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputRoute(pub String);

impl OutputRoute {
    pub fn master() -> Self {
        Self("master".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for OutputRoute {
    fn default() -> Self {
        Self::master()
    }
}

/// Send effect type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendKind {
    #[default]
    Reverb,
}

/// Send descriptor as captured in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SendDescriptor {
    #[serde(rename = "type")]
    pub kind: SendKind,
    /// Send level (0.0 - 1.0)
    pub level: f64,
}

impl SendDescriptor {
    pub fn new(kind: SendKind, level: f64) -> Self {
        Self { kind, level }
    }

    pub fn validate(&self) -> SqResult<()> {
        ensure_range("send level", self.level, 0.0, 1.0)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_serialization() {
        let send = SendDescriptor::new(SendKind::Reverb, 0.3);
        let json = serde_json::to_string(&send).unwrap();
        assert_eq!(json, r#"{"type":"reverb","level":0.3}"#);
    }

    #[test]
    fn test_send_validation() {
        assert!(SendDescriptor::new(SendKind::Reverb, 1.0).validate().is_ok());
        assert!(SendDescriptor::new(SendKind::Reverb, 1.2).validate().is_err());
    }

    #[test]
    fn test_output_route() {
        assert_eq!(OutputRoute::default().as_str(), "master");
        let json = serde_json::to_string(&OutputRoute("bus-2".into())).unwrap();
        assert_eq!(json, r#""bus-2""#);
    }
}
