//! Error types for the sequencer

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum SqError {
    #[error("Invalid parameter: {0}")]
    Validation(String),

    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("No preset found")]
    NoPresetFound,

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Device access denied: {0}")]
    DeviceAccessDenied(String),

    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SqError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Outcomes that are reported to the user but are not failures
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::NothingToUndo | Self::NothingToRedo | Self::NoPresetFound
        )
    }
}

/// Result type alias
pub type SqResult<T> = Result<T, SqError>;

/// Reject NaN and infinities with a descriptive validation error.
pub fn ensure_finite(name: &str, value: f64) -> SqResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SqError::Validation(format!("{name} must be finite, got {value}")))
    }
}

/// Reject values outside `[min, max]` (inclusive).
pub fn ensure_range(name: &str, value: f64, min: f64, max: f64) -> SqResult<f64> {
    ensure_finite(name, value)?;
    if value < min || value > max {
        return Err(SqError::Validation(format!(
            "{name} out of range: {value} (expected {min}..={max})"
        )));
    }
    Ok(value)
}
