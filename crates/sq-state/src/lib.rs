//! sq-state: Session state, automation, undo/redo, presets
//!
//! Provides the session model with full snapshot-based undo/redo support.

mod automation;
mod session;
mod snapshot;
mod undo;
mod preset;
mod preferences;

pub use automation::*;
pub use session::*;
pub use snapshot::*;
pub use undo::*;
pub use preset::*;
pub use preferences::*;
