//! sq-engine: Sequencer session engine
//!
//! Ties the session model to the host:
//! - Event dispatch with snapshot history
//! - Restore into the audio graph
//! - Decoded audio bound to clip slots
//! - Transport and playhead polling
//! - Level meter polling

mod audio_pool;
mod event;
mod metering;
pub mod restore;
mod sequencer;
mod transport;

pub use audio_pool::*;
pub use event::*;
pub use metering::*;
pub use sequencer::*;
pub use transport::*;
