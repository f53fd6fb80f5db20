//! sq-core: Shared types, traits, and utilities for the sequencer
//!
//! This crate provides the foundational types used across all sequencer crates:
//! the error taxonomy, decibel/normalized parameter helpers, effect and send
//! descriptors, timeline geometry, level metering and the audio-graph facade.

mod error;
mod params;
mod effect;
mod routing;
mod timeline;
mod meter;
mod graph;

pub use error::*;
pub use params::*;
pub use effect::*;
pub use routing::*;
pub use timeline::*;
pub use meter::*;
pub use graph::*;
