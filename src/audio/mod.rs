//! Procedural audio: synthesized backing track and sound effects
//!
//! No sample files. Everything is oscillators, filters and gain envelopes
//! scheduled on an [`AudioGraph`], which is Web Audio in the browser and the
//! [`OfflineGraph`] renderer everywhere else.

pub mod engine;
pub mod graph;
pub mod offline;
pub mod sequencer;
pub mod timers;
pub mod voices;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use engine::AudioEngine;
pub use graph::{AudioGraph, Automation, FilterKind, Param, Waveform};
pub use offline::{NodeId, OfflineGraph, rms};
pub use voices::{Buses, SoundEffect};
#[cfg(target_arch = "wasm32")]
pub use web::WebAudioGraph;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio context unavailable: {0}")]
    Unavailable(String),

    #[error("failed to create {0} node")]
    NodeCreation(&'static str),

    #[error("unknown audio node")]
    UnknownNode,

    #[error("connection would create a cycle")]
    Cycle,

    #[error("{node} node has no {param:?} parameter")]
    UnsupportedParam { node: &'static str, param: Param },

    #[error("node is not a scheduled source")]
    NotASource,

    #[error("scheduling failed: {0}")]
    Scheduling(String),
}
