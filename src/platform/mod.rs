//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input (polled key state)
//! - Browser entry points and the control surface exposed to the page

pub mod input;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use input::{InputState, Key, KeyState};
