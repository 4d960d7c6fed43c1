//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One fixed step per tick, never scaled by elapsed time
//! - Seeded RNG only
//! - No rendering, audio or platform dependencies

pub mod config;
pub mod generator;
pub mod physics;
pub mod state;
pub mod tick;

pub use config::{ConfigError, EdgePolicy, Orientation, PlayfieldConfig, Variant};
pub use physics::{collides, jump, step_player};
pub use state::{GameEvent, GameSession, Platform, PlatformColor, Player, Trail, TrailPoint};
pub use tick::{TickInput, tick};
