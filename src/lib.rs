//! Vapor Jump - A vaporwave endless jumper
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, platform generation)
//! - `game`: Game loop state machine (menu, playing, game over)
//! - `audio`: Procedural synthwave soundtrack and sound effects
//! - `platform`: Browser/native platform abstraction
//! - `persistence`: Key-value storage for high scores and settings

pub mod audio;
pub mod game;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use audio::{AudioEngine, AudioError, AudioGraph, OfflineGraph, SoundEffect};
pub use game::{Game, GamePhase, RenderSnapshot};
pub use highscores::HighScore;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Default playfield dimensions (vertical variant)
    pub const PLAYFIELD_WIDTH: f32 = 600.0;
    pub const PLAYFIELD_HEIGHT: f32 = 800.0;

    /// Gravity added to the fall-axis velocity every tick
    pub const GRAVITY: f32 = 0.5;
    /// Fall-axis velocity set when bouncing off a platform
    pub const JUMP_IMPULSE: f32 = -15.0;

    /// Player defaults
    pub const PLAYER_SIZE: f32 = 40.0;
    pub const PLAYER_SPEED: f32 = 7.0;
    /// Free-axis velocity multiplier applied when no direction is held
    pub const PLAYER_DAMPING: f32 = 0.8;
    /// Distance from the bottom of the playfield the player spawns at
    pub const PLAYER_START_OFFSET: f32 = 200.0;

    /// Platform defaults
    pub const PLATFORM_WIDTH: f32 = 100.0;
    pub const PLATFORM_HEIGHT: f32 = 20.0;
    pub const PLATFORM_GAP: f32 = 80.0;
    /// Live platform floor while playing
    pub const MIN_PLATFORMS: usize = 12;
    /// Randomized platforms laid out at game start (plus one start platform)
    pub const INITIAL_PLATFORMS: usize = 10;
    /// Distance past the bottom edge before a platform is recycled
    pub const DESPAWN_MARGIN: f32 = 50.0;
    /// First randomized platform sits this far above the bottom edge
    pub const FIRST_PLATFORM_OFFSET: f32 = 100.0;
    /// The guaranteed start platform sits this far above the bottom edge
    pub const START_PLATFORM_OFFSET: f32 = 50.0;

    /// Trail buffer capacity
    pub const TRAIL_CAPACITY: usize = 12;
    /// Trail points older than this are dropped while not ascending
    /// (300 ms at 60 callbacks per second)
    pub const TRAIL_MAX_AGE_TICKS: u32 = 18;
}
