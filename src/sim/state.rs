//! Game state and core simulation types
//!
//! Positions live in the lane frame (x = free axis, y = fall axis, +y falls).

use std::collections::VecDeque;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::config::PlayfieldConfig;
use super::generator;
use crate::consts::PLAYER_START_OFFSET;

/// Fixed platform palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformColor {
    Magenta,
    Cyan,
    Yellow,
    DeepPink,
}

impl PlatformColor {
    pub const PALETTE: [PlatformColor; 4] = [
        PlatformColor::Magenta,
        PlatformColor::Cyan,
        PlatformColor::Yellow,
        PlatformColor::DeepPink,
    ];

    /// Uniform pick from the palette
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::PALETTE[rng.random_range(0..Self::PALETTE.len())]
    }

    pub fn hex(&self) -> &'static str {
        match self {
            PlatformColor::Magenta => "#ff00ff",
            PlatformColor::Cyan => "#00ffff",
            PlatformColor::Yellow => "#ffff00",
            PlatformColor::DeepPink => "#ff1493",
        }
    }
}

/// Something that happened during a tick, for audio and the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Player bounced off a platform
    Jump,
    /// World scrolled and points were awarded
    Score { gained: u64, total: u64 },
    /// Player fell off the bottom of the playfield
    GameOver { score: u64 },
    /// Score passed the stored best (raised by the game loop, not the sim)
    NewHighScore { score: u64 },
}

/// A trail sample left behind while ascending
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    /// Player center at the time of the sample
    pub pos: Vec2,
    /// Ticks since the sample was taken
    pub age_ticks: u32,
}

/// Bounded trail history (oldest first)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
}

impl Trail {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Append a fresh sample, evicting the oldest past `capacity`
    pub fn record(&mut self, pos: Vec2, capacity: usize) {
        self.points.push_back(TrailPoint { pos, age_ticks: 0 });
        while self.points.len() > capacity {
            self.points.pop_front();
        }
    }

    /// Drop samples that have reached `max_age_ticks`
    pub fn decay(&mut self, max_age_ticks: u32) {
        self.points.retain(|p| p.age_ticks < max_age_ticks);
    }

    /// Advance every sample by one tick
    pub fn age(&mut self) {
        for point in &mut self.points {
            point.age_ticks = point.age_ticks.saturating_add(1);
        }
    }

    /// Move samples with the world when it scrolls
    pub fn shift(&mut self, dy: f32) {
        for point in &mut self.points {
            point.pos.y += dy;
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

/// The player sprite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub speed: f32,
    pub trail: Trail,
}

impl Player {
    /// Spawn centered on the free axis, a fixed distance above the bottom
    pub fn new(config: &PlayfieldConfig) -> Self {
        let size = Vec2::splat(config.player_size);
        Self {
            pos: Vec2::new(
                config.free_extent() / 2.0 - size.x / 2.0,
                config.fall_extent() - PLAYER_START_OFFSET,
            ),
            vel: Vec2::ZERO,
            size,
            speed: config.player_speed,
            trail: Trail::new(config.trail_capacity),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Leading edge on the fall axis
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn is_ascending(&self) -> bool {
        self.vel.y < 0.0
    }
}

/// A platform the player can bounce off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub pos: Vec2,
    pub size: Vec2,
    pub color: PlatformColor,
}

impl Platform {
    pub fn new(pos: Vec2, size: Vec2, color: PlatformColor) -> Self {
        Self { pos, size, color }
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }
}

/// One run of the game (deterministic for a given seed)
#[derive(Debug, Clone)]
pub struct GameSession {
    pub config: PlayfieldConfig,
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub player: Player,
    pub platforms: Vec<Platform>,
    pub score: u64,
    /// World displacement applied this tick
    pub scroll_speed: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Set once the player has fallen out; further ticks are ignored
    pub finished: bool,
    events: Vec<GameEvent>,
}

impl GameSession {
    /// Fresh run: player at the start position, initial platforms laid out
    pub fn new(config: PlayfieldConfig, seed: u64) -> Self {
        let mut session = Self {
            player: Player::new(&config),
            config,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            platforms: Vec::new(),
            score: 0,
            scroll_speed: 0.0,
            time_ticks: 0,
            finished: false,
            events: Vec::new(),
        };
        generator::spawn_initial(&mut session);
        session
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_evicts_oldest() {
        let mut trail = Trail::new(3);
        for i in 0..5 {
            trail.record(Vec2::new(i as f32, 0.0), 3);
        }
        assert_eq!(trail.len(), 3);
        let xs: Vec<f32> = trail.iter().map(|p| p.pos.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_trail_decay_by_age() {
        let mut trail = Trail::new(12);
        trail.record(Vec2::ZERO, 12);
        for _ in 0..5 {
            trail.age();
        }
        trail.record(Vec2::ONE, 12);

        trail.decay(5);
        assert_eq!(trail.len(), 1);
        assert_eq!(trail.iter().next().map(|p| p.pos), Some(Vec2::ONE));
    }

    #[test]
    fn test_player_spawn_position() {
        let config = PlayfieldConfig::default();
        let player = Player::new(&config);
        assert_eq!(player.pos, Vec2::new(280.0, 600.0));
        assert_eq!(player.center(), Vec2::new(300.0, 620.0));
    }

    #[test]
    fn test_session_is_deterministic() {
        let a = GameSession::new(PlayfieldConfig::default(), 42);
        let b = GameSession::new(PlayfieldConfig::default(), 42);
        let xs_a: Vec<f32> = a.platforms.iter().map(|p| p.pos.x).collect();
        let xs_b: Vec<f32> = b.platforms.iter().map(|p| p.pos.x).collect();
        assert_eq!(xs_a, xs_b);
    }
}
