//! Game loop controller
//!
//! Ties one simulation session to the audio engine and the high score
//! record, and drives the menu / playing / game over state machine. The host
//! calls `frame` once per display callback; each call is exactly one
//! simulation step.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::audio::{AudioEngine, AudioGraph, SoundEffect};
use crate::highscores::HighScore;
use crate::persistence::KeyValueStore;
use crate::platform::input::InputState;
use crate::settings::Settings;
use crate::sim::{
    ConfigError, GameEvent, GameSession, Orientation, PlatformColor, PlayfieldConfig, TickInput,
    tick,
};

/// Top-level game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GamePhase {
    #[default]
    Menu,
    Playing,
    GameOver,
}

/// Screen-space rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformSprite {
    pub rect: Rect,
    pub color: PlatformColor,
    /// CSS color for the fill
    pub fill: &'static str,
}

/// One drawn trail segment, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrailSegment {
    pub center: Vec2,
    /// Opacity (age fade × position fade × 0.8)
    pub alpha: f32,
    /// Sprite size (shrinks toward the tail)
    pub size: f32,
    /// Connector to the previous segment, if any
    pub line_from: Option<Vec2>,
    pub line_width: f32,
}

/// Everything a renderer needs for one frame, already in screen space
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub phase: GamePhase,
    pub width: f32,
    pub height: f32,
    pub orientation: Orientation,
    pub player: Option<Rect>,
    pub trail: Vec<TrailSegment>,
    pub platforms: Vec<PlatformSprite>,
    pub score: u64,
    pub high_score: u64,
    pub muted: bool,
}

/// Session, audio and high score wired together
pub struct Game<G: AudioGraph, S: KeyValueStore> {
    settings: Settings,
    config: PlayfieldConfig,
    phase: GamePhase,
    session: Option<GameSession>,
    audio: AudioEngine<G>,
    store: S,
    high_score: HighScore,
    /// Score the current run started against
    previous_best: u64,
    base_seed: u64,
    runs: u64,
}

impl<G: AudioGraph, S: KeyValueStore> Game<G, S> {
    /// Game on the settings' preset playfield, starting at the menu
    pub fn new(settings: Settings, audio: AudioEngine<G>, store: S, seed: u64) -> Self {
        let config = settings.variant.config();
        Self::build(settings, config, audio, store, seed)
    }

    /// Game on a custom playfield
    pub fn with_config(
        settings: Settings,
        config: PlayfieldConfig,
        audio: AudioEngine<G>,
        store: S,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(settings, config, audio, store, seed))
    }

    fn build(
        settings: Settings,
        config: PlayfieldConfig,
        audio: AudioEngine<G>,
        store: S,
        seed: u64,
    ) -> Self {
        let high_score = HighScore::load(&store);
        Self {
            settings,
            config,
            phase: GamePhase::Menu,
            session: None,
            audio,
            store,
            previous_best: high_score.best(),
            high_score,
            base_seed: seed,
            runs: 0,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> &PlayfieldConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Score of the current (or last) run
    pub fn score(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.score)
    }

    pub fn high_score(&self) -> u64 {
        self.high_score.best()
    }

    pub fn is_muted(&self) -> bool {
        self.audio.is_muted()
    }

    pub fn audio(&self) -> &AudioEngine<G> {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioEngine<G> {
        &mut self.audio
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Begin a fresh run
    pub fn start(&mut self) {
        let seed = self
            .base_seed
            .wrapping_add(self.runs.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        self.runs += 1;

        self.session = Some(GameSession::new(self.config.clone(), seed));
        self.previous_best = self.high_score.best();
        self.phase = GamePhase::Playing;
        self.audio.start_music();
        log::info!("Run {} started (seed {})", self.runs, seed);
    }

    /// Same as `start`, from any phase
    pub fn restart(&mut self) {
        self.start();
    }

    pub fn return_to_menu(&mut self) {
        self.phase = GamePhase::Menu;
        self.session = None;
        self.audio.stop_music();
        log::info!("Returned to menu");
    }

    /// Flip mute; returns the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.audio.toggle_mute()
    }

    /// One display callback: pump audio timers, then step once if playing
    pub fn frame(&mut self, input: &impl InputState, now_ms: f64) -> Vec<GameEvent> {
        self.audio.update(now_ms);

        if self.phase != GamePhase::Playing {
            return Vec::new();
        }
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        let tick_input = TickInput::poll(input, self.config.orientation);
        tick(session, &tick_input);
        let events = session.drain_events();

        let mut out = Vec::with_capacity(events.len() + 1);
        for event in events {
            out.push(event);
            match event {
                GameEvent::Jump => self.audio.play(SoundEffect::Jump),
                GameEvent::Score { total, .. } => {
                    if self.high_score.record(total, &mut self.store) {
                        out.push(GameEvent::NewHighScore { score: total });
                    }
                }
                GameEvent::GameOver { score } => self.game_over(score),
                GameEvent::NewHighScore { .. } => {}
            }
        }
        out
    }

    fn game_over(&mut self, score: u64) {
        self.phase = GamePhase::GameOver;
        self.audio.play(SoundEffect::GameOver);
        self.audio.stop_music();

        if score > self.previous_best {
            log::info!("Game over, new high score {}", score);
        } else {
            log::info!("Game over, final score {} (best {})", score, self.high_score.best());
        }
    }

    /// Screen-space view of the current state
    pub fn snapshot(&self) -> RenderSnapshot {
        let orientation = self.config.orientation;
        let fall = self.config.fall_extent();
        let to_rect = |pos: Vec2, size: Vec2| {
            let (pos, size) = orientation.to_screen(pos, size, fall);
            Rect { pos, size }
        };

        let (player, trail, platforms) = match &self.session {
            Some(session) => {
                let player = &session.player;
                let trail = trail_segments(session, orientation, fall);
                let platforms = session
                    .platforms
                    .iter()
                    .map(|p| PlatformSprite {
                        rect: to_rect(p.pos, p.size),
                        color: p.color,
                        fill: p.color.hex(),
                    })
                    .collect();
                (Some(to_rect(player.pos, player.size)), trail, platforms)
            }
            None => (None, Vec::new(), Vec::new()),
        };

        RenderSnapshot {
            phase: self.phase,
            width: self.config.width,
            height: self.config.height,
            orientation,
            player,
            trail,
            platforms,
            score: self.score(),
            high_score: self.high_score.best(),
            muted: self.audio.is_muted(),
        }
    }
}

/// Fade and size each trail point by age and position along the trail
///
/// The newest point is covered by the player sprite and is not drawn.
fn trail_segments(session: &GameSession, orientation: Orientation, fall: f32) -> Vec<TrailSegment> {
    let trail = &session.player.trail;
    let len = trail.len();
    if len < 2 {
        return Vec::new();
    }

    let max_age = session.config.trail_max_age_ticks.max(1) as f32;
    let width = session.player.size.x;
    let points: Vec<_> = trail.iter().collect();

    let mut segments = Vec::with_capacity(len - 1);
    for i in 0..len - 1 {
        let point = points[i];
        let age_fade = (1.0 - point.age_ticks as f32 / max_age).max(0.0);
        let position_fade = (i + 1) as f32 / len as f32;
        let alpha = age_fade * position_fade * 0.8;
        if alpha <= 0.0 {
            continue;
        }

        let line_from = (i > 0).then(|| orientation.point_to_screen(points[i - 1].pos, fall));
        segments.push(TrailSegment {
            center: orientation.point_to_screen(point.pos, fall),
            alpha,
            size: width * 0.8 * position_fade,
            line_from,
            line_width: 3.0 * position_fade,
        });
    }
    segments
}
