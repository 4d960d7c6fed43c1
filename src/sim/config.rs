//! Playfield configuration and axis mapping
//!
//! The simulation runs in a lane frame: `x` is the free axis the player
//! steers along, `y` is the fall axis gravity pulls along (+y is falling).
//! `Orientation` maps lane rectangles onto the screen, so one physics core
//! serves both the vertical jumper and the horizontal runner.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::platform::input::Key;

/// Which screen axis the fall axis runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Orientation {
    /// Steer left/right, gravity pulls down, the world scrolls upward
    #[default]
    Vertical,
    /// Steer up/down, gravity pulls left, the world scrolls rightward
    Horizontal,
}

impl Orientation {
    /// Keys steering toward the negative and positive ends of the free axis
    pub fn steering_keys(&self) -> (Key, Key) {
        match self {
            Orientation::Vertical => (Key::Left, Key::Right),
            Orientation::Horizontal => (Key::Up, Key::Down),
        }
    }

    /// Map a lane-frame rectangle (top-left + size) to screen space
    pub fn to_screen(&self, pos: Vec2, size: Vec2, fall_extent: f32) -> (Vec2, Vec2) {
        match self {
            Orientation::Vertical => (pos, size),
            Orientation::Horizontal => (
                Vec2::new(fall_extent - pos.y - size.y, pos.x),
                Vec2::new(size.y, size.x),
            ),
        }
    }

    /// Map a lane-frame point to screen space
    pub fn point_to_screen(&self, point: Vec2, fall_extent: f32) -> Vec2 {
        match self {
            Orientation::Vertical => point,
            Orientation::Horizontal => Vec2::new(fall_extent - point.y, point.x),
        }
    }

    /// Whether newly generated platforms go to the front of the set
    pub fn prepends_platforms(&self) -> bool {
        matches!(self, Orientation::Vertical)
    }
}

/// What happens when the player leaves the free axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EdgePolicy {
    /// Reappear on the opposite side
    #[default]
    Wrap,
    /// Stop at the bound, killing free-axis velocity
    Clamp,
}

/// Named playfield presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Variant {
    /// Vertical ascent with screen wrap
    #[default]
    Jumper,
    /// Horizontal advance with screen wrap
    Runner,
    /// Horizontal advance between hard walls
    Corridor,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Jumper => "Jumper",
            Variant::Runner => "Runner",
            Variant::Corridor => "Corridor",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "jumper" | "vertical" => Some(Variant::Jumper),
            "runner" | "horizontal" => Some(Variant::Runner),
            "corridor" => Some(Variant::Corridor),
            _ => None,
        }
    }

    pub fn config(&self) -> PlayfieldConfig {
        match self {
            Variant::Jumper => PlayfieldConfig::default(),
            Variant::Runner => PlayfieldConfig {
                width: PLAYFIELD_HEIGHT,
                height: PLAYFIELD_WIDTH,
                orientation: Orientation::Horizontal,
                ..PlayfieldConfig::default()
            },
            Variant::Corridor => PlayfieldConfig {
                width: PLAYFIELD_HEIGHT,
                height: PLAYFIELD_WIDTH,
                orientation: Orientation::Horizontal,
                edge: EdgePolicy::Clamp,
                ..PlayfieldConfig::default()
            },
        }
    }
}

/// Rejected playfield configurations
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("platform width {platform} does not fit the free axis ({extent})")]
    PlatformTooWide { platform: f32, extent: f32 },

    #[error("player size {player} does not fit the free axis ({extent})")]
    PlayerTooWide { player: f32, extent: f32 },

    #[error("platform gap must be positive, got {0}")]
    NonPositiveGap(f32),

    #[error("minimum platform count must be at least 1")]
    NoPlatforms,
}

/// Per-variant physics and geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayfieldConfig {
    /// Screen width
    pub width: f32,
    /// Screen height
    pub height: f32,
    pub orientation: Orientation,
    pub edge: EdgePolicy,

    // === Physics ===
    pub gravity: f32,
    pub jump_impulse: f32,
    pub player_size: f32,
    pub player_speed: f32,
    pub damping: f32,

    // === Platforms ===
    /// Extent along the free axis
    pub platform_width: f32,
    /// Extent along the fall axis
    pub platform_height: f32,
    pub platform_gap: f32,
    pub min_platforms: usize,
    pub initial_platforms: usize,
    pub despawn_margin: f32,

    // === Trail ===
    pub trail_capacity: usize,
    pub trail_max_age_ticks: u32,
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self {
            width: PLAYFIELD_WIDTH,
            height: PLAYFIELD_HEIGHT,
            orientation: Orientation::Vertical,
            edge: EdgePolicy::Wrap,

            gravity: GRAVITY,
            jump_impulse: JUMP_IMPULSE,
            player_size: PLAYER_SIZE,
            player_speed: PLAYER_SPEED,
            damping: PLAYER_DAMPING,

            platform_width: PLATFORM_WIDTH,
            platform_height: PLATFORM_HEIGHT,
            platform_gap: PLATFORM_GAP,
            min_platforms: MIN_PLATFORMS,
            initial_platforms: INITIAL_PLATFORMS,
            despawn_margin: DESPAWN_MARGIN,

            trail_capacity: TRAIL_CAPACITY,
            trail_max_age_ticks: TRAIL_MAX_AGE_TICKS,
        }
    }
}

impl PlayfieldConfig {
    /// Length of the axis the player steers along
    #[inline]
    pub fn free_extent(&self) -> f32 {
        match self.orientation {
            Orientation::Vertical => self.width,
            Orientation::Horizontal => self.height,
        }
    }

    /// Length of the axis gravity acts along
    #[inline]
    pub fn fall_extent(&self) -> f32 {
        match self.orientation {
            Orientation::Vertical => self.height,
            Orientation::Horizontal => self.width,
        }
    }

    /// Crossing this fall-axis coordinate while ascending scrolls the world
    #[inline]
    pub fn scroll_threshold(&self) -> f32 {
        self.fall_extent() / 2.0
    }

    /// Platform size in the lane frame
    #[inline]
    pub fn platform_size(&self) -> Vec2 {
        Vec2::new(self.platform_width, self.platform_height)
    }

    /// Catch degenerate extents before any randomized layout runs
    pub fn validate(&self) -> Result<(), ConfigError> {
        let extent = self.free_extent();
        if self.platform_width >= extent {
            return Err(ConfigError::PlatformTooWide {
                platform: self.platform_width,
                extent,
            });
        }
        if self.player_size >= extent {
            return Err(ConfigError::PlayerTooWide {
                player: self.player_size,
                extent,
            });
        }
        if self.platform_gap <= 0.0 {
            return Err(ConfigError::NonPositiveGap(self.platform_gap));
        }
        if self.min_platforms == 0 {
            return Err(ConfigError::NoPlatforms);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extents_follow_orientation() {
        let vertical = Variant::Jumper.config();
        assert_eq!(vertical.free_extent(), 600.0);
        assert_eq!(vertical.fall_extent(), 800.0);

        let horizontal = Variant::Runner.config();
        assert_eq!(horizontal.free_extent(), 600.0);
        assert_eq!(horizontal.fall_extent(), 800.0);
        assert_eq!(horizontal.width, 800.0);
    }

    #[test]
    fn test_horizontal_mapping_mirrors_fall_axis() {
        let size = Vec2::new(100.0, 20.0);
        // Platform right at the bottom of the lane frame lands on the left edge of the screen
        let (pos, screen_size) =
            Orientation::Horizontal.to_screen(Vec2::new(30.0, 780.0), size, 800.0);
        assert_eq!(pos, Vec2::new(0.0, 30.0));
        assert_eq!(screen_size, Vec2::new(20.0, 100.0));

        let (pos, _) = Orientation::Vertical.to_screen(Vec2::new(30.0, 780.0), size, 800.0);
        assert_eq!(pos, Vec2::new(30.0, 780.0));
    }

    #[test]
    fn test_validate_rejects_degenerate_playfield() {
        assert!(PlayfieldConfig::default().validate().is_ok());

        let narrow = PlayfieldConfig {
            width: 90.0,
            ..PlayfieldConfig::default()
        };
        assert!(matches!(
            narrow.validate(),
            Err(ConfigError::PlatformTooWide { .. })
        ));

        let no_gap = PlayfieldConfig {
            platform_gap: 0.0,
            ..PlayfieldConfig::default()
        };
        assert_eq!(no_gap.validate(), Err(ConfigError::NonPositiveGap(0.0)));
    }

    #[test]
    fn test_variant_from_str() {
        assert_eq!(Variant::from_str("RUNNER"), Some(Variant::Runner));
        assert_eq!(Variant::from_str("vertical"), Some(Variant::Jumper));
        assert_eq!(Variant::from_str("sideways"), None);
    }
}
