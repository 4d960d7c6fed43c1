//! Player integration and player/platform collision
//!
//! Everything here works in the lane frame, so the same code drives every
//! orientation. Steps are fixed per call; nothing is scaled by elapsed time.

use super::config::{EdgePolicy, PlayfieldConfig};
use super::state::{Platform, Player};
use super::tick::TickInput;

/// Advance the player by one step and return the world scroll speed
pub fn step_player(player: &mut Player, input: &TickInput, config: &PlayfieldConfig) -> f32 {
    update_trail(player, config);

    // Free axis: held direction sets velocity, release decays it
    if input.negative {
        player.vel.x = -player.speed;
    } else if input.positive {
        player.vel.x = player.speed;
    } else {
        player.vel.x *= config.damping;
    }
    player.pos.x += player.vel.x;

    resolve_edges(player, config);

    // Fall axis
    player.vel.y += config.gravity;
    player.pos.y += player.vel.y;

    // Pin the player at the midpoint and turn the excess into world scroll
    let threshold = config.scroll_threshold();
    if player.pos.y < threshold && player.vel.y < 0.0 {
        player.pos.y = threshold;
        let scroll = -player.vel.y;
        player.trail.shift(scroll);
        scroll
    } else {
        0.0
    }
}

/// Record or decay the trail based on the direction of travel last tick
fn update_trail(player: &mut Player, config: &PlayfieldConfig) {
    if player.is_ascending() {
        let center = player.center();
        player.trail.record(center, config.trail_capacity);
    } else {
        player.trail.decay(config.trail_max_age_ticks);
    }
    player.trail.age();
}

/// Apply the wrap or clamp policy on the free axis
fn resolve_edges(player: &mut Player, config: &PlayfieldConfig) {
    let extent = config.free_extent();
    match config.edge {
        EdgePolicy::Wrap => {
            if player.pos.x + player.size.x < 0.0 {
                player.pos.x = extent;
            } else if player.pos.x > extent {
                player.pos.x = -player.size.x;
            }
        }
        EdgePolicy::Clamp => {
            let max = extent - player.size.x;
            if player.pos.x <= 0.0 {
                player.pos.x = 0.0;
                player.vel.x = 0.0;
            } else if player.pos.x >= max {
                player.pos.x = max;
                player.vel.x = 0.0;
            }
        }
    }
}

/// Whether the falling player lands on `platform` this tick
///
/// The crossing window extends one tick of travel past the platform's far
/// edge so a fast fall cannot tunnel through.
pub fn collides(platform: &Platform, player: &Player) -> bool {
    player.vel.y > 0.0
        && player.pos.x + player.size.x > platform.pos.x
        && player.pos.x < platform.pos.x + platform.size.x
        && player.bottom() > platform.top()
        && player.bottom() < platform.bottom() + player.vel.y
}

/// Bounce: instantly replace fall velocity with the jump impulse
#[inline]
pub fn jump(player: &mut Player, config: &PlayfieldConfig) {
    player.vel.y = config.jump_impulse;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::Variant;
    use crate::sim::state::PlatformColor;
    use glam::Vec2;
    use proptest::prelude::*;

    fn held_left() -> TickInput {
        TickInput {
            negative: true,
            positive: false,
        }
    }

    fn platform_at(x: f32, y: f32) -> Platform {
        Platform::new(Vec2::new(x, y), Vec2::new(100.0, 20.0), PlatformColor::Cyan)
    }

    #[test]
    fn test_release_decays_velocity() {
        let config = PlayfieldConfig::default();
        let mut player = Player::new(&config);
        player.vel.x = 7.0;

        step_player(&mut player, &TickInput::default(), &config);
        assert!((player.vel.x - 5.6).abs() < 1e-5);

        step_player(&mut player, &TickInput::default(), &config);
        assert!((player.vel.x - 4.48).abs() < 1e-5);
        assert!(player.vel.x > 0.0);
    }

    #[test]
    fn test_held_direction_sets_speed() {
        let config = PlayfieldConfig::default();
        let mut player = Player::new(&config);
        let start = player.pos.x;

        step_player(&mut player, &held_left(), &config);
        assert_eq!(player.vel.x, -7.0);
        assert_eq!(player.pos.x, start - 7.0);
    }

    #[test]
    fn test_wrap_from_left_boundary() {
        let config = PlayfieldConfig::default();
        let mut player = Player::new(&config);
        player.pos.x = -1.0;

        let mut wrapped = false;
        for _ in 0..10 {
            step_player(&mut player, &held_left(), &config);
            if player.pos.x == config.free_extent() {
                wrapped = true;
                break;
            }
            assert!(player.pos.x < -1.0, "should keep sliding left until it exits");
        }
        assert!(wrapped, "player should reappear at the far edge");
    }

    #[test]
    fn test_wrap_from_right_boundary() {
        let config = PlayfieldConfig::default();
        let mut player = Player::new(&config);
        player.pos.x = 599.0;
        player.vel.x = 0.0;

        let input = TickInput {
            negative: false,
            positive: true,
        };
        step_player(&mut player, &input, &config);
        assert_eq!(player.pos.x, -player.size.x);
    }

    #[test]
    fn test_clamp_zeroes_velocity() {
        let config = Variant::Corridor.config();
        let mut player = Player::new(&config);
        player.pos.x = 3.0;

        step_player(&mut player, &held_left(), &config);
        assert_eq!(player.pos.x, 0.0);
        assert_eq!(player.vel.x, 0.0);
    }

    #[test]
    fn test_gravity_then_integrate() {
        let config = PlayfieldConfig::default();
        let mut player = Player::new(&config);
        let start = player.pos.y;

        step_player(&mut player, &TickInput::default(), &config);
        assert_eq!(player.vel.y, 0.5);
        assert_eq!(player.pos.y, start + 0.5);
    }

    #[test]
    fn test_scroll_pins_player_at_midpoint() {
        let config = PlayfieldConfig::default();
        let mut player = Player::new(&config);
        player.pos.y = 405.0;
        player.vel.y = -12.0;

        let scroll = step_player(&mut player, &TickInput::default(), &config);
        assert_eq!(player.pos.y, 400.0);
        assert!((scroll - 11.5).abs() < 1e-5);
    }

    #[test]
    fn test_no_scroll_when_falling() {
        let config = PlayfieldConfig::default();
        let mut player = Player::new(&config);
        player.pos.y = 300.0;
        player.vel.y = 2.0;

        let scroll = step_player(&mut player, &TickInput::default(), &config);
        assert_eq!(scroll, 0.0);
        assert_eq!(player.pos.y, 302.5);
    }

    #[test]
    fn test_trail_records_only_while_ascending() {
        let config = PlayfieldConfig::default();
        let mut player = Player::new(&config);
        player.vel.y = -10.0;

        step_player(&mut player, &TickInput::default(), &config);
        assert_eq!(player.trail.len(), 1);

        player.vel.y = 3.0;
        for _ in 0..config.trail_max_age_ticks {
            step_player(&mut player, &TickInput::default(), &config);
        }
        assert!(player.trail.is_empty());
    }

    #[test]
    fn test_collision_landing() {
        let config = PlayfieldConfig::default();
        let mut player = Player::new(&config);
        let platform = platform_at(250.0, 640.0);

        player.pos = Vec2::new(280.0, 601.0);
        player.vel.y = 5.0;
        assert!(collides(&platform, &player));

        jump(&mut player, &config);
        assert_eq!(player.vel.y, -15.0);
        assert!(!collides(&platform, &player));
    }

    #[test]
    fn test_collision_respects_free_axis_overlap() {
        let config = PlayfieldConfig::default();
        let mut player = Player::new(&config);
        let platform = platform_at(400.0, 640.0);

        player.pos = Vec2::new(100.0, 601.0);
        player.vel.y = 5.0;
        assert!(!collides(&platform, &player));
    }

    #[test]
    fn test_collision_window_catches_fast_fall() {
        let config = PlayfieldConfig::default();
        let mut player = Player::new(&config);
        let platform = platform_at(250.0, 640.0);

        // Bottom is already past the platform's far edge, but within one tick of travel
        player.pos = Vec2::new(280.0, 625.0);
        player.vel.y = 10.0;
        assert!(collides(&platform, &player));

        // Too far past: no catch
        player.pos.y = 635.0;
        assert!(!collides(&platform, &player));
    }

    proptest! {
        #[test]
        fn prop_collision_requires_falling(
            px in -50.0f32..650.0,
            py in 0.0f32..800.0,
            vy in -30.0f32..30.0,
            plat_x in 0.0f32..500.0,
            plat_y in 0.0f32..800.0,
        ) {
            let config = PlayfieldConfig::default();
            let mut player = Player::new(&config);
            player.pos = Vec2::new(px, py);
            player.vel.y = vy;
            let platform = platform_at(plat_x, plat_y);

            if collides(&platform, &player) {
                prop_assert!(player.vel.y > 0.0);
            }
        }

        #[test]
        fn prop_trail_never_exceeds_capacity(
            inputs in proptest::collection::vec((any::<bool>(), any::<bool>(), -20.0f32..20.0), 1..200)
        ) {
            let config = PlayfieldConfig::default();
            let mut player = Player::new(&config);
            for (negative, positive, vy) in inputs {
                player.vel.y = vy;
                step_player(&mut player, &TickInput { negative, positive }, &config);
                prop_assert!(player.trail.len() <= config.trail_capacity);
            }
        }

        #[test]
        fn prop_wrap_keeps_player_in_bounds(
            start_x in -40.0f32..600.0,
            inputs in proptest::collection::vec((any::<bool>(), any::<bool>()), 1..100)
        ) {
            let config = PlayfieldConfig::default();
            let mut player = Player::new(&config);
            player.pos.x = start_x;
            for (negative, positive) in inputs {
                step_player(&mut player, &TickInput { negative, positive }, &config);
                prop_assert!(player.pos.x + player.size.x >= 0.0 - config.player_speed);
                prop_assert!(player.pos.x <= config.free_extent());
            }
        }
    }
}
