//! Fixed-step simulation tick
//!
//! One call advances the session by exactly one step, whatever the host's
//! frame rate.

use super::config::Orientation;
use super::generator;
use super::physics::{collides, jump, step_player};
use super::state::{GameEvent, GameSession};
use crate::platform::input::InputState;

/// Steering for a single tick, already mapped onto the free axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Steer toward the low end of the free axis (Left / Up)
    pub negative: bool,
    /// Steer toward the high end of the free axis (Right / Down)
    pub positive: bool,
}

impl TickInput {
    /// Poll the key state through the orientation's key mapping
    pub fn poll(input: &impl InputState, orientation: Orientation) -> Self {
        let (negative, positive) = orientation.steering_keys();
        Self {
            negative: input.is_pressed(negative),
            positive: input.is_pressed(positive),
        }
    }
}

/// Advance the session by one step
pub fn tick(session: &mut GameSession, input: &TickInput) {
    if session.finished {
        return;
    }

    session.time_ticks += 1;

    let scroll = step_player(&mut session.player, input, &session.config);
    session.scroll_speed = scroll;
    generator::scroll(session, scroll);

    // Every qualifying platform fires; after the first bounce the player is
    // ascending, so later platforms in the same tick no longer qualify
    for i in 0..session.platforms.len() {
        if collides(&session.platforms[i], &session.player) {
            jump(&mut session.player, &session.config);
            session.push_event(GameEvent::Jump);
        }
    }

    generator::maintain(session);

    if session.scroll_speed > 0.0 {
        let gained = session.scroll_speed.floor() as u64;
        session.score += gained;
        let total = session.score;
        session.push_event(GameEvent::Score { gained, total });
    }

    if session.player.pos.y > session.config.fall_extent() {
        session.finished = true;
        let score = session.score;
        log::info!("Player fell out after {} ticks, score {}", session.time_ticks, score);
        session.push_event(GameEvent::GameOver { score });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::input::{Key, KeyState};
    use crate::sim::config::{PlayfieldConfig, Variant};
    use crate::sim::state::{Platform, PlatformColor};
    use glam::Vec2;
    use proptest::prelude::*;

    fn session(seed: u64) -> GameSession {
        GameSession::new(PlayfieldConfig::default(), seed)
    }

    #[test]
    fn test_poll_follows_orientation() {
        let mut keys = KeyState::new();
        keys.press(Key::Up);

        let vertical = TickInput::poll(&keys, Orientation::Vertical);
        assert_eq!(vertical, TickInput::default());

        let horizontal = TickInput::poll(&keys, Orientation::Horizontal);
        assert!(horizontal.negative);
        assert!(!horizontal.positive);
    }

    #[test]
    fn test_landing_emits_jump() {
        let mut state = session(7);
        state.platforms.clear();
        state.platforms.push(Platform::new(
            Vec2::new(250.0, 640.0),
            Vec2::new(100.0, 20.0),
            PlatformColor::Magenta,
        ));
        state.player.pos = Vec2::new(280.0, 598.0);
        state.player.vel.y = 4.0;

        tick(&mut state, &TickInput::default());

        assert_eq!(state.player.vel.y, state.config.jump_impulse);
        let events = state.drain_events();
        assert_eq!(events.iter().filter(|e| **e == GameEvent::Jump).count(), 1);
    }

    #[test]
    fn test_scroll_accumulates_floor_of_speed() {
        let mut state = session(7);
        state.player.pos.y = 402.0;
        state.player.vel.y = -12.7;

        tick(&mut state, &TickInput::default());

        // vel -12.2 after gravity, so 12 points
        assert_eq!(state.score, 12);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::Score {
            gained: 12,
            total: 12
        }));
    }

    #[test]
    fn test_falling_out_ends_session() {
        let mut state = session(7);
        state.platforms.clear();
        state.player.pos.y = 799.0;
        state.player.vel.y = 5.0;

        tick(&mut state, &TickInput::default());
        assert!(state.finished);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::GameOver { score: 0 }));

        // Frozen afterwards
        let ticks = state.time_ticks;
        let pos = state.player.pos;
        tick(&mut state, &TickInput::default());
        assert_eq!(state.time_ticks, ticks);
        assert_eq!(state.player.pos, pos);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_start_platform_catches_idle_player() {
        let mut state = session(3);
        let mut bounced = false;
        for _ in 0..120 {
            tick(&mut state, &TickInput::default());
            if state.drain_events().contains(&GameEvent::Jump) {
                bounced = true;
                break;
            }
        }
        assert!(bounced);
        assert!(!state.finished);
    }

    #[test]
    fn test_determinism() {
        let mut a = session(99999);
        let mut b = session(99999);
        let inputs = [
            TickInput {
                negative: true,
                positive: false,
            },
            TickInput::default(),
            TickInput {
                negative: false,
                positive: true,
            },
        ];

        for i in 0..600 {
            let input = &inputs[i % inputs.len()];
            tick(&mut a, input);
            tick(&mut b, input);
        }

        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.score, b.score);
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.platforms.len(), b.platforms.len());
    }

    fn input_strategy() -> impl Strategy<Value = Vec<(bool, bool)>> {
        proptest::collection::vec((any::<bool>(), any::<bool>()), 1..400)
    }

    proptest! {
        #[test]
        fn prop_platform_floor_holds(seed in any::<u64>(), inputs in input_strategy()) {
            let mut state = session(seed);
            prop_assert!(state.platforms.len() >= state.config.min_platforms);
            for (negative, positive) in inputs {
                tick(&mut state, &TickInput { negative, positive });
                if state.finished {
                    break;
                }
                prop_assert!(state.platforms.len() >= state.config.min_platforms);
            }
        }

        #[test]
        fn prop_score_never_decreases(seed in any::<u64>(), inputs in input_strategy()) {
            let mut state = session(seed);
            for (negative, positive) in inputs {
                let before = state.score;
                tick(&mut state, &TickInput { negative, positive });
                prop_assert!(state.score >= before);
            }
        }

        #[test]
        fn prop_runner_variant_holds_invariants(seed in any::<u64>(), inputs in input_strategy()) {
            let mut state = GameSession::new(Variant::Runner.config(), seed);
            for (negative, positive) in inputs {
                tick(&mut state, &TickInput { negative, positive });
                if state.finished {
                    break;
                }
                prop_assert!(state.platforms.len() >= state.config.min_platforms);
                prop_assert!(state.player.trail.len() <= state.config.trail_capacity);
            }
        }
    }
}
