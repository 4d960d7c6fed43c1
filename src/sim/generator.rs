//! Procedural platform generation
//!
//! Keeps a bounded window of platforms ahead of the player, recycling the
//! ones that scroll out behind.

use glam::Vec2;
use rand::Rng;

use super::state::{GameSession, Platform, PlatformColor};
use crate::consts::{FIRST_PLATFORM_OFFSET, START_PLATFORM_OFFSET};

/// Lay out the opening platforms plus the one under the player's start
pub fn spawn_initial(session: &mut GameSession) {
    let fall_extent = session.config.fall_extent();
    let gap = session.config.platform_gap;

    session.platforms.clear();
    for i in 0..session.config.initial_platforms {
        let x = random_cross_position(session);
        let y = fall_extent - i as f32 * gap - FIRST_PLATFORM_OFFSET;
        let color = PlatformColor::random(&mut session.rng);
        session
            .platforms
            .push(Platform::new(Vec2::new(x, y), session.config.platform_size(), color));
    }

    // Guaranteed start platform, centered under the spawn point
    let start_x = session.config.free_extent() / 2.0 - session.config.platform_width / 2.0;
    let color = PlatformColor::random(&mut session.rng);
    session.platforms.push(Platform::new(
        Vec2::new(start_x, fall_extent - START_PLATFORM_OFFSET),
        session.config.platform_size(),
        color,
    ));

    top_up(session);
}

/// Move every platform with the world
pub fn scroll(session: &mut GameSession, speed: f32) {
    if speed == 0.0 {
        return;
    }
    for platform in &mut session.platforms {
        platform.pos.y += speed;
    }
}

/// Recycle platforms past the trailing margin, then refill to the minimum
pub fn maintain(session: &mut GameSession) {
    let limit = session.config.fall_extent() + session.config.despawn_margin;
    session.platforms.retain(|p| p.pos.y < limit);
    top_up(session);
}

fn top_up(session: &mut GameSession) {
    while session.platforms.len() < session.config.min_platforms {
        let y = leading_edge(session) - session.config.platform_gap;
        let x = random_cross_position(session);
        let color = PlatformColor::random(&mut session.rng);
        let platform = Platform::new(Vec2::new(x, y), session.config.platform_size(), color);

        if session.config.orientation.prepends_platforms() {
            session.platforms.insert(0, platform);
        } else {
            session.platforms.push(platform);
        }
    }
}

/// Fall-axis position of the platform furthest ahead
fn leading_edge(session: &GameSession) -> f32 {
    session
        .platforms
        .iter()
        .map(|p| p.pos.y)
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(session.config.fall_extent())
}

/// Uniform position on the free axis that keeps the platform on screen
fn random_cross_position(session: &mut GameSession) -> f32 {
    let max = session.config.free_extent() - session.config.platform_width;
    session.rng.random_range(0.0..max)
}
