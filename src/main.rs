//! Vapor Jump entry point
//!
//! The browser build is driven from JavaScript through `platform::web`.
//! Natively this is a headless runner: an autopilot plays the jumper against
//! the offline audio renderer and logs each run's score.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use vapor_jump::audio::{AudioEngine, OfflineGraph};
    use vapor_jump::game::{Game, GamePhase};
    use vapor_jump::persistence::JsonFileStore;
    use vapor_jump::platform::KeyState;
    use vapor_jump::settings::Settings;
    use vapor_jump::sim::{GameEvent, GameSession};

    /// Display callbacks per second of audio clock
    const FRAME_RATE: u32 = 60;
    const SAMPLE_RATE: u32 = 24_000;
    /// Don't steer when this close to the target (px)
    const DEADZONE: f32 = 6.0;

    /// Steer toward the nearest platform below the player
    fn steer(session: &GameSession, keys: &mut KeyState) {
        keys.clear();
        let player = &session.player;
        let target = session
            .platforms
            .iter()
            .filter(|p| p.top() >= player.bottom())
            .min_by(|a, b| a.top().total_cmp(&b.top()))
            .map(|p| p.pos.x + p.size.x / 2.0);
        let Some(target) = target else {
            return;
        };

        let center = player.center().x;
        let (negative, positive) = session.config.orientation.steering_keys();
        if target < center - DEADZONE {
            keys.press(negative);
        } else if target > center + DEADZONE {
            keys.press(positive);
        }
    }

    pub fn run(seed: u64, frames: u64) {
        let settings = Settings::default();
        let mut audio = AudioEngine::new(&settings);
        // init logs its own failure; the runner works without sound
        let _ = audio.init(OfflineGraph::new(SAMPLE_RATE));

        let store = JsonFileStore::in_temp_dir();
        log::info!("High score file: {}", store.path().display());

        let mut game = Game::new(settings, audio, store, seed);
        log::info!("Stored high score: {}", game.high_score());
        game.start();

        let samples_per_frame = (SAMPLE_RATE / FRAME_RATE) as usize;
        let mut keys = KeyState::new();
        let mut finished_runs: Vec<u64> = Vec::new();
        let mut sum_squares = 0.0f64;
        let mut sample_count = 0usize;

        for frame in 0..frames {
            if let Some(session) = game.session() {
                steer(session, &mut keys);
            }

            let now_ms = frame as f64 * 1000.0 / FRAME_RATE as f64;
            for event in game.frame(&keys, now_ms) {
                if let GameEvent::GameOver { score } = event {
                    log::info!("Run {} ended with {}", finished_runs.len() + 1, score);
                    finished_runs.push(score);
                }
            }

            if let Some(graph) = game.audio_mut().graph_mut() {
                let block = graph.render(samples_per_frame);
                sum_squares += block.iter().map(|s| (*s as f64) * (*s as f64)).sum::<f64>();
                sample_count += block.len();
            }

            if game.phase() == GamePhase::GameOver {
                game.restart();
            }
        }

        let best_run = finished_runs.iter().copied().max().unwrap_or(0);
        let level = if sample_count > 0 {
            (sum_squares / sample_count as f64).sqrt()
        } else {
            0.0
        };
        log::info!(
            "{} frames: {} finished runs, best {}, current {}, high score {}",
            frames,
            finished_runs.len(),
            best_run,
            game.score(),
            game.high_score()
        );
        log::info!("Audio output RMS {:.4} over {} samples", level, sample_count);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_arg(arg: Option<String>, name: &str, default: u64) -> u64 {
    match arg {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            log::warn!("Invalid {} {:?} ({}), using {}", name, raw, e, default);
            default
        }),
        None => default,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Vapor Jump (headless) starting...");

    let mut args = std::env::args().skip(1);
    let seed = parse_arg(args.next(), "seed", 0x5EED);
    let frames = parse_arg(args.next(), "frames", 60 * 60);
    headless::run(seed, frames);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_start, this is just to satisfy the compiler
}
