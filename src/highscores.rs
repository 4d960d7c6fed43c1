//! Best score record
//!
//! Persisted under a single key, loaded once and rewritten every time the
//! running score beats it.

use crate::persistence::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighScore {
    best: u64,
}

impl HighScore {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "vaporjump-highscore";

    /// Load from `store`; a missing or unreadable value counts as 0
    pub fn load(store: &impl KeyValueStore) -> Self {
        let best = store.get(Self::STORAGE_KEY).unwrap_or(0);
        log::info!("Loaded high score {}", best);
        Self { best }
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Raise the record to `score` if it beats it, persisting the new value
    ///
    /// Returns true when the record changed. A failed write is logged and the
    /// in-memory record still moves.
    pub fn record(&mut self, score: u64, store: &mut impl KeyValueStore) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        if let Err(e) = store.set(Self::STORAGE_KEY, score) {
            log::warn!("Failed to save high score {}: {}", score, e);
        }
        true
    }
}
