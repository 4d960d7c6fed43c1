//! Game settings and preferences
//!
//! Persisted as one JSON blob in the key-value store, separate from the
//! high score.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, StorageError};
use crate::sim::Variant;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Playfield preset
    pub variant: Variant,

    // === Audio ===
    /// Master bus level (0.0 - 1.0)
    pub master_volume: f32,
    /// Music bus level (0.0 - 1.0)
    pub music_volume: f32,
    /// Effects bus level (0.0 - 1.0)
    pub effects_volume: f32,
    /// Milliseconds per beat of the backing track
    pub tempo_ms: f64,
    /// Start with the master bus silenced
    pub start_muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variant: Variant::Jumper,
            master_volume: 0.5,
            music_volume: 0.3,
            effects_volume: 0.4,
            tempo_ms: 500.0,
            start_muted: false,
        }
    }
}

impl Settings {
    /// Storage key
    const STORAGE_KEY: &'static str = "vaporjump-settings";

    /// Settings for a preset with default audio
    pub fn for_variant(variant: Variant) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    /// Levels clamped to 0..=1 and a sane tempo
    pub fn sanitized(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self.effects_volume = self.effects_volume.clamp(0.0, 1.0);
        if !(self.tempo_ms.is_finite() && self.tempo_ms > 0.0) {
            self.tempo_ms = Self::default().tempo_ms;
        }
        self
    }

    /// Load from `store`, falling back to defaults
    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.read(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Settings>(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    return settings.sanitized();
                }
                Err(e) => log::warn!("Ignoring corrupt settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Failed to read settings: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<(), StorageError> {
        let json = serde_json::to_string(self)?;
        store.write(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_defaults_match_bus_levels() {
        let settings = Settings::default();
        assert_eq!(settings.master_volume, 0.5);
        assert_eq!(settings.music_volume, 0.3);
        assert_eq!(settings.effects_volume, 0.4);
        assert_eq!(settings.tempo_ms, 500.0);
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::for_variant(Variant::Corridor);
        settings.start_muted = true;
        settings.save(&mut store).unwrap();

        assert_eq!(Settings::load(&store), settings);
    }

    #[test]
    fn test_corrupt_falls_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.write(Settings::STORAGE_KEY, "{{{").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn test_partial_blob_fills_defaults() {
        let mut store = MemoryStore::new();
        store
            .write(Settings::STORAGE_KEY, r#"{"variant":"Runner","music_volume":7.0}"#)
            .unwrap();
        let settings = Settings::load(&store);
        assert_eq!(settings.variant, Variant::Runner);
        assert_eq!(settings.music_volume, 1.0);
        assert_eq!(settings.tempo_ms, 500.0);
    }
}
