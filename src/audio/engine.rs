//! Audio engine: buses, backing track and effects
//!
//! Owns the graph once it is available. Until then, or if the graph could
//! not be set up, every operation is a silent no-op so the game never has to
//! care whether sound works.

use super::AudioError;
use super::graph::{AudioGraph, Automation, Param};
use super::sequencer::Sequencer;
use super::timers::{TimerAction, TimerId, TimerQueue};
use super::voices::{self, Buses, SoundEffect};
use crate::settings::Settings;

/// Time constant of the mute fade (seconds)
const MUTE_FADE: f64 = 0.05;
/// Time constant of the music fade-out on stop (seconds)
const MUSIC_FADE: f64 = 0.3;
/// Delay before the music bus is put back to its nominal level (ms)
const MUSIC_RESTORE_MS: f64 = 500.0;

/// Nominal bus levels
#[derive(Debug, Clone, Copy, PartialEq)]
struct Levels {
    master: f32,
    music: f32,
    effects: f32,
}

struct Output<G: AudioGraph> {
    graph: G,
    buses: Buses<G::Node>,
}

pub struct AudioEngine<G: AudioGraph> {
    output: Option<Output<G>>,
    levels: Levels,
    sequencer: Sequencer,
    timers: TimerQueue,
    chord_timer: Option<TimerId>,
    playing: bool,
    muted: bool,
}

impl<G: AudioGraph> AudioEngine<G> {
    /// Silent engine configured from `settings`; call `init` to attach a graph
    pub fn new(settings: &Settings) -> Self {
        Self {
            output: None,
            levels: Levels {
                master: settings.master_volume,
                music: settings.music_volume,
                effects: settings.effects_volume,
            },
            sequencer: Sequencer::new(settings.tempo_ms),
            timers: TimerQueue::new(),
            chord_timer: None,
            playing: false,
            muted: settings.start_muted,
        }
    }

    /// Engine for hosts without audio output
    pub fn disabled() -> Self {
        Self::new(&Settings::default())
    }

    /// Build the bus hierarchy on `graph` and take ownership of it
    ///
    /// On failure the graph is dropped and the engine stays silent.
    pub fn init(&mut self, mut graph: G) -> Result<(), AudioError> {
        let master = if self.muted { 0.0 } else { self.levels.master };
        match Buses::build(&mut graph, master, self.levels.music, self.levels.effects) {
            Ok(buses) => {
                self.output = Some(Output { graph, buses });
                log::info!("Audio initialized");
                Ok(())
            }
            Err(e) => {
                log::warn!("Audio disabled: {}", e);
                Err(e)
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.output.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Chord the next scheduling step will play
    pub fn current_chord(&self) -> usize {
        self.sequencer.current_chord()
    }

    pub fn active_repeating_timers(&self) -> usize {
        self.timers.repeating()
    }

    pub fn graph(&self) -> Option<&G> {
        self.output.as_ref().map(|out| &out.graph)
    }

    pub fn graph_mut(&mut self) -> Option<&mut G> {
        self.output.as_mut().map(|out| &mut out.graph)
    }

    pub fn buses(&self) -> Option<&Buses<G::Node>> {
        self.output.as_ref().map(|out| &out.buses)
    }

    /// Run timers that are due at host time `now_ms`
    pub fn update(&mut self, now_ms: f64) {
        for action in self.timers.poll(now_ms) {
            match action {
                TimerAction::ScheduleChord => {
                    if self.playing {
                        self.schedule_chord();
                    }
                }
                TimerAction::RestoreMusicGain => self.restore_music_gain(),
            }
        }
    }

    /// Start the backing track; does nothing if it is already running
    pub fn start_music(&mut self) {
        if self.playing {
            return;
        }
        let Some(out) = self.output.as_mut() else {
            return;
        };
        out.graph.resume();
        self.playing = true;

        self.schedule_chord();
        self.chord_timer = Some(
            self.timers
                .set_interval(self.sequencer.step_interval_ms(), TimerAction::ScheduleChord),
        );
        log::info!("Music started");
    }

    /// Stop scheduling chords and fade the music bus out
    ///
    /// Notes already scheduled keep playing under the fade.
    pub fn stop_music(&mut self) {
        self.playing = false;
        if let Some(id) = self.chord_timer.take() {
            self.timers.cancel(id);
        }

        let Some(out) = self.output.as_mut() else {
            return;
        };
        let now = out.graph.current_time();
        let fade = Automation::SetTargetAtTime {
            target: 0.0,
            time: now,
            time_constant: MUSIC_FADE,
        };
        if let Err(e) = out.graph.automate(&out.buses.music, Param::Gain, fade) {
            log::warn!("Failed to fade out music: {}", e);
        }
        self.timers
            .set_timeout(MUSIC_RESTORE_MS, TimerAction::RestoreMusicGain);
        log::info!("Music stopped");
    }

    /// Fire a one-shot effect on the effects bus
    ///
    /// Scheduled even while muted; the master fade keeps it inaudible.
    pub fn play(&mut self, effect: SoundEffect) {
        let Some(out) = self.output.as_mut() else {
            return;
        };
        let now = out.graph.current_time();
        if let Err(e) = voices::spawn_effect(&mut out.graph, &out.buses.effects, effect, now) {
            log::debug!("Dropped {:?} effect: {}", effect, e);
        }
    }

    /// Flip mute and fade the master bus accordingly; returns the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.set_muted(!self.muted);
        self.muted
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        log::info!("Audio {}", if muted { "muted" } else { "unmuted" });

        let Some(out) = self.output.as_mut() else {
            return;
        };
        let target = if muted { 0.0 } else { self.levels.master };
        let fade = Automation::SetTargetAtTime {
            target,
            time: out.graph.current_time(),
            time_constant: MUTE_FADE,
        };
        if let Err(e) = out.graph.automate(&out.buses.master, Param::Gain, fade) {
            log::warn!("Failed to fade master bus: {}", e);
        }
    }

    /// Schedule the current chord at the graph's current time and advance
    fn schedule_chord(&mut self) {
        let Some(out) = self.output.as_mut() else {
            return;
        };
        let now = out.graph.current_time();
        let notes = self.sequencer.plan_chord(now);
        for note in &notes {
            if let Err(e) = voices::spawn_note(&mut out.graph, &out.buses.music, note) {
                log::debug!("Dropped {:?} note: {}", note.voice, e);
            }
        }
        log::debug!(
            "Scheduled chord {} at {:.3}s",
            self.sequencer.current_chord(),
            now
        );
        self.sequencer.advance();
    }

    /// Put the music bus back to its nominal level
    fn restore_music_gain(&mut self) {
        let Some(out) = self.output.as_mut() else {
            return;
        };
        let now = out.graph.current_time();
        let music = &out.buses.music;
        let result = out
            .graph
            .automate(music, Param::Gain, Automation::CancelScheduledValues { time: now })
            .and_then(|()| {
                out.graph.automate(
                    music,
                    Param::Gain,
                    Automation::SetValueAtTime {
                        value: self.levels.music,
                        time: now,
                    },
                )
            });
        if let Err(e) = result {
            log::warn!("Failed to restore music level: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::graph::{FilterKind, Waveform};
    use crate::audio::offline::{OfflineGraph, rms};

    const SR: u32 = 8000;

    fn engine() -> AudioEngine<OfflineGraph> {
        let mut engine = AudioEngine::new(&Settings::default());
        engine.init(OfflineGraph::new(SR)).unwrap();
        engine
    }

    /// A graph whose context never came up
    struct DeadGraph;

    impl AudioGraph for DeadGraph {
        type Node = ();

        fn current_time(&self) -> f64 {
            0.0
        }

        fn destination(&self) {}

        fn create_gain(&mut self, _initial: f32) -> Result<(), AudioError> {
            Err(AudioError::NodeCreation("gain"))
        }

        fn create_oscillator(&mut self, _w: Waveform, _f: f32) -> Result<(), AudioError> {
            Err(AudioError::NodeCreation("oscillator"))
        }

        fn create_filter(&mut self, _k: FilterKind, _f: f32, _q: f32) -> Result<(), AudioError> {
            Err(AudioError::NodeCreation("filter"))
        }

        fn connect(&mut self, _from: &(), _to: &()) -> Result<(), AudioError> {
            Ok(())
        }

        fn automate(&mut self, _n: &(), _p: Param, _e: Automation) -> Result<(), AudioError> {
            Ok(())
        }

        fn start(&mut self, _n: &(), _when: f64) -> Result<(), AudioError> {
            Ok(())
        }

        fn stop(&mut self, _n: &(), _when: f64) -> Result<(), AudioError> {
            Ok(())
        }
    }

    #[test]
    fn test_start_music_is_idempotent() {
        let mut engine = engine();
        engine.update(0.0);
        engine.start_music();
        let nodes = engine.graph().unwrap().node_count();
        engine.start_music();
        engine.start_music();

        assert!(engine.is_playing());
        assert_eq!(engine.active_repeating_timers(), 1);
        assert_eq!(engine.current_chord(), 1);
        assert_eq!(engine.graph().unwrap().node_count(), nodes);
    }

    #[test]
    fn test_chord_cycle_returns_to_start() {
        let mut engine = engine();
        engine.update(0.0);
        engine.start_music();
        engine.update(0.0);
        for step in 1..=3 {
            engine.update(step as f64 * 2000.0);
        }
        assert_eq!(engine.current_chord(), 0);
    }

    #[test]
    fn test_mute_then_jump() {
        let mut engine = engine();
        assert!(engine.toggle_mute());
        engine.play(SoundEffect::Jump);

        let effects = engine.buses().unwrap().effects;
        let graph = engine.graph_mut().unwrap();
        let rendered = graph.render_taps(1200, &[effects]);

        // The effect is there on its own bus
        assert!(rms(&rendered.taps[0]) > 0.01);

        // but the master fade keeps it out of the output
        let tail_tap = rms(&rendered.taps[0][800..]);
        let tail_out = rms(&rendered.output[800..]);
        assert!(tail_tap > 0.0);
        assert!(tail_out < tail_tap * 0.1);

        let master = engine.buses().unwrap().master;
        let level = engine.graph().unwrap().param_value(master, Param::Gain).unwrap();
        assert!(level < 0.05);
    }

    #[test]
    fn test_unmute_restores_master_level() {
        let mut engine = engine();
        engine.set_muted(true);
        engine.graph_mut().unwrap().advance(0.5);
        assert!(!engine.toggle_mute());
        engine.graph_mut().unwrap().advance(0.5);

        let master = engine.buses().unwrap().master;
        let level = engine.graph().unwrap().param_value(master, Param::Gain).unwrap();
        assert!((level - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_unavailable_audio_is_silent() {
        let mut engine: AudioEngine<DeadGraph> = AudioEngine::disabled();
        assert!(engine.init(DeadGraph).is_err());
        assert!(!engine.is_available());

        engine.start_music();
        engine.play(SoundEffect::Jump);
        engine.play(SoundEffect::GameOver);
        engine.update(10_000.0);
        engine.stop_music();

        assert!(!engine.is_playing());
        assert_eq!(engine.active_repeating_timers(), 0);
        assert_eq!(engine.current_chord(), 0);
        assert!(engine.toggle_mute());
    }

    #[test]
    fn test_stop_music_lets_notes_ring_out() {
        let mut engine = engine();
        engine.update(0.0);
        engine.start_music();
        engine.graph_mut().unwrap().advance(0.5);
        engine.update(500.0);

        engine.stop_music();
        engine.update(500.0);
        assert!(!engine.is_playing());
        assert_eq!(engine.active_repeating_timers(), 0);

        // Pads run for the whole chord, so they are still in the graph
        let music = engine.buses().unwrap().music;
        let graph = engine.graph_mut().unwrap();
        assert!(graph.node_count() > 4);
        let rendered = graph.render_taps(800, &[music]);
        assert!(rms(&rendered.taps[0]) > 0.0);
        let faded = graph.param_value(music, Param::Gain).unwrap();
        assert!(faded < 0.3);

        // Nominal level comes back after the restore delay
        engine.update(1000.0);
        let level = engine.graph().unwrap().param_value(music, Param::Gain).unwrap();
        assert!((level - 0.3).abs() < 1e-6);

        // No more chords get scheduled
        engine.update(10_000.0);
        assert_eq!(engine.current_chord(), 1);
    }

    #[test]
    fn test_first_frame_after_host_gap_adds_no_extra_chord() {
        let mut engine = engine();
        engine.update(0.0);
        engine.start_music();
        assert_eq!(engine.current_chord(), 1);

        // Page was throttled between start and the next frame
        engine.update(10_000.0);
        assert_eq!(engine.current_chord(), 1);

        engine.update(12_000.0);
        assert_eq!(engine.current_chord(), 2);
    }

    #[test]
    fn test_start_muted_setting() {
        let settings = Settings {
            start_muted: true,
            ..Settings::default()
        };
        let mut engine = AudioEngine::new(&settings);
        engine.init(OfflineGraph::new(SR)).unwrap();

        assert!(engine.is_muted());
        let master = engine.buses().unwrap().master;
        assert_eq!(engine.graph().unwrap().param_value(master, Param::Gain), Some(0.0));
    }
}
