//! Chord progression sequencer
//!
//! Plans one chord's worth of notes at a time. Pure data: the engine turns
//! the plan into graph nodes.

/// I-vi-IV-V in C major (C, Am, F, G)
pub const CHORD_PROGRESSION: [[f32; 3]; 4] = [
    [261.63, 329.63, 392.00],
    [220.00, 261.63, 329.63],
    [349.23, 440.00, 523.25],
    [392.00, 493.88, 587.33],
];

/// Bass roots for the progression (C, A, F, G)
pub const BASS_NOTES: [f32; 4] = [130.81, 110.00, 174.61, 196.00];

/// Chord tone index for each arp step
pub const ARP_PATTERN: [usize; 4] = [0, 2, 1, 2];

/// Arp notes per chord (half-beat spacing over four beats)
pub const ARP_STEPS: usize = 8;

pub const BEATS_PER_CHORD: f64 = 4.0;

/// Voice roles in the backing track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    Pad,
    Bass,
    Arp,
}

/// One note to schedule (times on the graph clock)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub voice: Voice,
    pub frequency: f32,
    pub start: f64,
    pub duration: f64,
}

impl Note {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Cycles through the progression, one chord per scheduling step
#[derive(Debug, Clone)]
pub struct Sequencer {
    current: usize,
    tempo_ms: f64,
}

impl Sequencer {
    pub fn new(tempo_ms: f64) -> Self {
        Self {
            current: 0,
            tempo_ms,
        }
    }

    /// Index of the chord the next step will play
    pub fn current_chord(&self) -> usize {
        self.current
    }

    pub fn tempo_ms(&self) -> f64 {
        self.tempo_ms
    }

    /// Seconds per beat
    pub fn beat(&self) -> f64 {
        self.tempo_ms / 1000.0
    }

    /// Seconds per chord
    pub fn chord_duration(&self) -> f64 {
        self.beat() * BEATS_PER_CHORD
    }

    /// Repeat period of the scheduling timer (ms)
    pub fn step_interval_ms(&self) -> f64 {
        self.tempo_ms * BEATS_PER_CHORD
    }

    /// Notes for the current chord starting at `now`
    pub fn plan_chord(&self, now: f64) -> Vec<Note> {
        let chord = CHORD_PROGRESSION[self.current];
        let bass = BASS_NOTES[self.current];
        let beat = self.beat();
        let mut notes = Vec::with_capacity(chord.len() + 2 + ARP_STEPS);

        for &frequency in &chord {
            notes.push(Note {
                voice: Voice::Pad,
                frequency,
                start: now,
                duration: self.chord_duration(),
            });
        }

        // Beats 1 and 3
        for beat_offset in [0.0, 2.0] {
            notes.push(Note {
                voice: Voice::Bass,
                frequency: bass,
                start: now + beat * beat_offset,
                duration: beat * 0.8,
            });
        }

        // One octave up, half-beat steps
        for i in 0..ARP_STEPS {
            let tone = ARP_PATTERN[i % ARP_PATTERN.len()];
            notes.push(Note {
                voice: Voice::Arp,
                frequency: chord[tone] * 2.0,
                start: now + beat * (i as f64 * 0.5),
                duration: beat * 0.4,
            });
        }

        notes
    }

    /// Move to the next chord, wrapping around the progression
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % CHORD_PROGRESSION.len();
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}
