//! Synth voices and one-shot effects
//!
//! Each voice is a small oscillator -> filter -> envelope chain hung off a
//! bus. Envelopes are scheduled up front; nothing is touched after creation.

use super::AudioError;
use super::graph::{AudioGraph, Automation, FilterKind, Param, Waveform};
use super::sequencer::{Note, Voice};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Player bounced off a platform
    Jump,
    /// Player fell out
    GameOver,
}

/// Pitch sweep plus decaying gain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectShape {
    pub waveform: Waveform,
    pub freq_start: f32,
    pub freq_end: f32,
    pub sweep_secs: f64,
    pub gain_start: f32,
    pub gain_end: f32,
    pub decay_secs: f64,
    pub length_secs: f64,
}

impl SoundEffect {
    pub fn shape(&self) -> EffectShape {
        match self {
            // Short upward chirp
            SoundEffect::Jump => EffectShape {
                waveform: Waveform::Square,
                freq_start: 200.0,
                freq_end: 600.0,
                sweep_secs: 0.1,
                gain_start: 0.2,
                gain_end: 0.01,
                decay_secs: 0.15,
                length_secs: 0.15,
            },
            // Long downward slide
            SoundEffect::GameOver => EffectShape {
                waveform: Waveform::Sawtooth,
                freq_start: 400.0,
                freq_end: 100.0,
                sweep_secs: 0.5,
                gain_start: 0.3,
                gain_end: 0.01,
                decay_secs: 0.5,
                length_secs: 0.5,
            },
        }
    }
}

/// Master, music and effects gain nodes
#[derive(Debug, Clone)]
pub struct Buses<N> {
    pub master: N,
    pub music: N,
    pub effects: N,
}

impl<N: Clone> Buses<N> {
    /// master -> destination, music/effects -> master
    pub fn build<G: AudioGraph<Node = N>>(
        graph: &mut G,
        master_level: f32,
        music_level: f32,
        effects_level: f32,
    ) -> Result<Self, AudioError> {
        let master = graph.create_gain(master_level)?;
        let destination = graph.destination();
        graph.connect(&master, &destination)?;

        let music = graph.create_gain(music_level)?;
        graph.connect(&music, &master)?;

        let effects = graph.create_gain(effects_level)?;
        graph.connect(&effects, &master)?;

        Ok(Self {
            master,
            music,
            effects,
        })
    }
}

/// Filter settings and envelope stages for a music voice
struct Patch {
    waveform: Waveform,
    /// Detune ratios; one oscillator per entry
    detune: &'static [f32],
    cutoff: f32,
    q: f32,
}

const PAD: Patch = Patch {
    waveform: Waveform::Sawtooth,
    detune: &[1.0, 1.01],
    cutoff: 1500.0,
    q: 1.0,
};

const BASS: Patch = Patch {
    waveform: Waveform::Triangle,
    detune: &[1.0],
    cutoff: 300.0,
    q: 3.0,
};

const ARP: Patch = Patch {
    waveform: Waveform::Square,
    detune: &[1.0],
    cutoff: 2000.0,
    q: 2.0,
};

/// SetTarget stages (target, time, time constant) for a note
fn envelope(voice: Voice, start: f64, end: f64) -> Vec<(f32, f64, f64)> {
    match voice {
        // Slow swell and slow release across the whole chord
        Voice::Pad => vec![(0.15, start, 0.3), (0.0, end - 0.5, 0.3)],
        // Punchy attack, drop to a sustain, quick release
        Voice::Bass => vec![
            (0.3, start, 0.01),
            (0.1, start + 0.1, 0.1),
            (0.0, end - 0.05, 0.05),
        ],
        // Pluck
        Voice::Arp => vec![(0.08, start, 0.005), (0.0, end - 0.02, 0.02)],
    }
}

/// Build and schedule one backing-track note on `bus`
pub fn spawn_note<G: AudioGraph>(
    graph: &mut G,
    bus: &G::Node,
    note: &Note,
) -> Result<(), AudioError> {
    let patch = match note.voice {
        Voice::Pad => &PAD,
        Voice::Bass => &BASS,
        Voice::Arp => &ARP,
    };
    let end = note.end();

    let filter = graph.create_filter(FilterKind::LowPass, patch.cutoff, patch.q)?;
    let env = graph.create_gain(0.0)?;
    graph.connect(&filter, &env)?;
    graph.connect(&env, bus)?;

    for (target, time, time_constant) in envelope(note.voice, note.start, end) {
        graph.automate(
            &env,
            Param::Gain,
            Automation::SetTargetAtTime {
                target,
                time,
                time_constant,
            },
        )?;
    }

    let mut nodes = vec![filter.clone(), env.clone()];
    for ratio in patch.detune {
        let osc = graph.create_oscillator(patch.waveform, note.frequency * ratio)?;
        graph.connect(&osc, &filter)?;
        graph.start(&osc, note.start)?;
        graph.stop(&osc, end)?;
        nodes.push(osc);
    }

    graph.release(&nodes, end);
    Ok(())
}

/// Fire a one-shot effect on `bus` starting at `now`
pub fn spawn_effect<G: AudioGraph>(
    graph: &mut G,
    bus: &G::Node,
    effect: SoundEffect,
    now: f64,
) -> Result<(), AudioError> {
    let shape = effect.shape();

    let osc = graph.create_oscillator(shape.waveform, shape.freq_start)?;
    let gain = graph.create_gain(shape.gain_start)?;
    graph.connect(&osc, &gain)?;
    graph.connect(&gain, bus)?;

    graph.automate(
        &osc,
        Param::Frequency,
        Automation::SetValueAtTime {
            value: shape.freq_start,
            time: now,
        },
    )?;
    graph.automate(
        &osc,
        Param::Frequency,
        Automation::ExponentialRampToValueAtTime {
            value: shape.freq_end,
            time: now + shape.sweep_secs,
        },
    )?;
    graph.automate(
        &gain,
        Param::Gain,
        Automation::SetValueAtTime {
            value: shape.gain_start,
            time: now,
        },
    )?;
    graph.automate(
        &gain,
        Param::Gain,
        Automation::ExponentialRampToValueAtTime {
            value: shape.gain_end,
            time: now + shape.decay_secs,
        },
    )?;

    let end = now + shape.length_secs;
    graph.start(&osc, now)?;
    graph.stop(&osc, end)?;
    graph.release(&[osc, gain], end);
    Ok(())
}
