//! Audio output sink abstraction
//!
//! A graph of oscillators, filters and gain nodes sharing one timeline
//! clock, with Web Audio parameter automation semantics. The engine only
//! ever talks to this trait.

use super::AudioError;

/// Oscillator shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// Filter responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    LowPass,
}

/// Automatable node parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Gain node level
    Gain,
    /// Oscillator pitch or filter cutoff (Hz)
    Frequency,
    /// Filter resonance
    Q,
}

/// One automation event on a parameter timeline (times in graph seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Automation {
    SetValueAtTime { value: f32, time: f64 },
    LinearRampToValueAtTime { value: f32, time: f64 },
    /// Ramps to `value` exponentially; holds instead if either end is zero
    ExponentialRampToValueAtTime { value: f32, time: f64 },
    /// First-order approach toward `target` from `time` with `time_constant`
    SetTargetAtTime {
        target: f32,
        time: f64,
        time_constant: f64,
    },
    /// Drop every event at or after `time`
    CancelScheduledValues { time: f64 },
}

impl Automation {
    /// Time the event takes effect
    pub fn time(&self) -> f64 {
        match *self {
            Automation::SetValueAtTime { time, .. }
            | Automation::LinearRampToValueAtTime { time, .. }
            | Automation::ExponentialRampToValueAtTime { time, .. }
            | Automation::SetTargetAtTime { time, .. }
            | Automation::CancelScheduledValues { time } => time,
        }
    }
}

/// A node graph with its own playback clock
pub trait AudioGraph {
    /// Handle to a node in the graph
    type Node: Clone;

    /// Current time on the graph's clock (seconds)
    fn current_time(&self) -> f64;

    /// Final output node
    fn destination(&self) -> Self::Node;

    /// Wake a suspended context (browsers suspend until a user gesture)
    fn resume(&mut self) {}

    fn create_gain(&mut self, initial: f32) -> Result<Self::Node, AudioError>;

    fn create_oscillator(
        &mut self,
        waveform: Waveform,
        frequency: f32,
    ) -> Result<Self::Node, AudioError>;

    fn create_filter(
        &mut self,
        kind: FilterKind,
        frequency: f32,
        q: f32,
    ) -> Result<Self::Node, AudioError>;

    fn connect(&mut self, from: &Self::Node, to: &Self::Node) -> Result<(), AudioError>;

    fn automate(
        &mut self,
        node: &Self::Node,
        param: Param,
        event: Automation,
    ) -> Result<(), AudioError>;

    /// Start an oscillator at `when`
    fn start(&mut self, node: &Self::Node, when: f64) -> Result<(), AudioError>;

    /// Stop an oscillator at `when`
    fn stop(&mut self, node: &Self::Node, when: f64) -> Result<(), AudioError>;

    /// Hint that `nodes` are finished once the clock passes `after`
    fn release(&mut self, _nodes: &[Self::Node], _after: f64) {}
}
