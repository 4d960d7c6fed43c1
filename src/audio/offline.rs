//! Offline software renderer for the audio graph
//!
//! Runs the same node graph the browser would, one sample at a time, on a
//! sample clock that only moves when rendered. Used by the native runner and
//! by tests that need to listen to a bus in isolation.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::f64::consts::TAU;

use super::AudioError;
use super::graph::{AudioGraph, Automation, FilterKind, Param, Waveform};

/// Handle to a node in an [`OfflineGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// Automation timeline for one parameter
#[derive(Debug, Clone)]
pub struct Timeline {
    default: f32,
    /// Sorted by time; equal times keep insertion order
    events: Vec<Automation>,
}

impl Timeline {
    pub fn new(default: f32) -> Self {
        Self {
            default,
            events: Vec::new(),
        }
    }

    pub fn insert(&mut self, event: Automation) {
        match event {
            Automation::CancelScheduledValues { time } => {
                self.events.retain(|e| e.time() < time);
            }
            _ => {
                let idx = self.events.partition_point(|e| e.time() <= event.time());
                self.events.insert(idx, event);
            }
        }
    }

    /// Parameter value at time `t`
    pub fn value_at(&self, t: f64) -> f32 {
        // Value and time of the last event that has taken effect, plus the
        // curve it started if it was a SetTarget
        let mut value = self.default;
        let mut anchor = 0.0;
        let mut target: Option<(f32, f64)> = None;

        for event in &self.events {
            let time = event.time();
            if time > t {
                return match *event {
                    Automation::LinearRampToValueAtTime { value: end, time: end_t } => {
                        let start = approach(value, anchor, target, anchor);
                        if end_t <= anchor {
                            return end;
                        }
                        let frac = ((t - anchor) / (end_t - anchor)) as f32;
                        start + (end - start) * frac
                    }
                    Automation::ExponentialRampToValueAtTime { value: end, time: end_t } => {
                        let start = approach(value, anchor, target, anchor);
                        if end_t <= anchor {
                            return end;
                        }
                        if start * end <= 0.0 {
                            return start;
                        }
                        let frac = (t - anchor) / (end_t - anchor);
                        start * (end / start).powf(frac as f32)
                    }
                    _ => approach(value, anchor, target, t),
                };
            }

            match *event {
                Automation::SetValueAtTime { value: v, .. }
                | Automation::LinearRampToValueAtTime { value: v, .. }
                | Automation::ExponentialRampToValueAtTime { value: v, .. } => {
                    value = v;
                    target = None;
                }
                Automation::SetTargetAtTime {
                    target: goal,
                    time_constant,
                    ..
                } => {
                    value = approach(value, anchor, target, time);
                    target = Some((goal, time_constant));
                }
                Automation::CancelScheduledValues { .. } => {}
            }
            anchor = time;
        }

        approach(value, anchor, target, t)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Follow a SetTarget curve (or hold) from `anchor` to `t`
fn approach(value: f32, anchor: f64, target: Option<(f32, f64)>, t: f64) -> f32 {
    match target {
        Some((goal, tc)) if tc > 0.0 => {
            let k = (-(t - anchor) / tc).exp() as f32;
            goal + (value - goal) * k
        }
        Some((goal, _)) => goal,
        None => value,
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Destination,
    Gain {
        gain: Timeline,
    },
    Oscillator {
        waveform: Waveform,
        frequency: Timeline,
        phase: f64,
        start: Option<f64>,
        stop: Option<f64>,
    },
    Filter {
        kind: FilterKind,
        frequency: Timeline,
        q: Timeline,
        s1: f32,
        s2: f32,
    },
}

impl NodeKind {
    fn name(&self) -> &'static str {
        match self {
            NodeKind::Destination => "destination",
            NodeKind::Gain { .. } => "gain",
            NodeKind::Oscillator { .. } => "oscillator",
            NodeKind::Filter { .. } => "filter",
        }
    }

    fn timeline_mut(&mut self, param: Param) -> Option<&mut Timeline> {
        match (self, param) {
            (NodeKind::Gain { gain }, Param::Gain) => Some(gain),
            (NodeKind::Oscillator { frequency, .. }, Param::Frequency) => Some(frequency),
            (NodeKind::Filter { frequency, .. }, Param::Frequency) => Some(frequency),
            (NodeKind::Filter { q, .. }, Param::Q) => Some(q),
            _ => None,
        }
    }

    fn timeline(&self, param: Param) -> Option<&Timeline> {
        match (self, param) {
            (NodeKind::Gain { gain }, Param::Gain) => Some(gain),
            (NodeKind::Oscillator { frequency, .. }, Param::Frequency) => Some(frequency),
            (NodeKind::Filter { frequency, .. }, Param::Frequency) => Some(frequency),
            (NodeKind::Filter { q, .. }, Param::Q) => Some(q),
            _ => None,
        }
    }

    fn process(&mut self, input: f32, t: f64, sample_rate: f64) -> f32 {
        match self {
            NodeKind::Destination => input,
            NodeKind::Gain { gain } => input * gain.value_at(t),
            NodeKind::Oscillator {
                waveform,
                frequency,
                phase,
                start,
                stop,
            } => {
                let running = start.is_some_and(|s| t >= s) && !stop.is_some_and(|s| t >= s);
                if !running {
                    return 0.0;
                }
                let out = sample_waveform(*waveform, *phase);
                *phase += frequency.value_at(t) as f64 / sample_rate;
                *phase -= phase.floor();
                out
            }
            NodeKind::Filter {
                kind,
                frequency,
                q,
                s1,
                s2,
            } => {
                let (b0, b1, b2, a1, a2) =
                    biquad_coefficients(*kind, frequency.value_at(t), q.value_at(t), sample_rate);
                // Transposed direct form II
                let y = b0 * input + *s1;
                *s1 = b1 * input - a1 * y + *s2;
                *s2 = b2 * input - a2 * y;
                y
            }
        }
    }
}

fn sample_waveform(waveform: Waveform, phase: f64) -> f32 {
    let p = phase as f32;
    match waveform {
        Waveform::Sine => (phase * TAU).sin() as f32,
        Waveform::Square => {
            if p < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        Waveform::Sawtooth => 2.0 * p - 1.0,
        Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
    }
}

/// RBJ cookbook coefficients, normalized by a0
fn biquad_coefficients(
    kind: FilterKind,
    cutoff: f32,
    q: f32,
    sample_rate: f64,
) -> (f32, f32, f32, f32, f32) {
    let nyquist = sample_rate / 2.0;
    let cutoff = (cutoff as f64).clamp(10.0, nyquist * 0.99);
    let q = (q as f64).max(1e-4);
    let w0 = TAU * cutoff / sample_rate;
    let (sin_w0, cos_w0) = w0.sin_cos();
    let alpha = sin_w0 / (2.0 * q);

    let (b0, b1, b2) = match kind {
        FilterKind::LowPass => ((1.0 - cos_w0) / 2.0, 1.0 - cos_w0, (1.0 - cos_w0) / 2.0),
    };
    let a0 = 1.0 + alpha;
    let a1 = -2.0 * cos_w0;
    let a2 = 1.0 - alpha;

    (
        (b0 / a0) as f32,
        (b1 / a0) as f32,
        (b2 / a0) as f32,
        (a1 / a0) as f32,
        (a2 / a0) as f32,
    )
}

#[derive(Debug, Clone)]
struct OfflineNode {
    kind: NodeKind,
    inputs: Vec<NodeId>,
    release_at: Option<f64>,
}

/// Output of a render call
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    /// Destination signal
    pub output: Vec<f32>,
    /// Captured output of each requested tap, in request order
    pub taps: Vec<Vec<f32>>,
}

/// Deterministic software audio graph
#[derive(Debug, Clone)]
pub struct OfflineGraph {
    sample_rate: u32,
    frame: u64,
    next_id: u32,
    nodes: BTreeMap<NodeId, OfflineNode>,
    destination: NodeId,
}

impl OfflineGraph {
    pub fn new(sample_rate: u32) -> Self {
        let destination = NodeId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            destination,
            OfflineNode {
                kind: NodeKind::Destination,
                inputs: Vec::new(),
                release_at: None,
            },
        );
        Self {
            sample_rate,
            frame: 0,
            next_id: 1,
            nodes,
            destination,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Live nodes, destination included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    /// Scheduled value of a parameter at the current clock
    pub fn param_value(&self, node: NodeId, param: Param) -> Option<f32> {
        self.param_value_at(node, param, self.current_time())
    }

    pub fn param_value_at(&self, node: NodeId, param: Param, time: f64) -> Option<f32> {
        self.nodes
            .get(&node)
            .and_then(|n| n.kind.timeline(param))
            .map(|timeline| timeline.value_at(time))
    }

    /// Scheduled stop time of an oscillator
    pub fn stop_time(&self, node: NodeId) -> Option<f64> {
        match self.nodes.get(&node).map(|n| &n.kind) {
            Some(NodeKind::Oscillator { stop, .. }) => *stop,
            _ => None,
        }
    }

    /// Advance the clock without keeping the output
    pub fn advance(&mut self, seconds: f64) {
        let frames = (seconds * self.sample_rate as f64).round() as usize;
        self.render(frames);
    }

    /// Render the destination signal for `frames` samples
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        self.render_taps(frames, &[]).output
    }

    /// Render the destination and capture the output of `taps` alongside
    ///
    /// Unknown taps come back silent.
    pub fn render_taps(&mut self, frames: usize, taps: &[NodeId]) -> Rendered {
        let order = self.evaluation_order(taps);
        let index: HashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let input_idx: Vec<Vec<usize>> = order
            .iter()
            .map(|id| {
                self.nodes
                    .get(id)
                    .map(|n| n.inputs.iter().filter_map(|i| index.get(i).copied()).collect())
                    .unwrap_or_default()
            })
            .collect();
        let dest_idx = index.get(&self.destination).copied();
        let tap_idx: Vec<Option<usize>> = taps.iter().map(|t| index.get(t).copied()).collect();

        let sample_rate = self.sample_rate as f64;
        let mut values = vec![0.0f32; order.len()];
        let mut rendered = Rendered {
            output: Vec::with_capacity(frames),
            taps: vec![Vec::with_capacity(frames); taps.len()],
        };

        for n in 0..frames {
            let t = (self.frame + n as u64) as f64 / sample_rate;
            for (i, id) in order.iter().enumerate() {
                let input: f32 = input_idx[i].iter().map(|&j| values[j]).sum();
                values[i] = match self.nodes.get_mut(id) {
                    Some(node) => node.kind.process(input, t, sample_rate),
                    None => 0.0,
                };
            }
            rendered
                .output
                .push(dest_idx.map(|i| values[i]).unwrap_or(0.0));
            for (tap, idx) in rendered.taps.iter_mut().zip(&tap_idx) {
                tap.push(idx.map(|i| values[i]).unwrap_or(0.0));
            }
        }

        self.frame += frames as u64;
        self.collect();
        rendered
    }

    /// Upstream-first order covering the destination and the taps
    fn evaluation_order(&self, taps: &[NodeId]) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();
        let roots = std::iter::once(self.destination).chain(taps.iter().copied());
        for root in roots {
            self.visit(root, &mut visited, &mut order);
        }
        order
    }

    fn visit(&self, id: NodeId, visited: &mut HashSet<NodeId>, order: &mut Vec<NodeId>) {
        if !visited.insert(id) {
            return;
        }
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        for input in &node.inputs {
            self.visit(*input, visited, order);
        }
        order.push(id);
    }

    /// Drop released voices and oscillators that have stopped for good
    fn collect(&mut self) {
        let now = self.current_time();
        let dead: HashSet<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, node)| {
                node.release_at.is_some_and(|at| at <= now)
                    || matches!(node.kind, NodeKind::Oscillator { stop: Some(stop), .. } if stop <= now)
            })
            .map(|(id, _)| *id)
            .collect();
        if dead.is_empty() {
            return;
        }

        self.nodes.retain(|id, _| !dead.contains(id));
        for node in self.nodes.values_mut() {
            node.inputs.retain(|i| !dead.contains(i));
        }
    }

    /// True if `candidate` feeds into `node`, directly or not
    fn is_upstream(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut stack = vec![node];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == candidate {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(n) = self.nodes.get(&id) {
                stack.extend(n.inputs.iter().copied());
            }
        }
        false
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            OfflineNode {
                kind,
                inputs: Vec::new(),
                release_at: None,
            },
        );
        id
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut OfflineNode, AudioError> {
        self.nodes.get_mut(&id).ok_or(AudioError::UnknownNode)
    }
}

impl AudioGraph for OfflineGraph {
    type Node = NodeId;

    fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    fn destination(&self) -> NodeId {
        self.destination
    }

    fn create_gain(&mut self, initial: f32) -> Result<NodeId, AudioError> {
        Ok(self.insert(NodeKind::Gain {
            gain: Timeline::new(initial),
        }))
    }

    fn create_oscillator(&mut self, waveform: Waveform, frequency: f32) -> Result<NodeId, AudioError> {
        Ok(self.insert(NodeKind::Oscillator {
            waveform,
            frequency: Timeline::new(frequency),
            phase: 0.0,
            start: None,
            stop: None,
        }))
    }

    fn create_filter(&mut self, kind: FilterKind, frequency: f32, q: f32) -> Result<NodeId, AudioError> {
        Ok(self.insert(NodeKind::Filter {
            kind,
            frequency: Timeline::new(frequency),
            q: Timeline::new(q),
            s1: 0.0,
            s2: 0.0,
        }))
    }

    fn connect(&mut self, from: &NodeId, to: &NodeId) -> Result<(), AudioError> {
        if !self.contains(*from) || !self.contains(*to) {
            return Err(AudioError::UnknownNode);
        }
        // from -> to closes a loop if `to` already feeds `from` (or is `from`)
        if self.is_upstream(*to, *from) {
            return Err(AudioError::Cycle);
        }
        let node = self.node_mut(*to)?;
        if !node.inputs.contains(from) {
            node.inputs.push(*from);
        }
        Ok(())
    }

    fn automate(&mut self, node: &NodeId, param: Param, event: Automation) -> Result<(), AudioError> {
        let node = self.node_mut(*node)?;
        let name = node.kind.name();
        let timeline = node
            .kind
            .timeline_mut(param)
            .ok_or(AudioError::UnsupportedParam { node: name, param })?;
        timeline.insert(event);
        Ok(())
    }

    fn start(&mut self, node: &NodeId, when: f64) -> Result<(), AudioError> {
        match &mut self.node_mut(*node)?.kind {
            NodeKind::Oscillator { start, .. } => {
                *start = Some(when);
                Ok(())
            }
            _ => Err(AudioError::NotASource),
        }
    }

    fn stop(&mut self, node: &NodeId, when: f64) -> Result<(), AudioError> {
        match &mut self.node_mut(*node)?.kind {
            NodeKind::Oscillator { stop, .. } => {
                *stop = Some(when);
                Ok(())
            }
            _ => Err(AudioError::NotASource),
        }
    }

    fn release(&mut self, nodes: &[NodeId], after: f64) {
        for id in nodes {
            if let Some(node) = self.nodes.get_mut(id) {
                node.release_at = Some(after);
            }
        }
    }
}

/// Root-mean-square level of a block
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}
