//! Web Audio backend (wasm32)

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    AudioContext, AudioContextState, AudioNode, AudioParam, AudioScheduledSourceNode,
    BiquadFilterNode, BiquadFilterType, GainNode, OscillatorNode, OscillatorType,
};

use super::AudioError;
use super::graph::{AudioGraph, Automation, FilterKind, Param, Waveform};

/// [`AudioGraph`] over a browser `AudioContext`
///
/// Finished nodes are left to the browser's garbage collector.
pub struct WebAudioGraph {
    ctx: AudioContext,
}

impl WebAudioGraph {
    /// Create the context (may fail outside a secure context)
    pub fn new() -> Result<Self, AudioError> {
        let ctx = AudioContext::new().map_err(|e| AudioError::Unavailable(format!("{:?}", e)))?;
        Ok(Self { ctx })
    }
}

fn scheduling(e: JsValue) -> AudioError {
    AudioError::Scheduling(format!("{:?}", e))
}

fn oscillator_type(waveform: Waveform) -> OscillatorType {
    match waveform {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Square => OscillatorType::Square,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
        Waveform::Triangle => OscillatorType::Triangle,
    }
}

fn audio_param(node: &AudioNode, param: Param) -> Result<AudioParam, AudioError> {
    let found = match param {
        Param::Gain => node.dyn_ref::<GainNode>().map(|g| g.gain()),
        Param::Frequency => node
            .dyn_ref::<OscillatorNode>()
            .map(|o| o.frequency())
            .or_else(|| node.dyn_ref::<BiquadFilterNode>().map(|f| f.frequency())),
        Param::Q => node.dyn_ref::<BiquadFilterNode>().map(|f| f.q()),
    };
    found.ok_or(AudioError::UnsupportedParam {
        node: "web audio",
        param,
    })
}

fn source(node: &AudioNode) -> Result<&AudioScheduledSourceNode, AudioError> {
    node.dyn_ref::<AudioScheduledSourceNode>()
        .ok_or(AudioError::NotASource)
}

impl AudioGraph for WebAudioGraph {
    type Node = AudioNode;

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn destination(&self) -> AudioNode {
        self.ctx.destination().into()
    }

    fn resume(&mut self) {
        // Browsers keep the context suspended until a user gesture
        if self.ctx.state() == AudioContextState::Suspended {
            if let Err(e) = self.ctx.resume() {
                log::warn!("Failed to resume AudioContext: {:?}", e);
            }
        }
    }

    fn create_gain(&mut self, initial: f32) -> Result<AudioNode, AudioError> {
        let gain = self
            .ctx
            .create_gain()
            .map_err(|_| AudioError::NodeCreation("gain"))?;
        gain.gain().set_value(initial);
        Ok(gain.into())
    }

    fn create_oscillator(
        &mut self,
        waveform: Waveform,
        frequency: f32,
    ) -> Result<AudioNode, AudioError> {
        let osc = self
            .ctx
            .create_oscillator()
            .map_err(|_| AudioError::NodeCreation("oscillator"))?;
        osc.set_type(oscillator_type(waveform));
        osc.frequency().set_value(frequency);
        Ok(osc.into())
    }

    fn create_filter(
        &mut self,
        kind: FilterKind,
        frequency: f32,
        q: f32,
    ) -> Result<AudioNode, AudioError> {
        let filter = self
            .ctx
            .create_biquad_filter()
            .map_err(|_| AudioError::NodeCreation("filter"))?;
        filter.set_type(match kind {
            FilterKind::LowPass => BiquadFilterType::Lowpass,
        });
        filter.frequency().set_value(frequency);
        filter.q().set_value(q);
        Ok(filter.into())
    }

    fn connect(&mut self, from: &AudioNode, to: &AudioNode) -> Result<(), AudioError> {
        from.connect_with_audio_node(to)
            .map(|_| ())
            .map_err(scheduling)
    }

    fn automate(
        &mut self,
        node: &AudioNode,
        param: Param,
        event: Automation,
    ) -> Result<(), AudioError> {
        let p = audio_param(node, param)?;
        let result = match event {
            Automation::SetValueAtTime { value, time } => p.set_value_at_time(value, time),
            Automation::LinearRampToValueAtTime { value, time } => {
                p.linear_ramp_to_value_at_time(value, time)
            }
            Automation::ExponentialRampToValueAtTime { value, time } => {
                p.exponential_ramp_to_value_at_time(value, time)
            }
            Automation::SetTargetAtTime {
                target,
                time,
                time_constant,
            } => p.set_target_at_time(target, time, time_constant as f32),
            Automation::CancelScheduledValues { time } => p.cancel_scheduled_values(time),
        };
        result.map(|_| ()).map_err(scheduling)
    }

    fn start(&mut self, node: &AudioNode, when: f64) -> Result<(), AudioError> {
        source(node)?.start_with_when(when).map_err(scheduling)
    }

    fn stop(&mut self, node: &AudioNode, when: f64) -> Result<(), AudioError> {
        source(node)?.stop_with_when(when).map_err(scheduling)
    }
}
