//! `OfflineAudioContext`-backed engine
//!
//! Builds the requested chain with `web-sys` Web Audio nodes and bridges the
//! context's `oncomplete` event into a one-shot channel.

use futures::channel::oneshot;
use std::cell::Cell;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AudioBuffer, AudioContextState, AudioNode, AudioScheduledSourceNode,
    OfflineAudioCompletionEvent, OfflineAudioContext, OscillatorType,
};

use super::{
    AudioEngine, CompressorSpec, ContextState, NodeSpec, OscillatorSpec, RenderCompletion,
    RenderContext, RenderRequest, SampleBuffer, Waveform,
};
use crate::error::{FingerprintError, Result};

/// Engine that renders through the browser's `OfflineAudioContext`
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineEngine;

impl AudioEngine for OfflineEngine {
    type Context = OfflineContext;

    fn create_context(&self, request: &RenderRequest) -> Result<OfflineContext> {
        OfflineContext::new(request)
    }
}

/// One `OfflineAudioContext` with its graph wired and sources started
pub struct OfflineContext {
    context: OfflineAudioContext,
    completion: Option<RenderCompletion>,
    start_calls: Cell<u32>,
}

impl OfflineContext {
    pub fn new(request: &RenderRequest) -> Result<Self> {
        request.validate()?;

        let context = OfflineAudioContext::new_with_number_of_channels_and_length_and_sample_rate(
            request.channels,
            request.length,
            request.sample_rate,
        )
        .map_err(FingerprintError::engine)?;

        let mut upstream: Option<AudioNode> = None;
        let mut sources: Vec<AudioScheduledSourceNode> = Vec::new();

        for spec in &request.chain {
            let node: AudioNode = match spec {
                NodeSpec::Oscillator(osc) => {
                    let node = build_oscillator(&context, osc)?;
                    sources.push(node.clone().into());
                    node.into()
                }
                NodeSpec::Compressor(comp) => build_compressor(&context, comp)?,
                NodeSpec::BufferSource { samples } => {
                    let node = build_buffer_source(&context, samples, request.sample_rate)?;
                    sources.push(node.clone().into());
                    node.into()
                }
            };
            if let Some(previous) = &upstream {
                previous
                    .connect_with_audio_node(&node)
                    .map_err(FingerprintError::engine)?;
            }
            upstream = Some(node);
        }

        if let Some(last) = &upstream {
            last.connect_with_audio_node(&context.destination())
                .map_err(FingerprintError::engine)?;
        }

        for source in &sources {
            source.start().map_err(FingerprintError::engine)?;
        }

        let (tx, rx) = oneshot::channel();
        let on_complete = Closure::once_into_js(move |event: OfflineAudioCompletionEvent| {
            let delivered = read_buffer(&event.rendered_buffer());
            if tx.send(delivered).is_err() {
                log::debug!("Offline render finished after its job was abandoned");
            }
        });
        context.set_oncomplete(Some(on_complete.unchecked_ref()));

        log::debug!(
            "🎛️ OfflineAudioContext ready: {} node(s), {}x{} @ {}Hz",
            request.chain.len(),
            request.channels,
            request.length,
            request.sample_rate
        );

        Ok(Self {
            context,
            completion: Some(rx),
            start_calls: Cell::new(0),
        })
    }

    /// Number of `startRendering()` calls issued so far
    pub fn start_calls(&self) -> u32 {
        self.start_calls.get()
    }
}

impl RenderContext for OfflineContext {
    fn start_rendering(&self) -> Result<()> {
        let promise = self
            .context
            .start_rendering()
            .map_err(FingerprintError::engine)?;
        self.start_calls.set(self.start_calls.get() + 1);

        // Calling startRendering() again on a suspended context rejects in
        // some browsers. The state check right after decides what happens.
        let on_reject = Closure::wrap(Box::new(|reason: JsValue| {
            log::debug!("startRendering() rejected: {:?}", reason);
        }) as Box<dyn FnMut(JsValue)>);
        let _ = promise.catch(&on_reject);
        on_reject.forget();

        Ok(())
    }

    fn state(&self) -> ContextState {
        match self.context.state() {
            AudioContextState::Running => ContextState::Running,
            AudioContextState::Closed => ContextState::Closed,
            _ => ContextState::Suspended,
        }
    }

    fn take_completion(&mut self) -> Option<RenderCompletion> {
        self.completion.take()
    }
}

fn oscillator_type(waveform: Waveform) -> OscillatorType {
    match waveform {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Square => OscillatorType::Square,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
        Waveform::Triangle => OscillatorType::Triangle,
    }
}

fn build_oscillator(
    context: &OfflineAudioContext,
    spec: &OscillatorSpec,
) -> Result<web_sys::OscillatorNode> {
    let node = context
        .create_oscillator()
        .map_err(FingerprintError::engine)?;
    node.set_type(oscillator_type(spec.waveform));
    node.frequency().set_value(spec.frequency);
    Ok(node)
}

fn build_compressor(context: &OfflineAudioContext, spec: &CompressorSpec) -> Result<AudioNode> {
    let node = context
        .create_dynamics_compressor()
        .map_err(FingerprintError::engine)?;
    node.threshold().set_value(spec.threshold);
    node.knee().set_value(spec.knee);
    node.ratio().set_value(spec.ratio);
    node.attack().set_value(spec.attack);
    node.release().set_value(spec.release);
    Ok(node.into())
}

fn build_buffer_source(
    context: &OfflineAudioContext,
    samples: &[f32],
    sample_rate: f32,
) -> Result<web_sys::AudioBufferSourceNode> {
    let buffer = context
        .create_buffer(1, samples.len() as u32, sample_rate)
        .map_err(FingerprintError::engine)?;
    let mut data = samples.to_vec();
    buffer
        .copy_to_channel(&mut data, 0)
        .map_err(FingerprintError::engine)?;

    let node = context
        .create_buffer_source()
        .map_err(FingerprintError::engine)?;
    node.set_buffer(Some(&buffer));
    Ok(node)
}

fn read_buffer(buffer: &AudioBuffer) -> Result<SampleBuffer> {
    let channels = (0..buffer.number_of_channels())
        .map(|channel| {
            buffer
                .get_channel_data(channel)
                .map_err(FingerprintError::engine)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SampleBuffer::new(buffer.sample_rate(), channels))
}
