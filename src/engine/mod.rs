//! Audio rendering engine abstraction
//!
//! The scheduler never talks to Web Audio directly. It sees an engine that
//! turns a [`RenderRequest`] into a [`RenderContext`]: something that can be
//! asked to start, reports whether it is running, and delivers its rendered
//! [`SampleBuffer`] exactly once through a one-shot channel.
//!
//! ```text
//! RenderRequest ──▶ AudioEngine::create_context ──▶ RenderContext
//!                                                     │ start_rendering()
//!                                                     │ state()
//!                                                     ▼
//!                                       oneshot ──▶ SampleBuffer
//! ```

use futures::channel::oneshot;

use crate::error::Result;

pub mod graph;
pub mod offline;

pub use graph::{CompressorSpec, NodeSpec, OscillatorSpec, RenderRequest, Waveform};
pub use offline::{OfflineContext, OfflineEngine};

/// State reported by a render context right after a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

/// Receiving end of a context's completion event
pub type RenderCompletion = oneshot::Receiver<Result<SampleBuffer>>;

/// Rendered samples, one `Vec` per channel
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: f32,
    channels: Vec<Vec<f32>>,
}

impl SampleBuffer {
    pub fn new(sample_rate: f32, channels: Vec<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Single-channel buffer
    pub fn mono(sample_rate: f32, samples: Vec<f32>) -> Self {
        Self::new(sample_rate, vec![samples])
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn number_of_channels(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel (0 for a buffer without channels)
    pub fn length(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }
}

/// A single offline render in progress
pub trait RenderContext {
    /// Ask the engine to begin, or resume, processing.
    fn start_rendering(&self) -> Result<()>;

    /// The engine's state as of now.
    fn state(&self) -> ContextState;

    /// Hand out the completion receiver. Returns `None` after the first call.
    fn take_completion(&mut self) -> Option<RenderCompletion>;
}

/// Factory for render contexts
pub trait AudioEngine {
    type Context: RenderContext;

    /// Build the graph described by `request`, with every source started.
    fn create_context(&self, request: &RenderRequest) -> Result<Self::Context>;
}
