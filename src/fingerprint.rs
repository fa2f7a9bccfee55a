//! Fingerprint extraction
//!
//! Renders a 1kHz triangle wave through a hard-configured dynamics compressor
//! and sums the absolute value of every output sample. The compressor's
//! nonlinearity is where engines differ: its gain computation, knee curve and
//! envelope follower are implemented differently per browser, per version and
//! per CPU floating-point path, and the sum carries those differences.

use crate::engine::{
    AudioEngine, CompressorSpec, NodeSpec, OscillatorSpec, RenderRequest, Waveform,
};
use crate::error::{FingerprintError, Result};
use crate::runtime::Host;
use crate::scheduler::RenderScheduler;

pub const FINGERPRINT_SAMPLE_RATE: f32 = 44100.0;
pub const FINGERPRINT_LENGTH: u32 = 5000;

pub const FINGERPRINT_OSCILLATOR: OscillatorSpec = OscillatorSpec {
    waveform: Waveform::Triangle,
    frequency: 1000.0,
};

pub const FINGERPRINT_COMPRESSOR: CompressorSpec = CompressorSpec {
    threshold: -50.0,
    knee: 40.0,
    ratio: 12.0,
    attack: 0.0,
    release: 0.2,
};

/// The oscillator → compressor → destination render
pub fn fingerprint_request() -> RenderRequest {
    RenderRequest::new(1, FINGERPRINT_LENGTH, FINGERPRINT_SAMPLE_RATE)
        .then(NodeSpec::Oscillator(FINGERPRINT_OSCILLATOR))
        .then(NodeSpec::Compressor(FINGERPRINT_COMPRESSOR))
}

/// Sum of absolute sample values, accumulated in `f64`
pub fn calculate_hash(samples: &[f32]) -> f64 {
    samples.iter().map(|sample| f64::from(sample.abs())).sum()
}

pub struct FingerprintExtractor<'a, E, H> {
    engine: &'a E,
    scheduler: &'a RenderScheduler<H>,
}

impl<'a, E: AudioEngine, H: Host> FingerprintExtractor<'a, E, H> {
    pub fn new(engine: &'a E, scheduler: &'a RenderScheduler<H>) -> Self {
        Self { engine, scheduler }
    }

    pub async fn compute_fingerprint(&self) -> Result<f64> {
        let context = self.engine.create_context(&fingerprint_request())?;
        let mut job = self.scheduler.job(context)?;
        let buffer = self.scheduler.render(&mut job).await?;

        let samples = buffer
            .channel(0)
            .ok_or(FingerprintError::MissingChannel(0))?;
        let hash = calculate_hash(samples);

        log::info!(
            "🔊 Fingerprint {} from {} samples ({} attempt(s))",
            hash,
            samples.len(),
            job.attempts()
        );
        Ok(hash)
    }
}
