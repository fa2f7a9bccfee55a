//! Fudge factor probe
//!
//! Plays a single sample of 1.0 straight into the destination. Whatever comes
//! out is the gain the engine applies to every render on this device, which
//! also scales the fingerprint.

use crate::engine::{AudioEngine, NodeSpec, RenderRequest};
use crate::error::{FingerprintError, Result};
use crate::runtime::Host;
use crate::scheduler::RenderScheduler;

pub const FUDGE_SAMPLE_RATE: f32 = 44100.0;

/// One-sample unit impulse → destination
pub fn fudge_factor_request() -> RenderRequest {
    RenderRequest::new(1, 1, FUDGE_SAMPLE_RATE).then(NodeSpec::BufferSource {
        samples: vec![1.0],
    })
}

pub struct FudgeFactorProbe<'a, E, H> {
    engine: &'a E,
    scheduler: &'a RenderScheduler<H>,
}

impl<'a, E: AudioEngine, H: Host> FudgeFactorProbe<'a, E, H> {
    pub fn new(engine: &'a E, scheduler: &'a RenderScheduler<H>) -> Self {
        Self { engine, scheduler }
    }

    pub async fn compute_fudge_factor(&self) -> Result<f64> {
        let context = self.engine.create_context(&fudge_factor_request())?;
        let mut job = self.scheduler.job(context)?;
        let buffer = self.scheduler.render(&mut job).await?;

        let sample = buffer
            .channel(0)
            .and_then(|samples| samples.first())
            .copied()
            .ok_or(FingerprintError::MissingChannel(0))?;

        log::info!("🎚️ Fudge factor {}", sample);
        Ok(f64::from(sample))
    }
}
