//! Fingerprint orchestration
//!
//! Runs the fingerprint render and the fudge-factor probe side by side on one
//! engine, divides one by the other and hands the result to a display. Either
//! render failing fails the whole run; there is no partial result and no retry
//! at this level.

use futures::future;
use serde::{Deserialize, Serialize};

use crate::config::FingerprintConfig;
use crate::display::FingerprintDisplay;
use crate::engine::AudioEngine;
use crate::error::{FingerprintError, Result};
use crate::fingerprint::FingerprintExtractor;
use crate::fudge::FudgeFactorProbe;
use crate::runtime::Host;
use crate::scheduler::RenderScheduler;

/// Both raw measurements and the normalized fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintReport {
    pub fingerprint: f64,
    pub fudge_factor: f64,
    pub restored_fingerprint: f64,
}

impl FingerprintReport {
    /// Normalize `fingerprint` by `fudge_factor`.
    pub fn new(fingerprint: f64, fudge_factor: f64) -> Result<Self> {
        if fudge_factor == 0.0 || !fudge_factor.is_finite() {
            return Err(FingerprintError::InvalidFudgeFactor(fudge_factor));
        }
        Ok(Self {
            fingerprint,
            fudge_factor,
            restored_fingerprint: fingerprint / fudge_factor,
        })
    }
}

pub struct Orchestrator<E, H, D> {
    engine: E,
    scheduler: RenderScheduler<H>,
    display: D,
}

impl<E: AudioEngine, H: Host, D: FingerprintDisplay> Orchestrator<E, H, D> {
    pub fn new(engine: E, host: H, config: FingerprintConfig, display: D) -> Self {
        Self {
            engine,
            scheduler: RenderScheduler::new(host, config),
            display,
        }
    }

    /// Compute the report without displaying it
    pub async fn measure(&self) -> Result<FingerprintReport> {
        let extractor = FingerprintExtractor::new(&self.engine, &self.scheduler);
        let probe = FudgeFactorProbe::new(&self.engine, &self.scheduler);

        let (fingerprint, fudge_factor) = future::try_join(
            extractor.compute_fingerprint(),
            probe.compute_fudge_factor(),
        )
        .await?;

        let report = FingerprintReport::new(fingerprint, fudge_factor)?;
        log::info!(
            "✅ Restored fingerprint {} ({} / {})",
            report.restored_fingerprint,
            report.fingerprint,
            report.fudge_factor
        );
        Ok(report)
    }

    /// Compute the restored fingerprint and hand it to the display
    pub async fn run(&self) -> Result<f64> {
        let report = self.measure().await?;
        self.display.show(report.restored_fingerprint)?;
        Ok(report.restored_fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ContextState;
    use crate::test_support::{ManualHost, RecordingDisplay, ScriptedContext, ScriptedEngine};
    use futures::executor::block_on;

    /// 1700 samples of ±0.5 hash to exactly 850.0
    fn fingerprint_850() -> ScriptedContext {
        let samples = (0..1700)
            .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        ScriptedContext::new(vec![ContextState::Running]).completes_with(samples)
    }

    fn fudge(sample: f32) -> ScriptedContext {
        ScriptedContext::new(vec![ContextState::Running]).completes_with(vec![sample])
    }

    #[test]
    fn test_run_restores_fingerprint() {
        let engine = ScriptedEngine::split(fingerprint_850, || fudge(0.85));
        let host = ManualHost::new();
        let display = RecordingDisplay::default();
        let orchestrator =
            Orchestrator::new(engine, &host, FingerprintConfig::default(), &display);

        let restored = block_on(orchestrator.run()).unwrap();

        assert!((restored - 1000.0).abs() < 1e-3, "restored = {}", restored);
        assert_eq!(display.shown(), vec![restored]);
        assert_eq!(orchestrator.engine.requests().len(), 2);
    }

    #[test]
    fn test_measure_does_not_display() {
        let engine = ScriptedEngine::split(fingerprint_850, || fudge(1.0));
        let host = ManualHost::new();
        let display = RecordingDisplay::default();
        let orchestrator =
            Orchestrator::new(engine, &host, FingerprintConfig::default(), &display);

        let report = block_on(orchestrator.measure()).unwrap();

        assert_eq!(report.fingerprint, 850.0);
        assert_eq!(report.fudge_factor, 1.0);
        assert_eq!(report.restored_fingerprint, 850.0);
        assert!(display.shown().is_empty());
    }

    #[test]
    fn test_fingerprint_failure_fails_run() {
        let engine = ScriptedEngine::split(
            || ScriptedContext::new(vec![ContextState::Suspended]),
            || fudge(1.0),
        );
        let host = ManualHost::new();
        let display = RecordingDisplay::default();
        let orchestrator =
            Orchestrator::new(engine, &host, FingerprintConfig::default(), &display);

        let err = block_on(orchestrator.run()).unwrap_err();

        assert_eq!(err, FingerprintError::Suspended { attempts: 3 });
        assert!(display.shown().is_empty());
    }

    #[test]
    fn test_fudge_failure_fails_run() {
        let engine = ScriptedEngine::split(fingerprint_850, || {
            ScriptedContext::new(vec![ContextState::Running])
        });
        let host = ManualHost::new();
        let display = RecordingDisplay::default();
        let orchestrator =
            Orchestrator::new(engine, &host, FingerprintConfig::default(), &display);

        let err = block_on(orchestrator.run()).unwrap_err();

        assert_eq!(err, FingerprintError::Timeout { timeout_ms: 1000 });
        assert!(display.shown().is_empty());
    }

    #[test]
    fn test_zero_fudge_factor_rejected() {
        let engine = ScriptedEngine::split(fingerprint_850, || fudge(0.0));
        let host = ManualHost::new();
        let display = RecordingDisplay::default();
        let orchestrator =
            Orchestrator::new(engine, &host, FingerprintConfig::default(), &display);

        let err = block_on(orchestrator.run()).unwrap_err();

        assert_eq!(err, FingerprintError::InvalidFudgeFactor(0.0));
        assert!(display.shown().is_empty());
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = FingerprintReport::new(850.0, 0.5).unwrap();
        let json = serde_json::to_value(report).unwrap();

        assert_eq!(json["fudgeFactor"], 0.5);
        assert_eq!(json["restoredFingerprint"], 1700.0);
    }
}
