//! # Audio Fingerprint (WASM)
//!
//! Derives a numeric fingerprint of the browser's audio stack, compiled to
//! WebAssembly.
//!
//! A 1kHz triangle wave is rendered through a dynamics compressor in an
//! `OfflineAudioContext` and the output samples are summed. The result is
//! divided by the gain the engine applies to a one-sample unit impulse (the
//! "fudge factor"), leaving the part of the signal that depends on the
//! engine's DSP implementation.
//!
//! ## Architecture
//!
//! ```text
//! Orchestrator
//!   ├─ FingerprintExtractor ─┐
//!   └─ FudgeFactorProbe ─────┤
//!                            ▼
//!                     RenderScheduler  (resume retries + watchdog)
//!                            ▼
//!                  AudioEngine / RenderContext
//!                            ▼
//!                   OfflineAudioContext
//! ```
//!
//! ## Usage
//!
//! ```javascript
//! import init, { get_audio_fingerprint } from './pkg/audio_fingerprint.js';
//! await init();
//! const value = await get_audio_fingerprint();              // displays the value
//! const quiet = await get_audio_fingerprint({ display: false });
//! ```

use wasm_bindgen::prelude::*;

// Modules
pub mod config;
pub mod display;
pub mod engine;
mod error;
pub mod fingerprint;
pub mod fudge;
pub mod orchestrator;
pub mod runtime;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use config::FingerprintConfig;
pub use display::{DocumentDisplay, FingerprintDisplay, NoDisplay};
pub use engine::{
    AudioEngine, ContextState, OfflineEngine, RenderContext, RenderRequest, SampleBuffer,
};
pub use error::{ErrorCode, ErrorInfo, FingerprintError, Result};
pub use fingerprint::{calculate_hash, FingerprintExtractor};
pub use fudge::FudgeFactorProbe;
pub use orchestrator::{FingerprintReport, Orchestrator};
pub use runtime::{BrowserHost, Host};
pub use scheduler::{JobState, RenderJob, RenderScheduler};

/// Initialize the module
///
/// Sets up logging to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    // A second init (e.g. module re-instantiated by a bundler) keeps the first logger.
    if console_log::init_with_level(log::Level::Info).is_ok() {
        log::info!("Audio fingerprint module initialized");
    }
}

/// Compute the restored audio fingerprint.
///
/// `options` is an optional object with any of `resumeTries`,
/// `resumeRetryDelayMs`, `renderTimeoutMs` and `display`. With
/// `display: true` (the default) the value is also appended to the page.
///
/// Rejects with `{ code, message, userMessage, isRetryable }`.
#[wasm_bindgen]
pub async fn get_audio_fingerprint(options: JsValue) -> std::result::Result<f64, JsValue> {
    let config = FingerprintConfig::from_js(options).map_err(to_js_error)?;
    log::info!("🔊 Computing audio fingerprint...");

    let result = if config.display {
        Orchestrator::new(OfflineEngine, BrowserHost::new(), config, DocumentDisplay)
            .run()
            .await
    } else {
        Orchestrator::new(OfflineEngine, BrowserHost::new(), config, NoDisplay)
            .run()
            .await
    };
    result.map_err(to_js_error)
}

/// Compute `{ fingerprint, fudgeFactor, restoredFingerprint }` without
/// touching the page.
#[wasm_bindgen]
pub async fn get_audio_fingerprint_report(
    options: JsValue,
) -> std::result::Result<JsValue, JsValue> {
    let config = FingerprintConfig::from_js(options).map_err(to_js_error)?;

    let report = Orchestrator::new(OfflineEngine, BrowserHost::new(), config, NoDisplay)
        .measure()
        .await
        .map_err(to_js_error)?;

    serde_wasm_bindgen::to_value(&report).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js_error(err: FingerprintError) -> JsValue {
    log::error!("❌ Audio fingerprint failed: {}", err);
    serde_wasm_bindgen::to_value(&ErrorInfo::from(&err)).unwrap_or_else(|_| err.into())
}
