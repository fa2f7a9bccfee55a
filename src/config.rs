//! Fingerprint run configuration.
//!
//! All fields default to the values browsers have been observed to need;
//! JavaScript callers may override any subset.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use wasm_bindgen::JsValue;

use crate::error::{FingerprintError, Result};

/// Resume attempts counted while the page is in the foreground
pub const DEFAULT_RESUME_TRIES: u32 = 3;

/// Delay between resume attempts of a suspended context (milliseconds)
pub const DEFAULT_RESUME_RETRY_DELAY_MS: u32 = 500;

/// Watchdog armed once the context reports it is running (milliseconds)
pub const DEFAULT_RENDER_TIMEOUT_MS: u32 = 1000;

/// Options for one fingerprint run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FingerprintConfig {
    pub resume_tries: u32,
    pub resume_retry_delay_ms: u32,
    pub render_timeout_ms: u32,
    /// Append the restored fingerprint to `document.body`
    pub display: bool,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            resume_tries: DEFAULT_RESUME_TRIES,
            resume_retry_delay_ms: DEFAULT_RESUME_RETRY_DELAY_MS,
            render_timeout_ms: DEFAULT_RENDER_TIMEOUT_MS,
            display: true,
        }
    }
}

impl FingerprintConfig {
    /// Parse the options object passed from JavaScript.
    ///
    /// `undefined` and `null` select the defaults.
    pub fn from_js(options: JsValue) -> Result<Self> {
        if options.is_undefined() || options.is_null() {
            return Ok(Self::default());
        }
        let config: Self = serde_wasm_bindgen::from_value(options)
            .map_err(|e| FingerprintError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse options from a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| FingerprintError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.resume_tries == 0 {
            return Err(FingerprintError::Config(
                "resumeTries must be at least 1".into(),
            ));
        }
        if self.render_timeout_ms == 0 {
            return Err(FingerprintError::Config(
                "renderTimeoutMs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn resume_retry_delay(&self) -> Duration {
        Duration::from_millis(self.resume_retry_delay_ms as u64)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms as u64)
    }
}
