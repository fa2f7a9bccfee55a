//! Error types for the audio fingerprint client
//!
//! This module provides the error taxonomy with:
//! - Detailed error variants for scheduler and engine failures
//! - Error classification (retryable or not)
//! - User-friendly messages
//! - Error codes for programmatic handling from JavaScript

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, FingerprintError>;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Scheduler errors (1xx)
    RenderTimeout = 100,
    RenderSuspended = 101,

    // Engine errors (2xx)
    ContextClosed = 200,
    CompletionDropped = 201,
    EngineError = 202,

    // Graph / buffer errors (3xx)
    InvalidGraph = 300,
    MissingChannel = 301,
    InvalidFudgeFactor = 302,

    // Configuration errors (8xx)
    ConfigError = 800,

    // Internal errors (9xx)
    InvalidState = 900,
    DisplayError = 901,
}

/// Main error type for fingerprint computation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FingerprintError {
    // ===== Scheduler Errors =====
    #[error("Rendering timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u32 },

    #[error("Rendering context stayed suspended after {attempts} attempts")]
    Suspended { attempts: u32 },

    // ===== Engine Errors =====
    #[error("Rendering context is closed")]
    ContextClosed,

    #[error("Rendering context dropped its completion before delivering a buffer")]
    CompletionDropped,

    #[error("Audio engine error: {0}")]
    Engine(String),

    // ===== Graph / Buffer Errors =====
    #[error("Invalid signal graph: {0}")]
    InvalidGraph(String),

    #[error("Rendered buffer has no channel {0}")]
    MissingChannel(u32),

    #[error("Fudge factor {0} cannot normalize a fingerprint")]
    InvalidFudgeFactor(f64),

    // ===== Configuration Errors =====
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ===== Internal Errors =====
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Display error: {0}")]
    Display(String),
}

impl FingerprintError {
    /// Wrap a JavaScript exception thrown by a Web Audio call
    pub fn engine(err: JsValue) -> Self {
        FingerprintError::Engine(describe_js(&err))
    }

    /// Wrap a JavaScript exception thrown by a DOM call
    pub fn display(err: JsValue) -> Self {
        FingerprintError::Display(describe_js(&err))
    }

    /// Get the error code for programmatic handling
    pub fn code(&self) -> ErrorCode {
        match self {
            FingerprintError::Timeout { .. } => ErrorCode::RenderTimeout,
            FingerprintError::Suspended { .. } => ErrorCode::RenderSuspended,

            FingerprintError::ContextClosed => ErrorCode::ContextClosed,
            FingerprintError::CompletionDropped => ErrorCode::CompletionDropped,
            FingerprintError::Engine(_) => ErrorCode::EngineError,

            FingerprintError::InvalidGraph(_) => ErrorCode::InvalidGraph,
            FingerprintError::MissingChannel(_) => ErrorCode::MissingChannel,
            FingerprintError::InvalidFudgeFactor(_) => ErrorCode::InvalidFudgeFactor,

            FingerprintError::Config(_) => ErrorCode::ConfigError,

            FingerprintError::InvalidState(_) => ErrorCode::InvalidState,
            FingerprintError::Display(_) => ErrorCode::DisplayError,
        }
    }

    /// Whether a later run may succeed where this one failed
    ///
    /// Nothing inside the crate retries on these; the browser throttling that
    /// causes them is usually gone once the page is back in the foreground.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FingerprintError::Timeout { .. } | FingerprintError::Suspended { .. }
        )
    }

    /// Get a user-friendly message for display
    pub fn user_message(&self) -> String {
        match self {
            FingerprintError::Timeout { .. } => {
                "Audio rendering did not finish in time. Please try again.".into()
            }
            FingerprintError::Suspended { .. } => {
                "The browser kept audio rendering paused. Bring the page to the foreground and try again."
                    .into()
            }
            FingerprintError::ContextClosed | FingerprintError::CompletionDropped => {
                "The audio engine stopped before producing a result.".into()
            }
            FingerprintError::Engine(_) => {
                "The browser audio engine rejected the request. Web Audio may be disabled.".into()
            }
            FingerprintError::InvalidGraph(_) | FingerprintError::MissingChannel(_) => {
                "The audio engine produced an unexpected result.".into()
            }
            FingerprintError::InvalidFudgeFactor(_) => {
                "The audio engine output could not be normalized.".into()
            }
            FingerprintError::Config(_) => {
                "Invalid options. Please check the fingerprint configuration.".into()
            }
            FingerprintError::InvalidState(_) | FingerprintError::Display(_) => {
                "An internal error occurred. Please report this bug.".into()
            }
        }
    }
}

fn describe_js(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

impl From<FingerprintError> for JsValue {
    fn from(err: FingerprintError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Error information for JavaScript consumption
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub code: u32,
    pub message: String,
    pub user_message: String,
    pub is_retryable: bool,
}

impl From<&FingerprintError> for ErrorInfo {
    fn from(err: &FingerprintError) -> Self {
        ErrorInfo {
            code: err.code() as u32,
            message: err.to_string(),
            user_message: err.user_message(),
            is_retryable: err.is_retryable(),
        }
    }
}
