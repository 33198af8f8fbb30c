//! Error types for the harness

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Service did not open port {port} within {waited:?} ({attempts} probes)")]
    StartupTimeout {
        port: u16,
        waited: Duration,
        attempts: u32,
    },

    #[error("Service failed to start: {0}")]
    Spawn(String),

    #[error("Transport error on {method} {path}: {source}")]
    Transport {
        method: String,
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Contract mismatch on {method} {path}: expected status {expected}, got {actual}\n{body}")]
    ContractMismatch {
        method: String,
        path: String,
        expected: u16,
        actual: u16,
        body: String,
    },

    #[error("Unexpected payload from {method} {path}: {reason}\n{body}")]
    Payload {
        method: String,
        path: String,
        reason: String,
        body: String,
    },

    #[error("Expected validation failure not reported:\n{expected}\ngot:\n{body}\nreported failures: [{observed}]")]
    Validation {
        expected: String,
        observed: String,
        body: String,
    },

    #[error("Expected '{operation}: item not found', got:\n{body}")]
    NotFound { operation: String, body: String },

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl HarnessError {
    /// Infrastructure failures abort the whole run; everything else only
    /// fails the scenario that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarnessError::StartupTimeout { .. } | HarnessError::Spawn(_) | HarnessError::Config(_)
        )
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Fails the surrounding scenario with [`HarnessError::Assertion`] unless
/// the condition holds.
#[macro_export]
macro_rules! check {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::HarnessError::Assertion(format!($($arg)+)));
        }
    };
}
