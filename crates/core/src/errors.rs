//! Error types for the DeploySlack core library.
//!
//! Configuration and notification each have their own error type derived
//! with `thiserror`, and a top-level [`CoreError`] enum unifies them for
//! callers that want a single error type.

use thiserror::Error;

use crate::notify::options::OPTION_KEYS;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing { var: String, field: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// A `key=value` option used a key outside the recognized set.
    #[error("unknown deployment option '{0}' (expected one of: {})", OPTION_KEYS.join(", "))]
    UnknownOption(String),

    /// Generic I/O error reading or writing a config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Notification errors
// ---------------------------------------------------------------------------

/// Errors from building or delivering a deployment notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// A non-empty option set is missing a key the message needs.
    #[error("deployment option '{key}' is missing")]
    MissingField { key: &'static str },

    /// The HTTP client could not be built from the settings. Nothing was
    /// sent.
    #[error("failed to set up Slack HTTP client: {0}")]
    ClientSetup(#[source] reqwest::Error),

    /// Transport or HTTP-level failure posting to the webhook: invalid URL,
    /// DNS, TLS, connect, timeout, or a non-2xx response.
    #[error("Slack webhook delivery failed: {0}")]
    SendFailure(#[from] reqwest::Error),
}
