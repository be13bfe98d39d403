//! TOML-based configuration for DeploySlack.
//!
//! The webhook URL is a credential, so it can be referenced through
//! `webhook_url_env` and resolved at runtime via
//! [`AppConfig::resolve_env_vars`] instead of being written to the file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{ConfigError, NotificationError};
use crate::notify::message::build_attachment;
use crate::notify::options::DeploymentOptions;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Slack webhook settings.
    #[serde(default)]
    pub slack: SlackConfig,

    /// Deployment fields rendered into the message. Left empty, the message
    /// falls back to placeholder values.
    #[serde(default)]
    pub deployment: DeploymentOptions,
}

// ---------------------------------------------------------------------------
// Slack
// ---------------------------------------------------------------------------

/// Slack incoming-webhook settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Incoming-webhook URL written inline.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Environment variable holding the incoming-webhook URL. Takes
    /// precedence over `webhook_url` when the variable is set.
    #[serde(default)]
    pub webhook_url_env: Option<String>,

    /// Channel name, e.g. `#deploys`. Only posted when `include_channel`
    /// is set; incoming webhooks are already bound to a channel.
    #[serde(default)]
    pub channel: String,

    /// Add a top-level `channel` key to the posted body.
    #[serde(default)]
    pub include_channel: bool,

    /// Request timeout in seconds. Unset uses the HTTP client's default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Parse an [`AppConfig`] from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve `slack.webhook_url_env` into `slack.webhook_url`.
    ///
    /// A missing variable only logs a warning; [`validate`](Self::validate)
    /// reports it if no inline URL is available either.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref env_name) = self.slack.webhook_url_env {
            if let Some(url) = resolve_optional_env(env_name, "slack.webhook_url_env") {
                self.slack.webhook_url = Some(url);
            }
        }
        Ok(())
    }

    /// The webhook URL to post to.
    pub fn webhook_url(&self) -> Result<String, ConfigError> {
        match (&self.slack.webhook_url, &self.slack.webhook_url_env) {
            (Some(url), _) if !url.trim().is_empty() => Ok(url.clone()),
            (_, Some(env_name)) => Err(ConfigError::EnvVarMissing {
                var: env_name.clone(),
                field: "slack.webhook_url_env".into(),
            }),
            _ => Err(ConfigError::InvalidValue {
                field: "slack.webhook_url".into(),
                detail: "no webhook URL configured (set webhook_url or webhook_url_env)".into(),
            }),
        }
    }

    /// Validate that a webhook is available and the remaining values are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.webhook_url()?;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidValue {
                field: "slack.webhook_url".into(),
                detail: "webhook URL must start with http:// or https://".into(),
            });
        }

        if self.slack.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "slack.timeout_secs".into(),
                detail: "timeout must be > 0".into(),
            });
        }

        if let Err(NotificationError::MissingField { key }) =
            build_attachment(&self.deployment, true, None)
        {
            return Err(ConfigError::InvalidValue {
                field: format!("deployment.{}", key),
                detail: "set every deployment field, or none to use placeholders".into(),
            });
        }

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
