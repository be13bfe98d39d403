//! DeploySlack core library.
//!
//! Renders a deployment outcome into a fixed Slack Block Kit attachment and
//! posts it to an incoming webhook. Also provides the configuration and error
//! types shared by the command-line tool.

pub mod config;
pub mod errors;
pub mod notify;

// Re-exports for convenience.
pub use config::AppConfig;
pub use errors::{ConfigError, CoreError, NotificationError};
pub use notify::{DeploymentOptions, NotificationRequest, Notifier, SlackNotifier};
