//! Deployment notifications for Slack.
//!
//! [`message`] renders a deployment outcome into the fixed Block Kit
//! attachment, [`slack`] posts it to an incoming webhook. The
//! [`Notifier`] facade ties both to the loaded [`AppConfig`].

pub mod blocks;
pub mod message;
pub mod options;
pub mod slack;

use tracing::info;

use crate::config::AppConfig;
use crate::errors::{CoreError, NotificationError};

pub use blocks::{Accessory, Attachment, Block, TextObject, WebhookPayload};
pub use message::{build_attachment, DeploymentStatus};
pub use options::DeploymentOptions;
pub use slack::{NotificationRequest, SlackNotifier};

/// Config-driven notifier: builds requests from [`AppConfig`] and sends them.
pub struct Notifier {
    config: AppConfig,
    slack: SlackNotifier,
}

impl Notifier {
    /// Create a notifier from a resolved and validated configuration.
    pub fn new(config: AppConfig) -> Result<Self, NotificationError> {
        let slack = SlackNotifier::from_config(&config.slack)?;
        info!(
            channel = %config.slack.channel,
            include_channel = config.slack.include_channel,
            "Slack notifications enabled"
        );
        Ok(Self { config, slack })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build the request for a deployment outcome from the configured
    /// webhook, channel, and `[deployment]` options.
    pub fn request(
        &self,
        success: bool,
        task: Option<&str>,
    ) -> Result<NotificationRequest, CoreError> {
        let webhook_url = self.config.webhook_url()?;
        Ok(self.build_request(webhook_url, success, task))
    }

    /// The body that [`notify`](Self::notify) would post. Does not need a
    /// webhook URL.
    pub fn preview(
        &self,
        success: bool,
        task: Option<&str>,
    ) -> Result<WebhookPayload, NotificationError> {
        self.build_request(String::new(), success, task)
            .payload(self.config.slack.include_channel)
    }

    fn build_request(
        &self,
        webhook_url: String,
        success: bool,
        task: Option<&str>,
    ) -> NotificationRequest {
        let request = NotificationRequest::new(
            webhook_url,
            self.config.slack.channel.clone(),
            self.config.deployment.clone(),
            success,
        );
        match task {
            Some(task) => request.with_task(task),
            None => request,
        }
    }

    /// Send the notification for a deployment outcome.
    pub async fn notify(&self, success: bool, task: Option<&str>) -> Result<(), CoreError> {
        let request = self.request(success, task)?;
        info!(
            success,
            task = task.unwrap_or_default(),
            "sending deployment notification"
        );
        self.slack.send(&request).await?;
        Ok(())
    }
}
